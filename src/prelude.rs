//! Crate-internal aliases for the hashed collections used throughout.

/// An insertion-order-preserving map hashed with FxHasher.
pub type FxIndexMap<K, V> =
    indexmap::IndexMap<K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

/// An insertion-order-preserving set hashed with FxHasher.
pub type FxIndexSet<T> =
    indexmap::IndexSet<T, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

/// Create an empty `FxIndexMap`.
pub fn new_index_map<K, V>() -> FxIndexMap<K, V> {
    indexmap::IndexMap::with_hasher(Default::default())
}

/// Create an empty `FxIndexSet`.
pub fn new_index_set<T>() -> FxIndexSet<T> {
    indexmap::IndexSet::with_hasher(Default::default())
}
