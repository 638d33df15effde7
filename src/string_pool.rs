//! String interning for identifiers and property names.
//!
//! Identical strings share one `Rc<str>` instance, cutting allocations in
//! the lexer and keeping property-name comparisons cache-friendly.

use rustc_hash::FxHashMap;

use crate::value::ScriptString;

/// A pool of deduplicated [`ScriptString`] instances.
pub struct StringPool {
    strings: FxHashMap<Box<str>, ScriptString>,
}

impl StringPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            strings: FxHashMap::default(),
        }
    }

    /// Create a pool pre-populated with the names the runtime touches
    /// constantly.
    pub fn with_common_names() -> Self {
        let mut pool = Self::new();
        for s in COMMON_NAMES {
            pool.intern(s);
        }
        pool
    }

    /// Get an existing string or insert a new one. Returns a cheap clone of
    /// the shared instance.
    pub fn intern(&mut self, s: &str) -> ScriptString {
        if let Some(existing) = self.strings.get(s) {
            return existing.clone();
        }
        let interned = ScriptString::from(s);
        self.strings.insert(s.into(), interned.clone());
        interned
    }

    /// Number of unique strings in the pool.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Names that show up in nearly every script or in the runtime's own
/// bookkeeping.
const COMMON_NAMES: &[&str] = &[
    // Hidden slots
    "__proto__",
    "prototype",
    "__constructor__",
    "__accessor_get__",
    "__accessor_set__",
    "__return__",
    "__closure__",
    "__scope_parent__",
    "__with__",
    // Core object protocol
    "length",
    "constructor",
    "toString",
    "valueOf",
    "hasOwnProperty",
    // Call protocol
    "this",
    "arguments",
    "call",
    "apply",
    // Error fields
    "name",
    "message",
    "fileName",
    "lineNumber",
    "column",
    // Builtin constructors
    "Object",
    "Array",
    "String",
    "Number",
    "Boolean",
    "Function",
    "RegExp",
    "Error",
    "EvalError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "TypeError",
    "JSON",
    // Globals
    "undefined",
    "NaN",
    "Infinity",
    "eval",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    // RegExp fields
    "source",
    "global",
    "ignoreCase",
    "multiline",
    "sticky",
    "lastIndex",
    "index",
    "input",
    "test",
    "exec",
    // Small indices and short identifiers
    "0",
    "1",
    "2",
    "3",
    "i",
    "j",
    "k",
    "n",
    "x",
    "y",
    "a",
    "b",
    "c",
    "e",
    "f",
    "o",
    "s",
    "v",
    "get",
    "set",
    "each",
    "key",
    "value",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_shares_storage() {
        let mut pool = StringPool::new();
        let s1 = pool.intern("hello");
        let s2 = pool.intern("hello");
        assert_eq!(s1, s2);
        assert!(std::ptr::eq(s1.as_str(), s2.as_str()));
    }

    #[test]
    fn test_distinct_strings() {
        let mut pool = StringPool::new();
        let s1 = pool.intern("hello");
        let s2 = pool.intern("world");
        assert_ne!(s1, s2);
        assert!(!std::ptr::eq(s1.as_str(), s2.as_str()));
    }

    #[test]
    fn test_common_names_preloaded() {
        let pool = StringPool::with_common_names();
        assert!(!pool.is_empty());
        let before = pool.len();
        let mut pool = pool;
        pool.intern("__proto__");
        pool.intern("length");
        assert_eq!(pool.len(), before);
    }
}
