//! The script value model.
//!
//! Every runtime value is a [`Var`]: a tagged variant with an ordered list of
//! named property [`Link`]s, an extensible flag, and a `temporary_id` scratch
//! stamp shared by the sweep pass and the recursion breakers. Property lists
//! are kept sorted (numeric keys first, in numeric order) so `find_child` is
//! a binary search and enumeration is deterministic.
//!
//! Links are distinct from values: a link may be *owned* (installed on its
//! owner, participates in enumeration and delete) or *borrowed* (an ephemeral
//! lookup result). Assignment through a borrowed link promotes it by
//! inserting into the owner. [`WorkLink`] additionally remembers the
//! *referenced owner* a prototype-chain or `with` lookup resolved against,
//! which accessor reads use as `this`.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{ErrorKind, ScriptError};
use crate::token::FnData;

/// Hidden slot names. None of these are enumerable.
pub const PROTO: &str = "__proto__";
pub const PROTOTYPE: &str = "prototype";
pub const CONSTRUCTOR: &str = "__constructor__";
pub const ACCESSOR_GET: &str = "__accessor_get__";
pub const ACCESSOR_SET: &str = "__accessor_set__";
pub const RETURN_SLOT: &str = "__return__";
pub const CLOSURE_SLOT: &str = "__closure__";
pub const SCOPE_PARENT: &str = "__scope_parent__";
pub const WITH_TARGET: &str = "__with__";
pub const ARGUMENTS: &str = "arguments";
pub const THIS: &str = "this";

/// Reference-counted string for identifiers, property names, and string
/// values. Clone is cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ScriptString(Rc<str>);

impl ScriptString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn empty() -> ScriptString {
        ScriptString::from("")
    }
}

impl AsRef<str> for ScriptString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for ScriptString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ScriptString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for ScriptString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for ScriptString {
    fn from(s: &str) -> Self {
        ScriptString(s.into())
    }
}

impl From<String> for ScriptString {
    fn from(s: String) -> Self {
        ScriptString(s.into())
    }
}

impl fmt::Debug for ScriptString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for ScriptString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Native callback: receives the interpreter and the populated function
/// scope. Arguments are read off the scope; the return value is stored in
/// the scope's `__return__` slot.
pub type NativeCallback =
    Rc<dyn Fn(&mut crate::interpreter::Interpreter, &VarRef) -> Result<(), ScriptError>>;

/// The disjoint kinds a [`Var`] can have.
#[derive(Clone)]
pub enum VarKind {
    Undefined,
    Null,
    Bool(bool),
    Int(i32),
    Double(f64),
    NaN,
    /// +1 or -1.
    Infinity(i32),
    String(ScriptString),
    Object,
    Array,
    Error(ErrorKind),
    RegExp {
        source: ScriptString,
        flags: ScriptString,
    },
    Function(Rc<FnData>),
    Native {
        data: Rc<FnData>,
        callback: NativeCallback,
    },
    Accessor,
    RootScope,
    FunctionScope,
    LetScope {
        /// While a let-expression initializer runs, lookups bypass the
        /// scope's own bindings.
        init_hidden: bool,
    },
    WithScope,
}

impl fmt::Debug for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKind::Undefined => write!(f, "undefined"),
            VarKind::Null => write!(f, "null"),
            VarKind::Bool(b) => write!(f, "{}", b),
            VarKind::Int(v) => write!(f, "{}", v),
            VarKind::Double(v) => write!(f, "{}", v),
            VarKind::NaN => write!(f, "NaN"),
            VarKind::Infinity(sign) => {
                write!(f, "{}", if *sign < 0 { "-Infinity" } else { "Infinity" })
            }
            VarKind::String(s) => write!(f, "{:?}", s),
            VarKind::Object => write!(f, "{{...}}"),
            VarKind::Array => write!(f, "[...]"),
            VarKind::Error(kind) => write!(f, "[{}]", kind),
            VarKind::RegExp { source, flags } => write!(f, "/{}/{}", source, flags),
            VarKind::Function(data) => write!(f, "[Function: {}]", data.name),
            VarKind::Native { data, .. } => write!(f, "[NativeFunction: {}]", data.name),
            VarKind::Accessor => write!(f, "[Accessor]"),
            VarKind::RootScope => write!(f, "[RootScope]"),
            VarKind::FunctionScope => write!(f, "[FunctionScope]"),
            VarKind::LetScope { .. } => write!(f, "[LetScope]"),
            VarKind::WithScope => write!(f, "[WithScope]"),
        }
    }
}

/// Reference to a heap value. Clone is cheap.
pub type VarRef = Rc<RefCell<Var>>;

/// A script value: kind tag plus sorted property links.
#[derive(Debug)]
pub struct Var {
    pub kind: VarKind,
    children: Vec<Link>,
    pub extensible: bool,
    /// Set on boxed primitives (`new String("x")`): the kind stays primitive
    /// but the value behaves as an object.
    pub fake_object: bool,
    /// Scratch stamp used by the sweep pass and graph-walk recursion breaks.
    pub temporary_id: u32,
}

impl Var {
    pub fn new(kind: VarKind) -> Var {
        Var {
            kind,
            children: Vec::new(),
            extensible: true,
            fake_object: false,
            temporary_id: 0,
        }
    }

    // Kind predicates.

    pub fn is_undefined(&self) -> bool {
        matches!(self.kind, VarKind::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, VarKind::Null)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self.kind, VarKind::Undefined | VarKind::Null)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self.kind, VarKind::NaN)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, VarKind::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self.kind, VarKind::Int(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self.kind, VarKind::Double(_))
    }

    /// +1 / -1 for the infinities, 0 otherwise.
    pub fn infinity_sign(&self) -> i32 {
        match self.kind {
            VarKind::Infinity(sign) => sign,
            _ => 0,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind, VarKind::String(_))
    }

    /// Int, Double, NaN, or Infinity.
    pub fn is_number(&self) -> bool {
        matches!(
            self.kind,
            VarKind::Int(_) | VarKind::Double(_) | VarKind::NaN | VarKind::Infinity(_)
        )
    }

    /// Int or Double.
    pub fn is_real_number(&self) -> bool {
        matches!(self.kind, VarKind::Int(_) | VarKind::Double(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, VarKind::Array)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, VarKind::Error(_))
    }

    pub fn is_regexp(&self) -> bool {
        matches!(self.kind, VarKind::RegExp { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, VarKind::Function(_) | VarKind::Native { .. })
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, VarKind::Native { .. })
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.kind, VarKind::Accessor)
    }

    pub fn is_scope(&self) -> bool {
        matches!(
            self.kind,
            VarKind::RootScope | VarKind::FunctionScope | VarKind::LetScope { .. } | VarKind::WithScope
        )
    }

    /// A primitive that has not been boxed to object form.
    pub fn is_primitive(&self) -> bool {
        !self.fake_object
            && matches!(
                self.kind,
                VarKind::Undefined
                    | VarKind::Null
                    | VarKind::Bool(_)
                    | VarKind::Int(_)
                    | VarKind::Double(_)
                    | VarKind::NaN
                    | VarKind::Infinity(_)
                    | VarKind::String(_)
            )
    }

    /// Object-like for the purposes of `==` pointer comparison and
    /// `Object.*` natives.
    pub fn is_object(&self) -> bool {
        self.fake_object
            || matches!(
                self.kind,
                VarKind::Object
                    | VarKind::Array
                    | VarKind::Error(_)
                    | VarKind::RegExp { .. }
                    | VarKind::Function(_)
                    | VarKind::Native { .. }
                    | VarKind::Accessor
            )
    }

    /// The `typeof` string. Boxed primitives report `"object"`.
    pub fn type_of(&self) -> &'static str {
        if self.fake_object {
            return "object";
        }
        match self.kind {
            VarKind::Undefined => "undefined",
            VarKind::Bool(_) => "boolean",
            VarKind::Int(_) | VarKind::Double(_) | VarKind::NaN | VarKind::Infinity(_) => "number",
            VarKind::String(_) => "string",
            VarKind::Function(_) | VarKind::Native { .. } => "function",
            _ => "object",
        }
    }

    pub fn function_data(&self) -> Option<&Rc<FnData>> {
        match &self.kind {
            VarKind::Function(data) | VarKind::Native { data, .. } => Some(data),
            _ => None,
        }
    }

    // Primitive conversions. These are the direct, script-free views; full
    // ToPrimitive coercion lives on the interpreter.

    pub fn get_int(&self) -> i32 {
        match &self.kind {
            VarKind::Bool(b) => *b as i32,
            VarKind::Int(v) => *v,
            VarKind::Double(v) => *v as i32,
            VarKind::Infinity(sign) => *sign,
            VarKind::String(s) => parse_int_prefix(s.as_str()),
            _ => 0,
        }
    }

    pub fn get_double(&self) -> f64 {
        match &self.kind {
            VarKind::Bool(b) => *b as i32 as f64,
            VarKind::Int(v) => *v as f64,
            VarKind::Double(v) => *v,
            VarKind::Infinity(sign) => {
                if *sign < 0 {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            }
            VarKind::NaN => f64::NAN,
            VarKind::String(s) => s.as_str().trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Truthiness of an already-primitive value.
    pub fn get_bool(&self) -> bool {
        match &self.kind {
            VarKind::Bool(b) => *b,
            VarKind::Int(v) => *v != 0,
            VarKind::Double(v) => *v != 0.0,
            VarKind::Infinity(_) => true,
            VarKind::String(s) => !s.is_empty(),
            VarKind::Undefined | VarKind::Null | VarKind::NaN => false,
            _ => true,
        }
    }

    /// String form of a primitive value (objects go through the
    /// interpreter's ToPrimitive path first).
    pub fn primitive_string(&self) -> String {
        match &self.kind {
            VarKind::Undefined => "undefined".to_string(),
            VarKind::Null => "null".to_string(),
            VarKind::Bool(true) => "true".to_string(),
            VarKind::Bool(false) => "false".to_string(),
            VarKind::Int(v) => v.to_string(),
            VarKind::Double(v) => format_double(*v),
            VarKind::NaN => "NaN".to_string(),
            VarKind::Infinity(sign) => if *sign < 0 { "-Infinity" } else { "Infinity" }.to_string(),
            VarKind::String(s) => s.as_str().to_string(),
            VarKind::RegExp { source, flags } => format!("/{}/{}", source, flags),
            other => format!("{:?}", other),
        }
    }

    // Children.

    pub fn children(&self) -> &[Link] {
        &self.children
    }

    fn child_position(&self, name: &str) -> Result<usize, usize> {
        self.children
            .binary_search_by(|link| compare_property_names(link.name_ref().as_str(), name))
    }

    /// Binary search over the sorted property list.
    pub fn find_child(&self, name: &str) -> Option<Link> {
        self.child_position(name).ok().map(|idx| self.children[idx].clone())
    }

    fn insert_child(&mut self, link: Link) {
        let position = self.child_position(link.name_ref().as_str());
        match position {
            Ok(idx) => self.children[idx] = link,
            Err(idx) => self.children.insert(idx, link),
        }
    }

    fn remove_child_at(&mut self, name: &str) -> Option<Link> {
        match self.child_position(name) {
            Ok(idx) => Some(self.children.remove(idx)),
            Err(_) => None,
        }
    }

    pub fn remove_all_children(&mut self) {
        self.children.clear();
    }

    /// Array length: highest numeric key + 1. Numeric keys sort first, so
    /// the boundary is a partition point.
    pub fn array_length(&self) -> i32 {
        if !self.is_array() {
            return 0;
        }
        let numeric = self
            .children
            .partition_point(|link| decimal_index(link.name_ref().as_str()).is_some());
        if numeric == 0 {
            return 0;
        }
        match decimal_index(self.children[numeric - 1].name_ref().as_str()) {
            Some(idx) => idx as i32 + 1,
            None => 0,
        }
    }
}

/// Extension methods on `VarRef` that need the `Rc` itself (owner
/// back-references, recursive graph walks).
pub trait VarExt {
    fn find_child(&self, name: &str) -> Option<Link>;
    fn add_child(&self, name: ScriptString, var: VarRef, flags: LinkFlags) -> Link;
    fn add_child_or_replace(&self, name: ScriptString, var: VarRef, flags: LinkFlags) -> Link;
    fn remove_link(&self, link: &Link) -> bool;
    fn proto(&self) -> Option<VarRef>;
    fn get_array_index(&self, idx: i32) -> Option<VarRef>;
    fn set_array_index(&self, idx: i32, var: VarRef);
    fn set_temporary_id_recursive(&self, id: u32);
    fn collect_keys(&self, out: &mut Vec<ScriptString>, only_enumerable: bool, id: u32);
}

impl VarExt for VarRef {
    fn find_child(&self, name: &str) -> Option<Link> {
        self.borrow().find_child(name)
    }

    fn add_child(&self, name: ScriptString, var: VarRef, flags: LinkFlags) -> Link {
        let link = Link::new(var, name, flags);
        link.set_owner(self);
        link.set_owned(true);
        self.borrow_mut().insert_child(link.clone());
        link
    }

    fn add_child_or_replace(&self, name: ScriptString, var: VarRef, flags: LinkFlags) -> Link {
        let existing = self.find_child(name.as_str());
        match existing {
            Some(link) => {
                link.set_var(var);
                link
            }
            None => self.add_child(name, var, flags),
        }
    }

    fn remove_link(&self, link: &Link) -> bool {
        let removed = self.borrow_mut().remove_child_at(link.name_ref().as_str());
        match removed {
            Some(found) if found.ptr_eq(link) => true,
            Some(found) => {
                // Same name but a different link: put it back.
                self.borrow_mut().insert_child(found);
                false
            }
            None => false,
        }
    }

    fn proto(&self) -> Option<VarRef> {
        self.find_child(PROTO).map(|link| link.var())
    }

    fn get_array_index(&self, idx: i32) -> Option<VarRef> {
        self.find_child(&idx.to_string()).map(|link| link.var())
    }

    fn set_array_index(&self, idx: i32, var: VarRef) {
        let name = idx.to_string();
        match self.find_child(&name) {
            Some(link) => link.set_var(var),
            None => {
                self.add_child(ScriptString::from(name), var, LinkFlags::DEFAULT);
            }
        }
    }

    fn set_temporary_id_recursive(&self, id: u32) {
        {
            let mut var = self.borrow_mut();
            if var.temporary_id == id {
                return;
            }
            var.temporary_id = id;
        }
        let children: Vec<Link> = self.borrow().children.to_vec();
        for link in children {
            link.var().set_temporary_id_recursive(id);
        }
    }

    fn collect_keys(&self, out: &mut Vec<ScriptString>, only_enumerable: bool, id: u32) {
        self.borrow_mut().temporary_id = id;
        for link in self.borrow().children() {
            if !only_enumerable || link.is_enumerable() {
                out.push(link.name());
            }
        }
        if id != 0 {
            if let Some(proto) = self.proto() {
                if proto.borrow().temporary_id != id {
                    proto.collect_keys(out, only_enumerable, id);
                }
            }
        }
    }
}

/// Property attributes of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkFlags {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl LinkFlags {
    /// Ordinary script-created property.
    pub const DEFAULT: LinkFlags = LinkFlags {
        writable: true,
        enumerable: true,
        configurable: true,
    };
    /// `var`/`let` bindings and hoisted functions: not deletable.
    pub const VAR: LinkFlags = LinkFlags {
        writable: true,
        enumerable: true,
        configurable: false,
    };
    /// Hidden but replaceable slots (`__proto__`, `prototype`).
    pub const WRITABLE: LinkFlags = LinkFlags {
        writable: true,
        enumerable: false,
        configurable: false,
    };
    /// Read-only but visible (global constants).
    pub const ENUMERABLE: LinkFlags = LinkFlags {
        writable: false,
        enumerable: true,
        configurable: false,
    };
    /// Fully hidden internal slots.
    pub const NONE: LinkFlags = LinkFlags {
        writable: false,
        enumerable: false,
        configurable: false,
    };
}

#[derive(Debug)]
struct LinkData {
    name: ScriptString,
    var: VarRef,
    flags: LinkFlags,
    owned: bool,
    owner: Option<Weak<RefCell<Var>>>,
}

/// A named property binding, distinct from the value it points at.
#[derive(Clone)]
pub struct Link {
    inner: Rc<RefCell<LinkData>>,
}

impl Link {
    pub fn new(var: VarRef, name: ScriptString, flags: LinkFlags) -> Link {
        Link {
            inner: Rc::new(RefCell::new(LinkData {
                name,
                var,
                flags,
                owned: false,
                owner: None,
            })),
        }
    }

    /// An anonymous borrowed link (expression temporaries).
    pub fn temp(var: VarRef) -> Link {
        Link::new(var, ScriptString::empty(), LinkFlags::DEFAULT)
    }

    pub fn name(&self) -> ScriptString {
        self.inner.borrow().name.clone()
    }

    fn name_ref(&self) -> std::cell::Ref<'_, ScriptString> {
        std::cell::Ref::map(self.inner.borrow(), |data| &data.name)
    }

    pub fn var(&self) -> VarRef {
        self.inner.borrow().var.clone()
    }

    pub fn set_var(&self, var: VarRef) {
        self.inner.borrow_mut().var = var;
    }

    pub fn flags(&self) -> LinkFlags {
        self.inner.borrow().flags
    }

    pub fn is_writable(&self) -> bool {
        self.inner.borrow().flags.writable
    }

    pub fn is_enumerable(&self) -> bool {
        self.inner.borrow().flags.enumerable
    }

    pub fn is_configurable(&self) -> bool {
        self.inner.borrow().flags.configurable
    }

    pub fn is_owned(&self) -> bool {
        self.inner.borrow().owned
    }

    pub fn set_owned(&self, owned: bool) {
        self.inner.borrow_mut().owned = owned;
    }

    pub fn owner(&self) -> Option<VarRef> {
        self.inner.borrow().owner.as_ref().and_then(Weak::upgrade)
    }

    pub fn has_owner(&self) -> bool {
        self.owner().is_some()
    }

    pub fn set_owner(&self, owner: &VarRef) {
        self.inner.borrow_mut().owner = Some(Rc::downgrade(owner));
    }

    pub fn ptr_eq(&self, other: &Link) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.borrow();
        let result = write!(
            f,
            "Link({:?} -> {:?}, owned: {})",
            data.name,
            data.var.borrow().kind,
            data.owned
        );
        result
    }
}

/// A link carried through expression evaluation that remembers the owner a
/// lookup actually resolved against (for accessor `this` and `with`
/// assignment targeting).
#[derive(Debug, Clone)]
pub struct WorkLink {
    pub link: Link,
    pub referenced_owner: Option<VarRef>,
}

impl WorkLink {
    pub fn from_link(link: Link) -> WorkLink {
        WorkLink {
            link,
            referenced_owner: None,
        }
    }

    pub fn from_var(var: VarRef) -> WorkLink {
        WorkLink::from_link(Link::temp(var))
    }

    pub fn named(var: VarRef, name: ScriptString) -> WorkLink {
        WorkLink::from_link(Link::new(var, name, LinkFlags::DEFAULT))
    }

    pub fn var(&self) -> VarRef {
        self.link.var()
    }

    pub fn name(&self) -> ScriptString {
        self.link.name()
    }

    /// The `this` used when this link's value is an accessor.
    pub fn accessor_this(&self) -> Option<VarRef> {
        self.referenced_owner.clone().or_else(|| self.link.owner())
    }
}

/// Parse a property name as a decimal array index: digits only, no leading
/// zero (except `"0"` itself).
pub fn decimal_index(name: &str) -> Option<u32> {
    if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
        return None;
    }
    if !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Property-name ordering: numeric keys first in numeric order, then string
/// keys lexicographically.
pub fn compare_property_names(a: &str, b: &str) -> Ordering {
    match (decimal_index(a), decimal_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Leading-integer parse with C `strtol(.., 0)` semantics: optional sign,
/// `0x` hex prefix, stops at the first non-digit.
pub fn parse_int_prefix(s: &str) -> i32 {
    parse_int_radix(s, 0).0
}

/// Returns the parsed value and the number of bytes consumed. `radix == 0`
/// auto-detects a `0x` prefix.
pub fn parse_int_radix(s: &str, radix: u32) -> (i32, usize) {
    let bytes = s.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() && (bytes[pos] as char).is_whitespace() {
        pos += 1;
    }
    let mut negative = false;
    if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        negative = bytes[pos] == b'-';
        pos += 1;
    }
    let mut radix = radix;
    if (radix == 0 || radix == 16)
        && pos + 1 < bytes.len()
        && bytes[pos] == b'0'
        && (bytes[pos + 1] == b'x' || bytes[pos + 1] == b'X')
        && pos + 2 < bytes.len()
        && (bytes[pos + 2] as char).is_digit(16)
    {
        pos += 2;
        radix = 16;
    }
    if radix == 0 {
        radix = 10;
    }
    let start = pos;
    let mut value: i64 = 0;
    while pos < bytes.len() {
        match (bytes[pos] as char).to_digit(radix) {
            Some(digit) => {
                value = value.wrapping_mul(radix as i64).wrapping_add(digit as i64);
                pos += 1;
            }
            None => break,
        }
    }
    if pos == start {
        return (0, 0);
    }
    let value = if negative { -value } else { value };
    (value as i32, pos)
}

/// Shortest round-trip formatting for doubles; integral values print without
/// a fractional part.
pub fn format_double(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v < 0.0 { "-Infinity" } else { "Infinity" }.to_string()
    } else if v == 0.0 {
        "0".to_string()
    } else {
        v.to_string()
    }
}
