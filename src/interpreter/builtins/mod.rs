//! Builtin bootstrap: `Object`, `Array`, `String`, `Number`, `Boolean`,
//! `Function`, `RegExp`, the `Error` hierarchy, global functions, and
//! `JSON`. Everything is registered through the same `add_native`
//! signature-parsing path an embedder uses.

mod array;
mod boolean;
mod error;
mod function;
mod global;
pub mod json;
mod number;
mod object;
mod regexp;
mod string;

use crate::error::ScriptError;
use crate::value::VarRef;

use super::Interpreter;

pub(crate) fn register(interp: &mut Interpreter) {
    object::register(interp);
    array::register(interp);
    string::register(interp);
    regexp::register(interp);
    number::register(interp);
    boolean::register(interp);
    function::register(interp);
    error::register(interp);
    global::register(interp);
    json::register(interp);
}

/// Register a builtin; the signatures are static, so a failure is a bug.
pub(super) fn native<F>(interp: &mut Interpreter, signature: &str, callback: F) -> VarRef
where
    F: Fn(&mut Interpreter, &VarRef) -> Result<(), ScriptError> + 'static,
{
    interp
        .add_native(signature, callback)
        .unwrap_or_else(|err| panic!("builtin '{}' failed to register: {}", signature, err))
}

/// Register a builtin constructor wired to an existing prototype object.
pub(super) fn native_with_prototype<F>(
    interp: &mut Interpreter,
    signature: &str,
    callback: F,
    prototype: VarRef,
) -> VarRef
where
    F: Fn(&mut Interpreter, &VarRef) -> Result<(), ScriptError> + 'static,
{
    interp
        .add_native_with_prototype(signature, std::rc::Rc::new(callback), Some(prototype))
        .unwrap_or_else(|err| panic!("builtin '{}' failed to register: {}", signature, err))
}
