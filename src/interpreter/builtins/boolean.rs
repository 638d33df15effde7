//! `Boolean` and its boxing constructor.

use crate::error::ScriptError;
use crate::interpreter::Interpreter;
use crate::value::VarRef;

use super::{native, native_with_prototype};

pub(super) fn register(interp: &mut Interpreter) {
    let proto = interp.boolean_prototype.clone();
    native_with_prototype(interp, "function Boolean()", native_boolean, proto);
    native(
        interp,
        "function Boolean.__constructor__()",
        native_boolean_constructor,
    );
}

fn boolean_argument(interp: &mut Interpreter, scope: &VarRef) -> Result<Option<VarRef>, ScriptError> {
    if interp.native_args_len(scope) == 0 {
        return Ok(Some(interp.new_bool(false)));
    }
    let arg = interp.native_arg(scope, 0);
    let mut execute = true;
    let value = interp.coerce_bool(&mut execute, &arg)?;
    if !execute {
        return Ok(None);
    }
    Ok(Some(interp.new_bool(value)))
}

fn native_boolean(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    if let Some(result) = boolean_argument(interp, scope)? {
        interp.native_return(scope, result);
    }
    Ok(())
}

fn native_boolean_constructor(
    interp: &mut Interpreter,
    scope: &VarRef,
) -> Result<(), ScriptError> {
    if let Some(result) = boolean_argument(interp, scope)? {
        let boxed = interp.to_object(&result);
        interp.native_return(scope, boxed);
    }
    Ok(())
}
