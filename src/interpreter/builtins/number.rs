//! `Number`, its boxing constructor, and the numeric constants.

use crate::error::ScriptError;
use crate::interpreter::Interpreter;
use crate::value::{LinkFlags, ScriptString, VarExt, VarRef};

use super::{native, native_with_prototype};

pub(super) fn register(interp: &mut Interpreter) {
    let proto = interp.number_prototype.clone();
    let ctor = native_with_prototype(interp, "function Number()", native_number, proto);
    ctor.add_child(
        ScriptString::from("NaN"),
        interp.nan(),
        LinkFlags::ENUMERABLE,
    );
    ctor.add_child(
        ScriptString::from("POSITIVE_INFINITY"),
        interp.infinity(1),
        LinkFlags::ENUMERABLE,
    );
    ctor.add_child(
        ScriptString::from("NEGATIVE_INFINITY"),
        interp.infinity(-1),
        LinkFlags::ENUMERABLE,
    );
    native(
        interp,
        "function Number.__constructor__()",
        native_number_constructor,
    );
}

fn number_argument(interp: &mut Interpreter, scope: &VarRef) -> Result<Option<VarRef>, ScriptError> {
    if interp.native_args_len(scope) == 0 {
        return Ok(Some(interp.new_int(0)));
    }
    let arg = interp.native_arg(scope, 0);
    let mut execute = true;
    let numeric = interp.coerce_numeric(&mut execute, &arg)?;
    if !execute {
        return Ok(None);
    }
    Ok(Some(numeric))
}

fn native_number(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    if let Some(result) = number_argument(interp, scope)? {
        interp.native_return(scope, result);
    }
    Ok(())
}

fn native_number_constructor(
    interp: &mut Interpreter,
    scope: &VarRef,
) -> Result<(), ScriptError> {
    if let Some(result) = number_argument(interp, scope)? {
        let boxed = interp.to_object(&result);
        interp.native_return(scope, boxed);
    }
    Ok(())
}
