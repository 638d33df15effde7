//! `String`, its boxing constructor, and the live `length` accessor.

use crate::error::ScriptError;
use crate::interpreter::Interpreter;
use crate::value::{LinkFlags, ScriptString, VarExt, VarKind, VarRef, ACCESSOR_GET};

use super::{native, native_with_prototype};

pub(super) fn register(interp: &mut Interpreter) {
    let proto = interp.string_prototype.clone();
    native_with_prototype(interp, "function String()", native_string, proto);
    native(
        interp,
        "function String.__constructor__()",
        native_string_constructor,
    );
    native(
        interp,
        "function String.prototype.charAt(pos)",
        native_char_at,
    );

    let getter = interp.new_native_function("length", &[], |interp, scope| {
        let this = interp.native_this(scope);
        let length = match &this.borrow().kind {
            VarKind::String(s) => s.as_str().chars().count() as i32,
            _ => 0,
        };
        let result = interp.new_int(length);
        interp.native_return(scope, result);
        Ok(())
    });
    interp.string_length_accessor.add_child_or_replace(
        ScriptString::from(ACCESSOR_GET),
        getter,
        LinkFlags::NONE,
    );
}

fn string_argument(interp: &mut Interpreter, scope: &VarRef) -> Result<Option<VarRef>, ScriptError> {
    if interp.native_args_len(scope) == 0 {
        return Ok(Some(interp.new_string("")));
    }
    let arg = interp.native_arg(scope, 0);
    let mut execute = true;
    let text = interp.coerce_string(&mut execute, &arg)?;
    if !execute {
        return Ok(None);
    }
    Ok(Some(interp.new_string(text)))
}

fn native_string(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    if let Some(result) = string_argument(interp, scope)? {
        interp.native_return(scope, result);
    }
    Ok(())
}

/// `new String(x)`: the boxed form.
fn native_string_constructor(
    interp: &mut Interpreter,
    scope: &VarRef,
) -> Result<(), ScriptError> {
    if let Some(result) = string_argument(interp, scope)? {
        let boxed = interp.to_object(&result);
        interp.native_return(scope, boxed);
    }
    Ok(())
}

fn native_char_at(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let this = interp.native_this(scope);
    let mut execute = true;
    let text = interp.coerce_string(&mut execute, &this)?;
    if !execute {
        return Ok(());
    }
    let pos = {
        let arg = interp.native_arg_named(scope, "pos");
        let v = arg.borrow().get_int();
        v
    };
    let result = if pos >= 0 {
        match text.chars().nth(pos as usize) {
            Some(c) => interp.new_string(c.to_string()),
            None => interp.new_string(""),
        }
    } else {
        interp.new_string("")
    };
    interp.native_return(scope, result);
    Ok(())
}
