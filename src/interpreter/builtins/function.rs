//! The `Function` constructor and `Function.prototype.call` / `apply`.

use crate::error::{ErrorKind, ScriptError};
use crate::interpreter::Interpreter;
use crate::value::{VarExt, VarRef, WorkLink};

use super::{native, native_with_prototype};

pub(super) fn register(interp: &mut Interpreter) {
    let proto = interp.function_prototype.clone();
    native_with_prototype(
        interp,
        "function Function(params, body)",
        native_function,
        proto,
    );
    native(
        interp,
        "function Function.prototype.call(objc)",
        native_call,
    );
    native(
        interp,
        "function Function.prototype.apply(objc, args)",
        native_apply,
    );
}

/// `Function(p1, p2, …, body)`: compile a function from strings.
fn native_function(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let count = interp.native_args_len(scope);
    let mut execute = true;
    let mut body = String::new();
    let mut params = String::new();
    if count >= 1 {
        let arg = interp.native_arg(scope, count - 1);
        body = interp.coerce_string(&mut execute, &arg)?;
    }
    if count >= 2 {
        for idx in 0..count - 1 {
            if idx > 0 {
                params.push(',');
            }
            let arg = interp.native_arg(scope, idx);
            params.push_str(&interp.coerce_string(&mut execute, &arg)?);
        }
    }
    if !execute {
        return Ok(());
    }
    let func = interp.parse_function_source(&params, &body)?;
    interp.native_return(scope, func);
    Ok(())
}

fn native_call(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let func = interp.native_this(scope);
    let this = interp.native_arg(scope, 0);
    let count = interp.native_args_len(scope);
    let mut args = Vec::new();
    for idx in 1..count {
        args.push(interp.native_arg(scope, idx));
    }
    let mut execute = true;
    let result = interp.call_function_with(&mut execute, &func, args, &this, None)?;
    if execute {
        interp.native_return(scope, result);
    }
    Ok(())
}

fn native_apply(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let func = interp.native_this(scope);
    let this_arg = interp.native_arg(scope, 0);
    let this = {
        let boxed = interp.to_object(&this_arg);
        if boxed.borrow().is_nullish() {
            interp.root.clone()
        } else {
            boxed
        }
    };
    let array = interp.native_arg_named(scope, "args");
    let mut args = Vec::new();
    if !array.borrow().is_nullish() {
        let length_link = array.find_child("length").ok_or_else(|| {
            ScriptError::new(
                ErrorKind::TypeError,
                "second argument to Function.prototype.apply must be an array or an array like object",
                "",
                0,
                0,
            )
        })?;
        let mut execute = true;
        let length_value =
            interp.read_link(&mut execute, &WorkLink::from_link(length_link))?;
        if !execute {
            return Ok(());
        }
        let length = interp.coerce_int(&mut execute, &length_value)?;
        if !execute {
            return Ok(());
        }
        for idx in 0..length.max(0) {
            let value = array
                .find_child(&idx.to_string())
                .map(|link| link.var())
                .unwrap_or_else(|| interp.undefined());
            args.push(value);
        }
    }
    let mut execute = true;
    let result = interp.call_function_with(&mut execute, &func, args, &this, None)?;
    if execute {
        interp.native_return(scope, result);
    }
    Ok(())
}
