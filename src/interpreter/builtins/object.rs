//! `Object` and `Object.prototype`.

use crate::error::{ErrorKind, ScriptError};
use crate::interpreter::Interpreter;
use crate::value::{VarExt, VarRef, PROTO};

use super::native_with_prototype;
use super::native;

pub(super) fn register(interp: &mut Interpreter) {
    let proto = interp.object_prototype.clone();
    native_with_prototype(interp, "function Object()", native_object, proto);
    native(
        interp,
        "function Object.getPrototypeOf(obj)",
        native_get_prototype_of,
    );
    native(
        interp,
        "function Object.preventExtensions(obj)",
        native_prevent_extensions,
    );
    native(
        interp,
        "function Object.isExtensible(obj)",
        native_is_extensible,
    );
    native(
        interp,
        "function Object.prototype.hasOwnProperty(prop)",
        native_has_own_property,
    );
    let value_of = native(
        interp,
        "function Object.prototype.valueOf()",
        native_value_of,
    );
    let to_string = native(
        interp,
        "function Object.prototype.toString(radix)",
        native_to_string,
    );
    interp.object_prototype_value_of = value_of;
    interp.object_prototype_to_string = to_string;
}

fn native_object(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let arg = interp.native_arg(scope, 0);
    let result = interp.to_object(&arg);
    interp.native_return(scope, result);
    Ok(())
}

fn object_argument(interp: &mut Interpreter, scope: &VarRef) -> Result<VarRef, ScriptError> {
    if interp.native_args_len(scope) >= 1 {
        let arg = interp.native_arg(scope, 0);
        if arg.borrow().is_object() {
            return Ok(arg);
        }
    }
    Err(ScriptError::new(
        ErrorKind::TypeError,
        "argument is not an object",
        "",
        0,
        0,
    ))
}

fn native_get_prototype_of(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let obj = object_argument(interp, scope)?;
    let proto = obj
        .find_child(PROTO)
        .map(|link| link.var())
        .unwrap_or_else(|| interp.null());
    interp.native_return(scope, proto);
    Ok(())
}

fn native_prevent_extensions(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let obj = object_argument(interp, scope)?;
    obj.borrow_mut().extensible = false;
    Ok(())
}

fn native_is_extensible(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let obj = object_argument(interp, scope)?;
    let extensible = obj.borrow().extensible;
    let result = interp.new_bool(extensible);
    interp.native_return(scope, result);
    Ok(())
}

fn native_has_own_property(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let this = interp.native_this(scope);
    let prop = interp.native_arg_named(scope, "prop");
    let mut execute = true;
    let name = interp.coerce_string(&mut execute, &prop)?;
    if !execute {
        return Ok(());
    }
    let result = interp.new_bool(this.find_child(&name).is_some());
    interp.native_return(scope, result);
    Ok(())
}

fn native_value_of(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let this = interp.native_this(scope);
    let result = interp.builtin_value_of(&this);
    interp.native_return(scope, result);
    Ok(())
}

fn native_to_string(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let this = interp.native_this(scope);
    let radix = if interp.native_args_len(scope) >= 1 {
        let arg = interp.native_arg_named(scope, "radix");
        let value = arg.borrow().get_int();
        value
    } else {
        10
    };
    let mut execute = true;
    let result = interp.builtin_to_string(&mut execute, &this, radix)?;
    if !execute {
        return Ok(());
    }
    interp.native_return(scope, result);
    Ok(())
}
