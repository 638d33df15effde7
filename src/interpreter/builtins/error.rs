//! The `Error` hierarchy: `Error`, `EvalError`, `RangeError`,
//! `ReferenceError`, `SyntaxError`, `TypeError`. The subtypes share the
//! `Error` prototype.

use crate::error::{ErrorKind, ScriptError};
use crate::interpreter::Interpreter;
use crate::value::{LinkFlags, ScriptString, VarExt, VarKind, VarRef, PROTO};

use super::native_with_prototype;

pub(super) fn register(interp: &mut Interpreter) {
    // Prototype fields: the base carries the defaults, subtypes override
    // only `name`.
    let base = interp.error_prototypes[ErrorKind::Error.index()].clone();
    base.add_child(
        ScriptString::from("message"),
        interp.new_string(""),
        LinkFlags::DEFAULT,
    );
    base.add_child(
        ScriptString::from("fileName"),
        interp.new_string(""),
        LinkFlags::DEFAULT,
    );
    base.add_child(
        ScriptString::from("lineNumber"),
        interp.new_int(-1),
        LinkFlags::DEFAULT,
    );
    base.add_child(
        ScriptString::from("column"),
        interp.new_int(-1),
        LinkFlags::DEFAULT,
    );
    for kind in ErrorKind::ALL {
        let proto = interp.error_prototypes[kind.index()].clone();
        proto.add_child(
            ScriptString::from("name"),
            interp.new_string(kind.name()),
            LinkFlags::DEFAULT,
        );
        let signature = format!(
            "function {}(message, fileName, lineNumber, column)",
            kind.name()
        );
        native_with_prototype(
            interp,
            &signature,
            move |interp, scope| native_error(interp, scope, kind),
            proto,
        );
    }
}

fn native_error(
    interp: &mut Interpreter,
    scope: &VarRef,
    kind: ErrorKind,
) -> Result<(), ScriptError> {
    let count = interp.native_args_len(scope);
    let var = interp.heap.alloc(VarKind::Error(kind));
    var.add_child(
        ScriptString::from(PROTO),
        interp.error_prototypes[kind.index()].clone(),
        LinkFlags::WRITABLE,
    );
    let mut execute = true;
    if count > 0 {
        let message = interp.native_arg(scope, 0);
        let text = interp.coerce_string(&mut execute, &message)?;
        if !execute {
            return Ok(());
        }
        var.add_child(
            ScriptString::from("message"),
            interp.new_string(text),
            LinkFlags::DEFAULT,
        );
    }
    if count > 1 {
        let file = interp.native_arg(scope, 1);
        let text = interp.coerce_string(&mut execute, &file)?;
        if !execute {
            return Ok(());
        }
        var.add_child(
            ScriptString::from("fileName"),
            interp.new_string(text),
            LinkFlags::DEFAULT,
        );
    }
    if count > 2 {
        let line = interp.native_arg(scope, 2).borrow().get_int();
        var.add_child(
            ScriptString::from("lineNumber"),
            interp.new_int(line),
            LinkFlags::DEFAULT,
        );
    }
    if count > 3 {
        let column = interp.native_arg(scope, 3).borrow().get_int();
        var.add_child(
            ScriptString::from("column"),
            interp.new_int(column),
            LinkFlags::DEFAULT,
        );
    }
    interp.native_return(scope, var);
    Ok(())
}
