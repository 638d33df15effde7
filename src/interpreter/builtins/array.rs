//! `Array` and the live `length` accessor.

use crate::error::{ErrorKind, ScriptError};
use crate::interpreter::Interpreter;
use crate::value::{LinkFlags, ScriptString, VarExt, VarRef, ACCESSOR_GET};

use super::native_with_prototype;

pub(super) fn register(interp: &mut Interpreter) {
    let proto = interp.array_prototype.clone();
    native_with_prototype(interp, "function Array()", native_array, proto);

    let getter = interp.new_native_function("length", &[], |interp, scope| {
        let this = interp.native_this(scope);
        let length = this.borrow().array_length();
        let result = interp.new_int(length);
        interp.native_return(scope, result);
        Ok(())
    });
    interp.array_length_accessor.add_child_or_replace(
        ScriptString::from(ACCESSOR_GET),
        getter,
        LinkFlags::NONE,
    );
}

/// `Array(n)` preallocates, any other argument list fills elements.
fn native_array(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let result = interp.new_array();
    let count = interp.native_args_len(scope);
    if count == 1 && interp.native_arg(scope, 0).borrow().is_number() {
        let arg = interp.native_arg(scope, 0);
        let mut new_size = -1;
        {
            let inner = arg.borrow();
            if inner.is_real_number() {
                new_size = inner.get_int();
                if inner.is_double() && new_size as f64 != inner.get_double() {
                    new_size = -1;
                }
            }
        }
        if new_size < 0 {
            return Err(ScriptError::new(
                ErrorKind::RangeError,
                "invalid array length",
                "",
                0,
                0,
            ));
        }
        if new_size > 0 {
            result.set_array_index(new_size - 1, interp.undefined());
        }
    } else {
        for idx in 0..count {
            let value = interp.native_arg(scope, idx);
            result.set_array_index(idx as i32, value);
        }
    }
    interp.native_return(scope, result);
    Ok(())
}
