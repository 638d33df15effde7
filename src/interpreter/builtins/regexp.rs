//! `RegExp`: constructor plus `test`/`exec` on the prototype. Matching is
//! delegated to the opaque engine wrapper; `lastIndex` drives `g`/`y`
//! repetition.

use crate::error::{ErrorKind, ScriptError};
use crate::interpreter::Interpreter;
use crate::regexp::ScriptRegExp;
use crate::value::{ScriptString, VarExt, VarKind, VarRef};

use super::{native, native_with_prototype};

pub(super) fn register(interp: &mut Interpreter) {
    let proto = interp.regexp_prototype.clone();
    native_with_prototype(interp, "function RegExp()", native_regexp, proto);
    native(interp, "function RegExp.prototype.test(str)", |i, s| {
        native_exec(i, s, true)
    });
    native(interp, "function RegExp.prototype.exec(str)", |i, s| {
        native_exec(i, s, false)
    });
}

fn native_regexp(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let count = interp.native_args_len(scope);
    let mut execute = true;
    let mut source = String::new();
    let mut flags = String::new();
    if count >= 1 {
        let arg = interp.native_arg(scope, 0);
        source = interp.coerce_string(&mut execute, &arg)?;
        if !execute {
            return Ok(());
        }
        if let Err(message) = crate::regexp::validate(&source) {
            return Err(ScriptError::new(ErrorKind::SyntaxError, message, "", 0, 0));
        }
        if count >= 2 {
            let arg = interp.native_arg(scope, 1);
            flags = interp.coerce_string(&mut execute, &arg)?;
            if !execute {
                return Ok(());
            }
            if let Some(bad) = crate::regexp::invalid_flag(&flags) {
                return Err(ScriptError::new(
                    ErrorKind::SyntaxError,
                    format!("invalid regular expression flag {}", bad),
                    "",
                    0,
                    0,
                ));
            }
        }
    }
    let result = interp.new_regexp(ScriptString::from(source), ScriptString::from(flags));
    interp.native_return(scope, result);
    Ok(())
}

fn native_exec(interp: &mut Interpreter, scope: &VarRef, test: bool) -> Result<(), ScriptError> {
    let this = interp.native_this(scope);
    let (source, flags) = match &this.borrow().kind {
        VarKind::RegExp { source, flags } => (source.clone(), flags.clone()),
        _ => {
            return Err(ScriptError::new(
                ErrorKind::TypeError,
                "RegExp method called on incompatible receiver",
                "",
                0,
                0,
            ))
        }
    };
    let arg = interp.native_arg_named(scope, "str");
    let mut execute = true;
    let input = interp.coerce_string(&mut execute, &arg)?;
    if !execute {
        return Ok(());
    }

    let global = flags.as_str().contains('g');
    let sticky = flags.as_str().contains('y');
    let regex = ScriptRegExp::compile(source.as_str(), flags.as_str())
        .map_err(|message| ScriptError::new(ErrorKind::SyntaxError, message, "", 0, 0))?;

    let last_index = this
        .find_child("lastIndex")
        .map(|link| link.var().borrow().get_int().max(0) as usize)
        .unwrap_or(0);
    let start = if global || sticky { last_index } else { 0 };

    let matched = if start <= input.len() {
        regex.exec(&input, start, sticky)
    } else {
        None
    };
    match matched {
        Some(found) => {
            if global || sticky {
                let end = interp.new_int(found.end as i32);
                this.add_child_or_replace(
                    ScriptString::from("lastIndex"),
                    end,
                    crate::value::LinkFlags::WRITABLE,
                );
            }
            let result = if test {
                interp.new_bool(true)
            } else {
                let array = interp.new_array();
                array.add_child_or_replace(
                    ScriptString::from("input"),
                    interp.new_string(input.clone()),
                    crate::value::LinkFlags::DEFAULT,
                );
                array.add_child_or_replace(
                    ScriptString::from("index"),
                    interp.new_int(found.start as i32),
                    crate::value::LinkFlags::DEFAULT,
                );
                for (idx, group) in found.groups.iter().enumerate() {
                    let value = match group {
                        Some(text) => interp.new_string(text.clone()),
                        None => interp.undefined(),
                    };
                    array.set_array_index(idx as i32, value);
                }
                array
            };
            interp.native_return(scope, result);
        }
        None => {
            if global || sticky {
                let zero = interp.new_int(0);
                this.add_child_or_replace(
                    ScriptString::from("lastIndex"),
                    zero,
                    crate::value::LinkFlags::WRITABLE,
                );
            }
            let result = if test {
                interp.new_bool(false)
            } else {
                interp.null()
            };
            interp.native_return(scope, result);
        }
    }
    Ok(())
}
