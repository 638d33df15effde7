//! Global functions and root constants.

use crate::error::{ErrorKind, ScriptError};
use crate::interpreter::Interpreter;
use crate::tokenizer::{TokenBuffer, TokenCursor};
use crate::token::TokenKind;
use crate::value::{parse_int_radix, Link, LinkFlags, ScriptString, VarExt, VarRef};

use super::native;

pub(super) fn register(interp: &mut Interpreter) {
    let undefined = interp.undefined();
    interp
        .root
        .add_child(ScriptString::from("undefined"), undefined, LinkFlags::ENUMERABLE);
    let nan = interp.nan();
    interp
        .root
        .add_child(ScriptString::from("NaN"), nan, LinkFlags::ENUMERABLE);
    let infinity = interp.infinity(1);
    interp
        .root
        .add_child(ScriptString::from("Infinity"), infinity, LinkFlags::ENUMERABLE);

    native(interp, "function eval(jsCode)", native_eval);
    native(interp, "function isNaN(objc)", native_is_nan);
    native(interp, "function isFinite(objc)", native_is_finite);
    native(interp, "function parseInt(string, radix)", native_parse_int);
    native(interp, "function parseFloat(string)", native_parse_float);
}

/// `eval` runs in the caller's scope. A tokenization error inside `eval` is
/// a script-catchable exception.
fn native_eval(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let code_arg = interp.native_arg_named(scope, "jsCode");
    let mut execute = true;
    let code = interp.coerce_string(&mut execute, &code_arg)?;
    if !execute {
        return Ok(());
    }

    // Step out of the native call's own scope so the code sees the caller.
    let eval_scope = interp.scopes.pop();
    let outcome = run_eval(interp, &code);
    if let Some(saved) = eval_scope {
        interp.scopes.push(saved);
    }

    match outcome {
        Ok(Some(result)) => {
            interp.native_return(scope, result.var());
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(ScriptError::Thrown) => Err(ScriptError::Thrown),
        Err(err) => {
            // Errors inside eval are always catchable by the script.
            let kind = err.kind().unwrap_or(ErrorKind::SyntaxError);
            let (file, line, column) = err
                .location()
                .map(|loc| (loc.file.clone(), loc.line, loc.column))
                .unwrap_or_default();
            let error = interp.new_error(kind, err.message(), &file, line, column);
            Err(interp.throw_value(error))
        }
    }
}

fn run_eval(interp: &mut Interpreter, code: &str) -> Result<Option<Link>, ScriptError> {
    let strict = interp.options().strict_let_redeclaration;
    let buffer = TokenBuffer::parse(code, "eval", 0, 0, strict, &mut interp.strings)?;
    let mut t = TokenCursor::new(&buffer);
    let mut execute = true;
    let mut result = None;
    loop {
        if let Some(link) = interp.execute_statement(&mut t, &mut execute)? {
            result = Some(link);
        }
        while t.kind() == TokenKind::Semicolon {
            t.advance();
        }
        if t.kind() == TokenKind::Eof {
            break;
        }
        if !execute && interp.flags.throwing {
            // An exception is unwinding out of the eval'd code.
            return Err(ScriptError::Thrown);
        }
    }
    if !execute && interp.flags.throwing {
        return Err(ScriptError::Thrown);
    }
    Ok(result)
}

fn native_is_nan(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let arg = interp.native_arg_named(scope, "objc");
    let mut execute = true;
    let numeric = interp.coerce_numeric(&mut execute, &arg)?;
    if !execute {
        return Ok(());
    }
    let result = interp.new_bool(numeric.borrow().is_nan());
    interp.native_return(scope, result);
    Ok(())
}

fn native_is_finite(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let arg = interp.native_arg_named(scope, "objc");
    let mut execute = true;
    let numeric = interp.coerce_numeric(&mut execute, &arg)?;
    if !execute {
        return Ok(());
    }
    let finite = {
        let inner = numeric.borrow();
        !(inner.is_nan() || inner.infinity_sign() != 0)
    };
    let result = interp.new_bool(finite);
    interp.native_return(scope, result);
    Ok(())
}

fn native_parse_int(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let arg = interp.native_arg_named(scope, "string");
    let mut execute = true;
    let text = interp.coerce_string(&mut execute, &arg)?;
    if !execute {
        return Ok(());
    }
    let radix = interp.native_arg_named(scope, "radix").borrow().get_int();
    let radix = if (2..=36).contains(&radix) { radix as u32 } else { 0 };
    let (value, consumed) = parse_int_radix(&text, radix);
    let result = if consumed == 0 {
        interp.nan()
    } else {
        interp.new_int(value)
    };
    interp.native_return(scope, result);
    Ok(())
}

fn native_parse_float(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let arg = interp.native_arg_named(scope, "string");
    let mut execute = true;
    let text = interp.coerce_string(&mut execute, &arg)?;
    if !execute {
        return Ok(());
    }
    let trimmed = text.trim_start();
    let mut parsed = None;
    for end in (1..=trimmed.len()).rev() {
        if let Some(prefix) = trimmed.get(..end) {
            if let Ok(value) = prefix.parse::<f64>() {
                parsed = Some(value);
                break;
            }
        }
    }
    let result = match parsed {
        Some(value) => interp.new_double(value),
        None => interp.nan(),
    };
    interp.native_return(scope, result);
    Ok(())
}
