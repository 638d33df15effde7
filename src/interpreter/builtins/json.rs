//! `JSON.parse` / `JSON.stringify`, plus host-side conversions between
//! value graphs and `serde_json::Value`.
//!
//! `JSON.parse` reuses the tokenizer in expression-start mode and evaluates
//! the resulting literal; `JSON.stringify` walks the value graph with an
//! ancestor stack guarding against cycles.

use std::rc::Rc;

use serde_json::Value as JsonValue;

use crate::error::{ErrorKind, ScriptError};
use crate::interpreter::Interpreter;
use crate::token::TokenKind;
use crate::tokenizer::{TokenBuffer, TokenCursor};
use crate::value::{format_double, LinkFlags, ScriptString, VarExt, VarKind, VarRef, WorkLink};

use super::native;

pub(super) fn register(interp: &mut Interpreter) {
    native(interp, "function JSON.parse(text, reviver)", native_parse);
    native(
        interp,
        "function JSON.stringify(value, space)",
        native_stringify,
    );
}

fn native_parse(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let arg = interp.native_arg_named(scope, "text");
    let mut execute = true;
    let text = interp.coerce_string(&mut execute, &arg)?;
    if !execute {
        return Ok(());
    }
    let strict = interp.options().strict_let_redeclaration;
    let buffer =
        TokenBuffer::parse_expression(&text, "JSON.parse", 0, 0, strict, &mut interp.strings)?;
    let mut t = TokenCursor::new(&buffer);
    let link = interp.execute_literal(&mut t, &mut execute)?;
    t.expect(TokenKind::Eof)?;
    let value = interp.read_link(&mut execute, &link)?;
    if execute {
        interp.native_return(scope, value);
    }
    Ok(())
}

fn native_stringify(interp: &mut Interpreter, scope: &VarRef) -> Result<(), ScriptError> {
    let value = interp.native_arg_named(scope, "value");
    let space = interp.native_arg_named(scope, "space");
    let indent = {
        let inner = space.borrow();
        match &inner.kind {
            VarKind::Int(n) => " ".repeat((*n).clamp(0, 10) as usize),
            VarKind::String(s) => s.as_str().chars().take(10).collect(),
            _ => String::new(),
        }
    };
    let mut execute = true;
    let mut ancestors = Vec::new();
    let text = stringify_value(interp, &mut execute, &value, &indent, "", &mut ancestors)?;
    if !execute {
        return Ok(());
    }
    let result = match text {
        Some(text) => interp.new_string(text),
        None => interp.undefined(),
    };
    interp.native_return(scope, result);
    Ok(())
}

/// Serialize one value; `None` means the value does not serialize
/// (undefined, functions).
fn stringify_value(
    interp: &mut Interpreter,
    execute: &mut bool,
    var: &VarRef,
    indent: &str,
    current: &str,
    ancestors: &mut Vec<VarRef>,
) -> Result<Option<String>, ScriptError> {
    let kind = var.borrow().kind.clone();
    let fake = var.borrow().fake_object;
    match kind {
        VarKind::Undefined | VarKind::Function(_) | VarKind::Native { .. } | VarKind::Accessor
            if !fake =>
        {
            Ok(None)
        }
        VarKind::Null => Ok(Some("null".to_string())),
        VarKind::Bool(b) => Ok(Some(b.to_string())),
        VarKind::Int(v) => Ok(Some(v.to_string())),
        VarKind::Double(v) => Ok(Some(format_double(v))),
        VarKind::NaN | VarKind::Infinity(_) => Ok(Some("null".to_string())),
        VarKind::String(s) if !fake => Ok(Some(quote_string(s.as_str()))),
        VarKind::Array => {
            if ancestors.iter().any(|a| Rc::ptr_eq(a, var)) {
                return Err(ScriptError::new(
                    ErrorKind::TypeError,
                    "cyclic object value",
                    "",
                    0,
                    0,
                ));
            }
            ancestors.push(var.clone());
            let nested = format!("{}{}", current, indent);
            let (nl, sep) = separators(indent, current, &nested);
            let length = var.borrow().array_length();
            let mut parts = Vec::new();
            for idx in 0..length {
                let element = match var.find_child(&idx.to_string()) {
                    Some(link) => interp.read_link(execute, &WorkLink::from_link(link))?,
                    None => interp.undefined(),
                };
                let text =
                    stringify_value(interp, execute, &element, indent, &nested, ancestors)?;
                parts.push(text.unwrap_or_else(|| "null".to_string()));
                if !*execute {
                    ancestors.pop();
                    return Ok(None);
                }
            }
            ancestors.pop();
            if parts.is_empty() {
                return Ok(Some("[]".to_string()));
            }
            Ok(Some(format!(
                "[{}{}{}]",
                nl.0,
                parts.join(&sep),
                nl.1
            )))
        }
        _ => {
            // Plain objects, errors, boxed primitives, regexps.
            if ancestors.iter().any(|a| Rc::ptr_eq(a, var)) {
                return Err(ScriptError::new(
                    ErrorKind::TypeError,
                    "cyclic object value",
                    "",
                    0,
                    0,
                ));
            }
            ancestors.push(var.clone());
            let nested = format!("{}{}", current, indent);
            let (nl, sep) = separators(indent, current, &nested);
            let mut parts = Vec::new();
            let children: Vec<_> = var.borrow().children().to_vec();
            for link in children {
                if !link.is_enumerable() {
                    continue;
                }
                let value = interp.read_link(execute, &WorkLink::from_link(link.clone()))?;
                if !*execute {
                    ancestors.pop();
                    return Ok(None);
                }
                let text = stringify_value(interp, execute, &value, indent, &nested, ancestors)?;
                if let Some(text) = text {
                    let key = quote_string(link.name().as_str());
                    let colon = if indent.is_empty() { ":" } else { ": " };
                    parts.push(format!("{}{}{}", key, colon, text));
                }
                if !*execute {
                    ancestors.pop();
                    return Ok(None);
                }
            }
            ancestors.pop();
            if parts.is_empty() {
                return Ok(Some("{}".to_string()));
            }
            Ok(Some(format!(
                "{{{}{}{}}}",
                nl.0,
                parts.join(&sep),
                nl.1
            )))
        }
    }
}

/// Opening/closing whitespace and element separator for one nesting level.
fn separators(indent: &str, current: &str, nested: &str) -> ((String, String), String) {
    if indent.is_empty() {
        ((String::new(), String::new()), ",".to_string())
    } else {
        (
            (format!("\n{}", nested), format!("\n{}", current)),
            format!(",\n{}", nested),
        )
    }
}

/// Quote a string the way the lexer can read it back: standard short
/// escapes, `\xNN` for other control characters, raw bytes above ASCII.
fn quote_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\x{:02X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Convert a value graph to a `serde_json::Value`. Functions and undefined
/// become `Null`.
pub fn var_to_json(interp: &mut Interpreter, var: &VarRef) -> Result<JsonValue, ScriptError> {
    let mut execute = true;
    let mut ancestors = Vec::new();
    var_to_json_inner(interp, &mut execute, var, &mut ancestors)
}

fn var_to_json_inner(
    interp: &mut Interpreter,
    execute: &mut bool,
    var: &VarRef,
    ancestors: &mut Vec<VarRef>,
) -> Result<JsonValue, ScriptError> {
    let kind = var.borrow().kind.clone();
    Ok(match kind {
        VarKind::Undefined | VarKind::Null => JsonValue::Null,
        VarKind::Bool(b) => JsonValue::Bool(b),
        VarKind::Int(v) => JsonValue::from(v),
        VarKind::Double(v) => serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        VarKind::NaN | VarKind::Infinity(_) => JsonValue::Null,
        VarKind::String(s) => JsonValue::String(s.as_str().to_string()),
        VarKind::Array => {
            if ancestors.iter().any(|a| Rc::ptr_eq(a, var)) {
                return Err(ScriptError::new(
                    ErrorKind::TypeError,
                    "cyclic object value",
                    "",
                    0,
                    0,
                ));
            }
            ancestors.push(var.clone());
            let mut out = Vec::new();
            for idx in 0..var.borrow().array_length() {
                let element = var
                    .get_array_index(idx)
                    .unwrap_or_else(|| interp.undefined());
                out.push(var_to_json_inner(interp, execute, &element, ancestors)?);
            }
            ancestors.pop();
            JsonValue::Array(out)
        }
        _ => {
            if ancestors.iter().any(|a| Rc::ptr_eq(a, var)) {
                return Err(ScriptError::new(
                    ErrorKind::TypeError,
                    "cyclic object value",
                    "",
                    0,
                    0,
                ));
            }
            ancestors.push(var.clone());
            let mut out = serde_json::Map::new();
            let children: Vec<_> = var.borrow().children().to_vec();
            for link in children {
                if !link.is_enumerable() {
                    continue;
                }
                let value = interp.read_link(execute, &WorkLink::from_link(link.clone()))?;
                out.insert(
                    link.name().as_str().to_string(),
                    var_to_json_inner(interp, execute, &value, ancestors)?,
                );
            }
            ancestors.pop();
            JsonValue::Object(out)
        }
    })
}

/// Convert a `serde_json::Value` into a value graph.
pub fn json_to_var(interp: &Interpreter, value: &JsonValue) -> VarRef {
    match value {
        JsonValue::Null => interp.null(),
        JsonValue::Bool(b) => interp.new_bool(*b),
        JsonValue::Number(n) => {
            if let Some(v) = n.as_i64() {
                if v >= i32::MIN as i64 && v <= i32::MAX as i64 {
                    return interp.new_int(v as i32);
                }
            }
            interp.new_double(n.as_f64().unwrap_or(f64::NAN))
        }
        JsonValue::String(s) => interp.new_string(s.as_str()),
        JsonValue::Array(values) => {
            let array = interp.new_array();
            for (idx, element) in values.iter().enumerate() {
                array.set_array_index(idx as i32, json_to_var(interp, element));
            }
            array
        }
        JsonValue::Object(map) => {
            let object = interp.new_object();
            for (key, element) in map {
                object.add_child_or_replace(
                    ScriptString::from(key.as_str()),
                    json_to_var(interp, element),
                    LinkFlags::DEFAULT,
                );
            }
            object
        }
    }
}
