//! Expression evaluation over the token buffer.
//!
//! Every helper takes the mutable `execute` flag and returns early work when
//! it is cleared; branch-not-taken traversal runs the same code with a local
//! `false` flag so the cursor still advances over the tokens (using skip
//! offsets where the tokenizer placed them).

use std::rc::Rc;

use crate::error::{ErrorKind, ScriptError};
use crate::token::{ObjectLiteralData, ObjectLiteralKind, TokenKind, TokenPayload};
use crate::tokenizer::TokenCursor;
use crate::value::{
    decimal_index, Link, LinkFlags, ScriptString, VarExt, VarRef, WorkLink, ACCESSOR_GET,
    ACCESSOR_SET, CONSTRUCTOR, PROTO, PROTOTYPE, THIS,
};

use super::Interpreter;

impl Interpreter {
    fn undefined_link(&self) -> WorkLink {
        WorkLink::from_var(self.undefined())
    }

    /// Primary expressions: literals, identifiers, `this`, grouping,
    /// object/array literals, `function`, `new`, and the let-expression.
    pub(crate) fn execute_literal(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        match t.kind() {
            TokenKind::Id => {
                if !*execute {
                    t.advance();
                    return Ok(self.undefined_link());
                }
                let name = t.token().text().clone();
                t.advance();
                match self.find_in_scopes(name.as_str()) {
                    Some(link) => Ok(link),
                    None => {
                        if name == THIS {
                            // Bare `this` outside any function is the root.
                            Ok(WorkLink::from_var(self.root.clone()))
                        } else {
                            // Unresolved name: reads raise a ReferenceError,
                            // assignment creates the binding on the root.
                            Ok(WorkLink::named(self.undefined(), name))
                        }
                    }
                }
            }
            TokenKind::Int => {
                let value = t.token().int();
                t.advance();
                let var = self.new_int(value);
                var.borrow_mut().extensible = false;
                Ok(WorkLink::from_var(var))
            }
            TokenKind::Float => {
                let value = t.token().float();
                t.advance();
                Ok(WorkLink::from_var(self.new_double(value)))
            }
            TokenKind::Str => {
                let value = t.token().text().clone();
                t.advance();
                Ok(WorkLink::from_var(self.new_string(value)))
            }
            TokenKind::RegExp => {
                let (source, flags) = match &t.token().payload {
                    TokenPayload::RegExp { source, flags } => (source.clone(), flags.clone()),
                    _ => (ScriptString::empty(), ScriptString::empty()),
                };
                t.advance();
                Ok(WorkLink::from_var(self.new_regexp(source, flags)))
            }
            TokenKind::True => {
                t.advance();
                Ok(WorkLink::from_var(self.new_bool(true)))
            }
            TokenKind::False => {
                t.advance();
                Ok(WorkLink::from_var(self.new_bool(false)))
            }
            TokenKind::Null => {
                t.advance();
                Ok(WorkLink::from_var(self.null()))
            }
            TokenKind::ObjectLiteral => {
                let data = t.token().object_literal().clone();
                t.advance();
                if !*execute {
                    return Ok(self.undefined_link());
                }
                self.execute_object_literal(t, execute, &data)
            }
            TokenKind::Let => {
                // let-expression: `let (bindings) expr`
                if !*execute {
                    t.skip_current();
                    return Ok(self.undefined_link());
                }
                t.advance();
                t.expect(TokenKind::LParen)?;
                let scope = self.new_let_scope();
                self.with_scope(Some(scope), |interp| {
                    interp.execute_statement(t, execute)?; // forwarder
                    interp.execute_var_init(t, execute, true)?;
                    t.expect(TokenKind::RParen)?;
                    let result = interp.execute_base(t, execute)?;
                    Ok(WorkLink::from_link(result))
                })
            }
            TokenKind::FunctionOperator | TokenKind::Get | TokenKind::Set => {
                if !*execute {
                    t.advance();
                    return Ok(self.undefined_link());
                }
                let data = t.token().function().clone();
                t.advance();
                let func = self.new_function(data.clone());
                Ok(WorkLink::from_link(Link::new(
                    func,
                    data.name.clone(),
                    LinkFlags::DEFAULT,
                )))
            }
            TokenKind::New => {
                if !*execute {
                    t.skip_current();
                    return Ok(self.undefined_link());
                }
                t.advance();
                self.execute_new(t, execute)
            }
            TokenKind::LParen => {
                if !*execute {
                    t.skip_current();
                    return Ok(self.undefined_link());
                }
                t.advance();
                let inner = self.execute_base(t, execute)?;
                t.expect(TokenKind::RParen)?;
                Ok(WorkLink::from_link(inner))
            }
            other => Err(ScriptError::syntax(
                format!("Got unexpected {}", other.describe()),
                t.file.as_str(),
                t.line(),
                t.column(),
            )),
        }
    }

    fn execute_object_literal(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
        data: &Rc<ObjectLiteralData>,
    ) -> Result<WorkLink, ScriptError> {
        if data.destructuring.get() {
            t.expect(TokenKind::Assign)?;
            let source = self.execute_assignment(t, execute)?;
            let value = source.var();
            if *execute {
                self.execute_destructuring(t, execute, data, &value)?;
            }
            return Ok(WorkLink::from_var(value));
        }

        let var = match data.kind {
            ObjectLiteralKind::Object => self.new_object(),
            ObjectLiteralKind::Array => self.new_array(),
        };
        for element in &data.elements {
            if !*execute {
                break;
            }
            if element.value.is_empty() {
                continue;
            }
            let first = &element.value[0];
            if first.kind == TokenKind::Get || first.kind == TokenKind::Set {
                let fnc = first.function().clone();
                let arity_ok = (first.kind == TokenKind::Get && fnc.params.is_empty())
                    || (first.kind == TokenKind::Set && fnc.params.len() == 1);
                if arity_ok {
                    let func = self.new_function(fnc.clone());
                    let accessor = match var.find_child(fnc.name.as_str()) {
                        Some(link) if link.var().borrow().is_accessor() => link.var(),
                        _ => {
                            let accessor = self.new_accessor();
                            var.add_child_or_replace(
                                fnc.name.clone(),
                                accessor.clone(),
                                LinkFlags::DEFAULT,
                            );
                            accessor
                        }
                    };
                    let slot = if first.kind == TokenKind::Get {
                        ACCESSOR_GET
                    } else {
                        ACCESSOR_SET
                    };
                    accessor.add_child_or_replace(
                        ScriptString::from(slot),
                        func,
                        LinkFlags::NONE,
                    );
                }
            } else {
                t.push_stream(element.value.clone());
                let value = self.execute_assignment(t, execute)?;
                var.add_child_or_replace(element.id.clone(), value.var(), LinkFlags::DEFAULT);
            }
        }
        Ok(WorkLink::from_var(var))
    }

    /// `new f(args)`: fresh object wired to `f.prototype`, optional
    /// `__constructor__` dispatch, non-object return values replaced by the
    /// new object.
    fn execute_new(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        let literal = self.execute_literal(t, execute)?;
        let (class_link, _) = self.execute_member(t, execute, literal)?;
        let class_var = self.read_link(execute, &class_link)?;
        if !*execute {
            if t.kind() == TokenKind::LParen {
                t.skip_current();
            }
            return Ok(self.undefined_link());
        }

        if !class_var.borrow().is_function() {
            let name = class_link.name();
            self.raise(
                t,
                execute,
                ErrorKind::TypeError,
                format!("{} is not a constructor", name),
            )?;
            if t.kind() == TokenKind::LParen {
                t.skip_current();
            }
            return Ok(self.undefined_link());
        }

        let obj = self.new_object();
        let prototype = match class_var.find_child(PROTOTYPE) {
            Some(link) if !link.var().borrow().is_nullish() => link.var(),
            _ => {
                let proto = self.new_object();
                class_var.add_child_or_replace(
                    ScriptString::from(PROTOTYPE),
                    proto.clone(),
                    LinkFlags::WRITABLE,
                );
                proto
            }
        };
        obj.add_child_or_replace(ScriptString::from(PROTO), prototype, LinkFlags::WRITABLE);

        let callee = match class_var.find_child(CONSTRUCTOR) {
            Some(link) if link.var().borrow().is_function() => link.var(),
            _ => class_var.clone(),
        };

        let mut args = Vec::new();
        if t.kind() == TokenKind::LParen {
            t.advance();
            while t.kind() != TokenKind::RParen {
                let value = self.execute_assignment(t, execute)?;
                if *execute {
                    args.push(value.var());
                }
                if t.kind() != TokenKind::RParen {
                    t.expect(TokenKind::Comma)?;
                }
            }
            t.expect(TokenKind::RParen)?;
        }
        if !*execute {
            return Ok(self.undefined_link());
        }

        let mut this_out = obj.clone();
        let result =
            self.call_function_with(execute, &callee, args, &obj, Some(&mut this_out))?;
        if result.borrow().is_object() {
            Ok(WorkLink::from_var(result))
        } else {
            Ok(WorkLink::from_var(this_out))
        }
    }

    /// `.name` / `[expr]` access. Returns the resolved member link and the
    /// object it was read from (the `this` for a following call).
    pub(crate) fn execute_member(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
        input: WorkLink,
    ) -> Result<(WorkLink, Option<VarRef>), ScriptError> {
        let mut a = input;
        let mut parent: Option<VarRef> = None;
        while t.kind() == TokenKind::Dot || t.kind() == TokenKind::LBracket {
            let obj = self.read_link(execute, &a)?;
            if *execute && obj.borrow().is_nullish() {
                let name = a.name();
                let text = obj.borrow().primitive_string();
                self.raise(
                    t,
                    execute,
                    ErrorKind::ReferenceError,
                    format!("{} is {}", name, text),
                )?;
            }
            let (name, is_index) = if t.kind() == TokenKind::Dot {
                t.advance();
                let name = t.token().text().clone();
                t.expect(TokenKind::Id)?;
                (name, false)
            } else if *execute {
                t.advance();
                let index = self.execute_base(t, execute)?;
                let index_var = index.var();
                let name = self.coerce_string(execute, &index_var)?;
                t.expect(TokenKind::RBracket)?;
                (ScriptString::from(name), true)
            } else {
                t.skip_current();
                a = self.undefined_link();
                continue;
            };
            if !*execute {
                a = self.undefined_link();
                continue;
            }

            match self.find_child_with_prototype_chain(&obj, name.as_str()) {
                Some(link) => {
                    let owned_here = link
                        .owner()
                        .map_or(false, |owner| Rc::ptr_eq(&owner, &obj));
                    if owned_here {
                        a = WorkLink::from_link(link);
                    } else {
                        // Found on the prototype chain: fake the accessed
                        // object as owner so assignment installs an own
                        // property, but remember the defining owner for
                        // accessor `this`.
                        let real_owner = link.owner();
                        let fresh = Link::new(link.var(), link.name(), link.flags());
                        fresh.set_owner(&obj);
                        a = WorkLink {
                            link: fresh,
                            referenced_owner: real_owner,
                        };
                    }
                }
                None => {
                    let is_string = obj.borrow().is_string();
                    if is_index && is_string && decimal_index(name.as_str()).is_some() {
                        // Character indexing on string values.
                        let idx = decimal_index(name.as_str()).unwrap_or(0) as usize;
                        let text = match &obj.borrow().kind {
                            crate::value::VarKind::String(s) => s.clone(),
                            _ => ScriptString::empty(),
                        };
                        let value = match text.as_str().chars().nth(idx) {
                            Some(c) => self.new_string(c.to_string()),
                            None => self.undefined(),
                        };
                        let fresh = Link::new(value, name, LinkFlags::NONE);
                        fresh.set_owner(&obj);
                        a = WorkLink::from_link(fresh);
                    } else {
                        let fresh = Link::new(self.undefined(), name, LinkFlags::DEFAULT);
                        fresh.set_owner(&obj);
                        a = WorkLink::from_link(fresh);
                    }
                }
            }
            parent = Some(obj);
        }
        Ok((a, parent))
    }

    pub(crate) fn execute_function_call(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        let literal = self.execute_literal(t, execute)?;
        let (mut a, mut parent) = self.execute_member(t, execute, literal)?;
        while t.kind() == TokenKind::LParen {
            if *execute {
                {
                    let target = a.var();
                    if target.borrow().is_nullish() {
                        let name = a.name();
                        let text = target.borrow().primitive_string();
                        self.raise(
                            t,
                            execute,
                            ErrorKind::ReferenceError,
                            format!("{} is {}", name, text),
                        )?;
                    }
                }
                let func = self.read_link(execute, &a)?;
                if *execute && !func.borrow().is_function() {
                    let name = a.name();
                    self.raise(
                        t,
                        execute,
                        ErrorKind::TypeError,
                        format!("{} is not a function", name),
                    )?;
                }
                t.advance(); // (
                let mut args = Vec::new();
                while t.kind() != TokenKind::RParen {
                    let value = self.execute_assignment(t, execute)?;
                    if *execute {
                        args.push(value.var());
                    }
                    if t.kind() != TokenKind::RParen {
                        t.expect(TokenKind::Comma)?;
                    }
                }
                t.expect(TokenKind::RParen)?;
                if *execute {
                    let this = match &parent {
                        Some(obj) => obj.clone(),
                        None => self
                            .find_in_scopes(THIS)
                            .map(|link| link.var())
                            .unwrap_or_else(|| self.root.clone()),
                    };
                    let result = self.call_function_with(execute, &func, args, &this, None)?;
                    a = WorkLink::from_var(result);
                }
            } else {
                t.skip_current();
            }
            let (next, next_parent) = self.execute_member(t, execute, a)?;
            a = next;
            parent = next_parent;
        }
        Ok(a)
    }

    pub(crate) fn execute_unary(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        let mut a;
        match t.kind() {
            TokenKind::Minus => {
                t.advance();
                a = self.execute_unary(t, execute)?;
                if *execute {
                    self.check_defined(t, execute, &a)?;
                    let value = self.read_link(execute, &a)?;
                    let zero = self.const_zero.clone();
                    let result = self.maths_op(execute, &zero, &value, TokenKind::Minus)?;
                    a = WorkLink::from_var(result);
                }
            }
            TokenKind::Plus => {
                t.advance();
                a = self.execute_unary(t, execute)?;
                if *execute {
                    self.check_defined(t, execute, &a)?;
                    let value = self.read_link(execute, &a)?;
                    let numeric = self.coerce_numeric(execute, &value)?;
                    a = WorkLink::from_var(numeric);
                }
            }
            TokenKind::Not => {
                t.advance();
                a = self.execute_unary(t, execute)?;
                if *execute {
                    self.check_defined(t, execute, &a)?;
                    let value = self.read_link(execute, &a)?;
                    let zero = self.const_zero.clone();
                    let result = self.maths_op(execute, &value, &zero, TokenKind::Equal)?;
                    a = WorkLink::from_var(result);
                }
            }
            TokenKind::Tilde => {
                t.advance();
                a = self.execute_unary(t, execute)?;
                if *execute {
                    self.check_defined(t, execute, &a)?;
                    let value = self.read_link(execute, &a)?;
                    let zero = self.const_zero.clone();
                    let result = self.maths_op(execute, &value, &zero, TokenKind::Tilde)?;
                    a = WorkLink::from_var(result);
                }
            }
            TokenKind::Typeof => {
                t.advance();
                a = self.execute_unary(t, execute)?;
                if *execute {
                    self.check_defined(t, execute, &a)?;
                    let value = self.read_link(execute, &a)?;
                    let type_name = value.borrow().type_of();
                    a = WorkLink::from_var(self.new_string(type_name));
                }
            }
            TokenKind::Void => {
                t.advance();
                a = self.execute_unary(t, execute)?;
                if *execute {
                    self.check_defined(t, execute, &a)?;
                    self.read_link(execute, &a)?;
                    a = self.undefined_link();
                }
            }
            TokenKind::Delete => {
                t.advance();
                // No getter here: delete may remove an accessor property.
                a = self.execute_unary(t, execute)?;
                if *execute {
                    let deleted = if a.link.is_owned() && a.link.is_configurable() {
                        match a.link.owner() {
                            Some(owner) => owner.remove_link(&a.link),
                            None => false,
                        }
                    } else {
                        false
                    };
                    a = WorkLink::from_var(self.new_bool(deleted));
                }
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if t.kind() == TokenKind::PlusPlus {
                    TokenKind::Plus
                } else {
                    TokenKind::Minus
                };
                t.advance();
                a = self.execute_function_call(t, execute)?;
                if *execute {
                    let value = self.read_link(execute, &a)?;
                    let one = self.const_one.clone();
                    let result = self.maths_op(execute, &value, &one, op)?;
                    self.write_link(execute, &a, result.clone())?;
                    a = WorkLink::from_var(result);
                }
            }
            _ => {
                a = self.execute_function_call(t, execute)?;
            }
        }
        // Postfix increment/decrement: the expression yields the old
        // numeric value.
        if t.kind() == TokenKind::PlusPlus || t.kind() == TokenKind::MinusMinus {
            let op = if t.kind() == TokenKind::PlusPlus {
                TokenKind::Plus
            } else {
                TokenKind::Minus
            };
            t.advance();
            if *execute {
                let value = self.read_link(execute, &a)?;
                let old = self.coerce_numeric(execute, &value)?;
                let one = self.const_one.clone();
                let result = self.maths_op(execute, &old, &one, op)?;
                self.write_link(execute, &a, result)?;
                a = WorkLink::from_var(old);
            }
        }
        Ok(a)
    }

    fn execute_binary_chain(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
        ops: &[TokenKind],
        next: fn(&mut Interpreter, &mut TokenCursor, &mut bool) -> Result<WorkLink, ScriptError>,
    ) -> Result<WorkLink, ScriptError> {
        let mut a = next(self, t, execute)?;
        if ops.contains(&t.kind()) {
            self.check_defined(t, execute, &a)?;
            while ops.contains(&t.kind()) {
                let op = t.kind();
                t.advance();
                let b = next(self, t, execute)?;
                if *execute {
                    self.check_defined(t, execute, &b)?;
                    let av = self.read_link(execute, &a)?;
                    let bv = self.read_link(execute, &b)?;
                    let result = self.maths_op(execute, &av, &bv, op)?;
                    a = WorkLink::from_var(result);
                }
            }
        }
        Ok(a)
    }

    fn execute_term(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        self.execute_binary_chain(
            t,
            execute,
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::execute_unary,
        )
    }

    fn execute_additive(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        self.execute_binary_chain(
            t,
            execute,
            &[TokenKind::Plus, TokenKind::Minus],
            Self::execute_term,
        )
    }

    fn execute_shift(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        self.execute_binary_chain(
            t,
            execute,
            &[TokenKind::Shl, TokenKind::Shr, TokenKind::ShrU],
            Self::execute_additive,
        )
    }

    /// Relational operators including `in` and `instanceof`.
    fn execute_compare(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        const OPS: [TokenKind; 6] = [
            TokenKind::Lt,
            TokenKind::LessEqual,
            TokenKind::Gt,
            TokenKind::GreaterEqual,
            TokenKind::In,
            TokenKind::Instanceof,
        ];
        let mut a = self.execute_shift(t, execute)?;
        if OPS.contains(&t.kind()) {
            self.check_defined(t, execute, &a)?;
            let mut av = self.read_link(execute, &a)?;
            while OPS.contains(&t.kind()) {
                let op = t.kind();
                t.advance();
                let b = self.execute_shift(t, execute)?;
                if *execute {
                    self.check_defined(t, execute, &b)?;
                    let b_name = b.name();
                    let bv = self.read_link(execute, &b)?;
                    match op {
                        TokenKind::In => {
                            let key = self.coerce_string(execute, &av)?;
                            let found =
                                self.find_child_with_prototype_chain(&bv, &key).is_some();
                            av = self.new_bool(found);
                        }
                        TokenKind::Instanceof => match bv.find_child(PROTOTYPE) {
                            None => {
                                self.raise(
                                    t,
                                    execute,
                                    ErrorKind::TypeError,
                                    format!("invalid 'instanceof' operand {}", b_name),
                                )?;
                            }
                            Some(prototype) => {
                                let target = prototype.var();
                                let id = self.heap.next_unique_id();
                                let mut object = av.proto();
                                let mut matched = false;
                                while let Some(current) = object {
                                    if Rc::ptr_eq(&current, &target) {
                                        matched = true;
                                        break;
                                    }
                                    if current.borrow().temporary_id == id {
                                        break;
                                    }
                                    current.borrow_mut().temporary_id = id;
                                    object = current.proto();
                                }
                                av = self.new_bool(matched);
                            }
                        },
                        _ => {
                            av = self.maths_op(execute, &av, &bv, op)?;
                        }
                    }
                }
            }
            a = WorkLink::from_var(av);
        }
        Ok(a)
    }

    fn execute_equality(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        self.execute_binary_chain(
            t,
            execute,
            &[
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::StrictEqual,
                TokenKind::StrictNotEqual,
            ],
            Self::execute_compare,
        )
    }

    fn execute_bit_and(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        self.execute_binary_chain(t, execute, &[TokenKind::Amp], Self::execute_equality)
    }

    fn execute_bit_xor(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        self.execute_binary_chain(t, execute, &[TokenKind::Caret], Self::execute_bit_and)
    }

    fn execute_bit_or(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        self.execute_binary_chain(t, execute, &[TokenKind::Pipe], Self::execute_bit_xor)
    }

    fn execute_logic_chain(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
        op: TokenKind,
        next: fn(&mut Interpreter, &mut TokenCursor, &mut bool) -> Result<WorkLink, ScriptError>,
    ) -> Result<WorkLink, ScriptError> {
        let a = next(self, t, execute)?;
        if t.kind() != op {
            return Ok(a);
        }
        if !*execute {
            while t.kind() == op {
                t.advance();
                let mut skip = false;
                next(self, t, &mut skip)?;
            }
            return Ok(a);
        }

        self.check_defined(t, execute, &a)?;
        let first = self.read_link(execute, &a)?;
        let mut result_bool = self.coerce_bool(execute, &first)?;
        let mut b = WorkLink::from_var(first);
        let mut short_circuit = false;
        while t.kind() == op {
            t.advance();
            short_circuit = if op == TokenKind::AndAnd {
                !result_bool
            } else {
                result_bool
            };
            if short_circuit {
                let mut skip = false;
                next(self, t, &mut skip)?;
            } else {
                let rhs = next(self, t, execute)?;
                if *execute {
                    self.check_defined(t, execute, &rhs)?;
                    let value = self.read_link(execute, &rhs)?;
                    let value_bool = self.coerce_bool(execute, &value)?;
                    b = WorkLink::from_var(value);
                    result_bool = if op == TokenKind::AndAnd {
                        result_bool && value_bool
                    } else {
                        result_bool || value_bool
                    };
                }
            }
        }
        if result_bool && ((op == TokenKind::AndAnd && !short_circuit) || op == TokenKind::OrOr) {
            Ok(b)
        } else {
            Ok(WorkLink::from_var(self.new_bool(false)))
        }
    }

    fn execute_logic_and(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        self.execute_logic_chain(t, execute, TokenKind::AndAnd, Self::execute_bit_or)
    }

    fn execute_logic_or(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        self.execute_logic_chain(t, execute, TokenKind::OrOr, Self::execute_logic_and)
    }

    pub(crate) fn execute_condition(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<WorkLink, ScriptError> {
        let a = self.execute_logic_or(t, execute)?;
        if t.kind() != TokenKind::Question {
            return Ok(a);
        }
        self.check_defined(t, execute, &a)?;
        t.advance();
        let value = self.read_link(execute, &a)?;
        let condition = *execute && self.coerce_bool(execute, &value)?;

        let mut skip_first = false;
        let mut skip_second = false;
        let first = if condition {
            self.execute_condition(t, execute)?
        } else {
            self.execute_condition(t, &mut skip_first)?
        };
        t.expect(TokenKind::Colon)?;
        let second = if condition {
            self.execute_condition(t, &mut skip_second)?
        } else {
            self.execute_condition(t, execute)?
        };
        Ok(if condition { first } else { second })
    }

    /// Assignment level. The returned link always carries the final value
    /// (getters already applied).
    pub(crate) fn execute_assignment(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<Link, ScriptError> {
        let lhs = self.execute_condition(t, execute)?;
        self.execute_assignment_with(t, execute, lhs)
    }

    fn execute_assignment_with(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
        lhs: WorkLink,
    ) -> Result<Link, ScriptError> {
        if !t.kind().is_assignment() {
            self.check_defined(t, execute, &lhs)?;
            let value = self.read_link(execute, &lhs)?;
            return Ok(Link::temp(value));
        }

        let op = t.kind();
        let line = t.line();
        let column = t.column();
        t.advance();
        let rhs = self.execute_assignment(t, execute)?;
        let rhs_value = rhs.var();
        if !*execute {
            return Ok(Link::temp(rhs_value));
        }

        if !lhs.link.is_owned() && !lhs.link.has_owner() && lhs.name().is_empty() {
            return Err(ScriptError::new(
                ErrorKind::ReferenceError,
                "invalid assignment left-hand side (at runtime)",
                t.file.as_str(),
                line,
                column,
            ));
        }
        if op != TokenKind::Assign && !lhs.link.is_owned() {
            let name = lhs.name();
            self.raise(
                t,
                execute,
                ErrorKind::ReferenceError,
                format!("{} is not defined", name),
            )?;
            return Ok(Link::temp(rhs_value));
        }
        if !lhs.link.is_writable() {
            // Non-writable property: the assignment is silently ignored.
            return Ok(Link::temp(rhs_value));
        }

        if op == TokenKind::Assign {
            if let Some(target) = self.promote_link(&lhs) {
                self.write_link(execute, &target, rhs_value.clone())?;
            }
            Ok(Link::temp(rhs_value))
        } else {
            let base_op = op
                .compound_assignment_op()
                .unwrap_or(TokenKind::Plus);
            let lv = self.read_link(execute, &lhs)?;
            let result = self.maths_op(execute, &lv, &rhs_value, base_op)?;
            self.write_link(execute, &lhs, result.clone())?;
            Ok(Link::temp(result))
        }
    }

    /// Promote a borrowed link so a write lands on an owner: existing owned
    /// links pass through, faked owners get an own property installed,
    /// owner-less named links become globals. Returns `None` when the owner
    /// is not extensible.
    pub(crate) fn promote_link(&mut self, lhs: &WorkLink) -> Option<WorkLink> {
        if lhs.link.is_owned() {
            return Some(lhs.clone());
        }
        match lhs.link.owner() {
            Some(owner) => {
                if !owner.borrow().extensible {
                    return None;
                }
                let link =
                    owner.add_child_or_replace(lhs.name(), lhs.var(), LinkFlags::DEFAULT);
                Some(WorkLink {
                    link,
                    referenced_owner: lhs.referenced_owner.clone(),
                })
            }
            None => {
                let link = self
                    .root
                    .add_child_or_replace(lhs.name(), lhs.var(), LinkFlags::DEFAULT);
                Some(WorkLink::from_link(link))
            }
        }
    }

    /// Comma level.
    pub(crate) fn execute_base(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<Link, ScriptError> {
        let mut a = self.execute_assignment(t, execute)?;
        while t.kind() == TokenKind::Comma {
            t.advance();
            a = self.execute_assignment(t, execute)?;
        }
        Ok(a)
    }

    /// Replay a destructuring object-literal pattern against `value`.
    pub(crate) fn execute_destructuring(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
        data: &Rc<ObjectLiteralData>,
        value: &VarRef,
    ) -> Result<(), ScriptError> {
        for element in &data.elements {
            if !*execute {
                break;
            }
            if element.value.is_empty() {
                continue;
            }
            let rhs = match value.find_child(element.id.as_str()) {
                Some(link) => self.read_link(execute, &WorkLink::from_link(link))?,
                None => self.undefined(),
            };
            let first = &element.value[0];
            if first.kind == TokenKind::ObjectLiteral && first.object_literal().destructuring.get()
            {
                self.execute_destructuring(t, execute, first.object_literal(), &rhs)?;
            } else {
                t.push_stream(element.value.clone());
                let lhs = self.execute_condition(t, execute)?;
                if let Some(target) = self.promote_link(&lhs) {
                    self.write_link(execute, &target, rhs)?;
                }
            }
        }
        Ok(())
    }
}
