//! Statement evaluation: blocks, declarations, control flow, exceptions.

use crate::error::{ErrorKind, ScriptError};
use crate::token::{DestructuringData, PatternItem, TokenKind};
use crate::tokenizer::{CursorPos, TokenCursor};
use crate::value::{
    compare_property_names, Link, LinkFlags, ScriptString, VarExt, VarRef, WorkLink, RETURN_SLOT,
};

use super::Interpreter;

/// Where a destructuring replay binds its names.
pub(crate) enum DestructureTarget<'a> {
    /// Install directly on a scope (parameter binding).
    Scope(&'a VarRef),
    /// Resolve each name through the scope chain (var/let initializers).
    Bindings,
}

impl Interpreter {
    /// Execute one statement; expression statements yield their value.
    pub(crate) fn execute_statement(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<Option<Link>, ScriptError> {
        let mut ret = None;
        match t.kind() {
            TokenKind::LBrace => self.execute_block(t, execute, true)?,
            TokenKind::Semicolon => t.advance(),
            TokenKind::Eof => t.advance(),
            TokenKind::Forward => self.execute_forwarder(t)?,
            TokenKind::Var | TokenKind::Let => self.execute_declaration(t, execute)?,
            TokenKind::With => self.execute_with(t, execute)?,
            TokenKind::If => self.execute_if(t, execute)?,
            TokenKind::Do => self.execute_do(t, execute)?,
            TokenKind::While => self.execute_while(t, execute)?,
            TokenKind::ForIn | TokenKind::ForEachIn => self.execute_for_in(t, execute)?,
            TokenKind::For => self.execute_for(t, execute)?,
            TokenKind::Break | TokenKind::Continue => {
                if *execute {
                    let is_break = t.kind() == TokenKind::Break;
                    t.advance();
                    if t.kind() == TokenKind::Id {
                        self.label = Some(t.token().text().clone());
                        t.advance();
                    }
                    t.expect(TokenKind::Semicolon)?;
                    if is_break {
                        self.flags.breaking = true;
                    } else {
                        self.flags.continuing = true;
                    }
                    *execute = false;
                } else {
                    t.skip_current();
                }
            }
            TokenKind::Return => {
                if *execute {
                    t.advance();
                    let mut result = None;
                    if t.kind() != TokenKind::Semicolon {
                        result = Some(self.execute_base(t, execute)?);
                    }
                    t.expect(TokenKind::Semicolon)?;
                    if *execute {
                        if let Some(result) = result {
                            let scope = self.scope();
                            let target = self.scope_var_target(&scope);
                            target.add_child_or_replace(
                                ScriptString::from(RETURN_SLOT),
                                result.var(),
                                LinkFlags::DEFAULT,
                            );
                        }
                        *execute = false;
                    }
                } else {
                    t.skip_current();
                }
            }
            TokenKind::Function | TokenKind::FunctionPlaceholder => {
                if t.kind() == TokenKind::Function && *execute {
                    let data = t.token().function().clone();
                    let func = self.new_function(data.clone());
                    let scope = self.scope();
                    let target = self.scope_var_target(&scope);
                    target.add_child_or_replace(data.name.clone(), func, LinkFlags::VAR);
                }
                t.advance();
            }
            TokenKind::Try => self.execute_try(t, execute)?,
            TokenKind::Throw => {
                if *execute {
                    let line = t.line();
                    let column = t.column();
                    t.advance();
                    let value = self.execute_base(t, execute)?;
                    t.expect(TokenKind::Semicolon)?;
                    if *execute {
                        if self.flags.can_throw {
                            self.flags.throwing = true;
                            *execute = false;
                            self.exception = Some(value.var());
                        } else {
                            let mut side = true;
                            let var = value.var();
                            let text = self
                                .coerce_string(&mut side, &var)
                                .unwrap_or_else(|_| var.borrow().primitive_string());
                            return Err(ScriptError::new(
                                ErrorKind::Error,
                                format!("uncaught exception: '{}'", text),
                                t.file.as_str(),
                                line,
                                column,
                            ));
                        }
                    }
                } else {
                    t.skip_current();
                }
            }
            TokenKind::Switch => self.execute_switch(t, execute)?,
            TokenKind::Label => {
                let label = t.token().text().clone();
                t.advance();
                t.expect(TokenKind::Colon)?;
                if *execute {
                    self.execute_statement(t, execute)?;
                    if !*execute
                        && self.flags.breaking
                        && self.label.as_ref() == Some(&label)
                    {
                        self.flags.breaking = false;
                        self.label = None;
                        *execute = true;
                    }
                } else {
                    let mut skip = false;
                    self.execute_statement(t, &mut skip)?;
                }
            }
            TokenKind::DummyLabel => {
                // A label that was rewritten onto a loop head; the loop
                // itself matches it against the injected loop labels.
                t.advance();
                t.expect(TokenKind::Colon)?;
                ret = self.execute_statement(t, execute)?;
            }
            _ => {
                ret = Some(self.execute_base(t, execute)?);
                t.expect(TokenKind::Semicolon)?;
            }
        }
        Ok(ret)
    }

    /// `{ … }`. A let-scope is pushed only when the block's forwarder binds
    /// any `let`; function bodies pass `create_let_scope = false` so their
    /// lets land on the function scope itself.
    pub(crate) fn execute_block(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
        create_let_scope: bool,
    ) -> Result<(), ScriptError> {
        if !*execute {
            t.skip_current();
            return Ok(());
        }
        t.expect(TokenKind::LBrace)?;
        let scope = if create_let_scope
            && t.kind() == TokenKind::Forward
            && !t.token().forwarder().lets.borrow().is_empty()
        {
            Some(self.new_let_scope())
        } else {
            None
        };
        self.with_scope(scope, |interp| -> Result<(), ScriptError> {
            while t.kind() != TokenKind::RBrace && t.kind() != TokenKind::Eof {
                interp.execute_statement(t, execute)?;
            }
            t.expect(TokenKind::RBrace)?;
            Ok(())
        })
    }

    /// Install the block's hoisted bindings: lets on the let-target, vars
    /// and hoisted functions on the var-target.
    fn execute_forwarder(&mut self, t: &mut TokenCursor) -> Result<(), ScriptError> {
        let data = t.token().forwarder().clone();
        let scope = self.scope();
        let let_target = self.scope_let_target(&scope);
        for name in data.lets.borrow().iter() {
            if let_target.find_child(name.as_str()).is_none() {
                let_target.add_child(name.clone(), self.undefined(), LinkFlags::VAR);
            }
        }
        let var_target = self.scope_var_target(&scope);
        for name in data.vars.borrow().iter() {
            if var_target.find_child(name.as_str()).is_none() {
                var_target.add_child(name.clone(), self.undefined(), LinkFlags::VAR);
            }
        }
        for fnc in data.functions.borrow().iter() {
            let func = self.new_function(fnc.clone());
            var_target.add_child_or_replace(fnc.name.clone(), func, LinkFlags::VAR);
        }
        t.advance();
        Ok(())
    }

    /// `var` / `let` statements (bindings are hoisted; only initializers
    /// run), including the `let (…) statement` extended form.
    fn execute_declaration(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<(), ScriptError> {
        if !*execute {
            t.skip_current();
            return Ok(());
        }
        let is_let = t.kind() == TokenKind::Let;
        t.advance();
        if is_let && t.kind() == TokenKind::LParen {
            t.advance();
            let scope = self.new_let_scope();
            return self.with_scope(Some(scope), |interp| -> Result<(), ScriptError> {
                interp.execute_statement(t, execute)?; // forwarder
                interp.execute_var_init(t, execute, true)?;
                t.expect(TokenKind::RParen)?;
                if t.kind() == TokenKind::LBrace {
                    interp.execute_block(t, execute, false)?;
                } else {
                    interp.execute_statement(t, execute)?;
                }
                Ok(())
            });
        }
        self.execute_var_init(t, execute, false)?;
        t.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    /// Run the initializers of a declaration list. With `hide_let_scope`
    /// the current let-scope is bypassed while initializer expressions
    /// evaluate (let-expression semantics).
    pub(crate) fn execute_var_init(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
        hide_let_scope: bool,
    ) -> Result<(), ScriptError> {
        loop {
            if t.kind() == TokenKind::DestructuringVar {
                let pattern = t.token().destructuring().clone();
                t.advance();
                t.expect(TokenKind::Assign)?;
                if hide_let_scope {
                    let scope = self.scope();
                    self.set_let_scope_hidden(&scope, true);
                }
                let value = self.execute_assignment(t, execute);
                if hide_let_scope {
                    let scope = self.scope();
                    self.set_let_scope_hidden(&scope, false);
                }
                let value = value?.var();
                if *execute {
                    self.run_destructuring(
                        execute,
                        &pattern,
                        &value,
                        DestructureTarget::Bindings,
                    )?;
                }
            } else {
                let name = t.token().text().clone();
                t.expect(TokenKind::Id)?;
                if t.kind() == TokenKind::Assign {
                    t.advance();
                    let binding = self.find_in_scopes(name.as_str());
                    if hide_let_scope {
                        let scope = self.scope();
                        self.set_let_scope_hidden(&scope, true);
                    }
                    let value = self.execute_assignment(t, execute);
                    if hide_let_scope {
                        let scope = self.scope();
                        self.set_let_scope_hidden(&scope, false);
                    }
                    let value = value?.var();
                    if let Some(binding) = binding {
                        self.write_link(execute, &binding, value)?;
                    }
                }
            }
            if t.kind() == TokenKind::Comma {
                t.advance();
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Replay a pre-parsed destructuring script with a path stack.
    pub(crate) fn run_destructuring(
        &mut self,
        execute: &mut bool,
        pattern: &DestructuringData,
        value: &VarRef,
        target: DestructureTarget<'_>,
    ) -> Result<(), ScriptError> {
        let steps = &pattern.steps;
        if steps.is_empty() {
            return Ok(());
        }
        let mut path: Vec<VarRef> = vec![value.clone()];
        for step in &steps[1..] {
            if !*execute {
                break;
            }
            match &step.item {
                PatternItem::Skip => {}
                PatternItem::Leave => {
                    path.pop();
                }
                PatternItem::Enter(_) => {
                    let base = path.last().cloned().unwrap_or_else(|| self.undefined());
                    let nested = self.own_member_value(execute, &base, step.path.as_str())?;
                    path.push(nested);
                }
                PatternItem::Bind(name) => {
                    let base = path.last().cloned().unwrap_or_else(|| self.undefined());
                    let bound = self.own_member_value(execute, &base, step.path.as_str())?;
                    if !*execute {
                        break;
                    }
                    match &target {
                        DestructureTarget::Scope(scope) => {
                            scope.add_child_or_replace(name.clone(), bound, LinkFlags::DEFAULT);
                        }
                        DestructureTarget::Bindings => {
                            if let Some(binding) = self.find_in_scopes(name.as_str()) {
                                self.write_link(execute, &binding, bound)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Parameter binding variant of the destructuring replay.
    pub(crate) fn destructure_into_scope(
        &mut self,
        execute: &mut bool,
        scope: &VarRef,
        pattern: &DestructuringData,
        value: &VarRef,
    ) -> Result<(), ScriptError> {
        self.run_destructuring(execute, pattern, value, DestructureTarget::Scope(scope))
    }

    /// Own-property read with getter dispatch; missing property reads as
    /// undefined.
    fn own_member_value(
        &mut self,
        execute: &mut bool,
        owner: &VarRef,
        name: &str,
    ) -> Result<VarRef, ScriptError> {
        match owner.find_child(name) {
            Some(link) => self.read_link(execute, &WorkLink::from_link(link)),
            None => Ok(self.undefined()),
        }
    }

    fn execute_with(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<(), ScriptError> {
        if !*execute {
            t.skip_current();
            return Ok(());
        }
        t.advance();
        t.expect(TokenKind::LParen)?;
        let target = self.execute_base(t, execute)?;
        t.expect(TokenKind::RParen)?;
        let scope = self.new_with_scope(target.var());
        self.with_scope(Some(scope), |interp| {
            interp.execute_statement(t, execute).map(|_| ())
        })
    }

    fn execute_if(&mut self, t: &mut TokenCursor, execute: &mut bool) -> Result<(), ScriptError> {
        if !*execute {
            t.skip_current();
            return Ok(());
        }
        t.advance();
        t.expect(TokenKind::LParen)?;
        let cond_link = self.execute_base(t, execute)?;
        let cond_var = cond_link.var();
        let condition = *execute && self.coerce_bool(execute, &cond_var)?;
        t.expect(TokenKind::RParen)?;
        if condition && *execute {
            t.expect(TokenKind::Skip)?;
            self.execute_statement(t, execute)?;
        } else {
            t.skip_current();
        }
        if t.kind() == TokenKind::Else {
            if !condition && *execute {
                t.advance();
                self.execute_statement(t, execute)?;
            } else {
                t.skip_current();
            }
        }
        Ok(())
    }

    /// Shared break/continue unwinding for loops. Returns true when the
    /// loop should keep iterating (a matched `continue`).
    fn handle_loop_unwind(&mut self, execute: &mut bool, labels: &[ScriptString]) -> bool {
        let mut keep_going = false;
        if self.flags.breaking || self.flags.continuing {
            let matches = match &self.label {
                None => true,
                Some(label) => labels.iter().any(|candidate| candidate == label),
            };
            if matches {
                self.label = None;
                *execute = true;
                keep_going = self.flags.continuing;
                self.flags.breaking = false;
                self.flags.continuing = false;
            }
        }
        keep_going
    }

    fn collect_loop_labels(&mut self, t: &mut TokenCursor) -> Vec<ScriptString> {
        let mut labels = Vec::new();
        while t.kind() == TokenKind::LoopLabel {
            labels.push(t.token().text().clone());
            t.advance();
        }
        labels
    }

    fn execute_do(&mut self, t: &mut TokenCursor, execute: &mut bool) -> Result<(), ScriptError> {
        if !*execute {
            t.skip_current();
            return Ok(());
        }
        t.advance();
        let labels = self.collect_loop_labels(t);
        let loop_start = t.position();
        let mut loop_cond = true;
        while loop_cond && *execute {
            t.set_position(&loop_start);
            self.execute_statement(t, execute)?;
            if !*execute {
                let keep_going = self.handle_loop_unwind(execute, &labels);
                if !keep_going {
                    // Jump over the trailing while-part.
                    if t.kind() == TokenKind::While {
                        t.skip_current();
                    }
                    break;
                }
            }
            t.expect(TokenKind::While)?;
            t.expect(TokenKind::LParen)?;
            let cond = self.execute_base(t, execute)?;
            let cond_var = cond.var();
            loop_cond = *execute && self.coerce_bool(execute, &cond_var)?;
            t.expect(TokenKind::RParen)?;
            t.expect(TokenKind::Semicolon)?;
        }
        Ok(())
    }

    fn execute_while(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<(), ScriptError> {
        if !*execute {
            t.skip_current();
            return Ok(());
        }
        t.advance();
        let labels = self.collect_loop_labels(t);
        t.expect(TokenKind::LParen)?;
        let cond_start = t.position();
        let cond = self.execute_base(t, execute)?;
        let cond_var = cond.var();
        let mut loop_cond = *execute && self.coerce_bool(execute, &cond_var)?;
        t.expect(TokenKind::RParen)?;
        if loop_cond && *execute {
            t.expect(TokenKind::Skip)?;
            let loop_start = t.position();
            let mut loop_end: Option<CursorPos> = None;
            while loop_cond && *execute {
                t.set_position(&loop_start);
                self.execute_statement(t, execute)?;
                if loop_end.is_none() {
                    loop_end = Some(t.position());
                }
                if !*execute && !self.handle_loop_unwind(execute, &labels) {
                    break;
                }
                if *execute {
                    t.set_position(&cond_start);
                    let cond = self.execute_base(t, execute)?;
                    let cond_var = cond.var();
                    loop_cond = *execute && self.coerce_bool(execute, &cond_var)?;
                }
            }
            if let Some(end) = loop_end {
                t.set_position(&end);
            }
        } else {
            t.skip_current();
        }
        Ok(())
    }

    fn execute_for(&mut self, t: &mut TokenCursor, execute: &mut bool) -> Result<(), ScriptError> {
        if !*execute {
            t.skip_current();
            return Ok(());
        }
        t.advance();
        let labels = self.collect_loop_labels(t);
        t.expect(TokenKind::LParen)?;
        let scope = if t.kind() == TokenKind::Forward {
            Some(self.new_let_scope())
        } else {
            None
        };
        self.with_scope(scope, |interp| -> Result<(), ScriptError> {
            if t.kind() == TokenKind::Forward {
                interp.execute_statement(t, execute)?;
            }
            interp.execute_statement(t, execute)?; // initialisation

            let cond_start = t.position();
            let mut cond_empty = true;
            let mut loop_cond = *execute; // empty condition: always true
            if t.kind() != TokenKind::Semicolon {
                cond_empty = false;
                let cond = interp.execute_base(t, execute)?;
                let cond_var = cond.var();
                loop_cond = *execute && interp.coerce_bool(execute, &cond_var)?;
            }
            t.expect(TokenKind::Semicolon)?;

            let iter_start = t.position();
            let mut iter_empty = true;
            if t.kind() != TokenKind::RParen {
                iter_empty = false;
                let mut skip = false;
                interp.execute_base(t, &mut skip)?;
            }
            t.expect(TokenKind::RParen)?;

            if loop_cond {
                let loop_start = t.position();
                let mut loop_end: Option<CursorPos> = None;
                while loop_cond && *execute {
                    t.set_position(&loop_start);
                    interp.execute_statement(t, execute)?;
                    if loop_end.is_none() {
                        loop_end = Some(t.position());
                    }
                    if !*execute && !interp.handle_loop_unwind(execute, &labels) {
                        break;
                    }
                    if *execute {
                        if !iter_empty {
                            t.set_position(&iter_start);
                            interp.execute_base(t, execute)?;
                        }
                        if !cond_empty {
                            t.set_position(&cond_start);
                            let cond = interp.execute_base(t, execute)?;
                            let cond_var = cond.var();
                            loop_cond = *execute && interp.coerce_bool(execute, &cond_var)?;
                        }
                    }
                }
                if let Some(end) = loop_end {
                    t.set_position(&end);
                }
            } else {
                let mut skip = false;
                interp.execute_statement(t, &mut skip)?;
            }
            Ok(())
        })
    }

    /// `for (x in o)` iterates keys, `for each (x in o)` iterates values.
    /// The key set is gathered once at loop start (own + prototype chain,
    /// deduplicated); the loop variable binding is reused across iterations.
    fn execute_for_in(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<(), ScriptError> {
        if !*execute {
            t.skip_current();
            return Ok(());
        }
        let for_each = t.kind() == TokenKind::ForEachIn;
        t.advance();
        let labels = self.collect_loop_labels(t);
        t.expect(TokenKind::LParen)?;
        let scope = self.new_let_scope();
        self.with_scope(Some(scope), |interp| -> Result<(), ScriptError> {
            if t.kind() == TokenKind::Forward {
                interp.execute_statement(t, execute)?;
            }
            let for_var = if t.kind() == TokenKind::Let {
                t.advance();
                let name = t.token().text().clone();
                t.expect(TokenKind::Id)?;
                let scope = interp.scope();
                let target = interp.scope_let_target(&scope);
                let link = match target.find_child(name.as_str()) {
                    Some(link) => link,
                    None => target.add_child(name, interp.undefined(), LinkFlags::VAR),
                };
                WorkLink::from_link(link)
            } else {
                interp.execute_function_call(t, execute)?
            };
            t.expect(TokenKind::In)?;
            let container_link = interp.execute_function_call(t, execute)?;
            interp.check_defined(t, execute, &container_link)?;
            let container = interp.read_link(execute, &container_link)?;
            t.expect(TokenKind::RParen)?;
            if !*execute {
                let mut skip = false;
                interp.execute_statement(t, &mut skip)?;
                return Ok(());
            }

            let mut keys: Vec<ScriptString> = Vec::new();
            container.collect_keys(&mut keys, true, interp.heap.next_unique_id());
            keys.sort_by(|a, b| compare_property_names(a.as_str(), b.as_str()));
            keys.dedup();

            if keys.is_empty() {
                let mut skip = false;
                interp.execute_statement(t, &mut skip)?;
                return Ok(());
            }

            let bound = match interp.promote_link(&for_var) {
                Some(link) => link,
                None => for_var,
            };
            let loop_start = t.position();
            for key in keys {
                if !*execute {
                    break;
                }
                let value = if for_each {
                    interp
                        .find_child_with_prototype_chain(&container, key.as_str())
                        .map(|link| link.var())
                        .unwrap_or_else(|| interp.undefined())
                } else {
                    interp.new_string(key.clone())
                };
                bound.link.set_var(value);
                t.set_position(&loop_start);
                interp.execute_statement(t, execute)?;
                if !*execute && !interp.handle_loop_unwind(execute, &labels) {
                    break;
                }
            }
            Ok(())
        })
    }

    fn execute_switch(
        &mut self,
        t: &mut TokenCursor,
        execute: &mut bool,
    ) -> Result<(), ScriptError> {
        if !*execute {
            t.skip_current();
            return Ok(());
        }
        t.advance();
        t.expect(TokenKind::LParen)?;
        let switch_link = self.execute_base(t, execute)?;
        let switch_value = switch_link.var();
        t.expect(TokenKind::RParen)?;
        if !*execute {
            t.skip_current();
            return Ok(());
        }
        t.expect(TokenKind::LBrace)?;
        let scope = if t.kind() == TokenKind::Forward {
            Some(self.new_let_scope())
        } else {
            None
        };
        self.with_scope(scope, |interp| -> Result<(), ScriptError> {
            if t.kind() == TokenKind::Forward {
                interp.execute_statement(t, execute)?;
            }
            let mut default_start: Option<CursorPos> = None;
            let mut found = false;
            loop {
                match t.kind() {
                    TokenKind::Case => {
                        if !*execute {
                            t.skip_current();
                        } else if found {
                            t.advance();
                            t.skip_current(); // jump over the case expression
                            t.expect(TokenKind::Colon)?;
                        } else {
                            t.advance();
                            t.expect(TokenKind::Skip)?;
                            let case_link = interp.execute_base(t, execute)?;
                            let case_var = case_link.var();
                            let equal = interp.maths_op(
                                execute,
                                &case_var,
                                &switch_value,
                                TokenKind::Equal,
                            )?;
                            if *execute {
                                found = equal.borrow().get_bool();
                                if found {
                                    t.expect(TokenKind::Colon)?;
                                } else {
                                    t.skip_current();
                                }
                            } else {
                                t.skip_current();
                            }
                        }
                    }
                    TokenKind::Default => {
                        if !*execute {
                            t.skip_current();
                        } else {
                            t.advance();
                            if found {
                                t.expect(TokenKind::Colon)?;
                            } else {
                                default_start = Some(t.position());
                                t.skip_current();
                            }
                        }
                    }
                    TokenKind::RBrace => {
                        if *execute && !found {
                            if let Some(start) = default_start.take() {
                                found = true;
                                t.set_position(&start);
                                t.expect(TokenKind::Colon)?;
                                continue;
                            }
                        }
                        break;
                    }
                    TokenKind::Eof => break,
                    _ => {
                        if found {
                            interp.execute_statement(t, execute)?;
                        } else {
                            let mut skip = false;
                            interp.execute_statement(t, &mut skip)?;
                        }
                    }
                }
            }
            t.expect(TokenKind::RBrace)?;
            // An unlabeled break exits the switch.
            if !*execute && interp.flags.breaking && interp.label.is_none() {
                interp.flags.breaking = false;
                *execute = true;
            }
            Ok(())
        })
    }

    fn execute_try(&mut self, t: &mut TokenCursor, execute: &mut bool) -> Result<(), ScriptError> {
        if !*execute {
            t.skip_current();
            while t.kind() == TokenKind::Catch {
                t.skip_current();
            }
            if t.kind() == TokenKind::Finally {
                t.skip_current();
            }
            return Ok(());
        }
        let try_line = t.line();
        let try_column = t.column();
        t.advance();
        let labels = self.collect_loop_labels(t);

        let saved_can_throw = self.flags.can_throw;
        let saved_throwing = self.flags.throwing;
        self.flags.can_throw = true;

        self.execute_block(t, execute, true)?;

        let exception = self.exception.take();
        let mut is_throw = self.flags.throwing;
        if is_throw {
            *execute = true;
        }
        if self.flags.breaking {
            let matched = self
                .label
                .as_ref()
                .map_or(false, |label| labels.iter().any(|l| l == label));
            if matched {
                self.label = None;
                self.flags.breaking = false;
                *execute = true;
            }
        }
        self.flags.can_throw = saved_can_throw;
        self.flags.throwing = saved_throwing;

        while t.kind() == TokenKind::Catch {
            if *execute && is_throw {
                t.advance();
                t.expect(TokenKind::LParen)?;
                let name = t.token().text().clone();
                t.expect(TokenKind::Id)?;
                let scope = self.new_let_scope();
                let caught = exception.clone().unwrap_or_else(|| self.undefined());
                scope.add_child(name, caught, LinkFlags::DEFAULT);
                self.with_scope(Some(scope), |interp| -> Result<(), ScriptError> {
                    let mut condition = true;
                    if t.kind() == TokenKind::If {
                        t.advance();
                        let guard = interp.execute_base(t, execute)?;
                        let guard_var = guard.var();
                        let primitive = interp.to_primitive(execute, &guard_var)?;
                        condition = primitive.borrow().get_bool();
                    }
                    t.expect(TokenKind::RParen)?;
                    if *execute && condition {
                        is_throw = false;
                        interp.execute_block(t, execute, false)?;
                    } else {
                        let mut skip = false;
                        interp.execute_block(t, &mut skip, false)?;
                    }
                    Ok(())
                })?;
            } else {
                t.skip_current();
            }
        }
        if t.kind() == TokenKind::Finally {
            t.advance();
            let mut finally_execute = true;
            self.execute_block(t, &mut finally_execute, true)?;
        }
        if is_throw && !self.flags.throwing {
            // Not handled by any catch: re-arm or raise to the host.
            if self.flags.can_throw {
                self.flags.throwing = true;
                *execute = false;
                self.exception = exception;
            } else {
                let text = exception
                    .map(|var| var.borrow().primitive_string())
                    .unwrap_or_default();
                return Err(ScriptError::new(
                    ErrorKind::Error,
                    format!("uncaught exception: '{}'", text),
                    t.file.as_str(),
                    try_line,
                    try_column,
                ));
            }
        }
        Ok(())
    }
}
