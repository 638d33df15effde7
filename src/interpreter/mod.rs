//! The tree-walking evaluator and its context.
//!
//! An [`Interpreter`] owns the object heap, the scope stack, the builtin
//! prototypes, and the runtime control-flow flags. Execution walks a
//! [`TokenCursor`] over a pre-processed token buffer; exceptions, `return`,
//! `break`, and `continue` are modelled as runtime-flag bits plus a slot for
//! the in-flight value, threaded through every helper as a mutable `execute`
//! flag.

mod expressions;
mod statements;

pub mod builtins;

use std::rc::Rc;

use crate::error::{ErrorKind, ScriptError};
use crate::heap::{Heap, HeapStats};
use crate::string_pool::StringPool;
use crate::token::{FnData, Param, TokenKind};
use crate::tokenizer::{TokenBuffer, TokenCursor};
use crate::value::{
    format_double, parse_int_radix, Link, LinkFlags, NativeCallback, ScriptString, VarExt,
    VarKind, VarRef, WorkLink, ACCESSOR_GET, ACCESSOR_SET, ARGUMENTS, CLOSURE_SLOT, PROTO,
    PROTOTYPE, RETURN_SLOT, SCOPE_PARENT, THIS, WITH_TARGET,
};

/// Behaviour switches for an interpreter instance.
#[derive(Debug, Clone)]
pub struct InterpreterOptions {
    /// Treat `let` redeclaration at function root as a `TypeError` instead
    /// of silently downgrading the binding to `var`.
    pub strict_let_redeclaration: bool,
    /// Script call-stack depth limit; 0 disables the check.
    pub max_call_depth: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        InterpreterOptions {
            strict_let_redeclaration: false,
            max_call_depth: 256,
        }
    }
}

/// Control-flow state threaded through evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RuntimeFlags {
    /// Inside a `try`: errors become catchable exceptions.
    pub can_throw: bool,
    /// An exception is unwinding.
    pub throwing: bool,
    /// A `break` is unwinding.
    pub breaking: bool,
    /// A `continue` is unwinding.
    pub continuing: bool,
}

/// The interpreter context.
pub struct Interpreter {
    pub heap: Heap,
    pub(crate) strings: StringPool,
    options: InterpreterOptions,

    pub(crate) root: VarRef,
    pub(crate) scopes: Vec<VarRef>,

    // Prototypes, all pinned.
    pub(crate) object_prototype: VarRef,
    pub(crate) array_prototype: VarRef,
    pub(crate) string_prototype: VarRef,
    pub(crate) number_prototype: VarRef,
    pub(crate) boolean_prototype: VarRef,
    pub(crate) function_prototype: VarRef,
    pub(crate) regexp_prototype: VarRef,
    pub(crate) error_prototypes: Vec<VarRef>,

    /// The canonical `Object.prototype.valueOf` / `toString`, used to detect
    /// script-level overrides during ToPrimitive.
    pub(crate) object_prototype_value_of: VarRef,
    pub(crate) object_prototype_to_string: VarRef,

    // Shared constants.
    const_undefined: VarRef,
    const_null: VarRef,
    const_true: VarRef,
    const_false: VarRef,
    pub(crate) const_zero: VarRef,
    pub(crate) const_one: VarRef,
    const_nan: VarRef,
    const_infinity_positive: VarRef,
    const_infinity_negative: VarRef,

    /// Shared `length` accessors installed on every array / string value.
    pub(crate) array_length_accessor: VarRef,
    pub(crate) string_length_accessor: VarRef,

    /// Values that survive every sweep.
    pinned: Vec<VarRef>,

    pub(crate) flags: RuntimeFlags,
    pub(crate) label: Option<ScriptString>,
    pub(crate) exception: Option<VarRef>,
    call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_options(InterpreterOptions::default())
    }

    pub fn with_options(options: InterpreterOptions) -> Self {
        let heap = Heap::new();
        let strings = StringPool::with_common_names();

        // Object.prototype is the base of everything and references itself.
        let object_prototype = heap.alloc(VarKind::Object);
        object_prototype.add_child(
            ScriptString::from(PROTO),
            object_prototype.clone(),
            LinkFlags::WRITABLE,
        );

        let alloc_proto = || {
            let proto = heap.alloc(VarKind::Object);
            proto.add_child(
                ScriptString::from(PROTO),
                object_prototype.clone(),
                LinkFlags::WRITABLE,
            );
            proto
        };
        let array_prototype = alloc_proto();
        let string_prototype = alloc_proto();
        let number_prototype = alloc_proto();
        let boolean_prototype = alloc_proto();
        let function_prototype = alloc_proto();
        let regexp_prototype = alloc_proto();

        let error_prototypes: Vec<VarRef> = ErrorKind::ALL.iter().map(|_| alloc_proto()).collect();
        for proto in error_prototypes.iter().skip(1) {
            proto.add_child_or_replace(
                ScriptString::from(PROTO),
                error_prototypes[0].clone(),
                LinkFlags::WRITABLE,
            );
        }

        let alloc_primitive = |kind: VarKind, proto: &VarRef| {
            let var = heap.alloc(kind);
            var.add_child(ScriptString::from(PROTO), proto.clone(), LinkFlags::WRITABLE);
            var
        };
        let const_undefined = alloc_primitive(VarKind::Undefined, &object_prototype);
        let const_null = alloc_primitive(VarKind::Null, &object_prototype);
        let const_true = alloc_primitive(VarKind::Bool(true), &boolean_prototype);
        let const_false = alloc_primitive(VarKind::Bool(false), &boolean_prototype);
        let const_zero = alloc_primitive(VarKind::Int(0), &number_prototype);
        let const_one = alloc_primitive(VarKind::Int(1), &number_prototype);
        let const_nan = alloc_primitive(VarKind::NaN, &number_prototype);
        let const_infinity_positive = alloc_primitive(VarKind::Infinity(1), &number_prototype);
        let const_infinity_negative = alloc_primitive(VarKind::Infinity(-1), &number_prototype);

        let array_length_accessor = alloc_primitive(VarKind::Accessor, &object_prototype);
        let string_length_accessor = alloc_primitive(VarKind::Accessor, &object_prototype);

        let root = heap.alloc(VarKind::RootScope);
        root.add_child(
            ScriptString::from(PROTO),
            object_prototype.clone(),
            LinkFlags::WRITABLE,
        );

        let mut pinned = vec![
            object_prototype.clone(),
            array_prototype.clone(),
            string_prototype.clone(),
            number_prototype.clone(),
            boolean_prototype.clone(),
            function_prototype.clone(),
            regexp_prototype.clone(),
            const_undefined.clone(),
            const_null.clone(),
            const_true.clone(),
            const_false.clone(),
            const_zero.clone(),
            const_one.clone(),
            const_nan.clone(),
            const_infinity_positive.clone(),
            const_infinity_negative.clone(),
            array_length_accessor.clone(),
            string_length_accessor.clone(),
        ];
        pinned.extend(error_prototypes.iter().cloned());

        // Placeholders, replaced during builtin registration.
        let object_prototype_value_of = const_undefined.clone();
        let object_prototype_to_string = const_undefined.clone();

        let mut interp = Interpreter {
            heap,
            strings,
            options,
            scopes: vec![root.clone()],
            root,
            object_prototype,
            array_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            function_prototype,
            regexp_prototype,
            error_prototypes,
            object_prototype_value_of,
            object_prototype_to_string,
            const_undefined,
            const_null,
            const_true,
            const_false,
            const_zero,
            const_one,
            const_nan,
            const_infinity_positive,
            const_infinity_negative,
            array_length_accessor,
            string_length_accessor,
            pinned,
            flags: RuntimeFlags::default(),
            label: None,
            exception: None,
            call_depth: 0,
        };
        builtins::register(&mut interp);
        interp
    }

    // ------------------------------------------------------------------
    // Embedding API
    // ------------------------------------------------------------------

    /// Tokenize and run `code`, returning the stringified result.
    pub fn evaluate(&mut self, code: &str) -> Result<String, ScriptError> {
        self.evaluate_at(code, "", 0, 0)
    }

    pub fn evaluate_at(
        &mut self,
        code: &str,
        file: &str,
        line: u32,
        column: u32,
    ) -> Result<String, ScriptError> {
        let link = self.evaluate_link_at(code, file, line, column)?;
        let mut execute = true;
        let var = link.var();
        self.coerce_string(&mut execute, &var)
    }

    /// Tokenize and run `code`, returning the result as a value link.
    pub fn evaluate_link(&mut self, code: &str) -> Result<Link, ScriptError> {
        self.evaluate_link_at(code, "", 0, 0)
    }

    pub fn evaluate_link_at(
        &mut self,
        code: &str,
        file: &str,
        line: u32,
        column: u32,
    ) -> Result<Link, ScriptError> {
        let buffer = TokenBuffer::parse(
            code,
            file,
            line,
            column,
            self.options.strict_let_redeclaration,
            &mut self.strings,
        )?;
        self.flags = RuntimeFlags::default();
        self.exception = None;
        self.label = None;

        let mut t = TokenCursor::new(&buffer);
        let mut result: Option<Link> = None;
        let mut execute = true;
        loop {
            let outcome = self.execute_statement(&mut t, &mut execute);
            match outcome {
                Ok(Some(link)) => result = Some(link),
                Ok(None) => {}
                Err(err) => {
                    self.flags = RuntimeFlags::default();
                    self.exception = None;
                    self.label = None;
                    self.scopes.truncate(1);
                    return Err(err);
                }
            }
            while t.kind() == TokenKind::Semicolon {
                t.advance();
            }
            if t.kind() == TokenKind::Eof {
                break;
            }
        }

        let result_var = result.as_ref().map(|link| link.var());
        self.collect_garbage(result_var.as_ref());
        Ok(result.unwrap_or_else(|| Link::temp(self.undefined())))
    }

    /// Register a native function. The signature uses function-declaration
    /// syntax (`"function JSON.parse(text, reviver)"`); dotted names attach
    /// to nested objects, creating plain objects as needed.
    pub fn add_native<F>(&mut self, signature: &str, callback: F) -> Result<VarRef, ScriptError>
    where
        F: Fn(&mut Interpreter, &VarRef) -> Result<(), ScriptError> + 'static,
    {
        self.add_native_with_prototype(signature, Rc::new(callback), None)
    }

    pub(crate) fn add_native_with_prototype(
        &mut self,
        signature: &str,
        callback: NativeCallback,
        prototype: Option<VarRef>,
    ) -> Result<VarRef, ScriptError> {
        let (path, params) = self.parse_native_signature(signature)?;
        let (containers, name) = match path.split_last() {
            Some((name, containers)) => (containers, name.clone()),
            None => {
                return Err(ScriptError::syntax(
                    "native signature has no function name",
                    "native",
                    0,
                    0,
                ))
            }
        };

        let mut base = self.root.clone();
        for segment in containers {
            base = match base.find_child(segment.as_str()) {
                Some(link) => link.var(),
                None => {
                    let container = self.new_object();
                    base.add_child(segment.clone(), container.clone(), LinkFlags::DEFAULT);
                    container
                }
            };
        }

        let data = Rc::new(FnData {
            name: name.clone(),
            params,
            file: self.strings.intern("native"),
            line: 0,
            body: Rc::new(Vec::new()),
        });
        let fn_var = self.heap.alloc(VarKind::Native { data, callback });
        fn_var.add_child(
            ScriptString::from(PROTO),
            self.function_prototype.clone(),
            LinkFlags::WRITABLE,
        );
        let proto = prototype.unwrap_or_else(|| self.new_object());
        fn_var.add_child(ScriptString::from(PROTOTYPE), proto, LinkFlags::WRITABLE);
        base.add_child_or_replace(name, fn_var.clone(), LinkFlags::DEFAULT);
        Ok(fn_var)
    }

    fn parse_native_signature(
        &mut self,
        signature: &str,
    ) -> Result<(Vec<ScriptString>, Vec<Param>), ScriptError> {
        let file = self.strings.intern("native");
        let mut lexer =
            crate::lexer::Lexer::new(signature, file, 0, 0, &mut self.strings)?;
        lexer.expect(TokenKind::Function)?;
        let mut path = Vec::new();
        path.push(lexer.text().clone());
        lexer.expect(TokenKind::Id)?;
        while lexer.kind() == TokenKind::Dot {
            lexer.advance()?;
            path.push(lexer.text().clone());
            lexer.expect(TokenKind::Id)?;
        }
        lexer.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while lexer.kind() != TokenKind::RParen {
            params.push(Param::Name(lexer.text().clone()));
            lexer.expect(TokenKind::Id)?;
            if lexer.kind() != TokenKind::RParen {
                lexer.expect2(TokenKind::Comma, Some(TokenKind::RParen))?;
            }
        }
        Ok((path, params))
    }

    /// Host-initiated call. On an uncaught script exception the error value
    /// is retrievable via [`Interpreter::take_exception`].
    pub fn call_function(
        &mut self,
        function: &VarRef,
        args: Vec<VarRef>,
        this: Option<&VarRef>,
    ) -> Result<VarRef, ScriptError> {
        let mut execute = true;
        let this = this.cloned().unwrap_or_else(|| self.root.clone());
        let result = self.call_function_with(&mut execute, function, args, &this, None)?;
        if !execute {
            self.flags.throwing = false;
            return Err(ScriptError::Thrown);
        }
        Ok(result)
    }

    /// The value of the most recent uncaught script exception.
    pub fn take_exception(&mut self) -> Option<VarRef> {
        self.exception.take()
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Mark everything reachable from the root, the pinned constants, and
    /// `extra`, then sweep the allocation list.
    pub fn collect_garbage(&mut self, extra: Option<&VarRef>) {
        let id = self.heap.next_unique_id();
        for var in &self.pinned {
            var.set_temporary_id_recursive(id);
        }
        for scope in &self.scopes {
            scope.set_temporary_id_recursive(id);
        }
        self.root.set_temporary_id_recursive(id);
        if let Some(var) = self.exception.as_ref() {
            var.set_temporary_id_recursive(id);
        }
        if let Some(var) = extra {
            var.set_temporary_id_recursive(id);
        }
        self.heap.sweep(id);
    }

    // ------------------------------------------------------------------
    // Value construction
    // ------------------------------------------------------------------

    pub fn undefined(&self) -> VarRef {
        self.const_undefined.clone()
    }

    pub fn null(&self) -> VarRef {
        self.const_null.clone()
    }

    pub fn new_bool(&self, value: bool) -> VarRef {
        if value {
            self.const_true.clone()
        } else {
            self.const_false.clone()
        }
    }

    pub fn nan(&self) -> VarRef {
        self.const_nan.clone()
    }

    pub fn infinity(&self, sign: i32) -> VarRef {
        if sign < 0 {
            self.const_infinity_negative.clone()
        } else {
            self.const_infinity_positive.clone()
        }
    }

    pub fn new_int(&self, value: i32) -> VarRef {
        match value {
            0 => self.const_zero.clone(),
            1 => self.const_one.clone(),
            _ => {
                let var = self.heap.alloc(VarKind::Int(value));
                var.add_child(
                    ScriptString::from(PROTO),
                    self.number_prototype.clone(),
                    LinkFlags::WRITABLE,
                );
                var
            }
        }
    }

    /// NaN and infinities normalize to their dedicated kinds.
    pub fn new_double(&self, value: f64) -> VarRef {
        if value.is_nan() {
            return self.nan();
        }
        if value.is_infinite() {
            return self.infinity(if value < 0.0 { -1 } else { 1 });
        }
        let var = self.heap.alloc(VarKind::Double(value));
        var.add_child(
            ScriptString::from(PROTO),
            self.number_prototype.clone(),
            LinkFlags::WRITABLE,
        );
        var
    }

    pub fn new_string(&self, value: impl Into<ScriptString>) -> VarRef {
        let var = self.heap.alloc(VarKind::String(value.into()));
        var.add_child(
            ScriptString::from(PROTO),
            self.string_prototype.clone(),
            LinkFlags::WRITABLE,
        );
        var.add_child(
            ScriptString::from("length"),
            self.string_length_accessor.clone(),
            LinkFlags::NONE,
        );
        var
    }

    pub fn new_object(&self) -> VarRef {
        let var = self.heap.alloc(VarKind::Object);
        var.add_child(
            ScriptString::from(PROTO),
            self.object_prototype.clone(),
            LinkFlags::WRITABLE,
        );
        var
    }

    pub fn new_array(&self) -> VarRef {
        let var = self.heap.alloc(VarKind::Array);
        var.add_child(
            ScriptString::from(PROTO),
            self.array_prototype.clone(),
            LinkFlags::WRITABLE,
        );
        var.add_child(
            ScriptString::from("length"),
            self.array_length_accessor.clone(),
            LinkFlags::NONE,
        );
        var
    }

    pub fn new_accessor(&self) -> VarRef {
        let var = self.heap.alloc(VarKind::Accessor);
        var.add_child(
            ScriptString::from(PROTO),
            self.object_prototype.clone(),
            LinkFlags::WRITABLE,
        );
        var
    }

    pub fn new_regexp(&self, source: ScriptString, flags: ScriptString) -> VarRef {
        let has = |c: char| flags.as_str().contains(c);
        let var = self.heap.alloc(VarKind::RegExp {
            source: source.clone(),
            flags: flags.clone(),
        });
        var.add_child(
            ScriptString::from(PROTO),
            self.regexp_prototype.clone(),
            LinkFlags::WRITABLE,
        );
        var.add_child(
            ScriptString::from("source"),
            self.new_string(source),
            LinkFlags::NONE,
        );
        var.add_child(
            ScriptString::from("global"),
            self.new_bool(has('g')),
            LinkFlags::NONE,
        );
        var.add_child(
            ScriptString::from("ignoreCase"),
            self.new_bool(has('i')),
            LinkFlags::NONE,
        );
        var.add_child(
            ScriptString::from("multiline"),
            self.new_bool(has('m')),
            LinkFlags::NONE,
        );
        var.add_child(
            ScriptString::from("sticky"),
            self.new_bool(has('y')),
            LinkFlags::NONE,
        );
        var.add_child(
            ScriptString::from("lastIndex"),
            self.new_int(0),
            LinkFlags::WRITABLE,
        );
        var
    }

    /// Create an error object of `kind` with the standard fields.
    pub fn new_error(
        &self,
        kind: ErrorKind,
        message: &str,
        file: &str,
        line: u32,
        column: u32,
    ) -> VarRef {
        let var = self.heap.alloc(VarKind::Error(kind));
        var.add_child(
            ScriptString::from(PROTO),
            self.error_prototypes[kind.index()].clone(),
            LinkFlags::WRITABLE,
        );
        if !message.is_empty() {
            var.add_child(
                ScriptString::from("message"),
                self.new_string(message),
                LinkFlags::DEFAULT,
            );
        }
        if !file.is_empty() {
            var.add_child(
                ScriptString::from("fileName"),
                self.new_string(file),
                LinkFlags::DEFAULT,
            );
        }
        var.add_child(
            ScriptString::from("lineNumber"),
            self.new_int(line as i32 + 1),
            LinkFlags::DEFAULT,
        );
        var.add_child(
            ScriptString::from("column"),
            self.new_int(column as i32 + 1),
            LinkFlags::DEFAULT,
        );
        var
    }

    /// Create a script function value, capturing the current scope as its
    /// closure.
    pub(crate) fn new_function(&self, data: Rc<FnData>) -> VarRef {
        let var = self.heap.alloc(VarKind::Function(data));
        var.add_child(
            ScriptString::from(PROTO),
            self.function_prototype.clone(),
            LinkFlags::WRITABLE,
        );
        let scope = self.scope();
        if !Rc::ptr_eq(&scope, &self.root) {
            var.add_child(ScriptString::from(CLOSURE_SLOT), scope, LinkFlags::NONE);
        }
        var.add_child(
            ScriptString::from(PROTOTYPE),
            self.new_object(),
            LinkFlags::WRITABLE,
        );
        var
    }

    /// Box a primitive into object form (`new String("x")`); objects pass
    /// through.
    pub(crate) fn to_object(&self, var: &VarRef) -> VarRef {
        {
            let inner = var.borrow();
            if inner.fake_object || inner.is_nullish() || !inner.is_primitive() {
                return var.clone();
            }
        }
        let kind = var.borrow().kind.clone();
        let boxed = match &kind {
            VarKind::String(s) => self.new_string(s.clone()),
            _ => {
                let proto = match kind {
                    VarKind::Bool(_) => &self.boolean_prototype,
                    _ => &self.number_prototype,
                };
                let fresh = self.heap.alloc(kind.clone());
                fresh.add_child(
                    ScriptString::from(PROTO),
                    proto.clone(),
                    LinkFlags::WRITABLE,
                );
                fresh
            }
        };
        boxed.borrow_mut().fake_object = true;
        boxed
    }

    // ------------------------------------------------------------------
    // Scopes and name resolution
    // ------------------------------------------------------------------

    pub(crate) fn scope(&self) -> VarRef {
        self.scopes
            .last()
            .cloned()
            .unwrap_or_else(|| self.root.clone())
    }

    /// Run `f` with `scope` pushed; pops on every exit path.
    pub(crate) fn with_scope<R>(
        &mut self,
        scope: Option<VarRef>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let pushed = scope.is_some();
        if let Some(scope) = scope {
            self.scopes.push(scope);
        }
        let result = f(self);
        if pushed {
            self.scopes.pop();
        }
        result
    }

    pub(crate) fn new_let_scope(&self) -> VarRef {
        let scope = self.heap.alloc(VarKind::LetScope { init_hidden: false });
        scope.add_child(
            ScriptString::from(SCOPE_PARENT),
            self.scope(),
            LinkFlags::NONE,
        );
        scope
    }

    pub(crate) fn new_with_scope(&self, target: VarRef) -> VarRef {
        let scope = self.heap.alloc(VarKind::WithScope);
        scope.add_child(
            ScriptString::from(SCOPE_PARENT),
            self.scope(),
            LinkFlags::NONE,
        );
        scope.add_child(ScriptString::from(WITH_TARGET), target, LinkFlags::NONE);
        scope
    }

    pub(crate) fn set_let_scope_hidden(&self, scope: &VarRef, hidden: bool) {
        let mut var = scope.borrow_mut();
        if let VarKind::LetScope { init_hidden } = &mut var.kind {
            *init_hidden = hidden;
        }
    }

    /// The scope `var` declarations land on: the enclosing function scope or
    /// the root.
    pub(crate) fn scope_var_target(&self, scope: &VarRef) -> VarRef {
        let kind_is_nested = matches!(
            scope.borrow().kind,
            VarKind::LetScope { .. } | VarKind::WithScope
        );
        if kind_is_nested {
            match scope.find_child(SCOPE_PARENT) {
                Some(parent) => self.scope_var_target(&parent.var()),
                None => self.root.clone(),
            }
        } else {
            scope.clone()
        }
    }

    /// The scope `let` declarations land on: the current block scope, with
    /// `with` scopes delegating to their parent.
    pub(crate) fn scope_let_target(&self, scope: &VarRef) -> VarRef {
        if matches!(scope.borrow().kind, VarKind::WithScope) {
            match scope.find_child(SCOPE_PARENT) {
                Some(parent) => self.scope_let_target(&parent.var()),
                None => self.root.clone(),
            }
        } else {
            scope.clone()
        }
    }

    /// Resolve a name through the scope chain.
    pub(crate) fn find_in_scopes(&self, name: &str) -> Option<WorkLink> {
        let scope = self.scope();
        self.find_in_scope_chain(&scope, name)
    }

    fn find_in_scope_chain(&self, scope: &VarRef, name: &str) -> Option<WorkLink> {
        let kind = scope.borrow().kind.clone();
        match kind {
            VarKind::RootScope => scope.find_child(name).map(WorkLink::from_link),
            VarKind::FunctionScope => {
                if let Some(link) = scope.find_child(name) {
                    return Some(WorkLink::from_link(link));
                }
                match scope.find_child(CLOSURE_SLOT) {
                    Some(closure) => self.find_in_scope_chain(&closure.var(), name),
                    None => self.root.find_child(name).map(WorkLink::from_link),
                }
            }
            VarKind::LetScope { init_hidden } => {
                if !init_hidden {
                    if let Some(link) = scope.find_child(name) {
                        return Some(WorkLink::from_link(link));
                    }
                }
                let parent = scope.find_child(SCOPE_PARENT)?;
                self.find_in_scope_chain(&parent.var(), name)
            }
            VarKind::WithScope => {
                let target = scope.find_child(WITH_TARGET)?.var();
                if name == THIS {
                    return Some(WorkLink::from_var(target));
                }
                if let Some(link) = target.find_child(name) {
                    return Some(WorkLink::from_link(link));
                }
                if let Some(link) = self.find_child_in_prototype_chain(&target, name) {
                    // Recreate the link with the wrapped object as faked
                    // owner so assignments target it; remember the real
                    // owner for accessor `this`.
                    let real_owner = link.owner();
                    let fresh = Link::new(link.var(), link.name(), link.flags());
                    fresh.set_owner(&target);
                    return Some(WorkLink {
                        link: fresh,
                        referenced_owner: real_owner,
                    });
                }
                let parent = scope.find_child(SCOPE_PARENT)?;
                self.find_in_scope_chain(&parent.var(), name)
            }
            _ => scope.find_child(name).map(WorkLink::from_link),
        }
    }

    /// Own children, then the prototype chain. The stamp prevents cycles.
    pub(crate) fn find_child_with_prototype_chain(
        &self,
        var: &VarRef,
        name: &str,
    ) -> Option<Link> {
        let id = self.heap.next_unique_id();
        let mut object = var.clone();
        loop {
            if object.borrow().temporary_id == id {
                return None;
            }
            if let Some(link) = object.find_child(name) {
                return Some(link);
            }
            object.borrow_mut().temporary_id = id;
            let proto = object.proto()?;
            object = proto;
        }
    }

    /// The prototype chain only, skipping own children.
    pub(crate) fn find_child_in_prototype_chain(&self, var: &VarRef, name: &str) -> Option<Link> {
        let id = self.heap.next_unique_id();
        let mut object = var.clone();
        loop {
            if object.borrow().temporary_id == id {
                return None;
            }
            let proto = object.proto()?;
            if let Some(link) = proto.find_child(name) {
                return Some(link);
            }
            object.borrow_mut().temporary_id = id;
            object = proto;
        }
    }

    // ------------------------------------------------------------------
    // Reads/writes through links (accessor dispatch)
    // ------------------------------------------------------------------

    /// Read the value behind a work link, invoking a getter when the link
    /// holds an accessor.
    pub(crate) fn read_link(
        &mut self,
        execute: &mut bool,
        link: &WorkLink,
    ) -> Result<VarRef, ScriptError> {
        if !*execute {
            return Ok(self.undefined());
        }
        let var = link.var();
        if !var.borrow().is_accessor() {
            return Ok(var);
        }
        match var.find_child(ACCESSOR_GET) {
            Some(getter) => {
                let this = link
                    .accessor_this()
                    .unwrap_or_else(|| self.root.clone());
                self.call_function_with(execute, &getter.var(), Vec::new(), &this, None)
            }
            None => Ok(self.undefined()),
        }
    }

    /// Write through a work link: accessor links invoke the setter,
    /// non-writable links are silently ignored.
    pub(crate) fn write_link(
        &mut self,
        execute: &mut bool,
        link: &WorkLink,
        value: VarRef,
    ) -> Result<(), ScriptError> {
        if !*execute {
            return Ok(());
        }
        let var = link.var();
        if var.borrow().is_accessor() {
            if let Some(setter) = var.find_child(ACCESSOR_SET) {
                let this = link
                    .accessor_this()
                    .unwrap_or_else(|| self.root.clone());
                self.call_function_with(execute, &setter.var(), vec![value], &this, None)?;
            }
        } else if link.link.is_writable() {
            link.link.set_var(value);
        }
        Ok(())
    }

    /// Reading a named link that resolved nowhere is a `ReferenceError`.
    pub(crate) fn check_defined(
        &mut self,
        t: &TokenCursor,
        execute: &mut bool,
        link: &WorkLink,
    ) -> Result<(), ScriptError> {
        if *execute && !link.link.is_owned() && !link.link.has_owner() && !link.name().is_empty() {
            let name = link.name();
            self.raise(
                t,
                execute,
                ErrorKind::ReferenceError,
                format!("{} is not defined", name),
            )?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    /// Raise an error at the cursor position: becomes a catchable script
    /// exception inside `try`, a host error otherwise.
    pub(crate) fn raise(
        &mut self,
        t: &TokenCursor,
        execute: &mut bool,
        kind: ErrorKind,
        message: String,
    ) -> Result<(), ScriptError> {
        if *execute && self.flags.can_throw {
            let error = self.new_error(kind, &message, t.file.as_str(), t.line(), t.column());
            self.exception = Some(error);
            self.flags.throwing = true;
            *execute = false;
            return Ok(());
        }
        Err(ScriptError::new(
            kind,
            message,
            t.file.as_str(),
            t.line(),
            t.column(),
        ))
    }

    /// Raise without a cursor (conversions, native callbacks).
    pub(crate) fn raise_error(
        &mut self,
        execute: &mut bool,
        kind: ErrorKind,
        message: String,
    ) -> Result<(), ScriptError> {
        if *execute && self.flags.can_throw {
            let error = self.new_error(kind, &message, "", 0, 0);
            self.exception = Some(error);
            self.flags.throwing = true;
            *execute = false;
            return Ok(());
        }
        Err(ScriptError::new(kind, message, "", 0, 0))
    }

    /// For native callbacks: throw a script value.
    pub fn throw_value(&mut self, value: VarRef) -> ScriptError {
        self.exception = Some(value);
        ScriptError::Thrown
    }

    // ------------------------------------------------------------------
    // Coercions
    // ------------------------------------------------------------------

    /// ToPrimitive with number hint: `valueOf`, then `toString`.
    pub(crate) fn to_primitive(
        &mut self,
        execute: &mut bool,
        var: &VarRef,
    ) -> Result<VarRef, ScriptError> {
        if !*execute {
            return Ok(self.undefined());
        }
        if var.borrow().is_primitive() {
            return Ok(var.clone());
        }
        let mut result = self.call_value_of(execute, var)?;
        if *execute && !result.borrow().is_primitive() {
            result = self.call_to_string(execute, var, 10)?;
            if *execute && !result.borrow().is_primitive() {
                self.raise_error(
                    execute,
                    ErrorKind::TypeError,
                    "can't convert to primitive type".to_string(),
                )?;
                return Ok(self.undefined());
            }
        }
        Ok(result)
    }

    /// ToPrimitive with string hint: `toString`, then `valueOf`.
    pub(crate) fn to_primitive_string(
        &mut self,
        execute: &mut bool,
        var: &VarRef,
    ) -> Result<VarRef, ScriptError> {
        if !*execute {
            return Ok(self.undefined());
        }
        if var.borrow().is_primitive() {
            return Ok(var.clone());
        }
        let mut result = self.call_to_string(execute, var, 10)?;
        if *execute && !result.borrow().is_primitive() {
            result = self.call_value_of(execute, var)?;
            if *execute && !result.borrow().is_primitive() {
                self.raise_error(
                    execute,
                    ErrorKind::TypeError,
                    "can't convert to primitive type".to_string(),
                )?;
                return Ok(self.undefined());
            }
        }
        Ok(result)
    }

    /// Invoke `valueOf`, preferring the builtin unless a script override is
    /// installed on the prototype chain.
    fn call_value_of(&mut self, execute: &mut bool, var: &VarRef) -> Result<VarRef, ScriptError> {
        if !*execute {
            return Ok(self.undefined());
        }
        if let Some(link) = self.find_child_with_prototype_chain(var, "valueOf") {
            let wl = WorkLink::from_link(link);
            let method = self.read_link(execute, &wl)?;
            if !Rc::ptr_eq(&method, &self.object_prototype_value_of) {
                if method.borrow().is_function() {
                    return self.call_function_with(execute, &method, Vec::new(), var, None);
                }
                return Ok(var.clone());
            }
        }
        Ok(self.builtin_value_of(var))
    }

    pub(crate) fn builtin_value_of(&self, var: &VarRef) -> VarRef {
        let inner = var.borrow();
        if !inner.fake_object {
            return var.clone();
        }
        // Unbox.
        match &inner.kind {
            VarKind::String(s) => self.new_string(s.clone()),
            VarKind::Bool(b) => self.new_bool(*b),
            VarKind::Int(v) => self.new_int(*v),
            VarKind::Double(v) => self.new_double(*v),
            VarKind::NaN => self.nan(),
            VarKind::Infinity(sign) => self.infinity(*sign),
            _ => var.clone(),
        }
    }

    /// Invoke `toString`, preferring the builtin unless overridden.
    pub(crate) fn call_to_string(
        &mut self,
        execute: &mut bool,
        var: &VarRef,
        radix: i32,
    ) -> Result<VarRef, ScriptError> {
        if !*execute {
            return Ok(self.undefined());
        }
        if let Some(link) = self.find_child_with_prototype_chain(var, "toString") {
            let wl = WorkLink::from_link(link);
            let method = self.read_link(execute, &wl)?;
            if !Rc::ptr_eq(&method, &self.object_prototype_to_string) {
                if method.borrow().is_function() {
                    let arg = self.new_int(radix);
                    return self.call_function_with(execute, &method, vec![arg], var, None);
                }
                return Ok(var.clone());
            }
        }
        self.builtin_to_string(execute, var, radix)
    }

    pub(crate) fn builtin_to_string(
        &mut self,
        execute: &mut bool,
        var: &VarRef,
        radix: i32,
    ) -> Result<VarRef, ScriptError> {
        let kind = var.borrow().kind.clone();
        let radix = if (2..=36).contains(&radix) { radix } else { 10 };
        Ok(match kind {
            VarKind::Int(v) => self.new_string(int_to_string_radix(v, radix as u32)),
            VarKind::Double(v) => {
                if radix == 10 {
                    self.new_string(format_double(v))
                } else {
                    self.new_string(double_to_string_radix(v, radix as u32))
                }
            }
            VarKind::String(_) if var.borrow().fake_object => self.builtin_value_of(var),
            VarKind::Object | VarKind::Accessor => self.new_string("[object Object]"),
            VarKind::Array => {
                let len = var.borrow().array_length();
                let mut parts = Vec::with_capacity(len.max(0) as usize);
                for idx in 0..len {
                    let element = var.get_array_index(idx).unwrap_or_else(|| self.undefined());
                    parts.push(self.coerce_string(execute, &element)?);
                    if !*execute {
                        return Ok(self.undefined());
                    }
                }
                self.new_string(parts.join(", "))
            }
            VarKind::Function(ref data) | VarKind::Native { ref data, .. } => {
                self.new_string(function_signature_string(data, var.borrow().is_native()))
            }
            VarKind::Error(_) => {
                let text = self.error_to_string(execute, var)?;
                self.new_string(text)
            }
            _ => {
                let text = var.borrow().primitive_string();
                self.new_string(text)
            }
        })
    }

    pub(crate) fn error_to_string(
        &mut self,
        execute: &mut bool,
        var: &VarRef,
    ) -> Result<String, ScriptError> {
        let field = |this: &mut Self, execute: &mut bool, name: &str| -> Result<Option<VarRef>, ScriptError> {
            match this.find_child_with_prototype_chain(var, name) {
                Some(link) => {
                    let wl = WorkLink::from_link(link);
                    Ok(Some(this.read_link(execute, &wl)?))
                }
                None => Ok(None),
            }
        };
        let name = match field(self, execute, "name")? {
            Some(v) => self.coerce_string(execute, &v)?,
            None => "Error".to_string(),
        };
        let message = match field(self, execute, "message")? {
            Some(v) => self.coerce_string(execute, &v)?,
            None => String::new(),
        };
        let mut out = format!("{}: {}", name, message);
        if let Some(v) = field(self, execute, "lineNumber")? {
            let line = v.borrow().get_int();
            if line >= 0 {
                out.push_str(&format!(" at Line:{}", line));
            }
        }
        if let Some(v) = field(self, execute, "column")? {
            let column = v.borrow().get_int();
            if column >= 0 {
                out.push_str(&format!(" Column:{}", column));
            }
        }
        if let Some(v) = field(self, execute, "fileName")? {
            let file = self.coerce_string(execute, &v)?;
            if !file.is_empty() {
                out.push_str(&format!(" in {}", file));
            }
        }
        Ok(out)
    }

    /// Full ToString: ToPrimitive with string hint, then the primitive's
    /// string form.
    pub fn coerce_string(
        &mut self,
        execute: &mut bool,
        var: &VarRef,
    ) -> Result<String, ScriptError> {
        let primitive = self.to_primitive_string(execute, var)?;
        let s = primitive.borrow().primitive_string();
        Ok(s)
    }

    /// ToBoolean with ToPrimitive for objects.
    pub fn coerce_bool(
        &mut self,
        execute: &mut bool,
        var: &VarRef,
    ) -> Result<bool, ScriptError> {
        if var.borrow().is_primitive() {
            return Ok(var.borrow().get_bool());
        }
        let primitive = self.to_primitive(execute, var)?;
        let b = primitive.borrow().get_bool();
        Ok(b)
    }

    pub fn coerce_int(
        &mut self,
        execute: &mut bool,
        var: &VarRef,
    ) -> Result<i32, ScriptError> {
        let primitive = self.to_primitive(execute, var)?;
        let v = primitive.borrow().get_int();
        Ok(v)
    }

    /// The numeric view of a value: Int, Double, NaN, or Infinity.
    pub fn coerce_numeric(
        &mut self,
        execute: &mut bool,
        var: &VarRef,
    ) -> Result<VarRef, ScriptError> {
        let primitive = self.to_primitive(execute, var)?;
        Ok(self.numeric_of_primitive(&primitive))
    }

    pub(crate) fn numeric_of_primitive(&self, primitive: &VarRef) -> VarRef {
        let kind = primitive.borrow().kind.clone();
        match kind {
            VarKind::Undefined => self.nan(),
            VarKind::Null => self.const_zero.clone(),
            VarKind::Bool(b) => self.new_int(b as i32),
            VarKind::Int(_) | VarKind::Double(_) | VarKind::NaN | VarKind::Infinity(_) => {
                primitive.clone()
            }
            VarKind::String(s) => {
                let text = s.as_str();
                if text.is_empty() {
                    return self.const_zero.clone();
                }
                let (value, consumed) = parse_int_radix(text, 0);
                if consumed == text.len() {
                    return self.new_int(value);
                }
                match text.trim().parse::<f64>() {
                    Ok(v) => self.new_double(v),
                    Err(_) => self.nan(),
                }
            }
            _ => self.nan(),
        }
    }

    // ------------------------------------------------------------------
    // The maths-op matrix
    // ------------------------------------------------------------------

    /// Apply a binary operator per the coercion rules: string concatenation
    /// and comparison, nullish special cases, then the numeric tower with
    /// the NaN/Infinity matrix and the int/double fast paths.
    pub(crate) fn maths_op(
        &mut self,
        execute: &mut bool,
        a: &VarRef,
        b: &VarRef,
        op: TokenKind,
    ) -> Result<VarRef, ScriptError> {
        use TokenKind::*;
        if !*execute {
            return Ok(self.undefined());
        }

        if op == StrictEqual || op == StrictNotEqual {
            if a.borrow().is_nan() || b.borrow().is_nan() {
                return Ok(self.new_bool(op == StrictNotEqual));
            }
            let same_kind = std::mem::discriminant(&a.borrow().kind)
                == std::mem::discriminant(&b.borrow().kind);
            if !same_kind {
                return Ok(self.new_bool(op == StrictNotEqual));
            }
            let loose = self.maths_op(execute, a, b, Equal)?;
            let is_equal = loose.borrow().get_bool();
            return Ok(self.new_bool(if op == StrictEqual { is_equal } else { !is_equal }));
        }

        if !a.borrow().is_primitive() && !b.borrow().is_primitive() {
            // Object identity.
            match op {
                Equal => return Ok(self.new_bool(Rc::ptr_eq(a, b))),
                NotEqual => return Ok(self.new_bool(!Rc::ptr_eq(a, b))),
                _ => {}
            }
        }

        let a = self.to_primitive(execute, a)?;
        let b = self.to_primitive(execute, b)?;
        if !*execute {
            return Ok(self.undefined());
        }

        let a_is_string = a.borrow().is_string();
        let b_is_string = b.borrow().is_string();
        if (a_is_string && b_is_string) || ((a_is_string || b_is_string) && op == Plus) {
            let da = if a.borrow().is_null() {
                String::new()
            } else {
                a.borrow().primitive_string()
            };
            let db = if b.borrow().is_null() {
                String::new()
            } else {
                b.borrow().primitive_string()
            };
            return Ok(match op {
                Plus => self.new_string(da + &db),
                Equal => self.new_bool(da == db),
                NotEqual => self.new_bool(da != db),
                Lt => self.new_bool(da < db),
                LessEqual => self.new_bool(da <= db),
                Gt => self.new_bool(da > db),
                GreaterEqual => self.new_bool(da >= db),
                _ => self.nan(),
            });
        }

        let a_nullish = a.borrow().is_nullish();
        let b_nullish = b.borrow().is_nullish();
        if a_nullish && b_nullish {
            return Ok(match op {
                Equal => self.new_bool(true),
                NotEqual => self.new_bool(false),
                Lt | LessEqual | Gt | GreaterEqual => self.new_bool(false),
                _ => self.nan(),
            });
        }

        let a = self.numeric_of_primitive(&a);
        let b = self.numeric_of_primitive(&b);

        if a.borrow().is_nan() || b.borrow().is_nan() {
            return Ok(match op {
                NotEqual => self.new_bool(true),
                Equal | Lt | LessEqual | Gt | GreaterEqual => self.new_bool(false),
                _ => self.nan(),
            });
        }

        let a_inf = a.borrow().infinity_sign();
        let b_inf = b.borrow().infinity_sign();
        if a_inf != 0 || b_inf != 0 {
            return self.infinity_op(&a, &b, a_inf, b_inf, op);
        }

        if !a.borrow().is_double() && !b.borrow().is_double() {
            self.int_op(a.borrow().get_int(), b.borrow().get_int(), op)
        } else {
            self.double_op(a.borrow().get_double(), b.borrow().get_double(), op)
        }
    }

    fn int_op(&mut self, da: i32, db: i32, op: TokenKind) -> Result<VarRef, ScriptError> {
        use TokenKind::*;
        Ok(match op {
            Plus => self.new_int(da.wrapping_add(db)),
            Minus => self.new_int(da.wrapping_sub(db)),
            Star => self.new_int(da.wrapping_mul(db)),
            Slash => {
                if db == 0 {
                    if da == 0 {
                        self.nan()
                    } else {
                        self.infinity(if da < 0 { -1 } else { 1 })
                    }
                } else {
                    self.new_int(da.wrapping_div(db))
                }
            }
            Percent => {
                if db == 0 {
                    self.nan()
                } else {
                    self.new_int(da.wrapping_rem(db))
                }
            }
            Amp => self.new_int(da & db),
            Pipe => self.new_int(da | db),
            Caret => self.new_int(da ^ db),
            Tilde => self.new_int(!da),
            Shl => self.new_int(da.wrapping_shl(db as u32 & 31)),
            Shr => self.new_int(da.wrapping_shr(db as u32 & 31)),
            ShrU => self.new_int(((da as u32) >> (db as u32 & 31)) as i32),
            Equal => self.new_bool(da == db),
            NotEqual => self.new_bool(da != db),
            Lt => self.new_bool(da < db),
            LessEqual => self.new_bool(da <= db),
            Gt => self.new_bool(da > db),
            GreaterEqual => self.new_bool(da >= db),
            _ => {
                return Err(ScriptError::new(
                    ErrorKind::Error,
                    "operation not supported on the int datatype",
                    "",
                    0,
                    0,
                ))
            }
        })
    }

    fn double_op(&mut self, da: f64, db: f64, op: TokenKind) -> Result<VarRef, ScriptError> {
        use TokenKind::*;
        let dai = da as i32;
        let dbi = db as i32;
        Ok(match op {
            Plus => self.new_double(da + db),
            Minus => self.new_double(da - db),
            Star => self.new_double(da * db),
            Slash => {
                if db == 0.0 {
                    if da == 0.0 {
                        self.nan()
                    } else {
                        self.infinity(if da < 0.0 { -1 } else { 1 })
                    }
                } else {
                    self.new_double(da / db)
                }
            }
            // The modulo path stays on the integer views.
            Percent => {
                if db == 0.0 {
                    self.nan()
                } else {
                    self.new_int(dai.wrapping_rem(dbi))
                }
            }
            Amp => self.new_int(dai & dbi),
            Pipe => self.new_int(dai | dbi),
            Caret => self.new_int(dai ^ dbi),
            Tilde => self.new_int(!dai),
            Shl => self.new_int(dai.wrapping_shl(dbi as u32 & 31)),
            Shr => self.new_int(dai.wrapping_shr(dbi as u32 & 31)),
            ShrU => self.new_int(((dai as u32) >> (dbi as u32 & 31)) as i32),
            Equal => self.new_bool(da == db),
            NotEqual => self.new_bool(da != db),
            Lt => self.new_bool(da < db),
            LessEqual => self.new_bool(da <= db),
            Gt => self.new_bool(da > db),
            GreaterEqual => self.new_bool(da >= db),
            _ => {
                return Err(ScriptError::new(
                    ErrorKind::Error,
                    "operation not supported on the number datatype",
                    "",
                    0,
                    0,
                ))
            }
        })
    }

    /// The tabulated Infinity matrix.
    fn infinity_op(
        &mut self,
        a: &VarRef,
        b: &VarRef,
        a_inf: i32,
        b_inf: i32,
        op: TokenKind,
    ) -> Result<VarRef, ScriptError> {
        use TokenKind::*;
        let a_int = a.borrow().get_int();
        let b_int = b.borrow().get_int();
        let a_sign = if a_int >= 0 { 1 } else { -1 };
        let b_sign = if b_int >= 0 { 1 } else { -1 };
        Ok(match op {
            Equal => self.new_bool(a_inf == b_inf),
            NotEqual => self.new_bool(a_inf != b_inf),
            Gt | GreaterEqual => self.new_bool(a_inf >= b_inf),
            Lt | LessEqual => self.new_bool(a_inf <= b_inf),
            Plus => {
                if a_inf != 0 && b_inf != 0 && a_inf != b_inf {
                    self.nan()
                } else {
                    self.infinity(if b_inf != 0 { b_inf } else { a_inf })
                }
            }
            Minus => {
                if a_inf != 0 && a_inf == b_inf {
                    self.nan()
                } else {
                    self.infinity(if b_inf != 0 { -b_inf } else { a_inf })
                }
            }
            Star => {
                let product = a_int.wrapping_mul(b_int);
                if product == 0 {
                    self.nan()
                } else {
                    self.infinity(product)
                }
            }
            Slash => {
                if a_inf != 0 && b_inf != 0 {
                    self.nan()
                } else if b_inf != 0 {
                    self.new_int(0)
                } else {
                    self.infinity(a_sign * b_sign)
                }
            }
            Percent => {
                if a_inf != 0 {
                    self.nan()
                } else {
                    self.infinity(a_sign)
                }
            }
            Amp => self.new_int(0),
            Pipe | Caret => {
                if a_inf != 0 && b_inf != 0 {
                    self.new_int(0)
                } else {
                    self.new_int(if a_inf != 0 { b_int } else { a_int })
                }
            }
            Shl | Shr | ShrU => {
                if a_inf != 0 {
                    self.new_int(0)
                } else {
                    self.new_int(a_int)
                }
            }
            _ => {
                return Err(ScriptError::new(
                    ErrorKind::Error,
                    "operation not supported on the Infinity datatype",
                    "",
                    0,
                    0,
                ))
            }
        })
    }

    // ------------------------------------------------------------------
    // Function call protocol
    // ------------------------------------------------------------------

    /// Call `function` with positional `args` and `this`. When `new_this`
    /// is supplied it receives the (possibly replaced) `this` after the
    /// call (constructor protocol).
    pub(crate) fn call_function_with(
        &mut self,
        execute: &mut bool,
        function: &VarRef,
        args: Vec<VarRef>,
        this: &VarRef,
        new_this: Option<&mut VarRef>,
    ) -> Result<VarRef, ScriptError> {
        if !*execute {
            return Ok(self.undefined());
        }
        let data = match function.borrow().function_data() {
            Some(data) => data.clone(),
            None => {
                self.raise_error(
                    execute,
                    ErrorKind::TypeError,
                    "value is not a function".to_string(),
                )?;
                return Ok(self.undefined());
            }
        };
        if self.options.max_call_depth != 0 && self.call_depth >= self.options.max_call_depth {
            self.raise_error(execute, ErrorKind::Error, "too much recursion".to_string())?;
            return Ok(self.undefined());
        }

        // Fresh function scope, parented on the captured closure.
        let fn_scope = self.heap.alloc(VarKind::FunctionScope);
        if let Some(closure) = function.find_child(CLOSURE_SLOT) {
            fn_scope.add_child(
                ScriptString::from(CLOSURE_SLOT),
                closure.var(),
                LinkFlags::NONE,
            );
        }
        if !data.name.is_empty() {
            fn_scope.add_child(data.name.clone(), function.clone(), LinkFlags::DEFAULT);
        }
        fn_scope.add_child(ScriptString::from(THIS), this.clone(), LinkFlags::DEFAULT);

        let arguments = self.new_object();
        fn_scope.add_child(
            ScriptString::from(ARGUMENTS),
            arguments.clone(),
            LinkFlags::DEFAULT,
        );
        let count = args.len().max(data.params.len());
        for idx in 0..count {
            let value = if idx < args.len() {
                arguments.add_child(
                    ScriptString::from(idx.to_string()),
                    args[idx].clone(),
                    LinkFlags::DEFAULT,
                );
                args[idx].clone()
            } else {
                self.undefined()
            };
            if let Some(param) = data.params.get(idx) {
                match param {
                    Param::Name(name) => {
                        fn_scope.add_child_or_replace(name.clone(), value, LinkFlags::DEFAULT);
                    }
                    Param::Pattern(pattern) => {
                        self.destructure_into_scope(execute, &fn_scope, pattern, &value)?;
                        if !*execute {
                            return Ok(self.undefined());
                        }
                    }
                }
            }
        }
        arguments.add_child(
            ScriptString::from("length"),
            self.new_int(args.len() as i32),
            LinkFlags::DEFAULT,
        );

        self.call_depth += 1;
        self.scopes.push(fn_scope.clone());
        let outcome = self.call_body(execute, function, &data, &fn_scope);
        self.scopes.pop();
        self.call_depth -= 1;
        outcome?;

        if *execute {
            if let Some(new_this) = new_this {
                if let Some(link) = fn_scope.find_child(THIS) {
                    *new_this = link.var();
                }
            }
            if let Some(ret) = fn_scope.find_child(RETURN_SLOT) {
                return Ok(ret.var());
            }
        }
        Ok(self.undefined())
    }

    fn call_body(
        &mut self,
        execute: &mut bool,
        function: &VarRef,
        data: &Rc<FnData>,
        fn_scope: &VarRef,
    ) -> Result<(), ScriptError> {
        let callback = match &function.borrow().kind {
            VarKind::Native { callback, .. } => Some(callback.clone()),
            _ => None,
        };
        if let Some(callback) = callback {
            match callback(self, fn_scope) {
                Ok(()) => {
                    if self.flags.throwing {
                        *execute = false;
                    }
                    Ok(())
                }
                Err(ScriptError::Thrown) => {
                    if self.flags.can_throw {
                        self.flags.throwing = true;
                        *execute = false;
                        Ok(())
                    } else {
                        let text = self
                            .exception
                            .take()
                            .map(|v| v.borrow().primitive_string())
                            .unwrap_or_default();
                        Err(ScriptError::new(
                            ErrorKind::SyntaxError,
                            format!("{}' in: native function '{}'", text, data.name),
                            "",
                            0,
                            0,
                        ))
                    }
                }
                Err(ScriptError::Script { kind, message, .. }) => {
                    // Errors from natives are script-catchable.
                    if self.flags.can_throw {
                        let error = self.new_error(kind, &message, "", 0, 0);
                        self.exception = Some(error);
                        self.flags.throwing = true;
                        *execute = false;
                        Ok(())
                    } else {
                        Err(ScriptError::new(kind, message, "", 0, 0))
                    }
                }
            }
        } else {
            let mut t = TokenCursor::empty(data.file.clone());
            t.push_stream(data.body.clone());
            if data.is_expression_body() {
                let result = self.execute_base(&mut t, execute)?;
                let value = result.var();
                fn_scope.add_child_or_replace(
                    ScriptString::from(RETURN_SLOT),
                    value,
                    LinkFlags::DEFAULT,
                );
            } else {
                self.execute_block(&mut t, execute, false)?;
            }
            // `return` cleared the flag; only an in-flight exception keeps
            // the unwind going.
            if !self.flags.throwing {
                *execute = true;
            }
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Native-callback helpers (scope-based argument marshaling)
    // ------------------------------------------------------------------

    /// `this` of the running native call.
    pub fn native_this(&self, scope: &VarRef) -> VarRef {
        scope
            .find_child(THIS)
            .map(|link| link.var())
            .unwrap_or_else(|| self.undefined())
    }

    /// Positional argument.
    pub fn native_arg(&self, scope: &VarRef, idx: usize) -> VarRef {
        scope
            .find_child(ARGUMENTS)
            .and_then(|args| args.var().find_child(&idx.to_string()))
            .map(|link| link.var())
            .unwrap_or_else(|| self.undefined())
    }

    /// Argument by declared parameter name.
    pub fn native_arg_named(&self, scope: &VarRef, name: &str) -> VarRef {
        scope
            .find_child(name)
            .map(|link| link.var())
            .unwrap_or_else(|| self.undefined())
    }

    pub fn native_args_len(&self, scope: &VarRef) -> usize {
        scope
            .find_child(ARGUMENTS)
            .and_then(|args| args.var().find_child("length"))
            .map(|link| link.var().borrow().get_int().max(0) as usize)
            .unwrap_or(0)
    }

    /// Store the native call's return value.
    pub fn native_return(&self, scope: &VarRef, value: VarRef) {
        scope.add_child_or_replace(ScriptString::from(RETURN_SLOT), value, LinkFlags::DEFAULT);
    }

    /// Create a native function value without attaching it anywhere (used
    /// for accessor getters/setters).
    pub(crate) fn new_native_function<F>(&mut self, name: &str, params: &[&str], callback: F) -> VarRef
    where
        F: Fn(&mut Interpreter, &VarRef) -> Result<(), ScriptError> + 'static,
    {
        let data = Rc::new(FnData {
            name: self.strings.intern(name),
            params: params
                .iter()
                .map(|p| Param::Name(ScriptString::from(*p)))
                .collect(),
            file: self.strings.intern("native"),
            line: 0,
            body: Rc::new(Vec::new()),
        });
        let var = self.heap.alloc(VarKind::Native {
            data,
            callback: Rc::new(callback),
        });
        var.add_child(
            ScriptString::from(PROTO),
            self.function_prototype.clone(),
            LinkFlags::WRITABLE,
        );
        var
    }

    /// Build a script function from parameter list and body text (the
    /// `Function` constructor).
    pub(crate) fn parse_function_source(
        &mut self,
        params: &str,
        body: &str,
    ) -> Result<VarRef, ScriptError> {
        let source = format!("function ({}){{{}}}", params, body);
        let buffer = TokenBuffer::parse_expression(
            &source,
            "Function",
            0,
            0,
            self.options.strict_let_redeclaration,
            &mut self.strings,
        )?;
        let data = buffer
            .tokens
            .iter()
            .find(|token| token.kind == TokenKind::FunctionOperator)
            .map(|token| token.function().clone());
        match data {
            Some(data) => Ok(self.new_function(data)),
            None => Err(ScriptError::syntax("invalid function body", "Function", 0, 0)),
        }
    }

    pub(crate) fn options(&self) -> &InterpreterOptions {
        &self.options
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Integer to string in the given radix (lowercase digits).
pub(crate) fn int_to_string_radix(value: i32, radix: u32) -> String {
    if radix == 10 {
        return value.to_string();
    }
    let mut v = (value as i64).unsigned_abs();
    let negative = value < 0;
    let mut digits = Vec::new();
    loop {
        let digit = (v % radix as u64) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        v /= radix as u64;
        if v == 0 {
            break;
        }
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

/// Double to string in a non-decimal radix: integral part plus up to a
/// bounded number of fractional digits.
pub(crate) fn double_to_string_radix(value: f64, radix: u32) -> String {
    let negative = value < 0.0;
    let value = value.abs();
    let int_part = value.trunc();
    let mut out = int_to_string_radix(int_part as i32, radix);
    if negative {
        out.insert(0, '-');
    }
    let mut frac = value - int_part;
    if frac > 0.0 {
        out.push('.');
        let mut count = 0;
        while frac > 0.0 && count < 32 {
            frac *= radix as f64;
            let digit = frac.trunc() as u32;
            out.push(std::char::from_digit(digit, radix).unwrap_or('0'));
            frac -= digit as f64;
            count += 1;
        }
    }
    out
}

/// `Function.prototype.toString` form of a function value.
fn function_signature_string(data: &Rc<FnData>, native: bool) -> String {
    let mut out = String::from("function ");
    out.push_str(data.name.as_str());
    out.push('(');
    let mut first = true;
    for param in &data.params {
        if !first {
            out.push_str(", ");
        }
        first = false;
        match param {
            Param::Name(name) => out.push_str(name.as_str()),
            Param::Pattern(_) => out.push_str("..."),
        }
    }
    out.push_str(") ");
    if native {
        out.push_str("{ /* native code */ }");
    } else {
        out.push_str("{ ... }");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_to_string_radix() {
        assert_eq!(int_to_string_radix(255, 16), "ff");
        assert_eq!(int_to_string_radix(-8, 2), "-1000");
        assert_eq!(int_to_string_radix(42, 10), "42");
    }

    #[test]
    fn test_new_double_normalizes() {
        let interp = Interpreter::new();
        assert!(interp.new_double(f64::NAN).borrow().is_nan());
        assert_eq!(
            interp.new_double(f64::INFINITY).borrow().infinity_sign(),
            1
        );
        assert_eq!(
            interp.new_double(f64::NEG_INFINITY).borrow().infinity_sign(),
            -1
        );
        assert!(interp.new_double(1.5).borrow().is_double());
    }
}
