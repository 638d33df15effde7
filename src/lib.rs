//! Embeddable interpreter for a JavaScript-like dynamic language.
//!
//! Source text is lexed, pre-parsed into a flat token buffer (with skip
//! offsets, hoisting forwarders, and pre-parsed destructuring scripts), and
//! executed by a tree-walking evaluator against a mutable object heap with
//! prototype inheritance, accessors, lexical scopes, and exceptions.
//!
//! # Example
//!
//! ```
//! use scriptling::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! assert_eq!(interp.evaluate("1 + 2 * 3").unwrap(), "7");
//!
//! interp
//!     .add_native("function host.greet(name)", |interp, scope| {
//!         let name = interp.native_arg_named(scope, "name");
//!         let text = format!("hello {}", name.borrow().primitive_string());
//!         let result = interp.new_string(text);
//!         interp.native_return(scope, result);
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(interp.evaluate("host.greet('world')").unwrap(), "hello world");
//! ```

pub mod error;
pub mod heap;
pub(crate) mod interpreter;
pub mod lexer;
pub mod prelude;
pub mod regexp;
pub mod string_pool;
pub mod token;
pub mod tokenizer;
pub mod value;

pub use error::{ErrorKind, ScriptError, SourceLocation};
pub use heap::HeapStats;
pub use interpreter::{Interpreter, InterpreterOptions};
pub use string_pool::StringPool;
pub use tokenizer::{TokenBuffer, TokenCursor};
pub use value::{Link, LinkFlags, ScriptString, Var, VarKind, VarRef, WorkLink};

// Conversions between value graphs and `serde_json::Value` for hosts.
pub use interpreter::builtins::json::{json_to_var, var_to_json};
