//! An ECMAScript 5.1 execution runtime: environment records, execution
//! contexts, eval and pooled completion records over a tree-walking
//! evaluator.

pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod types;

pub use interpreter::{
    CompletionRecord, EngineError, EngineOptions, Interpreter, JavaScriptException,
};
pub use parser::{ParseError, parse_script};
pub use types::JsValue;
