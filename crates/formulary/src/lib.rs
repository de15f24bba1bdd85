//! # formulary
//!
//! Formula compilation and evaluation engine.
//!
//! This crate provides:
//! - Formula scanning and parsing (text → operation tree)
//! - Constant folding over the compiled tree
//! - Formula evaluation against caller-supplied variables
//! - A built-in math function library and constants
//! - Thread-safe caching of compiled formulas
//!
//! ## Example
//!
//! ```rust
//! use formulary::{variables, Engine};
//!
//! let engine = Engine::new();
//! let result = engine.calculate("var1 + 2 * (3 * age)", &variables([
//!     ("var1", 2),
//!     ("age", 4),
//! ]))?;
//! assert_eq!(result, 26.0);
//! # Ok::<(), formulary::EngineError>(())
//! ```

pub mod ast;
mod cache;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod registry;
pub mod token;
pub mod value;

pub use ast::{BinaryOp, DataType, Metadata, Operation};
pub use engine::{Engine, EngineOptions, Formula};
pub use error::{ConfigError, EngineError, EngineResult, EvalError, LexError, ParseError};
pub use registry::{ConstantRegistry, FunctionRegistry, FunctionResult, NativeFunction};
pub use value::{variables, Value, Variables};
