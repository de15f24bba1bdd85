//! Engine error types

use thiserror::Error;

/// Errors produced while scanning formula text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// The formula string was empty or contained only whitespace
    #[error("formula cannot be empty")]
    EmptyFormula,

    /// A character that cannot start or continue any token
    #[error("invalid token '{token}' detected at position {position}")]
    InvalidToken { token: char, position: usize },

    /// A numeric literal that parses neither as integer nor as float
    #[error("invalid numeric literal '{literal}' at position {position}")]
    InvalidNumber { literal: String, position: usize },
}

/// Errors produced while building the operation tree from tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A `)` with no `(` open
    #[error("no matching left bracket found for the right bracket at position {position}")]
    UnmatchedRightBracket { position: usize },

    /// A `(` that is never closed
    #[error("no matching right bracket found for the left bracket at position {position}")]
    UnmatchedLeftBracket { position: usize },

    /// An argument separator outside of any function call
    #[error("argument separator at position {position} is not enclosed in brackets")]
    MisplacedArgumentSeparator { position: usize },

    /// Operand/operator stacks did not reduce to a single root
    #[error("the syntax of the provided formula is not valid")]
    InvalidSyntax,
}

/// Configuration mistakes: invalid engine options or forbidden registry
/// overwrites. These reflect programmer error, not formula input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid decimal separator '{0}', expected '.' or ','")]
    InvalidDecimalSeparator(char),

    #[error("invalid argument separator '{0}', expected ',' or ';'")]
    InvalidArgumentSeparator(char),

    #[error("decimal separator and argument separator cannot both be '{0}'")]
    SeparatorConflict(char),

    #[error("the constant '{0}' cannot be overwritten")]
    ConstantNotOverwritable(String),

    #[error("the function '{0}' cannot be overwritten")]
    FunctionNotOverwritable(String),
}

/// Errors produced while evaluating a compiled formula against bindings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The formula references a variable absent from the bindings
    #[error("the variable '{0}' used is not defined")]
    UndefinedVariable(String),

    /// A binding value that cannot be interpreted as a number
    #[error("the variable '{name}' cannot be converted to a number")]
    NotNumeric { name: String },

    /// A registered function returned an error or panicked
    #[error("error while executing function '{name}': {message}")]
    FunctionRuntime { name: String, message: String },

    /// A function node whose name no longer resolves. The builder only emits
    /// function nodes for registered names, so this is an internal defect.
    #[error("function '{0}' is not registered")]
    UnresolvedFunction(String),
}

/// Any error surfaced by the engine facade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;
