//! Lexer output tokens

/// Classification of a scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Integer,
    FloatingPoint,
    Identifier,
    Operator,
    LeftBracket,
    RightBracket,
    ArgumentSeparator,
}

/// Payload of a scanned token.
///
/// Operators are single canonical characters: two-character source operators
/// are composed by the lexer (`<=` → `≤`, `>=` → `≥`, `!=` → `≠`, `==` → `=`,
/// `&&` → `&`, `||` → `|`) and unary minus is the sentinel `_`, distinct from
/// binary `-`.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Integer(i64),
    Float(f64),
    Operator(char),
    Identifier(String),
}

/// A token with its exact source span, for error reporting downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub start: usize,
    pub len: usize,
}

impl Token {
    pub(crate) fn operator(&self) -> Option<char> {
        match self.value {
            TokenValue::Operator(c) => Some(c),
            _ => None,
        }
    }
}
