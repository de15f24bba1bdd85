//! AST builder
//!
//! An operator-precedence (Shunting-Yard) parse over the lexer's token
//! stream, using explicit stacks: one for built operand subtrees, one for
//! pending operator/function tokens and one for per-call-site argument
//! counts. Identifier tokens are resolved here against the function and
//! constant registries; anything unresolved becomes a variable reference.

use crate::ast::{BinaryOp, Operation};
use crate::error::ParseError;
use crate::registry::{ConstantRegistry, FunctionRegistry};
use crate::token::{Token, TokenKind, TokenValue};

pub struct AstBuilder<'a> {
    case_sensitive: bool,
    functions: &'a FunctionRegistry,
    constants: &'a ConstantRegistry,
    /// Caller constants pre-bound at build time; they take priority over the
    /// engine constant registry and fold immediately into literals.
    compiled_constants: Option<&'a ConstantRegistry>,
}

impl<'a> AstBuilder<'a> {
    pub fn new(
        case_sensitive: bool,
        functions: &'a FunctionRegistry,
        constants: &'a ConstantRegistry,
        compiled_constants: Option<&'a ConstantRegistry>,
    ) -> Self {
        Self {
            case_sensitive,
            functions,
            constants,
            compiled_constants,
        }
    }

    pub fn build(&self, tokens: Vec<Token>) -> Result<Operation, ParseError> {
        let mut stacks = Stacks::default();

        for token in tokens {
            match token.kind {
                TokenKind::Integer => {
                    if let TokenValue::Integer(value) = token.value {
                        stacks.operands.push(Operation::integer(value));
                    }
                }
                TokenKind::FloatingPoint => {
                    if let TokenValue::Float(value) = token.value {
                        stacks.operands.push(Operation::float(value));
                    }
                }
                TokenKind::Identifier => self.push_identifier(token, &mut stacks),
                TokenKind::LeftBracket => stacks.operators.push(token),
                TokenKind::RightBracket => {
                    let position = token.start;
                    self.reduce_group(&mut stacks)?;
                    match stacks.operators.last() {
                        Some(top) if top.kind == TokenKind::LeftBracket => {
                            stacks.operators.pop();
                        }
                        _ => return Err(ParseError::UnmatchedRightBracket { position }),
                    }
                }
                TokenKind::ArgumentSeparator => {
                    self.reduce_group(&mut stacks)?;
                    match stacks.arg_counts.last_mut() {
                        Some(count) => *count += 1,
                        None => {
                            return Err(ParseError::MisplacedArgumentSeparator {
                                position: token.start,
                            })
                        }
                    }
                }
                TokenKind::Operator => {
                    self.push_operator(token, &mut stacks)?;
                }
            }
        }

        self.reduce_group(&mut stacks)?;
        if let Some(bracket) = stacks
            .operators
            .iter()
            .find(|t| t.kind == TokenKind::LeftBracket)
        {
            return Err(ParseError::UnmatchedLeftBracket {
                position: bracket.start,
            });
        }

        match (stacks.operands.pop(), stacks.operands.is_empty()) {
            (Some(root), true) => Ok(root),
            _ => Err(ParseError::InvalidSyntax),
        }
    }

    /// Function names win over constants; compiled constants win over the
    /// engine registry; anything else is a variable.
    fn push_identifier(&self, token: Token, stacks: &mut Stacks) {
        let name = match &token.value {
            TokenValue::Identifier(name) => name.clone(),
            _ => return,
        };

        if self.functions.get(&name).is_some() {
            stacks.operators.push(token);
            stacks.arg_counts.push(1);
            return;
        }

        if let Some(value) = self
            .compiled_constants
            .and_then(|registry| registry.get(&name))
        {
            stacks.operands.push(Operation::float(value));
            return;
        }

        if let Some(value) = self.constants.get(&name) {
            stacks.operands.push(Operation::float(value));
            return;
        }

        let name = if self.case_sensitive {
            name
        } else {
            name.to_lowercase()
        };
        stacks.operands.push(Operation::variable(name));
    }

    /// Pop and reduce until the new operator can be pushed: functions on top
    /// of the stack always reduce first; operators reduce per the precedence
    /// table and associativity pop rule.
    fn push_operator(&self, token: Token, stacks: &mut Stacks) -> Result<(), ParseError> {
        let new_op = token.operator().unwrap_or('\0');

        while let Some(top) = stacks.operators.last() {
            match top.kind {
                TokenKind::Identifier => {
                    let function = stacks.operators.pop().ok_or(ParseError::InvalidSyntax)?;
                    self.reduce_function(function, stacks)?;
                }
                TokenKind::Operator => {
                    let top_op = top.operator().unwrap_or('\0');
                    let pops = (is_left_associative(new_op)
                        && precedence(new_op) <= precedence(top_op))
                        || precedence(new_op) < precedence(top_op);
                    if !pops {
                        break;
                    }
                    let top = stacks.operators.pop().ok_or(ParseError::InvalidSyntax)?;
                    self.reduce_operator(&top, stacks)?;
                }
                _ => break,
            }
        }

        stacks.operators.push(token);
        Ok(())
    }

    /// Reduce pending operators and functions up to (not including) the
    /// nearest open bracket.
    fn reduce_group(&self, stacks: &mut Stacks) -> Result<(), ParseError> {
        while let Some(top) = stacks.operators.last() {
            match top.kind {
                TokenKind::LeftBracket => break,
                TokenKind::Identifier => {
                    let function = stacks.operators.pop().ok_or(ParseError::InvalidSyntax)?;
                    self.reduce_function(function, stacks)?;
                }
                _ => {
                    let top = stacks.operators.pop().ok_or(ParseError::InvalidSyntax)?;
                    self.reduce_operator(&top, stacks)?;
                }
            }
        }
        Ok(())
    }

    /// Pop order is right-then-left: the second pop is the left operand.
    fn reduce_operator(&self, token: &Token, stacks: &mut Stacks) -> Result<(), ParseError> {
        let op = match token.operator() {
            Some(op) => op,
            None => return Err(ParseError::InvalidSyntax),
        };

        if op == '_' {
            let operand = stacks.pop_operand()?;
            stacks.operands.push(Operation::unary_minus(operand));
            return Ok(());
        }

        let kind = match op {
            '+' => BinaryOp::Add,
            '-' => BinaryOp::Subtract,
            '*' => BinaryOp::Multiply,
            '/' => BinaryOp::Divide,
            '%' => BinaryOp::Modulo,
            '^' => BinaryOp::Power,
            '&' => BinaryOp::And,
            '|' => BinaryOp::Or,
            '<' => BinaryOp::LessThan,
            '≤' => BinaryOp::LessOrEqual,
            '>' => BinaryOp::GreaterThan,
            '≥' => BinaryOp::GreaterOrEqual,
            '=' => BinaryOp::Equal,
            '≠' => BinaryOp::NotEqual,
            _ => return Err(ParseError::InvalidSyntax),
        };

        let right = stacks.pop_operand()?;
        let left = stacks.pop_operand()?;
        stacks.operands.push(Operation::binary(kind, left, right));
        Ok(())
    }

    /// Pop `argument_count` operands, restore source order and build the
    /// call node with the registered callable's idempotence.
    fn reduce_function(&self, token: Token, stacks: &mut Stacks) -> Result<(), ParseError> {
        let name = match token.value {
            TokenValue::Identifier(name) => name,
            _ => return Err(ParseError::InvalidSyntax),
        };
        let info = self.functions.get(&name).ok_or(ParseError::InvalidSyntax)?;
        let canonical = info.name.clone();
        let idempotent = info.idempotent;

        let count = stacks.arg_counts.pop().ok_or(ParseError::InvalidSyntax)?;
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            args.push(stacks.pop_operand()?);
        }
        args.reverse();

        stacks
            .operands
            .push(Operation::function(canonical, args, idempotent));
        Ok(())
    }
}

#[derive(Default)]
struct Stacks {
    operands: Vec<Operation>,
    operators: Vec<Token>,
    arg_counts: Vec<usize>,
}

impl Stacks {
    fn pop_operand(&mut self) -> Result<Operation, ParseError> {
        self.operands.pop().ok_or(ParseError::InvalidSyntax)
    }
}

/// Precedence, low to high; brackets are handled as stack markers rather
/// than through this table.
fn precedence(op: char) -> u8 {
    match op {
        '&' | '|' => 1,
        '<' | '>' | '≤' | '≥' | '≠' | '=' => 2,
        '+' | '-' => 3,
        '*' | '/' | '%' => 4,
        '_' => 5,
        '^' => 6,
        _ => 0,
    }
}

fn is_left_associative(op: char) -> bool {
    matches!(op, '*' | '+' | '-' | '/')
}
