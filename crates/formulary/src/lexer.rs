//! Formula lexer
//!
//! Scans formula text left to right into a flat token stream. The scan is a
//! pure function of the input and the configured separators; identifier case
//! is preserved here and folded later by the AST builder.

use crate::error::LexError;
use crate::token::{Token, TokenKind, TokenValue};

/// Scans formula text into tokens.
pub struct Lexer {
    decimal_separator: char,
    argument_separator: char,
}

impl Lexer {
    pub fn new(decimal_separator: char, argument_separator: char) -> Self {
        Self {
            decimal_separator,
            argument_separator,
        }
    }

    /// Tokenize `formula`. Fails on empty input or on the first character
    /// that cannot belong to any token.
    pub fn read(&self, formula: &str) -> Result<Vec<Token>, LexError> {
        if formula.trim().is_empty() {
            return Err(LexError::EmptyFormula);
        }

        let chars: Vec<char> = formula.chars().collect();
        let mut tokens: Vec<Token> = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c.is_whitespace() {
                i += 1;
                continue;
            }

            if self.is_numeric_start(c, &tokens) {
                i = self.scan_number(&chars, i, &mut tokens)?;
                continue;
            }

            if is_identifier_start(c) {
                i = scan_identifier(&chars, i, &mut tokens);
                continue;
            }

            if c == self.argument_separator {
                tokens.push(Token {
                    kind: TokenKind::ArgumentSeparator,
                    value: TokenValue::Operator(c),
                    start: i,
                    len: 1,
                });
                i += 1;
                continue;
            }

            match c {
                '+' | '*' | '/' | '^' | '%' => {
                    push_operator(&mut tokens, c, i, 1);
                    i += 1;
                }
                '-' => {
                    // A '-' that could not start a literal (next char is not
                    // part of a number) is still unary after an operator or
                    // an opening bracket.
                    let op = if unary_minus_position(&tokens) { '_' } else { '-' };
                    push_operator(&mut tokens, op, i, 1);
                    i += 1;
                }
                '(' => {
                    tokens.push(Token {
                        kind: TokenKind::LeftBracket,
                        value: TokenValue::Operator(c),
                        start: i,
                        len: 1,
                    });
                    i += 1;
                }
                ')' => {
                    tokens.push(Token {
                        kind: TokenKind::RightBracket,
                        value: TokenValue::Operator(c),
                        start: i,
                        len: 1,
                    });
                    i += 1;
                }
                '<' => {
                    if chars.get(i + 1) == Some(&'=') {
                        push_operator(&mut tokens, '≤', i, 2);
                        i += 2;
                    } else {
                        push_operator(&mut tokens, '<', i, 1);
                        i += 1;
                    }
                }
                '>' => {
                    if chars.get(i + 1) == Some(&'=') {
                        push_operator(&mut tokens, '≥', i, 2);
                        i += 2;
                    } else {
                        push_operator(&mut tokens, '>', i, 1);
                        i += 1;
                    }
                }
                '!' => {
                    if chars.get(i + 1) == Some(&'=') {
                        push_operator(&mut tokens, '≠', i, 2);
                        i += 2;
                    } else {
                        return Err(LexError::InvalidToken { token: c, position: i });
                    }
                }
                '&' => {
                    if chars.get(i + 1) == Some(&'&') {
                        push_operator(&mut tokens, '&', i, 2);
                        i += 2;
                    } else {
                        return Err(LexError::InvalidToken { token: c, position: i });
                    }
                }
                '|' => {
                    if chars.get(i + 1) == Some(&'|') {
                        push_operator(&mut tokens, '|', i, 2);
                        i += 2;
                    } else {
                        return Err(LexError::InvalidToken { token: c, position: i });
                    }
                }
                '=' => {
                    if chars.get(i + 1) == Some(&'=') {
                        push_operator(&mut tokens, '=', i, 2);
                        i += 2;
                    } else {
                        return Err(LexError::InvalidToken { token: c, position: i });
                    }
                }
                _ => {
                    return Err(LexError::InvalidToken { token: c, position: i });
                }
            }
        }

        Ok(tokens)
    }

    fn is_numeric_start(&self, c: char, tokens: &[Token]) -> bool {
        c.is_ascii_digit()
            || c == self.decimal_separator
            || (c == '-' && unary_minus_position(tokens))
    }

    /// Greedily scan a numeric literal starting at `start`. Consumes digits,
    /// at most one decimal separator and at most one exponent marker with an
    /// optional sign. Returns the index of the first unconsumed character.
    fn scan_number(
        &self,
        chars: &[char],
        start: usize,
        tokens: &mut Vec<Token>,
    ) -> Result<usize, LexError> {
        let mut buffer = String::new();
        buffer.push(chars[start]);
        let mut i = start + 1;
        let mut has_exponent = false;

        while i < chars.len() {
            let c = chars[i];
            if c.is_ascii_digit() || c == self.decimal_separator {
                buffer.push(c);
                i += 1;
            } else if c == 'e' || c == 'E' {
                // "-e" is the unary-minus sentinel followed by the constant e
                if buffer == "-" {
                    break;
                }
                if has_exponent {
                    return Err(LexError::InvalidToken { token: c, position: i });
                }
                has_exponent = true;
                buffer.push(c);
                i += 1;
                if let Some(&sign) = chars.get(i) {
                    if sign == '-' || sign == '+' {
                        buffer.push(sign);
                        i += 1;
                    }
                }
            } else {
                break;
            }
        }

        let literal: String = buffer
            .chars()
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect();

        if let Ok(value) = literal.parse::<i64>() {
            tokens.push(Token {
                kind: TokenKind::Integer,
                value: TokenValue::Integer(value),
                start,
                len: i - start,
            });
        } else if let Ok(value) = literal.parse::<f64>() {
            tokens.push(Token {
                kind: TokenKind::FloatingPoint,
                value: TokenValue::Float(value),
                start,
                len: i - start,
            });
        } else if buffer == "-" {
            push_operator(tokens, '_', start, 1);
        } else {
            return Err(LexError::InvalidNumber {
                literal: buffer,
                position: start,
            });
        }

        Ok(i)
    }
}

/// A `-` is unary unless the token before it is a numeric literal, an
/// identifier or a closing bracket.
fn unary_minus_position(tokens: &[Token]) -> bool {
    !matches!(
        tokens.last().map(|t| t.kind),
        Some(
            TokenKind::Integer
                | TokenKind::FloatingPoint
                | TokenKind::Identifier
                | TokenKind::RightBracket
        )
    )
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn scan_identifier(chars: &[char], start: usize, tokens: &mut Vec<Token>) -> usize {
    let mut i = start + 1;
    while i < chars.len() && is_identifier_part(chars[i]) {
        i += 1;
    }
    tokens.push(Token {
        kind: TokenKind::Identifier,
        value: TokenValue::Identifier(chars[start..i].iter().collect()),
        start,
        len: i - start,
    });
    i
}

fn push_operator(tokens: &mut Vec<Token>, op: char, start: usize, len: usize) {
    tokens.push(Token {
        kind: TokenKind::Operator,
        value: TokenValue::Operator(op),
        start,
        len,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read(formula: &str) -> Vec<Token> {
        Lexer::new('.', ',').read(formula).unwrap()
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(Lexer::new('.', ',').read(""), Err(LexError::EmptyFormula));
        assert_eq!(Lexer::new('.', ',').read("   "), Err(LexError::EmptyFormula));
    }

    #[test]
    fn test_token_counts() {
        assert_eq!(read("42+31").len(), 3);
        assert_eq!(read("(42+31)").len(), 5);
        assert_eq!(read("(42+31.0").len(), 4);
        assert_eq!(read("(42+ 8) *2").len(), 7);
        assert_eq!(read("(42.87+31.0").len(), 4);
        assert_eq!(read("(var+31.0").len(), 4);
    }

    #[test]
    fn test_integer_and_float_tokens() {
        let tokens = read("42+31.5");
        assert_eq!(tokens[0].value, TokenValue::Integer(42));
        assert_eq!(tokens[0].kind, TokenKind::Integer);
        assert_eq!(tokens[2].value, TokenValue::Float(31.5));
        assert_eq!(tokens[2].kind, TokenKind::FloatingPoint);
    }

    #[test]
    fn test_source_spans() {
        let tokens = read("(42+ 8) *2");
        let starts: Vec<usize> = tokens.iter().map(|t| t.start).collect();
        assert_eq!(starts, vec![0, 1, 3, 5, 6, 8, 9]);
        assert_eq!(tokens[1].len, 2);
    }

    #[test]
    fn test_leading_minus_folds_into_literal() {
        let tokens = read("-2.1");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, TokenValue::Float(-2.1));
    }

    #[test]
    fn test_minus_before_identifier_is_unary() {
        let tokens = read("-e");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].value, TokenValue::Operator('_'));
        assert_eq!(tokens[1].value, TokenValue::Identifier("e".into()));
    }

    #[test]
    fn test_minus_after_operand_is_binary() {
        let tokens = read("1-e");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].value, TokenValue::Operator('-'));

        let tokens = read("3 - 2");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].value, TokenValue::Operator('-'));
        assert_eq!(tokens[2].value, TokenValue::Integer(2));
    }

    #[test]
    fn test_minus_after_operator_starts_literal() {
        let tokens = read("5*-100");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].value, TokenValue::Integer(-100));

        // double minus: binary subtraction of a negative literal
        let tokens = read("2766237061056.00--1619439373.00");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].value, TokenValue::Operator('-'));
        assert_eq!(tokens[2].value, TokenValue::Float(-1619439373.00));
    }

    #[test]
    fn test_scientific_notation() {
        let tokens = read("1e-3*5");
        assert_eq!(tokens[0].value, TokenValue::Float(1e-3));
        assert_eq!(tokens.len(), 3);

        let tokens = read("2E5");
        assert_eq!(tokens[0].value, TokenValue::Float(2e5));

        let tokens = read("1e+2");
        assert_eq!(tokens[0].value, TokenValue::Float(1e2));
    }

    #[test]
    fn test_double_exponent_is_invalid() {
        assert_eq!(
            Lexer::new('.', ',').read("1e2e3"),
            Err(LexError::InvalidToken { token: 'e', position: 3 })
        );
    }

    #[test]
    fn test_two_char_operators() {
        let ops: Vec<char> = read("1<=2>=3!=4==5&&6||7")
            .iter()
            .filter_map(|t| t.operator())
            .collect();
        assert_eq!(ops, vec!['≤', '≥', '≠', '=', '&', '|']);
    }

    #[test]
    fn test_lone_composite_chars_are_invalid() {
        for (formula, position) in [("1=2", 1), ("1&2", 1), ("1|2", 1), ("!1", 0)] {
            let err = Lexer::new('.', ',').read(formula).unwrap_err();
            assert!(
                matches!(err, LexError::InvalidToken { position: p, .. } if p == position),
                "{formula}: {err:?}"
            );
        }
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            Lexer::new('.', ',').read("2 + #"),
            Err(LexError::InvalidToken { token: '#', position: 4 })
        );
    }

    #[test]
    fn test_dollar_identifiers() {
        let tokens = read("$var1 + 2");
        assert_eq!(tokens[0].value, TokenValue::Identifier("$var1".into()));
    }

    #[test]
    fn test_comma_decimal_separator() {
        let lexer = Lexer::new(',', ';');
        let tokens = lexer.read("1,5+2").unwrap();
        assert_eq!(tokens[0].value, TokenValue::Float(1.5));

        let tokens = lexer.read("max(1,5;2)").unwrap();
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[3].kind, TokenKind::ArgumentSeparator);
    }
}
