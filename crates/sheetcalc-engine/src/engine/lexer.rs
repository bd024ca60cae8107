//! Formula lexer.
//!
//! Turns the expression part of a formula into typed tokens. The same token stream
//! drives both evaluation and dependency extraction, so a reference is recognised
//! identically in both places.
//!
//! Lexing never fails: characters that are not part of the formula language come
//! out as [`Token::Unknown`] and are rejected by the evaluator. Dependency
//! extraction simply skips them.

use super::cell_ref::CellRef;

/// Binary arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    fn from_char(c: char) -> Option<Operator> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }

    /// Binding strength: `+ -` bind weaker than `* /`.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    CellRef(CellRef),
    Operator(Operator),
    LParen,
    RParen,
    Unknown(String),
}

/// Tokenize a formula expression (without the leading `=`).
pub fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c == ' ' {
            continue;
        }
        if let Some(op) = Operator::from_char(c) {
            tokens.push(Token::Operator(op));
            continue;
        }
        match c {
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            c if is_word_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(idx, next)) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    end = idx + next.len_utf8();
                    chars.next();
                }
                tokens.push(classify_word(&expr[start..end]));
            }
            other => {
                let mut end = start + other.len_utf8();
                while let Some(&(idx, next)) = chars.peek() {
                    if next == ' ' || is_word_char(next) || is_punct(next) {
                        break;
                    }
                    end = idx + next.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Unknown(expr[start..end].to_string()));
            }
        }
    }

    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.'
}

fn is_punct(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '(' | ')')
}

fn classify_word(word: &str) -> Token {
    if let Some(n) = parse_unsigned_literal(word) {
        return Token::Number(n);
    }
    if let Ok(cell_ref) = CellRef::parse(word) {
        return Token::CellRef(cell_ref);
    }
    Token::Unknown(word.to_string())
}

/// Digits with at most one interior `.`.
fn parse_unsigned_literal(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut seen_dot = false;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'0'..=b'9' => {}
            b'.' if !seen_dot && i != 0 && i != bytes.len() - 1 => seen_dot = true,
            _ => return None,
        }
    }
    text.parse::<f64>().ok()
}

/// Parse text as a numeric literal: an optional leading `-`, then digits with at
/// most one interior `.`.
///
/// This is the rule applied to the value of a referenced cell.
pub fn parse_numeric_literal(text: &str) -> Option<f64> {
    match text.strip_prefix('-') {
        Some(rest) => parse_unsigned_literal(rest).map(|n| -n),
        None => parse_unsigned_literal(text),
    }
}
