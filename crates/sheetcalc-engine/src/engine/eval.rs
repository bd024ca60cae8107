//! Formula evaluation.
//!
//! A formula is `=` followed by an arithmetic expression. Evaluation runs in three
//! steps: lex ([`tokenize`]), reorder to postfix with the shunting-yard algorithm
//! ([`to_rpn`]), then fold the postfix sequence on a value stack.
//!
//! Failures are returned as [`EvalError`]; callers store them in the cell rather
//! than propagating them.

use super::cell::CellValue;
use super::cell_ref::CellRef;
use super::error::EvalError;
use super::lexer::{Operator, Token, tokenize};

/// Read access to cell values during evaluation.
pub trait CellLookup {
    /// The current value of a cell, or `None` if the cell does not exist.
    fn value_of(&self, cell_ref: &CellRef) -> Option<&CellValue>;
}

/// One step of a postfix program.
#[derive(Clone, Debug, PartialEq)]
pub enum RpnItem {
    Number(f64),
    CellRef(CellRef),
    Binary(Operator),
    Negate,
}

/// Entries on the shunting-yard operator stack.
#[derive(Clone, Copy, Debug, PartialEq)]
enum StackOp {
    Binary(Operator),
    Negate,
    LParen,
}

impl StackOp {
    fn precedence(self) -> u8 {
        match self {
            StackOp::Binary(op) => op.precedence(),
            // Binds tighter than any binary operator.
            StackOp::Negate => 3,
            StackOp::LParen => 0,
        }
    }

    fn into_rpn(self) -> Option<RpnItem> {
        match self {
            StackOp::Binary(op) => Some(RpnItem::Binary(op)),
            StackOp::Negate => Some(RpnItem::Negate),
            StackOp::LParen => None,
        }
    }
}

/// Convert a token stream to postfix order.
///
/// A `-` is unary when it starts the expression or follows an operator or `(`.
/// Among binary operators of equal precedence the leftmost is applied first.
/// Unbalanced parentheses are rejected.
pub fn to_rpn(tokens: &[Token]) -> Result<Vec<RpnItem>, EvalError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<StackOp> = Vec::new();
    let mut prev: Option<&Token> = None;

    for token in tokens {
        match token {
            Token::Number(n) => output.push(RpnItem::Number(*n)),
            Token::CellRef(cell_ref) => output.push(RpnItem::CellRef(*cell_ref)),
            Token::Operator(Operator::Sub)
                if matches!(prev, None | Some(Token::Operator(_)) | Some(Token::LParen)) =>
            {
                stack.push(StackOp::Negate);
            }
            Token::Operator(op) => {
                while let Some(&top) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    stack.pop();
                    output.extend(top.into_rpn());
                }
                stack.push(StackOp::Binary(*op));
            }
            Token::LParen => stack.push(StackOp::LParen),
            Token::RParen => loop {
                match stack.pop() {
                    Some(StackOp::LParen) => break,
                    Some(op) => output.extend(op.into_rpn()),
                    None => return Err(EvalError::InvalidFormula("unmatched ')'".to_string())),
                }
            },
            Token::Unknown(text) => return Err(EvalError::InvalidToken(text.clone())),
        }
        prev = Some(token);
    }

    while let Some(op) = stack.pop() {
        match op.into_rpn() {
            Some(item) => output.push(item),
            None => return Err(EvalError::InvalidFormula("unmatched '('".to_string())),
        }
    }

    Ok(output)
}

/// Evaluate a postfix program against the cells in `lookup`.
pub fn eval_rpn(program: &[RpnItem], lookup: &impl CellLookup) -> Result<f64, EvalError> {
    let underflow = || EvalError::InvalidFormula("missing operand".to_string());
    let mut stack: Vec<f64> = Vec::new();

    for item in program {
        match item {
            RpnItem::Number(n) => stack.push(*n),
            RpnItem::CellRef(cell_ref) => {
                let value = lookup
                    .value_of(cell_ref)
                    .ok_or_else(|| EvalError::InvalidToken(cell_ref.to_string()))?;
                let n = value
                    .as_number()
                    .ok_or(EvalError::InvalidOperand(*cell_ref))?;
                stack.push(n);
            }
            RpnItem::Negate => {
                let n = stack.pop().ok_or_else(underflow)?;
                stack.push(-n);
            }
            RpnItem::Binary(op) => {
                let right = stack.pop().ok_or_else(underflow)?;
                let left = stack.pop().ok_or_else(underflow)?;
                let result = match op {
                    Operator::Add => left + right,
                    Operator::Sub => left - right,
                    Operator::Mul => left * right,
                    Operator::Div => {
                        if right == 0.0 {
                            return Err(EvalError::DivisionByZero);
                        }
                        left / right
                    }
                };
                stack.push(result);
            }
        }
    }

    match stack.as_slice() {
        [n] if n.is_finite() => Ok(*n),
        [_] => Err(EvalError::InvalidFormula("result is not a finite number".to_string())),
        [] => Err(EvalError::InvalidFormula("empty expression".to_string())),
        _ => Err(EvalError::InvalidFormula("missing operator".to_string())),
    }
}

/// Evaluate a formula (including its leading `=`).
///
/// Every reference must name an existing cell whose value reads as a number.
pub fn evaluate(formula: &str, lookup: &impl CellLookup) -> Result<f64, EvalError> {
    let expr = formula
        .strip_prefix('=')
        .ok_or_else(|| EvalError::InvalidFormula(format!("missing '=' in {formula:?}")))?;
    let tokens = tokenize(expr);

    // Token validity is checked for the whole formula before anything is computed.
    for token in &tokens {
        match token {
            Token::Unknown(text) => return Err(EvalError::InvalidToken(text.clone())),
            Token::CellRef(cell_ref) if lookup.value_of(cell_ref).is_none() => {
                return Err(EvalError::InvalidToken(cell_ref.to_string()));
            }
            _ => {}
        }
    }

    let program = to_rpn(&tokens)?;
    eval_rpn(&program, lookup)
}

/// Evaluate a formula and convert the outcome into a cell value.
pub fn evaluate_to_value(formula: &str, lookup: &impl CellLookup) -> CellValue {
    match evaluate(formula, lookup) {
        Ok(n) => CellValue::Number(n),
        Err(err) => CellValue::Error(err.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CellError, CellStore};
    use pretty_assertions::assert_eq;

    fn eval(formula: &str) -> String {
        evaluate_to_value(formula, &CellStore::new()).display()
    }

    fn store(cells: &[(&str, &str)]) -> CellStore {
        let mut store = CellStore::new();
        for (name, literal) in cells {
            store.init_if_absent(CellRef::parse(name).unwrap(), literal);
        }
        store
    }

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(eval("=1+2"), "3");
        assert_eq!(eval("=2*(3+4)"), "14");
        assert_eq!(eval("=7/2"), "3.5");
        assert_eq!(eval("= 10 - 4 "), "6");
    }

    #[test]
    fn test_precedence_and_left_associativity() {
        assert_eq!(eval("=2+3*4"), "14");
        assert_eq!(eval("=10-4-3"), "3");
        assert_eq!(eval("=100/10/5"), "2");
        assert_eq!(eval("=8/2*4"), "16");
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval("=-5+2"), "-3");
        assert_eq!(eval("=2*-3"), "-6");
        assert_eq!(eval("=-(1+2)"), "-3");
        assert_eq!(eval("=--4"), "4");
        assert_eq!(eval("=3--2"), "5");
        assert_eq!(eval("= -5"), "-5");
        assert_eq!(eval("=(2)-1"), "1");
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("=10/0"), "#DIV/0!");
        assert_eq!(eval("=1/(2-2)+1"), "#DIV/0!");
    }

    #[test]
    fn test_malformed_formulas_are_invalid() {
        for formula in ["=", "=1+", "=*2", "=1)", "=(1", "=1 2", "=()", "=2^3", "=foo"] {
            assert_eq!(eval(formula), "invalid", "{formula:?}");
        }
    }

    #[test]
    fn test_unmatched_parens_are_invalid_formula() {
        let cells = CellStore::new();
        assert!(matches!(
            evaluate("=1)", &cells),
            Err(EvalError::InvalidFormula(_))
        ));
        assert!(matches!(
            evaluate("=(1", &cells),
            Err(EvalError::InvalidFormula(_))
        ));
    }

    #[test]
    fn test_cell_references() {
        let cells = store(&[("A1", "2"), ("B1", "3"), ("C1", "text"), ("D1", "")]);
        assert_eq!(evaluate("=A1+B1", &cells), Ok(5.0));
        assert_eq!(
            evaluate("=A1+C1", &cells),
            Err(EvalError::InvalidOperand(CellRef::new(2, 0)))
        );
        assert_eq!(
            evaluate("=D1*2", &cells),
            Err(EvalError::InvalidOperand(CellRef::new(3, 0)))
        );
        assert_eq!(
            evaluate("=Z9+1", &cells),
            Err(EvalError::InvalidToken("Z9".to_string()))
        );
    }

    #[test]
    fn test_error_valued_operand_is_invalid() {
        let mut cells = CellStore::new();
        cells.upsert(
            CellRef::new(0, 0),
            CellValue::Error(CellError::DivisionByZero),
            Some("=1/0".to_string()),
        );
        assert_eq!(
            evaluate_to_value("=A1+1", &cells),
            CellValue::Error(CellError::InvalidOperand)
        );
    }

    #[test]
    fn test_division_by_zero_wins_over_later_operands() {
        let cells = store(&[("A1", "text")]);
        assert_eq!(evaluate("=1/0+A1", &cells), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_formula_without_equals_is_rejected() {
        assert!(matches!(
            evaluate("1+2", &CellStore::new()),
            Err(EvalError::InvalidFormula(_))
        ));
    }

    #[test]
    fn test_to_rpn_order() {
        let program = to_rpn(&tokenize("-5+2*3")).unwrap();
        assert_eq!(
            program,
            vec![
                RpnItem::Number(5.0),
                RpnItem::Negate,
                RpnItem::Number(2.0),
                RpnItem::Number(3.0),
                RpnItem::Binary(Operator::Mul),
                RpnItem::Binary(Operator::Add),
            ]
        );
    }

    #[test]
    fn test_overflow_is_invalid() {
        assert_eq!(eval(&format!("={}*{}", "9".repeat(200), "9".repeat(200))), "invalid");
    }
}
