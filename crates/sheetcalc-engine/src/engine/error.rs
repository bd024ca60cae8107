//! Evaluation errors and the error kinds stored in cells.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::cell_ref::CellRef;

/// Errors produced while decoding references or evaluating formulas.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Cell {0} does not hold a number")]
    InvalidOperand(CellRef),

    #[error("Invalid formula: {0}")]
    InvalidFormula(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Circular dependency detected")]
    CyclicDependency,
}

impl EvalError {
    /// The kind recorded in a cell when this error is the result of its formula.
    pub fn kind(&self) -> CellError {
        match self {
            // A malformed reference inside a formula is just an unknown token.
            EvalError::InvalidReference(_) | EvalError::InvalidToken(_) => CellError::InvalidToken,
            EvalError::InvalidOperand(_) => CellError::InvalidOperand,
            EvalError::InvalidFormula(_) => CellError::InvalidFormula,
            EvalError::DivisionByZero => CellError::DivisionByZero,
            EvalError::CyclicDependency => CellError::CyclicDependency,
        }
    }
}

/// A failed evaluation, stored in a cell as data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellError {
    InvalidToken,
    InvalidOperand,
    InvalidFormula,
    DivisionByZero,
    CyclicDependency,
}

impl CellError {
    /// The reserved text shown for this error.
    pub fn sentinel(&self) -> &'static str {
        match self {
            CellError::InvalidToken | CellError::InvalidOperand | CellError::InvalidFormula => {
                "invalid"
            }
            CellError::DivisionByZero => "#DIV/0!",
            CellError::CyclicDependency => "#CYCLE!",
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sentinel())
    }
}
