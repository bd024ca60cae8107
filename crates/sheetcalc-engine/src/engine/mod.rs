//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`Cell`], [`CellValue`], [`CellStore`] - Data structures for cell storage
//! - [`CellRef`], [`encode`], [`decode`] - Cell reference parsing (A1 notation ↔ col/row)
//! - [`tokenize`] - The formula lexer shared by evaluation and dependency extraction
//! - [`evaluate`] - Shunting-yard formula evaluation
//! - [`DependencyGraph`], [`extract_dependencies`] - Who references whom
//! - [`plan_recalc`], [`detect_cycle`] - Recalculation ordering and cycle detection
//! - [`format_number`] - Canonical number text

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod error;
mod eval;
mod format;
mod lexer;

pub use cell::{Cell, CellStore, CellValue};
pub use cell_ref::{CellRef, decode, encode};
pub use cycle::{RecalcPlan, detect_cycle, plan_recalc};
pub use deps::{DependencyGraph, extract_dependencies};
pub use error::{CellError, EvalError};
pub use eval::{CellLookup, RpnItem, eval_rpn, evaluate, evaluate_to_value, to_rpn};
pub use format::format_number;
pub use lexer::{Operator, Token, parse_numeric_literal, tokenize};
