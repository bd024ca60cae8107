//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellValue`] - What a cell currently holds (number, text, or error)
//! - [`Cell`] - A value plus the formula it was computed from, if any
//! - [`CellStore`] - Sparse storage for cells keyed by [`CellRef`]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::cell_ref::CellRef;
use super::error::CellError;
use super::eval::CellLookup;
use super::format::format_number;
use super::lexer::parse_numeric_literal;

/// The value held by a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(CellError),
}

impl CellValue {
    /// Classify literal input.
    ///
    /// Numbers are only recognised when their canonical form is exactly what was
    /// typed, so `"1.50"` or `"007"` stay text and read back unchanged.
    pub fn from_literal(input: &str) -> CellValue {
        match parse_numeric_literal(input) {
            Some(n) if format_number(n) == input => CellValue::Number(n),
            _ => CellValue::Text(input.to_string()),
        }
    }

    /// Numeric view used when the value is read as an operand.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_numeric_literal(s),
            CellValue::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Canonical text for this value.
    pub fn display(&self) -> String {
        match self {
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Error(e) => e.sentinel().to_string(),
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    /// Formula text including the leading `=`.
    pub formula: Option<String>,
}

impl Cell {
    pub fn new_literal(input: &str) -> Cell {
        Cell {
            value: CellValue::from_literal(input),
            formula: None,
        }
    }

    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Canonical text of the current value.
    pub fn display(&self) -> String {
        self.value.display()
    }

    /// Text to show when editing: the formula if present, otherwise the value.
    pub fn to_input_string(&self) -> String {
        match &self.formula {
            Some(formula) => formula.clone(),
            None => self.display(),
        }
    }
}

/// Sparse cell storage.
#[derive(Clone, Debug, Default)]
pub struct CellStore {
    cells: HashMap<CellRef, Cell>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell_ref: &CellRef) -> Option<&Cell> {
        self.cells.get(cell_ref)
    }

    pub fn contains(&self, cell_ref: &CellRef) -> bool {
        self.cells.contains_key(cell_ref)
    }

    /// Insert or overwrite a cell.
    pub fn upsert(&mut self, cell_ref: CellRef, value: CellValue, formula: Option<String>) {
        self.cells.insert(cell_ref, Cell { value, formula });
    }

    /// Replace only the value of an existing cell, keeping its formula.
    ///
    /// Returns false if the cell does not exist.
    pub fn set_value(&mut self, cell_ref: &CellRef, value: CellValue) -> bool {
        match self.cells.get_mut(cell_ref) {
            Some(cell) => {
                cell.value = value;
                true
            }
            None => false,
        }
    }

    /// Create a literal cell unless one already exists at this position.
    ///
    /// Returns true if a cell was created.
    pub fn init_if_absent(&mut self, cell_ref: CellRef, literal: &str) -> bool {
        if self.cells.contains_key(&cell_ref) {
            return false;
        }
        self.cells.insert(cell_ref, Cell::new_literal(literal));
        true
    }

    /// All cells, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&CellRef, &Cell)> + '_ {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl CellLookup for CellStore {
    fn value_of(&self, cell_ref: &CellRef) -> Option<&CellValue> {
        self.cells.get(cell_ref).map(|cell| &cell.value)
    }
}
