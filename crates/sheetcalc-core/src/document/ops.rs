use super::{Document, RecalcReport};
use crate::error::{Result, SheetError};
use log::debug;
use sheetcalc_engine::engine::{
    Cell, CellRef, CellValue, evaluate_to_value, extract_dependencies,
};

fn parse_ref(reference: &str) -> Result<CellRef> {
    CellRef::parse(reference).map_err(|_| SheetError::InvalidReference(reference.to_string()))
}

impl Document {
    /// Look up a cell by its reference string. Malformed references have no cell.
    pub fn get_cell(&self, reference: &str) -> Option<&Cell> {
        let cell_ref = CellRef::parse(reference).ok()?;
        self.cells.get(&cell_ref)
    }

    pub fn cell(&self, cell_ref: &CellRef) -> Option<&Cell> {
        self.cells.get(cell_ref)
    }

    /// Look up a cell by 0-based column and row.
    pub fn cell_at(&self, col: usize, row: usize) -> Option<&Cell> {
        self.cells.get(&CellRef::new(col, row))
    }

    /// Display text for a cell; empty for cells that do not exist.
    pub fn get_cell_display(&self, cell_ref: &CellRef) -> String {
        self.cells
            .get(cell_ref)
            .map(|cell| cell.display())
            .unwrap_or_default()
    }

    /// Set a cell from raw user input and recalculate its dependents.
    ///
    /// Input starting with `=` is a formula; anything else is stored as a literal.
    pub fn set_cell_value(&mut self, reference: &str, input: &str) -> Result<RecalcReport> {
        let cell_ref = parse_ref(reference)?;
        Ok(self.set_cell_from_input(cell_ref, input))
    }

    /// Set cell contents from input string.
    pub fn set_cell_from_input(&mut self, cell_ref: CellRef, input: &str) -> RecalcReport {
        if input.starts_with('=') {
            self.set_formula(cell_ref, input);
        } else {
            self.set_literal(cell_ref, input);
        }
        self.modified = true;
        self.propagate(&cell_ref)
    }

    /// Clear a cell to an empty literal. The cell itself stays in the store.
    pub fn clear_cell(&mut self, cell_ref: CellRef) -> RecalcReport {
        self.set_cell_from_input(cell_ref, "")
    }

    fn set_literal(&mut self, cell_ref: CellRef, input: &str) {
        debug!("{cell_ref} = literal {input:?}");
        self.graph.clear_cell(cell_ref);
        self.cells
            .upsert(cell_ref, CellValue::from_literal(input), None);
    }

    fn set_formula(&mut self, cell_ref: CellRef, formula: &str) {
        self.graph
            .replace_edges(cell_ref, extract_dependencies(formula));
        // Evaluated before the store is updated, so a self-reference reads the
        // previous value. Recalculation then finds the cycle.
        let value = evaluate_to_value(formula, &self.cells);
        debug!("{cell_ref} = {formula} -> {}", value.display());
        self.cells
            .upsert(cell_ref, value, Some(formula.to_string()));
    }

    /// Make sure a cell exists, creating it with `literal` if it does not.
    ///
    /// Existing cells are left untouched and nothing is recalculated.
    pub fn init_cell(&mut self, reference: &str, literal: &str) -> Result<()> {
        let cell_ref = parse_ref(reference)?;
        if self.cells.init_if_absent(cell_ref, literal) {
            self.modified = true;
        }
        Ok(())
    }

    /// References in the cell's current formula, in order of appearance.
    ///
    /// Empty for literal cells, missing cells and malformed references.
    pub fn get_dependencies(&self, reference: &str) -> Vec<CellRef> {
        self.get_cell(reference)
            .and_then(|cell| cell.formula.as_deref())
            .map(extract_dependencies)
            .unwrap_or_default()
    }

    /// Formula cells that reference `cell_ref` directly, sorted.
    pub fn dependents_of(&self, cell_ref: &CellRef) -> Vec<CellRef> {
        let mut dependents: Vec<CellRef> = self.graph.dependents(cell_ref).copied().collect();
        dependents.sort();
        dependents
    }

    /// Evaluate a formula against the current cells without storing it.
    pub fn evaluate(&self, formula: &str) -> CellValue {
        evaluate_to_value(formula, &self.cells)
    }
}
