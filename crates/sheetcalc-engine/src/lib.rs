//! sheetcalc_engine - Spreadsheet engine: references, formulas, dependency graph.

pub mod engine;
