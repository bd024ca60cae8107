//! sheetcalc-core - UI-agnostic document model, recalculation and storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{Document, DocumentSettings, RecalcMode, RecalcReport};
pub use error::{Result, SheetError};

pub use sheetcalc_engine::engine::{Cell, CellRef, CellValue};
