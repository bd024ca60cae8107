//! Document state and logic (UI-agnostic).

mod io;
mod ops;
mod recalc;
mod state;

pub use recalc::RecalcReport;
pub use state::{Document, DocumentSettings, RecalcMode};
