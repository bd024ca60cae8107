use serde::{Deserialize, Serialize};
use sheetcalc_engine::engine::{CellStore, DependencyGraph};
use std::path::PathBuf;

/// How changes are pushed to dependent formula cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecalcMode {
    /// Evaluate affected cells in dependency order; cycles become `#CYCLE!`.
    #[default]
    Topological,
    /// Depth-first walk visiting each affected cell once, in discovery order.
    ///
    /// Cycles are not reported: cells on a cycle keep the value computed on first
    /// visit. With diamond-shaped dependencies a cell may read a sibling before
    /// the sibling is updated.
    DepthFirst,
}

/// Per-document settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub recalc: RecalcMode,
}

/// UI-agnostic editing session for one spreadsheet.
///
/// Owns the cells and the dependency graph between them. Every edit runs
/// recalculation to completion before returning.
pub struct Document {
    /// Cell contents and computed values
    pub(crate) cells: CellStore,
    /// Reverse dependency map: cell -> formula cells that reference it
    pub(crate) graph: DependencyGraph,
    pub settings: DocumentSettings,
    /// CSV file this document was opened from or last saved to
    pub file_path: Option<PathBuf>,
    /// Whether the document has been modified since it was opened or saved
    pub modified: bool,
}

impl Document {
    /// Create an empty document.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Self::with_settings(DocumentSettings::default())
    }

    pub fn with_settings(settings: DocumentSettings) -> Self {
        Document {
            cells: CellStore::new(),
            graph: DependencyGraph::new(),
            settings,
            file_path: None,
            modified: false,
        }
    }

    /// Read-only access to the cell store.
    pub fn cells(&self) -> &CellStore {
        &self.cells
    }

    /// Read-only access to the dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Change settings and bring every formula up to date under the new mode.
    pub fn set_settings(&mut self, settings: DocumentSettings) {
        let changed = self.settings != settings;
        self.settings = settings;
        if changed {
            self.recalculate_all();
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
