use super::Document;
use crate::error::{Result, SheetError};
use crate::storage::{parse_csv, parse_csv_str, write_csv};
use log::debug;
use sheetcalc_engine::engine::CellRef;
use std::path::{Path, PathBuf};

impl Document {
    /// Open a CSV file as a new document.
    pub fn open_csv(path: &Path) -> Result<Document> {
        let mut doc = Document::new();
        doc.import_csv(path)?;
        doc.file_path = Some(path.to_path_buf());
        doc.modified = false;
        Ok(doc)
    }

    /// Import CSV data starting at A1.
    /// Returns the number of cells imported.
    pub fn import_csv(&mut self, path: &Path) -> Result<usize> {
        let cells = parse_csv(path)?;
        self.import_cells(cells)
    }

    /// Import CSV text starting at A1.
    pub fn import_csv_str(&mut self, content: &str) -> Result<usize> {
        let cells = parse_csv_str(content)?;
        self.import_cells(cells)
    }

    // Fields are taken as literals, so an imported "=A1" stays text. Cells that
    // already exist keep their contents.
    fn import_cells(&mut self, cells: Vec<(CellRef, String)>) -> Result<usize> {
        let count = cells.len();
        if count == 0 {
            return Err(SheetError::EmptyCsv);
        }
        for (cell_ref, literal) in cells {
            if self.cells.init_if_absent(cell_ref, &literal) {
                self.modified = true;
            }
        }
        debug!("imported {count} cells");
        Ok(count)
    }

    /// Export the sheet to a CSV file and remember it as the document's file.
    pub fn export_csv(&mut self, path: &Path) -> Result<()> {
        write_csv(path, self)?;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save_csv(&mut self) -> Result<PathBuf> {
        let Some(path) = self.file_path.clone() else {
            return Err(SheetError::NoFilePath);
        };
        self.export_csv(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::error::SheetError;
    use pretty_assertions::assert_eq;

    fn temp_csv(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "sheetcalc_{name}_{}_{}_{:?}.csv",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            std::thread::current().id(),
        ))
    }

    struct Cleanup(std::path::PathBuf);
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn display(doc: &Document, name: &str) -> String {
        doc.get_cell(name).map(|c| c.display()).unwrap_or_default()
    }

    #[test]
    fn test_import_csv_str_creates_literals() {
        let mut doc = Document::new();
        let count = doc.import_csv_str("1,hello\n=A1+1,007\n").unwrap();
        assert_eq!(count, 4);
        assert_eq!(display(&doc, "A1"), "1");
        assert_eq!(display(&doc, "B1"), "hello");
        assert_eq!(display(&doc, "B2"), "007");
        // Formulas are not rebuilt from CSV.
        let a2 = doc.get_cell("A2").unwrap();
        assert_eq!(a2.display(), "=A1+1");
        assert!(a2.formula.is_none());
        assert!(doc.modified);
    }

    #[test]
    fn test_import_csv_str_keeps_existing_cells() {
        let mut doc = Document::new();
        doc.set_cell_value("A1", "=2*3").unwrap();
        doc.import_csv_str("9,8").unwrap();
        assert_eq!(display(&doc, "A1"), "6");
        assert_eq!(display(&doc, "B1"), "8");
    }

    #[test]
    fn test_import_csv_str_empty_is_error() {
        let mut doc = Document::new();
        assert!(matches!(doc.import_csv_str(""), Err(SheetError::EmptyCsv)));
        assert!(matches!(doc.import_csv_str(",,\n"), Err(SheetError::EmptyCsv)));
    }

    #[test]
    fn test_imported_values_feed_formulas() {
        let mut doc = Document::new();
        doc.import_csv_str("4,5").unwrap();
        doc.set_cell_value("C1", "=A1*B1").unwrap();
        assert_eq!(display(&doc, "C1"), "20");
    }

    #[test]
    fn test_export_then_open_round_trip() {
        let path = temp_csv("round_trip");
        let _cleanup = Cleanup(path.clone());

        let mut doc = Document::new();
        doc.set_cell_value("A1", "3").unwrap();
        doc.set_cell_value("B1", "=A1*2").unwrap();
        doc.set_cell_value("A2", " spaced ").unwrap();
        doc.export_csv(&path).unwrap();
        assert!(!doc.modified);
        assert_eq!(doc.file_path.as_deref(), Some(path.as_path()));

        let reopened = Document::open_csv(&path).unwrap();
        assert!(!reopened.modified);
        assert_eq!(display(&reopened, "A1"), "3");
        assert_eq!(display(&reopened, "B1"), "=A1*2");
        assert_eq!(display(&reopened, "A2"), " spaced ");
    }

    #[test]
    fn test_export_then_open_keeps_embedded_newlines() {
        let path = temp_csv("newline");
        let _cleanup = Cleanup(path.clone());

        let mut doc = Document::new();
        doc.set_cell_value("A1", "line1\nline2").unwrap();
        doc.set_cell_value("B1", "x").unwrap();
        doc.set_cell_value("A2", "crlf\r\ninside").unwrap();
        doc.set_cell_value("B2", "=1+1").unwrap();
        doc.export_csv(&path).unwrap();

        let reopened = Document::open_csv(&path).unwrap();
        assert_eq!(display(&reopened, "A1"), "line1\nline2");
        assert_eq!(display(&reopened, "B1"), "x");
        assert_eq!(display(&reopened, "A2"), "crlf\r\ninside");
        assert_eq!(display(&reopened, "B2"), "=1+1");
        assert_eq!(reopened.cells().len(), 4);
    }

    #[test]
    fn test_save_csv_requires_path() {
        let mut doc = Document::new();
        doc.set_cell_value("A1", "1").unwrap();
        assert!(matches!(doc.save_csv(), Err(SheetError::NoFilePath)));

        let path = temp_csv("save");
        let _cleanup = Cleanup(path.clone());
        doc.file_path = Some(path.clone());
        assert_eq!(doc.save_csv().unwrap(), path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n");
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let path = temp_csv("missing");
        assert!(matches!(Document::open_csv(&path), Err(SheetError::Io(_))));
    }
}
