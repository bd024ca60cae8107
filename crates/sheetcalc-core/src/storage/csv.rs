//! CSV import/export functionality

use crate::document::Document;
use crate::error::{Result, SheetError};
use sheetcalc_engine::engine::CellRef;
use std::path::Path;

/// Parse a CSV file into raw cell contents, row-major, starting at A1.
pub fn parse_csv(path: &Path) -> Result<Vec<(CellRef, String)>> {
    let content = std::fs::read_to_string(path)?;
    parse_csv_str(&content)
}

/// Parse CSV text into raw cell contents. Empty fields are skipped.
pub fn parse_csv_str(content: &str) -> Result<Vec<(CellRef, String)>> {
    let mut cells = Vec::new();

    for (row_idx, record) in parse_csv_records(content)?.into_iter().enumerate() {
        for (col_idx, field) in record.into_iter().enumerate() {
            if field.is_empty() {
                continue;
            }
            cells.push((CellRef::new(col_idx, row_idx), field));
        }
    }

    Ok(cells)
}

/// Split CSV text into records, handling quoted fields.
///
/// A quoted field may span line breaks, which are kept in the field. An
/// unquoted `\r\n` ends a record like `\n` does.
pub(crate) fn parse_csv_records(content: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut line = 1;
    let mut quote_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Check for escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                if c == '\n' {
                    line += 1;
                }
                current.push(c);
            }
        } else {
            match c {
                '"' => {
                    in_quotes = true;
                    field_was_quoted = true;
                    quote_line = line;
                }
                ',' => {
                    fields.push(finish_field(std::mem::take(&mut current), field_was_quoted));
                    field_was_quoted = false;
                }
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' => {
                    fields.push(finish_field(std::mem::take(&mut current), field_was_quoted));
                    records.push(std::mem::take(&mut fields));
                    field_was_quoted = false;
                    line += 1;
                }
                _ => current.push(c),
            }
        }
    }
    if in_quotes {
        return Err(SheetError::Parse {
            line: quote_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    if !current.is_empty() || !fields.is_empty() || field_was_quoted {
        fields.push(finish_field(current, field_was_quoted));
        records.push(fields);
    }
    Ok(records)
}

fn finish_field(field: String, quoted: bool) -> String {
    if quoted {
        field
    } else {
        field.trim().to_string()
    }
}

/// Render the sheet as CSV: formula text where present, otherwise the value.
///
/// Covers the rectangle from A1 to the furthest non-empty cell. An empty sheet
/// renders as an empty string.
pub fn write_csv_string(doc: &Document) -> String {
    let mut extent: Option<(usize, usize)> = None;
    for (cell_ref, cell) in doc.cells().iter() {
        if !cell.has_formula() && cell.display().is_empty() {
            continue;
        }
        let (max_col, max_row) = extent.unwrap_or((0, 0));
        extent = Some((max_col.max(cell_ref.col), max_row.max(cell_ref.row)));
    }
    let Some((max_col, max_row)) = extent else {
        return String::new();
    };

    let mut out = String::new();
    for row in 0..=max_row {
        let row_fields: Vec<String> = (0..=max_col)
            .map(|col| {
                let text = doc
                    .cell_at(col, row)
                    .map(|cell| cell.to_input_string())
                    .unwrap_or_default();
                escape_csv_field(&text)
            })
            .collect();
        out.push_str(&row_fields.join(","));
        out.push('\n');
    }
    out
}

/// Export the sheet to a CSV file.
pub fn write_csv(path: &Path, doc: &Document) -> Result<()> {
    std::fs::write(path, write_csv_string(doc))?;
    Ok(())
}

/// Escape a field for CSV output
fn escape_csv_field(field: &str) -> String {
    // Unquoted fields are trimmed on import.
    if field.contains(',')
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r')
        || field.trim() != field
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
