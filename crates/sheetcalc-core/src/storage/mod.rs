//! File formats.

pub mod csv;

pub use csv::{parse_csv, parse_csv_str, write_csv, write_csv_string};
