//! Flat-file export.
//!
//! This module writes flattened issue records out as CSV.

pub mod tabular;

pub use tabular::{read_csv_file, superset_header, write_csv, write_csv_file};
