//! Minimal `.xlsx` support: first-sheet reading for imports and a
//! single-sheet writer for exports.

pub mod reader;
pub mod writer;

use thiserror::Error;

pub use reader::{read_first_sheet, Sheet};
pub use writer::write_workbook;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("cannot read workbook: {0}")]
    Read(String),

    #[error("cannot write workbook: {0}")]
    Write(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
