use calamine::{Data, Reader, Xlsx};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

use super::SheetError;

/// First worksheet as trimmed headers plus header-keyed rows.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl Sheet {
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

/// Render a cell as trimmed text. Whole numbers lose their decimals so
/// numeric NIK/KK cells come back as plain digits.
fn cell_text(cell: &Data) -> String {
    let text = match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{:.0}", f),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(_) | Data::Empty => String::new(),
        Data::DateTime(d) => d.to_string(),
        Data::DateTimeIso(d) => d.clone(),
        Data::DurationIso(d) => d.clone(),
    };
    text.trim().to_string()
}

pub fn read_first_sheet(bytes: &[u8]) -> Result<Sheet, SheetError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| SheetError::Read(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::Read("workbook has no sheets".to_string()))?
        .map_err(|e| SheetError::Read(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_text).collect(),
        None => return Ok(Sheet::default()),
    };

    let mut records = Vec::new();
    for row in rows {
        let values: Vec<String> = row.iter().map(cell_text).collect();
        if values.iter().all(String::is_empty) {
            continue;
        }
        let record = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, h)| (h.clone(), values.get(i).cloned().unwrap_or_default()))
            .collect();
        records.push(record);
    }

    debug!(
        "Read sheet with {} columns and {} rows",
        headers.len(),
        records.len()
    );
    Ok(Sheet {
        headers,
        rows: records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_cells_lose_decimals() {
        assert_eq!(cell_text(&Data::Float(1207012345678901.0)), "1207012345678901");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::String("  SATU ".into())), "SATU");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_garbage_is_read_error() {
        assert!(matches!(
            read_first_sheet(b"not a zip"),
            Err(SheetError::Read(_))
        ));
    }
}
