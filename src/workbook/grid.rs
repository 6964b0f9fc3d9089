// src/workbook/grid.rs - Text view of one worksheet

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use super::CodecError;

pub const DEFAULT_SHEET: &str = "Sheet1";

/// Cell text of a worksheet addressed by absolute (row, column), both zero-based.
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    name: String,
    origin: (usize, usize),
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    /// Grid whose first row and column are A1.
    #[cfg(test)]
    pub fn from_rows<R, C>(name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            name: name.to_string(),
            origin: (0, 0),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|cell| cell.into().trim().to_string()).collect())
                .collect(),
        }
    }

    pub fn from_range(name: &str, range: &Range<Data>) -> Self {
        let origin = range
            .start()
            .map(|(row, col)| (row as usize, col as usize))
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            origin,
            rows: range.rows().map(|row| row.iter().map(cell_text).collect()).collect(),
        }
    }

    /// Opens workbook bytes and reads the sheet named `Sheet1`, else the first sheet.
    pub fn open(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| CodecError::Unreadable(e.to_string()))?;

        let sheet_name = select_sheet(&workbook.sheet_names()).ok_or(CodecError::NoWorksheet)?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| CodecError::Sheet(format!("{}: {}", sheet_name, e)))?;

        Ok(Self::from_range(&sheet_name, &range))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// One past the last row holding data, counted from A1.
    pub fn row_count(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            self.origin.0 + self.rows.len()
        }
    }

    /// Trimmed text of a cell; empty for cells outside the used range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        let (Some(r), Some(c)) = (row.checked_sub(self.origin.0), col.checked_sub(self.origin.1)) else {
            return "";
        };
        self.rows
            .get(r)
            .and_then(|cells| cells.get(c))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// `Sheet1` when present, otherwise the first sheet.
pub fn select_sheet(names: &[String]) -> Option<String> {
    names
        .iter()
        .find(|name| name.as_str() == DEFAULT_SHEET)
        .or_else(|| names.first())
        .cloned()
}

/// Display text of a cell. Whole floats drop their fraction so serial numbers
/// written as numbers read back as "1", not "1.0".
pub fn cell_text(value: &Data) -> String {
    let text = match value {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    text.trim().to_string()
}
