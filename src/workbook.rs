// 📑 Workbook Access - Positional cell reads over legacy report files
//
// The legacy reporting template addresses everything by fixed 1-indexed
// row/column coordinates. Submitted files are frequently incomplete, so a
// missing sheet or cell is a normal condition here: lookups return None and
// the template layer decides what to default.

use std::io::{Cursor, Read, Seek};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum WorkbookError {
    /// The workbook contains no sheets at all. This is the only sheet-level
    /// condition that cannot be defaulted away.
    #[error("workbook has no sheets available")]
    NoSheetsAvailable,

    #[error("failed to open workbook '{file}': {message}")]
    Open { file: String, message: String },

    #[error("failed to read sheet '{sheet}': {message}")]
    SheetRead { sheet: String, message: String },
}

// ============================================================================
// WORKBOOK OPENING
// ============================================================================

/// Open a report workbook from an in-memory byte payload.
///
/// Format detection (xlsx/xls/xlsb/ods) is delegated to calamine. The file
/// name is only used for error messages.
pub fn open_report(name: &str, bytes: &[u8]) -> Result<Sheets<Cursor<Vec<u8>>>, WorkbookError> {
    open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| WorkbookError::Open {
        file: name.to_string(),
        message: e.to_string(),
    })
}

// ============================================================================
// SHEET RESOLUTION
// ============================================================================

/// Resolve a logical sheet by candidate names, falling back to the first
/// sheet in the workbook when none of them is present.
///
/// Field officers routinely rename or delete sheets before submitting, so a
/// miss on the expected name is not an error. Only a workbook with zero
/// sheets fails.
pub fn sheet_or_first<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    candidates: &[&str],
) -> Result<Range<Data>, WorkbookError> {
    let names = workbook.sheet_names();

    let target = candidates
        .iter()
        .find(|c| names.iter().any(|n| n == *c))
        .map(|c| c.to_string())
        .or_else(|| names.first().cloned())
        .ok_or(WorkbookError::NoSheetsAvailable)?;

    workbook
        .worksheet_range(&target)
        .map_err(|e| WorkbookError::SheetRead {
            sheet: target.clone(),
            message: e.to_string(),
        })
}

// ============================================================================
// CELL READS (1-indexed, template coordinate system)
// ============================================================================

/// Read a cell as text. Returns None for out-of-range, empty, or
/// error-valued cells - never panics, never errors.
pub fn cell_str(range: &Range<Data>, row: u32, col: u32) -> Option<String> {
    match cell_at(range, row, col)? {
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(format_number(*f)),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(format_number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Empty | Data::Error(_) => None,
    }
}

/// Read a cell as a number, coercing numeric-looking text.
/// Returns None for anything that is not a usable number.
pub fn cell_num(range: &Range<Data>, row: u32, col: u32) -> Option<f64> {
    match cell_at(range, row, col)? {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::DateTime(dt) => Some(dt.as_f64()),
        Data::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

fn cell_at(range: &Range<Data>, row: u32, col: u32) -> Option<&Data> {
    if row == 0 || col == 0 {
        return None;
    }
    // Template coordinates are 1-indexed; calamine positions are 0-indexed.
    range.get_value((row - 1, col - 1))
}

/// Render a float the way the legacy template displayed it: integral values
/// without a trailing ".0".
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
