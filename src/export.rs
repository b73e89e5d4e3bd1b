// 📤 Compilation Export - Serialize parsed results into tabular artifacts
//
// The compilation artifact is a single-sheet workbook with a fixed
// six-column layout, one row per parsed result, in input order. It must be
// independently re-parseable: reading it back with the same row/column
// convention yields the same header and values.

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

use crate::checklist::Checklist;
use crate::template::ParsedResult;

// ============================================================================
// COMPILATION LAYOUT
// ============================================================================

/// Default artifact name when the caller supplies none.
pub const DEFAULT_COMPILATION_NAME: &str = "findings_compilation.xlsx";

pub const COMPILATION_SHEET: &str = "Compilation";

pub const COMPILATION_HEADERS: [&str; 6] = [
    "Source File",
    "LGU Name",
    "Province",
    "Classification",
    "Findings",
    "Taxable Properties",
];

/// Fixed column widths, one per header column.
pub const COMPILATION_COLUMN_WIDTHS: [f64; 6] = [32.0, 30.0, 22.0, 18.0, 60.0, 18.0];

// ============================================================================
// COMPILATION EXPORT
// ============================================================================

/// Serialize parsed results into the compilation workbook, returning the
/// artifact bytes. Rows keep input order; no re-sorting. Absent taxable
/// figures stay blank.
pub fn export_compilation(results: &[ParsedResult]) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(COMPILATION_SHEET)?;

    let header_format = Format::new().set_bold();
    for (col, header) in COMPILATION_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    for (col, width) in COMPILATION_COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    for (idx, result) in results.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_string(row, 0, result.source_file.as_str())?;
        sheet.write_string(row, 1, result.unit_name.as_str())?;
        sheet.write_string(row, 2, result.province.as_str())?;
        sheet.write_string(row, 3, result.classification.as_str())?;
        sheet.write_string(row, 4, result.findings_display.as_str())?;
        if let Some(figure) = result.taxable_properties {
            sheet.write_number(row, 5, figure)?;
        }
    }

    workbook.save_to_buffer()
}

/// Write the compilation artifact to disk.
pub fn save_compilation(results: &[ParsedResult], path: &Path) -> Result<()> {
    let bytes = export_compilation(results)
        .with_context(|| format!("Failed to build compilation artifact: {}", path.display()))?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write compilation artifact: {}", path.display()))
}

// ============================================================================
// CHECKLIST EXPORT (CSV)
// ============================================================================

pub const CHECKLIST_CSV_HEADERS: [&str; 6] = [
    "Province",
    "LGU Name",
    "Classification",
    "Status",
    "Date Submitted",
    "Remarks",
];

/// Flatten the checklist into CSV bytes, one line per row in group order.
pub fn export_checklist_csv(checklist: &Checklist) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CHECKLIST_CSV_HEADERS)
        .context("Failed to write checklist CSV header")?;

    for row in checklist.rows() {
        writer
            .write_record(&[
                row.province.as_str(),
                row.name.as_str(),
                row.classification.as_str(),
                row.status.as_str(),
                &row.date_submitted
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                row.remark.as_deref().unwrap_or(""),
            ])
            .with_context(|| format!("Failed to write checklist CSV row for {}", row.name))?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finalize checklist CSV: {e}"))
}

// ============================================================================
// TESTS
// ============================================================================
