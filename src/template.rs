// 🧾 Template Extractor - Fixed-cell-address extraction rules
//
// Compliance reports follow a legacy spreadsheet template where every field
// lives at a hard-coded coordinate. The layout is captured in one
// declarative table (TemplateLayout) so it can be versioned or swapped
// without touching the extraction code.

use anyhow::{Context, Result};
use calamine::{Data, Range};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::workbook;

/// Template convention: a report with zero findings carries this single
/// entry instead of an empty list. It is not an error condition.
pub const NO_FINDINGS_SENTINEL: &str = "No findings noted";

// ============================================================================
// TEMPLATE LAYOUT
// ============================================================================

/// A fixed 1-indexed cell address in the legacy coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellAddr {
    pub row: u32,
    pub col: u32,
}

impl CellAddr {
    pub const fn new(row: u32, col: u32) -> Self {
        CellAddr { row, col }
    }
}

/// Declarative map of the legacy template: which logical sheet holds each
/// field and at which address. All literal coordinates live here.
#[derive(Debug, Clone)]
pub struct TemplateLayout {
    /// Sheet carrying the finding count and the findings list
    pub findings_sheet: &'static str,

    /// Sheet carrying unit metadata (name, taxable properties)
    pub metadata_sheet: &'static str,

    /// Sheet carrying provenance (reporting period as typed by the unit)
    pub provenance_sheet: &'static str,

    /// Sheet carrying region/classification capture data. Older template
    /// revisions named this sheet "DataCaptured", newer ones "Data"; both
    /// are accepted.
    pub capture_sheets: [&'static str; 2],

    /// Finding count cell; the findings list starts on the next row in the
    /// same column, one finding per row, for exactly `count` rows.
    pub findings_total: CellAddr,

    pub unit_name: CellAddr,
    pub taxable_properties: CellAddr,
    pub source_period: CellAddr,
    pub province: CellAddr,
    pub classification: CellAddr,
}

impl TemplateLayout {
    /// The legacy template layout as distributed to reporting units.
    pub const LEGACY: TemplateLayout = TemplateLayout {
        findings_sheet: "Findings",
        metadata_sheet: "Value1",
        provenance_sheet: "Sample1",
        capture_sheets: ["Data", "DataCaptured"],
        findings_total: CellAddr::new(2, 2),
        unit_name: CellAddr::new(2, 3),
        taxable_properties: CellAddr::new(7, 3),
        source_period: CellAddr::new(2, 3),
        province: CellAddr::new(3, 3),
        classification: CellAddr::new(4, 3),
    };

    /// First row of the findings list (immediately after the count's row).
    pub fn findings_start_row(&self) -> u32 {
        self.findings_total.row + 1
    }
}

// ============================================================================
// INPUT FILE
// ============================================================================

/// A submitted report file: a name plus its byte payload.
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ReportFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ReportFile {
            name: name.into(),
            bytes,
        }
    }

    /// Load a report file from disk, keeping only the file name (not the
    /// full path) as its identity.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read report file: {}", path.display()))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.xlsx")
            .to_string();

        Ok(ReportFile { name, bytes })
    }
}

// ============================================================================
// PARSED RESULT
// ============================================================================

/// Extraction output for one report file. Created once per file during a
/// batch run and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedResult {
    // Provenance
    pub source_file: String,

    // Extracted unit metadata (unit name falls back to the file name)
    pub unit_name: String,
    pub province: String,
    pub classification: String,

    // Findings: the raw list, its display join, and the count of real
    // findings. When a report declares zero findings the list holds the
    // sentinel entry while the count stays at 0.
    pub findings: Vec<String>,
    pub findings_display: String,
    pub findings_count: usize,

    pub taxable_properties: Option<f64>,

    /// Reporting period as typed on the provenance sheet, if any
    pub source_period: Option<String>,

    pub parsed_at: DateTime<Utc>,

    // Outcome
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParsedResult {
    /// Failure result for an unreadable file. Carries the file name and the
    /// error message; every extracted field stays at its default.
    pub fn failure(source_file: &str, message: impl Into<String>) -> Self {
        ParsedResult {
            source_file: source_file.to_string(),
            unit_name: source_file.to_string(),
            province: String::new(),
            classification: String::new(),
            findings: Vec::new(),
            findings_display: String::new(),
            findings_count: 0,
            taxable_properties: None,
            source_period: None,
            parsed_at: Utc::now(),
            success: false,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Parse one report file against the legacy template layout.
///
/// Missing sheets, cells, or fields are silently defaulted - incomplete
/// submissions are the norm, not the exception. Only an unreadable file
/// produces a failure result, and even that never escapes as an error.
pub fn parse_report(file: &ReportFile) -> ParsedResult {
    parse_report_with(file, &TemplateLayout::LEGACY)
}

/// Parse against an explicit layout (for versioned template revisions).
pub fn parse_report_with(file: &ReportFile, layout: &TemplateLayout) -> ParsedResult {
    match extract(file, layout) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Report '{}' could not be parsed: {:#}", file.name, e);
            ParsedResult::failure(&file.name, format!("{e:#}"))
        }
    }
}

fn extract(file: &ReportFile, layout: &TemplateLayout) -> Result<ParsedResult> {
    let mut wb = workbook::open_report(&file.name, &file.bytes)?;

    // The four logical sheets resolve independently, each falling back to
    // the first sheet when the expected name is missing.
    let findings_sheet = workbook::sheet_or_first(&mut wb, &[layout.findings_sheet])?;
    let metadata_sheet = workbook::sheet_or_first(&mut wb, &[layout.metadata_sheet])?;
    let provenance_sheet = workbook::sheet_or_first(&mut wb, &[layout.provenance_sheet])?;
    let capture_sheet = workbook::sheet_or_first(&mut wb, &layout.capture_sheets)?;

    let findings = read_findings(&findings_sheet, layout);
    let findings_count = findings.len();

    let unit_name = workbook::cell_str(&metadata_sheet, layout.unit_name.row, layout.unit_name.col)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| file.name.clone());

    let taxable_properties = workbook::cell_num(
        &metadata_sheet,
        layout.taxable_properties.row,
        layout.taxable_properties.col,
    );

    let source_period = workbook::cell_str(
        &provenance_sheet,
        layout.source_period.row,
        layout.source_period.col,
    )
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty());

    let province = workbook::cell_str(&capture_sheet, layout.province.row, layout.province.col)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let classification = workbook::cell_str(
        &capture_sheet,
        layout.classification.row,
        layout.classification.col,
    )
    .map(|s| s.trim().to_string())
    .unwrap_or_default();

    // Template convention: an empty findings list is reported as a single
    // "no findings" entry while the count stays at the real value.
    let findings = if findings.is_empty() {
        vec![NO_FINDINGS_SENTINEL.to_string()]
    } else {
        findings
    };
    let findings_display = findings.join("; ");

    Ok(ParsedResult {
        source_file: file.name.clone(),
        unit_name,
        province,
        classification,
        findings,
        findings_display,
        findings_count,
        taxable_properties,
        source_period,
        parsed_at: Utc::now(),
        success: true,
        error: None,
    })
}

/// Read the declared finding count, then exactly that many rows starting
/// immediately below it. Blank and absent cells are skipped.
fn read_findings(sheet: &Range<Data>, layout: &TemplateLayout) -> Vec<String> {
    let declared = workbook::cell_num(sheet, layout.findings_total.row, layout.findings_total.col)
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n as usize)
        .unwrap_or(0);

    // Rows past the populated block are absent anyway; clamping bounds the
    // scan against a corrupt count cell.
    let total = declared.min(sheet.height());
    let start = layout.findings_start_row();

    let mut findings = Vec::with_capacity(total);
    for offset in 0..total {
        if let Some(text) = workbook::cell_str(sheet, start + offset as u32, layout.findings_total.col)
        {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                findings.push(trimmed.to_string());
            }
        }
    }

    findings
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    /// Build a complete legacy-template report in memory.
    fn legacy_report(
        unit_name: Option<&str>,
        province: &str,
        classification: &str,
        findings: &[&str],
        declared_count: Option<&str>,
        taxable: Option<f64>,
    ) -> Vec<u8> {
        let mut workbook = Workbook::new();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Findings").unwrap();
        match declared_count {
            Some(raw) => {
                sheet.write_string(1, 1, raw).unwrap(); // B2
            }
            None => {
                sheet.write_number(1, 1, findings.len() as f64).unwrap();
            }
        }
        for (i, finding) in findings.iter().enumerate() {
            sheet.write_string(2 + i as u32, 1, *finding).unwrap(); // B3..
        }

        let sheet = workbook.add_worksheet();
        sheet.set_name("Value1").unwrap();
        if let Some(name) = unit_name {
            sheet.write_string(1, 2, name).unwrap(); // C2
        }
        if let Some(figure) = taxable {
            sheet.write_number(6, 2, figure).unwrap(); // C7
        }

        let sheet = workbook.add_worksheet();
        sheet.set_name("Sample1").unwrap();
        sheet.write_string(1, 2, "2025-Q1").unwrap(); // C2

        let sheet = workbook.add_worksheet();
        sheet.set_name("Data").unwrap();
        sheet.write_string(2, 2, province).unwrap(); // C3
        sheet.write_string(3, 2, classification).unwrap(); // C4

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_parse_complete_report() {
        let bytes = legacy_report(
            Some("Municipality of San Mateo"),
            "Rizal",
            "Municipality",
            &["Unremitted collections", "Late deposit of funds"],
            None,
            Some(1520.0),
        );
        let file = ReportFile::new("san_mateo_q1.xlsx", bytes);

        let result = parse_report(&file);

        assert!(result.success);
        assert_eq!(result.source_file, "san_mateo_q1.xlsx");
        assert_eq!(result.unit_name, "Municipality of San Mateo");
        assert_eq!(result.province, "Rizal");
        assert_eq!(result.classification, "Municipality");
        assert_eq!(result.findings_count, 2);
        assert_eq!(
            result.findings_display,
            "Unremitted collections; Late deposit of funds"
        );
        assert_eq!(result.taxable_properties, Some(1520.0));
        assert_eq!(result.source_period, Some("2025-Q1".to_string()));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_zero_findings_substitutes_sentinel() {
        let bytes = legacy_report(Some("City of Antipolo"), "Rizal", "City", &[], None, None);
        let file = ReportFile::new("antipolo.xlsx", bytes);

        let result = parse_report(&file);

        assert!(result.success);
        assert_eq!(result.findings_count, 0);
        assert_eq!(result.findings, vec![NO_FINDINGS_SENTINEL.to_string()]);
        assert_eq!(result.findings_display, NO_FINDINGS_SENTINEL);
    }

    #[test]
    fn test_missing_findings_sheet_is_not_an_error() {
        // Workbook with a single unrelated sheet: every logical sheet falls
        // back to it, and every field defaults.
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary").unwrap();
        sheet.write_string(0, 0, "quarterly report").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let file = ReportFile::new("bare.xlsx", bytes);
        let result = parse_report(&file);

        assert!(result.success);
        assert_eq!(result.findings_count, 0);
        assert_eq!(result.findings, vec![NO_FINDINGS_SENTINEL.to_string()]);
        // Unit name falls back to the file's own name
        assert_eq!(result.unit_name, "bare.xlsx");
        assert_eq!(result.province, "");
        assert_eq!(result.classification, "");
    }

    #[test]
    fn test_blank_finding_rows_are_skipped() {
        // Declares 3 findings but the middle row is blank
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Findings").unwrap();
        sheet.write_number(1, 1, 3.0).unwrap();
        sheet.write_string(2, 1, "First finding").unwrap();
        sheet.write_string(3, 1, "   ").unwrap();
        sheet.write_string(4, 1, "Third finding").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let file = ReportFile::new("gaps.xlsx", bytes);
        let result = parse_report(&file);

        assert!(result.success);
        assert_eq!(result.findings_count, 2);
        assert_eq!(result.findings, vec!["First finding", "Third finding"]);
    }

    #[test]
    fn test_non_numeric_count_defaults_to_zero() {
        let bytes = legacy_report(
            Some("Cainta"),
            "Rizal",
            "Municipality",
            &["Should not be read"],
            Some("N/A"),
            None,
        );
        let file = ReportFile::new("cainta.xlsx", bytes);

        let result = parse_report(&file);

        assert!(result.success);
        assert_eq!(result.findings_count, 0);
        assert_eq!(result.findings, vec![NO_FINDINGS_SENTINEL.to_string()]);
    }

    #[test]
    fn test_data_captured_alias_sheet() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Findings").unwrap();
        sheet.write_number(1, 1, 0.0).unwrap();
        let sheet = workbook.add_worksheet();
        sheet.set_name("DataCaptured").unwrap();
        sheet.write_string(2, 2, "Laguna").unwrap();
        sheet.write_string(3, 2, "City").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let file = ReportFile::new("old_revision.xlsx", bytes);
        let result = parse_report(&file);

        assert!(result.success);
        assert_eq!(result.province, "Laguna");
        assert_eq!(result.classification, "City");
    }

    #[test]
    fn test_unreadable_file_returns_failure_result() {
        let file = ReportFile::new("broken.xlsx", b"this is not a spreadsheet".to_vec());

        let result = parse_report(&file);

        assert!(!result.success);
        assert_eq!(result.source_file, "broken.xlsx");
        assert!(result.error.is_some());
        assert!(result.findings.is_empty());
    }

    #[test]
    fn test_count_capped_by_populated_rows() {
        // Declares a wildly inflated count; only the populated rows exist
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Findings").unwrap();
        sheet.write_number(1, 1, 1_000_000.0).unwrap();
        sheet.write_string(2, 1, "Only real finding").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let file = ReportFile::new("inflated.xlsx", bytes);
        let result = parse_report(&file);

        assert!(result.success);
        assert_eq!(result.findings, vec!["Only real finding"]);
        assert_eq!(result.findings_count, 1);
    }
}
