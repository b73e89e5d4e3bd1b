// 🗂️ Batch Runner - Sequential report processing with failure isolation
//
// Files are processed strictly in input order. One malformed file never
// aborts the batch: its failure result lands in `errors` and processing
// moves on. Progress is reported synchronously before each file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::template::{parse_report, ParsedResult, ReportFile};

// ============================================================================
// PROGRESS
// ============================================================================

/// Snapshot handed to the progress callback before each file is parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    /// 1-based index of the file about to be processed
    pub current: usize,
    pub total: usize,
    pub file_name: String,
    pub message: String,
}

// ============================================================================
// BATCH REPORT
// ============================================================================

/// Outcome of one batch run. `results` holds successful extractions and
/// `errors` holds failure results; together they contain exactly one entry
/// per input file, in input order within each list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Stable identity for this run (for logs and audit trails)
    pub run_id: String,

    pub results: Vec<ParsedResult>,
    pub errors: Vec<ParsedResult>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Batch {}: {} of {} reports parsed, {} failed",
            self.run_id,
            self.results.len(),
            self.total(),
            self.errors.len()
        )
    }
}

// ============================================================================
// BATCH PROCESSING
// ============================================================================

/// Process report files sequentially, in input order.
///
/// The progress callback, when supplied, is invoked synchronously before
/// each file. Extraction order is strictly sequential: progress reporting
/// and result ordering are defined relative to input order, so this loop
/// must not be parallelized.
pub fn process_batch(
    files: &[ReportFile],
    mut on_progress: Option<&mut dyn FnMut(&BatchProgress)>,
) -> BatchReport {
    let run_id = uuid::Uuid::new_v4().to_string();
    let started_at = Utc::now();

    let mut results = Vec::new();
    let mut errors = Vec::new();

    for (idx, file) in files.iter().enumerate() {
        let progress = BatchProgress {
            current: idx + 1,
            total: files.len(),
            file_name: file.name.clone(),
            message: format!("Processing {} ({} of {})", file.name, idx + 1, files.len()),
        };
        if let Some(ref mut callback) = on_progress {
            callback(&progress);
        }

        let result = parse_report(file);
        if result.success {
            results.push(result);
        } else {
            warn!(
                "Report {} failed: {}",
                file.name,
                result.error.as_deref().unwrap_or("unknown error")
            );
            errors.push(result);
        }
    }

    let report = BatchReport {
        run_id,
        results,
        errors,
        started_at,
        finished_at: Utc::now(),
    };
    info!("{}", report.summary());
    report
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn minimal_report(unit_name: &str, findings: &[&str]) -> ReportFile {
        let mut workbook = Workbook::new();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Findings").unwrap();
        sheet.write_number(1, 1, findings.len() as f64).unwrap();
        for (i, finding) in findings.iter().enumerate() {
            sheet.write_string(2 + i as u32, 1, *finding).unwrap();
        }

        let sheet = workbook.add_worksheet();
        sheet.set_name("Value1").unwrap();
        sheet.write_string(1, 2, unit_name).unwrap();

        let bytes = workbook.save_to_buffer().unwrap();
        ReportFile::new(format!("{unit_name}.xlsx"), bytes)
    }

    fn broken_report(name: &str) -> ReportFile {
        ReportFile::new(name, b"garbage payload".to_vec())
    }

    #[test]
    fn test_every_file_lands_in_exactly_one_list() {
        let files = vec![
            minimal_report("alpha", &["finding 1"]),
            broken_report("broken.xlsx"),
            minimal_report("bravo", &[]),
        ];

        let report = process_batch(&files, None);

        assert_eq!(report.total(), files.len());
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_order_preserved_within_each_list() {
        let files = vec![
            minimal_report("alpha", &[]),
            broken_report("bad_one.xlsx"),
            minimal_report("bravo", &[]),
            broken_report("bad_two.xlsx"),
            minimal_report("charlie", &[]),
        ];

        let report = process_batch(&files, None);

        let parsed: Vec<&str> = report.results.iter().map(|r| r.unit_name.as_str()).collect();
        assert_eq!(parsed, vec!["alpha", "bravo", "charlie"]);

        let failed: Vec<&str> = report.errors.iter().map(|r| r.source_file.as_str()).collect();
        assert_eq!(failed, vec!["bad_one.xlsx", "bad_two.xlsx"]);
    }

    #[test]
    fn test_progress_reported_per_file_in_order() {
        let files = vec![
            minimal_report("alpha", &[]),
            broken_report("broken.xlsx"),
            minimal_report("bravo", &[]),
        ];

        let mut seen: Vec<(usize, usize, String)> = Vec::new();
        let mut callback = |p: &BatchProgress| {
            seen.push((p.current, p.total, p.file_name.clone()));
        };

        let report = process_batch(&files, Some(&mut callback));

        assert_eq!(report.total(), 3);
        assert_eq!(
            seen,
            vec![
                (1, 3, "alpha.xlsx".to_string()),
                (2, 3, "broken.xlsx".to_string()),
                (3, 3, "bravo.xlsx".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_batch() {
        let report = process_batch(&[], None);

        assert_eq!(report.total(), 0);
        assert!(report.is_clean());
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_failure_result_carries_file_name_and_message() {
        let report = process_batch(&[broken_report("corrupt.xlsx")], None);

        assert_eq!(report.errors.len(), 1);
        let failure = &report.errors[0];
        assert_eq!(failure.source_file, "corrupt.xlsx");
        assert!(!failure.success);
        assert!(failure.error.is_some());
    }
}
