// ✅ Submission Checklist - Registry reconciliation engine
//
// Maps every entity in scope to at most one submission record for the
// requested period and produces the grouped, sorted checklist plus summary
// counts. The registry drives the grouping: a period with no records at all
// still yields a fully populated, fully NotSubmitted checklist.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::registry::{ChecklistFilter, Entity, SubmissionRecord, SubmissionStatus};

// ============================================================================
// ERRORS (caller-contract violations only)
// ============================================================================

/// Structurally invalid input. Missing data never raises - it defaults or
/// drops silently; these fire only when the caller hands over records that
/// cannot be reconciled at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChecklistError {
    #[error("registry entity at index {0} has an empty id")]
    EntityMissingId(usize),

    #[error("registry entity '{0}' has an empty name")]
    EntityMissingName(String),

    #[error("submission record at index {0} has an empty entity reference")]
    RecordMissingEntityRef(usize),

    #[error("submission record at index {0} has an empty period")]
    RecordMissingPeriod(usize),
}

// ============================================================================
// CHECKLIST STRUCTURES (derived per call, never cached)
// ============================================================================

/// One entity's resolved submission status for the requested period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistRow {
    pub entity_id: String,
    pub name: String,
    pub region: String,
    pub province: String,
    pub classification: String,
    pub status: SubmissionStatus,
    pub date_submitted: Option<NaiveDate>,
    pub remark: Option<String>,
}

/// All rows for one province, sorted by entity name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistGroup {
    pub province: String,
    /// Entity count for this province within the filtered scope
    pub total_lgu: usize,
    pub rows: Vec<ChecklistRow>,
}

/// Global counts across the filtered scope. The three status counts always
/// sum to `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChecklistSummary {
    pub total: usize,
    pub submitted: usize,
    pub late_submission: usize,
    pub not_submitted: usize,
}

/// The reconciled view: groups sorted by province name, plus summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub period: String,
    pub groups: Vec<ChecklistGroup>,
    pub summary: ChecklistSummary,
}

impl Checklist {
    /// Flat iterator over every row, in group order.
    pub fn rows(&self) -> impl Iterator<Item = &ChecklistRow> {
        self.groups.iter().flat_map(|g| g.rows.iter())
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Period {}: {} LGUs - {} submitted, {} late, {} not submitted",
            self.period,
            self.summary.total,
            self.summary.submitted,
            self.summary.late_submission,
            self.summary.not_submitted
        )
    }
}

// ============================================================================
// RECONCILIATION
// ============================================================================

/// Build the submission checklist for one period.
///
/// - filters compose by intersection; an empty filter keeps everything
/// - every entity in the filtered scope appears in exactly one row
/// - records referencing entities outside the scope are ignored
/// - an entity without a matching record defaults to NotSubmitted
pub fn build_checklist(
    entities: &[Entity],
    records: &[SubmissionRecord],
    period: &str,
    filter: &ChecklistFilter,
) -> Result<Checklist, ChecklistError> {
    validate_inputs(entities, records)?;

    let matches = best_record_per_entity(records, period);

    let mut by_province: BTreeMap<String, Vec<ChecklistRow>> = BTreeMap::new();
    for entity in entities.iter().filter(|e| filter.matches(e)) {
        let row = resolve_row(entity, matches.get(entity.id.as_str()).copied());
        by_province.entry(entity.province.clone()).or_default().push(row);
    }

    let mut summary = ChecklistSummary::default();
    let mut groups = Vec::with_capacity(by_province.len());
    for (province, mut rows) in by_province {
        rows.sort_by(|a, b| a.name.cmp(&b.name));

        for row in &rows {
            summary.total += 1;
            match row.status {
                SubmissionStatus::Submitted => summary.submitted += 1,
                SubmissionStatus::LateSubmission => summary.late_submission += 1,
                SubmissionStatus::NotSubmitted => summary.not_submitted += 1,
            }
        }

        groups.push(ChecklistGroup {
            province,
            total_lgu: rows.len(),
            rows,
        });
    }

    Ok(Checklist {
        period: period.to_string(),
        groups,
        summary,
    })
}

fn validate_inputs(
    entities: &[Entity],
    records: &[SubmissionRecord],
) -> Result<(), ChecklistError> {
    for (idx, entity) in entities.iter().enumerate() {
        if entity.id.trim().is_empty() {
            return Err(ChecklistError::EntityMissingId(idx));
        }
        if entity.name.trim().is_empty() {
            return Err(ChecklistError::EntityMissingName(entity.id.clone()));
        }
    }
    for (idx, record) in records.iter().enumerate() {
        if record.entity_ref.id().trim().is_empty() {
            return Err(ChecklistError::RecordMissingEntityRef(idx));
        }
        if record.period.trim().is_empty() {
            return Err(ChecklistError::RecordMissingPeriod(idx));
        }
    }
    Ok(())
}

/// Pick at most one record per entity id for the period.
///
/// Duplicate tie-break: the latest `date_submitted` wins, a dated record
/// beats an undated one, and exact ties keep the earliest-seen record.
fn best_record_per_entity<'a>(
    records: &'a [SubmissionRecord],
    period: &str,
) -> HashMap<&'a str, &'a SubmissionRecord> {
    let mut best: HashMap<&str, &SubmissionRecord> = HashMap::new();

    for record in records.iter().filter(|r| r.period == period) {
        let id = record.entity_ref.id();
        match best.get(id) {
            Some(current) if record.date_submitted <= current.date_submitted => {}
            _ => {
                best.insert(id, record);
            }
        }
    }

    best
}

fn resolve_row(entity: &Entity, record: Option<&SubmissionRecord>) -> ChecklistRow {
    let (status, date_submitted, remark) = match record {
        Some(r) => (r.status, r.date_submitted, r.description.clone()),
        None => (SubmissionStatus::NotSubmitted, None, None),
    };

    ChecklistRow {
        entity_id: entity.id.clone(),
        name: entity.name.clone(),
        region: entity.region.clone(),
        province: entity.province.clone(),
        classification: entity.classification.clone(),
        status,
        date_submitted,
        remark,
    }
}

// ============================================================================
// TESTS
// ============================================================================
