// 🏛️ Entity Registry - Reporting units and submission records
//
// The registry (region → province → unit) and the submission records are
// owned by an external subsystem and handed to the core as plain in-memory
// collections. Nothing here is mutated by the core.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// ENTITY
// ============================================================================

/// A reporting unit tracked in the registry.
///
/// `classification` stays a free string ("City", "Municipality",
/// "Province") because it passes through from external registry data and
/// from extracted report cells; legacy data carries variants a closed enum
/// would reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Opaque stable identity, assigned by the registry owner
    pub id: String,
    pub name: String,
    pub region: String,
    pub province: String,
    pub classification: String,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        region: impl Into<String>,
        province: impl Into<String>,
        classification: impl Into<String>,
    ) -> Self {
        Entity {
            id: id.into(),
            name: name.into(),
            region: region.into(),
            province: province.into(),
            classification: classification.into(),
        }
    }
}

// ============================================================================
// SUBMISSION STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubmissionStatus {
    #[default]
    NotSubmitted,
    Submitted,
    LateSubmission,
}

impl SubmissionStatus {
    /// Human-readable display form
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::NotSubmitted => "Not Submitted",
            SubmissionStatus::Submitted => "Submitted",
            SubmissionStatus::LateSubmission => "Late Submission",
        }
    }
}

// ============================================================================
// ENTITY REFERENCE
// ============================================================================

/// Weak reference from a submission record to an entity.
///
/// Upstream data carries either a raw id or an embedded object with an `id`
/// field; both forms are accepted and normalized to one comparison value.
/// This is a lookup key, never an ownership relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(String),
    Embedded { id: String },
}

impl EntityRef {
    /// Canonical entity id for matching
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Id(id) => id,
            EntityRef::Embedded { id } => id,
        }
    }
}

// ============================================================================
// SUBMISSION RECORD
// ============================================================================

/// One submission event for an entity and a reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    #[serde(alias = "entity")]
    pub entity_ref: EntityRef,

    /// Reporting cycle label, e.g. "2025-Q1"
    pub period: String,

    pub status: SubmissionStatus,

    #[serde(default)]
    pub date_submitted: Option<NaiveDate>,

    /// Free-text remark captured at submission time
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// CHECKLIST FILTER
// ============================================================================

/// Optional scope filters for checklist building; all present filters must
/// match (intersection).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistFilter {
    pub region: Option<String>,
    pub province: Option<String>,
    pub entity_id: Option<String>,
}

impl ChecklistFilter {
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_province(mut self, province: impl Into<String>) -> Self {
        self.province = Some(province.into());
        self
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        if let Some(region) = &self.region {
            if entity.region != *region {
                return false;
            }
        }
        if let Some(province) = &self.province {
            if entity.province != *province {
                return false;
            }
        }
        if let Some(entity_id) = &self.entity_id {
            if entity.id != *entity_id {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// JSON LOADERS (CLI input boundary)
// ============================================================================

pub fn load_entities(path: &Path) -> Result<Vec<Entity>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read registry file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Registry file is not a valid entity array: {}", path.display()))
}

pub fn load_records(path: &Path) -> Result<Vec<SubmissionRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| {
        format!(
            "Records file is not a valid submission-record array: {}",
            path.display()
        )
    })
}

// ============================================================================
// TESTS
// ============================================================================
