use serde::{Deserialize, Serialize};

use crate::models::ItemId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("line item {0} does not exist in this document")]
    UnknownItem(ItemId),
    #[error("batch count must be at least 1")]
    InvalidBatchCount,
    #[error("batch count {requested} exceeds the limit of {limit}")]
    BatchTooLarge { requested: u32, limit: u32 },
    #[error("document has {} validation issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),
    #[error("purchase header has no persisted id; resolve the parent document before saving lines")]
    UnresolvedParent,
    #[error("line item {0} changed since the removal was requested")]
    StaleRemoval(ItemId),
    #[error("{0}")]
    Persistence(String),
}

impl EngineError {
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            EngineError::Validation(issues) => issues,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingField,
    NonPositiveWeight,
    NonPositivePrice,
    MarkupOutOfRange,
    NegativeOverhead,
    DuplicateSupplierTag,
    /// A quantity or amount too large to store.
    ValueOutOfRange,
}

/// A user-correctable problem that blocks saving but not editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// `None` for header-level issues.
    pub item: Option<ItemId>,
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    pub fn header(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            item: None,
            kind,
            message: message.into(),
        }
    }

    pub fn line(item: ItemId, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            item: Some(item),
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedField {
    TotalWeight,
    TemplateWeight,
    TemplateUnitPrice,
}

/// Non-blocking conditions surfaced next to the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    /// A derived default hit a zero divisor and was set to zero.
    DerivedDefaultZero { field: DerivedField },
    /// Mode came from label text or a fallback rather than an explicit code.
    UnmappedClassification {
        classification_id: i64,
        label: String,
    },
    /// Label text matched more than one derived variant.
    AmbiguousClassification {
        classification_id: i64,
        label: String,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::DerivedDefaultZero { field } => {
                write!(f, "derived default {field:?} is zero; check header totals")
            }
            Warning::UnmappedClassification {
                classification_id,
                label,
            } => write!(
                f,
                "classification {classification_id} ({label}) has no allocation mode code"
            ),
            Warning::AmbiguousClassification {
                classification_id,
                label,
            } => write!(
                f,
                "classification {classification_id} ({label}) matches more than one allocation mode; using standard"
            ),
        }
    }
}
