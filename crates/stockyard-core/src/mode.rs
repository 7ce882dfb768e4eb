use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Warning;

/// Which side of the document is the source of truth for totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationMode {
    /// Header totals follow the line items.
    #[default]
    Standard,
    /// Header weight is head count times the per-animal weight.
    DerivedByCount,
    /// Per-animal weight and unit price come from the header totals.
    DerivedByWeight,
}

impl AllocationMode {
    pub fn code(&self) -> &'static str {
        match self {
            AllocationMode::Standard => "STANDARD",
            AllocationMode::DerivedByCount => "DERIVED_BY_COUNT",
            AllocationMode::DerivedByWeight => "DERIVED_BY_WEIGHT",
        }
    }

    pub fn header_is_source(&self) -> bool {
        !matches!(self, AllocationMode::Standard)
    }
}

impl fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AllocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STANDARD" => Ok(Self::Standard),
            "DERIVED_BY_COUNT" => Ok(Self::DerivedByCount),
            "DERIVED_BY_WEIGHT" => Ok(Self::DerivedByWeight),
            other => Err(format!("unknown allocation mode code: {other}")),
        }
    }
}

/// Purchase-type classification as delivered by master data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub id: i64,
    pub label: String,
    #[serde(default)]
    pub allocation_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeResolution {
    pub mode: AllocationMode,
    pub warning: Option<Warning>,
}

impl ModeResolution {
    pub fn explicit(mode: AllocationMode) -> Self {
        Self { mode, warning: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error("classification {classification_id} has invalid allocation mode: {reason}")]
    InvalidCode {
        classification_id: i64,
        reason: String,
    },
    #[error("classification {0} appears more than once")]
    DuplicateClassification(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelMatch {
    Plain,
    First,
    Second,
    Ambiguous,
    Unmatched,
}

const PER_HEAD_MARKERS: [&str; 3] = ["ekor", "per head", "individual"];

fn match_label(label: &str) -> LabelMatch {
    let lowered = label.to_lowercase();
    if !PER_HEAD_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return LabelMatch::Unmatched;
    }

    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();
    let first = tokens.contains(&"1");
    let second = tokens.contains(&"2");

    match (first, second) {
        (true, true) => LabelMatch::Ambiguous,
        (true, false) => LabelMatch::First,
        (false, true) => LabelMatch::Second,
        (false, false) => LabelMatch::Plain,
    }
}

/// Resolves a classification without an explicit code from its label text.
fn resolve_from_label(classification: &Classification) -> ModeResolution {
    let unmapped = Warning::UnmappedClassification {
        classification_id: classification.id,
        label: classification.label.clone(),
    };

    let (mode, warning) = match match_label(&classification.label) {
        LabelMatch::Plain | LabelMatch::Unmatched => (AllocationMode::Standard, unmapped),
        LabelMatch::First => (AllocationMode::DerivedByCount, unmapped),
        LabelMatch::Second => (AllocationMode::DerivedByWeight, unmapped),
        LabelMatch::Ambiguous => (
            AllocationMode::Standard,
            Warning::AmbiguousClassification {
                classification_id: classification.id,
                label: classification.label.clone(),
            },
        ),
    };

    warn!(
        classification_id = classification.id,
        label = %classification.label,
        %mode,
        "allocation mode resolved from label text"
    );

    ModeResolution {
        mode,
        warning: Some(warning),
    }
}

/// Mode lookup by stable classification id, built once per master-data load.
#[derive(Debug, Clone, Default)]
pub struct ClassificationRegistry {
    entries: HashMap<i64, ModeResolution>,
}

impl ClassificationRegistry {
    pub fn load(classifications: &[Classification]) -> Result<Self, ModeError> {
        let mut entries = HashMap::with_capacity(classifications.len());

        for classification in classifications {
            let resolution = match classification.allocation_mode.as_deref() {
                Some(code) if !code.trim().is_empty() => {
                    let mode = code.parse::<AllocationMode>().map_err(|reason| {
                        ModeError::InvalidCode {
                            classification_id: classification.id,
                            reason,
                        }
                    })?;
                    ModeResolution::explicit(mode)
                }
                _ => resolve_from_label(classification),
            };

            if entries.insert(classification.id, resolution).is_some() {
                return Err(ModeError::DuplicateClassification(classification.id));
            }
        }

        Ok(Self { entries })
    }

    pub fn resolve(&self, classification_id: i64) -> ModeResolution {
        match self.entries.get(&classification_id) {
            Some(resolution) => resolution.clone(),
            None => {
                warn!(classification_id, "unknown classification; using standard allocation");
                ModeResolution {
                    mode: AllocationMode::Standard,
                    warning: Some(Warning::UnmappedClassification {
                        classification_id,
                        label: String::new(),
                    }),
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
