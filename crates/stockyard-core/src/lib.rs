pub mod error;
pub mod mode;
pub mod models;
pub mod payloads;
pub mod settings;
pub mod storage;

pub use error::{DerivedField, EngineError, IssueKind, ValidationIssue, Warning};
pub use mode::{AllocationMode, Classification, ClassificationRegistry, ModeError, ModeResolution};
pub use models::{DefaultTemplate, ItemId, LineItem, NewLine, PurchaseHeader, RowState};
pub use payloads::{HeaderPayload, LineItemPayload, whole_kilograms};
pub use settings::EngineSettings;
pub use storage::PurchaseStore;
