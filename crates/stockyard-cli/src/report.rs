use rust_decimal::Decimal;
use serde::Serialize;
use stockyard_core::{AllocationMode, LineItem, PurchaseHeader, ValidationIssue, Warning};
use stockyard_costing::DocumentValuation;
use stockyard_worksheet::{PurchaseDocument, SaveReport};

/// Everything printed after a replay.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub header: &'a PurchaseHeader,
    pub allocation_mode: AllocationMode,
    pub allocation_base: Decimal,
    pub lines: Vec<&'a LineItem>,
    pub valuation: DocumentValuation,
    pub issues: Vec<ValidationIssue>,
    pub warnings: &'a [Warning],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<SaveReport>,
}

impl<'a> Report<'a> {
    pub fn new(document: &'a PurchaseDocument, saved: Option<SaveReport>) -> Self {
        Self {
            header: document.header(),
            allocation_mode: document.mode(),
            allocation_base: document.allocation_base(),
            lines: document.lines().collect(),
            valuation: document.valuation(),
            issues: document.validate(),
            warnings: document.warnings(),
            saved,
        }
    }
}
