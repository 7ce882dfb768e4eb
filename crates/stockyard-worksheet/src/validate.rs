use rust_decimal::Decimal;
use stockyard_core::{
    AllocationMode, IssueKind, LineItem, PurchaseHeader, ValidationIssue, whole_kilograms,
};

use crate::duplicates::duplicate_issues;
use crate::store::LineItemStore;

pub fn validate_header(mode: AllocationMode, header: &PurchaseHeader) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if header.nota.trim().is_empty() {
        issues.push(ValidationIssue::header(
            IssueKind::MissingField,
            "nota is required",
        ));
    }
    if header.office_id <= 0 {
        issues.push(ValidationIssue::header(
            IssueKind::MissingField,
            "office is required",
        ));
    }
    if header.truck_cost < Decimal::ZERO {
        issues.push(ValidationIssue::header(
            IssueKind::NegativeOverhead,
            "truck cost cannot be negative",
        ));
    }
    if header.other_cost < Decimal::ZERO {
        issues.push(ValidationIssue::header(
            IssueKind::NegativeOverhead,
            "other cost cannot be negative",
        ));
    }

    if mode.header_is_source() {
        if header.total_count == 0 {
            issues.push(ValidationIssue::header(
                IssueKind::MissingField,
                "head count is required",
            ));
        }
        if header.total_weight <= Decimal::ZERO {
            issues.push(ValidationIssue::header(
                IssueKind::NonPositiveWeight,
                "total weight must be positive",
            ));
        }
        if header.total_price <= Decimal::ZERO {
            issues.push(ValidationIssue::header(
                IssueKind::NonPositivePrice,
                "total price must be positive",
            ));
        }
    }

    issues
}

pub fn validate_line(line: &LineItem) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if line.tag_code.trim().is_empty() {
        issues.push(ValidationIssue::line(
            line.id,
            IssueKind::MissingField,
            "tag code is required",
        ));
    }
    if line.weight <= Decimal::ZERO {
        issues.push(ValidationIssue::line(
            line.id,
            IssueKind::NonPositiveWeight,
            format!("weight must be positive, got {}", line.weight),
        ));
    }
    if line.unit_price <= Decimal::ZERO {
        issues.push(ValidationIssue::line(
            line.id,
            IssueKind::NonPositivePrice,
            format!("unit price must be positive, got {}", line.unit_price),
        ));
    }
    if line.markup_percent < Decimal::ZERO || line.markup_percent > Decimal::ONE_HUNDRED {
        issues.push(ValidationIssue::line(
            line.id,
            IssueKind::MarkupOutOfRange,
            format!("markup must be between 0 and 100, got {}", line.markup_percent),
        ));
    }
    if whole_kilograms(line.weight).is_none() {
        issues.push(ValidationIssue::line(
            line.id,
            IssueKind::ValueOutOfRange,
            format!("weight {} is too large to store", line.weight),
        ));
    } else if line.weight.checked_mul(line.landed_unit_cost).is_none() {
        issues.push(ValidationIssue::line(
            line.id,
            IssueKind::ValueOutOfRange,
            "line total is too large to store",
        ));
    }

    issues
}

/// Every issue that blocks saving, header first, then rows in entry order,
/// then duplicate supplier tags.
pub fn validate_document(
    mode: AllocationMode,
    header: &PurchaseHeader,
    store: &LineItemStore,
) -> Vec<ValidationIssue> {
    let mut issues = validate_header(mode, header);

    if store.is_empty() {
        issues.push(ValidationIssue::header(
            IssueKind::MissingField,
            "at least one line item is required",
        ));
    }
    let weight_sum = store
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.weight));
    if weight_sum.is_none() {
        issues.push(ValidationIssue::header(
            IssueKind::ValueOutOfRange,
            "total weight is too large to store",
        ));
    }
    issues.extend(store.iter().flat_map(validate_line));
    issues.extend(duplicate_issues(store));

    issues
}
