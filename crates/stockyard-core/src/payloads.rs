use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, IssueKind, ValidationIssue};
use crate::mode::AllocationMode;
use crate::models::{LineItem, PurchaseHeader};

/// Body sent to the store when a line is created or updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemPayload {
    pub parent_id: i64,
    pub office_id: i64,
    pub tag_code: String,
    pub supplier_tag_code: String,
    pub classification_id: i64,
    pub unit_price: Decimal,
    /// Whole kilograms.
    pub weight: i64,
    pub markup_percent: Decimal,
    pub landed_unit_cost: Decimal,
    pub total_price: Decimal,
}

impl LineItemPayload {
    /// Lines without their own classification inherit the header's. Fails
    /// when the rounded weight or the line total cannot be stored.
    pub fn from_line(
        line: &LineItem,
        header: &PurchaseHeader,
        parent_id: i64,
        scale: u32,
    ) -> Result<Self, EngineError> {
        let out_of_range = |message: String| {
            EngineError::Validation(vec![ValidationIssue::line(
                line.id,
                IssueKind::ValueOutOfRange,
                message,
            )])
        };

        let weight = whole_kilograms(line.weight)
            .ok_or_else(|| out_of_range(format!("weight {} is too large", line.weight)))?;
        let landed_unit_cost = line.landed_unit_cost.round_dp(scale);
        let total_price = Decimal::from(weight)
            .checked_mul(landed_unit_cost)
            .ok_or_else(|| out_of_range(format!("line total for weight {weight} is too large")))?
            .round_dp(scale);

        Ok(Self {
            parent_id,
            office_id: header.office_id,
            tag_code: line.tag_code.trim().to_string(),
            supplier_tag_code: line.supplier_tag_code.trim().to_string(),
            classification_id: line.classification_id.unwrap_or(header.classification_id),
            unit_price: line.unit_price.round_dp(scale),
            weight,
            markup_percent: line.markup_percent,
            landed_unit_cost,
            total_price,
        })
    }
}

/// Weight rounded half away from zero to whole kilograms, if it fits an `i64`.
pub fn whole_kilograms(weight: Decimal) -> Option<i64> {
    weight
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPayload {
    pub nota: String,
    pub purchase_date: Option<NaiveDate>,
    pub supplier_id: Option<i64>,
    pub office_id: i64,
    pub classification_id: i64,
    pub allocation_mode: AllocationMode,
    pub truck_cost: Decimal,
    pub other_cost: Decimal,
    pub total_weight: Decimal,
    pub total_price: Decimal,
    pub total_count: u32,
    pub landed_total: Decimal,
}

impl HeaderPayload {
    pub fn from_header(
        header: &PurchaseHeader,
        mode: AllocationMode,
        landed_total: Decimal,
        scale: u32,
    ) -> Self {
        Self {
            nota: header.nota.trim().to_string(),
            purchase_date: header.purchase_date,
            supplier_id: header.supplier_id,
            office_id: header.office_id,
            classification_id: header.classification_id,
            allocation_mode: mode,
            truck_cost: header.truck_cost.round_dp(scale),
            other_cost: header.other_cost.round_dp(scale),
            total_weight: header.total_weight,
            total_price: header.total_price.round_dp(scale),
            total_count: header.total_count,
            landed_total: landed_total.round_dp(scale),
        }
    }
}
