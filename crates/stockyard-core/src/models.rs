use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local identity of a line item. Assigned on creation and never reused,
/// even after the row is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether a row exists only locally or has an identifier assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum RowState {
    #[default]
    New,
    Persisted(i64),
}

impl RowState {
    pub fn persisted_id(&self) -> Option<i64> {
        match self {
            RowState::New => None,
            RowState::Persisted(id) => Some(*id),
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, RowState::Persisted(_))
    }
}

/// Values copied into rows created from the header rather than typed in by hand.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefaultTemplate {
    /// Per-animal weight in kg.
    pub weight: Decimal,
    pub unit_price: Decimal,
    pub markup_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseHeader {
    pub id: RowState,
    /// Supplier delivery note number.
    pub nota: String,
    pub purchase_date: Option<NaiveDate>,
    pub supplier_id: Option<i64>,
    pub office_id: i64,
    pub classification_id: i64,
    pub truck_cost: Decimal,
    pub other_cost: Decimal,
    pub total_weight: Decimal,
    pub total_price: Decimal,
    pub total_count: u32,
    pub template: DefaultTemplate,
}

impl PurchaseHeader {
    pub fn new(nota: impl Into<String>, office_id: i64, classification_id: i64) -> Self {
        Self {
            id: RowState::New,
            nota: nota.into(),
            purchase_date: None,
            supplier_id: None,
            office_id,
            classification_id,
            truck_cost: Decimal::ZERO,
            other_cost: Decimal::ZERO,
            total_weight: Decimal::ZERO,
            total_price: Decimal::ZERO,
            total_count: 0,
            template: DefaultTemplate::default(),
        }
    }

    /// Shared cost spread over every line in the document.
    pub fn overhead(&self) -> Decimal {
        self.truck_cost + self.other_cost
    }
}

/// Operator input for a hand-entered line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewLine {
    #[serde(default)]
    pub tag_code: String,
    #[serde(default)]
    pub supplier_tag_code: String,
    #[serde(default)]
    pub classification_id: Option<i64>,
    pub weight: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub markup_percent: Decimal,
}

/// One animal on the purchase document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ItemId,
    pub state: RowState,
    pub tag_code: String,
    pub supplier_tag_code: String,
    pub classification_id: Option<i64>,
    pub weight: Decimal,
    pub unit_price: Decimal,
    pub markup_percent: Decimal,
    /// HPP. Owned by the allocation pass, never set by hand.
    pub landed_unit_cost: Decimal,
    pub follows_template: bool,
    pub duplicate: Option<String>,
}

impl LineItem {
    pub fn new(input: NewLine) -> Self {
        Self {
            id: ItemId::new(),
            state: RowState::New,
            tag_code: input.tag_code,
            supplier_tag_code: input.supplier_tag_code,
            classification_id: input.classification_id,
            weight: input.weight,
            unit_price: input.unit_price,
            markup_percent: input.markup_percent,
            landed_unit_cost: Decimal::ZERO,
            follows_template: false,
            duplicate: None,
        }
    }

    pub fn from_template(template: &DefaultTemplate, tag_code: impl Into<String>) -> Self {
        Self {
            follows_template: true,
            ..Self::new(NewLine {
                tag_code: tag_code.into(),
                supplier_tag_code: String::new(),
                classification_id: None,
                weight: template.weight,
                unit_price: template.unit_price,
                markup_percent: template.markup_percent,
            })
        }
    }

    /// Rehydrates a row loaded from the store.
    pub fn persisted(detail_id: i64, input: NewLine) -> Self {
        Self {
            state: RowState::Persisted(detail_id),
            ..Self::new(input)
        }
    }

    /// Saturates at `Decimal::MAX`; such rows fail save validation.
    pub fn line_total(&self) -> Decimal {
        self.weight.saturating_mul(self.landed_unit_cost)
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn item_ids_are_not_reused() {
        let a = ItemId::new();
        let b = ItemId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn template_rows_follow_the_template() {
        let template = DefaultTemplate {
            weight: dec!(320),
            unit_price: dec!(52000),
            markup_percent: dec!(2.5),
        };
        let line = LineItem::from_template(&template, "NT-01");

        assert!(line.follows_template);
        assert_eq!(line.state, RowState::New);
        assert_eq!(line.weight, dec!(320));
        assert_eq!(line.markup_percent, dec!(2.5));
        assert_eq!(line.tag_code, "NT-01");
    }

    #[test]
    fn row_state_serializes_with_tag() {
        let json = serde_json::to_value(RowState::Persisted(42)).unwrap();
        assert_eq!(json, serde_json::json!({"state": "persisted", "id": 42}));
        assert_eq!(RowState::Persisted(42).persisted_id(), Some(42));
        assert_eq!(RowState::New.persisted_id(), None);
    }
}
