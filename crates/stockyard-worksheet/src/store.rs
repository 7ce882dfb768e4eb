use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockyard_core::{EngineError, ItemId, LineItem};
use stockyard_costing::total_weight;

/// A single-field change to one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum LineEdit {
    Weight(Decimal),
    UnitPrice(Decimal),
    MarkupPercent(Decimal),
    TagCode(String),
    SupplierTagCode(String),
    ClassificationId(Option<i64>),
}

/// Numeric suffix of a generated tag code such as `NT-12-007`.
fn tag_sequence(tag_code: &str, prefix: &str) -> Option<u32> {
    let digits = tag_code.trim().strip_prefix(prefix)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Line items of one document in entry order, addressed by stable id.
///
/// The store only holds rows. Derived values are rewritten by the
/// document's reconciliation pass after every change.
#[derive(Debug, Clone, Default)]
pub struct LineItemStore {
    items: IndexMap<ItemId, LineItem>,
    next_seq: u32,
}

impl LineItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<LineItem>) -> Self {
        let mut store = Self::new();
        store.extend(lines);
        store
    }

    pub fn insert(&mut self, line: LineItem) -> ItemId {
        let id = line.id;
        self.items.insert(id, line);
        self.next_seq = self.next_seq.saturating_add(1);
        id
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = LineItem>) -> Vec<ItemId> {
        lines.into_iter().map(|line| self.insert(line)).collect()
    }

    /// Sequence number for the next generated `{prefix}-{n}` tag code. Never
    /// reused after removals, and always above any such tag already present,
    /// including rows loaded from the store.
    pub fn next_seq(&self, prefix: &str) -> u32 {
        let highest_tag = self
            .items
            .values()
            .filter_map(|line| tag_sequence(&line.tag_code, prefix))
            .max()
            .unwrap_or(0);
        self.next_seq.max(highest_tag).saturating_add(1)
    }

    pub fn get(&self, id: ItemId) -> Option<&LineItem> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut LineItem> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn apply(&mut self, id: ItemId, edit: LineEdit) -> Result<(), EngineError> {
        let line = self.items.get_mut(&id).ok_or(EngineError::UnknownItem(id))?;

        match edit {
            LineEdit::Weight(weight) => {
                line.weight = weight;
                line.follows_template = false;
            }
            LineEdit::UnitPrice(unit_price) => {
                line.unit_price = unit_price;
                line.follows_template = false;
            }
            LineEdit::MarkupPercent(markup) => line.markup_percent = markup,
            LineEdit::TagCode(code) => line.tag_code = code,
            LineEdit::SupplierTagCode(code) => line.supplier_tag_code = code,
            LineEdit::ClassificationId(classification) => line.classification_id = classification,
        }

        Ok(())
    }

    /// Keeps the order of the remaining rows.
    pub fn remove(&mut self, id: ItemId) -> Option<LineItem> {
        self.items.shift_remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LineItem> {
        self.items.values_mut()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_weight(&self) -> Decimal {
        total_weight(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use stockyard_core::{DefaultTemplate, NewLine};

    use super::*;

    fn line(weight: Decimal) -> LineItem {
        LineItem::new(NewLine {
            weight,
            unit_price: dec!(10),
            ..NewLine::default()
        })
    }

    #[test]
    fn keeps_entry_order_across_removal() {
        let mut store = LineItemStore::new();
        let a = store.insert(line(dec!(100)));
        let b = store.insert(line(dec!(200)));
        let c = store.insert(line(dec!(300)));

        store.remove(b);

        assert_eq!(store.ids(), vec![a, c]);
        assert_eq!(store.total_weight(), dec!(400));
        assert_eq!(store.next_seq("NT-1"), 4);
    }

    #[test]
    fn manual_weight_edit_detaches_from_template() {
        let mut store = LineItemStore::new();
        let template = DefaultTemplate {
            weight: dec!(300),
            unit_price: dec!(50000),
            markup_percent: Decimal::ZERO,
        };
        let id = store.insert(LineItem::from_template(&template, "T-1"));

        store.apply(id, LineEdit::MarkupPercent(dec!(5))).unwrap();
        assert!(store.get(id).unwrap().follows_template);

        store.apply(id, LineEdit::Weight(dec!(310))).unwrap();
        let edited = store.get(id).unwrap();
        assert!(!edited.follows_template);
        assert_eq!(edited.weight, dec!(310));
    }

    #[test]
    fn sequence_skips_loaded_tags() {
        let tagged = |tag_code: &str| {
            LineItem::persisted(
                1,
                NewLine {
                    tag_code: tag_code.to_string(),
                    weight: dec!(100),
                    unit_price: dec!(10),
                    ..NewLine::default()
                },
            )
        };
        let store = LineItemStore::from_lines(vec![tagged("NT-8-001"), tagged("NT-8-003")]);
        assert_eq!(store.next_seq("NT-8"), 4);
        assert_eq!(store.next_seq("NT-9"), 3);

        let store = LineItemStore::from_lines(vec![tagged("NT-8-x9"), tagged("OTHER-050")]);
        assert_eq!(store.next_seq("NT-8"), 3);
        assert_eq!(store.next_seq("OTHER"), 51);
    }

    #[test]
    fn editing_unknown_row_fails() {
        let mut store = LineItemStore::new();
        let missing = ItemId::new();
        assert_eq!(
            store.apply(missing, LineEdit::Weight(dec!(1))),
            Err(EngineError::UnknownItem(missing))
        );
    }
}
