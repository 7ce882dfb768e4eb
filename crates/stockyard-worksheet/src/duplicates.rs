use std::collections::HashMap;

use stockyard_core::{IssueKind, ValidationIssue};

use crate::store::LineItemStore;

/// Comparison key for supplier tag codes. `None` for blank codes, which
/// never collide.
pub fn tag_key(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Sets or clears the duplicate flag on every row. Returns the number of
/// flagged rows.
pub fn flag_duplicates(store: &mut LineItemStore) -> usize {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for line in store.iter() {
        if let Some(key) = tag_key(&line.supplier_tag_code) {
            *counts.entry(key).or_default() += 1;
        }
    }

    let mut flagged = 0;
    for line in store.iter_mut() {
        let shared = tag_key(&line.supplier_tag_code)
            .and_then(|key| counts.get(&key).copied())
            .filter(|count| *count > 1);

        line.duplicate = shared.map(|count| {
            flagged += 1;
            format!(
                "supplier tag code '{}' is also used by {} other line(s)",
                line.supplier_tag_code.trim(),
                count - 1
            )
        });
    }

    flagged
}

/// Turns the current duplicate flags into blocking issues for saving.
pub fn duplicate_issues(store: &LineItemStore) -> Vec<ValidationIssue> {
    store
        .iter()
        .filter_map(|line| {
            line.duplicate.as_ref().map(|message| {
                ValidationIssue::line(line.id, IssueKind::DuplicateSupplierTag, message.clone())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use stockyard_core::{LineItem, NewLine};

    use super::*;
    use crate::store::LineEdit;

    fn tagged(code: &str) -> LineItem {
        LineItem::new(NewLine {
            supplier_tag_code: code.to_string(),
            weight: dec!(100),
            unit_price: dec!(10),
            ..NewLine::default()
        })
    }

    #[test]
    fn collisions_are_case_insensitive() {
        let mut store = LineItemStore::new();
        let a = store.insert(tagged("A1"));
        let b = store.insert(tagged(" a1 "));
        let c = store.insert(tagged("B7"));

        assert_eq!(flag_duplicates(&mut store), 2);
        assert!(store.get(a).unwrap().is_duplicate());
        assert!(store.get(b).unwrap().is_duplicate());
        assert!(!store.get(c).unwrap().is_duplicate());
        assert_eq!(duplicate_issues(&store).len(), 2);
    }

    #[test]
    fn blank_codes_never_collide() {
        let mut store = LineItemStore::new();
        store.insert(tagged(""));
        store.insert(tagged("   "));

        assert_eq!(flag_duplicates(&mut store), 0);
    }

    #[test]
    fn renaming_clears_both_flags() {
        let mut store = LineItemStore::new();
        let a = store.insert(tagged("A1"));
        let b = store.insert(tagged("A1"));
        flag_duplicates(&mut store);

        store
            .apply(b, LineEdit::SupplierTagCode("A2".to_string()))
            .unwrap();
        flag_duplicates(&mut store);

        assert!(!store.get(a).unwrap().is_duplicate());
        assert!(!store.get(b).unwrap().is_duplicate());
        assert!(duplicate_issues(&store).is_empty());
    }
}
