use stockyard_core::{AllocationMode, PurchaseHeader, Warning};
use stockyard_costing::derive_defaults;

use crate::store::LineItemStore;

/// Brings header totals and the default template in line with the mode.
///
/// Standard: header weight and head count follow the rows, total price is
/// left to the operator. Derived modes: the template is re-seeded from the
/// header totals and pushed into every row still following it.
///
/// Returns warnings for defaults that came out as zero.
pub fn sync_header(
    mode: AllocationMode,
    header: &mut PurchaseHeader,
    store: &mut LineItemStore,
) -> Vec<Warning> {
    let Some(defaults) = derive_defaults(mode, header) else {
        header.total_weight = store.total_weight();
        header.total_count = u32::try_from(store.len()).unwrap_or(u32::MAX);
        return Vec::new();
    };

    if let Some(total_weight) = defaults.total_weight {
        header.total_weight = total_weight;
    }
    header.template.weight = defaults.template_weight;
    header.template.unit_price = defaults.template_unit_price;

    propagate_template(header, store);

    defaults
        .zeroed
        .into_iter()
        .map(|field| Warning::DerivedDefaultZero { field })
        .collect()
}

/// Copies template weight and unit price into rows that follow the template.
/// Returns the number of rows that changed.
pub fn propagate_template(header: &PurchaseHeader, store: &mut LineItemStore) -> usize {
    let weight = header.template.weight;
    let unit_price = header.template.unit_price;
    let mut changed = 0;

    for line in store.iter_mut().filter(|line| line.follows_template) {
        if line.weight != weight || line.unit_price != unit_price {
            line.weight = weight;
            line.unit_price = unit_price;
            changed += 1;
        }
    }

    changed
}
