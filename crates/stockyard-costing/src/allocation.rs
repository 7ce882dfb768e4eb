use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockyard_core::{LineItem, PurchaseHeader};

/// Shared costs carried by the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Overhead {
    pub truck_cost: Decimal,
    pub other_cost: Decimal,
}

impl Overhead {
    pub fn from_header(header: &PurchaseHeader) -> Self {
        Self {
            truck_cost: header.truck_cost,
            other_cost: header.other_cost,
        }
    }

    pub fn total(&self) -> Decimal {
        self.truck_cost.saturating_add(self.other_cost)
    }
}

pub fn markup_factor(markup_percent: Decimal) -> Decimal {
    Decimal::ONE.saturating_add(markup_percent / Decimal::ONE_HUNDRED)
}

/// Landed cost per kg: unit price plus the per-kg share of overhead, marked up.
///
/// With no weight to spread overhead over, the overhead is ignored and only
/// the markup applies. Results that do not fit a `Decimal` saturate; save
/// validation rejects such rows.
pub fn landed_unit_cost(
    unit_price: Decimal,
    markup_percent: Decimal,
    base_weight: Decimal,
    overhead: Overhead,
) -> Decimal {
    let factor = markup_factor(markup_percent);
    if base_weight <= Decimal::ZERO {
        return unit_price.saturating_mul(factor);
    }

    let overhead_per_kg = overhead
        .total()
        .checked_div(base_weight)
        .unwrap_or(Decimal::MAX);
    unit_price.saturating_add(overhead_per_kg).saturating_mul(factor)
}

/// Weight the overhead is spread over: every row in the document, whatever
/// the allocation mode.
pub fn total_weight<'a>(lines: impl IntoIterator<Item = &'a LineItem>) -> Decimal {
    lines
        .into_iter()
        .fold(Decimal::ZERO, |acc, line| acc.saturating_add(line.weight))
}

/// Rewrites the landed cost of every line against one shared base.
pub fn apply_allocation<'a>(
    lines: impl IntoIterator<Item = &'a mut LineItem>,
    base_weight: Decimal,
    overhead: Overhead,
) {
    for line in lines {
        line.landed_unit_cost =
            landed_unit_cost(line.unit_price, line.markup_percent, base_weight, overhead);
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use stockyard_core::NewLine;

    use super::*;

    fn line(weight: Decimal, unit_price: Decimal, markup_percent: Decimal) -> LineItem {
        LineItem::new(NewLine {
            weight,
            unit_price,
            markup_percent,
            ..NewLine::default()
        })
    }

    fn truck(cost: Decimal) -> Overhead {
        Overhead {
            truck_cost: cost,
            other_cost: Decimal::ZERO,
        }
    }

    #[test]
    fn overhead_is_spread_per_kg() {
        let mut lines = vec![
            line(dec!(100), dec!(10), Decimal::ZERO),
            line(dec!(200), dec!(10), Decimal::ZERO),
        ];
        let base = total_weight(&lines);
        apply_allocation(&mut lines, base, truck(dec!(300)));

        assert_eq!(base, dec!(300));
        assert!(lines.iter().all(|l| l.landed_unit_cost == dec!(11)));
    }

    #[test]
    fn markup_applies_after_overhead() {
        let landed = landed_unit_cost(dec!(10), dec!(10), dec!(300), truck(dec!(300)));
        assert_eq!(landed, dec!(12.1));
    }

    #[test]
    fn zero_weight_skips_overhead() {
        let landed = landed_unit_cost(dec!(10), dec!(10), Decimal::ZERO, truck(dec!(300)));
        assert_eq!(landed, dec!(11));
    }

    #[test]
    fn other_cost_counts_as_overhead() {
        let overhead = Overhead {
            truck_cost: dec!(150),
            other_cost: dec!(150),
        };
        assert_eq!(overhead.total(), dec!(300));
        assert_eq!(
            landed_unit_cost(dec!(10), Decimal::ZERO, dec!(300), overhead),
            dec!(11)
        );
    }

    #[test]
    fn landed_never_below_unit_price_with_non_negative_markup() {
        for markup in [dec!(0), dec!(2.5), dec!(100)] {
            for weight in [dec!(0.5), dec!(1), dec!(480), dec!(12000)] {
                let landed = landed_unit_cost(dec!(51500), markup, weight, truck(dec!(1750000)));
                assert!(landed >= dec!(51500), "markup {markup} weight {weight}");
            }
        }
    }

    #[test]
    fn overhead_is_recovered_exactly() {
        let mut lines = vec![
            line(dec!(450), dec!(10), Decimal::ZERO),
            line(dec!(150), dec!(12), Decimal::ZERO),
        ];
        let overhead = Overhead {
            truck_cost: dec!(240),
            other_cost: dec!(60),
        };
        let base = total_weight(&lines);
        apply_allocation(&mut lines, base, overhead);

        let recovered: Decimal = lines
            .iter()
            .map(|l| l.weight * (l.landed_unit_cost - l.unit_price))
            .sum();
        assert_eq!(recovered, dec!(300));
    }

    #[test]
    fn huge_values_saturate_instead_of_panicking() {
        let landed = landed_unit_cost(
            dec!(1000000000000000),
            Decimal::ZERO,
            dec!(100000000000000),
            truck(dec!(300)),
        );
        assert!(landed >= dec!(1000000000000000));

        let tiny_base = landed_unit_cost(
            dec!(10),
            Decimal::ZERO,
            dec!(0.0000000000000000000000000001),
            truck(Decimal::MAX),
        );
        assert_eq!(tiny_base, Decimal::MAX);
    }
}
