use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockyard_core::{ItemId, LineItem, PurchaseHeader};

use crate::allocation::{Overhead, total_weight};

/// Part of the overhead carried by one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverheadShare {
    pub item: ItemId,
    pub amount: Decimal,
}

/// Splits the overhead across lines by weight, rounded to `scale`. The last
/// line takes the rounding remainder so the shares add up to the overhead.
/// Without any weight the overhead is split evenly per head.
pub fn overhead_shares(lines: &[&LineItem], overhead: Decimal, scale: u32) -> Vec<OverheadShare> {
    if lines.is_empty() || overhead <= Decimal::ZERO {
        return lines
            .iter()
            .map(|line| OverheadShare {
                item: line.id,
                amount: Decimal::ZERO,
            })
            .collect();
    }

    let overhead = overhead.round_dp(scale);
    let weight = total_weight(lines.iter().copied());
    let count = Decimal::from(lines.len() as u64);
    let mut remaining = overhead;
    let mut shares = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let amount = if idx == lines.len() - 1 {
            remaining
        } else {
            let provisional = if weight > Decimal::ZERO {
                (line.weight / weight).saturating_mul(overhead).round_dp(scale)
            } else {
                (overhead / count).round_dp(scale)
            };
            remaining = remaining.saturating_sub(provisional);
            provisional
        };
        shares.push(OverheadShare {
            item: line.id,
            amount,
        });
    }

    shares
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentValuation {
    pub line_count: usize,
    pub total_weight: Decimal,
    /// Sum of weight times unit price, before overhead and markup.
    pub purchase_total: Decimal,
    pub overhead: Decimal,
    /// Sum of weight times landed unit cost.
    pub landed_total: Decimal,
    pub average_landed_per_kg: Decimal,
    pub shares: Vec<OverheadShare>,
}

pub fn value_document(
    header: &PurchaseHeader,
    lines: &[&LineItem],
    scale: u32,
) -> DocumentValuation {
    let weight = total_weight(lines.iter().copied());
    let purchase_total = lines.iter().fold(Decimal::ZERO, |acc, line| {
        acc.saturating_add(line.weight.saturating_mul(line.unit_price))
    });
    let landed_total = lines
        .iter()
        .fold(Decimal::ZERO, |acc, line| acc.saturating_add(line.line_total()));
    let overhead = Overhead::from_header(header).total();

    let average_landed_per_kg = if weight.is_zero() {
        Decimal::ZERO
    } else {
        landed_total
            .checked_div(weight)
            .unwrap_or(Decimal::MAX)
            .round_dp(scale)
    };

    DocumentValuation {
        line_count: lines.len(),
        total_weight: weight,
        purchase_total: purchase_total.round_dp(scale),
        overhead: overhead.round_dp(scale),
        landed_total: landed_total.round_dp(scale),
        average_landed_per_kg,
        shares: overhead_shares(lines, overhead, scale),
    }
}
