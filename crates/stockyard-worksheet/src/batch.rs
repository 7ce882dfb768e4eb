use rust_decimal::Decimal;
use stockyard_core::{EngineError, EngineSettings, LineItem, PurchaseHeader};
use stockyard_costing::{Overhead, apply_allocation};

/// Rows produced by one batch generation, costed against the combined
/// weight of the existing rows and the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub lines: Vec<LineItem>,
    pub base_weight: Decimal,
}

/// Prefix of generated tag codes: the nota, or `ITEM` while it is blank.
pub fn tag_prefix(header: &PurchaseHeader) -> &str {
    let nota = header.nota.trim();
    if nota.is_empty() { "ITEM" } else { nota }
}

/// Builds `count` rows from the header template.
///
/// The batch weight is added to the allocation base before any row is
/// costed, so every row carries the same overhead per kg.
pub fn plan_batch(
    count: u32,
    header: &PurchaseHeader,
    existing_weight: Decimal,
    first_seq: u32,
    settings: &EngineSettings,
) -> Result<BatchPlan, EngineError> {
    if count < 1 {
        return Err(EngineError::InvalidBatchCount);
    }
    if count > settings.max_batch_size {
        return Err(EngineError::BatchTooLarge {
            requested: count,
            limit: settings.max_batch_size,
        });
    }

    let prefix = tag_prefix(header);
    let mut lines: Vec<LineItem> = (0..count)
        .map(|offset| {
            LineItem::from_template(
                &header.template,
                format!("{prefix}-{:03}", first_seq.saturating_add(offset)),
            )
        })
        .collect();

    let batch_weight = header.template.weight.saturating_mul(Decimal::from(count));
    let base_weight = existing_weight.saturating_add(batch_weight);
    apply_allocation(&mut lines, base_weight, Overhead::from_header(header));

    Ok(BatchPlan { lines, base_weight })
}
