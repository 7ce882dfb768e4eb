use rust_decimal::Decimal;
use stockyard_core::{AllocationMode, DerivedField, PurchaseHeader};

/// Defaults computed from header totals in the derived modes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivedDefaults {
    /// Header weight to write back, when the mode owns it.
    pub total_weight: Option<Decimal>,
    pub template_weight: Decimal,
    pub template_unit_price: Decimal,
    /// Fields that came out as zero because of a zero divisor or zero input.
    pub zeroed: Vec<DerivedField>,
}

/// `None` for a zero divisor or a quotient too large to represent.
fn guarded_div(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator.checked_div(denominator)
}

/// Head count times per-animal weight gives the header weight; price per kg
/// follows from it.
pub fn derive_by_count(
    total_count: u32,
    per_animal_weight: Decimal,
    total_price: Decimal,
) -> DerivedDefaults {
    let mut zeroed = Vec::new();
    let total_weight = Decimal::from(total_count).saturating_mul(per_animal_weight);
    if total_weight.is_zero() {
        zeroed.push(DerivedField::TotalWeight);
    }

    let template_unit_price = guarded_div(total_price, total_weight).unwrap_or_else(|| {
        zeroed.push(DerivedField::TemplateUnitPrice);
        Decimal::ZERO
    });

    DerivedDefaults {
        total_weight: Some(total_weight),
        template_weight: per_animal_weight,
        template_unit_price,
        zeroed,
    }
}

/// Per-animal weight and price per kg both come from the header totals.
pub fn derive_by_weight(
    total_weight: Decimal,
    total_count: u32,
    total_price: Decimal,
) -> DerivedDefaults {
    let mut zeroed = Vec::new();

    let template_weight =
        guarded_div(total_weight, Decimal::from(total_count)).unwrap_or_else(|| {
            zeroed.push(DerivedField::TemplateWeight);
            Decimal::ZERO
        });
    let template_unit_price = guarded_div(total_price, total_weight).unwrap_or_else(|| {
        zeroed.push(DerivedField::TemplateUnitPrice);
        Decimal::ZERO
    });

    DerivedDefaults {
        total_weight: None,
        template_weight,
        template_unit_price,
        zeroed,
    }
}

/// `None` in standard mode, where the header follows the rows instead.
pub fn derive_defaults(mode: AllocationMode, header: &PurchaseHeader) -> Option<DerivedDefaults> {
    match mode {
        AllocationMode::Standard => None,
        AllocationMode::DerivedByCount => Some(derive_by_count(
            header.total_count,
            header.template.weight,
            header.total_price,
        )),
        AllocationMode::DerivedByWeight => Some(derive_by_weight(
            header.total_weight,
            header.total_count,
            header.total_price,
        )),
    }
}
