pub mod allocation;
pub mod derivation;
pub mod valuation;

pub use allocation::{Overhead, apply_allocation, landed_unit_cost, markup_factor, total_weight};
pub use derivation::{DerivedDefaults, derive_by_count, derive_by_weight, derive_defaults};
pub use valuation::{DocumentValuation, OverheadShare, overhead_shares, value_document};
