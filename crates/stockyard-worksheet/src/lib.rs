pub mod batch;
pub mod document;
pub mod duplicates;
pub mod persist;
pub mod store;
pub mod sync;
pub mod validate;

pub use batch::{BatchPlan, plan_batch};
pub use document::{HeaderEdit, PurchaseDocument, Removal};
pub use persist::{PendingRemoval, SaveReport};
pub use store::{LineEdit, LineItemStore};
