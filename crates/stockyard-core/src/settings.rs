use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_BATCH_SIZE: u32 = 500;
pub const DEFAULT_PRICE_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Upper bound on rows created by one batch generation.
    pub max_batch_size: u32,
    /// Decimal places kept on money amounts sent to the store.
    pub price_scale: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            price_scale: DEFAULT_PRICE_SCALE,
        }
    }
}
