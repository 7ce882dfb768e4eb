use async_trait::async_trait;

use crate::payloads::{HeaderPayload, LineItemPayload};

/// Persistence boundary for purchase documents. Errors are shown to the
/// operator as-is, so implementations should return readable messages.
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    async fn create_header(&self, header: &HeaderPayload) -> anyhow::Result<i64>;
    async fn update_header(&self, header_id: i64, header: &HeaderPayload) -> anyhow::Result<()>;
    /// Most recently created header, for callers resolving a detached line's parent.
    async fn latest_header_id(&self) -> anyhow::Result<Option<i64>>;
    async fn create_line(&self, line: &LineItemPayload) -> anyhow::Result<i64>;
    async fn update_line(&self, detail_id: i64, line: &LineItemPayload) -> anyhow::Result<()>;
    async fn delete_line(&self, detail_id: i64) -> anyhow::Result<()>;
}
