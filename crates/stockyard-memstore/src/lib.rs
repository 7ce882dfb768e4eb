use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, bail};
use async_trait::async_trait;
use stockyard_core::{HeaderPayload, LineItemPayload, PurchaseStore};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CreateHeader,
    UpdateHeader,
    CreateLine,
    UpdateLine,
    DeleteLine,
}

/// `PurchaseStore` kept in process memory. Ids come from one shared,
/// increasing sequence. Failures can be queued per operation to exercise
/// error paths.
#[derive(Default)]
pub struct InMemoryPurchaseStore {
    headers: RwLock<BTreeMap<i64, HeaderPayload>>,
    lines: RwLock<BTreeMap<i64, LineItemPayload>>,
    sequence: RwLock<i64>,
    failures: RwLock<HashMap<StoreOp, String>>,
}

impl InMemoryPurchaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `op` fail with `message`.
    pub async fn fail_next(&self, op: StoreOp, message: impl Into<String>) {
        self.failures.write().await.insert(op, message.into());
    }

    pub async fn header(&self, header_id: i64) -> Option<HeaderPayload> {
        self.headers.read().await.get(&header_id).cloned()
    }

    pub async fn line(&self, detail_id: i64) -> Option<LineItemPayload> {
        self.lines.read().await.get(&detail_id).cloned()
    }

    pub async fn lines_for(&self, header_id: i64) -> Vec<(i64, LineItemPayload)> {
        self.lines
            .read()
            .await
            .iter()
            .filter(|(_, line)| line.parent_id == header_id)
            .map(|(id, line)| (*id, line.clone()))
            .collect()
    }

    async fn check(&self, op: StoreOp) -> anyhow::Result<()> {
        if let Some(message) = self.failures.write().await.remove(&op) {
            bail!(message);
        }
        Ok(())
    }

    async fn next_id(&self) -> i64 {
        let mut sequence_guard = self.sequence.write().await;
        *sequence_guard += 1;
        *sequence_guard
    }
}

#[async_trait]
impl PurchaseStore for InMemoryPurchaseStore {
    async fn create_header(&self, header: &HeaderPayload) -> anyhow::Result<i64> {
        self.check(StoreOp::CreateHeader).await?;
        let header_id = self.next_id().await;
        self.headers.write().await.insert(header_id, header.clone());
        debug!(header_id, nota = %header.nota, "header created");
        Ok(header_id)
    }

    async fn update_header(&self, header_id: i64, header: &HeaderPayload) -> anyhow::Result<()> {
        self.check(StoreOp::UpdateHeader).await?;
        let mut headers = self.headers.write().await;
        let stored = headers
            .get_mut(&header_id)
            .with_context(|| format!("purchase header {header_id} does not exist"))?;
        *stored = header.clone();
        Ok(())
    }

    async fn latest_header_id(&self) -> anyhow::Result<Option<i64>> {
        Ok(self.headers.read().await.keys().next_back().copied())
    }

    async fn create_line(&self, line: &LineItemPayload) -> anyhow::Result<i64> {
        self.check(StoreOp::CreateLine).await?;
        if !self.headers.read().await.contains_key(&line.parent_id) {
            bail!("purchase header {} does not exist", line.parent_id);
        }
        let detail_id = self.next_id().await;
        self.lines.write().await.insert(detail_id, line.clone());
        Ok(detail_id)
    }

    async fn update_line(&self, detail_id: i64, line: &LineItemPayload) -> anyhow::Result<()> {
        self.check(StoreOp::UpdateLine).await?;
        let mut lines = self.lines.write().await;
        let stored = lines
            .get_mut(&detail_id)
            .with_context(|| format!("purchase line {detail_id} does not exist"))?;
        *stored = line.clone();
        Ok(())
    }

    async fn delete_line(&self, detail_id: i64) -> anyhow::Result<()> {
        self.check(StoreOp::DeleteLine).await?;
        self.lines
            .write()
            .await
            .remove(&detail_id)
            .map(|_| ())
            .with_context(|| format!("purchase line {detail_id} does not exist"))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use stockyard_core::AllocationMode;

    use super::*;

    fn header_payload() -> HeaderPayload {
        HeaderPayload {
            nota: "NT-1".to_string(),
            purchase_date: None,
            supplier_id: Some(3),
            office_id: 1,
            classification_id: 2,
            allocation_mode: AllocationMode::Standard,
            truck_cost: Decimal::ZERO,
            other_cost: Decimal::ZERO,
            total_weight: Decimal::ZERO,
            total_price: Decimal::ZERO,
            total_count: 0,
            landed_total: Decimal::ZERO,
        }
    }

    fn line_payload(parent_id: i64) -> LineItemPayload {
        LineItemPayload {
            parent_id,
            office_id: 1,
            tag_code: "T-1".to_string(),
            supplier_tag_code: String::new(),
            classification_id: 2,
            unit_price: Decimal::TEN,
            weight: 100,
            markup_percent: Decimal::ZERO,
            landed_unit_cost: Decimal::TEN,
            total_price: Decimal::ONE_THOUSAND,
        }
    }

    #[tokio::test]
    async fn ids_increase_across_headers_and_lines() {
        let store = InMemoryPurchaseStore::new();
        let header_id = store.create_header(&header_payload()).await.unwrap();
        let first = store.create_line(&line_payload(header_id)).await.unwrap();
        let second = store.create_line(&line_payload(header_id)).await.unwrap();

        assert!(header_id < first && first < second);
        assert_eq!(store.lines_for(header_id).await.len(), 2);
        assert_eq!(store.latest_header_id().await.unwrap(), Some(header_id));
    }

    #[tokio::test]
    async fn lines_need_an_existing_parent() {
        let store = InMemoryPurchaseStore::new();
        let err = store.create_line(&line_payload(42)).await.unwrap_err();
        assert_eq!(err.to_string(), "purchase header 42 does not exist");
    }

    #[tokio::test]
    async fn queued_failure_fires_once() {
        let store = InMemoryPurchaseStore::new();
        store.fail_next(StoreOp::CreateHeader, "disk full").await;

        let err = store.create_header(&header_payload()).await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(store.create_header(&header_payload()).await.is_ok());
    }

    #[tokio::test]
    async fn deleting_missing_line_fails() {
        let store = InMemoryPurchaseStore::new();
        assert!(store.delete_line(5).await.is_err());
    }
}
