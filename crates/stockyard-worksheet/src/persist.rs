use serde::{Deserialize, Serialize};
use stockyard_core::{EngineError, IssueKind, ItemId, PurchaseStore, RowState, ValidationIssue};
use tracing::{error, info};

use crate::document::PurchaseDocument;
use crate::validate::validate_line;

/// Removal of a persisted row, waiting for the operator to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRemoval {
    item: ItemId,
    detail_id: i64,
}

impl PendingRemoval {
    pub(crate) fn new(item: ItemId, detail_id: i64) -> Self {
        Self { item, detail_id }
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn detail_id(&self) -> i64 {
        self.detail_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    pub header_id: i64,
    pub header_created: bool,
    pub lines_created: usize,
    pub lines_updated: usize,
}

fn persistence_error(err: anyhow::Error) -> EngineError {
    EngineError::Persistence(format!("{err:#}"))
}

impl PurchaseDocument {
    /// Validates and writes the header and every row.
    ///
    /// Rows are written in entry order. If the store fails part way, rows
    /// already written keep their new ids and the rest stay `New`, so the
    /// save can simply be retried.
    pub async fn save<S>(&mut self, store: &S) -> Result<SaveReport, EngineError>
    where
        S: PurchaseStore + ?Sized,
    {
        let issues = self.validate();
        if !issues.is_empty() {
            return Err(EngineError::Validation(issues));
        }

        let payload = self.header_payload();
        let (header_id, header_created) = match self.header.id {
            RowState::Persisted(header_id) => {
                store
                    .update_header(header_id, &payload)
                    .await
                    .map_err(persistence_error)?;
                (header_id, false)
            }
            RowState::New => {
                let header_id = store
                    .create_header(&payload)
                    .await
                    .map_err(persistence_error)?;
                self.header.id = RowState::Persisted(header_id);
                (header_id, true)
            }
        };

        let mut report = SaveReport {
            header_id,
            header_created,
            ..SaveReport::default()
        };

        for id in self.lines.ids() {
            if self.write_line(id, store).await? {
                report.lines_created += 1;
            } else {
                report.lines_updated += 1;
            }
        }

        info!(
            nota = %self.header.nota,
            header_id = report.header_id,
            created = report.lines_created,
            updated = report.lines_updated,
            "purchase document saved"
        );
        Ok(report)
    }

    /// Writes one row. The header must already have a persisted id.
    pub async fn save_line<S>(&mut self, id: ItemId, store: &S) -> Result<RowState, EngineError>
    where
        S: PurchaseStore + ?Sized,
    {
        let line = self.lines.get(id).ok_or(EngineError::UnknownItem(id))?;
        let mut issues: Vec<ValidationIssue> = validate_line(line);
        if let Some(message) = &line.duplicate {
            issues.push(ValidationIssue::line(
                id,
                IssueKind::DuplicateSupplierTag,
                message.clone(),
            ));
        }
        if !issues.is_empty() {
            return Err(EngineError::Validation(issues));
        }

        self.write_line(id, store).await?;
        self.lines
            .get(id)
            .map(|line| line.state)
            .ok_or(EngineError::UnknownItem(id))
    }

    /// Returns true when the row was created rather than updated.
    async fn write_line<S>(&mut self, id: ItemId, store: &S) -> Result<bool, EngineError>
    where
        S: PurchaseStore + ?Sized,
    {
        let payload = self.line_payload(id)?;
        let state = self
            .lines
            .get(id)
            .map(|line| line.state)
            .ok_or(EngineError::UnknownItem(id))?;

        match state {
            RowState::Persisted(detail_id) => {
                store
                    .update_line(detail_id, &payload)
                    .await
                    .map_err(|err| {
                        error!(detail_id, "failed to update line: {err:#}");
                        persistence_error(err)
                    })?;
                Ok(false)
            }
            RowState::New => {
                let detail_id = store.create_line(&payload).await.map_err(|err| {
                    error!(item = %id, "failed to create line: {err:#}");
                    persistence_error(err)
                })?;
                if let Some(line) = self.lines.get_mut(id) {
                    line.state = RowState::Persisted(detail_id);
                }
                Ok(true)
            }
        }
    }

    /// Deletes a persisted row in the store, then locally. On failure the
    /// row stays where it was.
    pub async fn confirm_removal<S>(
        &mut self,
        pending: PendingRemoval,
        store: &S,
    ) -> Result<(), EngineError>
    where
        S: PurchaseStore + ?Sized,
    {
        let line = self
            .lines
            .get(pending.item)
            .ok_or(EngineError::UnknownItem(pending.item))?;
        if line.state != RowState::Persisted(pending.detail_id) {
            return Err(EngineError::StaleRemoval(pending.item));
        }

        store.delete_line(pending.detail_id).await.map_err(|err| {
            error!(detail_id = pending.detail_id, "failed to delete line: {err:#}");
            persistence_error(err)
        })?;

        self.lines.remove(pending.item);
        self.recompute_all();
        info!(detail_id = pending.detail_id, "line deleted");
        Ok(())
    }
}
