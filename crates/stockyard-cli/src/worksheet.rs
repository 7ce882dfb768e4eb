use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;
use stockyard_core::{
    Classification, ClassificationRegistry, EngineSettings, ItemId, NewLine, PurchaseHeader,
};
use stockyard_worksheet::{HeaderEdit, LineEdit, PurchaseDocument, Removal};
use tracing::debug;

/// A purchase worksheet on disk: the header, the classification master
/// data it refers to, and the operator's edits in the order they were made.
#[derive(Debug, Clone, Deserialize)]
pub struct Worksheet {
    pub header: HeaderInput,
    #[serde(default)]
    pub classifications: Vec<Classification>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderInput {
    pub nota: String,
    pub office_id: i64,
    pub classification_id: i64,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub supplier_id: Option<i64>,
}

/// Line positions are zero-based and refer to the document as it stands
/// when the operation runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Header { edit: HeaderEdit },
    Add { line: NewLine },
    Template,
    Batch { count: u32 },
    Edit { index: usize, edit: LineEdit },
    Remove { index: usize },
}

impl Worksheet {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read worksheet {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid worksheet {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn replay(&self, settings: EngineSettings) -> Result<PurchaseDocument> {
        let registry = ClassificationRegistry::load(&self.classifications)
            .context("failed to load classifications")?;

        let mut header = PurchaseHeader::new(
            self.header.nota.clone(),
            self.header.office_id,
            self.header.classification_id,
        );
        header.purchase_date = self.header.purchase_date;
        header.supplier_id = self.header.supplier_id;

        let resolution = registry.resolve(header.classification_id);
        let mut document = PurchaseDocument::new(header, resolution, settings);

        for (step, operation) in self.operations.iter().enumerate() {
            apply(&mut document, operation.clone())
                .with_context(|| format!("operation {} ({operation:?}) failed", step + 1))?;
        }
        Ok(document)
    }
}

fn line_at(document: &PurchaseDocument, index: usize) -> Result<ItemId> {
    document
        .lines()
        .nth(index)
        .map(|line| line.id)
        .with_context(|| {
            format!(
                "no line at position {index}; the document has {} line(s)",
                document.len()
            )
        })
}

fn apply(document: &mut PurchaseDocument, operation: Operation) -> Result<()> {
    match operation {
        Operation::Header { edit } => document.edit_header(edit),
        Operation::Add { line } => {
            document.add_line(line);
        }
        Operation::Template => {
            document.add_from_template()?;
        }
        Operation::Batch { count } => {
            let ids = document.generate_batch(count)?;
            debug!(created = ids.len(), "batch generated");
        }
        Operation::Edit { index, edit } => {
            let id = line_at(document, index)?;
            document.edit_line(id, edit)?;
        }
        Operation::Remove { index } => {
            let id = line_at(document, index)?;
            if let Removal::NeedsConfirmation(pending) = document.remove_line(id)? {
                bail!(
                    "line {} is stored as detail {}; its removal must be confirmed against the store",
                    pending.item(),
                    pending.detail_id()
                );
            }
        }
    }
    Ok(())
}
