use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockyard_core::{
    AllocationMode, EngineError, EngineSettings, HeaderPayload, ItemId, LineItem,
    LineItemPayload, ModeResolution, NewLine, PurchaseHeader, RowState, ValidationIssue, Warning,
};
use stockyard_costing::{DocumentValuation, Overhead, apply_allocation, value_document};
use tracing::{debug, warn};

use crate::batch::{plan_batch, tag_prefix};
use crate::duplicates::flag_duplicates;
use crate::persist::PendingRemoval;
use crate::store::{LineEdit, LineItemStore};
use crate::sync::sync_header;
use crate::validate::validate_document;

/// A single-field change to the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum HeaderEdit {
    Nota(String),
    PurchaseDate(Option<NaiveDate>),
    SupplierId(Option<i64>),
    TruckCost(Decimal),
    OtherCost(Decimal),
    TotalWeight(Decimal),
    TotalPrice(Decimal),
    TotalCount(u32),
    TemplateWeight(Decimal),
    TemplateUnitPrice(Decimal),
    TemplateMarkup(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// The row was never persisted and is gone.
    Removed(LineItem),
    /// The row exists in the store; confirm to delete it there first.
    NeedsConfirmation(PendingRemoval),
}

/// One purchase document: header, rows, and the derived state kept
/// consistent between them.
///
/// Every mutation applies its change and then runs [`recompute_all`], so
/// reads always see totals and landed costs computed from the current rows.
///
/// [`recompute_all`]: PurchaseDocument::recompute_all
#[derive(Debug, Clone)]
pub struct PurchaseDocument {
    pub(crate) header: PurchaseHeader,
    mode: AllocationMode,
    mode_warning: Option<Warning>,
    pub(crate) lines: LineItemStore,
    settings: EngineSettings,
    warnings: Vec<Warning>,
}

impl PurchaseDocument {
    pub fn new(header: PurchaseHeader, resolution: ModeResolution, settings: EngineSettings) -> Self {
        Self::with_lines(header, resolution, settings, Vec::new())
    }

    /// Opens a document with rows loaded from the store.
    pub fn with_lines(
        header: PurchaseHeader,
        resolution: ModeResolution,
        settings: EngineSettings,
        lines: Vec<LineItem>,
    ) -> Self {
        let mut document = Self {
            header,
            mode: resolution.mode,
            mode_warning: resolution.warning,
            lines: LineItemStore::from_lines(lines),
            settings,
            warnings: Vec::new(),
        };
        document.recompute_all();
        document
    }

    pub fn header(&self) -> &PurchaseHeader {
        &self.header
    }

    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineItem> {
        self.lines.iter()
    }

    pub fn line(&self, id: ItemId) -> Option<&LineItem> {
        self.lines.get(id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Weight the overhead is currently spread over: the sum of every row's
    /// weight. Modes differ only in how the header and template are derived.
    pub fn allocation_base(&self) -> Decimal {
        self.lines.total_weight()
    }

    pub fn edit_header(&mut self, edit: HeaderEdit) {
        let header = &mut self.header;
        match edit {
            HeaderEdit::Nota(nota) => header.nota = nota,
            HeaderEdit::PurchaseDate(date) => header.purchase_date = date,
            HeaderEdit::SupplierId(supplier) => header.supplier_id = supplier,
            HeaderEdit::TruckCost(cost) => header.truck_cost = cost,
            HeaderEdit::OtherCost(cost) => header.other_cost = cost,
            HeaderEdit::TotalWeight(weight) => header.total_weight = weight,
            HeaderEdit::TotalPrice(price) => header.total_price = price,
            HeaderEdit::TotalCount(count) => header.total_count = count,
            HeaderEdit::TemplateWeight(weight) => header.template.weight = weight,
            HeaderEdit::TemplateUnitPrice(price) => header.template.unit_price = price,
            HeaderEdit::TemplateMarkup(markup) => header.template.markup_percent = markup,
        }
        self.recompute_all();
    }

    pub fn add_line(&mut self, input: NewLine) -> ItemId {
        let id = self.lines.insert(LineItem::new(input));
        self.recompute_all();
        id
    }

    /// Adds one row from the current template.
    pub fn add_from_template(&mut self) -> Result<ItemId, EngineError> {
        let ids = self.generate_batch(1)?;
        ids.into_iter()
            .next()
            .ok_or(EngineError::InvalidBatchCount)
    }

    /// Adds `count` rows from the current template in one step. Nothing is
    /// added when the count is rejected.
    pub fn generate_batch(&mut self, count: u32) -> Result<Vec<ItemId>, EngineError> {
        let plan = plan_batch(
            count,
            &self.header,
            self.lines.total_weight(),
            self.lines.next_seq(tag_prefix(&self.header)),
            &self.settings,
        )?;
        debug!(
            count,
            base_weight = %plan.base_weight,
            "adding generated batch"
        );

        let ids = self.lines.extend(plan.lines);
        self.recompute_all();
        Ok(ids)
    }

    pub fn edit_line(&mut self, id: ItemId, edit: LineEdit) -> Result<(), EngineError> {
        self.lines.apply(id, edit)?;
        self.recompute_all();
        Ok(())
    }

    /// Removes a row that was never persisted. Persisted rows are left in
    /// place and a [`PendingRemoval`] is returned for confirmation.
    pub fn remove_line(&mut self, id: ItemId) -> Result<Removal, EngineError> {
        let line = self.lines.get(id).ok_or(EngineError::UnknownItem(id))?;

        if let Some(detail_id) = line.state.persisted_id() {
            return Ok(Removal::NeedsConfirmation(PendingRemoval::new(id, detail_id)));
        }

        let removed = self.lines.remove(id).ok_or(EngineError::UnknownItem(id))?;
        self.recompute_all();
        Ok(Removal::Removed(removed))
    }

    /// Records the header id once the caller has resolved the parent document.
    pub fn attach_parent(&mut self, header_id: i64) {
        self.header.id = RowState::Persisted(header_id);
    }

    /// Re-derives everything that depends on other fields.
    ///
    /// Order matters: header sync may rewrite row weights and prices, and
    /// allocation must see the final weights.
    pub fn recompute_all(&mut self) {
        let mut warnings: Vec<Warning> = self.mode_warning.iter().cloned().collect();
        warnings.extend(sync_header(self.mode, &mut self.header, &mut self.lines));

        let base_weight = self.allocation_base();
        apply_allocation(
            self.lines.iter_mut(),
            base_weight,
            Overhead::from_header(&self.header),
        );
        let duplicates = flag_duplicates(&mut self.lines);

        for warning in warnings.iter().filter(|w| !self.warnings.contains(w)) {
            warn!(nota = %self.header.nota, "{warning}");
        }
        debug!(
            mode = %self.mode,
            lines = self.lines.len(),
            %base_weight,
            duplicates,
            "recomputed purchase document"
        );

        self.warnings = warnings;
    }

    pub fn validate(&self) -> Vec<ValidationIssue> {
        validate_document(self.mode, &self.header, &self.lines)
    }

    pub fn valuation(&self) -> DocumentValuation {
        let lines: Vec<&LineItem> = self.lines.iter().collect();
        value_document(&self.header, &lines, self.settings.price_scale)
    }

    pub fn header_payload(&self) -> HeaderPayload {
        let landed_total = self
            .lines
            .iter()
            .fold(Decimal::ZERO, |acc, line| acc.saturating_add(line.line_total()));
        HeaderPayload::from_header(&self.header, self.mode, landed_total, self.settings.price_scale)
    }

    pub fn line_payload(&self, id: ItemId) -> Result<LineItemPayload, EngineError> {
        let parent_id = self
            .header
            .id
            .persisted_id()
            .ok_or(EngineError::UnresolvedParent)?;
        let line = self.lines.get(id).ok_or(EngineError::UnknownItem(id))?;
        LineItemPayload::from_line(line, &self.header, parent_id, self.settings.price_scale)
    }
}
