use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockyard_core::{
    AllocationMode, EngineError, EngineSettings, IssueKind, ModeResolution, NewLine,
    PurchaseHeader, PurchaseStore, RowState,
};
use stockyard_memstore::{InMemoryPurchaseStore, StoreOp};
use stockyard_worksheet::{HeaderEdit, LineEdit, PurchaseDocument, Removal};

fn standard_document() -> PurchaseDocument {
    let mut document = PurchaseDocument::new(
        PurchaseHeader::new("NT-2024-118", 3, 9),
        ModeResolution::explicit(AllocationMode::Standard),
        EngineSettings::default(),
    );
    document.edit_header(HeaderEdit::TruckCost(dec!(300)));
    document.edit_header(HeaderEdit::TemplateWeight(dec!(100)));
    document.edit_header(HeaderEdit::TemplateUnitPrice(dec!(10)));
    document
}

fn tagged(weight: Decimal, supplier_tag_code: &str) -> NewLine {
    NewLine {
        tag_code: format!("S-{supplier_tag_code}"),
        supplier_tag_code: supplier_tag_code.to_string(),
        classification_id: None,
        weight,
        unit_price: dec!(10),
        markup_percent: Decimal::ZERO,
    }
}

#[tokio::test]
async fn save_creates_then_updates() {
    let store = InMemoryPurchaseStore::new();
    let mut document = standard_document();
    document.generate_batch(2).unwrap();
    document.add_line(tagged(dec!(100), "A9"));

    let report = document.save(&store).await.unwrap();
    assert!(report.header_created);
    assert_eq!(report.lines_created, 3);
    assert_eq!(report.lines_updated, 0);
    assert!(document.lines().all(|line| line.state.is_persisted()));

    let stored = store.lines_for(report.header_id).await;
    assert_eq!(stored.len(), 3);
    // (300 + 10 * 300) / 300
    assert!(stored.iter().all(|(_, line)| line.landed_unit_cost == dec!(11)));
    assert!(stored.iter().all(|(_, line)| line.total_price == dec!(1100)));

    let header = store.header(report.header_id).await.unwrap();
    assert_eq!(header.total_weight, dec!(300));
    assert_eq!(header.total_count, 3);
    assert_eq!(header.landed_total, dec!(3300));

    let second = document.save(&store).await.unwrap();
    assert!(!second.header_created);
    assert_eq!(second.header_id, report.header_id);
    assert_eq!(second.lines_created, 0);
    assert_eq!(second.lines_updated, 3);
}

#[tokio::test]
async fn duplicates_block_the_save() {
    let store = InMemoryPurchaseStore::new();
    let mut document = standard_document();
    document.add_line(tagged(dec!(100), "A1"));
    let second = document.add_line(tagged(dec!(120), "a1"));

    let err = document.save(&store).await.unwrap_err();
    let duplicates = err
        .issues()
        .iter()
        .filter(|issue| issue.kind == IssueKind::DuplicateSupplierTag)
        .count();
    assert_eq!(duplicates, 2);
    assert_eq!(store.latest_header_id().await.unwrap(), None);

    document
        .edit_line(second, LineEdit::SupplierTagCode("A2".to_string()))
        .unwrap();
    assert!(document.save(&store).await.is_ok());
}

#[tokio::test]
async fn failed_line_create_keeps_rows_new() {
    let store = InMemoryPurchaseStore::new();
    let mut document = standard_document();
    let id = document.add_line(tagged(dec!(100), "B1"));
    store.fail_next(StoreOp::CreateLine, "connection reset").await;

    let err = document.save(&store).await.unwrap_err();

    assert_eq!(err, EngineError::Persistence("connection reset".to_string()));
    assert_eq!(document.line(id).unwrap().state, RowState::New);
    assert!(document.header().id.is_persisted());

    let report = document.save(&store).await.unwrap();
    assert!(!report.header_created);
    assert_eq!(report.lines_created, 1);
}

#[tokio::test]
async fn persisted_rows_are_deleted_only_after_confirmation() {
    let store = InMemoryPurchaseStore::new();
    let mut document = standard_document();
    let keep = document.add_line(tagged(dec!(100), "C1"));
    let gone = document.add_line(tagged(dec!(200), "C2"));
    document.save(&store).await.unwrap();
    let Some(detail_id) = document.line(gone).unwrap().state.persisted_id() else {
        panic!("line was not persisted");
    };

    let Removal::NeedsConfirmation(pending) = document.remove_line(gone).unwrap() else {
        panic!("persisted line removed without confirmation");
    };
    assert_eq!(document.len(), 2);

    store.fail_next(StoreOp::DeleteLine, "line is referenced by a sale").await;
    let err = document.confirm_removal(pending, &store).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Persistence("line is referenced by a sale".to_string())
    );
    assert_eq!(document.len(), 2);
    assert!(store.line(detail_id).await.is_some());

    document.confirm_removal(pending, &store).await.unwrap();
    assert_eq!(document.len(), 1);
    assert!(store.line(detail_id).await.is_none());
    assert_eq!(document.header().total_weight, dec!(100));
    // (300 + 10 * 100) / 100
    assert_eq!(document.line(keep).unwrap().landed_unit_cost, dec!(13));
}

#[tokio::test]
async fn new_rows_are_removed_locally() {
    let mut document = standard_document();
    let id = document.add_line(tagged(dec!(100), "D1"));

    let removal = document.remove_line(id).unwrap();

    assert!(matches!(removal, Removal::Removed(line) if line.id == id));
    assert!(document.is_empty());
    assert_eq!(document.header().total_weight, Decimal::ZERO);
}

#[tokio::test]
async fn single_line_save_needs_resolved_parent() {
    let store = InMemoryPurchaseStore::new();
    let mut document = standard_document();
    let id = document.add_line(tagged(dec!(100), "E1"));

    assert_eq!(
        document.save_line(id, &store).await,
        Err(EngineError::UnresolvedParent)
    );

    let mut other = standard_document();
    other.add_line(tagged(dec!(50), "E2"));
    let header_id = other.save(&store).await.unwrap().header_id;

    let resolved = store.latest_header_id().await.unwrap().unwrap();
    assert_eq!(resolved, header_id);
    document.attach_parent(resolved);

    let state = document.save_line(id, &store).await.unwrap();
    let RowState::Persisted(detail_id) = state else {
        panic!("line was not persisted");
    };
    assert_eq!(store.line(detail_id).await.unwrap().parent_id, header_id);
}

#[tokio::test]
async fn derived_by_weight_document_round_trip() {
    let store = InMemoryPurchaseStore::new();
    let mut document = PurchaseDocument::new(
        PurchaseHeader::new("NT-2024-200", 3, 11),
        ModeResolution::explicit(AllocationMode::DerivedByWeight),
        EngineSettings::default(),
    );
    document.edit_header(HeaderEdit::TotalWeight(dec!(1000)));
    document.edit_header(HeaderEdit::TotalCount(10));
    document.edit_header(HeaderEdit::TotalPrice(dec!(50000)));
    document.edit_header(HeaderEdit::OtherCost(dec!(1000)));
    document.generate_batch(10).unwrap();

    assert_eq!(document.header().template.weight, dec!(100));
    assert_eq!(document.header().template.unit_price, dec!(50));
    // (1000 + 50 * 1000) / 1000
    assert!(document.lines().all(|line| line.landed_unit_cost == dec!(51)));

    document.edit_header(HeaderEdit::TotalCount(20));
    assert_eq!(document.header().template.weight, dec!(50));
    assert!(document.lines().all(|line| line.weight == dec!(50)));

    let report = document.save(&store).await.unwrap();
    let header = store.header(report.header_id).await.unwrap();
    assert_eq!(header.allocation_mode, AllocationMode::DerivedByWeight);
    assert_eq!(header.total_weight, dec!(1000));
    assert_eq!(header.total_count, 20);
}
