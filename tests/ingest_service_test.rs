//! Tests for IngestService and OfferAssembler

use std::sync::Arc;

use rstest::rstest;

use feedcat::application::services::{
    AssemblyOutcome, IngestReport, OfferAssembler, UnknownCategoryPolicy,
};
use feedcat::application::ApplicationError;
use feedcat::config::Settings;
use feedcat::domain::{
    CategoryTreeBuilder, DomainError, FieldMapping, OfferClassifier, OfferField, RawCategory,
    RawOffer, ShallowPolicy,
};
use feedcat::infrastructure::di::ServiceContainer;
use feedcat::infrastructure::traits::{JsonLinesSink, MemoryFeed, MemorySink};
use feedcat::util::testing::{init_test_setup, raw_offer, sample_categories};

fn settings(shallow: ShallowPolicy, unknown: UnknownCategoryPolicy) -> Settings {
    let mut settings = Settings {
        marketplace_id: Some(7),
        ..Settings::default()
    };
    settings.classification.shallow_categories = shallow;
    settings.classification.unknown_category = unknown;
    settings
}

fn offers() -> Vec<RawOffer> {
    vec![
        raw_offer("p1", "12", &[("name", "Doll"), ("price", "990"), ("oldprice", "1200")]),
        raw_offer("p2", "24", &[("name", "Sconce"), ("vendor", "Lumo")]),
        raw_offer("p3", "10", &[("name", "Ball")]),
        raw_offer("p4", "404", &[("name", "Ghost")]),
    ]
}

fn container(settings: Settings) -> ServiceContainer {
    let feed = MemoryFeed::new(sample_categories(), offers());
    ServiceContainer::with_deps(settings, Arc::new(feed))
}

// ============================================================
// IngestService
// ============================================================

#[test]
fn given_default_policies_when_ingesting_then_unknown_skipped_and_shallow_kept() {
    init_test_setup();
    let container = container(settings(ShallowPolicy::Empty, UnknownCategoryPolicy::Skip));
    let mut sink = MemorySink::default();

    // Act
    let report = container.ingest_service().run(&mut sink).unwrap();

    // Assert
    assert_eq!(
        report,
        IngestReport {
            categories: 8,
            offers: 4,
            written: 3,
            skipped: 1,
            rejected: 0,
        }
    );
    let doll = &sink.records[0];
    assert_eq!(doll.product_id.as_deref(), Some("p1"));
    assert_eq!(doll.marketplace_id, Some(7));
    assert_eq!(doll.title.as_deref(), Some("Doll"));
    assert_eq!(doll.price_after_discounts.as_deref(), Some("990"));
    assert_eq!(doll.price_before_discounts.as_deref(), Some("1200"));
    assert_eq!(doll.category_lvl_3.as_deref(), Some("Dolls"));

    let sconce = &sink.records[1];
    assert_eq!(sconce.brand.as_deref(), Some("Lumo"));
    assert_eq!(sconce.category_lvl_1.as_deref(), Some("Home"));
    assert_eq!(sconce.category_remaining.as_deref(), Some("Wall/Sconces"));

    let ball = &sink.records[2];
    assert_eq!(ball.category_lvl_1.as_deref(), Some("Kids"));
    assert_eq!(ball.category_lvl_2.as_deref(), Some(""));
}

#[test]
fn given_reject_policy_when_ingesting_then_shallow_offer_rejected() {
    let container = container(settings(ShallowPolicy::Reject, UnknownCategoryPolicy::Null));
    let mut sink = MemorySink::default();

    let report = container.ingest_service().run(&mut sink).unwrap();

    assert_eq!(report.rejected, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.written, 3);
    let ghost = sink
        .records
        .iter()
        .find(|r| r.product_id.as_deref() == Some("p4"))
        .unwrap();
    assert_eq!(ghost.category_id.as_deref(), Some("404"));
    assert_eq!(ghost.category_lvl_1, None);
}

#[test]
fn given_abort_policy_when_unknown_category_then_run_fails() {
    let container = container(settings(ShallowPolicy::Empty, UnknownCategoryPolicy::Abort));
    let mut sink = MemorySink::default();

    let err = container.ingest_service().run(&mut sink).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::UnknownCategory(ref id)) if id == "404"
    ));
    assert_eq!(sink.records.len(), 3);
}

#[test]
fn given_cyclic_categories_when_ingesting_then_no_offer_is_written() {
    let feed = MemoryFeed::new(
        vec![RawCategory::new("1", "2", "A"), RawCategory::new("2", "1", "B")],
        offers(),
    );
    let container = ServiceContainer::with_deps(Settings::default(), Arc::new(feed));
    let mut sink = MemorySink::default();

    let err = container.ingest_service().run(&mut sink).unwrap_err();

    assert!(matches!(err, ApplicationError::Domain(DomainError::CycleDetected { .. })));
    assert!(sink.records.is_empty());
}

#[test]
fn given_json_lines_sink_when_ingesting_then_one_line_per_record() {
    let container = container(Settings::default());
    let mut sink = JsonLinesSink::new(Vec::new());

    let report = container.ingest_service().run(&mut sink).unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(out.lines().count(), report.written);
    let first: serde_json::Value = serde_json::from_str(out.lines().next().unwrap()).unwrap();
    assert_eq!(first["category_lvl_2"], "Girls");
    assert_eq!(first["features"], "{}");
}

// ============================================================
// OfferAssembler
// ============================================================

#[rstest]
#[case::skip(UnknownCategoryPolicy::Skip, "skipped")]
#[case::null(UnknownCategoryPolicy::Null, "ready")]
#[case::abort(UnknownCategoryPolicy::Abort, "error")]
fn given_unknown_category_when_assembling_then_policy_decides(
    #[case] policy: UnknownCategoryPolicy,
    #[case] expected: &str,
) {
    let tree = sample_categories()
        .into_iter()
        .collect::<CategoryTreeBuilder>()
        .build()
        .unwrap();
    let mapping = FieldMapping::default();
    let assembler = OfferAssembler::new(
        OfferClassifier::new(&tree, ShallowPolicy::Empty),
        &mapping,
        policy,
        None,
    );

    let outcome = match assembler.assemble(raw_offer("x", "404", &[])) {
        Ok(AssemblyOutcome::Ready(_)) => "ready",
        Ok(AssemblyOutcome::Skipped(_)) => "skipped",
        Ok(AssemblyOutcome::Rejected(_)) => "rejected",
        Err(_) => "error",
    };
    assert_eq!(outcome, expected);
}

#[test]
fn given_repeated_tags_and_params_when_assembling_then_first_field_and_last_param_win() {
    let tree = sample_categories()
        .into_iter()
        .collect::<CategoryTreeBuilder>()
        .build()
        .unwrap();
    let mapping: FieldMapping = [
        ("categoryId".to_string(), OfferField::CategoryId),
        ("picture".to_string(), OfferField::FirstImageUrl),
    ]
    .into_iter()
    .collect();
    let assembler = OfferAssembler::new(
        OfferClassifier::new(&tree, ShallowPolicy::Empty),
        &mapping,
        UnknownCategoryPolicy::Skip,
        Some(1),
    );

    let mut offer = raw_offer(
        "x",
        "12",
        &[("picture", "a.jpg"), ("picture", "b.jpg"), ("name", "unmapped")],
    );
    offer.params = vec![
        ("Цвет".to_string(), "красный".to_string()),
        ("Size".to_string(), "S".to_string()),
        ("Size".to_string(), "M".to_string()),
    ];

    let record = match assembler.assemble(offer).unwrap() {
        AssemblyOutcome::Ready(record) => record,
        other => panic!("expected record, got {other:?}"),
    };

    assert_eq!(record.first_image_url.as_deref(), Some("a.jpg"));
    assert_eq!(record.title, None);
    assert_eq!(record.features, r#"{"Size":"M","Цвет":"красный"}"#);
}

#[test]
fn given_offer_without_category_when_assembling_then_record_is_unclassified() {
    let tree = CategoryTreeBuilder::new().build().unwrap();
    let mapping = FieldMapping::default();
    let assembler = OfferAssembler::new(
        OfferClassifier::new(&tree, ShallowPolicy::Reject),
        &mapping,
        UnknownCategoryPolicy::Abort,
        None,
    );
    let offer = RawOffer {
        id: Some("n".into()),
        fields: vec![("name".into(), "Loose".into())],
        params: Vec::new(),
    };

    match assembler.assemble(offer).unwrap() {
        AssemblyOutcome::Ready(record) => {
            assert_eq!(record.title.as_deref(), Some("Loose"));
            assert_eq!(record.category_lvl_1, None);
        }
        other => panic!("expected record, got {other:?}"),
    }
}
