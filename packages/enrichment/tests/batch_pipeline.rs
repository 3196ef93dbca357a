//! End-to-end batch behavior with mocked collaborators.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use enrichment::testing::test_pricing;
use enrichment::{
    AdapterRegistry, BatchConfig, BatchError, BatchOrchestrator, ConfigError, CsvReportWriter,
    ImageBlob, ImageSetAdapter, InputUnit, ItemError, ItemOutcome, MemoryReportWriter,
    MockAdapter, MockGenerator, MockVision, PricingEntry, PricingTable, ReportAssembler,
    Retailer, SourceType, TokenUsage,
};
use enrichment::{ExtractionResult, Extracted};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

const GENERIC: &str = "generic";

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn urls(ids: &[&str]) -> Vec<InputUnit> {
    ids.iter().map(|id| InputUnit::url(*id)).collect()
}

fn pricing() -> PricingTable {
    PricingTable::new().with_entry(GENERIC, test_pricing())
}

fn orchestrator(adapter: Arc<MockAdapter>, generator: Arc<MockGenerator>) -> BatchOrchestrator {
    let adapters = AdapterRegistry::new()
        .register(Retailer::Generic, adapter)
        .unwrap();
    BatchOrchestrator::new(adapters, generator, pricing())
}

fn ids(outcomes: &[ItemOutcome]) -> Vec<String> {
    outcomes.iter().map(|o| o.input().id.clone()).collect()
}

#[tokio::test]
async fn test_outcomes_keep_input_order() {
    // later inputs finish first
    let adapter = Arc::new(
        MockAdapter::urls()
            .with_delay("a", Duration::from_millis(60))
            .with_delay("b", Duration::from_millis(40))
            .with_delay("c", Duration::from_millis(20)),
    );
    let orch = orchestrator(adapter, Arc::new(MockGenerator::new()));

    let inputs = urls(&["a", "b", "c", "d"]);
    let report = orch
        .run(GENERIC, &inputs, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), inputs.len());
    assert_eq!(ids(&report.outcomes), vec!["a", "b", "c", "d"]);
    assert!(report.outcomes.iter().all(ItemOutcome::is_success));
}

#[tokio::test]
async fn test_partial_failure_is_isolated() {
    let adapter = Arc::new(
        MockAdapter::urls().with_error("b", ItemError::transport("b.example.com", "connection failed")),
    );
    let generator = Arc::new(MockGenerator::new());
    let writer = Arc::new(MemoryReportWriter::new());
    let orch = orchestrator(adapter, generator.clone())
        .with_reporter(ReportAssembler::new(writer.clone()));

    let report = orch
        .run(GENERIC, &urls(&["a", "b", "c"]), &CancellationToken::new())
        .await
        .unwrap();

    let summary = &report.summary;
    assert_eq!(summary.total_count, 3);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failure_count, 1);

    match &report.outcomes[1] {
        ItemOutcome::Failure(f) => {
            assert_eq!(f.input.id, "b");
            assert_eq!(f.error, "Could not reach b.example.com: connection failed");
        }
        other => panic!("expected failure, got {:?}", other),
    }

    // extraction failure means no generation attempt
    assert_eq!(generator.calls(), vec!["Product a", "Product c"]);

    let tables = writer.tables();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].rows.len(), 2);
    assert_eq!(summary.report.as_ref().map(|r| r.rows), Some(2));
}

#[tokio::test]
async fn test_mixed_batch_cost_is_exact() {
    let generator = Arc::new(
        MockGenerator::new()
            .with_usage("Product a", TokenUsage::new(100, 50))
            .with_usage("Product b", TokenUsage::new(200, 80)),
    );
    let orch = orchestrator(Arc::new(MockAdapter::urls()), generator);

    let report = orch
        .run(GENERIC, &urls(&["a", "b"]), &CancellationToken::new())
        .await
        .unwrap();

    // (300/1e6)*0.075 + (130/1e6)*0.30
    assert_eq!(report.summary.total_cost, dec("0.0000615"));
    assert_eq!(report.summary.input_tokens, 300);
    assert_eq!(report.summary.output_tokens, 130);
    assert_eq!(report.summary.currency, "USD");
}

#[tokio::test]
async fn test_summary_reconciles_with_outcomes() {
    let adapter = Arc::new(MockAdapter::urls().with_error("x", ItemError::ExtractionEmpty("x".into())));
    let generator = Arc::new(
        MockGenerator::new()
            .with_usage("Product a", TokenUsage::new(1234, 567))
            .with_usage("Product b", TokenUsage::new(89, 10)),
    );
    let orch = orchestrator(adapter, generator);

    let report = orch
        .run(GENERIC, &urls(&["a", "x", "b", "c"]), &CancellationToken::new())
        .await
        .unwrap();

    let recomputed: Decimal = report.outcomes.iter().map(ItemOutcome::cost).sum();
    assert_eq!(report.summary.total_cost, recomputed);
    assert_eq!(report.outcomes[1].cost(), Decimal::ZERO);
}

#[tokio::test]
async fn test_empty_batch_skips_report() {
    let adapter = Arc::new(MockAdapter::urls());
    let writer = Arc::new(MemoryReportWriter::new());
    let orch = orchestrator(adapter.clone(), Arc::new(MockGenerator::new()))
        .with_reporter(ReportAssembler::new(writer.clone()));

    let report = orch
        .run(GENERIC, &[], &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.outcomes.is_empty());
    assert_eq!(report.summary.total_count, 0);
    assert_eq!(report.summary.success_count, 0);
    assert_eq!(report.summary.total_cost, Decimal::ZERO);
    assert!(report.summary.report.is_none());
    assert!(writer.tables().is_empty());
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn test_all_failures_write_no_report() {
    let adapter = Arc::new(MockAdapter::urls().with_error("a", ItemError::Refused));
    let writer = Arc::new(MemoryReportWriter::new());
    let orch = orchestrator(adapter, Arc::new(MockGenerator::new()))
        .with_reporter(ReportAssembler::new(writer.clone()));

    let report = orch
        .run(GENERIC, &urls(&["a"]), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.failure_count, 1);
    assert!(report.summary.report.is_none());
    assert!(writer.tables().is_empty());
}

#[tokio::test]
async fn test_missing_pricing_stops_before_any_item() {
    let adapter = Arc::new(MockAdapter::urls());
    let adapters = AdapterRegistry::new()
        .register(Retailer::Generic, adapter.clone())
        .unwrap();
    let orch = BatchOrchestrator::new(adapters, Arc::new(MockGenerator::new()), PricingTable::new());

    let err = orch
        .run(GENERIC, &urls(&["a"]), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BatchError::Config(ConfigError::MissingPricing { ref integration }) if integration == GENERIC
    ));
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_integration_is_config_error() {
    let orch = orchestrator(Arc::new(MockAdapter::urls()), Arc::new(MockGenerator::new()));
    let err = orch
        .run("magalu", &urls(&["a"]), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::Config(ConfigError::UnknownIntegration(_))));
}

#[tokio::test]
async fn test_wrong_source_type_fails_fast() {
    let adapter = Arc::new(MockAdapter::urls());
    let orch = orchestrator(adapter.clone(), Arc::new(MockGenerator::new()));

    let mut inputs = urls(&["a"]);
    inputs.push(InputUnit::image_set("product1", vec![ImageBlob::new("a.jpg", vec![1u8])]));

    let err = orch
        .run(GENERIC, &inputs, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BatchError::SourceMismatch { index: 1, expected: SourceType::Url, found: SourceType::ImageSet }
    ));
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn test_identical_runs_are_identical() {
    let generator = Arc::new(MockGenerator::new().with_usage("Product b", TokenUsage::new(7, 3)));
    let adapter = Arc::new(MockAdapter::urls().with_error("c", ItemError::Refused));
    let orch = orchestrator(adapter, generator);
    let inputs = urls(&["a", "b", "c"]);

    let first = orch.run(GENERIC, &inputs, &CancellationToken::new()).await.unwrap();
    let second = orch.run(GENERIC, &inputs, &CancellationToken::new()).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_pricing_change_applies_to_next_batch_only() {
    let mut orch = orchestrator(Arc::new(MockAdapter::urls()), Arc::new(MockGenerator::new()));
    let inputs = urls(&["a"]);

    let before = orch.run(GENERIC, &inputs, &CancellationToken::new()).await.unwrap();
    let snapshot = before.summary.total_cost;

    orch.set_pricing(PricingTable::new().with_entry(GENERIC, PricingEntry::new(dec("1"), dec("1"))));
    let after = orch.run(GENERIC, &inputs, &CancellationToken::new()).await.unwrap();

    assert_eq!(before.summary.total_cost, snapshot);
    // 150 tokens at 1 per million
    assert_eq!(after.summary.total_cost, dec("0.00015"));
    assert_ne!(after.summary.total_cost, snapshot);
}

#[tokio::test]
async fn test_slow_item_times_out_alone() {
    let adapter = Arc::new(MockAdapter::urls().with_delay("slow", Duration::from_secs(5)));
    let orch = orchestrator(adapter, Arc::new(MockGenerator::new()))
        .with_config(BatchConfig::new().with_item_timeout_secs(1));

    let report = orch
        .run(GENERIC, &urls(&["a", "slow", "b"]), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.success_count, 2);
    match &report.outcomes[1] {
        ItemOutcome::Failure(f) => assert_eq!(f.error, "Processing timed out after 1s"),
        other => panic!("expected timeout failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancellation_discards_batch() {
    let adapter = Arc::new(MockAdapter::urls().with_delay("a", Duration::from_secs(5)));
    let writer = Arc::new(MemoryReportWriter::new());
    let orch = orchestrator(adapter, Arc::new(MockGenerator::new()))
        .with_reporter(ReportAssembler::new(writer.clone()));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = orch.run(GENERIC, &urls(&["a", "b"]), &cancel).await.unwrap_err();

    assert!(matches!(err, BatchError::Cancelled));
    assert!(writer.tables().is_empty());
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let mut adapter = MockAdapter::urls();
    let names: Vec<String> = (0..10).map(|i| format!("p{}", i)).collect();
    for name in &names {
        adapter = adapter.with_delay(name.as_str(), Duration::from_millis(20));
    }
    let adapter = Arc::new(adapter);
    let orch = orchestrator(adapter.clone(), Arc::new(MockGenerator::new()))
        .with_config(BatchConfig::new().with_concurrency(3));

    let inputs: Vec<InputUnit> = names.iter().map(InputUnit::url).collect();
    let report = orch.run(GENERIC, &inputs, &CancellationToken::new()).await.unwrap();

    assert_eq!(report.summary.success_count, 10);
    assert!(adapter.peak_concurrency() <= 3);
    assert!(adapter.peak_concurrency() >= 2);
}

#[tokio::test]
async fn test_duplicate_inputs_are_processed_twice() {
    let adapter = Arc::new(MockAdapter::urls());
    let orch = orchestrator(adapter.clone(), Arc::new(MockGenerator::new()));

    let report = orch
        .run(GENERIC, &urls(&["a", "a"]), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(adapter.calls(), vec!["a", "a"]);
}

#[tokio::test]
async fn test_generator_errors_become_failures() {
    let generator = Arc::new(
        MockGenerator::new()
            .with_error("Product a", ItemError::Refused)
            .with_text("Product b", "   "),
    );
    let orch = orchestrator(Arc::new(MockAdapter::urls()), generator);

    let report = orch
        .run(GENERIC, &urls(&["a", "b", "c"]), &CancellationToken::new())
        .await
        .unwrap();

    let errors: Vec<Option<String>> = report
        .outcomes
        .iter()
        .map(|o| match o {
            ItemOutcome::Failure(f) => Some(f.error.clone()),
            ItemOutcome::Success(_) => None,
        })
        .collect();

    assert_eq!(
        errors,
        vec![
            Some("The AI service declined to describe this product".to_string()),
            Some("Description could not be generated: the AI service returned an empty description".to_string()),
            None,
        ]
    );
}

#[tokio::test]
async fn test_description_and_attributes_flow_to_outcome() {
    let adapter = Arc::new(MockAdapter::urls().with_product(
        "https://www.leroymerlin.com.br/torneira_1",
        ExtractionResult::new()
            .with_title("Torneira Gourmet")
            .with_price("R$ 1.190,43")
            .with_ean("7898152416549"),
    ));
    let generator = Arc::new(MockGenerator::new().with_text("Torneira Gourmet", "Três parágrafos."));
    let orch = orchestrator(adapter, generator);

    let report = orch
        .run(
            GENERIC,
            &urls(&["https://www.leroymerlin.com.br/torneira_1"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let product = report.outcomes[0].as_success().unwrap();
    assert_eq!(product.product.description.as_deref(), Some("Três parágrafos."));
    assert_eq!(product.product.ean, "7898152416549");
    assert_eq!(product.usage.input_tokens, 100);
    assert_eq!(product.usage.output_tokens, 50);
}

#[tokio::test]
async fn test_report_writer_failure_keeps_results() {
    let orch = orchestrator(Arc::new(MockAdapter::urls()), Arc::new(MockGenerator::new()))
        .with_reporter(ReportAssembler::new(Arc::new(MemoryReportWriter::failing())));

    let report = orch
        .run(GENERIC, &urls(&["a"]), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.success_count, 1);
    assert!(report.summary.report.is_none());
}

#[tokio::test]
async fn test_report_can_be_disabled() {
    let writer = Arc::new(MemoryReportWriter::new());
    let orch = orchestrator(Arc::new(MockAdapter::urls()), Arc::new(MockGenerator::new()))
        .with_reporter(ReportAssembler::new(writer.clone()))
        .with_config(BatchConfig::new().with_report(false));

    let report = orch
        .run(GENERIC, &urls(&["a"]), &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.summary.report.is_none());
    assert!(writer.tables().is_empty());
}

#[tokio::test]
async fn test_csv_report_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Arc::new(CsvReportWriter::new(dir.path()));
    let orch = orchestrator(Arc::new(MockAdapter::urls()), Arc::new(MockGenerator::new()))
        .with_reporter(ReportAssembler::new(writer));

    let report = orch
        .run(GENERIC, &urls(&["a", "b"]), &CancellationToken::new())
        .await
        .unwrap();

    let written = report.summary.report.expect("report reference");
    assert_eq!(written.rows, 2);
    assert!(written.download_url.starts_with("/exports/generic_produtos_"));

    let text = std::fs::read_to_string(&written.path).unwrap();
    let lines: Vec<&str> = text.trim_end().split("\r\n").collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("PRODUCT NAME"));
    assert!(lines[1].starts_with("Product a,"));
}

#[tokio::test]
async fn test_image_set_batch_bills_vision_tokens() {
    let vision = Arc::new(MockVision::new().with_reply(
        ExtractionResult::new().with_title("Arroz 5kg").with_price("R$ 24,90"),
        TokenUsage::new(1000, 100),
    ));
    let generator = Arc::new(MockGenerator::new());
    let adapters = AdapterRegistry::new()
        .register(Retailer::SamsClub, Arc::new(ImageSetAdapter::new(vision)))
        .unwrap();
    let orch = BatchOrchestrator::new(
        adapters,
        generator.clone(),
        PricingTable::new().with_entry("sams_club", test_pricing()),
    );

    let photos = vec![
        ImageBlob::new("product1_tag.jpg", vec![1u8, 2]),
        ImageBlob::new("product1_box.jpg", vec![3u8, 4]),
    ];
    let inputs = enrichment::group_images(photos);
    let report = orch
        .run("sams_club", &inputs, &CancellationToken::new())
        .await
        .unwrap();

    let product = report.outcomes[0].as_success().unwrap();
    assert_eq!(product.input.id, "product1");
    assert_eq!(product.usage.input_tokens, 1100);
    assert_eq!(product.usage.output_tokens, 150);
    assert_eq!(generator.image_counts(), vec![2]);
}

#[tokio::test]
async fn test_system_prompt_overhead_billed_per_model_call() {
    // one image set: a vision call plus a description call
    let vision = Arc::new(MockVision::new().with_reply(
        ExtractionResult::new().with_title("Arroz 5kg"),
        TokenUsage::new(0, 0),
    ));
    let generator = Arc::new(MockGenerator::new().with_default_usage(TokenUsage::new(0, 0)));
    let adapters = AdapterRegistry::new()
        .register(Retailer::SamsClub, Arc::new(ImageSetAdapter::new(vision)))
        .unwrap();
    let entry = PricingEntry::new(dec("1"), dec("1")).with_system_prompt_tokens(1000);
    let orch = BatchOrchestrator::new(
        adapters,
        generator,
        PricingTable::new().with_entry("sams_club", entry),
    );

    let inputs = vec![InputUnit::image_set(
        "product1",
        vec![ImageBlob::new("product1_tag.jpg", vec![1u8])],
    )];
    let report = orch
        .run("sams_club", &inputs, &CancellationToken::new())
        .await
        .unwrap();

    let product = report.outcomes[0].as_success().unwrap();
    assert_eq!(product.usage.input_tokens, 0);
    assert_eq!(product.usage.input_cost, dec("0.002"));
    assert_eq!(report.summary.total_cost, dec("0.002"));
}

#[tokio::test]
async fn test_scraped_item_pays_overhead_once() {
    let orch = BatchOrchestrator::new(
        AdapterRegistry::new()
            .register(Retailer::Generic, Arc::new(MockAdapter::urls()))
            .unwrap(),
        Arc::new(MockGenerator::new().with_default_usage(TokenUsage::new(0, 0))),
        PricingTable::new().with_entry(
            GENERIC,
            PricingEntry::new(dec("1"), dec("1")).with_system_prompt_tokens(1000),
        ),
    );

    let report = orch
        .run(GENERIC, &urls(&["a"]), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.total_cost, dec("0.001"));
}

#[tokio::test]
async fn test_item_instructions_reach_generator() {
    let generator = Arc::new(MockGenerator::new());
    let orch = orchestrator(Arc::new(MockAdapter::urls()), generator.clone())
        .with_config(BatchConfig::new().with_concurrency(1));

    let inputs = vec![
        InputUnit::url("a").with_instructions("Mencionar a garantia de 5 anos"),
        InputUnit::url("b"),
    ];
    orch.run(GENERIC, &inputs, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        generator.instructions(),
        vec![Some("Mencionar a garantia de 5 anos".to_string()), None]
    );
    assert_eq!(generator.integrations(), vec![GENERIC, GENERIC]);
}

#[tokio::test]
async fn test_extraction_tokens_from_adapter_are_billed() {
    let adapter = Arc::new(MockAdapter::urls().with_extraction(
        "a",
        Extracted::with_usage(ExtractionResult::new().with_title("Product a"), TokenUsage::new(10, 5)),
    ));
    let orch = orchestrator(adapter, Arc::new(MockGenerator::new()));

    let report = orch
        .run(GENERIC, &urls(&["a"]), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.input_tokens, 110);
    assert_eq!(report.summary.output_tokens, 55);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn outcomes_match_inputs_and_costs_reconcile(
            items in prop::collection::vec((any::<bool>(), 0u64..50_000, 0u64..5_000), 0..12),
            concurrency in 1usize..6,
        ) {
            let mut adapter = MockAdapter::urls();
            let mut generator = MockGenerator::new();
            let inputs: Vec<InputUnit> = (0..items.len())
                .map(|i| InputUnit::url(format!("item{}", i)))
                .collect();

            for (i, (fails, input_tokens, output_tokens)) in items.iter().enumerate() {
                let id = format!("item{}", i);
                if *fails {
                    adapter = adapter.with_error(id.as_str(), ItemError::ExtractionEmpty(id.clone()));
                }
                generator = generator.with_usage(
                    format!("Product {}", id),
                    TokenUsage::new(*input_tokens, *output_tokens),
                );
            }

            let orch = orchestrator(Arc::new(adapter), Arc::new(generator))
                .with_config(BatchConfig::new().with_concurrency(concurrency));
            let report = tokio_test::block_on(orch.run(GENERIC, &inputs, &CancellationToken::new()))
                .unwrap();

            prop_assert_eq!(report.outcomes.len(), inputs.len());
            for (outcome, input) in report.outcomes.iter().zip(&inputs) {
                prop_assert_eq!(&outcome.input().id, &input.id().to_string());
            }

            let expected_successes = items.iter().filter(|(fails, _, _)| !fails).count();
            prop_assert_eq!(report.summary.success_count, expected_successes);
            prop_assert_eq!(
                report.summary.success_count + report.summary.failure_count,
                report.summary.total_count
            );

            let recomputed: Decimal = report.outcomes.iter().map(ItemOutcome::cost).sum();
            prop_assert_eq!(report.summary.total_cost, recomputed);

            let input_tokens: u64 = items
                .iter()
                .filter(|(fails, _, _)| !fails)
                .map(|(_, input, _)| input)
                .sum();
            prop_assert_eq!(report.summary.input_tokens, input_tokens);
        }
    }
}
