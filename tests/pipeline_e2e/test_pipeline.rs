//! E2E tests: full pipeline runs over service trees.

use std::fs;

use test_metrics_lib::error::AppError;
use test_metrics_lib::models::{DiagnosticKind, SummaryStatus};
use test_metrics_lib::services::MetricsPipeline;

use super::fixtures::*;

const SERVICES: &[&str] = &["user_service", "order_service", "payment_service"];

/// (1) Mixed outcomes aggregate per service and overall.
#[test]
fn test_mixed_services() {
    let tree = ServiceTree::new();
    tree.write_junit("user_service", "UserServiceTest", 10, 0, 0, "1.0");
    tree.write_junit("order_service", "OrderServiceTest", 7, 1, 0, "1.2");
    tree.write_junit("order_service", "OrderControllerTest", 4, 2, 0, "0.8");

    let report = MetricsPipeline::new(tree.options(SERVICES)).run().unwrap();

    let order = &report.services[1];
    assert_eq!(order.service_id, "order_service");
    assert_eq!(order.total_tests, 11);
    assert_eq!(order.passed_tests, 8);
    assert_eq!(order.failed_tests, 3);
    assert_eq!(order.duration_seconds, 2.0);
    assert_eq!(order.pass_rate_percent, 72.73);
    assert_eq!(order.status, SummaryStatus::Fail);

    assert_eq!(report.summary.total_tests, 21);
    assert_eq!(report.summary.failed_tests, 3);
    assert_eq!(report.summary.pass_rate_percent, 85.71);
    assert_eq!(report.summary.status, SummaryStatus::Fail);
    assert!(report.has_failures());

    let text = fs::read_to_string(&report.metrics_file).unwrap();
    assert_eq!(sample(&text, "test_count_total").as_deref(), Some("21"));
    assert_eq!(sample(&text, "test_pass_rate_percent").as_deref(), Some("85.71"));
    assert_eq!(
        sample(&text, "test_pass_rate_by_service{service=\"order_service\"}").as_deref(),
        Some("72.73")
    );
}

/// (2) A service without reports still shows up with zeros and UNKNOWN.
#[test]
fn test_service_without_reports_is_emitted() {
    let tree = ServiceTree::new();
    tree.write_junit("user_service", "UserServiceTest", 3, 0, 0, "0.3");

    let report = MetricsPipeline::new(tree.options(SERVICES)).run().unwrap();
    let text = fs::read_to_string(&report.metrics_file).unwrap();

    assert_eq!(report.services[2].status, SummaryStatus::Unknown);
    assert_eq!(
        sample(&text, "test_count_by_service{service=\"payment_service\"}").as_deref(),
        Some("0")
    );
    assert_eq!(
        sample(
            &text,
            "test_status_by_service{service=\"payment_service\",status=\"UNKNOWN\"}"
        )
        .as_deref(),
        Some("1")
    );
}

/// (3) A corrupt report changes nothing but the diagnostics.
#[test]
fn test_corrupt_report_is_absorbed() {
    let clean = ServiceTree::new();
    clean.write_junit("user_service", "A", 5, 1, 0, "0.5");
    clean.write_junit("user_service", "B", 6, 0, 1, "0.25");

    let dirty = ServiceTree::new();
    dirty.write_junit("user_service", "A", 5, 1, 0, "0.5");
    dirty.write_junit("user_service", "B", 6, 0, 1, "0.25");
    let corrupt = dirty.write_raw("user_service", "C", "<testsuite tests=\"4\"><testcase></testsuite>");
    dirty.write_raw("user_service", "D", "<testsuite tests=\"lots\"/>");

    let clean_report = MetricsPipeline::new(clean.options(&["user_service"]))
        .run()
        .unwrap();
    let dirty_report = MetricsPipeline::new(dirty.options(&["user_service"]))
        .run()
        .unwrap();

    assert_eq!(clean_report.services, dirty_report.services);
    assert_eq!(clean_report.summary, dirty_report.summary);
    assert!(clean_report.diagnostics.is_empty());
    assert_eq!(dirty_report.diagnostics.len(), 2);
    assert!(
        dirty_report
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::Malformed)
    );
    assert_eq!(dirty_report.diagnostics[0].path, corrupt);
}

/// (4) A service whose only report is corrupt is UNKNOWN, not PASS.
#[test]
fn test_only_corrupt_report_is_unknown() {
    let tree = ServiceTree::new();
    tree.write_raw("user_service", "Broken", "not xml at all <");

    let report = MetricsPipeline::new(tree.options(&["user_service"]))
        .run()
        .unwrap();

    assert_eq!(report.services[0].status, SummaryStatus::Unknown);
    assert_eq!(report.summary.status, SummaryStatus::Unknown);
    assert_eq!(report.diagnostics.len(), 1);
}

/// (5) Inconsistent counts are clamped and reported, the run still succeeds.
#[test]
fn test_suspect_counts_are_clamped() {
    let tree = ServiceTree::new();
    tree.write_junit("user_service", "Odd", 2, 3, 1, "0.1");

    let report = MetricsPipeline::new(tree.options(&["user_service"]))
        .run()
        .unwrap();

    assert_eq!(report.services[0].passed_tests, 0);
    assert_eq!(report.services[0].suspect_files, 1);
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::SuspectCounts);
}

/// (6) A failed write escalates and leaves no partial files behind.
#[test]
fn test_write_failure_leaves_no_partial_files() {
    let tree = ServiceTree::new();
    tree.write_junit("user_service", "A", 1, 0, 0, "0.1");
    let options = tree.options(&["user_service"]);

    let first = MetricsPipeline::new(options.clone()).run().unwrap();
    let before = fs::read_to_string(&first.metrics_file).unwrap();

    // A non-empty directory cannot be replaced by the artifact
    let blocked = tree.path().join("out/blocked");
    fs::create_dir_all(blocked.join("child")).unwrap();
    let mut broken = options;
    broken.output_path = blocked;
    broken.summary_json_path = None;

    let err = MetricsPipeline::new(broken).run().unwrap_err();
    assert!(matches!(err, AppError::WriteFailure { .. }), "{:?}", err);

    assert_eq!(fs::read_to_string(&first.metrics_file).unwrap(), before);
    let entries = fs::read_dir(tree.path().join("out")).unwrap().count();
    assert_eq!(entries, 3, "only the two artifacts and the blocking directory");
}

/// (7) The JSON run summary mirrors the text artifact.
#[test]
fn test_json_summary_matches_metrics() {
    let tree = ServiceTree::new();
    tree.write_junit("order_service", "OrderServiceTest", 7, 1, 0, "1.2");

    let report = MetricsPipeline::new(tree.options(SERVICES)).run().unwrap();
    let summary: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(report.summary_file.as_ref().unwrap()).unwrap(),
    )
    .unwrap();

    assert_eq!(summary["summary"]["total_tests"], 7);
    assert_eq!(summary["summary"]["status"], "FAIL");
    assert_eq!(summary["services"][1]["service_id"], "order_service");
    assert_eq!(summary["services"][1]["report_files"], 1);
    assert_eq!(summary["services"][0]["status"], "UNKNOWN");
}

/// (8) Each named suite gets its own labelled pass/fail samples.
#[test]
fn test_suite_breakdown() {
    let tree = ServiceTree::new();
    tree.write_junit("order_service", "OrderServiceTest", 7, 1, 0, "1.2");
    tree.write_junit("order_service", "OrderControllerTest", 4, 1, 1, "0.8");

    let report = MetricsPipeline::new(tree.options(SERVICES)).run().unwrap();
    let text = fs::read_to_string(&report.metrics_file).unwrap();

    assert_eq!(report.services[1].suites.len(), 2);
    assert_eq!(
        sample(
            &text,
            "test_pass_count_by_suite{service=\"order_service\",suite=\"com.foodfast.order_service.OrderControllerTest\"}"
        )
        .as_deref(),
        Some("2")
    );
    assert_eq!(
        sample(
            &text,
            "test_fail_count_by_suite{service=\"order_service\",suite=\"com.foodfast.order_service.OrderServiceTest\"}"
        )
        .as_deref(),
        Some("1")
    );
    assert!(!text.contains("test_pass_count_by_suite{service=\"user_service\""));
}

/// (9) One report with an absurd count neither panics nor hides the others.
#[test]
fn test_overflowing_counts_keep_the_batch() {
    let tree = ServiceTree::new();
    tree.write_junit("user_service", "Huge", u64::MAX, 0, 0, "0.1");
    tree.write_junit("user_service", "Small", 1, 0, 0, "0.1");
    tree.write_junit("order_service", "OrderServiceTest", 7, 1, 0, "1.2");

    let report = MetricsPipeline::new(tree.options(SERVICES)).run().unwrap();
    let text = fs::read_to_string(&report.metrics_file).unwrap();

    assert_eq!(report.services[0].total_tests, u64::MAX);
    assert_eq!(report.services[1].total_tests, 7);
    assert_eq!(
        sample(&text, "test_count_total").as_deref(),
        Some(u64::MAX.to_string().as_str())
    );
}
