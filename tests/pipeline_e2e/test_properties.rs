//! Property tests over the pure stages.

use proptest::prelude::*;
use test_metrics_lib::models::{RawCounts, RecordQuality, ReportFormat, ReportRecord, derive_passed};
use test_metrics_lib::services::aggregator::{summarize_overall, summarize_service};
use test_metrics_lib::services::build_document;

use super::fixtures::sample;

fn record(index: usize, total: u64, failed: u64, errors: u64, millis: u64) -> ReportRecord {
    ReportRecord::from_counts(
        "svc",
        format!("TEST-{}.xml", index),
        ReportFormat::JunitXml,
        RawCounts {
            total,
            failed,
            errors,
            skipped: 0,
            duration_seconds: millis as f64 / 1000.0,
        },
    )
}

fn records() -> impl Strategy<Value = Vec<ReportRecord>> {
    prop::collection::vec((0u64..500, 0u64..60, 0u64..60, 0u64..120_000), 0..12).prop_map(
        |tuples| {
            tuples
                .into_iter()
                .enumerate()
                .map(|(i, (total, failed, errors, millis))| record(i, total, failed, errors, millis))
                .collect()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

    #[test]
    fn passed_is_clamped_difference(total in 0u64..1000, failed in 0u64..1000, errors in 0u64..1000) {
        let rec = record(0, total, failed, errors, 0);
        let (expected, clamped) = derive_passed(total, failed, errors);

        if failed + errors <= total {
            prop_assert_eq!(rec.passed, total - failed - errors);
            prop_assert_eq!(rec.quality, RecordQuality::Valid);
            prop_assert!(!clamped);
        } else {
            prop_assert_eq!(rec.passed, 0);
            prop_assert_eq!(rec.quality, RecordQuality::Suspect);
            prop_assert!(clamped);
        }
        prop_assert_eq!(rec.passed, expected);
    }

    #[test]
    fn shuffling_records_keeps_summary(
        (original, shuffled) in records().prop_flat_map(|r| (Just(r.clone()), Just(r).prop_shuffle()))
    ) {
        prop_assert_eq!(
            summarize_service("svc", &original),
            summarize_service("svc", &shuffled)
        );
    }

    #[test]
    fn pass_rate_zero_without_tests(count in 0usize..5) {
        let services: Vec<_> = (0..count)
            .map(|i| summarize_service(&format!("svc{}", i), &[record(i, 0, 0, 0, 0)]))
            .collect();
        let overall = summarize_overall(&services);

        prop_assert!(services.iter().all(|s| s.pass_rate_percent == 0.0));
        prop_assert_eq!(overall.pass_rate_percent, 0.0);
    }

    #[test]
    fn emitted_values_parse_back(recs in records()) {
        let service = summarize_service("svc", &recs);
        let overall = summarize_overall(std::slice::from_ref(&service));
        let text = build_document("test_", &overall, std::slice::from_ref(&service), &[], None).render();

        let total: u64 = sample(&text, "test_count_total").unwrap().parse().unwrap();
        let failed: u64 = sample(&text, "test_fail_count_by_service{service=\"svc\"}")
            .unwrap()
            .parse()
            .unwrap();
        let rate: f64 = sample(&text, "test_pass_rate_percent").unwrap().parse().unwrap();
        let time: f64 = sample(&text, "test_execution_time_by_service{service=\"svc\"}")
            .unwrap()
            .parse()
            .unwrap();

        prop_assert_eq!(total, overall.total_tests);
        prop_assert_eq!(failed, service.failed_tests);
        prop_assert!((rate - overall.pass_rate_percent).abs() < 0.01);
        prop_assert!((time - service.duration_seconds).abs() < 0.01);
    }
}
