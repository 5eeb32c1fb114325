//! # Scoring Benchmarks
//!
//! Batch ingestion and report rendering for samd-launch-core.
//!
//! Run with: `cargo bench -p samd-launch-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use samd_launch_core::{AssessmentState, StageKind, read_batch_from_str, report_to_string};
use std::hint::black_box;

const HEADER: &str = "Country,Risk_Class,Medical_Incidence,Tech_Limitations,Predicate_US,Population,Country_Wealth,Market_Maturity,Affiliate_Readiness,Digital_Readiness\n";

/// Create a CSV batch with `size` synthetic markets.
fn create_batch(size: usize) -> String {
    let mut text = String::from(HEADER);
    for i in 0..size {
        text.push_str(&format!(
            "Market{i},{},{},{},{},\"{},000,000\",Upper-Middle,{},{},{}\n",
            i % 5 + 1,
            i % 3 + 1,
            (i + 1) % 3 + 1,
            if i % 2 == 0 { "Yes" } else { "No" },
            i + 1,
            i % 5 + 1,
            (i + 2) % 5 + 1,
            (i + 4) % 5 + 1,
        ));
    }
    text
}

fn bench_read_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_batch");

    for size in &[10, 100, 1000] {
        let text = create_batch(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| read_batch_from_str(black_box(text)).expect("batch"));
        });
    }

    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_to_string");

    for size in &[10, 100, 1000] {
        let states: Vec<AssessmentState> = read_batch_from_str(&create_batch(*size))
            .expect("batch")
            .into_iter()
            .map(|record| {
                AssessmentState::new(record)
                    .with_narrative(StageKind::Risk, "Final Risk Impact Level: Medium")
                    .and_then(|s| s.with_narrative(StageKind::Opportunity, "ROI Summary: High"))
                    .and_then(|s| s.with_narrative(StageKind::Readiness, "Verdict: Ready"))
                    .and_then(|s| {
                        s.with_narrative(StageKind::Decision, "Decision: Launch\nExplanation: ok")
                    })
                    .expect("complete")
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &states, |b, states| {
            b.iter(|| report_to_string(black_box(states)).expect("report"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_read_batch, bench_report);
criterion_main!(benches);
