//! Bootstrap significance and temporal backtest, run through the evaluator.

use polars::prelude::*;
use veritrain::prelude::*;

/// Table with a time column, a segment column, and a learnable signal.
fn timed_dataset(n: usize) -> DataFrame {
    let week: Vec<i64> = (0..n).map(|i| (i / 4) as i64).collect();
    let class: Vec<i64> = (0..n).map(|i| (i % 2) as i64).collect();
    let signal: Vec<f64> = (0..n)
        .map(|i| {
            let base = if class[i] == 1 { 1.5 } else { -1.5 };
            base + ((i * 13) % 7) as f64 / 7.0 - 0.5
        })
        .collect();
    let channel: Vec<&str> = (0..n)
        .map(|i| if i % 2 == 0 { "web" } else { "store" })
        .collect();

    df!(
        "week" => week,
        "signal" => signal,
        "channel" => channel,
        "converted" => class
    )
    .unwrap()
}

fn base_config() -> PipelineConfig {
    let mut config = PipelineConfig::new(TaskType::Classification, "converted")
        .with_split(0.2, 0.1)
        .with_seed(42)
        .with_cv(None);
    config.drop_columns = vec!["week".to_string()];
    config
}

#[test]
fn test_bootstrap_detects_real_improvement() {
    let df = timed_dataset(200);
    let mut config = base_config();
    config.bootstrap.enabled = true;
    config.bootstrap.n_resamples = 200;

    let output = fit_pipeline(&df, &config).unwrap();
    let report = Evaluator::new(&config).evaluate(&output, &df).unwrap();

    let bootstrap = report.bootstrap.unwrap();
    assert_eq!(bootstrap.n_resamples, 200);
    // The model separates the classes; the majority baseline cannot.
    assert!(bootstrap.delta_mean < 0.0);
    assert!(bootstrap.model_significantly_better());
    assert!(bootstrap.p_value < 0.05);
}

#[test]
fn test_bootstrap_reproducible_across_runs() {
    let df = timed_dataset(160);
    let mut config = base_config();
    config.bootstrap.enabled = true;
    config.bootstrap.n_resamples = 100;

    let run = || {
        let output = fit_pipeline(&df, &config).unwrap();
        Evaluator::new(&config)
            .evaluate(&output, &df)
            .unwrap()
            .bootstrap
            .unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.delta_mean, b.delta_mean);
    assert_eq!(a.ci95, b.ci95);
    assert_eq!(a.p_value, b.p_value);
}

#[test]
fn test_bootstrap_disabled_omits_section() {
    let df = timed_dataset(120);
    let config = base_config();
    let output = fit_pipeline(&df, &config).unwrap();
    let report = Evaluator::new(&config).evaluate(&output, &df).unwrap();
    assert!(report.bootstrap.is_none());
    assert!(report.temporal.is_none());
}

#[test]
fn test_temporal_backtest_scores_latest_tail() {
    let df = timed_dataset(200);
    let mut config = base_config();
    config.temporal.enabled = true;
    config.temporal.test_size = 0.2;
    config.temporal.ordering_column = Some("week".to_string());
    config.temporal.min_segment_size = 5;

    let output = fit_pipeline(&df, &config).unwrap();
    let report = Evaluator::new(&config).evaluate(&output, &df).unwrap();

    let temporal = report.temporal.unwrap();
    assert_eq!(temporal.ordering_column, "week");
    assert_eq!(temporal.n_holdout, 40);
    assert_eq!(temporal.n_train, 160);
    assert!(temporal.metrics["accuracy"] > 0.9);

    // The channel column splits the 40-row holdout evenly.
    let channel_segments: Vec<_> = temporal
        .segments
        .iter()
        .filter(|s| s.segment_column == "channel")
        .collect();
    assert_eq!(channel_segments.len(), 2);
    for segment in channel_segments {
        assert_eq!(segment.sample_count, 20);
        assert!(segment.error <= 1.0);
    }
}

#[test]
fn test_temporal_requires_ordering_column() {
    let df = timed_dataset(100);
    let mut config = base_config();
    config.temporal.enabled = true;
    config.temporal.ordering_column = None;

    let output = fit_pipeline(&df, &config).unwrap();
    // The stage fails but evaluation still returns core metrics.
    let report = Evaluator::new(&config).evaluate(&output, &df).unwrap();
    assert!(report.temporal.is_none());
    assert!(report.metrics.contains_key("accuracy"));
}

#[test]
fn test_evaluator_persists_stage_artifacts() {
    let df = timed_dataset(200);
    let mut config = base_config();
    config.bootstrap.enabled = true;
    config.bootstrap.n_resamples = 50;
    config.temporal.enabled = true;
    config.temporal.ordering_column = Some("week".to_string());

    let dir = tempfile::tempdir().unwrap();
    let output = fit_pipeline(&df, &config).unwrap();
    let report = Evaluator::new(&config)
        .with_artifacts_dir(dir.path())
        .evaluate(&output, &df)
        .unwrap();

    assert!(dir.path().join("metrics.json").exists());
    assert!(dir.path().join("metrics_baseline.json").exists());
    assert!(dir.path().join("metrics_bootstrap.json").exists());
    assert!(dir.path().join("metrics_temporal.json").exists());

    // The persisted core metrics match the in-memory report.
    let on_disk = std::fs::read_to_string(dir.path().join("metrics.json")).unwrap();
    let parsed: std::collections::BTreeMap<String, f64> = serde_json::from_str(&on_disk).unwrap();
    assert_eq!(parsed, report.metrics);

    // Segment table exports to CSV as well.
    let temporal = report.temporal.unwrap();
    let csv_path = dir.path().join("segments.csv");
    veritrain::artifact::save_segments_csv(&temporal.segments, &csv_path).unwrap();
    assert!(std::fs::read_to_string(&csv_path)
        .unwrap()
        .starts_with("segment_column,segment_value,sample_count,error"));
}
