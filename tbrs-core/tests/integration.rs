//! Integration Tests: end-to-end complex-span scenarios.
//!
//! Every scenario runs with a fixed seed, so the thresholds below are checked
//! against a reproducible sample rather than a lucky one.

use std::io::Write;

use tbrs_core::config::TbrsConfig;
use tbrs_core::embedding::EmbeddingTable;
use tbrs_core::error::TbrsError;
use tbrs_core::stimulus::StimulusScript;
use tbrs_core::trial::{TrialDriver, run_span_sweep};

fn config(memoranda: usize, operations: usize, replications: usize) -> TbrsConfig {
    let mut config = TbrsConfig::default();
    config.task.memoranda = memoranda;
    config.task.operations = operations;
    config.run.replications = replications;
    config.run.deterministic = true;
    config.run.seed = 2024;
    config
}

fn run(config: TbrsConfig) -> tbrs_core::BatchSummary {
    TrialDriver::new(config, None)
        .expect("valid config")
        .run_batch()
        .expect("batch runs")
}

// ---------------------------------------------------------------------------
// Recall accuracy scenarios
// ---------------------------------------------------------------------------

// The classic statement of this scenario uses P = 1, but identical position
// codes cannot carry order (see the collapse test below). Independent codes
// (P = 0) are what reach the ceiling.
#[test]
fn short_list_without_distraction_is_near_ceiling() {
    let mut cfg = config(3, 0, 200);
    cfg.model.position_persistence = 0.0;
    cfg.model.retrieval_noise = 0.0;
    cfg.model.retrieval_threshold = 0.0;
    let summary = run(cfg);
    assert!(
        summary.proportion_correct >= 0.95,
        "proportion correct {}",
        summary.proportion_correct
    );
}

#[test]
fn identical_position_codes_collapse_onto_the_latest_item() {
    // With P = 1 every position shares one code, so serial order cannot be
    // recovered and the most recent item dominates every probe.
    let mut cfg = config(3, 0, 200);
    cfg.model.position_persistence = 1.0;
    cfg.model.retrieval_noise = 0.0;
    cfg.model.retrieval_threshold = 0.0;
    let summary = run(cfg);
    assert!(
        summary.proportion_correct < 0.6,
        "proportion correct {}",
        summary.proportion_correct
    );
}

#[test]
fn distractor_load_depresses_recall() {
    let baseline = run(config(5, 0, 300));
    let loaded = run(config(5, 8, 300));
    assert!(
        loaded.proportion_correct < baseline.proportion_correct - 0.1,
        "baseline {} loaded {}",
        baseline.proportion_correct,
        loaded.proportion_correct
    );

    let curve = &loaded.serial_position;
    assert_eq!(curve.len(), 5);
    assert!(
        curve[0] > curve[4] + 0.2,
        "serial position curve is flat: {curve:?}"
    );
}

#[test]
fn unreachable_threshold_recalls_nothing() {
    let mut cfg = config(4, 1, 20);
    cfg.model.retrieval_threshold = 100.0;
    let summary = run(cfg);
    assert!(summary.proportion_correct.abs() < f64::EPSILON);
    assert!(summary.traces.iter().all(|t| t == "...."));
    assert_eq!(summary.counters.recall_misses, 80);
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn fixed_seed_reproduces_traces_serially_and_in_parallel() {
    let mut serial = config(5, 3, 40);
    serial.run.parallel = false;
    let mut parallel = serial.clone();
    parallel.run.parallel = true;

    let a = run(serial.clone());
    let b = run(serial);
    let c = run(parallel);
    assert_eq!(a.traces, b.traces);
    assert_eq!(a.traces, c.traces);
    assert_eq!(a.proportion_correct.to_bits(), c.proportion_correct.to_bits());
    assert_eq!(a.serial_position, c.serial_position);
    assert_eq!(a.counters, c.counters);
}

#[test]
fn different_seeds_give_different_traces() {
    let a = run(config(6, 4, 30));
    let mut other = config(6, 4, 30);
    other.run.seed = 2025;
    let b = run(other);
    assert_ne!(a.traces, b.traces);
}

// ---------------------------------------------------------------------------
// Fatal errors abort the batch
// ---------------------------------------------------------------------------

#[test]
fn distractor_budget_is_exact() {
    // 3 memoranda x 4 operations = 12 distractors.
    let mut cfg = config(3, 4, 3);
    cfg.geometry.max_distractors = 12;
    assert!(TrialDriver::new(cfg.clone(), None).expect("driver").run_batch().is_ok());

    cfg.geometry.max_distractors = 11;
    let err = TrialDriver::new(cfg, None)
        .expect("driver")
        .run_batch()
        .expect_err("budget exceeded");
    assert!(matches!(err, TbrsError::DistractorBudgetExhausted { capacity: 11 }));
}

#[test]
fn shared_distractor_needs_a_single_slot() {
    let mut cfg = config(3, 4, 3);
    cfg.geometry.max_distractors = 1;
    cfg.task.same_distractor = true;
    let summary = run(cfg);
    assert_eq!(summary.counters.distractors_encoded, 36);
}

#[test]
fn too_many_operations_is_rejected() {
    let err = TrialDriver::new(config(3, 17, 1), None).expect_err("rejected");
    assert!(matches!(err, TbrsError::TooManyOperations { requested: 17, max: 16 }));
}

#[test]
fn out_of_range_overlap_is_rejected() {
    let mut cfg = config(3, 2, 1);
    cfg.task.item_distractor_overlap = 1.5;
    assert!(matches!(TrialDriver::new(cfg, None), Err(TbrsError::Config(_))));
}

#[test]
fn unknown_symbol_in_a_custom_script() {
    let err = StimulusScript::parse("A12B1x#").expect_err("unknown symbol");
    assert!(matches!(err, TbrsError::UnknownSymbol { symbol: 'x', index: 5 }));
}

#[test]
fn custom_script_runs_end_to_end() {
    let script = StimulusScript::parse("A1:B#").expect("parse");
    let driver = TrialDriver::new(config(2, 0, 10), None)
        .expect("driver")
        .with_script(script)
        .expect("script fits");
    let summary = driver.run_batch().expect("batch");
    assert_eq!(summary.script, "A1:B#");
    assert_eq!(summary.counters.distractors_encoded, 20);
    assert!(summary.traces.iter().all(|t| t.len() == 2));
}

#[test]
fn reordered_script_is_scored_against_the_studied_order() {
    let mut cfg = config(2, 0, 50);
    cfg.run.parallel = false;
    cfg.model.position_persistence = 0.0;
    cfg.model.retrieval_noise = 0.0;
    cfg.model.retrieval_threshold = 0.0;
    let script = StimulusScript::parse("BA#").expect("parse");
    let summary = TrialDriver::new(cfg, None)
        .expect("driver")
        .with_script(script)
        .expect("script fits")
        .run_batch()
        .expect("batch");

    let in_studied_order = summary.traces.iter().filter(|t| *t == "BA").count();
    assert!(in_studied_order >= 45, "traces {:?}", summary.traces);
    let expected = in_studied_order as f64 / 50.0;
    assert!(
        summary.proportion_correct >= expected - 1e-12,
        "proportion correct {} with {in_studied_order} ordered traces",
        summary.proportion_correct
    );
}

// ---------------------------------------------------------------------------
// Span sweep
// ---------------------------------------------------------------------------

#[test]
fn span_sweep_covers_every_list_length() {
    let sweep = run_span_sweep(&config(4, 0, 50), None).expect("sweep");
    assert_eq!(sweep.batches.len(), 4);
    for (i, batch) in sweep.batches.iter().enumerate() {
        assert_eq!(batch.serial_position.len(), i + 1);
    }
    assert!(sweep.batches[0].proportion_correct > 0.9);
    assert!(sweep.span > 1.0 && sweep.span <= 4.0, "span {}", sweep.span);
    let total: f64 = sweep.batches.iter().map(|b| b.proportion_correct).sum();
    assert!((sweep.span - total).abs() < 1e-12);
}

// ---------------------------------------------------------------------------
// File inputs
// ---------------------------------------------------------------------------

#[test]
fn config_file_with_short_names() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        "[model]\nP = 0.5\nD = 0.4\n[task]\nnbmemo = 4\nnbop = 2\nfreeTime = 0.8\n[run]\nnbSimulations = 10\ndeterm = true\nseed = 3"
    )
    .expect("write");

    let cfg = TbrsConfig::from_file(file.path()).expect("load");
    assert_eq!(cfg.task.memoranda, 4);
    assert!((cfg.task.free_time - 0.8).abs() < f64::EPSILON);
    let summary = run(cfg);
    assert_eq!(summary.seed, 3);
    assert_eq!(summary.replications, 10);
    assert_eq!(summary.script, "A12B12C12D12#");
}

#[test]
fn embedding_table_file_seeds_memoranda() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    for row in 0..10_u32 {
        let values: Vec<String> = (0..100_u32)
            .map(|d| format!("{:.3}", f64::from((row * 37 + d * 11) % 100) / 100.0))
            .collect();
        writeln!(file, "{}", values.join(", ")).expect("write");
    }

    let table = EmbeddingTable::from_file(file.path()).expect("load");
    assert_eq!(table.len(), 10);
    let summary = TrialDriver::new(config(4, 1, 20), Some(table))
        .expect("driver")
        .run_batch()
        .expect("batch");
    assert_eq!(summary.traces.len(), 20);

    let short = EmbeddingTable::from_rows(vec![vec![0.5; 100]; 4]);
    assert!(matches!(
        TrialDriver::new(config(4, 1, 20), Some(short)),
        Err(TbrsError::Embedding(_))
    ));
}

#[test]
fn summary_serialises_to_json() {
    let summary = run(config(3, 1, 5));
    let json = summary.to_json().expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse back");
    assert_eq!(value["replications"], 5);
    assert_eq!(value["config"]["task"]["memoranda"], 3);
    assert_eq!(value["traces"].as_array().map(Vec::len), Some(5));
}
