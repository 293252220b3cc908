//! Plain-text rendering of batch and sweep results.

use tbrs_core::{BatchSummary, SpanSweep};

/// One line per replication on stderr.
pub fn print_traces(summary: &BatchSummary) {
    for (i, trace) in summary.traces.iter().enumerate() {
        eprintln!("{:>6}  {trace}", i + 1);
    }
}

pub fn print_summary(summary: &BatchSummary) {
    println!("script               {}", summary.script);
    println!("replications         {}", summary.replications);
    println!("seed                 {}", summary.seed);
    println!("proportion correct   {:.4}", summary.proportion_correct);
    println!("serial position      {}", curve(&summary.serial_position));
    println!("mean trial duration  {:.2}s", summary.mean_trial_duration);

    let c = &summary.counters;
    println!(
        "recall misses        {} of {} ({:.1}%)",
        c.recall_misses,
        c.recall_attempts,
        c.miss_rate() * 100.0
    );
    println!(
        "refreshing           {} passes, {} re-encodings",
        c.refresh_passes, c.items_refreshed
    );
}

pub fn print_sweep(sweep: &SpanSweep) {
    println!("length  correct  serial position");
    for batch in &sweep.batches {
        println!(
            "{:>6}  {:.4}   {}",
            batch.serial_position.len(),
            batch.proportion_correct,
            curve(&batch.serial_position)
        );
    }
    println!("span    {:.3}", sweep.span);
}

fn curve(points: &[f64]) -> String {
    points
        .iter()
        .map(|p| format!("{p:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}
