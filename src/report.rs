//! Rendering of processor snapshots and component settings.
//!
//! The orchestrator hands every post-batch snapshot to a [`SnapshotSink`].
//! [`ConsoleReport`] writes plain-text blocks to stdout; [`CollectingSink`]
//! keeps snapshots in memory for tests and headless runs.

use crate::config::{OrchestratorConfig, ProcessorConfig, SensorConfig};
use crate::processor::stats::SeriesStats;
use crate::processor::ProcessorSnapshot;
use parking_lot::Mutex;
use std::fmt::Write as _;

/// Receives a snapshot after every absorbed batch.
pub trait SnapshotSink: Send + Sync {
    /// Render or record one snapshot. `print_data` asks for the full series.
    fn render(&self, snapshot: &ProcessorSnapshot, print_data: bool);
}

/// Writes text reports to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReport;

impl SnapshotSink for ConsoleReport {
    fn render(&self, snapshot: &ProcessorSnapshot, print_data: bool) {
        println!("{}", format_snapshot(snapshot, print_data));
    }
}

/// Keeps every snapshot it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    snapshots: Mutex<Vec<ProcessorSnapshot>>,
}

impl CollectingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of all recorded snapshots, oldest first.
    pub fn snapshots(&self) -> Vec<ProcessorSnapshot> {
        self.snapshots.lock().clone()
    }

    /// Number of recorded snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }
}

impl SnapshotSink for CollectingSink {
    fn render(&self, snapshot: &ProcessorSnapshot, _print_data: bool) {
        self.snapshots.lock().push(snapshot.clone());
    }
}

fn write_stats(out: &mut String, title: &str, stats: &SeriesStats) {
    let _ = writeln!(out, "{title}:");
    let _ = writeln!(out, "|- Number of Data Points: {}", stats.count);
    let _ = writeln!(out, "|- Min Value: {}", stats.min);
    let _ = writeln!(out, "|- Max Value: {}", stats.max);
    let _ = writeln!(out, "|- Average: {}", stats.average);
}

fn join(series: &[f64]) -> String {
    series
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text block for one snapshot.
pub fn format_snapshot(snapshot: &ProcessorSnapshot, print_data: bool) -> String {
    let mut out = String::new();
    write_stats(&mut out, "RAW DATA STATISTICS", &snapshot.raw_stats);
    write_stats(&mut out, "FILTERED DATA STATISTICS", &snapshot.filtered_stats);
    if print_data {
        let _ = writeln!(out, "SUBSET AVERAGES: {}", join(&snapshot.subset_averages));
        let _ = writeln!(out, "FILTERED DATA: {}", join(&snapshot.filtered));
        let _ = writeln!(out, "RAW DATA: {}", join(&snapshot.raw));
    }
    out
}

/// Text block describing the current configuration of every component.
pub fn format_configuration(
    sensor: &SensorConfig,
    processor: &ProcessorConfig,
    orchestrator: &OrchestratorConfig,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SENSOR CONFIGURATION:");
    let _ = writeln!(out, "|- Timing: {}", sensor.timing);
    let _ = writeln!(out, "|- Period: {} ms", sensor.period_ms);
    let _ = writeln!(out, "|__ Min Period: {} ms", sensor.min_period_ms);
    let _ = writeln!(out, "|__ Max Period: {} ms", sensor.max_period_ms);
    let _ = writeln!(out, "|- Value Type: {}", sensor.value_mode);
    let _ = writeln!(out, "|- Limit: {}", sensor.limit);
    let _ = writeln!(out, "|__ Upper Bound: {}", sensor.upper_bound);
    let _ = writeln!(out, "|__ Lower Bound: {}", sensor.lower_bound);
    let _ = writeln!(out, "|- Data Buffer Size: {}", sensor.buffer_capacity);
    let _ = writeln!(out, "|- Collect Policy: {}", sensor.collect_policy);
    let _ = writeln!(out);
    let _ = writeln!(out, "DATA PROCESSOR CONFIGURATION:");
    let _ = writeln!(out, "|- Filter Type: {}", processor.filter_kind);
    let _ = writeln!(out, "|- Filter Size: {}", processor.filter_size);
    let _ = writeln!(out, "|- Filter Granularity: {}", processor.filter_granularity);
    let _ = writeln!(out, "|- Number of Data Points: {}", processor.window_capacity);
    let _ = writeln!(out, "|- Polling Rate: {} ms", orchestrator.polling_rate_ms);
    let _ = writeln!(
        out,
        "|- Collect Size: {} data per polling",
        orchestrator.collect_size
    );
    let _ = writeln!(
        out,
        "|- Print Data: {}",
        if orchestrator.print_data { "True" } else { "False" }
    );
    out
}
