//! telemetry/snapshot.rs
//! What one seal or open cost, frozen when the call returns.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub chunks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub bytes_overhead: u64,
    /// Input bytes per second of wall time; 0 when nothing was measurable.
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();
        let secs = elapsed.as_secs_f64();
        Self {
            chunks: counters.chunks,
            bytes_in: counters.bytes_in,
            bytes_out: counters.bytes_out,
            bytes_overhead: counters.bytes_overhead,
            throughput_bytes_per_sec: if secs > 0.0 { counters.bytes_in as f64 / secs } else { 0.0 },
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        self.stage_times.has_all(expected)
    }

    /// Stages are measured inside the wall clock, so their sum cannot exceed it.
    pub fn sanity_check(&self) -> bool {
        self.total_stage_time() <= self.elapsed
    }
}
