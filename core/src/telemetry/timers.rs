//! telemetry/timers.rs
//! Per-stage wall time for one envelope operation.
//!
//! Stages are a closed set, so times live in a fixed slot per stage rather
//! than a map. A slot is `None` until the stage is first charged.

use std::fmt;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Header,
    Read,
    Encrypt,
    Decrypt,
    Write,
}

impl Stage {
    pub const ALL: [Stage; 5] = [Stage::Header, Stage::Read, Stage::Encrypt, Stage::Decrypt, Stage::Write];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Header => "header",
            Stage::Read => "read",
            Stage::Encrypt => "encrypt",
            Stage::Decrypt => "decrypt",
            Stage::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimes {
    slots: [Option<Duration>; 5],
}

impl StageTimes {
    /// Charge `dur` to `stage`; repeated charges accumulate.
    pub fn add(&mut self, stage: Stage, dur: Duration) {
        let slot = &mut self.slots[stage.slot()];
        *slot = Some(slot.unwrap_or_default() + dur);
    }

    pub fn get(&self, stage: Stage) -> Duration {
        self.slots[stage.slot()].unwrap_or_default()
    }

    pub fn get_ms(&self, stage: Stage) -> f64 {
        self.get(stage).as_secs_f64() * 1e3
    }

    pub fn get_us(&self, stage: Stage) -> f64 {
        self.get(stage).as_secs_f64() * 1e6
    }

    pub fn total(&self) -> Duration {
        self.slots.iter().flatten().sum()
    }

    /// Every stage in `expected` was charged at least once (even with zero time).
    pub fn has_all(&self, expected: &[Stage]) -> bool {
        expected.iter().all(|s| self.slots[s.slot()].is_some())
    }

    /// Charged stages in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, Duration)> + '_ {
        Stage::ALL
            .into_iter()
            .filter_map(move |s| self.slots[s.slot()].map(|d| (s, d)))
    }
}

/// Wall clock for one call plus its per-stage breakdown.
#[derive(Clone, Debug)]
pub struct TelemetryTimer {
    started: Instant,
    finished: Option<Instant>,
    pub stage_times: StageTimes,
}

impl Default for TelemetryTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryTimer {
    pub fn new() -> Self {
        Self { started: Instant::now(), finished: None, stage_times: StageTimes::default() }
    }

    /// Freeze `elapsed`. Later calls keep the first stop time.
    pub fn finish(&mut self) {
        self.finished.get_or_insert_with(Instant::now);
    }

    pub fn add_stage_time(&mut self, stage: Stage, dur: Duration) {
        self.stage_times.add(stage, dur);
    }

    /// Run `f`, charging its wall time to `stage`.
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let t = Instant::now();
        let out = f();
        self.stage_times.add(stage, t.elapsed());
        out
    }

    pub fn elapsed(&self) -> Duration {
        self.finished.unwrap_or_else(Instant::now) - self.started
    }
}
