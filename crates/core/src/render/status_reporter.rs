use std::collections::HashMap;
use std::time::Instant;

use super::status::StatusReport;

/// Observer for session status changes and per-tick stage timings.
pub trait StatusReporter: Send {
    /// Called whenever the session status changes.
    fn status(&mut self, report: &StatusReport);

    /// Record how long a named stage took during one tick.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used by tests and embedders with their own UI.
pub struct NullStatusReporter;

impl StatusReporter for NullStatusReporter {
    fn status(&mut self, _report: &StatusReport) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
}

/// Writes status changes through `log` and keeps per-stage timings for a
/// closing summary.
pub struct LogStatusReporter {
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    changes: usize,
    last: Option<StatusReport>,
}

impl LogStatusReporter {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            start_time: Instant::now(),
            changes: 0,
            last: None,
        }
    }

    pub fn last_report(&self) -> Option<&StatusReport> {
        self.last.as_ref()
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the formatted summary, or `None` if no timing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let ticks = self.timings.get("base").map_or(0, Vec::len);
        let mut lines = vec![format!(
            "Session summary ({ticks} ticks, {} status changes, {:.1}s total):",
            self.changes,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.2}ms  total {total_ms:7.0}ms  ({} calls)",
                durations.len()
            ));
        }

        if ticks > 0 && elapsed_ms > 0.0 {
            let rate = ticks as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Tick rate: {rate:.1} Hz"));
        }
        if let Some(last) = &self.last {
            lines.push(format!("  Final status: {last}"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for LogStatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter for LogStatusReporter {
    fn status(&mut self, report: &StatusReport) {
        self.changes += 1;
        if report.status.is_terminal() {
            log::warn!("{report}");
        } else {
            log::info!("{report}");
        }
        self.last = Some(report.clone());
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
