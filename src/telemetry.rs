//! Bounded telemetry ring buffer and CSV sink thread.
//!
//! The buffer is a `Mutex<VecDeque>` guarded by two `Condvar`s (not-empty,
//! not-full) -- the safe-Rust shape of the producer/consumer semaphore pair
//! the control/writer threads use upstream.

use std::collections::VecDeque;
use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::TelemetryRecord;
use crate::error::CsvSinkError;
use crate::safety::ControlMode;

const CAPACITY: usize = 1000;
const FLUSH_EVERY: usize = 10;

struct RingState {
    queue: VecDeque<TelemetryRecord>,
}

/// Bounded MPSC-style ring buffer shared between the control worker
/// (producer) and the CSV sink thread (consumer).
pub struct TelemetryRing {
    state: Mutex<RingState>,
    not_empty: Condvar,
    not_full: Condvar,
    shutdown: AtomicBool,
}

impl TelemetryRing {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(RingState { queue: VecDeque::with_capacity(CAPACITY) }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Blocks the producer while the ring is full; returns immediately after
    /// shutdown is requested without enqueuing.
    pub fn push(&self, record: TelemetryRecord) {
        let mut state = self.state.lock().unwrap();
        while state.queue.len() >= CAPACITY && !self.shutdown.load(Ordering::Acquire) {
            state = self.not_full.wait(state).unwrap();
        }
        if self.shutdown.load(Ordering::Acquire) {
            return;
        }
        state.queue.push_back(record);
        self.not_empty.notify_one();
    }

    /// Waits up to 100ms for a record; `None` means either a timeout or a
    /// shutdown with the queue drained.
    fn pop_timeout(&self) -> Option<TelemetryRecord> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(record) = state.queue.pop_front() {
                self.not_full.notify_one();
                return Some(record);
            }
            if self.shutdown.load(Ordering::Acquire) {
                return None;
            }
            let (next, timed_out) = self.not_empty.wait_timeout(state, Duration::from_millis(100)).unwrap();
            state = next;
            if timed_out.timed_out() && state.queue.is_empty() && self.shutdown.load(Ordering::Acquire) {
                return None;
            }
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }
}

/// Drains `ring` into a CSV file at `path`, one row per axis per record,
/// flushing every `FLUSH_EVERY` records. Returns once the ring is shut down
/// and drained.
pub fn run_csv_sink(ring: Arc<TelemetryRing>, path: &str) -> Result<(), CsvSinkError> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(["step", "time", "target", "actual", "error", "force", "mode"])?;

    let mut since_flush = 0usize;
    info!("csv sink writing to {path}");

    while let Some(record) = ring.pop_timeout() {
        for (_axis, snap) in &record.axes {
            let mode = if snap.mode_is_open { ControlMode::Open } else { ControlMode::Closed };
            writer.write_record([
                record.step.to_string(),
                format!("{:.9}", record.time),
                format!("{:.15}", snap.target),
                format!("{:.15}", snap.actual),
                format!("{:.15}", snap.error),
                format!("{:.9}", snap.force),
                (mode == ControlMode::Open).then_some("1").unwrap_or("0").to_string(),
            ])?;
        }
        since_flush += 1;
        if since_flush >= FLUSH_EVERY {
            writer.flush()?;
            since_flush = 0;
        }
    }

    writer.flush()?;
    info!("csv sink drained and closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AxisSnapshot;

    fn sample_record(step: u32) -> TelemetryRecord {
        TelemetryRecord {
            step,
            time: step as f64 * 1e-3,
            axes: vec![(0, AxisSnapshot { target: 1.0, actual: 0.9, error: 0.1, force: 5.0, mode_is_open: false })],
        }
    }

    #[test]
    fn push_then_pop_preserves_order() {
        let ring = TelemetryRing::new();
        ring.push(sample_record(0));
        ring.push(sample_record(1));
        assert_eq!(ring.pop_timeout().unwrap().step, 0);
        assert_eq!(ring.pop_timeout().unwrap().step, 1);
    }

    #[test]
    fn pop_returns_none_after_shutdown_and_drain() {
        let ring = TelemetryRing::new();
        ring.push(sample_record(0));
        ring.shutdown();
        assert_eq!(ring.pop_timeout().unwrap().step, 0);
        assert!(ring.pop_timeout().is_none());
    }

    #[test]
    fn csv_sink_writes_header_and_one_row_per_axis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.csv");
        let ring = TelemetryRing::new();
        ring.push(sample_record(0));
        ring.shutdown();

        run_csv_sink(ring, path.to_str().unwrap()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "step,time,target,actual,error,force,mode");
        assert_eq!(lines.count(), 1);
    }
}
