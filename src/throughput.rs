//! Byte throughput accounting for the BLE link.
//!
//! Cumulative counters only ever grow. Once per report window the
//! accountant compares them against the snapshot taken at the previous
//! report and turns the difference into a bytes/second rate, dividing by
//! the time that actually passed rather than the nominal window.

use core::fmt;

use crate::clock::{elapsed, Millis};
use crate::config::REPORT_INTERVAL_MS;

/// One periodic throughput summary.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateReport {
    /// Bytes received since boot.
    pub total_rx: u64,
    /// Bytes sent since boot.
    pub total_tx: u64,
    /// Receive rate over the last window (bytes/s).
    pub rx_rate: f32,
    /// Send rate over the last window (bytes/s).
    pub tx_rate: f32,
    /// Measured window length (ms).
    pub window_ms: Millis,
}

impl fmt::Display for RateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RX total: {} B | TX total: {} B | RX rate: {:.1} B/s | TX rate: {:.1} B/s",
            self.total_rx, self.total_tx, self.rx_rate, self.tx_rate
        )
    }
}

#[derive(Debug, Default)]
pub struct ThroughputAccountant {
    total_rx: u64,
    total_tx: u64,
    reported_rx: u64,
    reported_tx: u64,
    last_report_at: Millis,
}

impl ThroughputAccountant {
    /// All-zero counters; the first window is measured from t = 0.
    pub const fn new() -> Self {
        Self {
            total_rx: 0,
            total_tx: 0,
            reported_rx: 0,
            reported_tx: 0,
            last_report_at: 0,
        }
    }

    pub fn record_received(&mut self, n: usize) {
        self.total_rx = self.total_rx.saturating_add(n as u64);
    }

    pub fn record_sent(&mut self, n: usize) {
        self.total_tx = self.total_tx.saturating_add(n as u64);
    }

    pub fn total_received(&self) -> u64 {
        self.total_rx
    }

    pub fn total_sent(&self) -> u64 {
        self.total_tx
    }

    /// Emit a report if at least `REPORT_INTERVAL_MS` passed since the last.
    pub fn maybe_report(&mut self, now: Millis) -> Option<RateReport> {
        let window_ms = elapsed(now, self.last_report_at);
        if window_ms < REPORT_INTERVAL_MS {
            return None;
        }

        let seconds = window_ms as f32 / 1000.0;
        let rate = |delta: u64| {
            if seconds > 0.0 {
                delta as f32 / seconds
            } else {
                0.0
            }
        };

        let report = RateReport {
            total_rx: self.total_rx,
            total_tx: self.total_tx,
            rx_rate: rate(self.total_rx - self.reported_rx),
            tx_rate: rate(self.total_tx - self.reported_tx),
            window_ms,
        };

        self.reported_rx = self.total_rx;
        self.reported_tx = self.total_tx;
        self.last_report_at = now;

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_report_before_interval() {
        let mut acc = ThroughputAccountant::new();
        acc.record_received(10);
        assert_eq!(acc.maybe_report(0), None);
        assert_eq!(acc.maybe_report(999), None);
        assert!(acc.maybe_report(1_000).is_some());
    }

    #[test]
    fn rate_uses_measured_window() {
        let mut acc = ThroughputAccountant::new();
        acc.record_received(500);
        let report = acc.maybe_report(2_000).unwrap();
        assert_eq!(report.total_rx, 500);
        assert_eq!(report.rx_rate, 250.0);
        assert_eq!(report.tx_rate, 0.0);
        assert_eq!(report.window_ms, 2_000);
    }

    #[test]
    fn report_resets_snapshot_not_totals() {
        let mut acc = ThroughputAccountant::new();
        acc.record_received(500);
        acc.record_sent(40);
        acc.maybe_report(1_000).unwrap();

        acc.record_sent(60);
        let report = acc.maybe_report(2_000).unwrap();
        assert_eq!(report.total_rx, 500);
        assert_eq!(report.total_tx, 100);
        assert_eq!(report.rx_rate, 0.0);
        assert_eq!(report.tx_rate, 60.0);
    }

    #[test]
    fn next_window_starts_at_report_time() {
        let mut acc = ThroughputAccountant::new();
        acc.maybe_report(1_500).unwrap();
        assert_eq!(acc.maybe_report(2_400), None);
        assert!(acc.maybe_report(2_500).is_some());
    }

    #[test]
    fn counters_never_decrease() {
        let mut acc = ThroughputAccountant::new();
        let mut last = (0, 0);
        for i in 0..50u32 {
            acc.record_received(i as usize);
            if i % 3 == 0 {
                acc.record_sent(7);
            }
            acc.maybe_report(i * 400);
            let now = (acc.total_received(), acc.total_sent());
            assert!(now.0 >= last.0 && now.1 >= last.1);
            last = now;
        }
    }

    #[test]
    fn counters_saturate() {
        let mut acc = ThroughputAccountant::new();
        acc.total_rx = u64::MAX - 1;
        acc.record_received(10);
        assert_eq!(acc.total_received(), u64::MAX);
    }

    #[test]
    fn report_window_across_rollover() {
        let mut acc = ThroughputAccountant::new();
        acc.maybe_report(u32::MAX - 499).unwrap();
        acc.record_received(100);
        let report = acc.maybe_report(500).unwrap();
        assert_eq!(report.window_ms, 1_000);
        assert_eq!(report.rx_rate, 100.0);
    }

    #[test]
    fn status_line_format() {
        let report = RateReport {
            total_rx: 1234,
            total_tx: 56,
            rx_rate: 250.0,
            tx_rate: 12.5,
            window_ms: 1_000,
        };
        assert_eq!(
            report.to_string(),
            "RX total: 1234 B | TX total: 56 B | RX rate: 250.0 B/s | TX rate: 12.5 B/s"
        );
    }
}
