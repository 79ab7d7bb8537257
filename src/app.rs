//! Application context: the one owner of blink and throughput state.
//!
//! Inbound writes, operator payloads and ticks all go through
//! `&mut AppContext`, so the firmware has to funnel them into a single
//! task. There is no shared mutable state left for the BLE event context
//! to race against.

use embedded_hal::digital::OutputPin;

use crate::blink::{BlinkScheduler, OutputId};
use crate::clock::{Clock, Millis};
use crate::command::{self, Command};
use crate::notify::{NotificationSender, NotifyPort, SendOutcome};
use crate::throughput::{RateReport, ThroughputAccountant};

/// What an inbound write did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// The command's indicator was (re)started.
    Started(Command),
    /// Recognised command, but no indicator owns its output.
    Unmapped(Command),
    /// Token outside the vocabulary; ignored.
    Unknown,
}

pub struct AppContext<C, P, const N: usize> {
    clock: C,
    blink: BlinkScheduler<P, N>,
    throughput: ThroughputAccountant,
}

impl<C: Clock, P: OutputPin, const N: usize> AppContext<C, P, N> {
    pub fn new(clock: C, blink: BlinkScheduler<P, N>) -> Self {
        Self {
            clock,
            blink,
            throughput: ThroughputAccountant::new(),
        }
    }

    pub fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Account for and dispatch one write to the command characteristic.
    pub fn handle_write(&mut self, raw: &[u8]) -> Dispatch {
        self.throughput.record_received(raw.len());

        let Some(cmd) = Command::from_token(command::normalize(raw)) else {
            return Dispatch::Unknown;
        };

        let now = self.clock.now_ms();
        if self.blink.start(cmd.output(), now) {
            Dispatch::Started(cmd)
        } else {
            Dispatch::Unmapped(cmd)
        }
    }

    /// Start an indicator directly, bypassing the command vocabulary.
    pub fn start(&mut self, output: OutputId) -> bool {
        let now = self.clock.now_ms();
        self.blink.start(output, now)
    }

    /// Advance blink tasks; returns a throughput report when one is due.
    pub fn tick(&mut self) -> Option<RateReport> {
        let now = self.clock.now_ms();
        self.blink.update(now);
        self.throughput.maybe_report(now)
    }

    /// Push an operator payload to the peer, best effort.
    pub fn notify<T: NotifyPort>(
        &mut self,
        sender: &mut NotificationSender<T>,
        payload: &[u8],
    ) -> SendOutcome {
        sender.send(payload, &mut self.throughput)
    }

    pub fn blink(&self) -> &BlinkScheduler<P, N> {
        &self.blink
    }

    pub fn throughput(&self) -> &ThroughputAccountant {
        &self.throughput
    }
}
