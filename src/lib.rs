//! Host-testable core of the callbeacon firmware.
//!
//! Everything with state, timing or correctness rules lives here and
//! builds without any hardware: command parsing, the blink scheduler,
//! the notification sender and the throughput accountant. The embedded
//! binary (`main.rs`, `embedded` feature) wires these to the SoftDevice,
//! the GPIO pins and the USB console.
//!
//! Usage: `cargo test` (host) or
//! `cargo run --release --features embedded --target thumbv7em-none-eabihf`.

#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod blink;
pub mod clock;
pub mod command;
pub mod config;
pub mod console;
pub mod link;
pub mod notify;
pub mod throughput;

#[cfg(test)]
mod testing;

pub use app::{AppContext, Dispatch};
pub use blink::{BlinkScheduler, Indicator, OutputId, Polarity};
pub use command::Command;
pub use notify::{DropReason, NotificationSender, NotifyPort, SendOutcome};
pub use throughput::{RateReport, ThroughputAccountant};

// ═══════════════════════════════════════════════════════════════════════════
// Cross-module Tests
// ═══════════════════════════════════════════════════════════════════════════
