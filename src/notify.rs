//! Best-effort outbound notifications.
//!
//! A payload is pushed to the connected peer only if one is connected and
//! the outbound characteristic is registered. Nothing is queued or retried:
//! a payload that cannot go out right now is dropped and the reason is
//! handed back to the caller for logging.

use crate::throughput::ThroughputAccountant;

/// Notify primitive of the BLE stack.
pub trait NotifyPort {
    /// Number of currently connected peers.
    fn connected_peers(&self) -> usize;

    /// `true` once the outbound characteristic has a valid handle.
    fn characteristic_ready(&self) -> bool;

    /// Push `payload` to the peer.
    fn notify(&mut self, payload: &[u8]) -> Result<(), NotifyRejected>;
}

/// The stack refused a notification (e.g. the peer has not subscribed).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotifyRejected;

/// Why a payload was not sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropReason {
    /// No peer is connected.
    NoClient,
    /// The outbound characteristic is not available.
    NoCharacteristic,
    /// The stack rejected the notification.
    NotifyFailed,
}

/// Result of a send attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendOutcome {
    /// Payload handed to the stack; carries its length in bytes.
    Sent(usize),
    Dropped(DropReason),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent(_))
    }
}

pub struct NotificationSender<T> {
    port: T,
}

impl<T: NotifyPort> NotificationSender<T> {
    pub fn new(port: T) -> Self {
        Self { port }
    }

    pub fn port(&self) -> &T {
        &self.port
    }

    /// Send `payload` if a peer can receive it, counting sent bytes.
    pub fn send(&mut self, payload: &[u8], counters: &mut ThroughputAccountant) -> SendOutcome {
        if self.port.connected_peers() == 0 {
            return SendOutcome::Dropped(DropReason::NoClient);
        }
        if !self.port.characteristic_ready() {
            return SendOutcome::Dropped(DropReason::NoCharacteristic);
        }

        match self.port.notify(payload) {
            Ok(()) => {
                counters.record_sent(payload.len());
                SendOutcome::Sent(payload.len())
            }
            Err(NotifyRejected) => SendOutcome::Dropped(DropReason::NotifyFailed),
        }
    }
}
