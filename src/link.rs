//! Capability interfaces the BLE stack calls into.
//!
//! The firmware supplies one handler that implements both observers; the
//! stack invokes them from its own event context. Implementations must
//! not touch blink or throughput state directly, they hand payloads over
//! to the tick loop instead.

/// What the peripheral should do after a peer disconnects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisconnectAction {
    ResumeAdvertising,
}

pub trait ConnectionObserver {
    fn on_connect(&mut self);
    fn on_disconnect(&mut self) -> DisconnectAction;
}

pub trait CharacteristicObserver {
    /// A peer wrote `value` to the command characteristic.
    fn on_write(&mut self, value: &[u8]);

    /// A peer enabled or disabled notifications.
    fn on_subscribe(&mut self, enabled: bool);
}

/// Connection bookkeeping backing the connection-count query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkState {
    connections: usize,
    subscribed: bool,
}

impl LinkState {
    pub const fn new() -> Self {
        Self {
            connections: 0,
            subscribed: false,
        }
    }

    pub fn connections(&self) -> usize {
        self.connections
    }

    pub fn is_connected(&self) -> bool {
        self.connections > 0
    }

    /// Whether the current peer asked for notifications.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn set_subscribed(&mut self, enabled: bool) {
        self.subscribed = enabled;
    }
}

impl ConnectionObserver for LinkState {
    fn on_connect(&mut self) {
        self.connections += 1;
    }

    fn on_disconnect(&mut self) -> DisconnectAction {
        self.connections = self.connections.saturating_sub(1);
        if self.connections == 0 {
            self.subscribed = false;
        }
        DisconnectAction::ResumeAdvertising
    }
}
