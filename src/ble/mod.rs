//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **GATT server** - one service with a read/write/notify command
//!    characteristic (`gatt`).
//! 2. **Advertiser** - advertises, accepts a central, runs the GATT server
//!    until the link drops, then resumes advertising (`peripheral`).
//! 3. **Notifier** - the [`NotifyPort`] the tick loop uses to push operator
//!    payloads to the connected central.
//!
//! The BLE event context never touches application state: writes are
//! copied into a channel drained by the tick loop. The only state shared
//! with the tick loop is [`LINK`], held for a single read or update.

pub mod gatt;
pub mod peripheral;

use core::cell::RefCell;

use callbeacon::config::CHARACTERISTIC_MAX_LEN;
use callbeacon::link::LinkState;
use callbeacon::notify::{NotifyPort, NotifyRejected};
use defmt::warn;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;
use nrf_softdevice::ble::gatt_server::NotifyValueError;
use nrf_softdevice::ble::Connection;

use crate::error::{BleError, Error};
use gatt::Server;

/// Raw value of one characteristic write.
pub type WritePayload = Vec<u8, CHARACTERISTIC_MAX_LEN>;

/// Current connection and its bookkeeping.
pub struct SharedLink {
    pub conn: Option<Connection>,
    pub state: LinkState,
}

impl SharedLink {
    const fn new() -> Self {
        Self {
            conn: None,
            state: LinkState::new(),
        }
    }
}

/// Link shared between the BLE task and the tick loop.
pub static LINK: Mutex<CriticalSectionRawMutex, RefCell<SharedLink>> =
    Mutex::new(RefCell::new(SharedLink::new()));

/// [`NotifyPort`] backed by the SoftDevice GATT server.
pub struct SoftdeviceNotifier {
    server: &'static Server,
}

impl SoftdeviceNotifier {
    pub fn new(server: &'static Server) -> Self {
        Self { server }
    }
}

impl NotifyPort for SoftdeviceNotifier {
    fn connected_peers(&self) -> usize {
        LINK.lock(|link| link.borrow().state.connections())
    }

    /// The characteristic can carry notifications to this peer only once
    /// it has written the CCCD.
    fn characteristic_ready(&self) -> bool {
        LINK.lock(|link| link.borrow().state.is_subscribed())
    }

    fn notify(&mut self, payload: &[u8]) -> Result<(), NotifyRejected> {
        let Some(conn) = LINK.lock(|link| link.borrow().conn.clone()) else {
            return Err(NotifyRejected);
        };

        let value = WritePayload::from_slice(payload).map_err(|_| {
            warn!("notify payload too long: {} bytes", payload.len());
            NotifyRejected
        })?;

        self.server.beacon.command_notify(&conn, &value).map_err(|e| {
            let err = match e {
                NotifyValueError::Disconnected => Error::Ble(BleError::NotifyFailed),
                NotifyValueError::Raw(raw) => Error::Ble(BleError::from(raw)),
            };
            warn!("notify failed: {}", err);
            NotifyRejected
        })
    }
}
