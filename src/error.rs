//! Unified error type for the firmware layer.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

use defmt::Format;

/// Top-level error type used by the embedded tasks.
#[derive(Debug, Format)]
pub enum Error {
    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    // USB
    /// The console endpoint was disabled or overflowed.
    Usb,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, Format)]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// Advertising could not be started or was aborted.
    AdvertiseFailed,
    /// The GATT server could not be registered.
    RegisterFailed,
    /// Writing a characteristic value into the attribute table failed.
    SetValueFailed,
    /// Characteristic notify was rejected by the stack.
    NotifyFailed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}

impl From<nrf_softdevice::RawError> for BleError {
    fn from(e: nrf_softdevice::RawError) -> Self {
        BleError::Raw(e as u32)
    }
}

impl From<embassy_usb::driver::EndpointError> for Error {
    fn from(_: embassy_usb::driver::EndpointError) -> Self {
        Error::Usb
    }
}
