//! GATT server definition.
//!
//! One primary service with a single characteristic that accepts command
//! writes, serves reads from the SoftDevice attribute table, and carries
//! operator notifications back to the central.

use callbeacon::config::{CHARACTERISTIC_INITIAL_VALUE, CHARACTERISTIC_MAX_LEN};
use defmt::info;

use crate::ble::WritePayload;
use crate::error::{BleError, Error};

#[nrf_softdevice::gatt_service(uuid = "9b2a1c50-4f66-4c3e-9a6b-6f0c6b2f3a01")]
pub struct BeaconService {
    #[characteristic(uuid = "9b2a1c50-4f66-4c3e-9a6b-6f0c6b2f3a02", read, write, notify)]
    pub command: heapless::Vec<u8, CHARACTERISTIC_MAX_LEN>,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub beacon: BeaconService,
}

/// Seed the characteristic with its placeholder value.
pub fn seed(server: &Server) -> Result<(), Error> {
    let value =
        WritePayload::from_slice(CHARACTERISTIC_INITIAL_VALUE).map_err(|_| Error::BufferOverflow)?;
    server
        .beacon
        .command_set(&value)
        .map_err(|_| BleError::SetValueFailed)?;
    info!(
        "Characteristic seeded with {=[u8]:a}",
        CHARACTERISTIC_INITIAL_VALUE
    );
    Ok(())
}
