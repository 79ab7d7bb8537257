//! Advertising and connection loop.
//!
//! Advertise → accept one central → run the GATT server until the link
//! drops → resume advertising. Characteristic events are routed through
//! [`BeaconHandler`], which implements the two observer traits and only
//! ever hands data over to the tick loop via channels.

use callbeacon::config;
use callbeacon::link::{CharacteristicObserver, ConnectionObserver, DisconnectAction};
use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::Timer;
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection, TxPower};
use nrf_softdevice::{raw, Softdevice};

use crate::ble::gatt::{BeaconServiceEvent, Server, ServerEvent};
use crate::ble::{WritePayload, LINK};
use crate::error::{BleError, Error};

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .full_name(config::BLE_DEVICE_NAME)
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_128(
        ServiceList::Complete,
        &[config::BLE_SERVICE_UUID.to_le_bytes()],
    )
    .build();

/// Observer handed to the BLE stack's event callbacks.
struct BeaconHandler {
    writes: Sender<'static, CriticalSectionRawMutex, WritePayload, { config::WRITE_QUEUE_DEPTH }>,
}

impl BeaconHandler {
    fn attach(&mut self, conn: &Connection) {
        LINK.lock(|link| link.borrow_mut().conn = Some(conn.clone()));
        self.on_connect();
    }
}

impl ConnectionObserver for BeaconHandler {
    fn on_connect(&mut self) {
        LINK.lock(|link| link.borrow_mut().state.on_connect());
        info!("Client connected");
    }

    fn on_disconnect(&mut self) -> DisconnectAction {
        let action = LINK.lock(|link| {
            let mut link = link.borrow_mut();
            link.conn = None;
            link.state.on_disconnect()
        });
        info!("Client disconnected");
        action
    }
}

impl CharacteristicObserver for BeaconHandler {
    fn on_write(&mut self, value: &[u8]) {
        info!("Characteristic write: {=[u8]:a}", value);

        let Ok(payload) = WritePayload::from_slice(value) else {
            warn!("write of {} bytes exceeds characteristic size", value.len());
            return;
        };
        // try_send avoids blocking the SoftDevice callback; if the tick
        // loop is behind, we drop.
        if self.writes.try_send(payload).is_err() {
            warn!("Write queue full - dropping command");
        }
    }

    fn on_subscribe(&mut self, enabled: bool) {
        LINK.lock(|link| link.borrow_mut().state.set_subscribed(enabled));
        info!("Notifications {}", if enabled { "enabled" } else { "disabled" });
    }
}

fn request_conn_params(conn: &Connection) {
    let params = raw::ble_gap_conn_params_t {
        min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
        max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
        slave_latency: config::BLE_SLAVE_LATENCY,
        conn_sup_timeout: config::BLE_SUP_TIMEOUT,
    };
    if let Err(e) = conn.set_conn_params(params) {
        warn!("set_conn_params error: {:?}", e);
    }
}

/// Advertise and serve centrals forever.
pub async fn run(
    sd: &'static Softdevice,
    server: &'static Server,
    writes: Sender<'static, CriticalSectionRawMutex, WritePayload, { config::WRITE_QUEUE_DEPTH }>,
) -> ! {
    let mut handler = BeaconHandler { writes };

    loop {
        let adv_config = peripheral::Config {
            interval: config::BLE_ADV_INTERVAL,
            tx_power: TxPower::Plus8dBm,
            ..Default::default()
        };
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };

        info!("BLE advertising started");
        let conn = match peripheral::advertise_connectable(sd, adv, &adv_config).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("advertise error: {:?}", e);
                warn!("{}", Error::from(BleError::AdvertiseFailed));
                Timer::after_millis(config::BLE_ADV_RETRY_MS).await;
                continue;
            }
        };

        request_conn_params(&conn);
        handler.attach(&conn);

        // Returns when the connection is closed. The event enums are
        // generated by the `gatt_server` macro on `Server`.
        let reason = gatt_server::run(&conn, server, |event| match event {
            ServerEvent::Beacon(event) => match event {
                BeaconServiceEvent::CommandWrite(value) => handler.on_write(&value),
                BeaconServiceEvent::CommandCccdWrite { notifications } => {
                    handler.on_subscribe(notifications)
                }
            },
        })
        .await;
        info!("GATT server stopped: {:?}", reason);

        match handler.on_disconnect() {
            DisconnectAction::ResumeAdvertising => continue,
        }
    }
}
