//! callbeacon firmware entry point.
//!
//! Task layout:
//!
//! - `softdevice_task` runs the SoftDevice event loop.
//! - `ble_task` advertises, serves the GATT characteristic and queues
//!   inbound writes on [`WRITE_EVENTS`].
//! - `usb_task` / `console_task` run the CDC-ACM operator console.
//! - `app_task` owns the [`AppContext`]: every tick it drains both input
//!   queues, advances the blink tasks and publishes throughput reports.

#![no_std]
#![no_main]

mod ble;
mod error;
mod usb;

use core::fmt::Write as _;
use core::mem;

use callbeacon::clock::{Clock, Millis};
use callbeacon::config::{
    self, INDICATOR_COUNT, OPERATOR_QUEUE_DEPTH, STATUS_QUEUE_DEPTH, TICK_INTERVAL_MS,
    WRITE_QUEUE_DEPTH,
};
use callbeacon::{
    AppContext, BlinkScheduler, Dispatch, DropReason, Indicator, NotificationSender, SendOutcome,
};
use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, Ticker};
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ble::gatt::Server;
use ble::{SoftdeviceNotifier, WritePayload};
use error::{BleError, Error};
use usb::console::{ConsoleLine, StatusLine, UsbDriver};

/// Characteristic writes, BLE task → tick loop.
static WRITE_EVENTS: Channel<CriticalSectionRawMutex, WritePayload, WRITE_QUEUE_DEPTH> =
    Channel::new();

/// Operator lines, console → tick loop.
static OPERATOR_LINES: Channel<CriticalSectionRawMutex, ConsoleLine, OPERATOR_QUEUE_DEPTH> =
    Channel::new();

/// Status lines, tick loop → console.
static STATUS_LINES: Channel<CriticalSectionRawMutex, StatusLine, STATUS_QUEUE_DEPTH> =
    Channel::new();

static SERVER: StaticCell<Server> = StaticCell::new();

/// Embassy time driver truncated to the wrapping millisecond counter.
struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> Millis {
        Instant::now().as_millis() as Millis
    }
}

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(sd: &'static Softdevice, server: &'static Server) -> ! {
    ble::peripheral::run(sd, server, WRITE_EVENTS.sender()).await
}

#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

#[embassy_executor::task]
async fn console_task(class: embassy_usb::class::cdc_acm::CdcAcmClass<'static, UsbDriver>) -> ! {
    usb::console::run(class, OPERATOR_LINES.sender(), STATUS_LINES.receiver()).await
}

#[embassy_executor::task]
async fn app_task(server: &'static Server, leds: [Output<'static>; INDICATOR_COUNT]) {
    let [call_1, call_2, call_3, door] = leds;
    let blink = unwrap!(BlinkScheduler::new([
        (config::OUTPUT_CALL_1, Indicator::active_low(call_1)),
        (config::OUTPUT_CALL_2, Indicator::active_low(call_2)),
        (config::OUTPUT_CALL_3, Indicator::active_low(call_3)),
        (config::OUTPUT_DOOR, Indicator::active_low(door)),
    ]));

    let mut app = AppContext::new(EmbassyClock, blink);
    let mut sender = NotificationSender::new(SoftdeviceNotifier::new(server));
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    info!("Tick loop running ({} ms)", TICK_INTERVAL_MS);

    loop {
        ticker.next().await;

        while let Ok(raw) = WRITE_EVENTS.try_receive() {
            match app.handle_write(&raw) {
                Dispatch::Started(cmd) => info!("{} -> blinking", cmd),
                Dispatch::Unmapped(cmd) => warn!("{} has no indicator", cmd),
                Dispatch::Unknown => warn!("Unknown command: {=[u8]:a}", raw.as_slice()),
            }
        }

        while let Ok(line) = OPERATOR_LINES.try_receive() {
            match app.notify(&mut sender, &line) {
                SendOutcome::Sent(n) => info!("Sent: {=[u8]:a} ({} B)", line.as_slice(), n),
                SendOutcome::Dropped(DropReason::NoClient) => warn!("No client connected"),
                SendOutcome::Dropped(reason) => warn!("Notification dropped: {}", reason),
            }
        }

        if let Some(report) = app.tick() {
            let mut status = StatusLine::new();
            if write!(status, "{}", report).is_err() {
                warn!("{}", Error::BufferOverflow);
                continue;
            }
            info!("{=str}", status.as_str());
            // The console may be detached; a stale status line is worthless.
            let _ = STATUS_LINES.try_send(status);
        }
    }
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 128 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::BLE_DEVICE_NAME.as_ptr() as _,
            current_len: config::BLE_DEVICE_NAME.len() as u16,
            max_len: config::BLE_DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("callbeacon starting");

    // Priorities 0, 1 and 4 are reserved by the SoftDevice.
    let mut hal_config = embassy_nrf::config::Config::default();
    hal_config.gpiote_interrupt_priority = Priority::P2;
    hal_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(hal_config);
    interrupt::USBD.set_priority(Priority::P2);

    // Active-low: start dark.
    let leds = [
        Output::new(p.P0_13, Level::High, OutputDrive::Standard),
        Output::new(p.P0_14, Level::High, OutputDrive::Standard),
        Output::new(p.P0_15, Level::High, OutputDrive::Standard),
        Output::new(p.P0_16, Level::High, OutputDrive::Standard),
    ];

    let sd = Softdevice::enable(&softdevice_config());
    let server = unwrap!(Server::new(sd).map_err(|_| Error::from(BleError::RegisterFailed)));
    let sd: &'static Softdevice = sd;
    let server: &'static Server = SERVER.init(server);
    unwrap!(ble::gatt::seed(server));

    let console = usb::console::init(p.USBD);

    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(ble_task(sd, server)));
    unwrap!(spawner.spawn(usb_task(console.device)));
    unwrap!(spawner.spawn(console_task(console.class)));
    unwrap!(spawner.spawn(app_task(server, leds)));

    info!("Advertising as {=str}", config::BLE_DEVICE_NAME);
}
