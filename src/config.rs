//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

use crate::blink::OutputId;
use crate::clock::{fits_wrap_window, Millis};

// Blink timing

/// Total time an indicator blinks after a command (ms).
pub const BLINK_DURATION_MS: Millis = 3000;

/// Time between two toggles of a blinking indicator (ms).
pub const BLINK_INTERVAL_MS: Millis = 250;

/// Cadence of the cooperative tick loop (ms).
pub const TICK_INTERVAL_MS: u64 = 10;

/// Minimum spacing between two throughput reports (ms).
pub const REPORT_INTERVAL_MS: Millis = 1000;

// `u32` millisecond timestamps roll over every ~49.7 days. Wrapping
// subtraction stays correct only while every window is shorter than half
// of that period.
const _: () = assert!(fits_wrap_window(BLINK_DURATION_MS));
const _: () = assert!(fits_wrap_window(BLINK_INTERVAL_MS));
const _: () = assert!(fits_wrap_window(REPORT_INTERVAL_MS));

// Indicator outputs (nRF52840-DK defaults)
//
// These are logical identifiers; the concrete `embassy_nrf` pins are
// selected in `main.rs`. The DK LEDs are active-low.
//
//   CALL:1     → LED1 → P0.13
//   CALL:2     → LED2 → P0.14
//   CALL:3     → LED3 → P0.15
//   DOOR_OPEN  → LED4 → P0.16

pub const OUTPUT_CALL_1: OutputId = OutputId(1);
pub const OUTPUT_CALL_2: OutputId = OutputId(2);
pub const OUTPUT_CALL_3: OutputId = OutputId(3);
pub const OUTPUT_DOOR: OutputId = OutputId(4);

/// Number of physical indicators driven by the scheduler.
pub const INDICATOR_COUNT: usize = 4;

// BLE

/// GAP device name, also used as the complete local name in advertising.
pub const BLE_DEVICE_NAME: &str = "CALL-BEACON";

/// Primary service UUID `9b2a1c50-4f66-4c3e-9a6b-6f0c6b2f3a01`.
pub const BLE_SERVICE_UUID: u128 = 0x9b2a1c50_4f66_4c3e_9a6b_6f0c6b2f3a01;

/// Maximum length of the command / notify characteristic value.
pub const CHARACTERISTIC_MAX_LEN: usize = 64;

/// Value served on reads until a peer writes something else.
pub const CHARACTERISTIC_INITIAL_VALUE: &[u8] = b"hello";

/// Advertising interval (in 0.625 ms units). 160 = 100 ms.
pub const BLE_ADV_INTERVAL: u32 = 160;

/// Back-off before retrying a failed advertising start (ms).
pub const BLE_ADV_RETRY_MS: u64 = 500;

/// Preferred connection interval range (in 1.25 ms units).
pub const BLE_CONN_INTERVAL_MIN: u16 = 24;
pub const BLE_CONN_INTERVAL_MAX: u16 = 40;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

// USB operator console

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "callbeacon";
pub const USB_PRODUCT: &str = "BLE Call Beacon Console";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// CDC-ACM bulk endpoint packet size.
pub const USB_PACKET_SIZE: u16 = 64;

/// Longest operator line forwarded as a notification.
pub const CONSOLE_LINE_MAX: usize = CHARACTERISTIC_MAX_LEN;

/// Capacity of a formatted status line.
pub const STATUS_LINE_MAX: usize = 96;

// Queues between execution contexts

/// Inbound characteristic writes waiting for the tick loop.
pub const WRITE_QUEUE_DEPTH: usize = 8;

/// Operator lines waiting to be notified.
pub const OPERATOR_QUEUE_DEPTH: usize = 4;

/// Status lines waiting for the console writer.
pub const STATUS_QUEUE_DEPTH: usize = 2;
