//! USB Device subsystem - presents a CDC-ACM serial port to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`. A single CDC-ACM interface serves as the operator
//! console:
//!
//! - host → device: text lines, each forwarded as one BLE notification
//! - device → host: the once-per-second throughput status line

pub mod console;
