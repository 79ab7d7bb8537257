//! USB CDC-ACM operator console.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral and runs the line-oriented console on top of it.

use callbeacon::config::{self, CONSOLE_LINE_MAX, OPERATOR_QUEUE_DEPTH, STATUS_QUEUE_DEPTH};
use callbeacon::console::{Line, LineBuffer};
use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_nrf::usb::vbus_detect::SoftwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

use crate::error::Error;

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
});

/// Concrete USB driver type.
///
/// POWER/CLOCK events belong to the SoftDevice, so VBUS state can't come
/// from the hardware detector; the port is assumed powered.
pub type UsbDriver = Driver<'static, peripherals::USBD, &'static SoftwareVbusDetect>;

/// Operator line forwarded for notification.
pub type ConsoleLine = Line<CONSOLE_LINE_MAX>;

/// Formatted status line written back to the host.
pub type StatusLine = heapless::String<{ config::STATUS_LINE_MAX }>;

static VBUS: StaticCell<SoftwareVbusDetect> = StaticCell::new();
static CDC_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Build result containing the USB device runner and the CDC class.
pub struct UsbConsole {
    pub device: UsbDevice<'static, UsbDriver>,
    pub class: CdcAcmClass<'static, UsbDriver>,
}

/// Initialise the USB stack and create the CDC-ACM console.
///
/// Must be called exactly once. All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD) -> UsbConsole {
    let vbus = VBUS.init(SoftwareVbusDetect::new(true, true));
    let driver = Driver::new(usbd, Irqs, &*vbus);

    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    // IAD so Windows binds the CDC driver without an INF.
    usb_config.device_class = 0xEF;
    usb_config.device_sub_class = 0x02;
    usb_config.device_protocol = 0x01;
    usb_config.composite_with_iads = true;

    let mut builder = Builder::new(
        driver,
        usb_config,
        USB_CONFIG_DESC.init([0u8; 256]),
        USB_BOS_DESC.init([0u8; 256]),
        USB_MSOS_DESC.init([0u8; 256]),
        USB_CTRL_BUF.init([0u8; 64]),
    );

    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), config::USB_PACKET_SIZE);
    let device = builder.build();

    info!("USB console initialised");
    UsbConsole { device, class }
}

/// Write `bytes` followed by CRLF, split into endpoint-sized packets.
async fn write_line(class: &mut CdcAcmClass<'static, UsbDriver>, bytes: &[u8]) -> Result<(), Error> {
    let max = class.max_packet_size() as usize;
    for chunk in bytes.chunks(max) {
        class.write_packet(chunk).await?;
    }
    // Always a short packet, so it also ends the transfer.
    class.write_packet(b"\r\n").await?;
    Ok(())
}

/// Run the console: forward completed lines, echo status lines.
pub async fn run(
    mut class: CdcAcmClass<'static, UsbDriver>,
    lines: Sender<'static, CriticalSectionRawMutex, ConsoleLine, OPERATOR_QUEUE_DEPTH>,
    status: Receiver<'static, CriticalSectionRawMutex, StatusLine, STATUS_QUEUE_DEPTH>,
) -> ! {
    let mut packet = [0u8; config::USB_PACKET_SIZE as usize];
    let mut assembler = LineBuffer::<CONSOLE_LINE_MAX>::new();

    loop {
        class.wait_connection().await;
        assembler.clear();
        info!("Console attached");

        loop {
            match select(class.read_packet(&mut packet), status.receive()).await {
                Either::First(Ok(n)) => {
                    let was_overflowed = assembler.is_overflowed();
                    for &b in &packet[..n] {
                        if let Some(line) = assembler.push(b) {
                            if lines.try_send(line).is_err() {
                                warn!("Operator queue full - dropping line");
                            }
                        }
                    }
                    if !was_overflowed && assembler.is_overflowed() {
                        warn!("Console line longer than {} bytes - discarding", CONSOLE_LINE_MAX);
                    }
                }
                Either::First(Err(e)) => {
                    warn!("Console read failed: {}", Error::from(e));
                    break;
                }
                Either::Second(line) => {
                    if let Err(e) = write_line(&mut class, line.as_bytes()).await {
                        warn!("Console write failed: {}", e);
                        break;
                    }
                }
            }
        }

        info!("Console detached");
    }
}
