//! GM60 scanner firmware
//!
//! RP2040 demo binary: brings up the scanner on UART1, runs the startup
//! sequence from `scanner.toml`, then logs every scan over defmt.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART1;
use embassy_rp::uart::{
    BufferedInterruptHandler, Config as UartConfig, DataBits, Parity, StopBits, Uart,
};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use gm60_driver::config::parse_config;
use gm60_driver::ScannerConfig;
use gm60_hal::uart;

/// Embedded configuration (compiled into firmware)
/// Edit scanner.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../scanner.toml");

mod tasks;

bind_interrupts!(struct Irqs {
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("GM60 firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // Pin assignment is board-specific: UART1 on GPIO8 (TX) / GPIO9 (RX)
    if config.pins.tx != 8 || config.pins.rx != 9 {
        warn!(
            "scanner.toml asks for gpio{}/gpio{}, this board uses gpio8/gpio9",
            config.pins.tx, config.pins.rx
        );
    }

    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 512]);

    let uart = Uart::new_blocking(p.UART1, p.PIN_8, p.PIN_9, uart_config(&config.uart));
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);

    info!("UART initialized at {} baud", config.uart.baudrate);

    spawner.spawn(tasks::scanner_task(uart, config)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded configuration, falling back to defaults
fn load_config() -> ScannerConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Loaded scanner.toml ({} register writes)",
                config.registers.len()
            );
            config
        }
        Err(e) => {
            // Only reachable if build.rs and the runtime parser disagree
            warn!("Failed to parse scanner.toml: {:?}, using defaults", e);
            ScannerConfig::default()
        }
    }
}

/// Map link settings onto the RP2040 UART configuration
fn uart_config(link: &uart::UartConfig) -> UartConfig {
    let mut cfg = UartConfig::default();
    cfg.baudrate = link.baudrate;
    cfg.data_bits = match link.data_bits {
        uart::DataBits::Seven => DataBits::DataBits7,
        uart::DataBits::Eight => DataBits::DataBits8,
    };
    cfg.parity = match link.parity {
        uart::Parity::None => Parity::ParityNone,
        uart::Parity::Even => Parity::ParityEven,
        uart::Parity::Odd => Parity::ParityOdd,
    };
    cfg.stop_bits = match link.stop_bits {
        uart::StopBits::One => StopBits::STOP1,
        uart::StopBits::Two => StopBits::STOP2,
    };
    cfg
}
