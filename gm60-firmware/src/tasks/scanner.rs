//! GM60 scanner task
//!
//! Runs the startup sequence (version query, factory reset, settings dump,
//! configured register writes) and then listens for scans forever.
//! The driver is blocking; its delays busy-wait on `embassy_time::Delay`.

use defmt::*;
use embassy_rp::uart::BufferedUart;
use embassy_time::{Delay, Duration, Timer};

use gm60_driver::scanner::reg;
use gm60_driver::{Gm60, ScannerConfig, TimingConfig};
use gm60_hal::IoChannel;

type Scanner = Gm60<IoChannel<BufferedUart>, Delay>;

/// Scanner power-up time before the first command
const POWER_UP_MS: u64 = 500;

/// Pause after a failed listen before trying again
const ERROR_BACKOFF_MS: u64 = 1000;

/// GM60 scanner task
#[embassy_executor::task]
pub async fn scanner_task(uart: BufferedUart, config: ScannerConfig) {
    info!("Scanner task starting...");

    Timer::after(Duration::from_millis(POWER_UP_MS)).await;

    let timing = config.timing;
    let mut gm60: Scanner = Gm60::new(IoChannel::new(uart), Delay, timing);

    startup(&mut gm60, &config);
    gm60 = recover(gm60, timing);

    info!("Listening for scans");
    let poll = Duration::from_millis(u64::from(timing.sensor_poll_ms.max(1)));

    loop {
        match gm60.read_sensor() {
            Ok(Some(scan)) => match scan.as_str() {
                Some(text) => info!("Scan: {}", text),
                None => info!("Scan ({} bytes, not UTF-8): {=[u8]:x}", scan.len(), scan.as_bytes()),
            },
            Ok(None) => {}
            Err(e) => {
                warn!("Scan read failed: {:?}", e);
                gm60 = recover(gm60, timing);
                Timer::after(Duration::from_millis(ERROR_BACKOFF_MS)).await;
            }
        }
        Timer::after(poll).await;
    }
}

/// Version, factory reset, settings dump and configured writes
///
/// Each step logs its own failure and the sequence carries on.
fn startup(gm60: &mut Scanner, config: &ScannerConfig) {
    match gm60.version() {
        Ok(version) => info!(
            "GM60 hardware {=f32} software {=f32} built {}",
            version.hardware(),
            version.software(),
            version.release_date
        ),
        Err(e) => warn!("Version query failed: {:?}", e),
    }

    match gm60.reset_to_factory_defaults() {
        Ok(()) => info!("Factory defaults restored"),
        Err(e) => warn!("Factory reset failed: {:?}", e),
    }

    match gm60.register_settings(reg::SETTINGS, 1) {
        Ok(settings) => {
            for (offset, (value, binary)) in
                settings.values.iter().zip(settings.binary.iter()).enumerate()
            {
                info!(
                    "  reg {=u16:#x}: {=u8:#x} ({})",
                    settings.address.wrapping_add(offset as u16),
                    *value,
                    binary.as_str()
                );
            }
        }
        Err(e) => warn!("Settings read failed: {:?}", e),
    }

    match gm60.apply_settings(&config.registers) {
        Ok(()) => info!("Applied {} register writes", config.registers.len()),
        Err(e) => error!("Register write failed: {:?}", e),
    }
}

/// Rebuild the driver if the session faulted
fn recover(gm60: Scanner, timing: TimingConfig) -> Scanner {
    if !gm60.session().is_faulted() {
        return gm60;
    }
    warn!("Scanner session faulted, rebuilding");
    let (channel, delay) = gm60.release();
    Gm60::new(channel, delay, timing)
}
