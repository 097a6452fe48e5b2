//! Build script for gm60-firmware
//!
//! Puts memory.x on the linker path and rejects a bad scanner.toml before
//! it gets embedded into the image.

use std::env;
use std::fs;
use std::path::PathBuf;

const CONFIG: &str = "scanner.toml";

/// Mirrors the firmware's startup register-write limit
const MAX_REGISTER_WRITES: usize = 8;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out_dir.join("memory.x"), include_bytes!("memory.x")).expect("write memory.x");
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed={}", CONFIG);

    let errors = match fs::read_to_string(CONFIG) {
        Err(e) => vec![format!("cannot read {}: {}", CONFIG, e)],
        Ok(text) => match toml::from_str::<toml::Value>(&text) {
            Err(e) => e.to_string().lines().map(str::to_string).collect(),
            Ok(config) => {
                let mut errors = Vec::new();
                validate_uart(&config, &mut errors);
                validate_timing(&config, &mut errors);
                validate_registers(&config, &mut errors);
                errors
            }
        },
    };

    if !errors.is_empty() {
        panic!("\n{} is invalid:\n  - {}\n", CONFIG, errors.join("\n  - "));
    }
}

/// Check an optional integer key against an inclusive range
fn check_int(
    table: &toml::Table,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        None => {}
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => {}
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be {}-{}", section, key, min, max))
        }
        Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
    }
}

fn validate_uart(config: &toml::Value, errors: &mut Vec<String>) {
    let uart = match config.get("uart") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[uart] must be a table".to_string());
            return;
        }
        None => return,
    };

    check_int(uart, "uart", "baudrate", 1200, 115_200, errors);
    check_int(uart, "uart", "data_bits", 7, 8, errors);
    check_int(uart, "uart", "stop_bits", 1, 2, errors);

    if let Some(toml::Value::String(parity)) = uart.get("parity") {
        if !["none", "even", "odd"].contains(&parity.to_lowercase().as_str()) {
            errors.push("[uart] parity must be 'none', 'even', or 'odd'".to_string());
        }
    }

    for key in ["tx_pin", "rx_pin"] {
        match uart.get(key) {
            None => {}
            Some(toml::Value::String(pin)) => {
                let valid = pin
                    .strip_prefix("gpio")
                    .and_then(|n| n.parse::<u8>().ok())
                    .is_some_and(|n| n <= 29);
                if !valid {
                    errors.push(format!("[uart] {} must be \"gpio0\"-\"gpio29\"", key));
                }
            }
            Some(_) => errors.push(format!("[uart] {} must be a string", key)),
        }
    }
}

fn validate_timing(config: &toml::Value, errors: &mut Vec<String>) {
    let timing = match config.get("timing") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[timing] must be a table".to_string());
            return;
        }
        None => return,
    };

    for key in [
        "settle_ms",
        "retry_ms",
        "drain_poll_ms",
        "drain_timeout_ms",
        "reset_settle_ms",
        "sensor_poll_ms",
    ] {
        check_int(timing, "timing", key, 0, 60_000, errors);
    }
}

fn validate_registers(config: &toml::Value, errors: &mut Vec<String>) {
    let registers = match config.get("register") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[register.*] entries must be tables".to_string());
            return;
        }
        None => return,
    };

    if registers.len() > MAX_REGISTER_WRITES {
        errors.push(format!(
            "at most {} [register.*] sections are supported",
            MAX_REGISTER_WRITES
        ));
    }

    for (name, register) in registers {
        let section = format!("register.{}", name);
        if name.len() > 16 {
            errors.push(format!("[{}] name must be at most 16 characters", section));
        }

        let register = match register {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("[{}] must be a table", section));
                continue;
            }
        };

        if register.get("address").is_none() {
            errors.push(format!("[{}] missing 'address'", section));
        }
        if register.get("value").is_none() {
            errors.push(format!("[{}] missing 'value'", section));
        }
        check_int(register, &section, "address", 0, 0xFFFF, errors);
        check_int(register, &section, "value", 0, 0xFF, errors);
    }
}
