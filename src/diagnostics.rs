use std::net::SocketAddr;
use std::path::Path;

use crate::config::{Config, RxMode};
use crate::protocol::types::CLIENT_DATA_SIZE;
use crate::store::{APPLICATION_ID_SIZE, RECORD_SIZE, index::capacity_for};

/// Longest request frame: opcode plus the GetAssertion arguments.
const MAX_FRAME: usize = 1 + APPLICATION_ID_SIZE + CLIENT_DATA_SIZE;

pub fn check(cfg: &Config, eeprom: &Path) -> anyhow::Result<()> {
    let errors = collect(cfg, eeprom);
    if errors.is_empty() {
        return Ok(());
    }

    for err in &errors {
        eprintln!("ERROR: {err}");
    }
    anyhow::bail!("{} preflight check(s) failed", errors.len());
}

fn collect(cfg: &Config, eeprom: &Path) -> Vec<String> {
    let mut errors: Vec<String> = Vec::new();

    // Check 1: listen address
    if let Err(e) = cfg.listen.parse::<SocketAddr>() {
        errors.push(format!(
            "invalid --listen '{}': {e}\n  \
             → expected host:port, e.g. 127.0.0.1:4242",
            cfg.listen
        ));
    }

    // Check 2: EEPROM holds at least one record
    if capacity_for(cfg.eeprom_size) == 0 {
        errors.push(format!(
            "--eeprom-size {} cannot hold a single credential\n  \
             → use at least {} bytes",
            cfg.eeprom_size,
            RECORD_SIZE + 1
        ));
    }

    // Check 3: receive buffer fits a whole frame
    if cfg.rx_mode == RxMode::Buffered && cfg.rx_buffer < MAX_FRAME {
        errors.push(format!(
            "--rx-buffer {} is smaller than the largest request ({MAX_FRAME} bytes)\n  \
             → raise --rx-buffer or use --rx-mode polled",
            cfg.rx_buffer
        ));
    }

    // Check 4: frame gap
    if cfg.rx_mode == RxMode::Buffered && cfg.frame_gap_ms == 0 {
        errors.push(
            "--frame-gap-ms must be greater than 0\n  \
             → every argument byte would count as missing"
                .to_string(),
        );
    }

    // Check 5: EEPROM directory writable
    let dir = match eeprom.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if let Err(e) = std::fs::create_dir_all(dir) {
        errors.push(format!("cannot create {}: {e}", dir.display()));
    } else if let Ok(meta) = std::fs::metadata(dir) {
        if meta.permissions().readonly() {
            errors.push(format!(
                "{} is read-only\n  \
                 → pass --eeprom with a writable path",
                dir.display()
            ));
        }
    }

    errors
}
