use std::path::PathBuf;

pub const PRESENCE_CYCLES: u32 = 10;
pub const PRESENCE_PERIOD_MS: u64 = 1000;
pub const PRESENCE_POLL_MS: u64 = 10;
/// How long the stdin button is held down per Enter.
pub const BUTTON_HOLD_MS: u64 = 200;
/// ATmega328P EEPROM.
pub const DEFAULT_EEPROM_SIZE: usize = 1024;
pub const DEFAULT_RX_BUFFER: usize = 64;
pub const DEFAULT_FRAME_GAP_MS: u64 = 250;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceMode {
    /// Press Enter on stdin to press the button.
    Button,
    /// Approve every request.
    Auto,
    /// Deny every request.
    Deny,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxMode {
    /// Receive pump fills a bounded ring buffer.
    Buffered,
    /// Command processor reads the socket directly.
    Polled,
}

#[derive(clap::Parser, Debug, Clone)]
#[command(name = "yubino", about = "Serial authenticator emulator")]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[arg(long, default_value = "127.0.0.1:4242")]
    pub listen: String,
    /// EEPROM image; defaults to the XDG data dir.
    #[arg(long)]
    pub eeprom: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_EEPROM_SIZE)]
    pub eeprom_size: usize,
    #[arg(long, value_enum, default_value_t = PresenceMode::Button)]
    pub presence: PresenceMode,
    #[arg(long, value_enum, default_value_t = RxMode::Buffered)]
    pub rx_mode: RxMode,
    #[arg(long, default_value_t = DEFAULT_RX_BUFFER)]
    pub rx_buffer: usize,
    /// Longest wait for the next argument byte before a frame counts as truncated.
    #[arg(long, default_value_t = DEFAULT_FRAME_GAP_MS)]
    pub frame_gap_ms: u64,
    /// Delete all stored credentials, then exit.
    #[arg(long)]
    pub wipe: bool,
}

impl Config {
    pub fn eeprom_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.eeprom {
            return Ok(path.clone());
        }
        let data_dir = directories::ProjectDirs::from("", "", "yubino")
            .ok_or_else(|| anyhow::anyhow!("cannot determine XDG data dir"))?
            .data_dir()
            .to_path_buf();
        Ok(data_dir.join("eeprom.bin"))
    }
}
