use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{
    AlwaysDeny, AutoApprove, Button, Indicator, Level, PRESSED, PresenceConfirmation, UserPresence,
};

/// Virtual button whose pin level can be driven from another thread.
#[derive(Debug, Clone, Default)]
pub struct SharedButton {
    pressed: Arc<AtomicBool>,
}

impl SharedButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pressed(&self, pressed: bool) {
        self.pressed.store(pressed, Ordering::Relaxed);
    }
}

impl Button for SharedButton {
    fn read_raw(&mut self) -> Level {
        if self.pressed.load(Ordering::Relaxed) {
            PRESSED
        } else {
            PRESSED.toggled()
        }
    }
}

/// Hold `button` down for `hold` every time a line is read from stdin.
pub fn spawn_stdin_button(button: SharedButton, hold: Duration) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    tracing::debug!("Button pressed");
                    button.set_pressed(true);
                    std::thread::sleep(hold);
                    button.set_pressed(false);
                }
                Err(e) => {
                    tracing::warn!("stdin read error: {e}");
                    break;
                }
            }
        }
        tracing::debug!("stdin button thread exiting");
    })
}

/// Status LED stand-in that reports its state through tracing.
#[derive(Debug, Default)]
pub struct LogIndicator {
    on: bool,
}

impl Indicator for LogIndicator {
    fn toggle(&mut self) {
        self.on = !self.on;
        tracing::trace!(on = self.on, "Indicator");
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

/// Presence source picked at startup.
pub enum HostPresence {
    Button(PresenceConfirmation<SharedButton, LogIndicator>),
    Auto(AutoApprove),
    Deny(AlwaysDeny),
}

impl UserPresence for HostPresence {
    async fn confirm(&mut self) -> bool {
        match self {
            HostPresence::Button(presence) => presence.confirm().await,
            HostPresence::Auto(presence) => presence.confirm().await,
            HostPresence::Deny(presence) => presence.confirm().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_button_levels() {
        let button = SharedButton::new();
        let mut reader = button.clone();
        assert_eq!(reader.read_raw(), PRESSED.toggled());
        button.set_pressed(true);
        assert_eq!(reader.read_raw(), PRESSED);
    }

    #[test]
    fn test_log_indicator_off() {
        let mut led = LogIndicator::default();
        led.off();
        assert!(!led.is_on());
        led.toggle();
        assert!(led.is_on());
        led.off();
        assert!(!led.is_on());
    }
}
