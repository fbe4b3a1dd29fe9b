pub mod confirm;
pub mod debounce;
pub mod host;

pub use confirm::{PresenceConfirmation, PresenceTiming};
pub use debounce::{DEBOUNCE_THRESHOLD, Debouncer};
pub use host::{HostPresence, LogIndicator, SharedButton, spawn_stdin_button};

/// Raw pin level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn toggled(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// The button pulls its pin to ground when pressed.
pub const PRESSED: Level = Level::Low;

pub trait Button {
    fn read_raw(&mut self) -> Level;
}

pub trait Indicator {
    fn toggle(&mut self);
    fn is_on(&self) -> bool;

    fn off(&mut self) {
        if self.is_on() {
            self.toggle();
        }
    }
}

/// Gate for operations that need a human in the loop.
#[allow(async_fn_in_trait)]
pub trait UserPresence {
    async fn confirm(&mut self) -> bool;
}

/// Approves every request without waiting. For unattended emulators and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl UserPresence for AutoApprove {
    async fn confirm(&mut self) -> bool {
        tracing::debug!("User presence auto-approved");
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysDeny;

impl UserPresence for AlwaysDeny {
    async fn confirm(&mut self) -> bool {
        tracing::debug!("User presence auto-denied");
        false
    }
}
