use std::time::Duration;

use super::{Button, Debouncer, Indicator, UserPresence};
use crate::config::{PRESENCE_CYCLES, PRESENCE_PERIOD_MS, PRESENCE_POLL_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceTiming {
    /// Blink cycles before giving up.
    pub cycles: u32,
    /// One indicator-on half plus one indicator-off half.
    pub period: Duration,
    pub poll_interval: Duration,
}

impl Default for PresenceTiming {
    fn default() -> Self {
        Self {
            cycles: PRESENCE_CYCLES,
            period: Duration::from_millis(PRESENCE_PERIOD_MS),
            poll_interval: Duration::from_millis(PRESENCE_POLL_MS),
        }
    }
}

impl PresenceTiming {
    fn polls_per_half(&self) -> u32 {
        let half = self.period.as_micros() / 2;
        let poll = self.poll_interval.as_micros().max(1);
        ((half / poll) as u32).max(1)
    }

    pub fn window(&self) -> Duration {
        self.poll_interval * self.polls_per_half() * 2 * self.cycles
    }
}

/// Blinks the indicator while polling a debounced button for a bounded window.
pub struct PresenceConfirmation<B, I> {
    button: B,
    indicator: I,
    debouncer: Debouncer,
    timing: PresenceTiming,
}

impl<B: Button, I: Indicator> PresenceConfirmation<B, I> {
    pub fn new(button: B, indicator: I, timing: PresenceTiming) -> Self {
        Self {
            button,
            indicator,
            debouncer: Debouncer::new(),
            timing,
        }
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}

impl<B: Button, I: Indicator> UserPresence for PresenceConfirmation<B, I> {
    async fn confirm(&mut self) -> bool {
        tracing::info!(window = ?self.timing.window(), "Waiting for button press");
        let polls = self.timing.polls_per_half();
        for cycle in 0..self.timing.cycles {
            // First half lit, second half dark.
            for _ in 0..2 {
                self.indicator.toggle();
                for _ in 0..polls {
                    self.debouncer.sample(self.button.read_raw());
                    if self.debouncer.take_press() {
                        self.indicator.off();
                        tracing::info!(cycle, "User presence confirmed");
                        return true;
                    }
                    tokio::time::sleep(self.timing.poll_interval).await;
                }
            }
        }
        self.indicator.off();
        tracing::warn!("User presence timed out");
        false
    }
}
