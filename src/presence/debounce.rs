use super::{Level, PRESSED};

/// Consecutive differing samples needed to accept a transition.
pub const DEBOUNCE_THRESHOLD: u8 = 4;

/// Sample-count debounce filter with a press latch.
///
/// A transition is committed only after `DEBOUNCE_THRESHOLD` consecutive
/// samples disagree with the committed state; any agreeing sample restarts
/// the count. Committing the pressed level sets the latch, which the
/// consumer clears with [`Debouncer::take_press`].
#[derive(Debug, Clone)]
pub struct Debouncer {
    raw_state: Level,
    stability_counter: u8,
    press_latch: bool,
}

impl Debouncer {
    pub fn new() -> Self {
        Self {
            raw_state: PRESSED.toggled(),
            stability_counter: 0,
            press_latch: false,
        }
    }

    pub fn sample(&mut self, level: Level) {
        if level == self.raw_state {
            self.stability_counter = 0;
            return;
        }
        self.stability_counter += 1;
        if self.stability_counter >= DEBOUNCE_THRESHOLD {
            self.raw_state = level;
            self.stability_counter = 0;
            if level == PRESSED {
                self.press_latch = true;
            }
        }
    }

    pub fn take_press(&mut self) -> bool {
        std::mem::take(&mut self.press_latch)
    }

    pub fn state(&self) -> Level {
        self.raw_state
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}
