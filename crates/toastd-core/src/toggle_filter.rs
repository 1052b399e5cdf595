//! Debounce between center blur events and visibility toggles.
//!
//! One user click on the tray icon (or a toggle button in an application)
//! produces both a platform blur of the center window and an explicit
//! toggle request. Applying both flickers the center (close then reopen),
//! so a blur and a toggle arriving within a short window of each other are
//! treated as a single logical event.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::timer::Timer;

/// Toggle requests arriving within this window after a blur are ignored.
pub const DEFAULT_BLUR_TOGGLE_BLOCK: Duration = Duration::from_millis(750);

/// Blur events arriving within this window after a toggle are ignored.
pub const DEFAULT_TOGGLE_BLUR_BLOCK: Duration = Duration::from_millis(200);

/// Where a visibility toggle request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleSource {
    /// `toggleNotificationCenter()` from a client application
    Api,
    /// Tray icon click
    Tray,
    /// Button inside the center itself
    Button,
}

#[derive(Debug)]
pub struct ToggleFilter {
    blur_toggle_block: Timer,
    toggle_blur_block: Timer,
}

impl ToggleFilter {
    pub fn new(blur_toggle_block: Duration, toggle_blur_block: Duration) -> Self {
        Self {
            blur_toggle_block: Timer::new(blur_toggle_block),
            toggle_blur_block: Timer::new(toggle_blur_block),
        }
    }

    /// Returns `false` when the blur is fallout from a toggle that just
    /// happened and should be ignored.
    pub fn record_blur(&mut self) -> bool {
        if self.toggle_blur_block.is_running() {
            self.toggle_blur_block.clear();
            false
        } else {
            self.blur_toggle_block.start();
            true
        }
    }

    /// Returns `false` when an API or tray toggle follows a blur closely
    /// enough to be the same click. Button toggles are never filtered.
    pub fn record_toggle(&mut self, source: ToggleSource) -> bool {
        if source == ToggleSource::Button {
            return true;
        }

        let blocked = self.blur_toggle_block.is_running();
        self.blur_toggle_block.clear();
        if blocked {
            false
        } else {
            self.toggle_blur_block.start();
            true
        }
    }
}

impl Default for ToggleFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BLUR_TOGGLE_BLOCK, DEFAULT_TOGGLE_BLUR_BLOCK)
    }
}
