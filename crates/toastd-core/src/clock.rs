use time::OffsetDateTime;
use tokio::time::Instant;

/// Wall-clock source anchored to the tokio timer.
///
/// Expiry timestamps are wall-clock values while timers run on
/// `tokio::time::Instant`. Deriving "now" from the same monotonic source the
/// timers use keeps the two in agreement, including under paused test time.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin_wall: OffsetDateTime,
    origin: Instant,
}

impl Clock {
    /// Clock anchored to the current system time.
    pub fn system() -> Self {
        Self::starting_at(OffsetDateTime::now_utc())
    }

    /// Clock that reads `wall` right now and advances with tokio time.
    pub fn starting_at(wall: OffsetDateTime) -> Self {
        Self {
            origin_wall: wall,
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> OffsetDateTime {
        self.origin_wall + Instant::now().saturating_duration_since(self.origin)
    }

    /// Time left until `at`, zero if it is already in the past.
    pub fn until(&self, at: OffsetDateTime) -> std::time::Duration {
        let remaining = at - self.now();
        if remaining.is_positive() {
            remaining.unsigned_abs()
        } else {
            std::time::Duration::ZERO
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}
