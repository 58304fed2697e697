use std::time::Duration;

/// Periodic-save and resume gating policy.
pub struct ProgressTracker {
    last_save: std::time::Instant,
    save_interval: Duration,
    watched_threshold: f64,
    resume_floor: Duration,
}

impl ProgressTracker {
    pub fn new(save_interval: Duration, watched_threshold: f64, resume_floor: Duration) -> Self {
        Self {
            last_save: std::time::Instant::now(),
            save_interval,
            watched_threshold,
            resume_floor,
        }
    }

    /// Whether a background save is due. Never true past the watched
    /// threshold: that range belongs to the completion path, which clears
    /// the record to zero, and a late background save must not race it.
    pub fn should_save(&self, position: Duration, duration: Duration) -> bool {
        if duration.is_zero() {
            return false;
        }
        let fraction = position.as_secs_f64() / duration.as_secs_f64();
        if fraction >= self.watched_threshold {
            return false;
        }
        self.last_save.elapsed() >= self.save_interval
    }

    pub fn mark_saved(&mut self) {
        self.last_save = std::time::Instant::now();
    }

    /// Stored positions below the floor are ignored; starting a few seconds
    /// in is worse than starting over.
    pub fn usable_resume(&self, stored: Duration) -> bool {
        stored >= self.resume_floor
    }
}
