use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Position/duration of the loaded locator, readable without taking the resource lock.
#[derive(Default, Debug)]
pub struct TrackProgress {
    current_position_millis: AtomicU64,
    total_duration_millis: AtomicU64,
}

impl TrackProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current_position(&self, position: Duration) {
        self.current_position_millis
            .store(position.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn set_total_duration(&self, duration: Option<Duration>) {
        let millis = duration.map(|d| d.as_millis() as u64).unwrap_or(0);
        self.total_duration_millis.store(millis, Ordering::Relaxed);
    }

    pub fn position(&self) -> Duration {
        Duration::from_millis(self.current_position_millis.load(Ordering::Relaxed))
    }

    /// `None` until a decoder (or the caller) reported a duration.
    pub fn duration(&self) -> Option<Duration> {
        match self.total_duration_millis.load(Ordering::Relaxed) {
            0 => None,
            millis => Some(Duration::from_millis(millis)),
        }
    }

    pub fn clamp(&self, position: Duration) -> Duration {
        match self.duration() {
            Some(total) => position.min(total),
            None => position,
        }
    }

    pub fn reset(&self) {
        self.set_current_position(Duration::ZERO);
        self.set_total_duration(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_only_when_duration_known() {
        let progress = TrackProgress::new();
        assert_eq!(progress.clamp(Duration::from_secs(500)), Duration::from_secs(500));

        progress.set_total_duration(Some(Duration::from_secs(90)));
        assert_eq!(progress.clamp(Duration::from_secs(500)), Duration::from_secs(90));

        progress.reset();
        assert_eq!(progress.duration(), None);
        assert_eq!(progress.position(), Duration::ZERO);
    }
}
