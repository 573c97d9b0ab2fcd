use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub volume: f32,
    pub volume_step: f32,
    pub seek_step_secs: u64,
    pub time_update_interval_ms: u64,
}

impl AudioConfig {
    pub fn time_update_interval(&self) -> Duration {
        Duration::from_millis(self.time_update_interval_ms.max(16))
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            volume_step: 0.05,
            seek_step_secs: 5,
            time_update_interval_ms: 250,
        }
    }
}
