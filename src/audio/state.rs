use crate::model::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    /// `off -> all -> one -> off`
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Advancing,
}

/// What every transport view renders. Views hold a copy; only the player writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub current_track: Option<Track>,
    pub status: PlaybackStatus,
    pub is_playing: bool,
    pub is_loading: bool,
    pub current_time: Duration,
    pub duration: Option<Duration>,
    pub volume: f32,
    pub is_muted: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub is_mobile_expanded: bool,
    pub context_index: Option<usize>,
    pub context_len: usize,
    pub last_error: Option<String>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            current_track: None,
            status: PlaybackStatus::Idle,
            is_playing: false,
            is_loading: false,
            current_time: Duration::ZERO,
            duration: None,
            volume: 1.0,
            is_muted: false,
            shuffle: false,
            repeat: RepeatMode::Off,
            is_mobile_expanded: false,
            context_index: None,
            context_len: 0,
            last_error: None,
        }
    }
}

impl PlayerSnapshot {
    /// Played fraction in `[0, 1]`, zero while the duration is unknown.
    pub fn ratio(&self) -> f64 {
        match self.duration {
            Some(total) if !total.is_zero() => {
                (self.current_time.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }
}

/// The locally persisted part of the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    pub volume: f32,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub repeat: RepeatMode,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            shuffle: false,
            repeat: RepeatMode::Off,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycles_off_all_one() {
        assert_eq!(RepeatMode::Off.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::Off);
    }

    #[test]
    fn ratio_handles_unknown_duration() {
        let mut snapshot = PlayerSnapshot {
            current_time: Duration::from_secs(30),
            ..Default::default()
        };
        assert_eq!(snapshot.ratio(), 0.0);

        snapshot.duration = Some(Duration::from_secs(120));
        assert_eq!(snapshot.ratio(), 0.25);
    }

    #[test]
    fn settings_serialize_repeat_lowercase() {
        let json = serde_json::to_string(&PlayerSettings {
            volume: 0.5,
            shuffle: true,
            repeat: RepeatMode::One,
        })
        .unwrap();
        assert!(json.contains(r#""repeat":"one""#));
    }
}
