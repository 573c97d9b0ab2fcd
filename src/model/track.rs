use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type TrackId = String;

/// A catalog beat. Produced by the marketplace API and never mutated by the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub producer_id: String,
    pub producer_name: String,
    pub audio_url: String,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub bpm: Option<u32>,
    #[serde(default)]
    pub musical_key: Option<String>,
    #[serde(default)]
    pub price: f64,
}

impl Track {
    pub fn duration_hint(&self) -> Option<Duration> {
        self.duration_secs
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    pub fn is_same(&self, other: &Track) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
pub(crate) fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Beat {id}"),
        producer_id: "producer-1".to_string(),
        producer_name: "Producer".to_string(),
        audio_url: format!("https://cdn.example.com/{id}.mp3"),
        artwork_url: None,
        duration_secs: Some(120.0),
        bpm: Some(140),
        musical_key: Some("F#m".to_string()),
        price: 29.99,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_hint_ignores_garbage() {
        let mut t = track("a");
        assert_eq!(t.duration_hint(), Some(Duration::from_secs(120)));

        t.duration_secs = Some(f64::NAN);
        assert_eq!(t.duration_hint(), None);

        t.duration_secs = Some(-3.0);
        assert_eq!(t.duration_hint(), None);

        t.duration_secs = Some(1e30);
        assert_eq!(t.duration_hint(), None);

        t.duration_secs = Some(f64::INFINITY);
        assert_eq!(t.duration_hint(), None);
    }

    #[test]
    fn deserializes_sparse_catalog_record() {
        let json = r#"{
            "id": "42",
            "title": "Night Drive",
            "producer_id": "p9",
            "producer_name": "Lofi Kid",
            "audio_url": "https://cdn.example.com/42.mp3"
        }"#;
        let t: Track = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, "42");
        assert_eq!(t.bpm, None);
        assert_eq!(t.price, 0.0);
    }
}
