pub mod handler;

use std::time::Duration;

/// `mm:ss`, or `h:mm:ss` past the hour.
pub fn format_time(time: Duration) -> String {
    let total = time.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// `--:--` while the duration is unknown.
pub fn format_duration(duration: Option<Duration>) -> String {
    duration.map_or_else(|| "--:--".to_string(), format_time)
}

/// Pulsing dot for the playing row; `tick` advances once per frame.
pub fn active_track_icon(is_playing: bool, tick: u64) -> &'static str {
    if !is_playing {
        return "•";
    }
    match (tick / 3) % 6 {
        0 | 5 => "·",
        1 | 4 => "•",
        _ => "●",
    }
}

pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_times() {
        assert_eq!(format_time(Duration::from_secs(65)), "01:05");
        assert_eq!(format_time(Duration::from_secs(3723)), "1:02:03");
        assert_eq!(format_duration(None), "--:--");
        assert_eq!(format_price(29.5), "$29.50");
    }

    #[test]
    fn paused_icon_is_static() {
        assert_eq!(active_track_icon(false, 7), active_track_icon(false, 0));
        assert_eq!(active_track_icon(true, 6), "●");
    }
}
