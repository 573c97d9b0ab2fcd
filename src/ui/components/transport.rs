//! Pieces shared by the three transport views.

use ratatui::{
    style::{Style, Stylize},
    text::Span,
};

use crate::{
    audio::{PlayerSnapshot, RepeatMode},
    ui::util::{format_duration, format_time},
    util::colors,
};

pub fn play_icon(snapshot: &PlayerSnapshot) -> &'static str {
    if snapshot.is_playing { "⏸" } else { "▶" }
}

pub fn repeat_icon(repeat: RepeatMode) -> Span<'static> {
    match repeat {
        RepeatMode::Off => "↻".fg(colors::NEUTRAL),
        RepeatMode::All => "↻".fg(colors::PRIMARY),
        RepeatMode::One => "↻¹".fg(colors::PRIMARY),
    }
}

pub fn shuffle_icon(shuffle: bool) -> Span<'static> {
    if shuffle {
        "⤮".fg(colors::PRIMARY)
    } else {
        "⤮".fg(colors::NEUTRAL)
    }
}

pub fn title(snapshot: &PlayerSnapshot) -> String {
    snapshot
        .current_track
        .as_ref()
        .map_or_else(|| "Nothing playing".to_string(), |t| t.title.clone())
}

pub fn producer(snapshot: &PlayerSnapshot) -> Option<&str> {
    snapshot
        .current_track
        .as_ref()
        .map(|t| t.producer_name.as_str())
}

pub fn times(snapshot: &PlayerSnapshot) -> String {
    format!(
        "{} / {}",
        format_time(snapshot.current_time),
        format_duration(snapshot.duration)
    )
}

/// Effective volume in percent, zero while muted.
pub fn volume_percent(snapshot: &PlayerSnapshot) -> u8 {
    if snapshot.is_muted {
        0
    } else {
        (snapshot.volume.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

pub fn error_span(snapshot: &PlayerSnapshot) -> Option<Span<'static>> {
    snapshot.last_error.as_ref().map(|_| {
        Span::styled("couldn't play this track", Style::new().fg(colors::ERROR))
    })
}
