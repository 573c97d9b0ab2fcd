use crate::model::Track;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum PlayerCommand {
    PlayTrack(Track, Option<Vec<Track>>),
    Pause,
    Resume,
    TogglePlayPause,
    Next,
    Previous,
    Seek(Duration),
    SeekBy(i64),
    SetVolume(f32),
    VolumeUp,
    VolumeDown,
    ToggleMute,
    ToggleShuffle,
    CycleRepeat,
    ToggleMobileExpanded,
    Close,
}
