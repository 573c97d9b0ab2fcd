pub mod bus;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod player;
pub mod progress;
pub mod queue;
pub mod resource;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use bus::{EventName, PlaybackEvent, PlaybackEventBus, PlaybackEventKind};
pub use player::Player;
pub use resource::{AudioResource, PendingPlay};
pub use state::{PlaybackStatus, PlayerSettings, PlayerSnapshot, RepeatMode};
