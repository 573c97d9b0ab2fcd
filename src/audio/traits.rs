use crate::audio::error::AudioError;
use async_trait::async_trait;
use std::time::Duration;

/// Raw audio fetched for a locator, ready to be handed to [`AudioOutput::start`].
#[derive(Debug, Clone)]
pub struct PreparedSource {
    pub locator: String,
    pub data: Vec<u8>,
}

/// The sound-output handle wrapped by [`AudioResource`](crate::audio::resource::AudioResource).
///
/// `fetch` performs I/O only and must not touch the output; everything else is
/// a synchronous transport primitive on whatever is currently started.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<PreparedSource, AudioError>;

    /// Replaces whatever is playing with `source` and starts it. Returns the
    /// total duration when the decoder knows it.
    fn start(&self, source: PreparedSource) -> Result<Option<Duration>, AudioError>;

    fn pause(&self);
    fn resume(&self);
    fn stop(&self);
    fn seek(&self, position: Duration) -> Result<(), AudioError>;
    fn set_volume(&self, volume: f32);
    fn position(&self) -> Duration;
    fn is_finished(&self) -> bool;
}
