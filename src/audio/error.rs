use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    #[error("Audio output device error: {0}")]
    DeviceError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Playback was blocked: {0}")]
    Blocked(String),

    #[error("Seek failed: {0}")]
    SeekError(String),

    #[error("Nothing is loaded")]
    NothingLoaded,

    #[error("Load superseded by a newer request")]
    Superseded,
}

impl AudioError {
    /// Superseded loads are the cancellation mechanism, not a failure worth showing.
    pub fn is_superseded(&self) -> bool {
        matches!(self, AudioError::Superseded)
    }
}

impl From<reqwest::Error> for AudioError {
    fn from(e: reqwest::Error) -> Self {
        AudioError::NetworkError(e.to_string())
    }
}

impl From<std::io::Error> for AudioError {
    fn from(e: std::io::Error) -> Self {
        AudioError::NetworkError(e.to_string())
    }
}
