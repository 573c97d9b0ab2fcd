use std::{
    io::Cursor,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, info, warn};

use crate::audio::{
    error::AudioError,
    traits::{AudioOutput, PreparedSource},
};

/// [`AudioOutput`] backed by a rodio sink on the default device.
///
/// The whole file is downloaded before decoding starts. The bytes of the
/// current source are kept so a seek after the sink drained can re-append it.
pub struct RodioOutput {
    sink: Arc<Sink>,
    http_client: reqwest::Client,
    current: Mutex<Option<Arc<[u8]>>>,
}

impl RodioOutput {
    /// The returned stream must outlive the output; dropping it silences the device.
    pub fn open(http_client: reqwest::Client) -> Result<(Self, OutputStream), AudioError> {
        let stream = OutputStreamBuilder::from_default_device()
            .and_then(|builder| builder.open_stream_or_fallback())
            .map_err(|e| AudioError::DeviceError(e.to_string()))?;
        let sink = Sink::connect_new(stream.mixer());

        Ok((
            Self {
                sink: Arc::new(sink),
                http_client,
                current: Mutex::new(None),
            },
            stream,
        ))
    }

    fn append(&self, data: Arc<[u8]>) -> Result<Option<Duration>, AudioError> {
        let byte_len = data.len() as u64;
        let decoder = Decoder::builder()
            .with_data(Cursor::new(data))
            .with_byte_len(byte_len)
            .with_coarse_seek(true)
            .with_gapless(true)
            .build()
            .map_err(|e| AudioError::DecodingError(e.to_string()))?;

        let duration = decoder.total_duration();
        self.sink.append(decoder);
        Ok(duration)
    }
}

#[async_trait]
impl AudioOutput for RodioOutput {
    async fn fetch(&self, locator: &str) -> Result<PreparedSource, AudioError> {
        let start = std::time::Instant::now();
        let data = if locator.starts_with("http://") || locator.starts_with("https://") {
            self.http_client
                .get(locator)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?
                .to_vec()
        } else {
            tokio::fs::read(locator).await?
        };

        info!(
            locator,
            bytes = data.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "rodio_output_fetched"
        );
        Ok(PreparedSource {
            locator: locator.to_string(),
            data,
        })
    }

    fn start(&self, source: PreparedSource) -> Result<Option<Duration>, AudioError> {
        self.sink.stop();
        let data: Arc<[u8]> = source.data.into();
        let duration = self.append(data.clone())?;
        if let Ok(mut current) = self.current.lock() {
            *current = Some(data);
        }
        self.sink.play();
        Ok(duration)
    }

    fn pause(&self) {
        self.sink.pause();
    }

    fn resume(&self) {
        self.sink.play();
    }

    fn stop(&self) {
        self.sink.stop();
        if let Ok(mut current) = self.current.lock() {
            *current = None;
        }
    }

    fn seek(&self, position: Duration) -> Result<(), AudioError> {
        if self.sink.empty() {
            let data = self.current.lock().ok().and_then(|c| c.clone());
            match data {
                Some(data) => {
                    debug!("rodio_output_reappend");
                    self.append(data)?;
                    self.sink.pause();
                }
                None => return Err(AudioError::NothingLoaded),
            }
        }
        self.sink.try_seek(position).map_err(|e| {
            warn!(error = %e, "rodio_output_seek_failed");
            AudioError::SeekError(e.to_string())
        })
    }

    fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}
