use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
    task::{Context, Poll},
    time::Duration,
};

use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::audio::{
    bus::{EventEmitter, PlaybackEventKind},
    error::AudioError,
    progress::TrackProgress,
    traits::AudioOutput,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePhase {
    Empty,
    Loading,
    Playing,
    Paused,
    Ended,
}

struct ResourceState {
    locator: Option<String>,
    phase: ResourcePhase,
    autoplay: bool,
    volume: f32,
    load_task: Option<JoinHandle<()>>,
}

/// Outcome of [`AudioResource::play`]. Resolves once output actually started,
/// or with the error that prevented it.
pub struct PendingPlay {
    generation: u64,
    rx: Option<oneshot::Receiver<Result<(), AudioError>>>,
    ready: Option<Result<(), AudioError>>,
}

impl PendingPlay {
    pub fn ready(generation: u64, result: Result<(), AudioError>) -> Self {
        Self {
            generation,
            rx: None,
            ready: Some(result),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Future for PendingPlay {
    type Output = Result<(), AudioError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(result) = self.ready.take() {
            return Poll::Ready(result);
        }
        match self.rx.as_mut() {
            // A dropped sender means the load task was aborted by a newer request.
            Some(rx) => Pin::new(rx)
                .poll(cx)
                .map(|r| r.unwrap_or(Err(AudioError::Superseded))),
            None => Poll::Ready(Err(AudioError::Superseded)),
        }
    }
}

/// The process-wide sound output. Owns exactly one [`AudioOutput`] and
/// guarantees at most one locator is ever started on it.
pub struct AudioResource {
    output: Arc<dyn AudioOutput>,
    emitter: EventEmitter,
    state: Arc<Mutex<ResourceState>>,
    progress: Arc<TrackProgress>,
    generation: Arc<AtomicU64>,
}

impl AudioResource {
    pub fn new(output: Arc<dyn AudioOutput>, emitter: EventEmitter) -> Self {
        Self {
            output,
            emitter,
            state: Arc::new(Mutex::new(ResourceState {
                locator: None,
                phase: ResourcePhase::Empty,
                autoplay: true,
                volume: 1.0,
                load_task: None,
            })),
            progress: Arc::new(TrackProgress::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResourceState> {
        lock_state(&self.state)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> ResourcePhase {
        self.lock().phase
    }

    pub fn locator(&self) -> Option<String> {
        self.lock().locator.clone()
    }

    pub fn progress(&self) -> &Arc<TrackProgress> {
        &self.progress
    }

    pub fn volume(&self) -> f32 {
        self.lock().volume
    }

    /// Stops whatever is loaded and starts loading `locator`.
    ///
    /// Must be called inside a tokio runtime; the load runs as a task.
    pub fn play(&self, locator: &str) -> PendingPlay {
        let mut state = self.lock();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(task) = state.load_task.take() {
            task.abort();
        }
        if let Some(previous) = state.locator.take() {
            debug!(previous = previous.as_str(), generation, "audio_resource_release");
        }
        self.output.stop();
        self.progress.reset();

        state.locator = Some(locator.to_string());
        state.phase = ResourcePhase::Loading;
        state.autoplay = true;

        info!(locator, generation, "audio_resource_load");
        self.emitter.emit(
            generation,
            PlaybackEventKind::LoadStart {
                locator: locator.to_string(),
            },
        );
        self.emitter.emit(generation, PlaybackEventKind::Waiting);

        let (tx, rx) = oneshot::channel();
        let output = self.output.clone();
        let emitter = self.emitter.clone();
        let shared = self.state.clone();
        let current_generation = self.generation.clone();
        let progress = self.progress.clone();
        let locator = locator.to_string();

        state.load_task = Some(tokio::spawn(async move {
            let fetched = output.fetch(&locator).await;

            let mut state = lock_state(&shared);
            if current_generation.load(Ordering::SeqCst) != generation {
                debug!(locator = locator.as_str(), generation, "audio_resource_load_stale");
                let _ = tx.send(Err(AudioError::Superseded));
                return;
            }
            state.load_task = None;

            let started = fetched.and_then(|source| output.start(source));
            let result = match started {
                Ok(duration) => {
                    progress.set_total_duration(duration);
                    if state.autoplay {
                        state.phase = ResourcePhase::Playing;
                    } else {
                        output.pause();
                        state.phase = ResourcePhase::Paused;
                    }
                    emitter.emit(generation, PlaybackEventKind::LoadedData { duration });
                    emitter.emit(generation, PlaybackEventKind::CanPlay);
                    info!(locator = locator.as_str(), generation, "audio_resource_started");
                    Ok(())
                }
                Err(error) => {
                    warn!(locator = locator.as_str(), generation, %error, "audio_resource_failed");
                    output.stop();
                    state.locator = None;
                    state.phase = ResourcePhase::Empty;
                    emitter.emit(
                        generation,
                        PlaybackEventKind::Error {
                            error: error.clone(),
                        },
                    );
                    Err(error)
                }
            };
            drop(state);
            let _ = tx.send(result);
        }));

        PendingPlay {
            generation,
            rx: Some(rx),
            ready: None,
        }
    }

    /// Resumes the loaded locator without reloading it.
    pub fn resume(&self) -> Result<(), AudioError> {
        let mut state = self.lock();
        match state.phase {
            ResourcePhase::Empty => Err(AudioError::NothingLoaded),
            ResourcePhase::Loading => {
                state.autoplay = true;
                Ok(())
            }
            ResourcePhase::Paused | ResourcePhase::Ended => {
                self.output.resume();
                state.phase = ResourcePhase::Playing;
                Ok(())
            }
            ResourcePhase::Playing => Ok(()),
        }
    }

    pub fn pause(&self) {
        let mut state = self.lock();
        match state.phase {
            ResourcePhase::Loading => state.autoplay = false,
            ResourcePhase::Playing => {
                self.output.pause();
                self.progress.set_current_position(self.output.position());
                state.phase = ResourcePhase::Paused;
            }
            _ => {}
        }
    }

    /// Returns the clamped position actually applied, or `None` when nothing
    /// seekable is loaded.
    pub fn seek(&self, position: Duration) -> Option<Duration> {
        let mut state = self.lock();
        match state.phase {
            ResourcePhase::Empty | ResourcePhase::Loading => None,
            phase => {
                let target = self.progress.clamp(position);
                if let Err(error) = self.output.seek(target) {
                    warn!(%error, "audio_resource_seek_failed");
                    return None;
                }
                self.progress.set_current_position(target);
                if phase == ResourcePhase::Ended {
                    state.phase = ResourcePhase::Paused;
                }
                Some(target)
            }
        }
    }

    /// Applied even with nothing loaded so the next start inherits it.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        let mut state = self.lock();
        state.volume = volume;
        self.output.set_volume(volume);
        volume
    }

    /// Pauses, rewinds and detaches the locator. Any in-flight load is discarded.
    pub fn stop(&self) {
        let mut state = self.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = state.load_task.take() {
            task.abort();
        }
        self.output.stop();
        self.progress.reset();
        state.locator = None;
        state.phase = ResourcePhase::Empty;
        state.autoplay = true;
    }

    /// One monitor tick: emits `TimeUpdate` while playing and `Ended` once the
    /// output drained.
    pub fn sample_progress(&self) {
        let mut state = self.lock();
        if state.phase != ResourcePhase::Playing {
            return;
        }
        let generation = self.generation();
        let position = self.progress.clamp(self.output.position());
        self.progress.set_current_position(position);
        self.emitter
            .emit(generation, PlaybackEventKind::TimeUpdate { position });

        if self.output.is_finished() {
            state.phase = ResourcePhase::Ended;
            self.emitter.emit(generation, PlaybackEventKind::Ended);
        }
    }

    /// Samples progress on a fixed interval so listeners are not woken per frame.
    pub fn spawn_monitor(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let resource = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match resource.upgrade() {
                    Some(resource) => resource.sample_progress(),
                    None => break,
                }
            }
        })
    }
}

fn lock_state(state: &Mutex<ResourceState>) -> MutexGuard<'_, ResourceState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
