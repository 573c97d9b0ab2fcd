use crate::audio::{
    error::AudioError,
    traits::{AudioOutput, PreparedSource},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct FakeState {
    gates: HashMap<String, Arc<Notify>>,
    failures: HashMap<String, AudioError>,
    durations: HashMap<String, Duration>,
    active: Option<String>,
    started: Vec<String>,
    overlapping_starts: usize,
    paused: bool,
    finished: bool,
    position: Duration,
    volume: f32,
}

/// In-memory [`AudioOutput`] that records what was started and lets tests
/// hold individual loads open.
#[derive(Default)]
pub struct FakeOutput {
    state: Mutex<FakeState>,
}

impl FakeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds `fetch(locator)` until the returned notify fires.
    pub fn gate(&self, locator: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state
            .lock()
            .unwrap()
            .gates
            .insert(locator.to_string(), notify.clone());
        notify
    }

    pub fn fail(&self, locator: &str, error: AudioError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(locator.to_string(), error);
    }

    pub fn recover(&self, locator: &str) {
        self.state.lock().unwrap().failures.remove(locator);
    }

    pub fn set_duration(&self, locator: &str, duration: Duration) {
        self.state
            .lock()
            .unwrap()
            .durations
            .insert(locator.to_string(), duration);
    }

    pub fn set_position(&self, position: Duration) {
        self.state.lock().unwrap().position = position;
    }

    pub fn finish(&self) {
        self.state.lock().unwrap().finished = true;
    }

    pub fn active(&self) -> Option<String> {
        self.state.lock().unwrap().active.clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.state.lock().unwrap().started.clone()
    }

    pub fn overlapping_starts(&self) -> usize {
        self.state.lock().unwrap().overlapping_starts
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().unwrap().volume
    }
}

#[async_trait]
impl AudioOutput for FakeOutput {
    async fn fetch(&self, locator: &str) -> Result<PreparedSource, AudioError> {
        let (gate, failure) = {
            let state = self.state.lock().unwrap();
            (
                state.gates.get(locator).cloned(),
                state.failures.get(locator).cloned(),
            )
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        Ok(PreparedSource {
            locator: locator.to_string(),
            data: Vec::new(),
        })
    }

    fn start(&self, source: PreparedSource) -> Result<Option<Duration>, AudioError> {
        let mut state = self.state.lock().unwrap();
        if state.active.is_some() {
            state.overlapping_starts += 1;
        }
        state.active = Some(source.locator.clone());
        state.started.push(source.locator.clone());
        state.paused = false;
        state.finished = false;
        state.position = Duration::ZERO;
        Ok(state.durations.get(&source.locator).copied())
    }

    fn pause(&self) {
        self.state.lock().unwrap().paused = true;
    }

    fn resume(&self) {
        self.state.lock().unwrap().paused = false;
    }

    fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        state.active = None;
        state.paused = false;
        state.finished = false;
        state.position = Duration::ZERO;
    }

    fn seek(&self, position: Duration) -> Result<(), AudioError> {
        let mut state = self.state.lock().unwrap();
        state.position = position;
        state.finished = false;
        Ok(())
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().unwrap().volume = volume;
    }

    fn position(&self) -> Duration {
        self.state.lock().unwrap().position
    }

    fn is_finished(&self) -> bool {
        self.state.lock().unwrap().finished
    }
}
