use crate::{
    audio::{
        bus::{PlaybackEvent, PlaybackEventBus, PlaybackEventKind, SubscriptionId},
        commands::PlayerCommand,
        config::AudioConfig,
        error::AudioError,
        queue::{PlaybackContext, QueueResolver},
        resource::{AudioResource, PendingPlay, ResourcePhase},
        state::{PlaybackStatus, PlayerSettings, PlayerSnapshot, RepeatMode},
        traits::AudioOutput,
    },
    model::Track,
};
use flume::Receiver;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{debug, info, warn};

enum Step {
    Next,
    Previous,
}

/// The single source of truth for what is playing.
///
/// Commands mutate intent synchronously and hand loads to the
/// [`AudioResource`]; resource events come back through the bus and are
/// applied by [`pump`](Self::pump). Every change is rebroadcast as a
/// [`PlayerSnapshot`] to all subscribed views.
pub struct Player {
    resource: Arc<AudioResource>,
    bus: PlaybackEventBus,
    inbox: Receiver<PlaybackEvent>,
    subscription: SubscriptionId,
    resolver: QueueResolver,
    context: Option<PlaybackContext>,
    generation: u64,
    snapshot: PlayerSnapshot,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    config: AudioConfig,
    advance: Option<PendingPlay>,
}

impl Player {
    pub fn new(resource: Arc<AudioResource>, bus: PlaybackEventBus, config: AudioConfig) -> Self {
        let (inbox_tx, inbox) = flume::unbounded();
        let subscription = bus.on_any(move |event| {
            let _ = inbox_tx.send(event.clone());
        });

        let volume = resource.set_volume(config.volume);
        let snapshot = PlayerSnapshot {
            volume,
            ..Default::default()
        };
        let (snapshot_tx, _) = watch::channel(snapshot.clone());

        Self {
            generation: resource.generation(),
            resource,
            bus,
            inbox,
            subscription,
            resolver: QueueResolver::new(),
            context: None,
            snapshot,
            snapshot_tx,
            config,
            advance: None,
        }
    }

    /// Builds the bus and the resource around `output`.
    pub fn with_output(output: Arc<dyn AudioOutput>, config: AudioConfig) -> Self {
        let bus = PlaybackEventBus::new();
        let resource = Arc::new(AudioResource::new(output, bus.emitter()));
        Self::new(resource, bus, config)
    }

    pub fn with_resolver(mut self, resolver: QueueResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> &PlayerSnapshot {
        &self.snapshot
    }

    pub fn context(&self) -> Option<&PlaybackContext> {
        self.context.as_ref()
    }

    pub fn bus(&self) -> &PlaybackEventBus {
        &self.bus
    }

    pub fn resource(&self) -> &Arc<AudioResource> {
        &self.resource
    }

    pub fn settings(&self) -> PlayerSettings {
        PlayerSettings {
            volume: self.snapshot.volume,
            shuffle: self.snapshot.shuffle,
            repeat: self.snapshot.repeat,
        }
    }

    pub fn apply_settings(&mut self, settings: PlayerSettings) {
        self.snapshot.volume = self.resource.set_volume(settings.volume);
        self.snapshot.is_muted = false;
        self.snapshot.shuffle = settings.shuffle;
        self.snapshot.repeat = settings.repeat;
        self.publish();
    }

    pub fn handle_command(&mut self, cmd: PlayerCommand) -> Option<PendingPlay> {
        match cmd {
            PlayerCommand::PlayTrack(track, context) => Some(self.play_track(track, context)),
            PlayerCommand::Pause => {
                self.pause();
                None
            }
            PlayerCommand::Resume => Some(self.resume()),
            PlayerCommand::TogglePlayPause => self.toggle_play_pause(),
            PlayerCommand::Next => Some(self.next()),
            PlayerCommand::Previous => Some(self.previous()),
            PlayerCommand::Seek(position) => {
                self.seek(position);
                None
            }
            PlayerCommand::SeekBy(delta_secs) => {
                self.seek_by(delta_secs);
                None
            }
            PlayerCommand::SetVolume(volume) => {
                self.set_volume(volume);
                None
            }
            PlayerCommand::VolumeUp => {
                self.set_volume(self.snapshot.volume + self.config.volume_step);
                None
            }
            PlayerCommand::VolumeDown => {
                self.set_volume(self.snapshot.volume - self.config.volume_step);
                None
            }
            PlayerCommand::ToggleMute => {
                self.toggle_mute();
                None
            }
            PlayerCommand::ToggleShuffle => {
                self.toggle_shuffle();
                None
            }
            PlayerCommand::CycleRepeat => {
                self.cycle_repeat();
                None
            }
            PlayerCommand::ToggleMobileExpanded => {
                self.set_mobile_expanded(!self.snapshot.is_mobile_expanded);
                None
            }
            PlayerCommand::Close => {
                self.close();
                None
            }
        }
    }

    /// Plays `track`, taking `context` as the new queue. Asking for the track
    /// that is already current resumes it instead of reloading.
    pub fn play_track(&mut self, track: Track, context: Option<Vec<Track>>) -> PendingPlay {
        let context = match context {
            Some(tracks) => PlaybackContext::starting_at(tracks, &track),
            None => PlaybackContext::single(track),
        };
        self.play_context(context)
    }

    pub fn play_context(&mut self, context: PlaybackContext) -> PendingPlay {
        let is_current = self
            .snapshot
            .current_track
            .as_ref()
            .is_some_and(|current| current.is_same(context.current()));

        if is_current {
            self.context = Some(context);
            self.sync_context();
            return self.resume();
        }
        self.load(context)
    }

    fn load(&mut self, context: PlaybackContext) -> PendingPlay {
        let track = context.current().clone();
        self.context = Some(context);

        let pending = self.resource.play(&track.audio_url);
        self.generation = pending.generation();
        info!(id = track.id.as_str(), generation = self.generation, "player_load");

        self.snapshot.status = PlaybackStatus::Loading;
        self.snapshot.is_playing = false;
        self.snapshot.is_loading = true;
        self.snapshot.current_time = Duration::ZERO;
        self.snapshot.duration = track.duration_hint();
        self.snapshot.last_error = None;
        self.snapshot.current_track = Some(track);
        self.sync_context();
        self.publish();

        pending
    }

    pub fn pause(&mut self) {
        if self.snapshot.status == PlaybackStatus::Idle {
            return;
        }
        self.resource.pause();
        self.snapshot.status = PlaybackStatus::Paused;
        self.snapshot.is_playing = false;
        self.publish();
    }

    /// No-op while idle. A current track whose locator was released (after an
    /// error or an exhausted queue) is loaded again.
    pub fn resume(&mut self) -> PendingPlay {
        if self.snapshot.current_track.is_none() {
            return PendingPlay::ready(self.generation, Ok(()));
        }

        match self.resource.resume() {
            Ok(()) => {
                if self.resource.phase() == ResourcePhase::Loading {
                    self.snapshot.status = PlaybackStatus::Loading;
                } else {
                    self.snapshot.status = PlaybackStatus::Playing;
                    self.snapshot.is_playing = true;
                }
                self.publish();
                PendingPlay::ready(self.generation, Ok(()))
            }
            Err(AudioError::NothingLoaded) => match self.context.clone() {
                Some(context) => self.load(context),
                None => PendingPlay::ready(self.generation, Err(AudioError::NothingLoaded)),
            },
            Err(error) => PendingPlay::ready(self.generation, Err(error)),
        }
    }

    pub fn toggle_play_pause(&mut self) -> Option<PendingPlay> {
        match self.snapshot.status {
            PlaybackStatus::Playing | PlaybackStatus::Loading => {
                self.pause();
                None
            }
            _ => Some(self.resume()),
        }
    }

    pub fn seek(&mut self, position: Duration) {
        if let Some(applied) = self.resource.seek(position) {
            self.snapshot.current_time = applied;
            self.publish();
        }
    }

    pub fn seek_by(&mut self, delta_secs: i64) {
        let current = self.snapshot.current_time;
        let delta = Duration::from_secs(delta_secs.unsigned_abs());
        let target = if delta_secs < 0 {
            current.saturating_sub(delta)
        } else {
            current.saturating_add(delta)
        };
        self.seek(target);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.snapshot.volume = self.resource.set_volume(volume);
        self.snapshot.is_muted = false;
        self.publish();
    }

    /// Muting keeps the chosen volume so unmuting restores it.
    pub fn toggle_mute(&mut self) {
        if self.snapshot.is_muted {
            self.resource.set_volume(self.snapshot.volume);
            self.snapshot.is_muted = false;
        } else {
            self.resource.set_volume(0.0);
            self.snapshot.is_muted = true;
        }
        self.publish();
    }

    pub fn next(&mut self) -> PendingPlay {
        self.step(Step::Next)
    }

    pub fn previous(&mut self) -> PendingPlay {
        self.step(Step::Previous)
    }

    fn step(&mut self, step: Step) -> PendingPlay {
        let Some(context) = self.context.as_ref() else {
            return PendingPlay::ready(self.generation, Ok(()));
        };
        let (shuffle, repeat) = (self.snapshot.shuffle, self.snapshot.repeat);
        let resolved = match step {
            Step::Next => self.resolver.next(context, shuffle, repeat),
            Step::Previous => self.resolver.previous(context, shuffle, repeat),
        };

        match resolved {
            Some(index) => {
                let mut context = context.clone();
                context.set_index(index);
                self.load(context)
            }
            None => {
                info!("player_queue_exhausted");
                self.resource.stop();
                self.generation = self.resource.generation();
                self.snapshot.status = PlaybackStatus::Paused;
                self.snapshot.is_playing = false;
                self.snapshot.is_loading = false;
                self.snapshot.current_time = Duration::ZERO;
                self.publish();
                PendingPlay::ready(self.generation, Ok(()))
            }
        }
    }

    pub fn toggle_shuffle(&mut self) {
        self.snapshot.shuffle = !self.snapshot.shuffle;
        self.publish();
    }

    pub fn cycle_repeat(&mut self) {
        self.snapshot.repeat = self.snapshot.repeat.cycle();
        self.publish();
    }

    pub fn set_mobile_expanded(&mut self, expanded: bool) {
        self.snapshot.is_mobile_expanded = expanded;
        self.publish();
    }

    /// The only command that discards the context.
    pub fn close(&mut self) {
        self.resource.stop();
        self.generation = self.resource.generation();
        self.context = None;
        self.snapshot = PlayerSnapshot {
            volume: self.snapshot.volume,
            is_muted: self.snapshot.is_muted,
            shuffle: self.snapshot.shuffle,
            repeat: self.snapshot.repeat,
            ..Default::default()
        };
        info!("player_closed");
        self.publish();
    }

    /// Delivers queued resource events and applies the ones addressed to us.
    /// Returns the load started by an auto-advance, if one was.
    pub fn pump(&mut self) -> Option<PendingPlay> {
        self.bus.dispatch_pending();
        self.process_events();
        self.advance.take()
    }

    /// Applies events already delivered to the player's subscription.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.inbox.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    fn handle_event(&mut self, event: PlaybackEvent) {
        if event.generation != self.generation {
            debug!(
                event = ?event.kind.name(),
                stale = event.generation,
                current = self.generation,
                "player_stale_event"
            );
            return;
        }

        match event.kind {
            PlaybackEventKind::LoadStart { .. } | PlaybackEventKind::Waiting => {
                self.snapshot.is_loading = true;
            }
            PlaybackEventKind::LoadedData { duration } => {
                if duration.is_some() {
                    self.snapshot.duration = duration;
                }
            }
            PlaybackEventKind::CanPlay => {
                self.snapshot.is_loading = false;
                if self.snapshot.status == PlaybackStatus::Loading {
                    self.snapshot.status = PlaybackStatus::Playing;
                    self.snapshot.is_playing = true;
                }
            }
            PlaybackEventKind::TimeUpdate { position } => {
                self.snapshot.current_time = position;
            }
            PlaybackEventKind::Ended => {
                self.on_ended();
                return;
            }
            PlaybackEventKind::Error { error } => {
                if error.is_superseded() {
                    return;
                }
                warn!(%error, "player_playback_error");
                self.snapshot.status = PlaybackStatus::Paused;
                self.snapshot.is_playing = false;
                self.snapshot.is_loading = false;
                self.snapshot.last_error = Some(error.to_string());
            }
        }
        self.publish();
    }

    fn on_ended(&mut self) {
        if self.snapshot.repeat == RepeatMode::One {
            self.resource.seek(Duration::ZERO);
            if let Err(error) = self.resource.resume() {
                warn!(%error, "player_repeat_one_restart_failed");
            }
            self.snapshot.current_time = Duration::ZERO;
            self.snapshot.status = PlaybackStatus::Playing;
            self.snapshot.is_playing = true;
            self.publish();
            return;
        }

        self.snapshot.status = PlaybackStatus::Advancing;
        self.snapshot.is_playing = false;
        // The outcome of the load arrives as events.
        let pending = self.next();
        if self.snapshot.status == PlaybackStatus::Loading {
            self.advance = Some(pending);
        }
    }

    fn sync_context(&mut self) {
        self.snapshot.context_index = self.context.as_ref().map(|c| c.index());
        self.snapshot.context_len = self.context.as_ref().map_or(0, |c| c.len());
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot.clone());
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.bus.off(self.subscription);
    }
}
