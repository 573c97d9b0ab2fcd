use crate::audio::error::AudioError;
use flume::{Receiver, Sender};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEventKind {
    LoadStart { locator: String },
    /// Duration is known (or known to be unknown).
    LoadedData { duration: Option<Duration> },
    TimeUpdate { position: Duration },
    Ended,
    /// Buffering started.
    Waiting,
    /// Buffering finished.
    CanPlay,
    Error { error: AudioError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    LoadStart,
    LoadedData,
    TimeUpdate,
    Ended,
    Waiting,
    CanPlay,
    Error,
}

impl PlaybackEventKind {
    pub fn name(&self) -> EventName {
        match self {
            PlaybackEventKind::LoadStart { .. } => EventName::LoadStart,
            PlaybackEventKind::LoadedData { .. } => EventName::LoadedData,
            PlaybackEventKind::TimeUpdate { .. } => EventName::TimeUpdate,
            PlaybackEventKind::Ended => EventName::Ended,
            PlaybackEventKind::Waiting => EventName::Waiting,
            PlaybackEventKind::CanPlay => EventName::CanPlay,
            PlaybackEventKind::Error { .. } => EventName::Error,
        }
    }
}

/// A resource lifecycle event tagged with the load generation that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEvent {
    pub generation: u64,
    pub kind: PlaybackEventKind,
}

impl PlaybackEvent {
    pub fn new(generation: u64, kind: PlaybackEventKind) -> Self {
        Self { generation, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&PlaybackEvent) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    filter: Option<EventName>,
    handler: Handler,
}

/// Queue side of the bus, handed to the audio resource.
#[derive(Clone)]
pub struct EventEmitter {
    tx: Sender<PlaybackEvent>,
}

impl EventEmitter {
    pub fn emit(&self, generation: u64, kind: PlaybackEventKind) {
        let _ = self.tx.send(PlaybackEvent::new(generation, kind));
    }
}

/// Typed publish/subscribe surface between the audio resource and its listeners.
///
/// Emission is queued; delivery happens on whichever thread drains the queue
/// with [`dispatch_pending`](Self::dispatch_pending) or
/// [`dispatch_next`](Self::dispatch_next), in emission order and, per event,
/// in subscription order.
#[derive(Clone)]
pub struct PlaybackEventBus {
    tx: Sender<PlaybackEvent>,
    rx: Receiver<PlaybackEvent>,
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for PlaybackEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEventBus {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            tx,
            rx,
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            tx: self.tx.clone(),
        }
    }

    pub fn on<F>(&self, name: EventName, handler: F) -> SubscriptionId
    where
        F: Fn(&PlaybackEvent) + Send + Sync + 'static,
    {
        self.subscribe(Some(name), Arc::new(handler))
    }

    pub fn on_any<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&PlaybackEvent) + Send + Sync + 'static,
    {
        self.subscribe(None, Arc::new(handler))
    }

    fn subscribe(&self, filter: Option<EventName>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut subs) = self.subscriptions.lock() {
            subs.push(Subscription {
                id,
                filter,
                handler,
            });
        }
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let Ok(mut subs) = self.subscriptions.lock() else {
            return false;
        };
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Delivers `event` synchronously to every matching handler.
    pub fn publish(&self, event: &PlaybackEvent) {
        let name = event.kind.name();
        // Handlers run without the lock so they may subscribe/unsubscribe.
        let handlers: Vec<Handler> = match self.subscriptions.lock() {
            Ok(subs) => subs
                .iter()
                .filter(|s| s.filter.is_none_or(|f| f == name))
                .map(|s| s.handler.clone())
                .collect(),
            Err(_) => return,
        };

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(event = ?name, generation = event.generation, "playback_event_handler_panicked");
            }
        }
    }

    /// Drains every queued emission. Returns how many events were delivered.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.publish(&event);
            delivered += 1;
        }
        if delivered > 0 {
            debug!(delivered, "playback_events_dispatched");
        }
        delivered
    }

    /// Waits for at least one emission, then delivers everything queued.
    pub async fn dispatch_next(&self) -> usize {
        match self.rx.recv_async().await {
            Ok(event) => {
                self.publish(&event);
                1 + self.dispatch_pending()
            }
            Err(_) => 0,
        }
    }
}
