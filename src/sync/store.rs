use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use super::{
    backend::{CollectionBackend, SyncError},
    entry::{CollectionEntry, CollectionItem, EntryStatus, SyncState, now_millis},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Local contents were replaced with this many server items.
    Replaced(usize),
    /// Another fetch was already running; nothing was done.
    AlreadyInFlight,
}

#[derive(Debug, Clone, Copy)]
struct Removal {
    ticket: u64,
    status: EntryStatus,
}

struct StoreInner<T: CollectionItem> {
    entries: Vec<CollectionEntry<T>>,
    removals: HashMap<T::Key, Removal>,
    state: SyncState,
}

/// Optimistic local set of `T`, reconciled with a remote backend.
///
/// `add` and `remove` commit locally before returning and send the backend
/// call from a background task. A failed call leaves the local change in
/// place and marks it [`EntryStatus::Failed`]; the next successful
/// [`fetch_from_server`](Self::fetch_from_server) replaces local contents
/// with the server's.
pub struct CollectionSyncStore<T: CollectionItem> {
    backend: Arc<dyn CollectionBackend<T>>,
    inner: Arc<RwLock<StoreInner<T>>>,
    state_tx: Arc<watch::Sender<SyncState>>,
    fetching: Arc<AtomicBool>,
    tickets: AtomicU64,
    jobs: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: CollectionItem> CollectionSyncStore<T> {
    pub fn new(backend: Arc<dyn CollectionBackend<T>>) -> Self {
        let (state_tx, _) = watch::channel(SyncState::default());
        Self {
            backend,
            inner: Arc::new(RwLock::new(StoreInner {
                entries: Vec::new(),
                removals: HashMap::new(),
                state: SyncState::default(),
            })),
            state_tx: Arc::new(state_tx),
            fetching: Arc::new(AtomicBool::new(false)),
            tickets: AtomicU64::new(1),
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        T::COLLECTION
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state_tx.subscribe()
    }

    pub fn sync_state(&self) -> SyncState {
        read(&self.inner).state
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        read(&self.inner).entries.iter().any(|e| &e.key() == key)
    }

    pub fn status_of(&self, key: &T::Key) -> Option<EntryStatus> {
        read(&self.inner)
            .entries
            .iter()
            .find(|e| &e.key() == key)
            .map(|e| e.status)
    }

    pub fn entries(&self) -> Vec<CollectionEntry<T>> {
        read(&self.inner).entries.clone()
    }

    pub fn items(&self) -> Vec<T> {
        read(&self.inner)
            .entries
            .iter()
            .map(|e| e.item.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        read(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys removed locally whose delete the backend has not acknowledged.
    pub fn pending_removals(&self) -> Vec<(T::Key, EntryStatus)> {
        read(&self.inner)
            .removals
            .iter()
            .map(|(k, r)| (k.clone(), r.status))
            .collect()
    }

    /// Inserts `item` unless an entry with the same key exists.
    /// Returns whether the local set changed.
    pub fn add(&self, item: T) -> bool {
        let key = item.key();
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        {
            let mut inner = write(&self.inner);
            if inner.entries.iter().any(|e| e.key() == key) {
                debug!(collection = T::COLLECTION, ?key, "sync_add_duplicate");
                return false;
            }
            inner.entries.push(CollectionEntry {
                item: item.clone(),
                added_at: now_millis(),
                status: EntryStatus::Pending,
                ticket,
            });
            inner.removals.remove(&key);
            bump(&mut inner, &self.state_tx);
        }
        info!(collection = T::COLLECTION, ?key, "sync_add");

        let backend = self.backend.clone();
        let inner = self.inner.clone();
        let state_tx = self.state_tx.clone();
        self.track(tokio::spawn(async move {
            let result = backend.create(&item).await;
            let mut guard = write(&inner);
            let Some(entry) = guard
                .entries
                .iter_mut()
                .find(|e| e.ticket == ticket && e.key() == key)
            else {
                debug!(collection = T::COLLECTION, ?key, "sync_add_superseded");
                return;
            };
            entry.status = match &result {
                Ok(()) => EntryStatus::Confirmed,
                Err(e) => {
                    warn!(collection = T::COLLECTION, ?key, error = %e, "sync_add_failed");
                    EntryStatus::Failed
                }
            };
            bump(&mut guard, &state_tx);
        }));
        true
    }

    /// Removes the entry with `key` if present. Returns whether the local set changed.
    pub fn remove(&self, key: &T::Key) -> bool {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        {
            let mut inner = write(&self.inner);
            let Some(pos) = inner.entries.iter().position(|e| &e.key() == key) else {
                return false;
            };
            inner.entries.remove(pos);
            inner.removals.insert(
                key.clone(),
                Removal {
                    ticket,
                    status: EntryStatus::Pending,
                },
            );
            bump(&mut inner, &self.state_tx);
        }
        info!(collection = T::COLLECTION, ?key, "sync_remove");

        let backend = self.backend.clone();
        let inner = self.inner.clone();
        let state_tx = self.state_tx.clone();
        let key = key.clone();
        self.track(tokio::spawn(async move {
            let result = backend.delete(&key).await;
            let mut guard = write(&inner);
            match guard.removals.get(&key) {
                Some(removal) if removal.ticket == ticket => {}
                _ => {
                    debug!(collection = T::COLLECTION, ?key, "sync_remove_superseded");
                    return;
                }
            }
            match result {
                Ok(()) => {
                    guard.removals.remove(&key);
                }
                Err(e) => {
                    warn!(collection = T::COLLECTION, ?key, error = %e, "sync_remove_failed");
                    if let Some(removal) = guard.removals.get_mut(&key) {
                        removal.status = EntryStatus::Failed;
                    }
                }
            }
            bump(&mut guard, &state_tx);
        }));
        true
    }

    /// Replaces local contents with the server's list.
    ///
    /// Returns immediately with [`FetchOutcome::AlreadyInFlight`] while
    /// another fetch is running. On failure local contents are untouched.
    pub async fn fetch_from_server(&self) -> Result<FetchOutcome, SyncError> {
        if self
            .fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(collection = T::COLLECTION, "sync_fetch_in_flight");
            return Ok(FetchOutcome::AlreadyInFlight);
        }
        let _flight = FlightGuard {
            fetching: &self.fetching,
            inner: &self.inner,
            state_tx: &self.state_tx,
        };

        {
            let mut inner = write(&self.inner);
            inner.state.is_loading = true;
            bump(&mut inner, &self.state_tx);
        }

        let start = std::time::Instant::now();
        let result = self.backend.list().await;

        let mut inner = write(&self.inner);
        inner.state.is_loading = false;
        let outcome = match result {
            Ok(items) => {
                let previous: HashMap<T::Key, u64> = inner
                    .entries
                    .iter()
                    .map(|e| (e.key(), e.added_at))
                    .collect();
                let mut seen = HashSet::new();
                let entries: Vec<_> = items
                    .into_iter()
                    .filter(|item| seen.insert(item.key()))
                    .map(|item| {
                        let mut entry = CollectionEntry::confirmed(item);
                        if let Some(added_at) = previous.get(&entry.key()) {
                            entry.added_at = *added_at;
                        }
                        entry
                    })
                    .collect();
                let count = entries.len();
                inner.entries = entries;
                inner.removals.clear();
                inner.state.has_fetched_from_server = true;
                info!(
                    collection = T::COLLECTION,
                    count,
                    elapsed_ms = start.elapsed().as_millis(),
                    "sync_fetch_complete"
                );
                Ok(FetchOutcome::Replaced(count))
            }
            Err(e) => {
                warn!(collection = T::COLLECTION, error = %e, "sync_fetch_failed");
                Err(e)
            }
        };
        bump(&mut inner, &self.state_tx);
        outcome
    }

    /// Seeds local contents from persisted entries. Does not count as a
    /// server fetch.
    pub fn restore(&self, entries: Vec<CollectionEntry<T>>) {
        let mut seen = HashSet::new();
        let entries: Vec<_> = entries
            .into_iter()
            .filter(|e| seen.insert(e.key()))
            .collect();
        let mut inner = write(&self.inner);
        debug!(collection = T::COLLECTION, count = entries.len(), "sync_restore");
        inner.entries = entries;
        bump(&mut inner, &self.state_tx);
    }

    /// Drops local contents without touching the backend. Whether the
    /// server was ever read is unchanged.
    pub fn clear_local(&self) {
        let mut inner = write(&self.inner);
        inner.entries.clear();
        inner.removals.clear();
        bump(&mut inner, &self.state_tx);
    }

    /// Waits for every background backend call issued so far.
    pub async fn flush(&self) {
        let jobs = match self.jobs.lock() {
            Ok(mut jobs) => std::mem::take(&mut *jobs),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for job in jobs {
            if let Err(e) = job.await {
                warn!(collection = T::COLLECTION, error = %e, "sync_job_panicked");
            }
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut jobs = match self.jobs.lock() {
            Ok(jobs) => jobs,
            Err(poisoned) => poisoned.into_inner(),
        };
        jobs.retain(|h| !h.is_finished());
        jobs.push(handle);
    }
}

/// Releases the fetch slot. A fetch dropped mid-request also clears
/// `is_loading`.
struct FlightGuard<'a, T: CollectionItem> {
    fetching: &'a AtomicBool,
    inner: &'a RwLock<StoreInner<T>>,
    state_tx: &'a watch::Sender<SyncState>,
}

impl<T: CollectionItem> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        let mut inner = write(self.inner);
        if inner.state.is_loading {
            debug!(collection = T::COLLECTION, "sync_fetch_abandoned");
            inner.state.is_loading = false;
            bump(&mut inner, self.state_tx);
        }
        drop(inner);
        self.fetching.store(false, Ordering::Release);
    }
}

fn bump<T: CollectionItem>(inner: &mut StoreInner<T>, tx: &watch::Sender<SyncState>) {
    inner.state.revision = inner.state.revision.wrapping_add(1);
    tx.send_replace(inner.state);
}

fn read<T: CollectionItem>(lock: &RwLock<StoreInner<T>>) -> RwLockReadGuard<'_, StoreInner<T>> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T: CollectionItem>(lock: &RwLock<StoreInner<T>>) -> RwLockWriteGuard<'_, StoreInner<T>> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{collections::LikedBeat, testing::MemoryBackend};

    fn store(backend: &Arc<MemoryBackend<LikedBeat>>) -> CollectionSyncStore<LikedBeat> {
        CollectionSyncStore::new(backend.clone())
    }

    fn like(id: &str) -> LikedBeat {
        LikedBeat::new(id)
    }

    #[tokio::test]
    async fn add_is_idempotent_by_key() {
        let backend = Arc::new(MemoryBackend::default());
        let store = store(&backend);

        assert!(store.add(like("a")));
        assert!(!store.add(like("a")));
        assert!(store.contains(&"a".to_string()));
        assert_eq!(store.len(), 1);

        store.flush().await;
        assert_eq!(backend.create_calls(), 1);
        assert_eq!(store.status_of(&"a".to_string()), Some(EntryStatus::Confirmed));
    }

    #[tokio::test]
    async fn removing_an_absent_key_does_nothing() {
        let backend = Arc::new(MemoryBackend::<LikedBeat>::default());
        let store = store(&backend);

        assert!(!store.remove(&"missing".to_string()));
        store.flush().await;
        assert_eq!(backend.delete_calls(), 0);
        assert_eq!(store.sync_state().revision, 0);
    }

    #[tokio::test]
    async fn unreachable_backend_keeps_local_add() {
        let backend = Arc::new(MemoryBackend::default());
        backend.set_offline(true);
        let store = store(&backend);

        store.add(like("a"));
        assert!(store.contains(&"a".to_string()));

        store.flush().await;
        assert!(store.contains(&"a".to_string()));
        assert_eq!(store.status_of(&"a".to_string()), Some(EntryStatus::Failed));
    }

    #[tokio::test]
    async fn failed_delete_keeps_local_removal() {
        let backend = Arc::new(MemoryBackend::with_items(vec![like("a")]));
        let store = store(&backend);
        store.fetch_from_server().await.unwrap();

        backend.set_offline(true);
        assert!(store.remove(&"a".to_string()));
        store.flush().await;

        assert!(!store.contains(&"a".to_string()));
        assert_eq!(
            store.pending_removals(),
            vec![("a".to_string(), EntryStatus::Failed)]
        );
    }

    #[tokio::test]
    async fn fetch_replaces_instead_of_merging() {
        let backend = Arc::new(MemoryBackend::with_items(vec![like("server")]));
        backend.set_reject_writes(true);
        let store = store(&backend);

        store.add(like("local-only"));
        let outcome = store.fetch_from_server().await.unwrap();
        assert_eq!(outcome, FetchOutcome::Replaced(1));
        store.flush().await;

        assert!(!store.contains(&"local-only".to_string()));
        assert!(store.contains(&"server".to_string()));
        assert_eq!(store.status_of(&"server".to_string()), Some(EntryStatus::Confirmed));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_contents_and_flag() {
        let backend = Arc::new(MemoryBackend::default());
        let store = store(&backend);
        store.add(like("a"));
        store.flush().await;

        backend.set_offline(true);
        assert!(store.fetch_from_server().await.is_err());

        let state = store.sync_state();
        assert!(!state.has_fetched_from_server);
        assert!(!state.is_loading);
        assert!(store.contains(&"a".to_string()));
    }

    #[tokio::test]
    async fn concurrent_fetch_short_circuits() {
        let backend = Arc::new(MemoryBackend::with_items(vec![like("a"), like("b")]));
        let gate = backend.gate_list();
        let store = Arc::new(store(&backend));

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.fetch_from_server().await }
        });
        while !store.sync_state().is_loading {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            store.fetch_from_server().await.unwrap(),
            FetchOutcome::AlreadyInFlight
        );
        gate.notify_one();

        assert_eq!(first.await.unwrap().unwrap(), FetchOutcome::Replaced(2));
        assert_eq!(backend.list_calls(), 1);
        assert!(store.sync_state().has_fetched_from_server);
    }

    #[tokio::test]
    async fn aborted_fetch_releases_loading_state() {
        let backend = Arc::new(MemoryBackend::with_items(vec![like("a")]));
        let _gate = backend.gate_list();
        let store = Arc::new(store(&backend));

        let task = tokio::spawn({
            let store = store.clone();
            async move { store.fetch_from_server().await }
        });
        while !store.sync_state().is_loading {
            tokio::task::yield_now().await;
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let state = store.sync_state();
        assert!(!state.is_loading);
        assert!(!state.has_fetched_from_server);
        assert_eq!(
            store.fetch_from_server().await.unwrap(),
            FetchOutcome::Replaced(1)
        );
        assert_eq!(backend.list_calls(), 2);
    }

    #[tokio::test]
    async fn server_duplicates_collapse_to_one_entry() {
        let backend = Arc::new(MemoryBackend::with_items(vec![like("a"), like("a"), like("b")]));
        let store = store(&backend);

        assert_eq!(
            store.fetch_from_server().await.unwrap(),
            FetchOutcome::Replaced(2)
        );
        assert_eq!(store.items(), vec![like("a"), like("b")]);
    }

    #[tokio::test]
    async fn late_confirmation_does_not_touch_a_readded_entry() {
        let backend = Arc::new(MemoryBackend::default());
        let store = store(&backend);
        let gate = backend.gate_create();

        store.add(like("a"));
        while backend.create_calls() < 1 {
            tokio::task::yield_now().await;
        }
        store.remove(&"a".to_string());
        backend.set_offline(true);
        store.add(like("a"));
        // the first create is still parked; the re-add fails immediately
        while store.status_of(&"a".to_string()) != Some(EntryStatus::Failed) {
            tokio::task::yield_now().await;
        }

        gate.notify_one();
        store.flush().await;
        assert_eq!(store.status_of(&"a".to_string()), Some(EntryStatus::Failed));
    }

    #[tokio::test]
    async fn restore_seeds_without_marking_fetched() {
        let backend = Arc::new(MemoryBackend::<LikedBeat>::default());
        let store = store(&backend);
        let mut rx = store.subscribe();

        store.restore(vec![
            CollectionEntry::confirmed(like("a")),
            CollectionEntry::confirmed(like("a")),
        ]);

        assert!(rx.has_changed().unwrap());
        assert_eq!(store.len(), 1);
        assert!(!rx.borrow_and_update().has_fetched_from_server);

        store.clear_local();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn clearing_keeps_the_fetched_flag() {
        let backend = Arc::new(MemoryBackend::with_items(vec![like("a")]));
        let store = store(&backend);
        store.fetch_from_server().await.unwrap();

        store.clear_local();

        assert!(store.is_empty());
        assert!(store.sync_state().has_fetched_from_server);
    }
}
