use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{
    backend::{CollectionBackend, SyncError},
    entry::CollectionItem,
};

/// In-memory backend. Offline fails every call; reject_writes fails only
/// create and delete. Gates park the next matching call until notified.
pub struct MemoryBackend<T> {
    items: Mutex<Vec<T>>,
    offline: AtomicBool,
    reject_writes: AtomicBool,
    list_gate: Mutex<Option<Arc<Notify>>>,
    create_gate: Mutex<Option<Arc<Notify>>>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl<T> Default for MemoryBackend<T> {
    fn default() -> Self {
        Self::with_items(Vec::new())
    }
}

impl<T> MemoryBackend<T> {
    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
            offline: AtomicBool::new(false),
            reject_writes: AtomicBool::new(false),
            list_gate: Mutex::new(None),
            create_gate: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn gate_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_create(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.create_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check(&self, write: bool) -> Result<(), SyncError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable("offline".into()));
        }
        if write && self.reject_writes.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable("writes rejected".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: CollectionItem> CollectionBackend<T> for MemoryBackend<T> {
    async fn list(&self) -> Result<Vec<T>, SyncError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check(false)?;
        let gate = self.list_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.items.lock().unwrap().clone())
    }

    async fn create(&self, item: &T) -> Result<(), SyncError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check(true)?;
        let gate = self.create_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let mut items = self.items.lock().unwrap();
        if !items.iter().any(|i| i.key() == item.key()) {
            items.push(item.clone());
        }
        Ok(())
    }

    async fn delete(&self, key: &T::Key) -> Result<(), SyncError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check(true)?;
        self.items.lock().unwrap().retain(|i| &i.key() != key);
        Ok(())
    }
}
