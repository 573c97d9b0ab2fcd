use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{SystemTime, UNIX_EPOCH};

/// Something a [`CollectionSyncStore`](super::store::CollectionSyncStore) can hold.
///
/// The natural key gives the collection set semantics.
pub trait CollectionItem:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Key: Clone + Debug + Eq + Hash + Send + Sync + 'static;

    /// REST collection name, also used for the persisted file and logs.
    const COLLECTION: &'static str;

    fn key(&self) -> Self::Key;

    fn list_path() -> String {
        Self::COLLECTION.to_string()
    }

    fn create_path(&self) -> String {
        Self::COLLECTION.to_string()
    }

    fn delete_path(key: &Self::Key) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Committed locally, backend call not answered yet.
    Pending,
    #[default]
    Confirmed,
    /// Backend rejected or was unreachable; kept until the next fetch.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry<T> {
    pub item: T,
    pub added_at: u64,
    #[serde(default)]
    pub status: EntryStatus,
    #[serde(skip)]
    pub(crate) ticket: u64,
}

impl<T: CollectionItem> CollectionEntry<T> {
    pub fn confirmed(item: T) -> Self {
        Self {
            item,
            added_at: now_millis(),
            status: EntryStatus::Confirmed,
            ticket: 0,
        }
    }

    pub fn key(&self) -> T::Key {
        self.item.key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncState {
    pub is_loading: bool,
    /// Distinguishes "empty because never fetched" from "genuinely empty".
    pub has_fetched_from_server: bool,
    pub revision: u64,
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
