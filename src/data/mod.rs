pub mod storage;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    audio::PlayerSettings,
    sync::{CollectionEntry, CollectionItem, CollectionSyncStore},
};

pub use storage::StorageError;

pub const FORMAT_VERSION: u32 = 1;
const SETTINGS_FILE: &str = "player.json";

fn legacy_version() -> u32 {
    1
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default = "legacy_version")]
    version: u32,
    #[serde(flatten)]
    settings: PlayerSettings,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: CollectionItem"))]
struct CollectionFile<T> {
    #[serde(default = "legacy_version")]
    version: u32,
    #[serde(default = "Vec::new")]
    entries: Vec<CollectionEntry<T>>,
}

/// Local state that survives restarts: player settings and one file per
/// collection. Files written by a newer build are ignored.
#[derive(Debug, Clone)]
pub struct DataStore {
    dir: PathBuf,
}

impl DataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn supported(&self, file: &str, version: u32) -> bool {
        if version > FORMAT_VERSION {
            warn!(file, version, supported = FORMAT_VERSION, "data_newer_version_ignored");
            return false;
        }
        true
    }

    pub fn load_settings(&self) -> Result<PlayerSettings, StorageError> {
        let loaded = storage::load_from::<SettingsFile>(&self.path(SETTINGS_FILE))?;
        Ok(loaded
            .filter(|f| self.supported(SETTINGS_FILE, f.version))
            .map(|f| f.settings)
            .unwrap_or_default())
    }

    pub fn save_settings(&self, settings: PlayerSettings) -> Result<(), StorageError> {
        storage::save_to(
            &self.path(SETTINGS_FILE),
            &SettingsFile {
                version: FORMAT_VERSION,
                settings,
            },
        )
    }

    pub fn load_entries<T: CollectionItem>(&self) -> Result<Vec<CollectionEntry<T>>, StorageError> {
        let file = format!("{}.json", T::COLLECTION);
        let loaded = storage::load_from::<CollectionFile<T>>(&self.path(&file))?;
        Ok(loaded
            .filter(|f| self.supported(&file, f.version))
            .map(|f| f.entries)
            .unwrap_or_default())
    }

    pub fn save_entries<T: CollectionItem>(
        &self,
        entries: Vec<CollectionEntry<T>>,
    ) -> Result<(), StorageError> {
        let file = format!("{}.json", T::COLLECTION);
        storage::save_to(
            &self.path(&file),
            &CollectionFile {
                version: FORMAT_VERSION,
                entries,
            },
        )
    }

    /// Seeds `store` from disk. A broken file is logged and skipped.
    pub fn restore_into<T: CollectionItem>(&self, store: &CollectionSyncStore<T>) {
        match self.load_entries::<T>() {
            Ok(entries) if !entries.is_empty() => {
                info!(collection = T::COLLECTION, count = entries.len(), "data_restored");
                store.restore(entries);
            }
            Ok(_) => {}
            Err(e) => warn!(collection = T::COLLECTION, error = %e, "data_restore_failed"),
        }
    }

    pub fn persist<T: CollectionItem>(&self, store: &CollectionSyncStore<T>) {
        if let Err(e) = self.save_entries(store.entries()) {
            warn!(collection = T::COLLECTION, error = %e, "data_persist_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RepeatMode;
    use crate::sync::{LikedBeat, testing::MemoryBackend};
    use std::{fs, sync::Arc};

    #[test]
    fn settings_default_when_missing_and_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataStore::new(dir.path());
        assert_eq!(data.load_settings().unwrap(), PlayerSettings::default());

        let settings = PlayerSettings {
            volume: 0.4,
            shuffle: true,
            repeat: RepeatMode::One,
        };
        data.save_settings(settings).unwrap();
        assert_eq!(data.load_settings().unwrap(), settings);

        let raw = fs::read_to_string(dir.path().join("player.json")).unwrap();
        assert!(raw.contains("\"version\": 1"));
    }

    #[test]
    fn versionless_files_read_as_version_one() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("player.json"),
            r#"{"volume": 0.3, "repeat": "all"}"#,
        )
        .unwrap();

        let settings = DataStore::new(dir.path()).load_settings().unwrap();
        assert_eq!(settings.volume, 0.3);
        assert_eq!(settings.repeat, RepeatMode::All);
        assert!(!settings.shuffle);
    }

    #[test]
    fn newer_versions_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("player.json"),
            r#"{"version": 2, "volume": 0.3}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("likes.json"),
            r#"{"version": 9, "entries": [{"item": {"track_id": "a"}, "added_at": 1}]}"#,
        )
        .unwrap();

        let data = DataStore::new(dir.path());
        assert_eq!(data.load_settings().unwrap(), PlayerSettings::default());
        assert!(data.load_entries::<LikedBeat>().unwrap().is_empty());
    }

    #[tokio::test]
    async fn collections_persist_and_restore_unfetched() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataStore::new(dir.path());

        let store = CollectionSyncStore::new(Arc::new(MemoryBackend::<LikedBeat>::default()));
        store.add(LikedBeat::new("a"));
        store.add(LikedBeat::new("b"));
        store.flush().await;
        data.persist(&store);

        let fresh = CollectionSyncStore::new(Arc::new(MemoryBackend::<LikedBeat>::default()));
        data.restore_into(&fresh);
        assert_eq!(fresh.items(), store.items());
        assert!(!fresh.sync_state().has_fetched_from_server);
    }
}
