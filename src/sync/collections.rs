use serde::{Deserialize, Serialize};
use std::fmt;

use super::{entry::CollectionItem, store::CollectionSyncStore};
use crate::model::{Track, TrackId};

pub type CartStore = CollectionSyncStore<CartItem>;
pub type LikesStore = CollectionSyncStore<LikedBeat>;
pub type PlaylistStore = CollectionSyncStore<PlaylistMembership>;
pub type PurchaseStore = CollectionSyncStore<PurchaseRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    #[default]
    Basic,
    Premium,
    Exclusive,
}

impl LicenseTier {
    pub fn price_multiplier(self) -> f64 {
        match self {
            Self::Basic => 1.0,
            Self::Premium => 2.5,
            Self::Exclusive => 10.0,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Basic => Self::Premium,
            Self::Premium => Self::Exclusive,
            Self::Exclusive => Self::Basic,
        }
    }
}

impl fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Basic => "Basic",
            Self::Premium => "Premium",
            Self::Exclusive => "Exclusive",
        })
    }
}

/// A track in the cart. A track appears at most once whatever its license;
/// changing the license is a remove followed by an add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub track: Track,
    #[serde(default)]
    pub license: LicenseTier,
}

impl CartItem {
    pub fn new(track: Track, license: LicenseTier) -> Self {
        Self { track, license }
    }

    pub fn price(&self) -> f64 {
        self.track.price * self.license.price_multiplier()
    }
}

impl CollectionItem for CartItem {
    type Key = TrackId;
    const COLLECTION: &'static str = "cart";

    fn key(&self) -> TrackId {
        self.track.id.clone()
    }

    fn delete_path(key: &TrackId) -> String {
        format!("cart/{}", urlencoding::encode(key))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikedBeat {
    pub track_id: TrackId,
    #[serde(default)]
    pub title: String,
}

impl LikedBeat {
    pub fn new(track_id: impl Into<TrackId>) -> Self {
        Self {
            track_id: track_id.into(),
            title: String::new(),
        }
    }
}

impl From<&Track> for LikedBeat {
    fn from(track: &Track) -> Self {
        Self {
            track_id: track.id.clone(),
            title: track.title.clone(),
        }
    }
}

impl CollectionItem for LikedBeat {
    type Key = TrackId;
    const COLLECTION: &'static str = "likes";

    fn key(&self) -> TrackId {
        self.track_id.clone()
    }

    fn delete_path(key: &TrackId) -> String {
        format!("likes/{}", urlencoding::encode(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistMembership {
    pub playlist_id: String,
    pub track_id: TrackId,
}

impl CollectionItem for PlaylistMembership {
    type Key = (String, TrackId);
    const COLLECTION: &'static str = "playlist-tracks";

    fn key(&self) -> Self::Key {
        (self.playlist_id.clone(), self.track_id.clone())
    }

    fn list_path() -> String {
        "playlists/tracks".to_string()
    }

    fn create_path(&self) -> String {
        format!("playlists/{}/tracks", urlencoding::encode(&self.playlist_id))
    }

    fn delete_path((playlist_id, track_id): &Self::Key) -> String {
        format!(
            "playlists/{}/tracks/{}",
            urlencoding::encode(playlist_id),
            urlencoding::encode(track_id)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub track_id: TrackId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub license: LicenseTier,
    pub order_id: String,
}

impl PurchaseRecord {
    pub fn from_cart(item: &CartItem, order_id: impl Into<String>) -> Self {
        Self {
            track_id: item.track.id.clone(),
            title: item.track.title.clone(),
            license: item.license,
            order_id: order_id.into(),
        }
    }
}

impl CollectionItem for PurchaseRecord {
    type Key = (String, TrackId);
    const COLLECTION: &'static str = "purchases";

    fn key(&self) -> Self::Key {
        (self.order_id.clone(), self.track_id.clone())
    }

    fn delete_path((order_id, track_id): &Self::Key) -> String {
        format!(
            "purchases/{}/{}",
            urlencoding::encode(order_id),
            urlencoding::encode(track_id)
        )
    }
}
