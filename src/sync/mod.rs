pub mod backend;
pub mod checkout;
pub mod collections;
pub mod entry;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use tracing::info;

use crate::http::ApiService;

pub use backend::{CollectionBackend, HttpCollectionBackend, SyncError};
pub use checkout::{CheckoutOutcome, CheckoutSignal, apply_checkout_signal, submit_order};
pub use collections::{
    CartItem, CartStore, LicenseTier, LikedBeat, LikesStore, PlaylistMembership, PlaylistStore,
    PurchaseRecord, PurchaseStore,
};
pub use entry::{CollectionEntry, CollectionItem, EntryStatus, SyncState};
pub use store::{CollectionSyncStore, FetchOutcome};

/// The four per-user collections, each backed by the REST API.
#[derive(Clone)]
pub struct Collections {
    pub cart: Arc<CartStore>,
    pub likes: Arc<LikesStore>,
    pub playlists: Arc<PlaylistStore>,
    pub purchases: Arc<PurchaseStore>,
}

impl Collections {
    pub fn over_http(api: &ApiService) -> Self {
        Self {
            cart: Arc::new(CollectionSyncStore::new(Arc::new(HttpCollectionBackend::new(
                api.clone(),
            )))),
            likes: Arc::new(CollectionSyncStore::new(Arc::new(HttpCollectionBackend::new(
                api.clone(),
            )))),
            playlists: Arc::new(CollectionSyncStore::new(Arc::new(
                HttpCollectionBackend::new(api.clone()),
            ))),
            purchases: Arc::new(CollectionSyncStore::new(Arc::new(
                HttpCollectionBackend::new(api.clone()),
            ))),
        }
    }

    /// Fetches every collection concurrently. Failures are logged by the
    /// stores and leave their local contents alone.
    pub async fn refresh_all(&self) {
        let (cart, likes, playlists, purchases) = tokio::join!(
            self.cart.fetch_from_server(),
            self.likes.fetch_from_server(),
            self.playlists.fetch_from_server(),
            self.purchases.fetch_from_server(),
        );
        info!(
            cart = cart.is_ok(),
            likes = likes.is_ok(),
            playlists = playlists.is_ok(),
            purchases = purchases.is_ok(),
            "collections_refreshed"
        );
    }

    pub async fn flush_all(&self) {
        tokio::join!(
            self.cart.flush(),
            self.likes.flush(),
            self.playlists.flush(),
            self.purchases.flush(),
        );
    }
}
