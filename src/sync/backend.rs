use super::entry::CollectionItem;
use crate::http::{ApiError, ApiService};
use async_trait::async_trait;
use std::marker::PhantomData;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// The remote side of a collection: list, add, remove. Add and remove are
/// assumed idempotent.
#[async_trait]
pub trait CollectionBackend<T: CollectionItem>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, SyncError>;
    async fn create(&self, item: &T) -> Result<(), SyncError>;
    async fn delete(&self, key: &T::Key) -> Result<(), SyncError>;
}

pub struct HttpCollectionBackend<T> {
    api: ApiService,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpCollectionBackend<T> {
    pub fn new(api: ApiService) -> Self {
        Self {
            api,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T: CollectionItem> CollectionBackend<T> for HttpCollectionBackend<T> {
    async fn list(&self) -> Result<Vec<T>, SyncError> {
        Ok(self.api.get_json(&T::list_path()).await?)
    }

    async fn create(&self, item: &T) -> Result<(), SyncError> {
        Ok(self.api.post_json(&item.create_path(), item).await?)
    }

    async fn delete(&self, key: &T::Key) -> Result<(), SyncError> {
        match self.api.delete(&T::delete_path(key)).await {
            // Already gone is what we wanted.
            Err(ApiError::NotFound(_)) => Ok(()),
            other => Ok(other?),
        }
    }
}
