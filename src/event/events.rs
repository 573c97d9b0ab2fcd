use crate::{audio::error::AudioError, model::Track, sync::CheckoutOutcome};

/// Results of background work, delivered to the app loop.
#[derive(Debug, Clone)]
pub enum Event {
    CatalogFetched {
        query: Option<String>,
        tracks: Vec<Track>,
    },
    CollectionsRefreshed,
    PlayOutcome {
        generation: u64,
        result: Result<(), AudioError>,
    },
    CheckoutFinished(CheckoutOutcome),
    FetchError(String),
}
