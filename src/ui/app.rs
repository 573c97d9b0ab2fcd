use std::{sync::Arc, time::Duration};

use flume::{Receiver, Sender};
use ratatui::Frame;
use rodio::OutputStream;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    audio::{Player, PlayerSnapshot, output::RodioOutput, resource::PendingPlay},
    config::AppConfig,
    data::DataStore,
    event::events::Event,
    http::ApiService,
    model::Track,
    sync::{Collections, EntryStatus, LicenseTier},
    ui::components::track_list::TrackRow,
    util::task::TaskManager,
};

use super::{
    layout::AppLayout,
    state::{Tab, UiState},
    tui::Tui,
    util::{format_price, handler::EventHandler},
};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(3);

pub struct App {
    pub config: AppConfig,
    pub api: ApiService,
    pub data: DataStore,
    pub player: Player,
    pub snapshot_rx: watch::Receiver<PlayerSnapshot>,
    pub collections: Collections,
    pub catalog: Vec<Track>,
    pub license: LicenseTier,
    pub ui: UiState,
    pub event_rx: Receiver<Event>,
    pub event_tx: Sender<Event>,
    pub task_manager: TaskManager,
    pub should_quit: bool,
    monitor: JoinHandle<()>,
    _stream: OutputStream,
}

impl App {
    pub async fn new() -> color_eyre::Result<Self> {
        let config = AppConfig::from_env()?;
        info!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "app_config_loaded");

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let api = ApiService::new(http_client.clone(), &config.api_url, config.api_token.clone());
        let data = DataStore::new(&config.data_dir);

        let (output, stream) = RodioOutput::open(http_client)?;
        let mut player = Player::with_output(Arc::new(output), config.audio.clone());
        match data.load_settings() {
            Ok(settings) => player.apply_settings(settings),
            Err(e) => warn!(error = %e, "app_settings_load_failed"),
        }
        let monitor = player
            .resource()
            .spawn_monitor(config.audio.time_update_interval());

        let collections = Collections::over_http(&api);
        data.restore_into(&collections.cart);
        data.restore_into(&collections.likes);
        data.restore_into(&collections.playlists);
        data.restore_into(&collections.purchases);

        let (event_tx, event_rx) = flume::unbounded();

        Ok(Self {
            snapshot_rx: player.subscribe(),
            config,
            api,
            data,
            player,
            collections,
            catalog: Vec::new(),
            license: LicenseTier::default(),
            ui: UiState::new(),
            event_rx,
            event_tx,
            task_manager: TaskManager::new(),
            should_quit: false,
            monitor,
            _stream: stream,
        })
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        self.fetch_catalog(None);
        self.refresh_collections();
        while !self.should_quit {
            if self.ui.has_focus {
                tui.draw(|f| self.ui(f))?;
            }
            EventHandler::handle_events(self, &mut tui).await?;
        }

        tui.exit()?;
        self.shutdown().await;
        Ok(())
    }

    fn ui(&self, frame: &mut Frame) {
        AppLayout::new(self).render(frame, frame.area());
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn fetch_catalog(&mut self, query: Option<String>) {
        self.ui.catalog_loading = true;
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        self.task_manager.spawn(
            "catalog",
            tokio::spawn(async move {
                let event = match api.fetch_catalog(query.as_deref()).await {
                    Ok(tracks) => Event::CatalogFetched { query, tracks },
                    Err(e) => Event::FetchError(format!("Catalog unavailable: {e}")),
                };
                let _ = tx.send(event);
            }),
        );
    }

    /// A refresh already under way is left to finish.
    pub fn refresh_collections(&mut self) {
        let collections = self.collections.clone();
        let tx = self.event_tx.clone();
        self.task_manager.spawn_unless_running("collections", async move {
            collections.refresh_all().await;
            let _ = tx.send(Event::CollectionsRefreshed);
        });
    }

    /// Reports the outcome of a play request back to the loop.
    pub fn track_play(&mut self, pending: PendingPlay) {
        let tx = self.event_tx.clone();
        let generation = pending.generation();
        self.task_manager.spawn(
            "play",
            tokio::spawn(async move {
                let result = pending.await;
                let _ = tx.send(Event::PlayOutcome { generation, result });
            }),
        );
    }

    /// Tracks shown in the current tab, for playback contexts.
    pub fn tab_tracks(&self) -> Vec<Track> {
        match self.ui.tab {
            Tab::Catalog => self.catalog.clone(),
            Tab::Cart => self
                .collections
                .cart
                .items()
                .into_iter()
                .map(|item| item.track)
                .collect(),
            Tab::Likes => self
                .collections
                .likes
                .items()
                .iter()
                .filter_map(|like| self.catalog_track(&like.track_id))
                .collect(),
            Tab::Purchases => self
                .collections
                .purchases
                .items()
                .iter()
                .filter_map(|record| self.catalog_track(&record.track_id))
                .collect(),
        }
    }

    pub fn catalog_track(&self, track_id: &str) -> Option<Track> {
        self.catalog.iter().find(|t| t.id == track_id).cloned()
    }

    pub fn rows(&self) -> Vec<TrackRow> {
        let likes = &self.collections.likes;
        let cart = &self.collections.cart;
        let row = |id: &str, title: String, subtitle: String, detail: String, status| TrackRow {
            track_id: id.to_string(),
            title,
            subtitle,
            detail,
            liked: likes.contains(&id.to_string()),
            in_cart: cart.contains(&id.to_string()),
            status,
        };

        match self.ui.tab {
            Tab::Catalog => self
                .catalog
                .iter()
                .map(|t| {
                    row(
                        &t.id,
                        t.title.clone(),
                        t.producer_name.clone(),
                        format_price(t.price),
                        EntryStatus::Confirmed,
                    )
                })
                .collect(),
            Tab::Cart => cart
                .entries()
                .into_iter()
                .map(|e| {
                    row(
                        &e.item.track.id,
                        e.item.track.title.clone(),
                        e.item.track.producer_name.clone(),
                        format!("{} {}", e.item.license, format_price(e.item.price())),
                        e.status,
                    )
                })
                .collect(),
            Tab::Likes => likes
                .entries()
                .into_iter()
                .map(|e| {
                    let track = self.catalog_track(&e.item.track_id);
                    let title = match (&track, e.item.title.is_empty()) {
                        (Some(t), _) => t.title.clone(),
                        (None, false) => e.item.title.clone(),
                        (None, true) => e.item.track_id.clone(),
                    };
                    let producer = track.map(|t| t.producer_name).unwrap_or_default();
                    row(&e.item.track_id, title, producer, String::new(), e.status)
                })
                .collect(),
            Tab::Purchases => self
                .collections
                .purchases
                .entries()
                .into_iter()
                .map(|e| {
                    row(
                        &e.item.track_id,
                        e.item.title.clone(),
                        format!("order {}", e.item.order_id),
                        e.item.license.to_string(),
                        e.status,
                    )
                })
                .collect(),
        }
    }

    /// Count per tab for the sidebar; `None` while a collection has never
    /// been fetched and holds nothing.
    pub fn tab_counts(&self) -> Vec<(Tab, Option<usize>)> {
        fn count(len: usize, fetched: bool) -> Option<usize> {
            (fetched || len > 0).then_some(len)
        }
        let c = &self.collections;
        vec![
            (
                Tab::Catalog,
                count(self.catalog.len(), !self.ui.catalog_loading),
            ),
            (
                Tab::Cart,
                count(c.cart.len(), c.cart.sync_state().has_fetched_from_server),
            ),
            (
                Tab::Likes,
                count(c.likes.len(), c.likes.sync_state().has_fetched_from_server),
            ),
            (
                Tab::Purchases,
                count(
                    c.purchases.len(),
                    c.purchases.sync_state().has_fetched_from_server,
                ),
            ),
        ]
    }

    async fn shutdown(&mut self) {
        self.task_manager.abort_all();
        self.monitor.abort();
        self.player.close();

        if let Err(e) = self.data.save_settings(self.player.settings()) {
            warn!(error = %e, "app_settings_save_failed");
        }
        if tokio::time::timeout(FLUSH_TIMEOUT, self.collections.flush_all())
            .await
            .is_err()
        {
            warn!("app_collection_flush_timed_out");
        }
        self.data.persist(&self.collections.cart);
        self.data.persist(&self.collections.likes);
        self.data.persist(&self.collections.playlists);
        self.data.persist(&self.collections.purchases);
        info!("app_shutdown");
    }
}
