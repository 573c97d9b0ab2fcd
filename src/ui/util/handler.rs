use tracing::{debug, info, warn};

use crate::{
    audio::{commands::PlayerCommand, error::AudioError},
    event::events::Event,
    sync::{CartItem, CheckoutOutcome, LikedBeat, apply_checkout_signal, submit_order},
    ui::{
        app::App,
        input::InputHandler,
        message::AppMessage,
        state::Tab,
        tui::{TerminalEvent, Tui},
    },
};

enum Incoming {
    Terminal(TerminalEvent),
    App(Event),
    Playback,
}

pub struct EventHandler;

impl EventHandler {
    /// Waits for the next terminal event, background result or resource
    /// event, handles it, then applies any playback events that arrived.
    pub async fn handle_events(app: &mut App, tui: &mut Tui) -> color_eyre::Result<()> {
        let bus = app.player.bus().clone();
        let event_rx = app.event_rx.clone();

        let incoming = tokio::select! {
            Some(evt) = tui.next() => Incoming::Terminal(evt),
            Ok(evt) = event_rx.recv_async() => Incoming::App(evt),
            _ = bus.dispatch_next() => Incoming::Playback,
        };

        match incoming {
            Incoming::Terminal(evt) => Self::handle_terminal_event(app, evt, tui)?,
            Incoming::App(evt) => Self::handle_event(app, evt),
            Incoming::Playback => {}
        }

        while let Ok(evt) = app.event_rx.try_recv() {
            Self::handle_event(app, evt);
        }
        if let Some(advance) = app.player.pump() {
            app.track_play(advance);
        }
        Ok(())
    }

    fn handle_terminal_event(
        app: &mut App,
        evt: TerminalEvent,
        tui: &mut Tui,
    ) -> color_eyre::Result<()> {
        match evt {
            TerminalEvent::Tick => app.ui.tick = app.ui.tick.wrapping_add(1),
            TerminalEvent::FocusGained => {
                app.ui.has_focus = true;
                tui.clear()?;
            }
            TerminalEvent::FocusLost => app.ui.has_focus = false,
            TerminalEvent::Resize(..) => tui.clear()?,
            TerminalEvent::Paste(text) => {
                if let Some(input) = app.ui.search_input.as_mut() {
                    input.push_str(text.trim());
                }
            }
            TerminalEvent::Key(key) => {
                if let Some(msg) = InputHandler::handle_key(key, app.ui.search_input.is_some()) {
                    Self::update(app, msg);
                }
            }
        }
        Ok(())
    }

    pub fn handle_event(app: &mut App, evt: Event) {
        match evt {
            Event::CatalogFetched { query, tracks } => {
                info!(count = tracks.len(), ?query, "app_catalog_fetched");
                app.ui.catalog_loading = false;
                app.ui.last_query = query;
                app.catalog = tracks;
                if app.ui.tab == Tab::Catalog {
                    app.ui.selected = 0;
                }
            }
            Event::CollectionsRefreshed => {
                let len = app.rows().len();
                app.ui.move_selection(0, len);
            }
            Event::PlayOutcome { generation, result } => match result {
                Ok(()) => {
                    debug!(generation, "app_play_started");
                    app.ui.status_message = None;
                }
                Err(AudioError::Superseded) => {}
                Err(e) => {
                    app.ui.status_message = Some(format!("Couldn't play this track: {e}"));
                }
            },
            Event::CheckoutFinished(outcome) => {
                app.ui.status_message = Some(match outcome {
                    CheckoutOutcome::AwaitingPayment => {
                        "Order created, complete payment to finish".to_string()
                    }
                    CheckoutOutcome::Completed { cleared } => {
                        format!("Purchased {cleared} beat(s)")
                    }
                    CheckoutOutcome::Aborted(reason) => format!("Checkout failed: {reason}"),
                });
            }
            Event::FetchError(message) => {
                warn!(message, "app_fetch_error");
                app.ui.catalog_loading = false;
                app.ui.status_message = Some(message);
            }
        }
    }

    pub fn update(app: &mut App, msg: AppMessage) {
        match msg {
            AppMessage::Quit => app.should_quit = true,
            AppMessage::Player(cmd) => Self::dispatch_player(app, cmd),
            AppMessage::SeekForward => {
                let step = app.config.audio.seek_step_secs as i64;
                Self::dispatch_player(app, PlayerCommand::SeekBy(step));
            }
            AppMessage::SeekBackward => {
                let step = app.config.audio.seek_step_secs as i64;
                Self::dispatch_player(app, PlayerCommand::SeekBy(-step));
            }
            AppMessage::SelectTab(tab) => app.ui.select_tab(tab),
            AppMessage::NextTab => app.ui.select_tab(app.ui.tab.next()),
            AppMessage::PreviousTab => app.ui.select_tab(app.ui.tab.previous()),
            AppMessage::MoveSelection(delta) => {
                let len = app.rows().len();
                app.ui.move_selection(delta, len);
            }
            AppMessage::PlaySelected => Self::play_selected(app),
            AppMessage::CollapseTransport => {
                if app.snapshot().is_mobile_expanded {
                    app.player.set_mobile_expanded(false);
                } else {
                    app.ui.status_message = None;
                }
            }
            AppMessage::ToggleLike => Self::toggle_like(app),
            AppMessage::ToggleCart => Self::toggle_cart(app),
            AppMessage::CycleLicense => app.license = app.license.next(),
            AppMessage::Checkout => Self::checkout(app),
            AppMessage::Refresh => {
                let query = app.ui.last_query.clone();
                app.fetch_catalog(query);
                app.refresh_collections();
            }
            AppMessage::OpenSearch => app.ui.search_input = Some(String::new()),
            AppMessage::SearchInput(c) => {
                if let Some(input) = app.ui.search_input.as_mut() {
                    input.push(c);
                }
            }
            AppMessage::SearchBackspace => {
                if let Some(input) = app.ui.search_input.as_mut() {
                    input.pop();
                }
            }
            AppMessage::SubmitSearch => {
                let query = app
                    .ui
                    .search_input
                    .take()
                    .map(|q| q.trim().to_string())
                    .filter(|q| !q.is_empty());
                app.ui.select_tab(Tab::Catalog);
                app.fetch_catalog(query);
            }
            AppMessage::CancelSearch => app.ui.search_input = None,
        }
    }

    fn dispatch_player(app: &mut App, cmd: PlayerCommand) {
        if let Some(pending) = app.player.handle_command(cmd) {
            app.track_play(pending);
        }
    }

    fn selected_track_id(app: &App) -> Option<String> {
        app.rows().get(app.ui.selected).map(|row| row.track_id.clone())
    }

    fn play_selected(app: &mut App) {
        let Some(track_id) = Self::selected_track_id(app) else {
            return;
        };
        let tracks = app.tab_tracks();
        let Some(track) = tracks.iter().find(|t| t.id == track_id).cloned() else {
            app.ui.status_message = Some("This beat is not in the loaded catalog".into());
            return;
        };
        Self::dispatch_player(app, PlayerCommand::PlayTrack(track, Some(tracks)));
    }

    fn toggle_like(app: &mut App) {
        let Some(track_id) = Self::selected_track_id(app) else {
            return;
        };
        let likes = &app.collections.likes;
        if likes.contains(&track_id) {
            likes.remove(&track_id);
        } else {
            let like = app
                .catalog_track(&track_id)
                .map(|t| LikedBeat::from(&t))
                .unwrap_or_else(|| LikedBeat::new(track_id));
            likes.add(like);
        }
        let len = app.rows().len();
        app.ui.move_selection(0, len);
    }

    fn toggle_cart(app: &mut App) {
        let Some(track_id) = Self::selected_track_id(app) else {
            return;
        };
        let cart = &app.collections.cart;
        if cart.contains(&track_id) {
            cart.remove(&track_id);
        } else if let Some(track) = app.catalog_track(&track_id) {
            cart.add(CartItem::new(track, app.license));
        }
        let len = app.rows().len();
        app.ui.move_selection(0, len);
    }

    fn checkout(app: &mut App) {
        let items = app.collections.cart.items();
        if items.is_empty() {
            app.ui.status_message = Some("Cart is empty".into());
            return;
        }

        let api = app.api.clone();
        let collections = app.collections.clone();
        let tx = app.event_tx.clone();
        let started = app.task_manager.spawn_unless_running("checkout", async move {
            let event = match submit_order(&api, &items).await {
                Ok(signal) => Event::CheckoutFinished(
                    apply_checkout_signal(&collections.cart, &collections.purchases, signal).await,
                ),
                Err(e) => Event::FetchError(format!("Checkout failed: {e}")),
            };
            let _ = tx.send(event);
        });
        app.ui.status_message = Some(if started {
            "Placing order…".into()
        } else {
            "An order is already being placed".into()
        });
    }
}
