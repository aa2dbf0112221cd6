//! Connect form input handlers and gateway result handling.

use anyhow::Result;
use crossterm::event;
use tracing::{debug, info, warn};

use crate::models::{Card, CardSet, Credentials, Label};
use crate::services::{PendingRequest, TrelloClient, TrelloError};
use crate::tui::{AppState, BusyState, Component, ConnectEvent, PendingFetch, Screen};

/// Handle input on the connect form
pub fn handle_connect_input(state: &mut AppState, key: event::KeyEvent) -> Result<bool> {
    let Screen::Connect(form) = &mut state.screen else {
        return Ok(false);
    };
    let Some(event) = form.handle_input(key) else {
        return Ok(false);
    };

    match event {
        ConnectEvent::Submit(credentials) => submit_credentials(state, &credentials),
        ConnectEvent::FetchCards { label_id } => fetch_cards(state, label_id),
        ConnectEvent::Back => {
            // Dropping the handle also stops a card fetch from persisting
            if state.pending.take().is_some() {
                debug!("Abandoned an in-flight request");
            }
        }
        ConnectEvent::Quit => {
            state.should_quit = true;
            return Ok(true);
        }
    }

    Ok(false)
}

fn submit_credentials(state: &mut AppState, credentials: &Credentials) {
    state.clear_status();
    state.storage.set_credentials(credentials);

    let client = match TrelloClient::new(credentials, &state.config.trello) {
        Ok(client) => client,
        Err(e) => {
            show_form_error(state, &e);
            return;
        }
    };

    info!("Connecting to board {}", client.credentials().board_id);
    state.pending = Some(PendingFetch::Labels(PendingRequest::spawn(move || {
        client.fetch_board_labels()
    })));
    set_form_busy(state, BusyState::Connecting);
}

fn fetch_cards(state: &mut AppState, label_id: String) {
    state.storage.set_selected_label(&label_id);

    let Some(credentials) = state.connect_form().map(|f| f.credentials().trimmed()) else {
        return;
    };
    let client = match TrelloClient::new(&credentials, &state.config.trello) {
        Ok(client) => client,
        Err(e) => {
            show_form_error(state, &e);
            return;
        }
    };

    let storage = state.storage.clone();
    state.pending = Some(PendingFetch::Cards(PendingRequest::spawn_cancellable(
        move |cancellation| client.fetch_cards_for_request(&label_id, &storage, cancellation),
    )));
    set_form_busy(state, BusyState::FetchingCards);
}

/// Applies a finished label fetch to the connect form.
pub fn apply_labels_result(state: &mut AppState, result: Result<Vec<Label>, TrelloError>) {
    let Screen::Connect(form) = &mut state.screen else {
        debug!("Discarding labels; connect form is closed");
        return;
    };

    match result {
        Ok(labels) => form.show_labels(labels),
        Err(e) => {
            warn!("Label fetch failed: {e}");
            form.show_error(e.to_string());
        }
    }
}

/// Applies a finished card fetch: arrange the cards and show the canvas.
pub fn apply_cards_result(state: &mut AppState, result: Result<Vec<Card>, TrelloError>) {
    if !matches!(state.screen, Screen::Connect(_)) {
        debug!("Discarding cards; connect form is closed");
        return;
    }

    match result {
        Ok(cards) => {
            let count = cards.len();
            state.open_canvas(CardSet::Fetched { cards });
            state.set_status(format!("Fetched {count} cards"));
        }
        Err(e) => {
            warn!("Card fetch failed: {e}");
            show_form_error(state, &e);
        }
    }
}

fn set_form_busy(state: &mut AppState, busy: BusyState) {
    if let Screen::Connect(form) = &mut state.screen {
        form.set_busy(busy);
    }
}

fn show_form_error(state: &mut AppState, error: &TrelloError) {
    if let Screen::Connect(form) = &mut state.screen {
        form.show_error(error.to_string());
    }
}
