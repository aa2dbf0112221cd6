//! Popup input handlers.

use anyhow::Result;
use crossterm::event::{self, KeyCode};
use tracing::info;

use crate::tui::{AppState, PopupType};

/// Handle input for the reset confirmation prompt
pub fn handle_confirm_reset_input(state: &mut AppState, key: event::KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('y' | 'Y') | KeyCode::Enter => {
            state.active_popup = None;
            state.storage.clear_cards();
            state.open_connect();
            info!("Cleared stored cards for a new connection");
            state.set_status("Cards cleared. Enter new credentials.");
            Ok(false)
        }
        KeyCode::Char('n' | 'N') | KeyCode::Esc => {
            state.active_popup = None;
            state.set_status("Cancelled");
            Ok(false)
        }
        _ => Ok(false),
    }
}

/// Handle input when popup is active (dispatcher)
pub fn handle_popup_input(state: &mut AppState, key: event::KeyEvent) -> Result<bool> {
    match state.active_popup {
        Some(PopupType::ConfirmReset) => handle_confirm_reset_input(state, key),
        None => Ok(false),
    }
}
