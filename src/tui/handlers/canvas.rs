//! Canvas input handlers.

use anyhow::Result;
use crossterm::event::{self, MouseEvent};

use crate::tui::{AppState, CanvasEvent, Component, PopupType, Screen};

/// Handle keyboard input on the canvas
pub fn handle_canvas_input(state: &mut AppState, key: event::KeyEvent) -> Result<bool> {
    state.clear_status();

    let Screen::Canvas(canvas) = &mut state.screen else {
        return Ok(false);
    };

    match canvas.handle_input(key) {
        Some(CanvasEvent::RequestReset) => {
            state.active_popup = Some(PopupType::ConfirmReset);
        }
        Some(CanvasEvent::ResetBlocked) => {
            state.set_status("Drop or cancel the card before resetting");
        }
        Some(CanvasEvent::Quit) => {
            state.should_quit = true;
            return Ok(true);
        }
        None => {}
    }

    Ok(false)
}

/// Handle mouse input; only the canvas reacts to the pointer
pub fn handle_mouse_input(state: &mut AppState, mouse: MouseEvent) -> Result<()> {
    if state.active_popup.is_some() {
        return Ok(());
    }

    if let Screen::Canvas(canvas) = &mut state.screen {
        canvas.handle_mouse(mouse);
    }

    Ok(())
}
