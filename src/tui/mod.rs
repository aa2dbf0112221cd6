//! Terminal user interface components and state management.
//!
//! This module contains the main TUI loop, `AppState`, event handling,
//! and all UI widgets using Ratatui.

// Input handlers use Result<bool> for consistency even when they never fail
#![allow(clippy::unnecessary_wraps)]
// Allow intentional type casts for terminal coordinates
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]

pub mod card_canvas;
pub mod component;
pub mod connect_form;
pub mod handlers;
pub mod status_bar;
pub mod theme;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout as RatatuiLayout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tracing::{debug, info};

use crate::canvas::LayoutEngine;
use crate::config::Config;
use crate::constants::APP_NAME;
use crate::models::{Card, CardSet, Label};
use crate::services::{PendingRequest, Storage};

// Re-export TUI components
pub use card_canvas::{canvas_area, surface_for, CanvasEvent, CardCanvas};
pub use component::Component;
pub use connect_form::{BusyState, ConnectEvent, ConnectForm, ConnectStep};
pub use status_bar::StatusBar;
pub use theme::Theme;

/// Widest the connect form is drawn, in columns.
const FORM_MAX_WIDTH: u16 = 80;

/// The two top-level screens.
#[derive(Debug)]
pub enum Screen {
    /// Credentials and label selection
    Connect(ConnectForm),
    /// Cards arranged on the canvas
    Canvas(CardCanvas),
}

/// Popup types that can be displayed over the main UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupType {
    /// Confirm clearing cards and going back to the connect screen
    ConfirmReset,
}

/// Gateway call the UI is waiting on.
#[derive(Debug)]
pub enum PendingFetch {
    /// Board labels for the connect form
    Labels(PendingRequest<Vec<Label>>),
    /// Cards for the selected label
    Cards(PendingRequest<Vec<Card>>),
}

/// Title, main and status areas of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenAreas {
    /// Title bar
    pub title: Rect,
    /// Connect form or canvas
    pub main: Rect,
    /// Status bar
    pub status: Rect,
}

/// Splits the terminal into title, main and status areas.
///
/// Rendering, hit testing and reflow all go through this so they agree on
/// where the canvas is.
#[must_use]
pub fn screen_areas(area: Rect) -> ScreenAreas {
    let chunks = RatatuiLayout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(4), // Status bar
        ])
        .split(area);

    ScreenAreas {
        title: chunks[0],
        main: chunks[1],
        status: chunks[2],
    }
}

/// Application state - single source of truth
///
/// All UI components read from this state immutably.
/// Only event handlers modify state explicitly.
#[derive(Debug)]
pub struct AppState {
    // Core services
    /// Application configuration
    pub config: Config,
    /// Persisted credentials, label choice and cards
    pub storage: Storage,

    // UI state
    /// Current UI theme
    pub theme: Theme,
    /// Screen being shown
    pub screen: Screen,
    /// Currently active popup (if any)
    pub active_popup: Option<PopupType>,
    /// Status bar message
    pub status_message: String,

    // Background work
    /// In-flight gateway call (if any)
    pub pending: Option<PendingFetch>,

    // Control flags
    /// Whether application should exit
    pub should_quit: bool,

    viewport: Rect,
    rng: SmallRng,
}

impl AppState {
    /// Creates the state for a terminal of size `viewport`.
    ///
    /// Opens straight onto the canvas when cards are already stored,
    /// otherwise onto the connect form prefilled with saved credentials.
    pub fn new(config: Config, storage: Storage, viewport: Rect) -> Self {
        Self::with_rng(config, storage, viewport, SmallRng::from_os_rng())
    }

    /// Like [`AppState::new`] with a caller-supplied jitter source.
    pub fn with_rng(config: Config, storage: Storage, viewport: Rect, rng: SmallRng) -> Self {
        let theme = Theme::from_mode(config.ui.theme_mode);
        let screen = Screen::Connect(ConnectForm::new(
            storage.credentials(),
            storage.selected_label(),
        ));

        let mut state = Self {
            config,
            storage,
            theme,
            screen,
            active_popup: None,
            status_message: String::new(),
            pending: None,
            should_quit: false,
            viewport,
            rng,
        };

        if let Some(cards) = state.storage.cards().filter(|set| !set.is_empty()) {
            info!("Restoring {} stored cards", cards.len());
            state.open_canvas(cards);
        }

        state
    }

    /// Terminal area the state is laid out for.
    #[must_use]
    pub const fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Layout areas for the current viewport.
    #[must_use]
    pub fn areas(&self) -> ScreenAreas {
        screen_areas(self.viewport)
    }

    /// Connect form, when it is the active screen.
    #[must_use]
    pub const fn connect_form(&self) -> Option<&ConnectForm> {
        match &self.screen {
            Screen::Connect(form) => Some(form),
            Screen::Canvas(_) => None,
        }
    }

    /// Canvas, when it is the active screen.
    #[must_use]
    pub const fn canvas(&self) -> Option<&CardCanvas> {
        match &self.screen {
            Screen::Canvas(canvas) => Some(canvas),
            Screen::Connect(_) => None,
        }
    }

    /// Sets the status message.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    /// Clears the status message.
    pub fn clear_status(&mut self) {
        self.status_message.clear();
    }

    /// Loads `cards` into a fresh layout engine and shows the canvas.
    pub fn open_canvas(&mut self, cards: CardSet) {
        if let Screen::Canvas(canvas) = &mut self.screen {
            canvas.teardown();
        }

        let areas = self.areas();
        let mut engine = LayoutEngine::new(self.config.canvas.metrics(), self.storage.clone());
        engine.load(cards, &surface_for(areas.main, self.viewport), &mut self.rng);
        self.screen = Screen::Canvas(CardCanvas::new(engine, areas.main));
    }

    /// Shows the connect form, prefilled from storage.
    pub fn open_connect(&mut self) {
        if let Screen::Canvas(canvas) = &mut self.screen {
            canvas.teardown();
        }

        self.pending = None;
        self.screen = Screen::Connect(ConnectForm::new(
            self.storage.credentials(),
            self.storage.selected_label(),
        ));
    }

    /// Records a new terminal size, re-clamping cards if the canvas is open.
    pub fn set_viewport(&mut self, viewport: Rect) {
        if viewport == self.viewport {
            return;
        }

        self.viewport = viewport;
        let main = self.areas().main;
        if let Screen::Canvas(canvas) = &mut self.screen {
            let moved = canvas.resize(main, viewport);
            if moved > 0 {
                debug!("Resize moved {moved} cards back into view");
            }
        }
    }

    /// Checks the in-flight gateway call and applies its result.
    pub fn poll_requests(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        match pending {
            PendingFetch::Labels(request) => match request.poll() {
                None => self.pending = Some(PendingFetch::Labels(request)),
                Some(result) => handlers::apply_labels_result(self, result),
            },
            PendingFetch::Cards(request) => match request.poll() {
                None => self.pending = Some(PendingFetch::Cards(request)),
                Some(result) => handlers::apply_cards_result(self, result),
            },
        }
    }
}

/// Initialize terminal for TUI
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restore terminal to normal state
pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main event loop
pub fn run_tui(
    state: &mut AppState,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        let size = terminal.size().context("Failed to read terminal size")?;
        state.set_viewport(Rect::new(0, 0, size.width, size.height));

        // Render current state
        terminal.draw(|f| render(f, state))?;

        // Poll for events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(state, key)? {
                        break; // User quit
                    }
                }
                Event::Mouse(mouse) => handlers::handle_mouse_input(state, mouse)?,
                Event::Resize(width, height) => {
                    state.set_viewport(Rect::new(0, 0, width, height));
                }
                _ => {}
            }
        }

        // Pick up finished gateway calls
        state.poll_requests();

        // Check if should quit
        if state.should_quit {
            break;
        }
    }

    if let Screen::Canvas(canvas) = &mut state.screen {
        canvas.teardown();
    }

    Ok(())
}

/// Render the UI from current state
pub fn render(f: &mut Frame, state: &AppState) {
    // Fill entire screen with theme background color first
    let full_bg = Block::default().style(Style::default().bg(state.theme.background));
    f.render_widget(full_bg, f.area());

    let areas = screen_areas(f.area());

    render_title_bar(f, areas.title, state);

    match &state.screen {
        Screen::Connect(form) => form.render(f, form_area(areas.main), &state.theme),
        Screen::Canvas(canvas) => canvas.render(f, areas.main, &state.theme),
    }

    StatusBar::render(f, areas.status, state, &state.theme);

    if let Some(PopupType::ConfirmReset) = state.active_popup {
        render_confirm_reset(f, &state.theme);
    }
}

/// Render title bar with screen name, card count and key hints
fn render_title_bar(f: &mut Frame, area: Rect, state: &AppState) {
    let unsaved = if state.storage.is_persistent() {
        ""
    } else {
        " (not saved)"
    };

    let mut spans = vec![Span::styled(
        format!(" {APP_NAME}{unsaved}"),
        Style::default()
            .fg(state.theme.primary)
            .add_modifier(Modifier::BOLD),
    )];
    match &state.screen {
        Screen::Connect(form) => {
            spans.push(Span::styled(
                format!(" - {}", form.step().title()),
                Style::default().fg(state.theme.text),
            ));
        }
        Screen::Canvas(canvas) => {
            spans.push(Span::styled(
                format!(" - {} cards", canvas.engine().len()),
                Style::default().fg(state.theme.text),
            ));
            spans.push(Span::styled(
                "  |  r: Reset  q: Quit",
                Style::default().fg(state.theme.text_muted),
            ));
        }
    }

    let title_widget = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(state.theme.background))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().bg(state.theme.background)),
        );

    f.render_widget(title_widget, area);
}

/// Area for the connect form: full height, centered, width capped.
fn form_area(main: Rect) -> Rect {
    let width = main.width.min(FORM_MAX_WIDTH);
    Rect::new(main.x + (main.width - width) / 2, main.y, width, main.height)
}

/// Render the reset confirmation prompt
fn render_confirm_reset(f: &mut Frame, theme: &Theme) {
    let area = centered_rect(60, 30, f.area());

    // Clear the background area first
    f.render_widget(Clear, area);

    // Render opaque background
    let background = Block::default().style(Style::default().bg(theme.background));
    f.render_widget(background, area);

    let text = vec![
        Line::from(""),
        Line::from("Reset and enter new credentials?"),
        Line::from("Cards on the canvas will be cleared."),
        Line::from(""),
        Line::from("  [Y] Reset"),
        Line::from("  [N] Cancel"),
    ];

    let prompt = Paragraph::new(text).block(
        Block::default()
            .title(" Reset ")
            .borders(Borders::ALL)
            .style(Style::default().fg(theme.warning)),
    );

    f.render_widget(prompt, area);
}

/// Helper to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = RatatuiLayout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    RatatuiLayout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Handle keyboard input events
pub fn handle_key_event(state: &mut AppState, key: event::KeyEvent) -> Result<bool> {
    use crossterm::event::{KeyCode, KeyModifiers};

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        state.should_quit = true;
        return Ok(true);
    }

    // Route to popup handler if popup is active
    if state.active_popup.is_some() {
        return handlers::handle_popup_input(state, key);
    }

    match state.screen {
        Screen::Connect(_) => handlers::handle_connect_input(state, key),
        Screen::Canvas(_) => handlers::handle_canvas_input(state, key),
    }
}
