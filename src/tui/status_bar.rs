//! Status bar widget for displaying status messages and help

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{AppState, Screen, Theme};
use crate::canvas::CursorHint;
use crate::tui::connect_form::ConnectStep;

/// Status bar widget
pub struct StatusBar;

impl StatusBar {
    /// Render the status bar with contextual help
    pub fn render(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
        let first_line = if state.status_message.is_empty() {
            Self::hints_line(state, theme)
        } else {
            Line::from(Span::styled(
                state.status_message.as_str(),
                Style::default().fg(theme.accent),
            ))
        };

        let mut second_line = vec![Span::styled(
            "Storage: ",
            Style::default().fg(theme.primary),
        )];
        if state.storage.is_persistent() {
            second_line.push(Span::styled("saved", Style::default().fg(theme.text_muted)));
        } else {
            second_line.push(Span::styled(
                "memory only (changes are lost on exit)",
                Style::default().fg(theme.warning),
            ));
        }

        if let Screen::Canvas(canvas) = &state.screen {
            let hint = canvas.cursor_hint();
            if hint != CursorHint::Default {
                second_line.push(Span::styled(
                    "  |  Cursor: ",
                    Style::default().fg(theme.primary),
                ));
                second_line.push(Span::styled(
                    hint.as_str(),
                    Style::default()
                        .fg(theme.accent)
                        .add_modifier(Modifier::BOLD),
                ));
            }
        }

        let status = Paragraph::new(vec![first_line, Line::from(second_line)]).block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().bg(theme.background)),
        );
        f.render_widget(status, area);
    }

    fn hints_line<'a>(state: &AppState, theme: &Theme) -> Line<'a> {
        let hints = match &state.screen {
            Screen::Connect(form) => match form.step() {
                ConnectStep::Credentials => "Enter your Trello credentials to get started",
                ConnectStep::Labels => "Pick the label whose cards you want on the canvas",
            },
            Screen::Canvas(canvas) if canvas.drag().is_drag_active() => {
                "Release over the canvas to drop  |  Arrows move (Shift: faster)  |  Enter: Drop  |  Esc: Cancel"
            }
            Screen::Canvas(_) => {
                "Drag cards with the mouse  |  Tab: Focus card  |  Space: Pick up"
            }
        };

        Line::from(Span::styled(hints, Style::default().fg(theme.text_muted)))
    }
}
