//! Trello connection form.
//!
//! Two steps: enter credentials, then pick a label to fetch cards for.
//! The form only collects input; the parent runs the requests and reports
//! back through [`ConnectForm::show_labels`] and [`ConnectForm::show_error`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::models::{CredentialField, Credentials, Label, ValidationError};
use crate::tui::theme::label_color;
use crate::tui::{Component, Theme};

/// Form steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStep {
    /// Entering API key, token and board id
    Credentials,
    /// Choosing a board label
    Labels,
}

impl ConnectStep {
    /// Gets the step title
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Credentials => "Connect to Trello",
            Self::Labels => "Select a Label",
        }
    }
}

/// Request the form is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyState {
    /// Fetching board labels
    Connecting,
    /// Fetching cards for the chosen label
    FetchingCards,
}

impl BusyState {
    /// Button text while busy.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting...",
            Self::FetchingCards => "Fetching Cards...",
        }
    }
}

/// Events emitted by the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectEvent {
    /// Credentials passed validation; connect and fetch labels
    Submit(Credentials),
    /// Fetch cards carrying this label
    FetchCards {
        /// Label id
        label_id: String,
    },
    /// User went back to the credentials step
    Back,
    /// User asked to leave the application
    Quit,
}

/// Connection form state
#[derive(Debug, Clone)]
pub struct ConnectForm {
    step: ConnectStep,
    credentials: Credentials,
    focused: CredentialField,
    labels: Vec<Label>,
    selected: usize,
    preferred_label: Option<String>,
    busy: Option<BusyState>,
    error: Option<String>,
}

impl ConnectForm {
    /// Creates a form pre-filled with stored values.
    #[must_use]
    pub fn new(credentials: Option<Credentials>, preferred_label: Option<String>) -> Self {
        Self {
            step: ConnectStep::Credentials,
            credentials: credentials.unwrap_or_default(),
            focused: CredentialField::ApiKey,
            labels: Vec::new(),
            selected: 0,
            preferred_label,
            busy: None,
            error: None,
        }
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> ConnectStep {
        self.step
    }

    /// Credentials as typed so far.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Field receiving keystrokes.
    #[must_use]
    pub const fn focused(&self) -> CredentialField {
        self.focused
    }

    /// Labels offered on the label step.
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Highlighted label.
    #[must_use]
    pub fn selected_label(&self) -> Option<&Label> {
        self.labels.get(self.selected)
    }

    /// Pending request, if any.
    #[must_use]
    pub const fn busy(&self) -> Option<BusyState> {
        self.busy
    }

    /// Whether a request is outstanding.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy.is_some()
    }

    /// Inline error banner text.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Marks a request as started and clears any previous error.
    pub fn set_busy(&mut self, state: BusyState) {
        self.busy = Some(state);
        self.error = None;
    }

    /// Moves to the label step with the fetched labels.
    ///
    /// The remembered label is pre-selected when present.
    pub fn show_labels(&mut self, labels: Vec<Label>) {
        self.selected = self
            .preferred_label
            .as_deref()
            .and_then(|id| labels.iter().position(|l| l.id == id))
            .unwrap_or(0);
        self.labels = labels;
        self.step = ConnectStep::Labels;
        self.busy = None;
        self.error = None;
    }

    /// Ends the pending request with an error; the step is unchanged.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.busy = None;
        self.error = Some(message.into());
    }

    fn handle_credentials_input(&mut self, key: KeyEvent) -> Option<ConnectEvent> {
        if self.is_busy() {
            return None;
        }

        match key.code {
            KeyCode::Esc => return Some(ConnectEvent::Quit),
            KeyCode::Tab | KeyCode::Down => self.focused = self.focused.next(),
            KeyCode::BackTab | KeyCode::Up => self.focused = self.focused.previous(),
            KeyCode::Backspace => {
                self.credentials.field_mut(self.focused).pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.credentials.field_mut(self.focused).push(c);
            }
            KeyCode::Enter => {
                let credentials = self.credentials.trimmed();
                match credentials.validate() {
                    Ok(()) => {
                        self.error = None;
                        return Some(ConnectEvent::Submit(credentials));
                    }
                    Err(e) => {
                        let ValidationError::MissingField(field) = e;
                        self.focused = field;
                        self.error = Some(e.to_string());
                    }
                }
            }
            _ => {}
        }
        None
    }

    fn handle_labels_input(&mut self, key: KeyEvent) -> Option<ConnectEvent> {
        match key.code {
            KeyCode::Esc => {
                self.step = ConnectStep::Credentials;
                self.busy = None;
                self.error = None;
                return Some(ConnectEvent::Back);
            }
            _ if self.is_busy() => {}
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.labels.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => {
                let label_id = self.selected_label()?.id.clone();
                self.preferred_label = Some(label_id.clone());
                return Some(ConnectEvent::FetchCards { label_id });
            }
            _ => {}
        }
        None
    }

    fn render_credentials(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        for (index, field) in CredentialField::ALL.into_iter().enumerate() {
            let focused = field == self.focused && !self.is_busy();
            let border_style = if focused {
                Style::default().fg(theme.accent)
            } else {
                Style::default().fg(theme.text_muted)
            };
            let cursor = if focused { "_" } else { "" };

            let text = vec![
                Line::from(Span::styled(
                    format!("{}{cursor}", self.credentials.field(field)),
                    Style::default().fg(theme.text),
                )),
                Line::from(Span::styled(
                    field_help(field),
                    Style::default().fg(theme.text_muted),
                )),
            ];

            let input = Paragraph::new(text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(format!(" {} ", field.label())),
            );
            f.render_widget(input, chunks[index]);
        }

        let button_text = self.busy.map_or("Connect to Trello", BusyState::label);
        let button = Paragraph::new(button_text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(if self.is_busy() {
                theme.text_muted
            } else {
                theme.success
            }))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(button, chunks[3]);
    }

    fn render_labels(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let help = Paragraph::new("Choose a label to fetch cards with that label")
            .style(Style::default().fg(theme.text_secondary));
        f.render_widget(help, chunks[0]);

        if self.labels.is_empty() {
            let empty = Paragraph::new("No labels found for this board.")
                .style(Style::default().fg(theme.warning))
                .block(Block::default().borders(Borders::ALL).title(" Board Labels "));
            f.render_widget(empty, chunks[1]);
        } else {
            let items: Vec<ListItem> = self
                .labels
                .iter()
                .map(|label| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            "■ ",
                            Style::default().fg(label_color(label.color.as_deref())),
                        ),
                        Span::styled(label.display_name(), Style::default().fg(theme.text)),
                    ]))
                })
                .collect();

            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title(format!(
                    " Board Labels ({}) ",
                    self.labels.len()
                )))
                .highlight_style(
                    Style::default()
                        .fg(theme.accent)
                        .bg(theme.highlight_bg)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");

            let mut list_state = ListState::default();
            list_state.select(Some(self.selected));
            f.render_stateful_widget(list, chunks[1], &mut list_state);
        }

        let button_text = self
            .busy
            .map_or("Fetch Cards with Label", BusyState::label);
        let button = Paragraph::new(button_text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(
                if self.is_busy() || self.labels.is_empty() {
                    theme.text_muted
                } else {
                    theme.success
                },
            ))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(button, chunks[2]);
    }

    const fn instructions(&self) -> &'static str {
        match (self.step, self.busy) {
            (ConnectStep::Credentials, Some(_)) => "Waiting for Trello...  |  Ctrl+C: Quit",
            (ConnectStep::Credentials, None) => {
                "Tab/↑↓: Switch field  |  Enter: Connect  |  Esc: Quit"
            }
            (ConnectStep::Labels, Some(_)) => "Waiting for Trello...  |  Esc: Back to Credentials",
            (ConnectStep::Labels, None) => {
                "↑↓: Navigate  |  Enter: Fetch cards  |  Esc: Back to Credentials"
            }
        }
    }
}

const fn field_help(field: CredentialField) -> &'static str {
    match field {
        CredentialField::ApiKey => "Get your API Key from https://trello.com/app-key",
        CredentialField::ApiToken => "Generate a Token using the link on the API Key page",
        CredentialField::BoardId => "Found in the URL of your board: trello.com/b/xxxx/board-name",
    }
}

impl Component for ConnectForm {
    type Event = ConnectEvent;

    fn handle_input(&mut self, key: KeyEvent) -> Option<Self::Event> {
        match self.step {
            ConnectStep::Credentials => self.handle_credentials_input(key),
            ConnectStep::Labels => self.handle_labels_input(key),
        }
    }

    fn render(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let outer = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.primary))
            .title(format!(" {} ", self.step.title()));
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(if self.error.is_some() { 3 } else { 0 }),
                Constraint::Min(8),
                Constraint::Length(1),
            ])
            .split(inner);

        if let Some(error) = &self.error {
            let banner = Paragraph::new(error.as_str())
                .style(Style::default().fg(theme.error))
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(theme.error)),
                );
            f.render_widget(banner, chunks[0]);
        }

        match self.step {
            ConnectStep::Credentials => self.render_credentials(f, chunks[1], theme),
            ConnectStep::Labels => self.render_labels(f, chunks[1], theme),
        }

        let instructions = Paragraph::new(self.instructions())
            .style(Style::default().fg(theme.text_muted))
            .alignment(Alignment::Center);
        f.render_widget(instructions, chunks[2]);
    }
}
