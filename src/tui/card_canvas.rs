//! Card canvas widget: renders positioned cards and routes pointer and
//! keyboard gestures into the drag coordinator and layout engine.

use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use tracing::debug;

use crate::canvas::{
    grip_point, CardInteraction, CursorHint, DragCoordinator, DragOutcome, LayoutEngine, Surface,
};
use crate::models::{Point, PositionedCard, Region, Size};
use crate::tui::theme::label_color;
use crate::tui::{Component, Theme};

/// Rows moved per arrow key press while Shift is held.
const FAST_STEP: f64 = 5.0;

/// Events emitted by the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasEvent {
    /// User asked to clear cards and reconnect
    RequestReset,
    /// Reset was requested during a drag and ignored
    ResetBlocked,
    /// User asked to quit
    Quit,
}

/// Inner drawing area of the canvas inside its border.
#[must_use]
pub fn canvas_area(main: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(main)
}

/// Surface the layout engine should clamp against for a given screen layout.
#[must_use]
pub fn surface_for(main: Rect, viewport: Rect) -> Surface {
    let inner = canvas_area(main);
    Surface::measured(
        Size::new(f64::from(inner.width), f64::from(inner.height)),
        Size::new(f64::from(viewport.width), f64::from(viewport.height)),
    )
}

fn region_of(rect: Rect) -> Region {
    Region::new(
        Point::new(f64::from(rect.x), f64::from(rect.y)),
        Size::new(f64::from(rect.width), f64::from(rect.height)),
    )
}

fn to_cell(value: f64) -> u16 {
    value.max(0.0).floor() as u16
}

/// The card canvas
#[derive(Debug)]
pub struct CardCanvas {
    engine: LayoutEngine,
    drag: DragCoordinator,
    canvas: Region,
    focus: Option<usize>,
    hovered: Option<String>,
    /// Active gesture was started with the mouse, not the keyboard.
    mouse_gesture: bool,
}

impl CardCanvas {
    /// Wraps a loaded engine, laid out in `main`.
    #[must_use]
    pub fn new(engine: LayoutEngine, main: Rect) -> Self {
        Self {
            engine,
            drag: DragCoordinator::new(),
            canvas: region_of(canvas_area(main)),
            focus: None,
            hovered: None,
            mouse_gesture: false,
        }
    }

    /// Layout engine backing the canvas.
    #[must_use]
    pub const fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    /// Drag coordinator (the drag-active signal).
    #[must_use]
    pub const fn drag(&self) -> &DragCoordinator {
        &self.drag
    }

    /// Index of the keyboard-focused card.
    #[must_use]
    pub const fn focus(&self) -> Option<usize> {
        self.focus
    }

    /// Canvas region in terminal coordinates.
    #[must_use]
    pub const fn region(&self) -> Region {
        self.canvas
    }

    /// Re-measures after a terminal resize and re-clamps cards.
    ///
    /// Returns how many cards moved.
    pub fn resize(&mut self, main: Rect, viewport: Rect) -> usize {
        self.canvas = region_of(canvas_area(main));
        self.engine.reflow(&surface_for(main, viewport))
    }

    /// Cursor hint for the status bar.
    #[must_use]
    pub const fn cursor_hint(&self) -> CursorHint {
        self.drag.cursor_hint(self.hovered.is_some())
    }

    /// Abandons any gesture because the canvas is going away.
    pub fn teardown(&mut self) {
        if self.drag.detach_all() {
            debug!("Canvas closed during a drag");
        }
    }

    /// Handles a mouse event in terminal coordinates.
    pub fn handle_mouse(&mut self, event: MouseEvent) {
        let pointer = Point::new(f64::from(event.column), f64::from(event.row));

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(index) = self.card_at(pointer) else {
                    return;
                };
                let card = &self.engine.cards()[index];
                if self.drag.lift(card.id(), card.position()).is_ok() {
                    self.focus = Some(index);
                    self.mouse_gesture = true;
                    self.drag.hover(pointer, self.canvas);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.mouse_gesture => {
                self.drag.hover(pointer, self.canvas);
            }
            MouseEventKind::Up(MouseButton::Left) if self.mouse_gesture => {
                self.mouse_gesture = false;
                let outcome = self
                    .drag
                    .release(pointer, self.canvas, self.engine.metrics());
                if let Some(outcome) = outcome {
                    self.apply(outcome);
                }
                self.update_hover(pointer);
            }
            MouseEventKind::Up(MouseButton::Left) | MouseEventKind::Moved => {
                self.update_hover(pointer);
            }
            _ => {}
        }
    }

    fn update_hover(&mut self, pointer: Point) {
        self.hovered = self
            .card_at(pointer)
            .map(|index| self.engine.cards()[index].id().to_string());
    }

    fn apply(&mut self, outcome: DragOutcome) {
        if let DragOutcome::Dropped {
            card_id,
            origin,
            position,
        } = outcome
        {
            if position != origin {
                self.engine.move_card(&card_id, position);
            }
        }
    }

    /// Topmost card under `pointer`.
    fn card_at(&self, pointer: Point) -> Option<usize> {
        if !self.canvas.contains(pointer) {
            return None;
        }

        self.engine
            .cards()
            .iter()
            .rposition(|card| self.card_region(card).contains(pointer))
    }

    fn card_region(&self, card: &PositionedCard) -> Region {
        Region::new(
            Point::new(
                self.canvas.origin.x + card.x.max(0.0).floor(),
                self.canvas.origin.y + card.y.max(0.0).floor(),
            ),
            self.engine.metrics().card,
        )
    }

    fn move_focus(&mut self, forward: bool) {
        let count = self.engine.len();
        if count == 0 {
            self.focus = None;
            return;
        }

        self.focus = Some(match (self.focus, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        });
    }

    fn lift_focused(&mut self) {
        let Some(card) = self.focus.and_then(|i| self.engine.cards().get(i)) else {
            return;
        };

        let origin = card.position();
        if self.drag.lift(card.id(), origin).is_ok() {
            self.mouse_gesture = false;
            let grip = grip_point(origin, self.canvas, self.engine.metrics());
            self.drag.hover(grip, self.canvas);
        }
    }

    fn card_rect(at: Point, size: Size, inner: Rect) -> Rect {
        Rect::new(
            inner.x.saturating_add(to_cell(at.x)),
            inner.y.saturating_add(to_cell(at.y)),
            to_cell(size.width),
            to_cell(size.height),
        )
        .intersection(inner)
    }

    fn render_card(
        &self,
        f: &mut Frame,
        card: &PositionedCard,
        rect: Rect,
        focused: bool,
        theme: &Theme,
    ) {
        let lifted = self.drag.state_of(card.id()) != CardInteraction::Idle;

        let mut style = Style::default().fg(theme.text).bg(theme.surface);
        if lifted {
            style = style.add_modifier(Modifier::DIM);
        }
        let border_style = if focused {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.text_muted)
        };

        let chips: Vec<Span> = card
            .card
            .labels
            .iter()
            .flat_map(|label| {
                let name = if label.name.trim().is_empty() {
                    "●".to_string()
                } else {
                    format!("● {}", label.name)
                };
                [
                    Span::styled(name, Style::default().fg(label_color(label.color.as_deref()))),
                    Span::raw(" "),
                ]
            })
            .collect();

        let due_marker = if card.card.due_complete { " ✓" } else { "" };
        let mut lines = vec![
            Line::from(chips),
            Line::from(Span::styled(
                format!("Due: {}{due_marker}", card.card.due_display()),
                Style::default().fg(theme.text_secondary),
            )),
        ];
        if let Some(first) = card.card.desc.lines().find(|l| !l.trim().is_empty()) {
            lines.push(Line::from(Span::styled(
                first.to_string(),
                Style::default().fg(theme.text_muted),
            )));
        }

        let body = Paragraph::new(lines).style(style).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(
                    format!(" {} ", card.card.display_name()),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        );

        f.render_widget(Clear, rect);
        f.render_widget(body, rect);
    }
}

impl Component for CardCanvas {
    type Event = CanvasEvent;

    fn handle_input(&mut self, key: KeyEvent) -> Option<Self::Event> {
        let dragging = self.drag.is_drag_active();
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            FAST_STEP
        } else {
            1.0
        };

        match key.code {
            KeyCode::Char('q') => return Some(CanvasEvent::Quit),
            KeyCode::Char('r') if dragging => return Some(CanvasEvent::ResetBlocked),
            KeyCode::Char('r') => return Some(CanvasEvent::RequestReset),
            KeyCode::Tab if !dragging => self.move_focus(true),
            KeyCode::BackTab if !dragging => self.move_focus(false),
            KeyCode::Char(' ') if !dragging => self.lift_focused(),
            KeyCode::Left if dragging => {
                self.drag.nudge(-step, 0.0, self.canvas);
            }
            KeyCode::Right if dragging => {
                self.drag.nudge(step, 0.0, self.canvas);
            }
            KeyCode::Up if dragging => {
                self.drag.nudge(0.0, -step, self.canvas);
            }
            KeyCode::Down if dragging => {
                self.drag.nudge(0.0, step, self.canvas);
            }
            KeyCode::Enter if dragging => {
                let outcome = self
                    .drag
                    .release_at_pointer(self.canvas, self.engine.metrics());
                if let Some(outcome) = outcome {
                    self.apply(outcome);
                }
            }
            KeyCode::Esc => {
                self.drag.cancel();
            }
            _ => {}
        }
        None
    }

    fn render(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let dragging = self.drag.is_drag_active();
        let block = if dragging {
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(theme.accent))
                .title(" Drop card here ")
        } else {
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.primary))
                .title(format!(" Canvas: {} cards ", self.engine.len()))
        };
        let inner = block.inner(area);
        f.render_widget(block, area);

        let size = self.engine.metrics().card;
        for (index, card) in self.engine.cards().iter().enumerate() {
            let rect = Self::card_rect(card.position(), size, inner);
            if rect.is_empty() {
                continue;
            }
            self.render_card(f, card, rect, self.focus == Some(index), theme);
        }

        let preview = self.drag.preview_position(
            region_of(inner),
            self.engine.metrics(),
            self.engine.bounds(),
        );
        if let Some(at) = preview {
            let ghost = Self::card_rect(at, size, inner);
            if !ghost.is_empty() {
                let outline = Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(theme.accent));
                f.render_widget(outline, ghost);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasMetrics;
    use crate::models::{Card, CardSet};
    use crate::services::Storage;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use ratatui::{backend::TestBackend, Terminal};

    const MAIN: Rect = Rect {
        x: 0,
        y: 3,
        width: 100,
        height: 30,
    };
    const VIEWPORT: Rect = Rect {
        x: 0,
        y: 0,
        width: 100,
        height: 36,
    };

    fn canvas_with(cards: Vec<PositionedCard>) -> (CardCanvas, Storage) {
        let storage = Storage::in_memory();
        let mut engine = LayoutEngine::new(CanvasMetrics::terminal(), storage.clone());
        engine.load(
            CardSet::Arranged { cards },
            &surface_for(MAIN, VIEWPORT),
            &mut SmallRng::seed_from_u64(3),
        );
        (CardCanvas::new(engine, MAIN), storage)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_canvas_area_excludes_border() {
        assert_eq!(canvas_area(MAIN), Rect::new(1, 4, 98, 28));
    }

    #[test]
    fn test_keyboard_drag_moves_and_persists() {
        let (mut canvas, storage) =
            canvas_with(vec![Card::new("a", "A").positioned(Point::new(2.0, 2.0))]);

        canvas.handle_input(key(KeyCode::Tab));
        canvas.handle_input(key(KeyCode::Char(' ')));
        assert!(canvas.drag().is_drag_active());

        canvas.handle_input(key(KeyCode::Right));
        canvas.handle_input(KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT));
        canvas.handle_input(key(KeyCode::Enter));

        assert!(!canvas.drag().is_drag_active());
        assert_eq!(canvas.engine().cards()[0].position(), Point::new(3.0, 7.0));
        match storage.cards() {
            Some(CardSet::Arranged { cards }) => {
                assert_eq!(cards[0].position(), Point::new(3.0, 7.0));
            }
            other => panic!("unexpected stored set: {other:?}"),
        }
    }

    #[test]
    fn test_drop_in_place_does_not_write() {
        let (mut canvas, storage) =
            canvas_with(vec![Card::new("a", "A").positioned(Point::new(2.0, 2.0))]);

        canvas.handle_input(key(KeyCode::Tab));
        canvas.handle_input(key(KeyCode::Char(' ')));
        canvas.handle_input(key(KeyCode::Enter));

        assert!(!canvas.drag().is_drag_active());
        assert!(!storage.has_cards());
    }

    #[test]
    fn test_escape_cancels_keyboard_drag() {
        let (mut canvas, storage) =
            canvas_with(vec![Card::new("a", "A").positioned(Point::new(2.0, 2.0))]);

        canvas.handle_input(key(KeyCode::Tab));
        canvas.handle_input(key(KeyCode::Char(' ')));
        canvas.handle_input(key(KeyCode::Right));
        canvas.handle_input(key(KeyCode::Esc));

        assert!(!canvas.drag().is_drag_active());
        assert_eq!(canvas.engine().cards()[0].position(), Point::new(2.0, 2.0));
        assert!(!storage.has_cards());
    }

    #[test]
    fn test_reset_blocked_while_dragging() {
        let (mut canvas, _) =
            canvas_with(vec![Card::new("a", "A").positioned(Point::new(2.0, 2.0))]);
        assert_eq!(
            canvas.handle_input(key(KeyCode::Char('r'))),
            Some(CanvasEvent::RequestReset)
        );

        canvas.handle_input(key(KeyCode::Tab));
        canvas.handle_input(key(KeyCode::Char(' ')));
        assert_eq!(
            canvas.handle_input(key(KeyCode::Char('r'))),
            Some(CanvasEvent::ResetBlocked)
        );
    }

    #[test]
    fn test_mouse_drag_drops_at_grip() {
        let (mut canvas, _) =
            canvas_with(vec![Card::new("a", "A").positioned(Point::new(0.0, 0.0))]);

        // Canvas origin is (1, 4); press inside the card
        canvas.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 5));
        assert_eq!(canvas.cursor_hint(), CursorHint::Grabbing);
        canvas.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 40, 15));
        canvas.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 40, 15));

        // (40 - 1 - 13, 15 - 4 - 1)
        assert_eq!(canvas.engine().cards()[0].position(), Point::new(26.0, 10.0));
        assert!(!canvas.drag().is_drag_active());
    }

    #[test]
    fn test_mouse_release_outside_canvas_cancels() {
        let (mut canvas, storage) =
            canvas_with(vec![Card::new("a", "A").positioned(Point::new(0.0, 0.0))]);

        canvas.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 5));
        canvas.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, 1));

        assert_eq!(canvas.engine().cards()[0].position(), Point::new(0.0, 0.0));
        assert!(!storage.has_cards());
    }

    #[test]
    fn test_mouse_up_ignored_during_keyboard_drag() {
        let (mut canvas, storage) =
            canvas_with(vec![Card::new("a", "A").positioned(Point::new(2.0, 2.0))]);

        canvas.handle_input(key(KeyCode::Tab));
        canvas.handle_input(key(KeyCode::Char(' ')));
        canvas.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 60, 20));
        canvas.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 60, 20));

        assert!(canvas.drag().is_drag_active());
        assert_eq!(canvas.engine().cards()[0].position(), Point::new(2.0, 2.0));
        assert!(!storage.has_cards());

        canvas.handle_input(key(KeyCode::Right));
        canvas.handle_input(key(KeyCode::Enter));
        assert_eq!(canvas.engine().cards()[0].position(), Point::new(3.0, 2.0));
    }

    #[test]
    fn test_topmost_card_wins_hit_test() {
        let (mut canvas, _) = canvas_with(vec![
            Card::new("under", "Under").positioned(Point::new(0.0, 0.0)),
            Card::new("over", "Over").positioned(Point::new(4.0, 2.0)),
        ]);

        canvas.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 8, 7));
        assert_eq!(canvas.drag().payload().unwrap().card_id, "over");
    }

    #[test]
    fn test_hover_sets_grab_hint() {
        let (mut canvas, _) =
            canvas_with(vec![Card::new("a", "A").positioned(Point::new(0.0, 0.0))]);

        canvas.handle_mouse(mouse(MouseEventKind::Moved, 3, 5));
        assert_eq!(canvas.cursor_hint(), CursorHint::Grab);
        canvas.handle_mouse(mouse(MouseEventKind::Moved, 90, 30));
        assert_eq!(canvas.cursor_hint(), CursorHint::Default);
    }

    #[test]
    fn test_teardown_clears_gesture() {
        let (mut canvas, storage) =
            canvas_with(vec![Card::new("a", "A").positioned(Point::new(0.0, 0.0))]);
        canvas.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 5));

        canvas.teardown();
        assert!(!canvas.drag().is_drag_active());
        assert!(!storage.has_cards());
    }

    #[test]
    fn test_render_shows_drop_zone_while_dragging() {
        let (mut canvas, _) =
            canvas_with(vec![Card::new("a", "Write post").positioned(Point::new(0.0, 0.0))]);
        let backend = TestBackend::new(VIEWPORT.width, VIEWPORT.height);
        let mut terminal = Terminal::new(backend).unwrap();

        let idle = terminal
            .draw(|f| canvas.render(f, MAIN, &Theme::dark()))
            .unwrap()
            .buffer
            .clone();
        let idle_text: String = idle.content().iter().map(|c| c.symbol()).collect();
        assert!(idle_text.contains("Write post"));
        assert!(!idle_text.contains("Drop card here"));

        canvas.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 5));
        let dragging = terminal
            .draw(|f| canvas.render(f, MAIN, &Theme::dark()))
            .unwrap()
            .buffer
            .clone();
        let dragging_text: String = dragging.content().iter().map(|c| c.symbol()).collect();
        assert!(dragging_text.contains("Drop card here"));
    }
}
