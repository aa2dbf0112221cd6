//! Card placement on the canvas.
//!
//! The engine owns the positioned card list. Every position it writes goes
//! through [`Bounds::clamp`], and every change to the list is written back to
//! storage before the call returns.

use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::models::{Card, CardSet, PositionedCard, Point, Size};
use crate::services::Storage;

/// Grid used for the first arrangement of fetched cards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Cards per row
    pub columns: usize,
    /// Horizontal cell pitch (before the gutter)
    pub cell_width: f64,
    /// Vertical cell pitch (before the gutter)
    pub cell_height: f64,
    /// Space between cells on both axes
    pub gutter: f64,
    /// Offset of the first cell from the canvas origin
    pub margin: f64,
    /// Maximum random offset per axis, applied as `[-jitter, +jitter]`
    pub jitter: f64,
}

impl GridSpec {
    /// Top-left corner of the cell at `index`, before jitter.
    #[must_use]
    pub fn cell_origin(&self, index: usize) -> Point {
        let columns = self.columns.max(1);
        let col = (index % columns) as f64;
        let row = (index / columns) as f64;
        Point::new(
            self.margin + col * (self.cell_width + self.gutter),
            self.margin + row * (self.cell_height + self.gutter),
        )
    }
}

/// Dimensions that drive placement, clamping and drop math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMetrics {
    /// Card footprint
    pub card: Size,
    /// Initial arrangement grid
    pub grid: GridSpec,
    /// Distance from a card's top edge to where it is held while dragged
    pub grip_offset: f64,
    /// Space reserved around the canvas when only the viewport is known
    pub viewport_padding: f64,
}

impl CanvasMetrics {
    /// Browser pixel metrics: 280x150 cards on a 220x140 grid.
    #[must_use]
    pub const fn pixels() -> Self {
        Self {
            card: Size::new(280.0, 150.0),
            grid: GridSpec {
                columns: 3,
                cell_width: 220.0,
                cell_height: 140.0,
                gutter: 40.0,
                margin: 50.0,
                jitter: 20.0,
            },
            grip_offset: 20.0,
            viewport_padding: 40.0,
        }
    }

    /// Terminal cell metrics used by the TUI.
    #[must_use]
    pub const fn terminal() -> Self {
        Self {
            card: Size::new(26.0, 7.0),
            grid: GridSpec {
                columns: 3,
                cell_width: 26.0,
                cell_height: 7.0,
                gutter: 2.0,
                margin: 1.0,
                jitter: 1.0,
            },
            grip_offset: 1.0,
            viewport_padding: 2.0,
        }
    }

    /// Clamping bounds for a surface.
    ///
    /// Uses the measured canvas when it has a real area, otherwise the
    /// viewport minus the padding.
    #[must_use]
    pub fn bounds(&self, surface: &Surface) -> Bounds {
        match surface.canvas.filter(Size::is_measurable) {
            Some(canvas) => Bounds::new(
                canvas.width - self.card.width,
                canvas.height - self.card.height,
            ),
            None => {
                debug!("Canvas not measurable, bounding by viewport");
                Bounds::new(
                    surface.viewport.width - self.card.width - self.viewport_padding,
                    surface.viewport.height - self.card.height - self.viewport_padding,
                )
            }
        }
    }
}

impl Default for CanvasMetrics {
    fn default() -> Self {
        Self::terminal()
    }
}

/// What the engine knows about the space cards live in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Surface {
    /// Measured canvas size, if it has been laid out
    pub canvas: Option<Size>,
    /// Size of the whole window or terminal
    pub viewport: Size,
}

impl Surface {
    /// A surface with a measured canvas.
    #[must_use]
    pub const fn measured(canvas: Size, viewport: Size) -> Self {
        Self {
            canvas: Some(canvas),
            viewport,
        }
    }

    /// A surface whose canvas has not been measured.
    #[must_use]
    pub const fn unmeasured(viewport: Size) -> Self {
        Self {
            canvas: None,
            viewport,
        }
    }
}

/// Largest allowed top-left coordinates; the minimum is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    /// Creates bounds. Negative or non-finite maxima become 0.
    #[must_use]
    pub fn new(max_x: f64, max_y: f64) -> Self {
        Self {
            max_x: non_negative(max_x),
            max_y: non_negative(max_y),
        }
    }

    /// Largest allowed x.
    #[must_use]
    pub const fn max_x(&self) -> f64 {
        self.max_x
    }

    /// Largest allowed y.
    #[must_use]
    pub const fn max_y(&self) -> f64 {
        self.max_y
    }

    /// Pulls a point into `[0, max_x] x [0, max_y]`.
    #[must_use]
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(clamp_axis(point.x, self.max_x), clamp_axis(point.y, self.max_y))
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        0.0
    }
}

/// Places cards on the grid, in order, with jitter and clamping.
pub fn arrange<R: Rng + ?Sized>(
    cards: Vec<Card>,
    metrics: &CanvasMetrics,
    bounds: Bounds,
    rng: &mut R,
) -> Vec<PositionedCard> {
    let grid = &metrics.grid;
    cards
        .into_iter()
        .enumerate()
        .map(|(index, card)| {
            let base = grid.cell_origin(index);
            let jittered = if grid.jitter > 0.0 {
                base.offset_by(
                    rng.random_range(-grid.jitter..=grid.jitter),
                    rng.random_range(-grid.jitter..=grid.jitter),
                )
            } else {
                base
            };
            let floored = Point::new(jittered.x.max(0.0), jittered.y.max(0.0));
            card.positioned(bounds.clamp(floored))
        })
        .collect()
}

/// Result of [`LayoutEngine::move_card`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// The card now sits at this (clamped) position
    Moved(Point),
    /// No card with that id is loaded; nothing changed
    UnknownCard,
}

/// Owns card positions for the current canvas.
#[derive(Debug)]
pub struct LayoutEngine {
    metrics: CanvasMetrics,
    cards: Vec<PositionedCard>,
    bounds: Bounds,
    storage: Storage,
}

impl LayoutEngine {
    /// Creates an empty engine that persists through `storage`.
    #[must_use]
    pub fn new(metrics: CanvasMetrics, storage: Storage) -> Self {
        Self {
            metrics,
            cards: Vec::new(),
            bounds: Bounds::default(),
            storage,
        }
    }

    /// Replaces the loaded cards.
    ///
    /// Arranged sets keep their stored positions. Fetched sets are laid out on
    /// the grid and written back as arranged. Duplicate ids keep their first
    /// occurrence.
    pub fn load<R: Rng + ?Sized>(&mut self, set: CardSet, surface: &Surface, rng: &mut R) {
        self.bounds = self.metrics.bounds(surface);

        match set {
            CardSet::Arranged { cards } => {
                self.cards = dedup_by_id(cards, PositionedCard::id);
                debug!("Loaded {} arranged cards", self.cards.len());
            }
            CardSet::Fetched { cards } => {
                let cards = dedup_by_id(cards, |card: &Card| card.id.as_str());
                self.cards = arrange(cards, &self.metrics, self.bounds, rng);
                info!("Arranged {} fetched cards on the grid", self.cards.len());
                self.persist();
            }
        }
    }

    /// Moves one card to `candidate`, clamped to the current bounds.
    pub fn move_card(&mut self, card_id: &str, candidate: Point) -> MoveOutcome {
        let bounds = self.bounds;
        let Some(card) = self.cards.iter_mut().find(|c| c.id() == card_id) else {
            warn!("Ignoring move of unknown card {card_id}");
            return MoveOutcome::UnknownCard;
        };

        let position = bounds.clamp(candidate);
        card.set_position(position);
        debug!(
            "Moved card {card_id} to ({:.1}, {:.1})",
            position.x, position.y
        );

        self.persist();
        MoveOutcome::Moved(position)
    }

    /// Re-clamps every card against a new surface.
    ///
    /// Returns how many cards moved. The layout is persisted only when at
    /// least one did.
    pub fn reflow(&mut self, surface: &Surface) -> usize {
        self.bounds = self.metrics.bounds(surface);

        let bounds = self.bounds;
        let mut changed = 0;
        for card in &mut self.cards {
            let clamped = bounds.clamp(card.position());
            if clamped != card.position() {
                card.set_position(clamped);
                changed += 1;
            }
        }

        if changed > 0 {
            debug!("Reflow moved {changed} cards");
            self.persist();
        }
        changed
    }

    /// Cards in paint order.
    #[must_use]
    pub fn cards(&self) -> &[PositionedCard] {
        &self.cards
    }

    /// Looks up a card by id.
    #[must_use]
    pub fn card(&self, card_id: &str) -> Option<&PositionedCard> {
        self.cards.iter().find(|c| c.id() == card_id)
    }

    /// Current clamping bounds.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Metrics in use.
    #[must_use]
    pub const fn metrics(&self) -> &CanvasMetrics {
        &self.metrics
    }

    /// Number of loaded cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether no cards are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Snapshot of the current layout.
    #[must_use]
    pub fn card_set(&self) -> CardSet {
        CardSet::Arranged {
            cards: self.cards.clone(),
        }
    }

    fn persist(&self) {
        self.storage.set_cards(&self.card_set());
    }
}

fn dedup_by_id<T>(items: Vec<T>, id: impl Fn(&T) -> &str) -> Vec<T> {
    let mut seen = HashSet::new();
    let before = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| seen.insert(id(item).to_string()))
        .collect();

    if kept.len() < before {
        warn!("Dropped {} cards with duplicate ids", before - kept.len());
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn pixel_surface() -> Surface {
        Surface::measured(Size::new(900.0, 600.0), Size::new(1280.0, 800.0))
    }

    fn no_jitter() -> CanvasMetrics {
        let mut metrics = CanvasMetrics::pixels();
        metrics.grid.jitter = 0.0;
        metrics
    }

    #[test]
    fn test_bounds_from_measured_canvas() {
        let bounds = CanvasMetrics::pixels().bounds(&pixel_surface());
        assert!((bounds.max_x() - 620.0).abs() < f64::EPSILON);
        assert!((bounds.max_y() - 450.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds_fall_back_to_viewport() {
        let surface = Surface::measured(Size::new(0.0, 0.0), Size::new(1000.0, 700.0));
        let bounds = CanvasMetrics::pixels().bounds(&surface);
        assert!((bounds.max_x() - 680.0).abs() < f64::EPSILON);
        assert!((bounds.max_y() - 510.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds_never_negative() {
        let surface = Surface::measured(Size::new(100.0, 100.0), Size::new(100.0, 100.0));
        let bounds = CanvasMetrics::pixels().bounds(&surface);
        assert_eq!(bounds.clamp(Point::new(40.0, 40.0)), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_clamp_non_finite() {
        let bounds = Bounds::new(100.0, 100.0);
        assert_eq!(
            bounds.clamp(Point::new(f64::NAN, f64::INFINITY)),
            Point::new(0.0, 0.0)
        );
        assert_eq!(Bounds::new(f64::NAN, -5.0), Bounds::new(0.0, 0.0));
    }

    #[test]
    fn test_cell_origin() {
        let grid = CanvasMetrics::pixels().grid;
        assert_eq!(grid.cell_origin(0), Point::new(50.0, 50.0));
        assert_eq!(grid.cell_origin(2), Point::new(570.0, 50.0));
        assert_eq!(grid.cell_origin(4), Point::new(310.0, 230.0));
    }

    #[test]
    fn test_arrange_without_jitter_is_exact() {
        let cards = vec![Card::new("a", "A"), Card::new("b", "B")];
        let metrics = no_jitter();
        let bounds = metrics.bounds(&pixel_surface());
        let mut rng = SmallRng::seed_from_u64(1);

        let placed = arrange(cards, &metrics, bounds, &mut rng);
        assert_eq!(placed[0].position(), Point::new(50.0, 50.0));
        assert_eq!(placed[1].position(), Point::new(310.0, 50.0));
    }

    #[test]
    fn test_load_dedups_fetched_ids() {
        let storage = Storage::in_memory();
        let mut engine = LayoutEngine::new(no_jitter(), storage.clone());
        let set = CardSet::Fetched {
            cards: vec![
                Card::new("a", "first"),
                Card::new("b", "B"),
                Card::new("a", "second"),
            ],
        };

        engine.load(set, &pixel_surface(), &mut SmallRng::seed_from_u64(7));
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.card("a").unwrap().card.name, "first");
        assert!(storage.cards().unwrap().is_arranged());
    }

    #[test]
    fn test_load_arranged_keeps_positions_without_writing() {
        let storage = Storage::in_memory();
        let mut engine = LayoutEngine::new(CanvasMetrics::pixels(), storage.clone());
        let set = CardSet::Arranged {
            cards: vec![Card::new("a", "A").positioned(Point::new(700.0, 10.0))],
        };

        engine.load(set, &pixel_surface(), &mut SmallRng::seed_from_u64(7));
        assert_eq!(engine.cards()[0].position(), Point::new(700.0, 10.0));
        assert!(!storage.has_cards());
    }

    #[test]
    fn test_move_unknown_card_is_noop() {
        let storage = Storage::in_memory();
        let mut engine = LayoutEngine::new(no_jitter(), storage.clone());
        assert_eq!(
            engine.move_card("missing", Point::new(1.0, 1.0)),
            MoveOutcome::UnknownCard
        );
        assert!(!storage.has_cards());
    }

    #[test]
    fn test_reflow_counts_changes() {
        let storage = Storage::in_memory();
        let mut engine = LayoutEngine::new(no_jitter(), storage);
        let set = CardSet::Arranged {
            cards: vec![
                Card::new("a", "A").positioned(Point::new(600.0, 400.0)),
                Card::new("b", "B").positioned(Point::new(10.0, 10.0)),
            ],
        };
        engine.load(set, &pixel_surface(), &mut SmallRng::seed_from_u64(7));

        let smaller = Surface::measured(Size::new(500.0, 300.0), Size::new(800.0, 600.0));
        assert_eq!(engine.reflow(&smaller), 1);
        assert_eq!(engine.card("a").unwrap().position(), Point::new(220.0, 150.0));
        assert_eq!(engine.reflow(&smaller), 0);
    }
}
