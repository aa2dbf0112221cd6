//! Drag-and-drop gesture tracking for canvas cards.
//!
//! # Model
//!
//! A single optional gesture slot lives in [`DragCoordinator`]. Each card's
//! [`CardInteraction`] is derived from that slot, so there is exactly one
//! source of truth for "is something being dragged".
//!
//! # Invariants
//!
//! 1. At most one gesture is active. `lift` while one is active is rejected.
//! 2. `release`, `cancel`, `detach` and `detach_all` always leave the
//!    coordinator idle, whether or not a drop was accepted.
//! 3. The coordinator never moves cards itself. A drop yields a
//!    [`DragOutcome::Dropped`] that the caller hands to the layout engine.
//! 4. The canvas is the only drop target: a card is dropped onto the canvas
//!    it was lifted from.

use std::mem;
use thiserror::Error;
use tracing::debug;

use crate::canvas::{Bounds, CanvasMetrics};
use crate::models::{Point, Region};

/// Interaction state of a single card, as seen by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardInteraction {
    /// Not being dragged
    #[default]
    Idle,
    /// Picked up, pointer outside the drop target
    Lifted,
    /// Picked up, pointer over the canvas
    HoveredAsTarget,
}

/// Data carried from lift to drop.
#[derive(Debug, Clone, PartialEq)]
pub struct DragPayload {
    /// Card being dragged
    pub card_id: String,
    /// Card position when it was lifted
    pub origin: Point,
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Released over the canvas
    Dropped {
        /// Card that was dragged
        card_id: String,
        /// Position when lifted
        origin: Point,
        /// Unclamped position derived from the release point
        position: Point,
    },
    /// Released elsewhere or cancelled; nothing moves
    Cancelled {
        /// Card that was dragged
        card_id: String,
    },
}

/// Why a gesture could not start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GestureRejected {
    /// Another card is still being dragged
    #[error("card {active} is already being dragged")]
    Busy {
        /// Id of the card currently lifted
        active: String,
    },
}

/// Pointer cursor to show over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    /// Nothing under the pointer
    Default,
    /// Pointer is over a card that can be picked up
    Grab,
    /// A card is being dragged
    Grabbing,
}

impl CursorHint {
    /// Short name, as CSS would spell it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Grab => "grab",
            Self::Grabbing => "grabbing",
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveGesture {
    payload: DragPayload,
    pointer: Option<Point>,
    over_target: bool,
}

/// Owner of the drag-active signal for one canvas.
#[derive(Debug, Default)]
pub struct DragCoordinator {
    active: Option<ActiveGesture>,
}

impl DragCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks up a card.
    pub fn lift(&mut self, card_id: &str, origin: Point) -> Result<(), GestureRejected> {
        if let Some(active) = &self.active {
            return Err(GestureRejected::Busy {
                active: active.payload.card_id.clone(),
            });
        }

        debug!("Lifted card {card_id}");
        self.active = Some(ActiveGesture {
            payload: DragPayload {
                card_id: card_id.to_string(),
                origin,
            },
            pointer: None,
            over_target: false,
        });
        Ok(())
    }

    /// Tracks the pointer during a gesture.
    ///
    /// Returns whether the pointer is over the canvas. Does nothing when idle.
    pub fn hover(&mut self, pointer: Point, canvas: Region) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        active.pointer = Some(pointer);
        active.over_target = canvas.contains(pointer);
        active.over_target
    }

    /// Moves the tracked pointer by `(dx, dy)`, keeping it on the canvas.
    ///
    /// Used by keyboard dragging. Returns the new pointer, or `None` when idle.
    pub fn nudge(&mut self, dx: f64, dy: f64, canvas: Region) -> Option<Point> {
        let active = self.active.as_ref()?;
        let from = active.pointer.unwrap_or(canvas.origin);
        let last_x = canvas.origin.x + (canvas.size.width - 1.0).max(0.0);
        let last_y = canvas.origin.y + (canvas.size.height - 1.0).max(0.0);
        let to = Point::new(
            (from.x + dx).clamp(canvas.origin.x, last_x),
            (from.y + dy).clamp(canvas.origin.y, last_y),
        );

        self.hover(to, canvas);
        Some(to)
    }

    /// Ends the gesture at `pointer`.
    ///
    /// Inside the canvas the card is dropped so that the pointer sits at its
    /// grip point (horizontal center, `grip_offset` below the top edge).
    /// Outside, the gesture is cancelled. Returns `None` when idle.
    pub fn release(
        &mut self,
        pointer: Point,
        canvas: Region,
        metrics: &CanvasMetrics,
    ) -> Option<DragOutcome> {
        let gesture = self.active.take()?;
        let DragPayload { card_id, origin } = gesture.payload;

        if !canvas.contains(pointer) {
            debug!("Card {card_id} released outside the canvas");
            return Some(DragOutcome::Cancelled { card_id });
        }

        let position = drop_position(pointer, canvas, metrics);
        debug!(
            "Card {card_id} dropped at ({:.1}, {:.1})",
            position.x, position.y
        );
        Some(DragOutcome::Dropped {
            card_id,
            origin,
            position,
        })
    }

    /// Ends the gesture at the last tracked pointer.
    ///
    /// A gesture that never saw the pointer is cancelled.
    pub fn release_at_pointer(
        &mut self,
        canvas: Region,
        metrics: &CanvasMetrics,
    ) -> Option<DragOutcome> {
        let pointer = self.active.as_ref()?.pointer;
        match pointer {
            Some(pointer) => self.release(pointer, canvas, metrics),
            None => self.cancel(),
        }
    }

    /// Abandons the gesture without moving anything.
    pub fn cancel(&mut self) -> Option<DragOutcome> {
        let gesture = mem::take(&mut self.active)?;
        debug!("Drag of card {} cancelled", gesture.payload.card_id);
        Some(DragOutcome::Cancelled {
            card_id: gesture.payload.card_id,
        })
    }

    /// Drops the gesture if `card_id` is the lifted card (the card went away).
    ///
    /// Returns whether a gesture was cleared.
    pub fn detach(&mut self, card_id: &str) -> bool {
        let lifted = self
            .active
            .as_ref()
            .is_some_and(|g| g.payload.card_id == card_id);
        if lifted {
            debug!("Lifted card {card_id} detached");
            self.active = None;
        }
        lifted
    }

    /// Clears any gesture (the canvas went away).
    pub fn detach_all(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// The drag-active signal.
    #[must_use]
    pub const fn is_drag_active(&self) -> bool {
        self.active.is_some()
    }

    /// Payload of the active gesture.
    #[must_use]
    pub fn payload(&self) -> Option<&DragPayload> {
        self.active.as_ref().map(|g| &g.payload)
    }

    /// Last tracked pointer.
    #[must_use]
    pub fn pointer(&self) -> Option<Point> {
        self.active.as_ref().and_then(|g| g.pointer)
    }

    /// Interaction state of `card_id`.
    #[must_use]
    pub fn state_of(&self, card_id: &str) -> CardInteraction {
        match &self.active {
            Some(g) if g.payload.card_id == card_id => {
                if g.over_target {
                    CardInteraction::HoveredAsTarget
                } else {
                    CardInteraction::Lifted
                }
            }
            _ => CardInteraction::Idle,
        }
    }

    /// Where the lifted card would land if released now, clamped.
    ///
    /// `None` when idle or the pointer is off the canvas.
    #[must_use]
    pub fn preview_position(
        &self,
        canvas: Region,
        metrics: &CanvasMetrics,
        bounds: Bounds,
    ) -> Option<Point> {
        let gesture = self.active.as_ref()?;
        let pointer = gesture.pointer.filter(|_| gesture.over_target)?;
        Some(bounds.clamp(drop_position(pointer, canvas, metrics)))
    }

    /// Cursor to show given whether the pointer is over a card.
    #[must_use]
    pub const fn cursor_hint(&self, over_card: bool) -> CursorHint {
        if self.active.is_some() {
            CursorHint::Grabbing
        } else if over_card {
            CursorHint::Grab
        } else {
            CursorHint::Default
        }
    }
}

/// Client point of a card's grip when its top-left is at `position`.
#[must_use]
pub fn grip_point(position: Point, canvas: Region, metrics: &CanvasMetrics) -> Point {
    Point::new(
        canvas.origin.x + position.x + metrics.card.width / 2.0,
        canvas.origin.y + position.y + metrics.grip_offset,
    )
}

fn drop_position(pointer: Point, canvas: Region, metrics: &CanvasMetrics) -> Point {
    canvas
        .to_local(pointer)
        .offset_by(-metrics.card.width / 2.0, -metrics.grip_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Size;

    fn canvas() -> Region {
        Region::new(Point::new(100.0, 50.0), Size::new(900.0, 600.0))
    }

    #[test]
    fn test_second_lift_is_rejected() {
        let mut drag = DragCoordinator::new();
        drag.lift("c1", Point::new(0.0, 0.0)).unwrap();
        assert_eq!(
            drag.lift("c2", Point::new(0.0, 0.0)),
            Err(GestureRejected::Busy {
                active: "c1".to_string()
            })
        );
        assert_eq!(drag.payload().unwrap().card_id, "c1");
    }

    #[test]
    fn test_hover_updates_state() {
        let mut drag = DragCoordinator::new();
        drag.lift("c1", Point::new(0.0, 0.0)).unwrap();
        assert_eq!(drag.state_of("c1"), CardInteraction::Lifted);

        assert!(drag.hover(Point::new(200.0, 200.0), canvas()));
        assert_eq!(drag.state_of("c1"), CardInteraction::HoveredAsTarget);
        assert_eq!(drag.state_of("c2"), CardInteraction::Idle);

        assert!(!drag.hover(Point::new(5.0, 5.0), canvas()));
        assert_eq!(drag.state_of("c1"), CardInteraction::Lifted);
    }

    #[test]
    fn test_release_inside_computes_grip_offset() {
        let metrics = CanvasMetrics::pixels();
        let mut drag = DragCoordinator::new();
        drag.lift("c1", Point::new(50.0, 50.0)).unwrap();

        let outcome = drag
            .release(Point::new(400.0, 300.0), canvas(), &metrics)
            .unwrap();
        assert_eq!(
            outcome,
            DragOutcome::Dropped {
                card_id: "c1".to_string(),
                origin: Point::new(50.0, 50.0),
                position: Point::new(160.0, 230.0),
            }
        );
        assert!(!drag.is_drag_active());
    }

    #[test]
    fn test_release_outside_cancels() {
        let metrics = CanvasMetrics::pixels();
        let mut drag = DragCoordinator::new();
        drag.lift("c1", Point::new(50.0, 50.0)).unwrap();

        let outcome = drag.release(Point::new(10.0, 10.0), canvas(), &metrics);
        assert_eq!(
            outcome,
            Some(DragOutcome::Cancelled {
                card_id: "c1".to_string()
            })
        );
        assert!(!drag.is_drag_active());
    }

    #[test]
    fn test_release_when_idle_is_none() {
        let mut drag = DragCoordinator::new();
        assert!(drag
            .release(Point::new(0.0, 0.0), canvas(), &CanvasMetrics::pixels())
            .is_none());
        assert!(drag.cancel().is_none());
    }

    #[test]
    fn test_detach_only_matches_lifted_card() {
        let mut drag = DragCoordinator::new();
        drag.lift("c2", Point::new(0.0, 0.0)).unwrap();
        assert!(!drag.detach("c1"));
        assert!(drag.is_drag_active());
        assert!(drag.detach("c2"));
        assert!(!drag.is_drag_active());
    }

    #[test]
    fn test_grip_point_round_trips_through_release() {
        let metrics = CanvasMetrics::terminal();
        let region = Region::new(Point::new(1.0, 3.0), Size::new(80.0, 20.0));
        let origin = Point::new(10.0, 4.0);

        let mut drag = DragCoordinator::new();
        drag.lift("c1", origin).unwrap();
        drag.hover(grip_point(origin, region, &metrics), region);

        match drag.release_at_pointer(region, &metrics) {
            Some(DragOutcome::Dropped { position, .. }) => assert_eq!(position, origin),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_nudge_stays_on_canvas() {
        let region = Region::new(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let mut drag = DragCoordinator::new();
        assert!(drag.nudge(1.0, 0.0, region).is_none());

        drag.lift("c1", Point::new(0.0, 0.0)).unwrap();
        drag.hover(Point::new(8.0, 8.0), region);
        assert_eq!(drag.nudge(5.0, -20.0, region), Some(Point::new(9.0, 0.0)));
        assert_eq!(drag.state_of("c1"), CardInteraction::HoveredAsTarget);
    }

    #[test]
    fn test_cursor_hint() {
        let mut drag = DragCoordinator::new();
        assert_eq!(drag.cursor_hint(false), CursorHint::Default);
        assert_eq!(drag.cursor_hint(true), CursorHint::Grab);
        drag.lift("c1", Point::new(0.0, 0.0)).unwrap();
        assert_eq!(drag.cursor_hint(false), CursorHint::Grabbing);
    }
}
