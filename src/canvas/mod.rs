//! The card canvas: placement and drag-and-drop.
//!
//! [`layout`] decides where cards are and persists them; [`drag`] turns
//! pointer gestures into drop requests. Both work in abstract canvas units so
//! the same code serves pixel and terminal-cell metrics.

pub mod drag;
pub mod layout;

pub use drag::{
    grip_point, CardInteraction, CursorHint, DragCoordinator, DragOutcome, DragPayload,
    GestureRejected,
};
pub use layout::{arrange, Bounds, CanvasMetrics, GridSpec, LayoutEngine, MoveOutcome, Surface};
