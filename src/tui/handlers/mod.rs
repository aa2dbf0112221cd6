//! Input handler modules for different TUI contexts.

pub mod canvas;
pub mod connect;
pub mod popups;

// Re-export handler functions
pub use canvas::{handle_canvas_input, handle_mouse_input};
pub use connect::{apply_cards_result, apply_labels_result, handle_connect_input};
pub use popups::handle_popup_input;
