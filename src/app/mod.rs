//! Application orchestration layer
//!
//! This module provides high-level orchestration functions that coordinate
//! between different parts of the application (TUI, config, storage)
//! without containing detailed implementation logic.

/// Startup options and the terminal session
pub mod launch;

// Re-export commonly used functions for convenience
pub use launch::{prepare_storage, run, LaunchOptions};
