//! Trakr Library
//!
//! This library provides core functionality for the Trakr application,
//! including the Trello gateway, persistent storage, the card layout engine
//! and drag protocol, and the terminal user interface.

// Module declarations
pub mod app;
pub mod canvas;
pub mod config;
pub mod constants;
pub mod models;
pub mod services;
pub mod tui;
