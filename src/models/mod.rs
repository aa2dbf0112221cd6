//! Data models for cards, labels, credentials and canvas geometry.
//!
//! This module contains the core data structures used throughout the application.
//! Models are designed to be independent of UI and business logic.

pub mod card;
pub mod credentials;
pub mod geometry;

// Re-export all model types
pub use card::{Card, CardSet, Label, PositionedCard};
pub use credentials::{CredentialField, Credentials, ValidationError};
pub use geometry::{Point, Region, Size};
