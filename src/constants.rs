//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and storage locations.

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "Trakr";

/// The binary name of the application (used in command examples, lowercase).
pub const APP_BINARY_NAME: &str = "trakr";

/// Directory name used under the platform config and data directories.
pub const CONFIG_DIR_NAME: &str = "Trakr";

/// File name of the application log inside the data directory.
pub const LOG_FILE_NAME: &str = "trakr.log";

/// Default Trello label color, used when a label has none.
pub const DEFAULT_LABEL_COLOR: &str = "#61bd4f";
