use anyhow::Result;
use ratatui::layout::Rect;
use tracing::info;

use crate::config::Config;
use crate::services::Storage;
use crate::tui;

/// Startup switches from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Seed sample cards when nothing is stored
    pub demo: bool,
    /// Clear stored cards before starting
    pub reset: bool,
}

/// Applies `--reset` and `--demo` to storage.
///
/// Reset runs first, so `--reset --demo` starts from the sample cards.
pub fn prepare_storage(storage: &Storage, options: LaunchOptions) {
    if options.reset {
        info!("Clearing stored cards");
        storage.clear_cards();
    }

    if options.demo && storage.seed_sample_cards_if_empty() {
        info!("Seeded sample cards");
    }
}

/// Runs the terminal session until the user quits.
pub fn run(config: Config, storage: Storage, options: LaunchOptions) -> Result<()> {
    prepare_storage(&storage, options);

    let mut terminal = tui::setup_terminal()?;
    let size = terminal.size()?;
    let mut app_state =
        tui::AppState::new(config, storage, Rect::new(0, 0, size.width, size.height));

    // Run main TUI loop
    let result = tui::run_tui(&mut app_state, &mut terminal);

    // Restore terminal
    tui::restore_terminal(terminal)?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Card, CardSet};

    #[test]
    fn test_demo_seeds_empty_storage() {
        let storage = Storage::in_memory();
        prepare_storage(
            &storage,
            LaunchOptions {
                demo: true,
                reset: false,
            },
        );
        assert_eq!(storage.cards().map(|set| set.len()), Some(6));
    }

    #[test]
    fn test_demo_keeps_existing_cards() {
        let storage = Storage::in_memory();
        storage.set_cards(&CardSet::Fetched {
            cards: vec![Card::new("mine", "Mine")],
        });

        prepare_storage(
            &storage,
            LaunchOptions {
                demo: true,
                reset: false,
            },
        );
        let set = storage.cards().unwrap();
        assert_eq!(set.ids(), vec!["mine"]);
    }

    #[test]
    fn test_reset_then_demo_reseeds() {
        let storage = Storage::in_memory();
        storage.set_cards(&CardSet::Fetched {
            cards: vec![Card::new("mine", "Mine")],
        });

        prepare_storage(
            &storage,
            LaunchOptions {
                demo: true,
                reset: true,
            },
        );
        assert_eq!(storage.cards().map(|set| set.len()), Some(6));
    }

    #[test]
    fn test_reset_clears_cards() {
        let storage = Storage::in_memory();
        storage.seed_sample_cards_if_empty();

        prepare_storage(
            &storage,
            LaunchOptions {
                demo: false,
                reset: true,
            },
        );
        assert!(!storage.has_cards());
    }
}
