//! Integration tests for file-backed persistence across sessions.

mod fixtures;

use fixtures::{temp_storage, test_cards, test_credentials};
use std::fs;
use trakr::models::{CardSet, Point};
use trakr::services::Storage;

#[test]
fn test_state_survives_reopen() {
    let (dir, storage) = temp_storage();
    storage.set_credentials(&test_credentials());
    storage.set_selected_label("l1");
    storage.set_cards(&CardSet::Arranged {
        cards: vec![test_cards(1).remove(0).positioned(Point::new(12.0, 34.0))],
    });

    let reopened = Storage::open(Some(dir.path()));
    assert!(reopened.is_persistent());
    assert_eq!(reopened.credentials(), Some(test_credentials()));
    assert_eq!(reopened.selected_label().as_deref(), Some("l1"));
    match reopened.cards() {
        Some(CardSet::Arranged { cards }) => {
            assert_eq!(cards.len(), 1);
            assert_eq!(cards[0].id(), "c1");
            assert_eq!(cards[0].position(), Point::new(12.0, 34.0));
            assert_eq!(cards[0].card.labels[0].name, "Blog");
        }
        other => panic!("unexpected stored set: {other:?}"),
    }
}

#[test]
fn test_stored_cards_are_tagged() {
    let (dir, storage) = temp_storage();
    storage.set_cards(&CardSet::Fetched {
        cards: test_cards(2),
    });

    let raw = fs::read_to_string(dir.path().join("trello_cards.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["layout"], "fetched");
    assert_eq!(value["cards"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_clear_cards_keeps_credentials() {
    let (dir, storage) = temp_storage();
    storage.set_credentials(&test_credentials());
    storage.seed_sample_cards_if_empty();
    assert!(storage.has_cards());

    storage.clear_cards();

    let reopened = Storage::open(Some(dir.path()));
    assert!(!reopened.has_cards());
    assert_eq!(reopened.credentials(), Some(test_credentials()));
}

#[test]
fn test_seed_does_not_overwrite_fetched_cards() {
    let (_dir, storage) = temp_storage();
    storage.set_cards(&CardSet::Fetched {
        cards: test_cards(3),
    });

    assert!(!storage.seed_sample_cards_if_empty());
    assert_eq!(storage.cards().map(|set| set.len()), Some(3));
}

#[test]
fn test_memory_storage_is_not_persistent() {
    let storage = Storage::open(None);
    assert!(!storage.is_persistent());

    storage.set_selected_label("l1");
    assert_eq!(storage.selected_label().as_deref(), Some("l1"));
}
