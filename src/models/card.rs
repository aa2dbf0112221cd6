//! Trello card and label data structures.
//!
//! These mirror the subset of Trello's native JSON schema the application
//! reads. Unknown fields in API payloads are ignored, and optional fields
//! default when absent or `null`.

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};

use super::Point;

/// Placeholder shown for cards without a title.
const UNTITLED: &str = "Untitled";

/// Trello board label.
///
/// Labels are both displayed as colored chips on cards and used as the
/// filter key when fetching cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Trello label identifier
    pub id: String,
    /// Label name (may be empty for color-only labels)
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Trello color name (e.g. "green", "purple_dark"); `None` for colorless labels
    #[serde(default)]
    pub color: Option<String>,
}

impl Label {
    /// Creates a new label.
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.map(str::to_string),
        }
    }

    /// Text used in label pickers, e.g. `"Blog (green)"` or `"(Unnamed)"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = if self.name.trim().is_empty() {
            "(Unnamed)"
        } else {
            self.name.as_str()
        };

        match &self.color {
            Some(color) if !color.is_empty() => format!("{name} ({color})"),
            _ => name.to_string(),
        }
    }
}

/// Trello card as returned by `GET /1/labels/{id}/cards`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Trello card identifier (unique)
    pub id: String,
    /// Card title
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Card description (Markdown source)
    #[serde(default, deserialize_with = "null_as_default")]
    pub desc: String,
    /// Due timestamp (ISO-8601)
    #[serde(default)]
    pub due: Option<String>,
    /// Whether the due date has been marked complete
    #[serde(default, deserialize_with = "null_as_default")]
    pub due_complete: bool,
    /// Labels attached to the card, in Trello order
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<Label>,
    /// Full card URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    /// Short card URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
}

impl Card {
    /// Creates a card with the given id and name and no other data.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            desc: String::new(),
            due: None,
            due_complete: false,
            labels: Vec::new(),
            url: String::new(),
            short_url: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Sets the due timestamp.
    #[must_use]
    pub fn with_due(mut self, due: impl Into<String>) -> Self {
        self.due = Some(due.into());
        self
    }

    /// Appends a label.
    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Sets the card URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Title for display, falling back to "Untitled".
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            UNTITLED
        } else {
            &self.name
        }
    }

    /// Due date formatted for display.
    ///
    /// Returns "No due date" when unset and "Invalid date" when the stored
    /// value is not an RFC 3339 timestamp.
    #[must_use]
    pub fn due_display(&self) -> String {
        match self.due.as_deref() {
            None | Some("") => "No due date".to_string(),
            Some(raw) => DateTime::parse_from_rfc3339(raw).map_or_else(
                |_| "Invalid date".to_string(),
                |date| date.format("%b %-d, %Y").to_string(),
            ),
        }
    }

    /// Attaches a canvas position to this card.
    #[must_use]
    pub fn positioned(self, at: Point) -> PositionedCard {
        PositionedCard {
            card: self,
            x: at.x,
            y: at.y,
        }
    }
}

/// A card plus its top-left offset on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedCard {
    /// Card data
    #[serde(flatten)]
    pub card: Card,
    /// Horizontal offset from the canvas origin
    pub x: f64,
    /// Vertical offset from the canvas origin
    pub y: f64,
}

impl PositionedCard {
    /// Card identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.card.id
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Replaces the position.
    pub fn set_position(&mut self, at: Point) {
        self.x = at.x;
        self.y = at.y;
    }
}

/// The persisted card document.
///
/// The tag records whether the cards have been arranged on the canvas yet,
/// so loaders never have to guess from the shape of the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum CardSet {
    /// Cards straight from Trello (or sample data) without positions
    Fetched {
        /// Cards in fetch order
        cards: Vec<Card>,
    },
    /// Cards with canvas positions
    Arranged {
        /// Cards in arrangement order
        cards: Vec<PositionedCard>,
    },
}

impl CardSet {
    /// Number of cards in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Fetched { cards } => cards.len(),
            Self::Arranged { cards } => cards.len(),
        }
    }

    /// Whether the set holds no cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cards carry positions.
    #[must_use]
    pub const fn is_arranged(&self) -> bool {
        matches!(self, Self::Arranged { .. })
    }

    /// Card identifiers in set order.
    #[cfg(test)]
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        match self {
            Self::Fetched { cards } => cards.iter().map(|c| c.id.as_str()).collect(),
            Self::Arranged { cards } => cards.iter().map(PositionedCard::id).collect(),
        }
    }
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_tolerates_unknown_and_null_fields() {
        let json = r#"{
            "id": "5f1",
            "name": "Write launch post",
            "desc": null,
            "due": "2025-03-05T12:00:00.000Z",
            "dueComplete": false,
            "idBoard": "b1",
            "idList": "l1",
            "pos": 16384,
            "labels": [{"id": "lb1", "name": "Blog", "color": "green", "idBoard": "b1"}],
            "url": "https://trello.com/c/abc/1-write-launch-post",
            "shortUrl": "https://trello.com/c/abc",
            "dateLastActivity": "2025-03-01T09:00:00.000Z"
        }"#;

        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.id, "5f1");
        assert_eq!(card.desc, "");
        assert_eq!(card.labels.len(), 1);
        assert_eq!(card.labels[0].color.as_deref(), Some("green"));
        assert_eq!(card.short_url.as_deref(), Some("https://trello.com/c/abc"));
    }

    #[test]
    fn test_label_with_null_color() {
        let label: Label = serde_json::from_str(r#"{"id":"x","name":"","color":null}"#).unwrap();
        assert_eq!(label.color, None);
        assert_eq!(label.display_name(), "(Unnamed)");
    }

    #[test]
    fn test_label_display_name_with_color() {
        let label = Label::new("x", "Blog", Some("green"));
        assert_eq!(label.display_name(), "Blog (green)");
    }

    #[test]
    fn test_due_display() {
        let card = Card::new("a", "A");
        assert_eq!(card.due_display(), "No due date");

        let card = card.with_due("2025-03-05T12:00:00.000Z");
        assert_eq!(card.due_display(), "Mar 5, 2025");

        let card = Card::new("b", "B").with_due("next tuesday");
        assert_eq!(card.due_display(), "Invalid date");
    }

    #[test]
    fn test_display_name_untitled() {
        assert_eq!(Card::new("a", "  ").display_name(), "Untitled");
        assert_eq!(Card::new("a", "Real").display_name(), "Real");
    }

    #[test]
    fn test_card_set_is_tagged() {
        let set = CardSet::Arranged {
            cards: vec![Card::new("a", "A").positioned(Point::new(10.0, 20.0))],
        };
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["layout"], "arranged");
        assert_eq!(json["cards"][0]["id"], "a");
        assert_eq!(json["cards"][0]["x"], 10.0);

        let back: CardSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_fetched_set_reports_unarranged() {
        let set = CardSet::Fetched {
            cards: vec![Card::new("a", "A"), Card::new("b", "B")],
        };
        assert!(!set.is_arranged());
        assert_eq!(set.len(), 2);
        assert_eq!(set.ids(), vec!["a", "b"]);
    }
}
