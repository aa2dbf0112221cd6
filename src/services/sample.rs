//! Built-in demo cards for trying the canvas without a Trello board.

use crate::models::{Card, Label};

/// Cards used by `--demo` when nothing is stored yet.
#[must_use]
pub fn sample_cards() -> Vec<Card> {
    let blog = Label::new("sample-label-blog", "Blog", Some("green"));
    let urgent = Label::new("sample-label-urgent", "Urgent", Some("red"));
    let research = Label::new("sample-label-research", "Research", Some("purple"));

    vec![
        Card::new("sample-1", "Draft launch announcement")
            .with_desc("Outline the post and collect screenshots.")
            .with_due("2025-03-05T12:00:00.000Z")
            .with_label(blog.clone())
            .with_label(urgent.clone()),
        Card::new("sample-2", "Interview three users")
            .with_desc("Ask how they group cards today.")
            .with_label(research.clone()),
        Card::new("sample-3", "Write drag-and-drop guide")
            .with_due("2025-03-19T17:00:00.000Z")
            .with_label(blog.clone()),
        Card::new("sample-4", "Fix broken board link")
            .with_label(urgent),
        Card::new("sample-5", "Summarize survey results")
            .with_desc("Two pages max.")
            .with_label(research),
        Card::new("sample-6", "Schedule newsletter").with_label(blog),
    ]
}
