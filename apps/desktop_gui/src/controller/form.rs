//! Text buffers behind the item form.
//!
//! The controller owns the draft; these buffers hold what the user is typing.
//! They are overwritten only when the controller replaces the draft itself
//! (begin edit, cancel, reset after submit), detected via the draft revision.

use client_core::ControllerSnapshot;
use shared::protocol::Draft;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub name: String,
    pub description: String,
    pub price: String,
    revision: u64,
}

impl FormState {
    /// Returns `true` when the buffers were replaced from the snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &ControllerSnapshot) -> bool {
        if snapshot.draft_revision == self.revision {
            return false;
        }
        self.revision = snapshot.draft_revision;
        self.name = snapshot.draft.name.clone();
        self.description = snapshot.draft.description.clone();
        self.price = snapshot
            .draft
            .price
            .map(format_price)
            .unwrap_or_default();
        true
    }

    /// Draft revision the buffers were last loaded from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn to_draft(&self) -> Draft {
        Draft {
            name: self.name.clone(),
            description: self.description.clone(),
            price: parse_price(&self.price),
        }
    }

    pub fn can_submit(&self) -> bool {
        self.to_draft().is_complete()
    }
}

pub fn parse_price(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|price| price.is_finite())
}

pub fn format_price(price: f64) -> String {
    format!("{price}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::ItemId;

    fn snapshot_with(draft: Draft, revision: u64) -> ControllerSnapshot {
        ControllerSnapshot {
            draft,
            draft_revision: revision,
            edit_target: Some(ItemId::new("a")),
            ..ControllerSnapshot::default()
        }
    }

    #[test]
    fn parses_prices_like_a_number_input() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price(" 2 "), Some(2.0));
        assert_eq!(parse_price("4.50"), Some(4.5));
        assert_eq!(parse_price("two"), None);
        assert_eq!(parse_price("inf"), None);
    }

    #[test]
    fn replaces_buffers_only_on_new_revision() {
        let mut form = FormState::default();
        let draft = Draft {
            name: "Cup".to_string(),
            description: "Mug".to_string(),
            price: Some(4.5),
        };

        assert!(form.apply_snapshot(&snapshot_with(draft.clone(), 1)));
        assert_eq!(form.price, "4.5");
        assert_eq!(form.revision(), 1);

        form.name = "Cup (typing)".to_string();
        assert!(!form.apply_snapshot(&snapshot_with(draft, 1)));
        assert_eq!(form.name, "Cup (typing)");

        assert!(form.apply_snapshot(&snapshot_with(Draft::default(), 2)));
        assert_eq!(form.revision(), 2);
        assert!(form.name.is_empty());
        assert!(form.price.is_empty());
    }

    #[test]
    fn submit_requires_every_field() {
        let mut form = FormState {
            name: "Pen".to_string(),
            description: "Blue pen".to_string(),
            ..FormState::default()
        };
        assert!(!form.can_submit());

        form.price = "2".to_string();
        assert!(form.can_submit());
        assert_eq!(form.to_draft().price, Some(2.0));
    }
}
