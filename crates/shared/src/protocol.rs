use serde::{Deserialize, Serialize};

use crate::domain::Item;

/// Request body for create and update. The server owns `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPayload {
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl ItemPayload {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.name == item.name && self.description == item.description && self.price == item.price
    }
}

impl From<&Item> for ItemPayload {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
        }
    }
}

/// Client-side form buffer. `price` is `None` while the field is empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.description.is_empty() && self.price.is_none()
    }

    /// Mirrors the form's required fields: every field non-empty. Whitespace
    /// counts as content.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.description.is_empty() && self.price.is_some()
    }

    pub fn payload(&self) -> Option<ItemPayload> {
        if !self.is_complete() {
            return None;
        }
        Some(ItemPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price?,
        })
    }
}

impl From<&Item> for Draft {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            price: Some(item.price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemId;

    #[test]
    fn payload_serializes_without_id() {
        let payload = ItemPayload::new("Pen", "Blue pen", 2.0);
        let value = serde_json::to_value(&payload).expect("encode");
        assert_eq!(
            value,
            serde_json::json!({"name": "Pen", "description": "Blue pen", "price": 2.0})
        );
    }

    #[test]
    fn incomplete_draft_has_no_payload() {
        let mut draft = Draft {
            name: "Pen".to_string(),
            description: "Blue pen".to_string(),
            price: None,
        };
        assert!(draft.payload().is_none());

        draft.price = Some(2.0);
        draft.description = String::new();
        assert!(draft.payload().is_none());

        draft.description = "   ".to_string();
        assert_eq!(draft.payload(), Some(ItemPayload::new("Pen", "   ", 2.0)));

        draft.description = "Blue pen".to_string();
        assert_eq!(draft.payload(), Some(ItemPayload::new("Pen", "Blue pen", 2.0)));
    }

    #[test]
    fn draft_from_item_copies_editable_fields() {
        let item = Item {
            id: ItemId::new("abc"),
            name: "Cup".to_string(),
            description: "Mug".to_string(),
            price: 4.5,
        };
        let draft = Draft::from(&item);
        assert_eq!(draft.price, Some(4.5));
        assert!(ItemPayload::from(&item).matches(&item));
        assert!(!draft.is_empty());
        assert!(Draft::default().is_empty());
    }
}
