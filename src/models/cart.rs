use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{
    catalog::ProductType,
    selection::{ParticipantCounts, SelectionState},
};

/// One confirmed booking line, owned by the server-side cart and mirrored
/// locally as a read model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub product_type: ProductType,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
    pub currency: String,
    #[serde(default)]
    pub selected_options: BTreeMap<String, u32>,
    /// Finalized selection as submitted; schema is backend-owned.
    pub booking_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub items: Vec<CartItem>,
    pub subtotal: f64,
    pub total: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartInput {
    pub product_type: ProductType,
    pub product_id: String,
    pub quantity: u32,
    pub selected_options: BTreeMap<String, u32>,
    pub booking_data: serde_json::Value,
    pub idempotency_key: String,
}

impl AddToCartInput {
    pub fn from_selection(selection: &SelectionState) -> Result<Self, serde_json::Error> {
        Ok(Self {
            product_type: selection.product_type(),
            product_id: selection.product_id().to_string(),
            quantity: selection.quantity(),
            selected_options: selection.selected_options().clone(),
            booking_data: serde_json::to_value(selection)?,
            idempotency_key: uuid::Uuid::new_v4().to_string(),
        })
    }
}

/// Partial update to an existing cart line. Only provided fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<ParticipantCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInput {
    pub cart_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub cart_id: String,
    pub status: String,
    pub total: f64,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_input_captures_selection() {
        let mut selection = SelectionState::new_event("evt-1");
        selection.set_option("parking", 1);

        let input = AddToCartInput::from_selection(&selection).unwrap();
        assert_eq!(input.product_type, ProductType::Event);
        assert_eq!(input.product_id, "evt-1");
        assert_eq!(input.quantity, 1);
        assert_eq!(input.selected_options.get("parking"), Some(&1));
        assert_eq!(input.booking_data["product_type"], "event");
        assert!(!input.idempotency_key.is_empty());
    }

    #[test]
    fn test_cart_item_update_serializes_only_set_fields() {
        let update = CartItemUpdate {
            quantity: Some(3),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "quantity": 3 }));
    }
}
