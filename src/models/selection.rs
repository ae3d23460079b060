use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::catalog::ProductType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantCounts {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl ParticipantCounts {
    pub fn total(&self) -> u32 {
        self.adults + self.children + self.infants
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    OneWay,
    RoundTrip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourSelection {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub participants: ParticipantCounts,
    pub schedule: Option<NaiveDateTime>,
    #[serde(default)]
    pub selected_options: BTreeMap<String, u32>,
    pub discount_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSelection {
    pub product_id: String,
    pub performance_id: Option<String>,
    pub section_name: Option<String>,
    pub ticket_type_id: Option<String>,
    pub quantity: u32,
    /// Ordered, duplicate-free. Must match `quantity` for seated sections.
    #[serde(default)]
    pub selected_seats: Vec<String>,
    #[serde(default)]
    pub selected_options: BTreeMap<String, u32>,
    pub discount_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSelection {
    pub product_id: String,
    pub route_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub trip_type: TripType,
    pub passenger_count: u32,
    pub outbound: Option<NaiveDateTime>,
    pub return_leg: Option<NaiveDateTime>,
    pub contact: Option<ContactInfo>,
    #[serde(default)]
    pub selected_options: BTreeMap<String, u32>,
    pub discount_code: Option<String>,
}

/// The complete set of user choices for one in-progress booking, tagged
/// by product type so each flow carries only the fields it actually has.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "product_type")]
pub enum SelectionState {
    Tour(TourSelection),
    Event(EventSelection),
    Transfer(TransferSelection),
}

impl SelectionState {
    pub fn new_tour(product_id: impl Into<String>) -> Self {
        SelectionState::Tour(TourSelection {
            product_id: product_id.into(),
            variant_id: None,
            // Booking flows start with a single adult, like the UI does.
            participants: ParticipantCounts {
                adults: 1,
                children: 0,
                infants: 0,
            },
            schedule: None,
            selected_options: BTreeMap::new(),
            discount_code: None,
        })
    }

    pub fn new_event(product_id: impl Into<String>) -> Self {
        SelectionState::Event(EventSelection {
            product_id: product_id.into(),
            performance_id: None,
            section_name: None,
            ticket_type_id: None,
            quantity: 1,
            selected_seats: Vec::new(),
            selected_options: BTreeMap::new(),
            discount_code: None,
        })
    }

    pub fn new_transfer(product_id: impl Into<String>) -> Self {
        SelectionState::Transfer(TransferSelection {
            product_id: product_id.into(),
            route_id: None,
            vehicle_id: None,
            trip_type: TripType::OneWay,
            passenger_count: 1,
            outbound: None,
            return_leg: None,
            contact: None,
            selected_options: BTreeMap::new(),
            discount_code: None,
        })
    }

    pub fn product_type(&self) -> ProductType {
        match self {
            SelectionState::Tour(_) => ProductType::Tour,
            SelectionState::Event(_) => ProductType::Event,
            SelectionState::Transfer(_) => ProductType::Transfer,
        }
    }

    pub fn product_id(&self) -> &str {
        match self {
            SelectionState::Tour(s) => &s.product_id,
            SelectionState::Event(s) => &s.product_id,
            SelectionState::Transfer(s) => &s.product_id,
        }
    }

    pub fn selected_options(&self) -> &BTreeMap<String, u32> {
        match self {
            SelectionState::Tour(s) => &s.selected_options,
            SelectionState::Event(s) => &s.selected_options,
            SelectionState::Transfer(s) => &s.selected_options,
        }
    }

    pub fn discount_code(&self) -> Option<&str> {
        match self {
            SelectionState::Tour(s) => s.discount_code.as_deref(),
            SelectionState::Event(s) => s.discount_code.as_deref(),
            SelectionState::Transfer(s) => s.discount_code.as_deref(),
        }
    }

    /// The unit count the cart displays for this selection.
    pub fn quantity(&self) -> u32 {
        match self {
            SelectionState::Tour(s) => s.participants.total(),
            SelectionState::Event(s) => s.quantity,
            SelectionState::Transfer(s) => s.passenger_count,
        }
    }

    /// Set an add-on option quantity. Zero-quantity entries are pruned.
    pub fn set_option(&mut self, option_id: &str, quantity: u32) {
        let options = match self {
            SelectionState::Tour(s) => &mut s.selected_options,
            SelectionState::Event(s) => &mut s.selected_options,
            SelectionState::Transfer(s) => &mut s.selected_options,
        };
        if quantity == 0 {
            options.remove(option_id);
        } else {
            options.insert(option_id.to_string(), quantity);
        }
    }

    pub fn set_discount_code(&mut self, code: Option<String>) {
        let slot = match self {
            SelectionState::Tour(s) => &mut s.discount_code,
            SelectionState::Event(s) => &mut s.discount_code,
            SelectionState::Transfer(s) => &mut s.discount_code,
        };
        *slot = code;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_quantity_options_are_pruned() {
        let mut selection = SelectionState::new_event("evt-1");
        selection.set_option("parking", 2);
        assert_eq!(selection.selected_options().get("parking"), Some(&2));

        selection.set_option("parking", 0);
        assert!(selection.selected_options().is_empty());
    }

    #[test]
    fn test_participant_total() {
        let counts = ParticipantCounts {
            adults: 2,
            children: 1,
            infants: 1,
        };
        assert_eq!(counts.total(), 4);
    }
}
