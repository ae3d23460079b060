use chrono::NaiveDateTime;
use log::debug;

use crate::models::{
    catalog::{CatalogSnapshot, SeatStatus},
    pricing::PricingBreakdown,
    selection::{ContactInfo, ParticipantCounts, SelectionState, TripType},
};
use crate::services::pricing_service::PricingService;

/// A discrete user choice inside a booking flow.
#[derive(Debug, Clone)]
pub enum SelectionEvent {
    SelectSchedule(NaiveDateTime),
    SelectVariant(String),
    SetParticipants(ParticipantCounts),
    SelectPerformance(String),
    SelectSection(String),
    SelectTicketType(String),
    SetQuantity(u32),
    ToggleSeat(String),
    SelectRoute(String),
    SelectVehicle(String),
    SetTripType(TripType),
    SetOutboundTime(NaiveDateTime),
    SetReturnTime(NaiveDateTime),
    SetPassengers(u32),
    SetContactInfo(ContactInfo),
    SetOption { option_id: String, quantity: u32 },
    SetDiscountCode(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStep {
    Schedule,
    Attendees,
    Route,
    Vehicle,
    TripDetails,
    ContactInfo,
    Options,
    Review,
}

/// Completion and activation are derived independently per step on every
/// selection change; there is no linear lock between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStatus {
    pub step: BookingStep,
    pub is_active: bool,
    pub is_complete: bool,
}

impl StepStatus {
    fn new(step: BookingStep, is_active: bool, is_complete: bool) -> Self {
        Self {
            step,
            is_active,
            is_complete,
        }
    }
}

/// Owns the selection for one in-progress booking. Every applied event
/// recomputes the local price estimate; events that would violate an
/// invariant (unavailable seat, over-capacity count) are silently dropped
/// and only counted.
pub struct BookingFlow {
    catalog: CatalogSnapshot,
    selection: SelectionState,
    estimate: Option<PricingBreakdown>,
    ignored_events: u32,
}

impl BookingFlow {
    pub fn new(catalog: CatalogSnapshot) -> Self {
        let selection = match &catalog {
            CatalogSnapshot::Tour(c) => SelectionState::new_tour(c.product_id.clone()),
            CatalogSnapshot::Event(c) => SelectionState::new_event(c.product_id.clone()),
            CatalogSnapshot::Transfer(c) => SelectionState::new_transfer(c.product_id.clone()),
        };
        Self {
            catalog,
            selection,
            estimate: None,
            ignored_events: 0,
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    /// Latest local estimate, if the selection is complete enough to price.
    pub fn estimate(&self) -> Option<&PricingBreakdown> {
        self.estimate.as_ref()
    }

    /// Number of events dropped without any state change.
    pub fn ignored_event_count(&self) -> u32 {
        self.ignored_events
    }

    pub fn apply(&mut self, event: SelectionEvent) {
        let catalog = &self.catalog;
        let applied = match (&mut self.selection, event) {
            // --- Tour ---
            (SelectionState::Tour(s), SelectionEvent::SelectSchedule(dt)) => {
                s.schedule = Some(dt);
                true
            }
            (SelectionState::Tour(s), SelectionEvent::SelectVariant(id)) => {
                match catalog {
                    CatalogSnapshot::Tour(c) if c.variant(&id).is_some() => {
                        s.variant_id = Some(id);
                        true
                    }
                    _ => false,
                }
            }
            (SelectionState::Tour(s), SelectionEvent::SetParticipants(p)) => {
                let max = match catalog {
                    CatalogSnapshot::Tour(c) => s
                        .variant_id
                        .as_deref()
                        .and_then(|id| c.variant(id))
                        .map(|v| v.max_participants),
                    _ => None,
                };
                if p.total() == 0 || max.is_some_and(|m| p.total() > m) {
                    false
                } else {
                    s.participants = p;
                    true
                }
            }

            // --- Event ---
            (SelectionState::Event(s), SelectionEvent::SelectPerformance(id)) => {
                match catalog {
                    CatalogSnapshot::Event(c) if c.performance(&id).is_some() => {
                        if s.performance_id.as_deref() != Some(id.as_str()) {
                            // Section, seats and ticket type belong to the
                            // previous schedule.
                            s.section_name = None;
                            s.ticket_type_id = None;
                            s.selected_seats.clear();
                            s.performance_id = Some(id);
                        }
                        true
                    }
                    _ => false,
                }
            }
            (SelectionState::Event(s), SelectionEvent::SelectSection(name)) => {
                let exists = match catalog {
                    CatalogSnapshot::Event(c) => s
                        .performance_id
                        .as_deref()
                        .and_then(|pid| c.performance(pid))
                        .and_then(|p| p.section(&name))
                        .is_some(),
                    _ => false,
                };
                if !exists {
                    false
                } else {
                    if s.section_name.as_deref() != Some(name.as_str()) {
                        s.ticket_type_id = None;
                        s.selected_seats.clear();
                        s.section_name = Some(name);
                    }
                    true
                }
            }
            (SelectionState::Event(s), SelectionEvent::SelectTicketType(id)) => {
                let exists = match catalog {
                    CatalogSnapshot::Event(c) => s
                        .performance_id
                        .as_deref()
                        .and_then(|pid| c.performance(pid))
                        .and_then(|p| s.section_name.as_deref().and_then(|n| p.section(n)))
                        .and_then(|section| section.ticket_type(&id))
                        .is_some(),
                    _ => false,
                };
                if exists {
                    s.ticket_type_id = Some(id);
                    true
                } else {
                    false
                }
            }
            (SelectionState::Event(s), SelectionEvent::SetQuantity(quantity)) => {
                let max = match catalog {
                    CatalogSnapshot::Event(c) => c.max_tickets,
                    _ => 0,
                };
                if quantity == 0 || quantity > max {
                    false
                } else {
                    s.quantity = quantity;
                    s.selected_seats.truncate(quantity as usize);
                    true
                }
            }
            (SelectionState::Event(s), SelectionEvent::ToggleSeat(seat_id)) => {
                if let Some(pos) = s.selected_seats.iter().position(|id| id == &seat_id) {
                    s.selected_seats.remove(pos);
                    true
                } else {
                    let available = match catalog {
                        CatalogSnapshot::Event(c) => s
                            .performance_id
                            .as_deref()
                            .and_then(|pid| c.performance(pid))
                            .and_then(|p| s.section_name.as_deref().and_then(|n| p.section(n)))
                            .and_then(|section| section.seat(&seat_id))
                            .map(|seat| seat.status == SeatStatus::Available)
                            .unwrap_or(false),
                        _ => false,
                    };
                    if available && (s.selected_seats.len() as u32) < s.quantity {
                        s.selected_seats.push(seat_id);
                        true
                    } else {
                        false
                    }
                }
            }

            // --- Transfer ---
            (SelectionState::Transfer(s), SelectionEvent::SelectRoute(id)) => {
                match catalog {
                    CatalogSnapshot::Transfer(c) if c.route(&id).is_some() => {
                        if s.route_id.as_deref() != Some(id.as_str()) {
                            s.vehicle_id = None;
                            s.route_id = Some(id);
                        }
                        true
                    }
                    _ => false,
                }
            }
            (SelectionState::Transfer(s), SelectionEvent::SelectVehicle(id)) => {
                let vehicle = match catalog {
                    CatalogSnapshot::Transfer(c) => s
                        .route_id
                        .as_deref()
                        .and_then(|rid| c.route(rid))
                        .and_then(|route| route.vehicle(&id)),
                    _ => None,
                };
                match vehicle {
                    Some(v) => {
                        s.passenger_count = s.passenger_count.min(v.max_passengers);
                        s.vehicle_id = Some(id);
                        true
                    }
                    None => false,
                }
            }
            (SelectionState::Transfer(s), SelectionEvent::SetTripType(trip_type)) => {
                s.trip_type = trip_type;
                if trip_type == TripType::OneWay {
                    s.return_leg = None;
                }
                true
            }
            (SelectionState::Transfer(s), SelectionEvent::SetOutboundTime(dt)) => {
                s.outbound = Some(dt);
                true
            }
            (SelectionState::Transfer(s), SelectionEvent::SetReturnTime(dt)) => {
                if s.trip_type == TripType::RoundTrip {
                    s.return_leg = Some(dt);
                    true
                } else {
                    false
                }
            }
            (SelectionState::Transfer(s), SelectionEvent::SetPassengers(count)) => {
                let max = match catalog {
                    CatalogSnapshot::Transfer(c) => s
                        .route_id
                        .as_deref()
                        .and_then(|rid| c.route(rid))
                        .and_then(|route| {
                            s.vehicle_id.as_deref().and_then(|vid| route.vehicle(vid))
                        })
                        .map(|v| v.max_passengers),
                    _ => None,
                };
                if count == 0 || max.is_some_and(|m| count > m) {
                    false
                } else {
                    s.passenger_count = count;
                    true
                }
            }
            (SelectionState::Transfer(s), SelectionEvent::SetContactInfo(contact)) => {
                s.contact = Some(contact);
                true
            }

            // --- Any product ---
            (selection, SelectionEvent::SetOption { option_id, quantity }) => {
                selection.set_option(&option_id, quantity);
                true
            }
            (selection, SelectionEvent::SetDiscountCode(code)) => {
                selection.set_discount_code(code);
                true
            }

            // Event does not apply to this product type.
            _ => false,
        };

        if applied {
            self.reprice();
        } else {
            self.ignored_events += 1;
            debug!("selection event ignored, state unchanged");
        }
    }

    fn reprice(&mut self) {
        self.estimate = PricingService::evaluate(&self.selection, &self.catalog);
    }

    /// Derive the step list for the current selection.
    pub fn steps(&self) -> Vec<StepStatus> {
        match &self.selection {
            SelectionState::Tour(s) => {
                let schedule_done = s.schedule.is_some();
                let attendees_done = s.variant_id.is_some() && s.participants.total() >= 1;
                vec![
                    StepStatus::new(BookingStep::Schedule, true, schedule_done),
                    StepStatus::new(BookingStep::Attendees, schedule_done, attendees_done),
                    StepStatus::new(BookingStep::Options, schedule_done && attendees_done, true),
                    StepStatus::new(
                        BookingStep::Review,
                        schedule_done && attendees_done,
                        self.estimate.is_some(),
                    ),
                ]
            }
            SelectionState::Event(s) => {
                let schedule_done = s.performance_id.is_some();
                let seated = match &self.catalog {
                    CatalogSnapshot::Event(c) => s
                        .performance_id
                        .as_deref()
                        .and_then(|pid| c.performance(pid))
                        .and_then(|p| s.section_name.as_deref().and_then(|n| p.section(n)))
                        .map(|section| !section.seats.is_empty())
                        .unwrap_or(false),
                    _ => false,
                };
                let attendees_done = s.section_name.is_some()
                    && s.quantity >= 1
                    && if seated {
                        s.selected_seats.len() == s.quantity as usize
                    } else {
                        s.ticket_type_id.is_some()
                    };
                vec![
                    StepStatus::new(BookingStep::Schedule, true, schedule_done),
                    StepStatus::new(BookingStep::Attendees, schedule_done, attendees_done),
                    StepStatus::new(BookingStep::Options, schedule_done && attendees_done, true),
                    StepStatus::new(
                        BookingStep::Review,
                        schedule_done && attendees_done,
                        self.estimate.is_some(),
                    ),
                ]
            }
            SelectionState::Transfer(s) => {
                let route_done = s.route_id.is_some();
                let vehicle_done = s.vehicle_id.is_some();
                let trip_done = s.outbound.is_some()
                    && s.passenger_count >= 1
                    && (s.trip_type == TripType::OneWay || s.return_leg.is_some());
                let contact_done = s.contact.is_some();
                vec![
                    StepStatus::new(BookingStep::Route, true, route_done),
                    StepStatus::new(BookingStep::Vehicle, route_done, vehicle_done),
                    StepStatus::new(BookingStep::TripDetails, route_done && vehicle_done, trip_done),
                    StepStatus::new(
                        BookingStep::Options,
                        route_done && vehicle_done && trip_done,
                        true,
                    ),
                    StepStatus::new(
                        BookingStep::ContactInfo,
                        route_done && vehicle_done && trip_done,
                        contact_done,
                    ),
                    StepStatus::new(
                        BookingStep::Review,
                        route_done && vehicle_done && trip_done && contact_done,
                        self.estimate.is_some(),
                    ),
                ]
            }
        }
    }
}
