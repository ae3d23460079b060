use std::collections::BTreeMap;

use chrono::NaiveTime;

use crate::models::{
    catalog::{
        AgeGroupRate, CatalogSnapshot, DiscountCode, EventCatalog, OptionPricing, ProductOption,
        SurchargeBand, TourCatalog, TransferCatalog,
    },
    pricing::PricingBreakdown,
    selection::{EventSelection, SelectionState, TourSelection, TransferSelection, TripType},
};

pub struct PricingService;

impl PricingService {
    /// Compute a local price estimate for the given selection. Returns
    /// `None` while a required choice (schedule, variant, vehicle, valid
    /// quantity) is still missing — pricing is unavailable, not failed.
    pub fn evaluate(
        selection: &SelectionState,
        catalog: &CatalogSnapshot,
    ) -> Option<PricingBreakdown> {
        match (selection, catalog) {
            (SelectionState::Tour(s), CatalogSnapshot::Tour(c)) => Self::evaluate_tour(s, c),
            (SelectionState::Event(s), CatalogSnapshot::Event(c)) => Self::evaluate_event(s, c),
            (SelectionState::Transfer(s), CatalogSnapshot::Transfer(c)) => {
                Self::evaluate_transfer(s, c)
            }
            _ => None,
        }
    }

    fn evaluate_tour(selection: &TourSelection, catalog: &TourCatalog) -> Option<PricingBreakdown> {
        selection.schedule?;
        let variant = catalog.variant(selection.variant_id.as_deref()?)?;

        let participants = selection.participants;
        if participants.total() == 0 || participants.total() > variant.max_participants {
            return None;
        }

        let base = Self::age_group_price(variant.base_price, &variant.adult, participants.adults)
            + Self::age_group_price(variant.base_price, &variant.child, participants.children)
            + Self::age_group_price(variant.base_price, &variant.infant, participants.infants);

        let discount = base
            * Self::discount_percent(selection.discount_code.as_deref(), &catalog.discounts)
            / 100.0;
        let options = Self::options_total(&selection.selected_options, &catalog.options, base);

        Some(PricingBreakdown::new(
            base,
            0.0,
            0.0,
            discount,
            options,
            &catalog.currency,
        ))
    }

    fn evaluate_event(
        selection: &EventSelection,
        catalog: &EventCatalog,
    ) -> Option<PricingBreakdown> {
        let performance = catalog.performance(selection.performance_id.as_deref()?)?;
        let section = performance.section(selection.section_name.as_deref()?)?;

        if selection.quantity == 0 || selection.quantity > catalog.max_tickets {
            return None;
        }

        let unit_price = selection
            .ticket_type_id
            .as_deref()
            .and_then(|id| section.ticket_type(id))
            .map(|t| t.unit_price);

        let base = if section.seats.is_empty() {
            // General admission: ticket type price times quantity.
            unit_price? * selection.quantity as f64
        } else {
            // Seated section: one seat per ticket, seat price overrides
            // summed directly.
            if selection.selected_seats.len() != selection.quantity as usize {
                return None;
            }
            let mut sum = 0.0;
            for seat_id in &selection.selected_seats {
                let seat = section.seat(seat_id)?;
                sum += seat.price.or(unit_price)?;
            }
            sum
        };

        let discount = base
            * Self::discount_percent(selection.discount_code.as_deref(), &catalog.discounts)
            / 100.0;
        let options = Self::options_total(&selection.selected_options, &catalog.options, base);

        Some(PricingBreakdown::new(
            base,
            0.0,
            0.0,
            discount,
            options,
            &catalog.currency,
        ))
    }

    fn evaluate_transfer(
        selection: &TransferSelection,
        catalog: &TransferCatalog,
    ) -> Option<PricingBreakdown> {
        let route = catalog.route(selection.route_id.as_deref()?)?;
        let vehicle = route.vehicle(selection.vehicle_id.as_deref()?)?;

        if selection.passenger_count == 0 || selection.passenger_count > vehicle.max_passengers {
            return None;
        }

        let outbound = selection.outbound?;
        let outbound_surcharge =
            Self::time_surcharge(vehicle.base_price, outbound.time(), &catalog.surcharge_bands);

        let (base, return_surcharge) = match selection.trip_type {
            TripType::OneWay => (vehicle.base_price, 0.0),
            TripType::RoundTrip => {
                let return_leg = selection.return_leg?;
                let surcharge = Self::time_surcharge(
                    vehicle.base_price,
                    return_leg.time(),
                    &catalog.surcharge_bands,
                );
                (vehicle.base_price * 2.0, surcharge)
            }
        };

        // Round-trip discount applies after surcharges, before options.
        let subtotal = base + outbound_surcharge + return_surcharge;
        let mut discount = match selection.trip_type {
            TripType::RoundTrip => subtotal * catalog.round_trip_discount_percent / 100.0,
            TripType::OneWay => 0.0,
        };
        discount += (subtotal - discount)
            * Self::discount_percent(selection.discount_code.as_deref(), &catalog.discounts)
            / 100.0;

        let options = Self::options_total(&selection.selected_options, &catalog.options, base);

        Some(PricingBreakdown::new(
            base,
            outbound_surcharge,
            return_surcharge,
            discount,
            options,
            &catalog.currency,
        ))
    }

    fn age_group_price(variant_base: f64, rate: &AgeGroupRate, count: u32) -> f64 {
        if rate.free {
            return 0.0;
        }
        variant_base * rate.factor * count as f64
    }

    fn time_surcharge(leg_base: f64, time: NaiveTime, bands: &[SurchargeBand]) -> f64 {
        bands
            .iter()
            .find(|band| band.contains(time))
            .map(|band| leg_base * band.percent / 100.0)
            .unwrap_or(0.0)
    }

    fn options_total(
        selected: &BTreeMap<String, u32>,
        options: &[ProductOption],
        base: f64,
    ) -> f64 {
        selected
            .iter()
            .filter(|(_, quantity)| **quantity > 0)
            .filter_map(|(id, quantity)| {
                let option = options.iter().find(|o| &o.id == id)?;
                let price = match option.pricing {
                    OptionPricing::Fixed(price) => price * *quantity as f64,
                    OptionPricing::PercentOfBase(percent) => {
                        base * percent / 100.0 * *quantity as f64
                    }
                };
                Some(price)
            })
            .sum()
    }

    fn discount_percent(code: Option<&str>, discounts: &[DiscountCode]) -> f64 {
        code.and_then(|c| discounts.iter().find(|d| d.code == c))
            .map(|d| d.percent)
            .unwrap_or(0.0)
    }
}
