use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Tour,
    Event,
    Transfer,
}

impl ProductType {
    pub fn as_str(&self) -> &str {
        match self {
            ProductType::Tour => "tour",
            ProductType::Event => "event",
            ProductType::Transfer => "transfer",
        }
    }
}

/// Pricing rule for one participant age group (tours).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgeGroupRate {
    pub factor: f64,
    /// Free groups contribute nothing to the base price regardless of count.
    #[serde(default)]
    pub free: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourVariant {
    pub id: String,
    pub name: String,
    pub base_price: f64,
    pub adult: AgeGroupRate,
    pub child: AgeGroupRate,
    pub infant: AgeGroupRate,
    pub max_participants: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Available,
    Held,
    Sold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: String,
    pub status: SeatStatus,
    /// Per-seat price override; falls back to the ticket type unit price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketType {
    pub id: String,
    pub name: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub ticket_types: Vec<TicketType>,
    /// Empty for general-admission sections.
    #[serde(default)]
    pub seats: Vec<Seat>,
}

impl Section {
    pub fn seat(&self, seat_id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == seat_id)
    }

    pub fn ticket_type(&self, ticket_type_id: &str) -> Option<&TicketType> {
        self.ticket_types.iter().find(|t| t.id == ticket_type_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Performance {
    pub id: String,
    pub starts_at: NaiveDateTime,
    pub sections: Vec<Section>,
}

impl Performance {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleType {
    pub id: String,
    pub name: String,
    pub max_passengers: u32,
    /// Base price for one leg on the owning route.
    pub base_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRoute {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub vehicles: Vec<VehicleType>,
}

impl TransferRoute {
    pub fn vehicle(&self, vehicle_id: &str) -> Option<&VehicleType> {
        self.vehicles.iter().find(|v| v.id == vehicle_id)
    }
}

/// Time-of-day surcharge band. Bands may wrap past midnight
/// (e.g. 22:00-06:00 for the late-night uplift).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurchargeBand {
    pub label: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub percent: f64,
}

impl SurchargeBand {
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "amount")]
pub enum OptionPricing {
    Fixed(f64),
    PercentOfBase(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: String,
    pub name: String,
    pub pricing: OptionPricing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourCatalog {
    pub product_id: String,
    pub currency: String,
    pub variants: Vec<TourVariant>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub discounts: Vec<DiscountCode>,
}

impl TourCatalog {
    pub fn variant(&self, variant_id: &str) -> Option<&TourVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCatalog {
    pub product_id: String,
    pub currency: String,
    pub performances: Vec<Performance>,
    pub max_tickets: u32,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub discounts: Vec<DiscountCode>,
}

impl EventCatalog {
    pub fn performance(&self, performance_id: &str) -> Option<&Performance> {
        self.performances.iter().find(|p| p.id == performance_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCatalog {
    pub product_id: String,
    pub currency: String,
    pub routes: Vec<TransferRoute>,
    #[serde(default)]
    pub surcharge_bands: Vec<SurchargeBand>,
    /// Percentage off the combined leg subtotal for round trips.
    pub round_trip_discount_percent: f64,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub discounts: Vec<DiscountCode>,
}

impl TransferCatalog {
    pub fn route(&self, route_id: &str) -> Option<&TransferRoute> {
        self.routes.iter().find(|r| r.id == route_id)
    }
}

/// Point-in-time pricing inputs for one product, as returned by the
/// product detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "product_type")]
pub enum CatalogSnapshot {
    Tour(TourCatalog),
    Event(EventCatalog),
    Transfer(TransferCatalog),
}

impl CatalogSnapshot {
    pub fn product_type(&self) -> ProductType {
        match self {
            CatalogSnapshot::Tour(_) => ProductType::Tour,
            CatalogSnapshot::Event(_) => ProductType::Event,
            CatalogSnapshot::Transfer(_) => ProductType::Transfer,
        }
    }

    pub fn product_id(&self) -> &str {
        match self {
            CatalogSnapshot::Tour(c) => &c.product_id,
            CatalogSnapshot::Event(c) => &c.product_id,
            CatalogSnapshot::Transfer(c) => &c.product_id,
        }
    }

    pub fn currency(&self) -> &str {
        match self {
            CatalogSnapshot::Tour(c) => &c.currency,
            CatalogSnapshot::Event(c) => &c.currency,
            CatalogSnapshot::Transfer(c) => &c.currency,
        }
    }

    pub fn options(&self) -> &[ProductOption] {
        match self {
            CatalogSnapshot::Tour(c) => &c.options,
            CatalogSnapshot::Event(c) => &c.options,
            CatalogSnapshot::Transfer(c) => &c.options,
        }
    }

    pub fn discounts(&self) -> &[DiscountCode] {
        match self {
            CatalogSnapshot::Tour(c) => &c.discounts,
            CatalogSnapshot::Event(c) => &c.discounts,
            CatalogSnapshot::Transfer(c) => &c.discounts,
        }
    }
}
