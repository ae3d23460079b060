//! Server Reconciliation Adapter
//!
//! The pricing evaluator gives immediate local estimates, but the backend
//! owns the price of record. This module re-submits the current selection
//! to the remote pricing endpoints and replaces the displayed breakdown
//! with the server's once it arrives. Requests carry a monotonic sequence
//! number so a slow response for an old selection can never overwrite the
//! price of a newer one.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ApiConfig;
use crate::models::{
    catalog::CatalogSnapshot,
    pricing::{PricingBreakdown, ReconcileStatus},
    selection::{SelectionState, TripType},
};

#[derive(Debug, Error)]
pub enum PricingApiError {
    #[error("selection is not complete enough to price")]
    IncompleteSelection,
    #[error("pricing endpoint returned status {0}")]
    Status(u16),
    #[error("failed to reach pricing endpoint: {0}")]
    Network(#[from] reqwest::Error),
}

pub trait PricingBackend {
    async fn calculate_pricing(
        &self,
        selection: &SelectionState,
        catalog: &CatalogSnapshot,
    ) -> Result<PricingBreakdown, PricingApiError>;
}

#[derive(Debug, Serialize)]
struct SelectedOption {
    option_id: String,
    quantity: u32,
}

fn wire_options(selection: &SelectionState) -> Vec<SelectedOption> {
    selection
        .selected_options()
        .iter()
        .map(|(id, quantity)| SelectedOption {
            option_id: id.clone(),
            quantity: *quantity,
        })
        .collect()
}

#[derive(Serialize)]
struct TourPricingRequest<'a> {
    tour_id: &'a str,
    variant_id: &'a str,
    date: chrono::NaiveDateTime,
    adults: u32,
    children: u32,
    infants: u32,
    selected_options: Vec<SelectedOption>,
    discount_code: Option<&'a str>,
}

#[derive(Serialize)]
struct EventPricingRequest<'a> {
    event_id: &'a str,
    performance_id: &'a str,
    section_name: &'a str,
    ticket_type_id: Option<&'a str>,
    quantity: u32,
    selected_seats: &'a [String],
    selected_options: Vec<SelectedOption>,
    discount_code: Option<&'a str>,
}

#[derive(Serialize)]
struct TransferPricingRequest<'a> {
    origin: &'a str,
    destination: &'a str,
    vehicle_type: &'a str,
    trip_type: TripType,
    outbound_time: chrono::NaiveDateTime,
    return_time: Option<chrono::NaiveDateTime>,
    passenger_count: u32,
    selected_options: Vec<SelectedOption>,
    discount_code: Option<&'a str>,
}

#[derive(Deserialize)]
struct ProductPricingResponse {
    base_price: f64,
    #[serde(default)]
    options_total: f64,
    #[serde(default)]
    discount_amount: f64,
    total: f64,
    currency: String,
}

#[derive(Deserialize)]
struct TransferPricingResponse {
    base_price: f64,
    #[serde(default)]
    outbound_surcharge: f64,
    #[serde(default)]
    return_surcharge: f64,
    #[serde(default)]
    round_trip_discount: f64,
    #[serde(default)]
    options_total: f64,
    final_price: f64,
    currency: String,
}

/// Backend pricing over the REST endpoints.
pub struct HttpPricingBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpPricingBackend {
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the point-in-time pricing inputs for an event detail page.
    pub async fn fetch_event_catalog(
        &self,
        slug: &str,
    ) -> Result<CatalogSnapshot, PricingApiError> {
        let url = format!("{}/events/{}", self.base_url, slug);
        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(PricingApiError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    async fn post_pricing<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, PricingApiError>
    where
        Req: Serialize,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http_client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(PricingApiError::Status(response.status().as_u16()));
        }

        Ok(response.json::<Resp>().await?)
    }
}

impl PricingBackend for HttpPricingBackend {
    async fn calculate_pricing(
        &self,
        selection: &SelectionState,
        catalog: &CatalogSnapshot,
    ) -> Result<PricingBreakdown, PricingApiError> {
        match (selection, catalog) {
            (SelectionState::Tour(s), _) => {
                let request = TourPricingRequest {
                    tour_id: &s.product_id,
                    variant_id: s
                        .variant_id
                        .as_deref()
                        .ok_or(PricingApiError::IncompleteSelection)?,
                    date: s.schedule.ok_or(PricingApiError::IncompleteSelection)?,
                    adults: s.participants.adults,
                    children: s.participants.children,
                    infants: s.participants.infants,
                    selected_options: wire_options(selection),
                    discount_code: s.discount_code.as_deref(),
                };
                let resp: ProductPricingResponse =
                    self.post_pricing("/tours/pricing", &request).await?;
                Ok(PricingBreakdown {
                    base_price: resp.base_price,
                    outbound_surcharge: 0.0,
                    return_surcharge: 0.0,
                    discount_amount: resp.discount_amount,
                    options_total: resp.options_total,
                    total: resp.total,
                    currency: resp.currency,
                })
            }
            (SelectionState::Event(s), _) => {
                let request = EventPricingRequest {
                    event_id: &s.product_id,
                    performance_id: s
                        .performance_id
                        .as_deref()
                        .ok_or(PricingApiError::IncompleteSelection)?,
                    section_name: s
                        .section_name
                        .as_deref()
                        .ok_or(PricingApiError::IncompleteSelection)?,
                    ticket_type_id: s.ticket_type_id.as_deref(),
                    quantity: s.quantity,
                    selected_seats: &s.selected_seats,
                    selected_options: wire_options(selection),
                    discount_code: s.discount_code.as_deref(),
                };
                let resp: ProductPricingResponse =
                    self.post_pricing("/events/pricing", &request).await?;
                Ok(PricingBreakdown {
                    base_price: resp.base_price,
                    outbound_surcharge: 0.0,
                    return_surcharge: 0.0,
                    discount_amount: resp.discount_amount,
                    options_total: resp.options_total,
                    total: resp.total,
                    currency: resp.currency,
                })
            }
            (SelectionState::Transfer(s), CatalogSnapshot::Transfer(c)) => {
                let route = s
                    .route_id
                    .as_deref()
                    .and_then(|id| c.route(id))
                    .ok_or(PricingApiError::IncompleteSelection)?;
                let request = TransferPricingRequest {
                    origin: &route.origin,
                    destination: &route.destination,
                    vehicle_type: s
                        .vehicle_id
                        .as_deref()
                        .ok_or(PricingApiError::IncompleteSelection)?,
                    trip_type: s.trip_type,
                    outbound_time: s.outbound.ok_or(PricingApiError::IncompleteSelection)?,
                    return_time: s.return_leg,
                    passenger_count: s.passenger_count,
                    selected_options: wire_options(selection),
                    discount_code: s.discount_code.as_deref(),
                };
                let resp: TransferPricingResponse = self
                    .post_pricing("/transfers/routes/calculate_price", &request)
                    .await?;
                Ok(PricingBreakdown {
                    base_price: resp.base_price,
                    outbound_surcharge: resp.outbound_surcharge,
                    return_surcharge: resp.return_surcharge,
                    discount_amount: resp.round_trip_discount,
                    options_total: resp.options_total,
                    total: resp.final_price,
                    currency: resp.currency,
                })
            }
            _ => Err(PricingApiError::IncompleteSelection),
        }
    }
}

/// Tracks which breakdown is on display and which source it came from.
/// The displayed price is never blanked: while a server request is in
/// flight, or after a failure, the last known breakdown stays visible.
pub struct PricingReconciler<B: PricingBackend> {
    backend: B,
    issued_seq: u64,
    status: ReconcileStatus,
    current: Option<PricingBreakdown>,
}

impl<B: PricingBackend> PricingReconciler<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            issued_seq: 0,
            status: ReconcileStatus::Estimating,
            current: None,
        }
    }

    pub fn status(&self) -> ReconcileStatus {
        self.status
    }

    /// The breakdown to display right now, whatever its source.
    pub fn current(&self) -> Option<&PricingBreakdown> {
        self.current.as_ref()
    }

    /// Record a fresh local estimate after a selection change. A `None`
    /// estimate (selection no longer computable) keeps the last known
    /// breakdown on display.
    pub fn set_estimate(&mut self, estimate: Option<PricingBreakdown>) {
        if let Some(estimate) = estimate {
            self.current = Some(estimate);
        }
        self.status = ReconcileStatus::Estimating;
    }

    /// Issue a sequence ticket for a new server request.
    pub fn begin_request(&mut self) -> u64 {
        self.issued_seq += 1;
        self.status = ReconcileStatus::AwaitingServer;
        self.issued_seq
    }

    /// Apply a server response for the given ticket. Responses for any
    /// ticket other than the latest issued are discarded. Returns whether
    /// the response was taken into account.
    pub fn apply_response(
        &mut self,
        ticket: u64,
        result: Result<PricingBreakdown, PricingApiError>,
    ) -> bool {
        if ticket != self.issued_seq {
            debug!(
                "discarding stale pricing response (ticket {}, latest {})",
                ticket, self.issued_seq
            );
            return false;
        }

        match result {
            Ok(breakdown) => {
                self.current = Some(breakdown);
                self.status = ReconcileStatus::Reconciled;
            }
            Err(err) => {
                warn!("pricing reconciliation failed: {}", err);
                self.status = ReconcileStatus::Stale;
            }
        }
        true
    }

    /// Request authoritative pricing for the selection and reconcile the
    /// displayed breakdown with the result.
    pub async fn request_quote(
        &mut self,
        selection: &SelectionState,
        catalog: &CatalogSnapshot,
    ) -> ReconcileStatus {
        let ticket = self.begin_request();
        let result = self.backend.calculate_pricing(selection, catalog).await;
        self.apply_response(ticket, result);
        self.status
    }
}
