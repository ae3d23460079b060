use actix_web::{web, App, HttpRequest, HttpResponse, Responder};
use chrono::NaiveDateTime;
use serde_json::json;

use voyago_booking::models::catalog::{
    AgeGroupRate, CatalogSnapshot, EventCatalog, Performance, Seat, SeatStatus, Section,
    SurchargeBand, TicketType, TourCatalog, TourVariant, TransferCatalog, TransferRoute,
    VehicleType,
};

/// Spin up a mock booking backend on a real socket so the reqwest-based
/// services can be exercised end to end.
pub fn spawn_backend() -> actix_test::TestServer {
    actix_test::start(|| {
        App::new()
            .route("/health", web::get().to(health_check))
            .route("/events/{slug}", web::get().to(event_detail))
            .route("/tours/pricing", web::post().to(tour_pricing))
            .route("/events/pricing", web::post().to(event_pricing))
            .route(
                "/transfers/routes/calculate_price",
                web::post().to(transfer_pricing),
            )
            .route("/cart/add", web::post().to(add_to_cart))
            .route("/cart", web::get().to(get_cart))
            .route("/cart", web::delete().to(clear_cart))
            .route("/cart/{item_id}", web::put().to(update_cart_item))
            .route("/cart/{item_id}", web::delete().to(remove_cart_item))
            .route("/orders", web::post().to(create_order))
    })
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(String::from)
}

fn authorized(req: &HttpRequest) -> bool {
    matches!(bearer_token(req).as_deref(), Some(token) if token != "expired")
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "OK"}))
}

async fn event_detail(path: web::Path<String>) -> impl Responder {
    if path.into_inner() != "evt-1" {
        return HttpResponse::NotFound().json(json!({"error": "Event not found"}));
    }
    HttpResponse::Ok().json(event_catalog())
}

// Server-side tour pricing knows a negotiated rate below the published one.
async fn tour_pricing(input: web::Json<serde_json::Value>) -> impl Responder {
    let adults = input.get("adults").and_then(|v| v.as_u64()).unwrap_or(0);
    let children = input.get("children").and_then(|v| v.as_u64()).unwrap_or(0);
    if adults + children == 0 {
        return HttpResponse::BadRequest().json(json!({"error": "No participants"}));
    }

    let base = 140_000.0 * adults as f64 + 70_000.0 * children as f64;
    HttpResponse::Ok().json(json!({
        "base_price": base,
        "options_total": 0.0,
        "discount_amount": 0.0,
        "total": base,
        "currency": "IDR"
    }))
}

async fn event_pricing(input: web::Json<serde_json::Value>) -> impl Responder {
    let quantity = input.get("quantity").and_then(|v| v.as_u64()).unwrap_or(0);
    if quantity == 0 {
        return HttpResponse::BadRequest().json(json!({"error": "Invalid quantity"}));
    }

    // Flat server rate, distinguishable from the catalog's seat prices
    let base = 45.0 * quantity as f64;
    HttpResponse::Ok().json(json!({
        "base_price": base,
        "options_total": 0.0,
        "discount_amount": 0.0,
        "total": base,
        "currency": "USD"
    }))
}

fn leg_surcharge(base: f64, time: Option<NaiveDateTime>) -> f64 {
    let Some(time) = time else { return 0.0 };
    let hour = chrono::Timelike::hour(&time.time());
    if (7..10).contains(&hour) {
        base * 0.25
    } else if hour >= 22 || hour < 6 {
        base * 0.15
    } else {
        0.0
    }
}

async fn transfer_pricing(input: web::Json<serde_json::Value>) -> impl Responder {
    let leg_base = 250_000.0;
    let round_trip = input.get("trip_type").and_then(|v| v.as_str()) == Some("round_trip");

    let outbound = input
        .get("outbound_time")
        .cloned()
        .and_then(|v| serde_json::from_value::<NaiveDateTime>(v).ok());
    if outbound.is_none() {
        return HttpResponse::BadRequest().json(json!({"error": "Missing outbound_time"}));
    }
    let return_leg = input
        .get("return_time")
        .cloned()
        .and_then(|v| serde_json::from_value::<NaiveDateTime>(v).ok());

    let outbound_surcharge = leg_surcharge(leg_base, outbound);
    let return_surcharge = if round_trip {
        leg_surcharge(leg_base, return_leg)
    } else {
        0.0
    };
    let base = if round_trip { leg_base * 2.0 } else { leg_base };
    let subtotal = base + outbound_surcharge + return_surcharge;
    let round_trip_discount = if round_trip { subtotal * 0.10 } else { 0.0 };

    HttpResponse::Ok().json(json!({
        "base_price": base,
        "outbound_surcharge": outbound_surcharge,
        "return_surcharge": return_surcharge,
        "round_trip_discount": round_trip_discount,
        "options_total": 0.0,
        "final_price": subtotal - round_trip_discount,
        "currency": "IDR"
    }))
}

async fn add_to_cart(req: HttpRequest, input: web::Json<serde_json::Value>) -> impl Responder {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"}));
    }

    // A seat grabbed by another user between selection and submission
    let seats = input["booking_data"]["selected_seats"].as_array();
    if seats.is_some_and(|s| s.iter().any(|v| v.as_str() == Some("GONE"))) {
        return HttpResponse::Conflict().json(json!({"error": "Seat no longer available"}));
    }

    let quantity = input.get("quantity").and_then(|v| v.as_u64()).unwrap_or(1);
    HttpResponse::Ok().json(json!({
        "id": "item-1",
        "product_type": input["product_type"],
        "product_id": input["product_id"],
        "quantity": quantity,
        "unit_price": 50.0,
        "total_price": 50.0 * quantity as f64,
        "currency": "USD",
        "selected_options": input["selected_options"],
        "booking_data": input["booking_data"]
    }))
}

async fn get_cart(req: HttpRequest) -> impl Responder {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"}));
    }
    HttpResponse::Ok().json(json!({
        "id": "cart-1",
        "items": [{
            "id": "item-1",
            "product_type": "event",
            "product_id": "evt-1",
            "quantity": 2,
            "unit_price": 50.0,
            "total_price": 100.0,
            "currency": "USD",
            "selected_options": {},
            "booking_data": {}
        }],
        "subtotal": 100.0,
        "total": 125.0,
        "currency": "USD"
    }))
}

async fn update_cart_item(
    req: HttpRequest,
    path: web::Path<String>,
    input: web::Json<serde_json::Value>,
) -> impl Responder {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"}));
    }
    let item_id = path.into_inner();
    if item_id == "missing" {
        return HttpResponse::NotFound().json(json!({"error": "Item not found"}));
    }

    let quantity = input.get("quantity").and_then(|v| v.as_u64()).unwrap_or(1);
    HttpResponse::Ok().json(json!({
        "id": item_id,
        "product_type": "event",
        "product_id": "evt-1",
        "quantity": quantity,
        "unit_price": 50.0,
        "total_price": 50.0 * quantity as f64,
        "currency": "USD",
        "selected_options": {},
        "booking_data": {}
    }))
}

async fn remove_cart_item(req: HttpRequest, path: web::Path<String>) -> impl Responder {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"}));
    }
    let item_id = path.into_inner();
    if item_id == "missing" {
        return HttpResponse::NotFound().json(json!({"error": "Item not found"}));
    }
    HttpResponse::NoContent().finish()
}

async fn clear_cart(req: HttpRequest) -> impl Responder {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"}));
    }
    HttpResponse::NoContent().finish()
}

async fn create_order(req: HttpRequest, input: web::Json<serde_json::Value>) -> impl Responder {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"}));
    }
    HttpResponse::Ok().json(json!({
        "id": "order-1",
        "cart_id": input["cart_id"],
        "status": "confirmed",
        "total": 125.0,
        "currency": "USD"
    }))
}

pub fn datetime(hour: u32, minute: u32) -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2025, 6, 15)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn tour_catalog() -> CatalogSnapshot {
    CatalogSnapshot::Tour(TourCatalog {
        product_id: "tour-1".to_string(),
        currency: "IDR".to_string(),
        variants: vec![TourVariant {
            id: "standard".to_string(),
            name: "Standard".to_string(),
            base_price: 150_000.0,
            adult: AgeGroupRate {
                factor: 1.0,
                free: false,
            },
            child: AgeGroupRate {
                factor: 0.5,
                free: false,
            },
            infant: AgeGroupRate {
                factor: 0.0,
                free: true,
            },
            max_participants: 10,
        }],
        options: vec![],
        discounts: vec![],
    })
}

pub fn event_catalog() -> CatalogSnapshot {
    CatalogSnapshot::Event(EventCatalog {
        product_id: "evt-1".to_string(),
        currency: "USD".to_string(),
        performances: vec![Performance {
            id: "perf-1".to_string(),
            starts_at: datetime(20, 0),
            sections: vec![Section {
                name: "Balcony".to_string(),
                ticket_types: vec![TicketType {
                    id: "regular".to_string(),
                    name: "Regular".to_string(),
                    unit_price: 50.0,
                }],
                seats: vec![
                    Seat {
                        id: "B-1".to_string(),
                        status: SeatStatus::Available,
                        price: Some(50.0),
                    },
                    Seat {
                        id: "B-2".to_string(),
                        status: SeatStatus::Available,
                        price: Some(50.0),
                    },
                ],
            }],
        }],
        max_tickets: 8,
        options: vec![],
        discounts: vec![],
    })
}

pub fn transfer_catalog() -> CatalogSnapshot {
    CatalogSnapshot::Transfer(TransferCatalog {
        product_id: "xfer-1".to_string(),
        currency: "IDR".to_string(),
        routes: vec![TransferRoute {
            id: "airport-ubud".to_string(),
            origin: "Airport".to_string(),
            destination: "Ubud".to_string(),
            vehicles: vec![VehicleType {
                id: "van".to_string(),
                name: "Van".to_string(),
                max_passengers: 6,
                base_price: 250_000.0,
            }],
        }],
        surcharge_bands: vec![
            SurchargeBand {
                label: "peak".to_string(),
                start: chrono::NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                end: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                percent: 25.0,
            },
            SurchargeBand {
                label: "late_night".to_string(),
                start: chrono::NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                end: chrono::NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                percent: 15.0,
            },
        ],
        round_trip_discount_percent: 10.0,
        options: vec![],
        discounts: vec![],
    })
}
