pub mod booking_flow;
pub mod cart_service;
pub mod pricing_client;
pub mod pricing_service;
