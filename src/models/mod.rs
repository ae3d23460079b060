pub mod cart;
pub mod catalog;
pub mod pricing;
pub mod selection;
