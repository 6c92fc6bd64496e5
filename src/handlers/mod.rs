//! HTTP handlers: thin translation between the wire and the service layer.

pub mod carts;
pub mod catalog;
pub mod common;
pub mod customers;

pub use carts::cart_routes;
pub use catalog::{catalog_routes, categories_routes, products_routes};
pub use customers::customer_routes;
