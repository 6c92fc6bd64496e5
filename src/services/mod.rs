//! Storefront services module - core business logic

pub mod cart;
pub mod catalog;
pub mod categories;
pub mod customers;

// Re-export services for convenience
pub use cart::{AddItemInput, CartOwner, CartService, CartWithLines};
pub use catalog::{CatalogService, CreateProductInput};
pub use categories::{CategoryService, CategorySummary, CreateCategoryInput};
pub use customers::{CustomerService, GetOrCreateCustomerInput, UpdateContactInput};

use crate::events::EventSender;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// The service set shared through application state.
#[derive(Clone)]
pub struct AppServices {
    pub categories: CategoryService,
    pub catalog: CatalogService,
    pub cart: CartService,
    pub customers: CustomerService,
}

impl AppServices {
    pub fn build(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            categories: CategoryService::new(db.clone(), event_sender.clone()),
            catalog: CatalogService::new(db.clone(), event_sender.clone()),
            cart: CartService::new(db.clone(), event_sender.clone()),
            customers: CustomerService::new(db, event_sender),
        }
    }
}
