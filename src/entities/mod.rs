//! Storefront entities module

pub mod cart;
pub mod cart_line;
pub mod category;
pub mod customer;
pub mod product;

// Re-export entities
pub use cart::{CartStatus, Entity as Cart, Model as CartModel};
pub use cart_line::{Entity as CartLine, Model as CartLineModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use customer::{Entity as Customer, Model as CustomerModel};
pub use product::{Entity as Product, Model as ProductModel, ProductKind, ProductSpecs};
