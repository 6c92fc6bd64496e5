use crate::{
    entities::{
        cart, cart_line, product, Cart, CartLine, CartModel, CartStatus, Product, ProductKind,
        ProductModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// The owner a cart is keyed by: a registered customer or an anonymous
/// session. Both identifiers are opaque values supplied by the identity
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    Customer(Uuid),
    Anonymous(String),
}

/// Shopping cart service.
///
/// Every mutation (add, set-quantity, remove, checkout) runs as a single
/// transaction that re-reads the line set and rewrites the cart's aggregate
/// fields, so `total_products` and `final_price` always equal the sums over
/// the current lines. No other writer touches those fields.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Returns the owner's active cart, creating one lazily. At most one
    /// active cart per owner is handed out; after checkout the next call
    /// starts a fresh one.
    #[instrument(skip(self))]
    pub async fn get_or_create_active_cart(
        &self,
        owner: &CartOwner,
    ) -> Result<CartModel, ServiceError> {
        let query = Cart::find()
            .filter(cart::Column::Status.eq(CartStatus::Active))
            .order_by_desc(cart::Column::CreatedAt);

        let query = match owner {
            CartOwner::Customer(customer_id) => {
                query.filter(cart::Column::CustomerId.eq(*customer_id))
            }
            CartOwner::Anonymous(session_id) => {
                query.filter(cart::Column::SessionId.eq(session_id.clone()))
            }
        };

        if let Some(existing) = query.one(&*self.db).await? {
            return Ok(existing);
        }

        let cart_id = Uuid::new_v4();
        let now = Utc::now();
        let (customer_id, session_id, anonymous) = match owner {
            CartOwner::Customer(customer_id) => (Some(*customer_id), None, false),
            CartOwner::Anonymous(session_id) => (None, Some(session_id.clone()), true),
        };

        let new_cart = cart::ActiveModel {
            id: Set(cart_id),
            customer_id: Set(customer_id),
            session_id: Set(session_id),
            for_anonymous_user: Set(anonymous),
            total_products: Set(0),
            final_price: Set(Decimal::ZERO),
            status: Set(CartStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let new_cart = new_cart.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartCreated(cart_id))
            .await;

        info!("Created cart {} for {:?}", cart_id, owner);
        Ok(new_cart)
    }

    /// Adds a product to the cart, merging into an existing line for the
    /// same (kind, product) if one is present.
    ///
    /// The line's `final_price` is always `quantity * current unit price`:
    /// the price is read from the catalog at mutation time, never cached on
    /// the line, so catalog price changes reach every uncommitted cart.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        input: AddItemInput,
    ) -> Result<CartModel, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::InvalidInput(
                "Quantity must be a positive integer".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        self.active_cart(&txn, cart_id).await?;
        let prod = self
            .resolve_product(&txn, input.kind, input.product_id)
            .await?;

        let existing_line = CartLine::find()
            .filter(cart_line::Column::CartId.eq(cart_id))
            .filter(cart_line::Column::ProductKind.eq(input.kind))
            .filter(cart_line::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        if let Some(line) = existing_line {
            let quantity = line.quantity + input.quantity;
            let mut line: cart_line::ActiveModel = line.into();
            line.quantity = Set(quantity);
            line.final_price = Set(prod.price * Decimal::from(quantity));
            line.updated_at = Set(Utc::now());
            line.update(&txn).await?;
        } else {
            let cart_model = Cart::find_by_id(cart_id).one(&txn).await?;
            let line = cart_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart_id),
                customer_id: Set(cart_model.and_then(|c| c.customer_id)),
                product_kind: Set(input.kind),
                product_id: Set(input.product_id),
                quantity: Set(input.quantity),
                final_price: Set(prod.price * Decimal::from(input.quantity)),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            };
            line.insert(&txn).await?;
        }

        let updated_cart = self.recalculate_aggregates(&txn, cart_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id,
                kind: input.kind,
                product_id: input.product_id,
            })
            .await;

        info!(
            "Added to cart {}: {} #{} x{}",
            cart_id, input.kind, input.product_id, input.quantity
        );
        Ok(updated_cart)
    }

    /// Sets a line's quantity. A non-positive quantity is rejected outright;
    /// removal is a separate operation.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        cart_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<CartModel, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::InvalidInput(
                "Quantity must be a positive integer; remove the line instead".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        self.active_cart(&txn, cart_id).await?;
        let line = self.owned_line(&txn, cart_id, line_id).await?;
        let prod = self
            .resolve_product(&txn, line.product_kind, line.product_id)
            .await?;

        let mut line: cart_line::ActiveModel = line.into();
        line.quantity = Set(quantity);
        line.final_price = Set(prod.price * Decimal::from(quantity));
        line.updated_at = Set(Utc::now());
        line.update(&txn).await?;

        let updated_cart = self.recalculate_aggregates(&txn, cart_id).await?;
        txn.commit().await?;

        Ok(updated_cart)
    }

    /// Deletes a line from the cart and recomputes the aggregates.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        cart_id: Uuid,
        line_id: Uuid,
    ) -> Result<CartModel, ServiceError> {
        let txn = self.db.begin().await?;

        self.active_cart(&txn, cart_id).await?;
        let line = self.owned_line(&txn, cart_id, line_id).await?;
        line.delete(&txn).await?;

        let updated_cart = self.recalculate_aggregates(&txn, cart_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved { cart_id, line_id })
            .await;

        info!("Removed line {} from cart {}", line_id, cart_id);
        Ok(updated_cart)
    }

    /// Checks the cart out: Active -> Ordered, one-way. Any later mutation
    /// of this cart fails; the owner's next cart is created on demand.
    #[instrument(skip(self))]
    pub async fn checkout(&self, cart_id: Uuid) -> Result<CartModel, ServiceError> {
        let txn = self.db.begin().await?;

        let cart_model = self.active_cart(&txn, cart_id).await?;
        let mut active: cart::ActiveModel = cart_model.into();
        active.status = Set(CartStatus::Ordered);
        active.updated_at = Set(Utc::now());
        let ordered = active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartCheckedOut(cart_id))
            .await;

        info!("Checked out cart {}", cart_id);
        Ok(ordered)
    }

    /// Retrieves a cart with all its lines.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: Uuid) -> Result<CartWithLines, ServiceError> {
        let cart_model = Cart::find_by_id(cart_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        let lines = cart_model.find_related(CartLine).all(&*self.db).await?;

        Ok(CartWithLines {
            cart: cart_model,
            lines,
        })
    }

    /// Loads the cart and rejects mutations of checked-out carts.
    async fn active_cart(
        &self,
        conn: &impl ConnectionTrait,
        cart_id: Uuid,
    ) -> Result<CartModel, ServiceError> {
        let cart_model = Cart::find_by_id(cart_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        if cart_model.status != CartStatus::Active {
            return Err(ServiceError::InvalidOperation(format!(
                "Cart {} is already checked out",
                cart_id
            )));
        }

        Ok(cart_model)
    }

    /// Loads a line and verifies it belongs to the given cart.
    async fn owned_line(
        &self,
        conn: &impl ConnectionTrait,
        cart_id: Uuid,
        line_id: Uuid,
    ) -> Result<cart_line::Model, ServiceError> {
        let line = CartLine::find_by_id(line_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart line {} not found", line_id)))?;

        if line.cart_id != cart_id {
            return Err(ServiceError::Forbidden(format!(
                "Cart line {} does not belong to cart {}",
                line_id, cart_id
            )));
        }

        Ok(line)
    }

    /// Resolves the tagged (kind, id) product reference against the catalog.
    async fn resolve_product(
        &self,
        conn: &impl ConnectionTrait,
        kind: ProductKind,
        product_id: i64,
    ) -> Result<ProductModel, ServiceError> {
        Product::find()
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::Kind.eq(kind))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No {} with id {}", kind, product_id)))
    }

    /// Rewrites the cart's aggregate fields from its current line set.
    async fn recalculate_aggregates(
        &self,
        conn: &impl ConnectionTrait,
        cart_id: Uuid,
    ) -> Result<CartModel, ServiceError> {
        let lines = CartLine::find()
            .filter(cart_line::Column::CartId.eq(cart_id))
            .all(conn)
            .await?;

        let total_products: i32 = lines.iter().map(|line| line.quantity).sum();
        let final_price: Decimal = lines.iter().map(|line| line.final_price).sum();

        let mut cart_model: cart::ActiveModel = Cart::find_by_id(cart_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?
            .into();

        cart_model.total_products = Set(total_products);
        cart_model.final_price = Set(final_price);
        cart_model.updated_at = Set(Utc::now());

        Ok(cart_model.update(conn).await?)
    }
}

/// Input for adding a product to a cart
#[derive(Debug, Clone, Deserialize)]
pub struct AddItemInput {
    pub kind: ProductKind,
    pub product_id: i64,
    pub quantity: i32,
}

/// Cart with its lines
#[derive(Debug, Serialize)]
pub struct CartWithLines {
    pub cart: CartModel,
    pub lines: Vec<cart_line::Model>,
}
