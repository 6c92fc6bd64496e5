use crate::{
    entities::{product, Product, ProductKind, ProductModel, ProductSpecs},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// How many items per kind the landing-page aggregation fetches.
const LATEST_PER_KIND: u64 = 5;

/// Product catalog: kind+slug keyed lookups and the cross-kind
/// latest-products aggregation for the landing page.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Exact lookup by (kind, slug). Slugs are only unique within a kind, so
    /// both parts key the query.
    #[instrument(skip(self))]
    pub async fn get_by_slug(
        &self,
        kind: ProductKind,
        slug: &str,
    ) -> Result<ProductModel, ServiceError> {
        Product::find()
            .filter(product::Column::Kind.eq(kind))
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No {} with slug '{}'", kind, slug)))
    }

    /// Recent items across several kinds, merged for the landing page.
    ///
    /// Fetches the 5 most recent items per kind (descending id) and
    /// concatenates them in `kinds` order; there is no cross-kind recency
    /// interleave. When `prioritize` names a member of `kinds`, items of
    /// that kind move to the front with relative order preserved; any other
    /// `prioritize` value leaves the sequence untouched.
    #[instrument(skip(self))]
    pub async fn latest(
        &self,
        kinds: &[ProductKind],
        prioritize: Option<ProductKind>,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        let mut products = Vec::new();
        for kind in kinds {
            let mut batch = Product::find()
                .filter(product::Column::Kind.eq(*kind))
                .order_by_desc(product::Column::Id)
                .limit(LATEST_PER_KIND)
                .all(&*self.db)
                .await?;
            products.append(&mut batch);
        }

        if let Some(front) = prioritize {
            if kinds.contains(&front) {
                move_kind_to_front(&mut products, front);
            }
        }

        Ok(products)
    }

    /// Creates a product. The variant kind is taken from the specs, so the
    /// kind column and the specs tag cannot disagree.
    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let kind = input.specs.kind();
        self.ensure_unique_slug(kind, &input.slug).await?;

        let now = Utc::now();
        let prod = product::ActiveModel {
            id: NotSet,
            category_id: Set(input.category_id),
            kind: Set(kind),
            title: Set(input.title),
            slug: Set(input.slug),
            image: Set(input.image),
            description: Set(input.description),
            price: Set(input.price),
            specs: Set(input.specs),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let prod = prod.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated {
                kind,
                product_id: prod.id,
            })
            .await;

        info!("Created {} product: {} ({})", kind, prod.id, prod.slug);
        Ok(prod)
    }

    async fn ensure_unique_slug(&self, kind: ProductKind, slug: &str) -> Result<(), ServiceError> {
        let existing = Product::find()
            .filter(product::Column::Kind.eq(kind))
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "A {} with slug '{}' already exists",
                kind, slug
            )));
        }

        Ok(())
    }
}

/// Stable partition: items of `kind` move to the front, relative order is
/// preserved on both sides. Not a recency sort.
fn move_kind_to_front(products: &mut [ProductModel], kind: ProductKind) {
    products.sort_by_key(|p| p.kind != kind);
}

/// Input for creating a product
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateProductInput {
    pub category_id: Option<i32>,
    pub title: String,
    pub slug: String,
    pub image: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub specs: ProductSpecs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::product::GameSpecs;
    use rust_decimal_macros::dec;

    fn sample(id: i64, kind: ProductKind) -> ProductModel {
        ProductModel {
            id,
            category_id: None,
            kind,
            title: format!("item-{}", id),
            slug: format!("item-{}", id),
            image: None,
            description: String::new(),
            price: dec!(10.00),
            specs: ProductSpecs::Ps3Game(GameSpecs::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn partition_moves_kind_to_front_preserving_order() {
        let mut products = vec![
            sample(5, ProductKind::Notebook),
            sample(4, ProductKind::Notebook),
            sample(12, ProductKind::Smartphone),
            sample(11, ProductKind::Smartphone),
            sample(10, ProductKind::Smartphone),
        ];

        move_kind_to_front(&mut products, ProductKind::Smartphone);

        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![12, 11, 10, 5, 4]);
    }

    #[test]
    fn partition_is_stable_within_both_groups() {
        let mut products = vec![
            sample(1, ProductKind::Console),
            sample(2, ProductKind::Ps4Game),
            sample(3, ProductKind::Console),
            sample(4, ProductKind::Ps4Game),
        ];

        move_kind_to_front(&mut products, ProductKind::Ps4Game);

        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn partition_with_absent_kind_is_a_no_op() {
        let mut products = vec![
            sample(1, ProductKind::Console),
            sample(2, ProductKind::Notebook),
        ];

        move_kind_to_front(&mut products, ProductKind::GraphicsCard);

        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
