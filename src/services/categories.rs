use crate::{
    entities::{category, product, Category, CategoryModel, Product, ProductKind},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Category registry: sluggable product groupings with live per-kind counts
/// for navigation.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Every category with its display URL and a live count of the products
    /// of the category's configured variant kind. A category with no
    /// configured kind reports zero rather than erroring.
    #[instrument(skip(self))]
    pub async fn list_for_sidebar(&self) -> Result<Vec<CategorySummary>, ServiceError> {
        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;

        let mut summaries = Vec::with_capacity(categories.len());
        for cat in categories {
            let count = match cat.product_kind {
                Some(kind) => {
                    Product::find()
                        .filter(product::Column::CategoryId.eq(cat.id))
                        .filter(product::Column::Kind.eq(kind))
                        .count(&*self.db)
                        .await?
                }
                None => 0,
            };

            summaries.push(CategorySummary {
                name: cat.name.clone(),
                url: cat.url(),
                count,
            });
        }

        Ok(summaries)
    }

    /// Creates a category. Name and slug must both be unique.
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        let conflict = Category::find()
            .filter(
                category::Column::Name
                    .eq(&input.name)
                    .or(category::Column::Slug.eq(&input.slug)),
            )
            .one(&*self.db)
            .await?;

        if conflict.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Category with name '{}' or slug '{}' already exists",
                input.name, input.slug
            )));
        }

        let cat = category::ActiveModel {
            name: Set(input.name),
            slug: Set(input.slug),
            product_kind: Set(input.product_kind),
            ..Default::default()
        };

        let cat = cat.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(cat.id))
            .await;

        info!("Created category: {} ({})", cat.id, cat.slug);
        Ok(cat)
    }

    /// Category lookup by slug.
    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryModel, ServiceError> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category '{}' not found", slug)))
    }
}

/// Sidebar entry for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub url: String,
    pub count: u64,
}

/// Input for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub slug: String,
    pub product_kind: Option<ProductKind>,
}
