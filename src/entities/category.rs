use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::product::ProductKind;

/// Product category. `product_kind` names the variant kind this category
/// aggregates for sidebar counting; a category without one simply counts
/// zero.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(nullable)]
    pub product_kind: Option<ProductKind>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Display route for this category.
    pub fn url(&self) -> String {
        format!("/categories/{}", self.slug)
    }
}
