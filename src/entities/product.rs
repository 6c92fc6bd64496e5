use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Catalog product entity. All variant kinds share this row shape; the
/// kind-specific attribute set lives in the `specs` JSON column as a tagged
/// union, discriminated by `kind`.
///
/// Recency queries rely on the auto-increment primary key: a larger id means
/// a later insertion.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(nullable)]
    pub category_id: Option<i32>,
    pub kind: ProductKind,
    pub title: String,
    pub slug: String,
    #[sea_orm(nullable)]
    pub image: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((9, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Json")]
    pub specs: ProductSpecs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Display route for this product, keyed by (kind, slug).
    pub fn detail_url(&self) -> String {
        detail_url(self.kind, &self.slug)
    }
}

/// Pure derivation of the display route for a (kind, slug) pair.
pub fn detail_url(kind: ProductKind, slug: &str) -> String {
    format!("/products/{}/{}", kind, slug)
}

/// The closed set of product variant kinds. Adding a kind means adding a
/// variant here and in [`ProductSpecs`], not a runtime schema change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::EnumString,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductKind {
    #[sea_orm(string_value = "notebook")]
    Notebook,
    #[sea_orm(string_value = "smartphone")]
    Smartphone,
    #[sea_orm(string_value = "console")]
    Console,
    #[sea_orm(string_value = "ps3game")]
    Ps3Game,
    #[sea_orm(string_value = "ps4game")]
    Ps4Game,
    #[sea_orm(string_value = "graphicscard")]
    GraphicsCard,
}

/// Kind-specific attribute sets, stored in the product's JSON column.
/// The serde tag mirrors the `kind` column; [`ProductSpecs::kind`] is the
/// source of truth when creating a product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProductSpecs {
    Notebook(NotebookSpecs),
    Smartphone(SmartphoneSpecs),
    Console(ConsoleSpecs),
    Ps3Game(GameSpecs),
    Ps4Game(GameSpecs),
    GraphicsCard(GraphicsCardSpecs),
}

impl ProductSpecs {
    /// The variant kind these specs describe.
    pub fn kind(&self) -> ProductKind {
        match self {
            Self::Notebook(_) => ProductKind::Notebook,
            Self::Smartphone(_) => ProductKind::Smartphone,
            Self::Console(_) => ProductKind::Console,
            Self::Ps3Game(_) => ProductKind::Ps3Game,
            Self::Ps4Game(_) => ProductKind::Ps4Game,
            Self::GraphicsCard(_) => ProductKind::GraphicsCard,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NotebookSpecs {
    pub diagonal_in: Decimal,
    pub display_type: String,
    pub display_resolution: String,
    pub processor_name: String,
    pub processor_freq_ghz: Decimal,
    pub processor_cores: u8,
    pub ram_gb: u16,
    pub video_name: String,
    pub video_memory_gb: u16,
    pub battery_hours: Decimal,
    pub storage_gb: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SmartphoneSpecs {
    pub diagonal_in: Decimal,
    pub display_type: String,
    pub display_resolution: String,
    pub processor_name: String,
    pub processor_freq_ghz: Decimal,
    pub processor_cores: u8,
    pub video_name: String,
    pub battery_mah: u32,
    pub ram_gb: u16,
    pub sd_slot: bool,
    pub storage_gb: u32,
    pub main_cam_mp: u16,
    pub frontal_cam_mp: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleSpecs {
    pub generation: String,
    pub manufacturer: String,
    pub year: u16,
}

/// Age-rated media; shared by the PS3 and PS4 game kinds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSpecs {
    pub age_rating: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphicsCardSpecs {
    pub chip_name: String,
    pub vram_gb: u16,
    pub vram_type: String,
    pub bus_width_bits: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kind_parses_from_route_segment() {
        assert_eq!(
            ProductKind::from_str("notebook").unwrap(),
            ProductKind::Notebook
        );
        assert_eq!(
            ProductKind::from_str("graphicscard").unwrap(),
            ProductKind::GraphicsCard
        );
        assert!(ProductKind::from_str("toaster").is_err());
    }

    #[test]
    fn kind_display_round_trips() {
        for kind in [
            ProductKind::Notebook,
            ProductKind::Smartphone,
            ProductKind::Console,
            ProductKind::Ps3Game,
            ProductKind::Ps4Game,
            ProductKind::GraphicsCard,
        ] {
            let parsed = ProductKind::from_str(&kind.to_string()).unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn specs_tag_matches_kind() {
        let specs = ProductSpecs::Ps4Game(GameSpecs {
            age_rating: "18+".to_string(),
        });
        assert_eq!(specs.kind(), ProductKind::Ps4Game);

        let json = serde_json::to_value(&specs).unwrap();
        assert_eq!(json["kind"], "ps4game");
        assert_eq!(json["age_rating"], "18+");

        let back: ProductSpecs = serde_json::from_value(json).unwrap();
        assert_eq!(back, specs);
    }

    #[test]
    fn detail_url_is_kind_and_slug_keyed() {
        assert_eq!(
            detail_url(ProductKind::Smartphone, "pixel-9"),
            "/products/smartphone/pixel-9"
        );
    }
}
