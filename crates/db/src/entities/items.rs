//! `SeaORM` Entity for items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub sku: Option<String>,
    pub category: String,
    pub unit_of_measure: String,
    pub quantity: Decimal,
    pub reorder_level: Decimal,
    pub minimum_stock: Decimal,
    pub selling_price: Option<Decimal>,
    pub price_currency: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_history::Entity")]
    StockHistory,
    #[sea_orm(has_many = "super::stock_out_lines::Entity")]
    StockOutLines,
}

impl Related<super::stock_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockHistory.def()
    }
}

impl Related<super::stock_out_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockOutLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
