//! 数据库行映射结构

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// 批次数据库行
#[derive(Debug, FromRow)]
pub struct LotRow {
    pub id: Uuid,
    pub material_id: Uuid,
    pub location_id: Uuid,
    pub source_kind: Option<String>,
    pub source_id: Option<Uuid>,
    pub quantity: i64,
    pub reserve: i64,
    pub available_qty: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// 台账分录数据库行
#[derive(Debug, FromRow)]
pub struct LedgerEntryRow {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub sequence: i64,
    pub quantity_delta: i64,
    pub action: String,
    pub reason: String,
    pub existing_quantity: i64,
    pub existing_reserve: i64,
    pub updated_quantity: i64,
    pub updated_reserve: i64,
    pub reference_kind: Option<String>,
    pub reference_id: Option<Uuid>,
    pub unit_price_amount: Option<i64>,
    pub unit_price_currency: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// 需求行数据库行
#[derive(Debug, FromRow)]
pub struct DemandLineRow {
    pub id: Uuid,
    pub source_kind: String,
    pub source_id: Uuid,
    pub material_id: Uuid,
    pub target_qty: i64,
    pub reserved_qty: i64,
    pub withdrawn_qty: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}
