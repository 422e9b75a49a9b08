//! 事务内仓储
//!
//! 所有仓储共享同一个事务，由 Unit of Work 统一提交或回滚。

use std::sync::Arc;

use async_trait::async_trait;
use cuba_adapter_postgres::map_sqlx_error;
use cuba_domain_core::{AggregateRoot, Entity, Versioned};
use cuba_errors::{AppError, AppResult};
use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;

use super::converters::{demand_line_from_row, ledger_entry_from_row, lot_from_row};
use super::rows::{DemandLineRow, LedgerEntryRow, LotRow};
use crate::domain::entities::{DemandLine, LedgerEntry, Lot};
use crate::domain::repositories::{
    DemandLineRepository, LedgerRepository, LotRepository, MaterialRepository,
};
use crate::domain::value_objects::{DemandLineId, LocationScope, LotId, MaterialId};

/// Shared transaction type
pub type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

macro_rules! define_tx_repo {
    ($name:ident) => {
        pub struct $name {
            tx: SharedTx,
        }

        impl $name {
            pub fn new(tx: SharedTx) -> Self {
                Self { tx }
            }
        }
    };
}

define_tx_repo!(TxLotRepository);
define_tx_repo!(TxLedgerRepository);
define_tx_repo!(TxDemandLineRepository);
define_tx_repo!(TxMaterialRepository);

const LOT_COLUMNS: &str = "id, material_id, location_id, source_kind, source_id, quantity, \
     reserve, available_qty, version, created_at";

const DEMAND_LINE_COLUMNS: &str = "id, source_kind, source_id, material_id, target_qty, \
     reserved_qty, withdrawn_qty, version, created_at, created_by, updated_at, updated_by";

#[async_trait]
impl LotRepository for TxLotRepository {
    async fn find_by_id(&self, id: &LotId) -> AppResult<Option<Lot>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let sql = format!("SELECT {} FROM lots WHERE id = $1", LOT_COLUMNS);
        let row = sqlx::query_as::<_, LotRow>(&sql)
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(lot_from_row).transpose()
    }

    async fn find_available(
        &self,
        material_id: &MaterialId,
        scope: &LocationScope,
    ) -> AppResult<Vec<Lot>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        // 所有分配按同一全局顺序加行锁，避免交叉死锁
        let sql = format!(
            r#"
            SELECT {}
            FROM lots
            WHERE material_id = $1
              AND is_out_of_stock = FALSE
              AND ($2::uuid[] IS NULL OR location_id = ANY($2))
            ORDER BY created_at ASC, id ASC
            FOR UPDATE
            "#,
            LOT_COLUMNS
        );
        let rows = sqlx::query_as::<_, LotRow>(&sql)
            .bind(material_id.0)
            .bind(scope.location_uuids())
            .fetch_all(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(lot_from_row).collect()
    }

    async fn insert(&self, lot: &Lot) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        sqlx::query(
            r#"
            INSERT INTO lots (id, material_id, location_id, source_kind, source_id, quantity,
                              reserve, available_qty, is_out_of_stock, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(lot.id().0)
        .bind(lot.material_id().0)
        .bind(lot.location_id().0)
        .bind(lot.source().map(|s| s.kind()))
        .bind(lot.source().map(|s| s.id()))
        .bind(lot.quantity())
        .bind(lot.reserve())
        .bind(lot.available_qty())
        .bind(lot.is_out_of_stock())
        .bind(lot.version())
        .bind(lot.created_at())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(&self, lot: &Lot) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let result = sqlx::query(
            r#"
            UPDATE lots
            SET quantity = $2, reserve = $3, available_qty = $4, is_out_of_stock = $5, version = $6
            WHERE id = $1 AND version = $7
            "#,
        )
        .bind(lot.id().0)
        .bind(lot.quantity())
        .bind(lot.reserve())
        .bind(lot.available_qty())
        .bind(lot.is_out_of_stock())
        .bind(lot.version())
        .bind(lot.expected_version())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::concurrency_conflict(format!(
                "Lot {} was modified concurrently (expected version {})",
                lot.id(),
                lot.expected_version()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for TxLedgerRepository {
    async fn append(&self, entry: &LedgerEntry) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (id, lot_id, sequence, quantity_delta, action, reason,
                                        existing_quantity, existing_reserve,
                                        updated_quantity, updated_reserve,
                                        reference_kind, reference_id,
                                        unit_price_amount, unit_price_currency,
                                        created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(entry.id.0)
        .bind(entry.lot_id.0)
        .bind(entry.sequence)
        .bind(entry.quantity_delta)
        .bind(entry.action.as_str())
        .bind(entry.reason.as_str())
        .bind(entry.existing.quantity)
        .bind(entry.existing.reserve)
        .bind(entry.updated.quantity)
        .bind(entry.updated.reserve)
        .bind(entry.reference.map(|r| r.kind()))
        .bind(entry.reference.map(|r| r.id()))
        .bind(entry.unit_price.as_ref().map(|p| p.amount))
        .bind(entry.unit_price.as_ref().map(|p| p.currency.code().to_string()))
        .bind(entry.created_by.as_ref().map(|u| u.0))
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| match map_sqlx_error(e) {
            // (lot_id, sequence) 唯一约束：另一事务已写入同一序号
            AppError::Conflict(msg) => AppError::concurrency_conflict(msg),
            other => other,
        })?;

        Ok(())
    }

    async fn list_by_lot(&self, lot_id: &LotId) -> AppResult<Vec<LedgerEntry>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            SELECT id, lot_id, sequence, quantity_delta, action, reason,
                   existing_quantity, existing_reserve, updated_quantity, updated_reserve,
                   reference_kind, reference_id, unit_price_amount, unit_price_currency,
                   created_by, created_at
            FROM ledger_entries
            WHERE lot_id = $1
            ORDER BY sequence ASC
            "#,
        )
        .bind(lot_id.0)
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(ledger_entry_from_row).collect()
    }
}

#[async_trait]
impl DemandLineRepository for TxDemandLineRepository {
    async fn find_by_id(&self, id: &DemandLineId) -> AppResult<Option<DemandLine>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let sql = format!(
            "SELECT {} FROM demand_lines WHERE id = $1",
            DEMAND_LINE_COLUMNS
        );
        let row = sqlx::query_as::<_, DemandLineRow>(&sql)
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(demand_line_from_row).transpose()
    }

    async fn find_for_update(&self, id: &DemandLineId) -> AppResult<Option<DemandLine>> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let sql = format!(
            "SELECT {} FROM demand_lines WHERE id = $1 FOR UPDATE",
            DEMAND_LINE_COLUMNS
        );
        let row = sqlx::query_as::<_, DemandLineRow>(&sql)
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(demand_line_from_row).transpose()
    }

    async fn insert(&self, line: &DemandLine) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let audit = line.audit_info();
        sqlx::query(
            r#"
            INSERT INTO demand_lines (id, source_kind, source_id, material_id, target_qty,
                                      reserved_qty, withdrawn_qty, is_full_filled,
                                      is_completely_withdraw, version,
                                      created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(line.id().0)
        .bind(line.source().kind())
        .bind(line.source().id())
        .bind(line.material_id().0)
        .bind(line.target_qty())
        .bind(line.reserved_qty())
        .bind(line.withdrawn_qty())
        .bind(line.is_full_filled())
        .bind(line.is_completely_withdraw())
        .bind(line.version())
        .bind(audit.created_at)
        .bind(audit.created_by.as_ref().map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|u| u.0))
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(&self, line: &DemandLine) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let audit = line.audit_info();
        let result = sqlx::query(
            r#"
            UPDATE demand_lines
            SET reserved_qty = $2, withdrawn_qty = $3, is_full_filled = $4,
                is_completely_withdraw = $5, version = $6, updated_at = $7, updated_by = $8
            WHERE id = $1 AND version = $9
            "#,
        )
        .bind(line.id().0)
        .bind(line.reserved_qty())
        .bind(line.withdrawn_qty())
        .bind(line.is_full_filled())
        .bind(line.is_completely_withdraw())
        .bind(line.version())
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|u| u.0))
        .bind(line.expected_version())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::concurrency_conflict(format!(
                "Demand line {} was modified concurrently (expected version {})",
                line.id(),
                line.expected_version()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MaterialRepository for TxMaterialRepository {
    async fn exists(&self, id: &MaterialId) -> AppResult<bool> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM materials WHERE id = $1)")
                .bind(id.0)
                .fetch_one(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;

        Ok(exists)
    }
}
