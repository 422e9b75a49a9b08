//! 数据库行到领域对象的转换

use cuba_domain_core::{AuditInfo, Currency, Money, UserId};
use cuba_errors::{AppError, AppResult};
use uuid::Uuid;

use super::rows::{DemandLineRow, LedgerEntryRow, LotRow};
use crate::domain::entities::{DemandLine, LedgerEntry, Lot};
use crate::domain::enums::{DemandSource, LedgerAction, LedgerReason};
use crate::domain::value_objects::{
    DemandLineId, LedgerEntryId, LedgerReference, LocationId, LotBalance, LotId, MaterialId,
};

fn reference_from_parts(
    kind: Option<String>,
    id: Option<Uuid>,
) -> AppResult<Option<LedgerReference>> {
    match (kind, id) {
        (Some(kind), Some(id)) => LedgerReference::from_parts(&kind, id)
            .map(Some)
            .ok_or_else(|| AppError::internal(format!("Unknown reference kind: {}", kind))),
        (None, None) => Ok(None),
        _ => Err(AppError::internal("Reference kind and id must be set together")),
    }
}

/// 将 LotRow 转换为 Lot
pub fn lot_from_row(row: LotRow) -> AppResult<Lot> {
    let source = reference_from_parts(row.source_kind, row.source_id)?;

    Ok(Lot::restore(
        LotId::from_uuid(row.id),
        MaterialId::from_uuid(row.material_id),
        LocationId::from_uuid(row.location_id),
        source,
        row.quantity,
        row.reserve,
        row.available_qty,
        row.version,
        row.created_at,
    ))
}

/// 将 LedgerEntryRow 转换为 LedgerEntry
pub fn ledger_entry_from_row(row: LedgerEntryRow) -> AppResult<LedgerEntry> {
    let action = LedgerAction::parse(&row.action)
        .ok_or_else(|| AppError::internal(format!("Unknown ledger action: {}", row.action)))?;
    let reason = LedgerReason::parse(&row.reason)
        .ok_or_else(|| AppError::internal(format!("Unknown ledger reason: {}", row.reason)))?;
    let reference = reference_from_parts(row.reference_kind, row.reference_id)?;

    let unit_price = match (row.unit_price_amount, row.unit_price_currency) {
        (Some(amount), Some(code)) => {
            let currency = Currency::new(&code)
                .ok_or_else(|| AppError::internal(format!("Invalid currency: {}", code)))?;
            Some(Money::new(amount, currency))
        }
        _ => None,
    };

    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(row.id),
        lot_id: LotId::from_uuid(row.lot_id),
        sequence: row.sequence,
        quantity_delta: row.quantity_delta,
        action,
        reason,
        existing: LotBalance::new(row.existing_quantity, row.existing_reserve),
        updated: LotBalance::new(row.updated_quantity, row.updated_reserve),
        reference,
        unit_price,
        created_by: row.created_by.map(UserId::from_uuid),
        created_at: row.created_at,
    })
}

/// 将 DemandLineRow 转换为 DemandLine
pub fn demand_line_from_row(row: DemandLineRow) -> AppResult<DemandLine> {
    let source = DemandSource::from_parts(&row.source_kind, row.source_id).ok_or_else(|| {
        AppError::internal(format!("Unknown demand source: {}", row.source_kind))
    })?;

    let audit_info = AuditInfo {
        created_at: row.created_at,
        created_by: row.created_by.map(UserId::from_uuid),
        updated_at: row.updated_at,
        updated_by: row.updated_by.map(UserId::from_uuid),
    };

    Ok(DemandLine::restore(
        DemandLineId::from_uuid(row.id),
        source,
        MaterialId::from_uuid(row.material_id),
        row.target_qty,
        row.reserved_qty,
        row.withdrawn_qty,
        row.version,
        audit_info,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry_row() -> LedgerEntryRow {
        LedgerEntryRow {
            id: Uuid::now_v7(),
            lot_id: Uuid::now_v7(),
            sequence: 2,
            quantity_delta: 20,
            action: "RESERVE".to_string(),
            reason: "ORDER".to_string(),
            existing_quantity: 50,
            existing_reserve: 0,
            updated_quantity: 50,
            updated_reserve: 20,
            reference_kind: Some("DEMAND_LINE".to_string()),
            reference_id: Some(Uuid::now_v7()),
            unit_price_amount: Some(990),
            unit_price_currency: Some("CNY".to_string()),
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_ledger_entry_from_row() {
        let entry = ledger_entry_from_row(entry_row()).unwrap();

        assert_eq!(entry.action, LedgerAction::Reserve);
        assert!(matches!(entry.reference, Some(LedgerReference::DemandLine(_))));
        assert_eq!(entry.unit_price, Some(Money::cny(990)));
        assert!(entry.is_self_consistent());
    }

    #[test]
    fn test_unknown_action_rejected() {
        let mut row = entry_row();
        row.action = "TELEPORT".to_string();
        assert!(matches!(
            ledger_entry_from_row(row),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_half_reference_rejected() {
        let mut row = entry_row();
        row.reference_id = None;
        assert!(ledger_entry_from_row(row).is_err());
    }

    #[test]
    fn test_lot_from_row_derives_stock_flag() {
        let lot = lot_from_row(LotRow {
            id: Uuid::now_v7(),
            material_id: Uuid::now_v7(),
            location_id: Uuid::now_v7(),
            source_kind: Some("RECEIPT".to_string()),
            source_id: Some(Uuid::now_v7()),
            quantity: 10,
            reserve: 10,
            available_qty: 0,
            version: 2,
            created_at: Utc::now(),
        })
        .unwrap();

        assert!(lot.is_out_of_stock());
        assert!(matches!(lot.source(), Some(LedgerReference::Receipt(_))));
    }
}
