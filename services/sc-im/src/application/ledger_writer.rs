//! 台账写入
//!
//! 每一次批次变动必须和它的分录在同一个工作单元内一起落库。

use cuba_domain_core::Entity;
use cuba_errors::{AppError, AppResult};

use crate::domain::entities::{LedgerEntry, Lot};
use crate::domain::unit_of_work::UnitOfWork;

#[derive(Debug, Default, Clone, Copy)]
pub struct LedgerWriter;

impl LedgerWriter {
    /// 新建批次及其首条分录
    pub async fn write_new_lot(
        &self,
        uow: &dyn UnitOfWork,
        lot: &Lot,
        entry: &LedgerEntry,
    ) -> AppResult<()> {
        ensure_pair(lot, entry)?;
        uow.lots().insert(lot).await?;
        uow.ledger().append(entry).await
    }

    /// 已有批次的一次变动
    pub async fn write_mutation(
        &self,
        uow: &dyn UnitOfWork,
        lot: &Lot,
        entry: &LedgerEntry,
    ) -> AppResult<()> {
        ensure_pair(lot, entry)?;
        uow.lots().update(lot).await?;
        uow.ledger().append(entry).await
    }
}

/// 分录必须恰好描述批次的这次变动
fn ensure_pair(lot: &Lot, entry: &LedgerEntry) -> AppResult<()> {
    if entry.lot_id != *lot.id() {
        return Err(AppError::internal(format!(
            "Ledger entry {} belongs to lot {}, not {}",
            entry.id,
            entry.lot_id,
            lot.id()
        )));
    }
    if entry.sequence != lot.version() || entry.updated != lot.balance() {
        return Err(AppError::internal(format!(
            "Ledger entry {} does not match lot {} at version {}",
            entry.id,
            lot.id(),
            lot.version()
        )));
    }
    if !entry.is_self_consistent() {
        return Err(AppError::internal(format!(
            "Ledger entry {} delta does not explain its snapshots",
            entry.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::LedgerCause;
    use crate::domain::enums::{LedgerAction, LedgerReason};
    use crate::domain::value_objects::{LocationId, LotBalance, MaterialId};

    fn incoming(lot: &Lot) -> LedgerEntry {
        LedgerEntry::record(
            lot,
            LotBalance::ZERO,
            lot.quantity(),
            LedgerCause::new(LedgerAction::Incoming, LedgerReason::Receipt, None),
        )
    }

    #[test]
    fn test_pair_accepted() {
        let lot = Lot::receive(MaterialId::new(), LocationId::new(), 10, None).unwrap();
        assert!(ensure_pair(&lot, &incoming(&lot)).is_ok());
    }

    #[test]
    fn test_stale_entry_rejected() {
        let mut lot = Lot::receive(MaterialId::new(), LocationId::new(), 10, None).unwrap();
        let entry = incoming(&lot);
        lot.reserve_units(1).unwrap();

        assert!(matches!(
            ensure_pair(&lot, &entry),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_foreign_entry_rejected() {
        let lot = Lot::receive(MaterialId::new(), LocationId::new(), 10, None).unwrap();
        let other = Lot::receive(MaterialId::new(), LocationId::new(), 10, None).unwrap();

        assert!(ensure_pair(&lot, &incoming(&other)).is_err());
    }
}
