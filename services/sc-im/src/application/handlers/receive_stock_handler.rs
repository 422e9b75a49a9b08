//! 入库建批处理器

use std::sync::Arc;

use async_trait::async_trait;
use cuba_cqrs_core::CommandHandler;
use cuba_domain_core::Entity;
use cuba_errors::{AppError, AppResult};
use tracing::info;

use super::finish;
use crate::application::commands::{ReceiveStockCommand, ReceiveStockResult};
use crate::application::ledger_writer::LedgerWriter;
use crate::domain::entities::{LedgerCause, LedgerEntry, Lot};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::LotBalance;

pub struct ReceiveStockHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    writer: LedgerWriter,
}

impl ReceiveStockHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            uow_factory,
            writer: LedgerWriter,
        }
    }

    async fn receive(
        &self,
        uow: &dyn UnitOfWork,
        command: &ReceiveStockCommand,
    ) -> AppResult<ReceiveStockResult> {
        if !uow.materials().exists(&command.material_id).await? {
            return Err(AppError::not_found(format!(
                "Material {} not found",
                command.material_id
            )));
        }

        let reference = command.source.reference();
        let (action, reason) = command.source.ledger_tags();

        let lot = Lot::receive(
            command.material_id,
            command.location_id,
            command.quantity,
            Some(reference),
        )?;
        let entry = LedgerEntry::record(
            &lot,
            LotBalance::ZERO,
            command.quantity,
            LedgerCause::new(action, reason, Some(reference)),
        )
        .with_unit_price(command.unit_price.clone())
        .with_created_by(Some(command.actor.clone()));

        self.writer.write_new_lot(uow, &lot, &entry).await?;
        Ok(ReceiveStockResult { lot, entry })
    }
}

#[async_trait]
impl CommandHandler<ReceiveStockCommand> for ReceiveStockHandler {
    async fn handle(&self, command: ReceiveStockCommand) -> AppResult<ReceiveStockResult> {
        command.validate()?;

        let uow = self.uow_factory.begin().await?;
        let result = self.receive(uow.as_ref(), &command).await;
        let result = finish(uow, result).await?;

        info!(
            lot_id = %result.lot.id(),
            material_id = %command.material_id,
            location_id = %command.location_id,
            quantity = command.quantity,
            action = %result.entry.action,
            "Stock received"
        );
        Ok(result)
    }
}
