//! 下达需求处理器

use std::sync::Arc;

use async_trait::async_trait;
use cuba_cqrs_core::CommandHandler;
use cuba_domain_core::Entity;
use cuba_errors::{AppError, AppResult};
use tracing::info;

use super::finish;
use crate::application::commands::PlaceDemandCommand;
use crate::domain::entities::DemandLine;
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

pub struct PlaceDemandHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl PlaceDemandHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    async fn place(
        &self,
        uow: &dyn UnitOfWork,
        command: &PlaceDemandCommand,
    ) -> AppResult<DemandLine> {
        if !uow.materials().exists(&command.material_id).await? {
            return Err(AppError::not_found(format!(
                "Material {} not found",
                command.material_id
            )));
        }

        let line = DemandLine::new(
            command.source,
            command.material_id,
            command.target_qty,
            Some(command.actor.clone()),
        )?;
        uow.demand_lines().insert(&line).await?;
        Ok(line)
    }
}

#[async_trait]
impl CommandHandler<PlaceDemandCommand> for PlaceDemandHandler {
    async fn handle(&self, command: PlaceDemandCommand) -> AppResult<DemandLine> {
        command.validate()?;

        let uow = self.uow_factory.begin().await?;
        let result = self.place(uow.as_ref(), &command).await;
        let line = finish(uow, result).await?;

        info!(
            demand_line_id = %line.id(),
            source = command.source.kind(),
            target_qty = command.target_qty,
            "Demand line placed"
        );
        Ok(line)
    }
}
