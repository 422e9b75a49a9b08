//! 下达需求命令

use cuba_cqrs_core::Command;
use cuba_domain_core::UserId;
use cuba_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::entities::DemandLine;
use crate::domain::enums::DemandSource;
use crate::domain::value_objects::MaterialId;

/// 为订单或追加订单登记一条需求行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceDemandCommand {
    pub actor: UserId,
    pub source: DemandSource,
    pub material_id: MaterialId,
    pub target_qty: i64,
}

impl PlaceDemandCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.target_qty <= 0 {
            return Err(AppError::validation(format!(
                "Target quantity must be positive, got {}",
                self.target_qty
            )));
        }
        Ok(())
    }
}

impl Command for PlaceDemandCommand {
    type Result = DemandLine;
}
