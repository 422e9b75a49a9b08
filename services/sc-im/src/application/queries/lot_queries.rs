//! 批次查询

use cuba_cqrs_core::Query;
use serde::{Deserialize, Serialize};

use crate::domain::entities::LedgerEntry;
use crate::domain::services::ChainReport;
use crate::domain::value_objects::LotId;

/// 按序号返回批次台账
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetLotLedgerQuery {
    pub lot_id: LotId,
}

impl Query for GetLotLedgerQuery {
    type Result = Vec<LedgerEntry>;
}

/// 校验批次台账链并重放余额
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyLotQuery {
    pub lot_id: LotId,
}

impl Query for VerifyLotQuery {
    type Result = ChainReport;
}
