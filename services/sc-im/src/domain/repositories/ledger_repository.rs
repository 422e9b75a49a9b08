//! 台账仓储接口

use async_trait::async_trait;
use cuba_errors::AppResult;

use crate::domain::entities::LedgerEntry;
use crate::domain::value_objects::LotId;

/// 台账仓储，只追加
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// 追加分录；同一批次的序号重复视为并发冲突
    async fn append(&self, entry: &LedgerEntry) -> AppResult<()>;

    /// 按序号升序返回批次的全部分录
    async fn list_by_lot(&self, lot_id: &LotId) -> AppResult<Vec<LedgerEntry>>;
}
