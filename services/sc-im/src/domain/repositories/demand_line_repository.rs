//! 需求行仓储接口

use async_trait::async_trait;
use cuba_errors::AppResult;

use crate::domain::entities::DemandLine;
use crate::domain::value_objects::DemandLineId;

/// 需求行仓储
#[async_trait]
pub trait DemandLineRepository: Send + Sync {
    async fn find_by_id(&self, id: &DemandLineId) -> AppResult<Option<DemandLine>>;

    /// 读取并锁定，直到事务结束
    async fn find_for_update(&self, id: &DemandLineId) -> AppResult<Option<DemandLine>>;

    async fn insert(&self, line: &DemandLine) -> AppResult<()>;

    /// 版本校验同 `LotRepository::update`
    async fn update(&self, line: &DemandLine) -> AppResult<()>;
}
