//! 批次仓储接口

use async_trait::async_trait;
use cuba_errors::AppResult;

use crate::domain::entities::Lot;
use crate::domain::value_objects::{LocationScope, LotId, MaterialId};

/// 批次仓储
///
/// 写入采用版本校验：`update` 要求库中版本等于 `lot.version() - 1`，
/// 否则返回 `ConcurrencyConflict`。
#[async_trait]
pub trait LotRepository: Send + Sync {
    async fn find_by_id(&self, id: &LotId) -> AppResult<Option<Lot>>;

    /// 查询并锁定指定物料、库位范围内仍有可用数量的批次
    async fn find_available(
        &self,
        material_id: &MaterialId,
        scope: &LocationScope,
    ) -> AppResult<Vec<Lot>>;

    async fn insert(&self, lot: &Lot) -> AppResult<()>;

    async fn update(&self, lot: &Lot) -> AppResult<()>;
}
