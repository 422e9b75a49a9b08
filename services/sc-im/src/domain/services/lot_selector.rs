//! 批次选择：先进先出

use cuba_domain_core::Entity;
use cuba_errors::AppResult;

use crate::domain::entities::Lot;
use crate::domain::repositories::LotRepository;
use crate::domain::value_objects::{LocationScope, MaterialId};

/// 按先进先出排好序的候选批次，只能消费一次
#[derive(Debug)]
pub struct LotSequence {
    lots: std::vec::IntoIter<Lot>,
}

impl LotSequence {
    /// 过滤掉缺货、物料或库位不符的批次，再按 (created_at, id) 升序排列
    pub fn from_candidates(
        candidates: Vec<Lot>,
        material_id: &MaterialId,
        scope: &LocationScope,
    ) -> Self {
        let mut lots: Vec<Lot> = candidates
            .into_iter()
            .filter(|lot| {
                !lot.is_out_of_stock()
                    && lot.material_id() == material_id
                    && scope.contains(lot.location_id())
            })
            .collect();
        lots.sort_by_key(Lot::fifo_key);

        Self {
            lots: lots.into_iter(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.len() == 0
    }
}

impl Iterator for LotSequence {
    type Item = Lot;

    fn next(&mut self) -> Option<Self::Item> {
        self.lots.next()
    }
}

/// 批次选择器
#[derive(Debug, Default, Clone, Copy)]
pub struct LotSelector;

impl LotSelector {
    /// 在当前工作单元内取得候选批次
    ///
    /// 仓储按同样的全局顺序加锁；这里再排一次序，保证任意存储实现下结果一致。
    pub async fn select(
        &self,
        lots: &dyn LotRepository,
        material_id: &MaterialId,
        scope: &LocationScope,
    ) -> AppResult<LotSequence> {
        let candidates = lots.find_available(material_id, scope).await?;
        let sequence = LotSequence::from_candidates(candidates, material_id, scope);

        tracing::debug!(
            material_id = %material_id,
            candidates = sequence.remaining(),
            "Lots selected"
        );
        Ok(sequence)
    }
}
