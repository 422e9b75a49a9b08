//! 批次实体

use chrono::{DateTime, Utc};
use cuba_domain_core::{Entity, Versioned};
use cuba_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{LedgerReference, LocationId, LotBalance, LotId, MaterialId};

/// 批次：某物料在某库位的一次入库
///
/// `version` 等于该批次已写入的台账分录条数，每次变动加一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    id: LotId,
    material_id: MaterialId,
    location_id: LocationId,
    source: Option<LedgerReference>,
    quantity: i64,
    reserve: i64,
    available_qty: i64,
    is_out_of_stock: bool,
    version: i64,
    created_at: DateTime<Utc>,
}

impl Lot {
    /// 入库建批
    pub fn receive(
        material_id: MaterialId,
        location_id: LocationId,
        quantity: i64,
        source: Option<LedgerReference>,
    ) -> AppResult<Self> {
        if quantity <= 0 {
            return Err(AppError::validation(format!(
                "Inbound quantity must be positive, got {}",
                quantity
            )));
        }

        Ok(Self {
            id: LotId::new(),
            material_id,
            location_id,
            source,
            quantity,
            reserve: 0,
            available_qty: quantity,
            is_out_of_stock: false,
            version: 1,
            created_at: Utc::now(),
        })
    }

    /// 从持久化状态重建；缺货标记按可用数量重新推导
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: LotId,
        material_id: MaterialId,
        location_id: LocationId,
        source: Option<LedgerReference>,
        quantity: i64,
        reserve: i64,
        available_qty: i64,
        version: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            material_id,
            location_id,
            source,
            quantity,
            reserve,
            available_qty,
            is_out_of_stock: available_qty == 0,
            version,
            created_at,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_id(mut self, id: LotId) -> Self {
        self.id = id;
        self
    }

    pub fn material_id(&self) -> &MaterialId {
        &self.material_id
    }

    pub fn location_id(&self) -> &LocationId {
        &self.location_id
    }

    pub fn source(&self) -> Option<&LedgerReference> {
        self.source.as_ref()
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn reserve(&self) -> i64 {
        self.reserve
    }

    pub fn available_qty(&self) -> i64 {
        self.available_qty
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.is_out_of_stock
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn balance(&self) -> LotBalance {
        LotBalance::new(self.quantity, self.reserve)
    }

    /// 先进先出排序键
    pub fn fifo_key(&self) -> (DateTime<Utc>, LotId) {
        (self.created_at, self.id)
    }

    /// 从可用数量中预留 `take`，返回变动前的余额
    pub fn reserve_units(&mut self, take: i64) -> AppResult<LotBalance> {
        if take <= 0 {
            return Err(AppError::validation(format!(
                "Reservation must be positive, got {}",
                take
            )));
        }
        if take > self.available_qty {
            return Err(AppError::invalid_state(format!(
                "Lot {} has {} available, cannot reserve {}",
                self.id, self.available_qty, take
            )));
        }

        let before = self.balance();
        self.available_qty -= take;
        self.reserve += take;
        self.is_out_of_stock = self.available_qty == 0;
        self.version += 1;
        Ok(before)
    }
}

impl Entity for Lot {
    type Id = LotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for Lot {
    fn version(&self) -> i64 {
        self.version
    }
}
