//! 需求来源单据

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{ExtendOrderId, OrderId};

/// 需求行所属的单据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum DemandSource {
    /// 订单
    Order(OrderId),
    /// 追加订单
    ExtendOrder(ExtendOrderId),
}

impl DemandSource {
    pub fn kind(&self) -> &'static str {
        match self {
            DemandSource::Order(_) => "ORDER",
            DemandSource::ExtendOrder(_) => "EXTEND_ORDER",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            DemandSource::Order(id) => id.0,
            DemandSource::ExtendOrder(id) => id.0,
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "ORDER" => Some(DemandSource::Order(id.into())),
            "EXTEND_ORDER" => Some(DemandSource::ExtendOrder(id.into())),
            _ => None,
        }
    }
}
