//! 强类型 ID 定义

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            Display, From,
        )]
        #[display("{_0}")]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id!(
    /// 批次 ID
    LotId
);
define_id!(
    /// 物料 ID
    MaterialId
);
define_id!(
    /// 库位 ID
    LocationId
);
define_id!(
    /// 需求行 ID
    DemandLineId
);
define_id!(
    /// 台账分录 ID
    LedgerEntryId
);
define_id!(
    /// 订单 ID
    OrderId
);
define_id!(
    /// 追加订单 ID
    ExtendOrderId
);
define_id!(
    /// 入库单 ID
    ReceiptId
);
define_id!(
    /// 盘点调整单 ID
    AdjustmentId
);
define_id!(
    /// 调拨单 ID
    TransferId
);
define_id!(
    /// 领料单 ID
    WithdrawalId
);
define_id!(
    /// 退料单 ID
    ReturnId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id = LotId::new();
        let parsed: LotId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_ordering_follows_uuid() {
        let a = LotId::from_uuid(Uuid::from_u128(1));
        let b = LotId::from_uuid(Uuid::from_u128(2));
        assert!(a < b);
    }

    #[test]
    fn test_invalid_uuid() {
        assert!("not-a-uuid".parse::<MaterialId>().is_err());
    }
}
