//! 可选库位范围

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LocationId;

/// 分配时允许消耗的库位范围
///
/// `Only` 携带空集合时不匹配任何库位。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocationScope {
    /// 不限库位
    #[default]
    All,
    /// 仅限给定库位
    Only(BTreeSet<LocationId>),
}

impl LocationScope {
    pub fn only(locations: impl IntoIterator<Item = LocationId>) -> Self {
        LocationScope::Only(locations.into_iter().collect())
    }

    pub fn contains(&self, location_id: &LocationId) -> bool {
        match self {
            LocationScope::All => true,
            LocationScope::Only(set) => set.contains(location_id),
        }
    }

    /// 供 SQL 绑定使用；`None` 表示不过滤
    pub fn location_uuids(&self) -> Option<Vec<Uuid>> {
        match self {
            LocationScope::All => None,
            LocationScope::Only(set) => Some(set.iter().map(LocationId::as_uuid).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_contains_everything() {
        assert!(LocationScope::All.contains(&LocationId::new()));
        assert_eq!(LocationScope::All.location_uuids(), None);
    }

    #[test]
    fn test_only_filters() {
        let a = LocationId::new();
        let b = LocationId::new();
        let scope = LocationScope::only([a]);

        assert!(scope.contains(&a));
        assert!(!scope.contains(&b));
        assert_eq!(scope.location_uuids(), Some(vec![a.as_uuid()]));
    }

    #[test]
    fn test_empty_only_matches_nothing() {
        let scope = LocationScope::only(Vec::new());
        assert!(!scope.contains(&LocationId::new()));
        assert_eq!(scope.location_uuids(), Some(Vec::new()));
    }
}
