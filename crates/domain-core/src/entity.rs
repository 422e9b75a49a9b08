//! 实体基础 trait

use cuba_common::AuditInfo;

/// 实体 trait
pub trait Entity {
    type Id;

    fn id(&self) -> &Self::Id;
}

/// 带乐观版本号的实体
///
/// 每次持久化的变更使版本加一，存储层只接受从 `expected_version()` 出发的更新。
pub trait Versioned: Entity {
    fn version(&self) -> i64;

    /// 本次更新要求存储中的当前版本
    fn expected_version(&self) -> i64 {
        self.version() - 1
    }
}

/// 聚合根 trait
pub trait AggregateRoot: Entity {
    fn audit_info(&self) -> &AuditInfo;
    fn audit_info_mut(&mut self) -> &mut AuditInfo;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        id: u32,
        version: i64,
    }

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    impl Versioned for Row {
        fn version(&self) -> i64 {
            self.version
        }
    }

    #[test]
    fn test_expected_version_is_previous() {
        let row = Row { id: 7, version: 3 };
        assert_eq!(*row.id(), 7);
        assert_eq!(row.expected_version(), 2);
    }
}
