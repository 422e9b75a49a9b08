//! 数据库结构迁移

use cuba_adapter_postgres::Migration;

/// 按版本排列的全部迁移
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(
        1,
        "create_inventory_tables",
        include_str!("../../../migrations/0001_create_inventory_tables.sql"),
    )]
}
