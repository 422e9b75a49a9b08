//! sc-im 运维入口
//!
//! `sc-im [migrate]`：执行数据库迁移
//! `sc-im verify-lot <lot-id>`：校验批次台账链，不一致时以非零状态退出

use std::sync::Arc;
use std::time::Duration;

use cuba_adapter_postgres::{
    MigrationManager, PostgresConfig, TransactionOptions, check_connection, create_pool,
};
use cuba_common::{RetryConfig, with_conditional_retry};
use cuba_config::AppConfig;
use cuba_telemetry::{init_metrics, init_tracing, init_tracing_json};
use secrecy::ExposeSecret;
use tracing::info;

use sc_im::InventoryService;
use sc_im::domain::value_objects::LotId;
use sc_im::infrastructure::persistence::PostgresUnitOfWorkFactory;
use sc_im::infrastructure::persistence::schema;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = std::env::var("SC_IM_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir)?;

    if config.telemetry.json {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }
    let _metrics = init_metrics()?;

    info!(app = %config.app_name, env = %config.app_env, "Starting sc-im");

    // 1. 连接数据库（带重试）
    let pg_config = PostgresConfig::new(config.database.url.expose_secret())
        .with_max_connections(config.database.max_connections)
        .with_min_connections(config.database.min_connections)
        .with_connect_timeout(Duration::from_secs(config.database.connect_timeout_secs));
    let pool = with_conditional_retry(
        &RetryConfig::default(),
        "PostgreSQL connection",
        || {
            let cfg = pg_config.clone();
            async move { create_pool(&cfg).await }
        },
        |_| true,
    )
    .await?;
    check_connection(&pool).await?;
    info!(
        max_connections = config.database.max_connections,
        "PostgreSQL connection pool created"
    );

    // 2. 迁移
    let report = MigrationManager::new(pool.clone())
        .migrate(&schema::migrations())
        .await?;
    info!(
        applied = ?report.applied,
        skipped = report.skipped.len(),
        "Migrations complete"
    );

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("migrate") => Ok(()),
        Some("verify-lot") => {
            let lot_id: LotId = args.next().ok_or("verify-lot requires a lot id")?.parse()?;

            let factory = PostgresUnitOfWorkFactory::new(pool).with_options(
                TransactionOptions::new().with_lock_timeout(config.allocation.lock_timeout()),
            );
            let service = InventoryService::new(Arc::new(factory), &config.allocation);

            let report = service.verify_lot(lot_id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_consistent() {
                Ok(())
            } else {
                Err(format!("Lot {} ledger is inconsistent", lot_id).into())
            }
        }
        Some(other) => Err(format!("Unknown command: {}", other).into()),
    }
}
