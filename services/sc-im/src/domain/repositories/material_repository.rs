//! 物料查找接口（物料主数据由其他服务维护）

use async_trait::async_trait;
use cuba_errors::AppResult;

use crate::domain::value_objects::MaterialId;

#[async_trait]
pub trait MaterialRepository: Send + Sync {
    async fn exists(&self, id: &MaterialId) -> AppResult<bool>;
}
