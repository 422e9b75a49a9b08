//! 集成测试公共夹具

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use cuba_config::AllocationConfig;
use cuba_domain_core::{Entity, UserId};

use sc_im::InventoryService;
use sc_im::application::commands::{AllocateStockCommand, AllocationLine, PlaceDemandCommand};
use sc_im::application::ledger_writer::LedgerWriter;
use sc_im::domain::entities::{DemandLine, LedgerCause, LedgerEntry, Lot};
use sc_im::domain::enums::{DemandSource, LedgerAction, LedgerReason};
use sc_im::domain::unit_of_work::UnitOfWorkFactory;
use sc_im::domain::value_objects::{
    DemandLineId, LedgerReference, LocationId, LocationScope, LotBalance, MaterialId, OrderId,
    ReceiptId,
};
use sc_im::infrastructure::persistence::{InMemoryStore, InMemoryUnitOfWorkFactory};

pub struct Fixture {
    pub factory: Arc<InMemoryUnitOfWorkFactory>,
    pub service: InventoryService,
    pub actor: UserId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_attempts(3)
    }

    pub fn with_attempts(max_attempts: u32) -> Self {
        let factory = Arc::new(InMemoryUnitOfWorkFactory::new());
        let config = AllocationConfig {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            ..AllocationConfig::default()
        };
        let service = InventoryService::new(factory.clone(), &config);

        Self {
            factory,
            service,
            actor: UserId::new(),
        }
    }

    pub fn store(&self) -> Arc<InMemoryStore> {
        self.factory.store()
    }

    pub fn material(&self) -> MaterialId {
        let material = MaterialId::new();
        self.store().register_material(material);
        material
    }

    /// 以指定创建时间入库一个批次，首条分录为 INCOMING
    pub async fn seed_lot(
        &self,
        material: MaterialId,
        location: LocationId,
        quantity: i64,
        created_at: DateTime<Utc>,
    ) -> Lot {
        let reference = LedgerReference::Receipt(ReceiptId::new());
        let lot = Lot::receive(material, location, quantity, Some(reference))
            .unwrap()
            .with_created_at(created_at);
        let entry = LedgerEntry::record(
            &lot,
            LotBalance::ZERO,
            quantity,
            LedgerCause::new(LedgerAction::Incoming, LedgerReason::Receipt, Some(reference)),
        );

        let uow = self.factory.begin().await.unwrap();
        LedgerWriter
            .write_new_lot(uow.as_ref(), &lot, &entry)
            .await
            .unwrap();
        uow.commit().await.unwrap();
        lot
    }

    pub async fn demand(&self, material: MaterialId, target_qty: i64) -> DemandLine {
        self.demand_from(DemandSource::Order(OrderId::new()), material, target_qty)
            .await
    }

    pub async fn demand_from(
        &self,
        source: DemandSource,
        material: MaterialId,
        target_qty: i64,
    ) -> DemandLine {
        self.service
            .place_demand(PlaceDemandCommand {
                actor: self.actor.clone(),
                source,
                material_id: material,
                target_qty,
            })
            .await
            .unwrap()
    }

    pub fn request(&self, lines: Vec<AllocationLine>) -> AllocateStockCommand {
        AllocateStockCommand::new(self.actor.clone(), lines)
    }

    pub fn lot(&self, lot: &Lot) -> Lot {
        self.store().lot(lot.id()).unwrap()
    }

    pub fn line(&self, id: &DemandLineId) -> DemandLine {
        self.store().demand_line(id).unwrap()
    }
}

pub fn line(demand: &DemandLine, requested: i64) -> AllocationLine {
    AllocationLine::new(
        *demand.id(),
        *demand.material_id(),
        requested,
        LocationScope::All,
    )
}

/// 固定基准时间加偏移分钟
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}
