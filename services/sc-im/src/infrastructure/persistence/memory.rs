//! 内存存储与 Unit of Work
//!
//! 不依赖数据库即可运行分配流程。工作单元在本地暂存读写，提交时按版本做乐观校验：
//! 被修改的行在已提交数据中的版本必须仍是首次读取时的版本，否则整单返回
//! `ConcurrencyConflict` 且不落任何数据。每一行在工作单元内首次读到的版本即其快照，
//! 批次台账也按该版本截取。另外支持注入写入失败和提交失败。

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cuba_domain_core::{Entity, Versioned};
use cuba_errors::{AppError, AppResult};

use crate::domain::entities::{DemandLine, LedgerEntry, Lot};
use crate::domain::repositories::{
    DemandLineRepository, LedgerRepository, LotRepository, MaterialRepository,
};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::{DemandLineId, LocationScope, LotId, MaterialId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct StoreState {
    materials: HashSet<MaterialId>,
    lots: HashMap<LotId, Lot>,
    ledger: Vec<LedgerEntry>,
    demand_lines: HashMap<DemandLineId, DemandLine>,
}

#[derive(Default)]
struct FaultPlan {
    /// 剩余允许成功的写入次数，用尽后下一次写入失败
    writes_before_failure: Option<u32>,
    commit_failures: VecDeque<AppError>,
}

/// 一次加锁读取，按发生顺序记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    DemandLine(DemandLineId),
    /// 某物料的候选批次
    Lots(MaterialId),
}

/// 已提交数据
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    faults: Mutex<FaultPlan>,
    locks: Mutex<Vec<RowLock>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_material(&self, id: MaterialId) {
        lock(&self.state).materials.insert(id);
    }

    pub fn lot(&self, id: &LotId) -> Option<Lot> {
        lock(&self.state).lots.get(id).cloned()
    }

    pub fn lots(&self) -> Vec<Lot> {
        let mut lots: Vec<Lot> = lock(&self.state).lots.values().cloned().collect();
        lots.sort_by_key(Lot::fifo_key);
        lots
    }

    pub fn demand_line(&self, id: &DemandLineId) -> Option<DemandLine> {
        lock(&self.state).demand_lines.get(id).cloned()
    }

    pub fn ledger_len(&self) -> usize {
        lock(&self.state).ledger.len()
    }

    pub fn ledger_for(&self, lot_id: &LotId) -> Vec<LedgerEntry> {
        let mut entries: Vec<LedgerEntry> = lock(&self.state)
            .ledger
            .iter()
            .filter(|e| e.lot_id == *lot_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.sequence);
        entries
    }

    /// 允许 `successful_writes` 次写入成功，之后的下一次写入返回数据库错误
    pub fn fail_write_after(&self, successful_writes: u32) {
        lock(&self.faults).writes_before_failure = Some(successful_writes);
    }

    /// 下一次提交返回给定错误，数据不落库
    pub fn fail_next_commit(&self, error: AppError) {
        lock(&self.faults).commit_failures.push_back(error);
    }

    pub fn clear_faults(&self) {
        *lock(&self.faults) = FaultPlan::default();
    }

    /// 所有工作单元的加锁读取顺序
    pub fn lock_trace(&self) -> Vec<RowLock> {
        lock(&self.locks).clone()
    }

    pub fn clear_lock_trace(&self) {
        lock(&self.locks).clear();
    }

    fn record_lock(&self, row: RowLock) {
        lock(&self.locks).push(row);
    }

    fn check_write(&self) -> AppResult<()> {
        let mut faults = lock(&self.faults);
        match faults.writes_before_failure {
            Some(0) => {
                faults.writes_before_failure = None;
                Err(AppError::database("Injected write failure"))
            }
            Some(n) => {
                faults.writes_before_failure = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn take_commit_failure(&self) -> Option<AppError> {
        lock(&self.faults).commit_failures.pop_front()
    }
}

/// 工作单元内暂存的一类行
struct Staged<K, V> {
    rows: HashMap<K, V>,
    base_versions: HashMap<K, i64>,
    inserted: HashSet<K>,
    dirty: HashSet<K>,
}

impl<K, V> Default for Staged<K, V> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            base_versions: HashMap::new(),
            inserted: HashSet::new(),
            dirty: HashSet::new(),
        }
    }
}

impl<K, V> Staged<K, V>
where
    K: Copy + Eq + Hash + Display,
    V: Versioned + Clone,
{
    /// 先看本工作单元的暂存，再读已提交数据并记下读取时的版本
    fn read(&mut self, id: K, committed: &HashMap<K, V>) -> Option<V> {
        if let Some(row) = self.rows.get(&id) {
            return Some(row.clone());
        }
        let row = committed.get(&id)?.clone();
        self.base_versions.insert(id, row.version());
        self.rows.insert(id, row.clone());
        Some(row)
    }

    fn insert(&mut self, id: K, row: V, committed: &HashMap<K, V>, kind: &str) -> AppResult<()> {
        if self.rows.contains_key(&id) || committed.contains_key(&id) {
            return Err(AppError::conflict(format!("{} {} already exists", kind, id)));
        }
        self.rows.insert(id, row);
        self.inserted.insert(id);
        Ok(())
    }

    fn update(&mut self, id: K, row: V, committed: &HashMap<K, V>, kind: &str) -> AppResult<()> {
        let current = self
            .read(id, committed)
            .ok_or_else(|| AppError::not_found(format!("{} {} not found", kind, id)))?;
        if current.version() != row.expected_version() {
            return Err(AppError::concurrency_conflict(format!(
                "{} {} is at version {}, update expected {}",
                kind,
                id,
                current.version(),
                row.expected_version()
            )));
        }
        self.rows.insert(id, row);
        if !self.inserted.contains(&id) {
            self.dirty.insert(id);
        }
        Ok(())
    }

    fn validate(&self, committed: &HashMap<K, V>, kind: &str) -> AppResult<()> {
        for id in &self.dirty {
            let base = self.base_versions.get(id).copied();
            let current = committed.get(id).map(Versioned::version);
            if base.is_none() || base != current {
                return Err(AppError::concurrency_conflict(format!(
                    "{} {} was modified by another transaction",
                    kind, id
                )));
            }
        }
        for id in &self.inserted {
            if committed.contains_key(id) {
                return Err(AppError::conflict(format!("{} {} already exists", kind, id)));
            }
        }
        Ok(())
    }

    fn apply(mut self, committed: &mut HashMap<K, V>) {
        for id in self.dirty.iter().chain(self.inserted.iter()) {
            if let Some(row) = self.rows.remove(id) {
                committed.insert(*id, row);
            }
        }
    }
}

#[derive(Default)]
struct WorkingSet {
    lots: Staged<LotId, Lot>,
    demand_lines: Staged<DemandLineId, DemandLine>,
    ledger: Vec<LedgerEntry>,
}

/// 工作单元上下文，仓储共享
struct MemoryContext {
    store: Arc<InMemoryStore>,
    work: Mutex<WorkingSet>,
}

impl MemoryContext {
    fn find_lot(&self, id: &LotId) -> Option<Lot> {
        let mut work = lock(&self.work);
        let state = lock(&self.store.state);
        work.lots.read(*id, &state.lots)
    }

    fn find_available(&self, material_id: &MaterialId, scope: &LocationScope) -> Vec<Lot> {
        self.store.record_lock(RowLock::Lots(*material_id));
        let mut work = lock(&self.work);
        let state = lock(&self.store.state);

        let committed: Vec<LotId> = state
            .lots
            .values()
            .filter(|lot| lot.material_id() == material_id)
            .map(|lot| *lot.id())
            .collect();
        for id in committed {
            work.lots.read(id, &state.lots);
        }

        let mut lots: Vec<Lot> = work
            .lots
            .rows
            .values()
            .filter(|lot| {
                lot.material_id() == material_id
                    && scope.contains(lot.location_id())
                    && !lot.is_out_of_stock()
            })
            .cloned()
            .collect();
        lots.sort_by_key(Lot::fifo_key);
        lots
    }

    fn insert_lot(&self, lot: &Lot) -> AppResult<()> {
        self.store.check_write()?;
        let mut work = lock(&self.work);
        let state = lock(&self.store.state);
        work.lots.insert(*lot.id(), lot.clone(), &state.lots, "Lot")
    }

    fn update_lot(&self, lot: &Lot) -> AppResult<()> {
        self.store.check_write()?;
        let mut work = lock(&self.work);
        let state = lock(&self.store.state);
        work.lots.update(*lot.id(), lot.clone(), &state.lots, "Lot")
    }

    fn append_entry(&self, entry: &LedgerEntry) -> AppResult<()> {
        self.store.check_write()?;
        let mut work = lock(&self.work);
        let state = lock(&self.store.state);

        let taken = |e: &LedgerEntry| e.lot_id == entry.lot_id && e.sequence == entry.sequence;
        if state.ledger.iter().any(taken) || work.ledger.iter().any(taken) {
            return Err(AppError::concurrency_conflict(format!(
                "Ledger sequence {} of lot {} already written",
                entry.sequence, entry.lot_id
            )));
        }
        work.ledger.push(entry.clone());
        Ok(())
    }

    /// 已提交分录只取到本工作单元首次读到该批次时的版本为止，
    /// 与批次读取处于同一快照
    fn list_entries(&self, lot_id: &LotId) -> Vec<LedgerEntry> {
        let mut work = lock(&self.work);
        let state = lock(&self.store.state);

        work.lots.read(*lot_id, &state.lots);
        let horizon = work.lots.base_versions.get(lot_id).copied();

        let mut entries: Vec<LedgerEntry> = state
            .ledger
            .iter()
            .filter(|e| e.lot_id == *lot_id && horizon.is_some_and(|v| e.sequence <= v))
            .chain(work.ledger.iter().filter(|e| e.lot_id == *lot_id))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.sequence);
        entries
    }

    fn find_demand_line(&self, id: &DemandLineId) -> Option<DemandLine> {
        let mut work = lock(&self.work);
        let state = lock(&self.store.state);
        work.demand_lines.read(*id, &state.demand_lines)
    }

    fn lock_demand_line(&self, id: &DemandLineId) -> Option<DemandLine> {
        self.store.record_lock(RowLock::DemandLine(*id));
        self.find_demand_line(id)
    }

    fn insert_demand_line(&self, line: &DemandLine) -> AppResult<()> {
        self.store.check_write()?;
        let mut work = lock(&self.work);
        let state = lock(&self.store.state);
        work.demand_lines
            .insert(*line.id(), line.clone(), &state.demand_lines, "Demand line")
    }

    fn update_demand_line(&self, line: &DemandLine) -> AppResult<()> {
        self.store.check_write()?;
        let mut work = lock(&self.work);
        let state = lock(&self.store.state);
        work.demand_lines
            .update(*line.id(), line.clone(), &state.demand_lines, "Demand line")
    }

    fn material_exists(&self, id: &MaterialId) -> bool {
        lock(&self.store.state).materials.contains(id)
    }

    fn commit(&self) -> AppResult<()> {
        if let Some(error) = self.store.take_commit_failure() {
            return Err(error);
        }

        let work = std::mem::take(&mut *lock(&self.work));
        let mut state = lock(&self.store.state);

        work.lots.validate(&state.lots, "Lot")?;
        work.demand_lines
            .validate(&state.demand_lines, "Demand line")?;
        for entry in &work.ledger {
            if state
                .ledger
                .iter()
                .any(|e| e.lot_id == entry.lot_id && e.sequence == entry.sequence)
            {
                return Err(AppError::concurrency_conflict(format!(
                    "Ledger sequence {} of lot {} already written",
                    entry.sequence, entry.lot_id
                )));
            }
        }

        let StoreState {
            lots,
            ledger,
            demand_lines,
            ..
        } = &mut *state;
        work.lots.apply(lots);
        work.demand_lines.apply(demand_lines);
        ledger.extend(work.ledger);
        Ok(())
    }
}

macro_rules! define_memory_repo {
    ($name:ident) => {
        pub struct $name {
            ctx: Arc<MemoryContext>,
        }

        impl $name {
            fn new(ctx: Arc<MemoryContext>) -> Self {
                Self { ctx }
            }
        }
    };
}

define_memory_repo!(MemoryLotRepository);
define_memory_repo!(MemoryLedgerRepository);
define_memory_repo!(MemoryDemandLineRepository);
define_memory_repo!(MemoryMaterialRepository);

#[async_trait]
impl LotRepository for MemoryLotRepository {
    async fn find_by_id(&self, id: &LotId) -> AppResult<Option<Lot>> {
        Ok(self.ctx.find_lot(id))
    }

    async fn find_available(
        &self,
        material_id: &MaterialId,
        scope: &LocationScope,
    ) -> AppResult<Vec<Lot>> {
        Ok(self.ctx.find_available(material_id, scope))
    }

    async fn insert(&self, lot: &Lot) -> AppResult<()> {
        self.ctx.insert_lot(lot)
    }

    async fn update(&self, lot: &Lot) -> AppResult<()> {
        self.ctx.update_lot(lot)
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedgerRepository {
    async fn append(&self, entry: &LedgerEntry) -> AppResult<()> {
        self.ctx.append_entry(entry)
    }

    async fn list_by_lot(&self, lot_id: &LotId) -> AppResult<Vec<LedgerEntry>> {
        Ok(self.ctx.list_entries(lot_id))
    }
}

#[async_trait]
impl DemandLineRepository for MemoryDemandLineRepository {
    async fn find_by_id(&self, id: &DemandLineId) -> AppResult<Option<DemandLine>> {
        Ok(self.ctx.find_demand_line(id))
    }

    async fn find_for_update(&self, id: &DemandLineId) -> AppResult<Option<DemandLine>> {
        Ok(self.ctx.lock_demand_line(id))
    }

    async fn insert(&self, line: &DemandLine) -> AppResult<()> {
        self.ctx.insert_demand_line(line)
    }

    async fn update(&self, line: &DemandLine) -> AppResult<()> {
        self.ctx.update_demand_line(line)
    }
}

#[async_trait]
impl MaterialRepository for MemoryMaterialRepository {
    async fn exists(&self, id: &MaterialId) -> AppResult<bool> {
        Ok(self.ctx.material_exists(id))
    }
}

/// 内存 Unit of Work
pub struct InMemoryUnitOfWork {
    ctx: Arc<MemoryContext>,
    lot_repo: MemoryLotRepository,
    ledger_repo: MemoryLedgerRepository,
    demand_line_repo: MemoryDemandLineRepository,
    material_repo: MemoryMaterialRepository,
}

impl InMemoryUnitOfWork {
    fn new(store: Arc<InMemoryStore>) -> Self {
        let ctx = Arc::new(MemoryContext {
            store,
            work: Mutex::new(WorkingSet::default()),
        });

        Self {
            ctx: ctx.clone(),
            lot_repo: MemoryLotRepository::new(ctx.clone()),
            ledger_repo: MemoryLedgerRepository::new(ctx.clone()),
            demand_line_repo: MemoryDemandLineRepository::new(ctx.clone()),
            material_repo: MemoryMaterialRepository::new(ctx),
        }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn lots(&self) -> &dyn LotRepository {
        &self.lot_repo
    }

    fn ledger(&self) -> &dyn LedgerRepository {
        &self.ledger_repo
    }

    fn demand_lines(&self) -> &dyn DemandLineRepository {
        &self.demand_line_repo
    }

    fn materials(&self) -> &dyn MaterialRepository {
        &self.material_repo
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.ctx.commit()
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

/// 内存 Unit of Work 工厂
#[derive(Clone, Default)]
pub struct InMemoryUnitOfWorkFactory {
    store: Arc<InMemoryStore>,
}

impl InMemoryUnitOfWorkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<InMemoryStore> {
        self.store.clone()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(InMemoryUnitOfWork::new(self.store.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::LocationId;

    fn seeded() -> (InMemoryUnitOfWorkFactory, Lot) {
        let factory = InMemoryUnitOfWorkFactory::new();
        let material = MaterialId::new();
        factory.store().register_material(material);

        let lot = Lot::receive(material, LocationId::new(), 100, None).unwrap();
        factory
            .store()
            .state
            .lock()
            .unwrap()
            .lots
            .insert(*lot.id(), lot.clone());
        (factory, lot)
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let (factory, lot) = seeded();

        let uow = factory.begin().await.unwrap();
        let mut staged = uow.lots().find_by_id(lot.id()).await.unwrap().unwrap();
        staged.reserve_units(10).unwrap();
        uow.lots().update(&staged).await.unwrap();

        assert_eq!(
            uow.lots().find_by_id(lot.id()).await.unwrap().unwrap().reserve(),
            10
        );
        assert_eq!(factory.store().lot(lot.id()).unwrap().reserve(), 0);

        uow.rollback().await.unwrap();
        assert_eq!(factory.store().lot(lot.id()).unwrap().reserve(), 0);
    }

    #[tokio::test]
    async fn test_second_writer_conflicts_at_commit() {
        let (factory, lot) = seeded();

        let first = factory.begin().await.unwrap();
        let second = factory.begin().await.unwrap();

        let mut a = first.lots().find_by_id(lot.id()).await.unwrap().unwrap();
        let mut b = second.lots().find_by_id(lot.id()).await.unwrap().unwrap();
        a.reserve_units(60).unwrap();
        b.reserve_units(60).unwrap();
        first.lots().update(&a).await.unwrap();
        second.lots().update(&b).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(factory.store().lot(lot.id()).unwrap().reserve(), 60);
    }

    #[tokio::test]
    async fn test_stale_version_rejected_on_update() {
        let (factory, lot) = seeded();
        let uow = factory.begin().await.unwrap();

        let mut skipped = lot.clone();
        skipped.reserve_units(1).unwrap();
        skipped.reserve_units(1).unwrap();

        let err = uow.lots().update(&skipped).await.unwrap_err();
        assert!(matches!(err, AppError::ConcurrencyConflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_ledger_sequence_conflicts() {
        let (factory, lot) = seeded();
        let uow = factory.begin().await.unwrap();

        let entry = LedgerEntry::record(
            &lot,
            crate::domain::value_objects::LotBalance::ZERO,
            100,
            crate::domain::entities::LedgerCause::new(
                crate::domain::enums::LedgerAction::Incoming,
                crate::domain::enums::LedgerReason::Receipt,
                None,
            ),
        );
        uow.ledger().append(&entry).await.unwrap();

        let mut again = entry.clone();
        again.id = crate::domain::value_objects::LedgerEntryId::new();
        let err = uow.ledger().append(&again).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let (factory, lot) = seeded();
        factory.store().fail_write_after(0);

        let uow = factory.begin().await.unwrap();
        let mut staged = uow.lots().find_by_id(lot.id()).await.unwrap().unwrap();
        staged.reserve_units(1).unwrap();

        let err = uow.lots().update(&staged).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        // 一次性故障
        uow.lots().update(&staged).await.unwrap();
    }

    #[tokio::test]
    async fn test_injected_commit_failure_discards_work() {
        let (factory, lot) = seeded();
        factory
            .store()
            .fail_next_commit(AppError::database("disk full"));

        let uow = factory.begin().await.unwrap();
        let mut staged = uow.lots().find_by_id(lot.id()).await.unwrap().unwrap();
        staged.reserve_units(5).unwrap();
        uow.lots().update(&staged).await.unwrap();

        assert!(uow.commit().await.is_err());
        assert_eq!(factory.store().lot(lot.id()).unwrap().reserve(), 0);
    }
}
