//! 台账链校验与重放
//!
//! 同一批次的分录按序号排列后，第 n 条的变动前快照必须等于第 n-1 条的变动后快照，
//! 首条从 0/0 开始；从零重放全部分录应得到批次当前的 quantity/reserve。

use cuba_domain_core::Entity;
use serde::Serialize;

use crate::domain::entities::{LedgerEntry, Lot};
use crate::domain::value_objects::{LedgerEntryId, LotBalance, LotId};

/// 链上发现的问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainBreak {
    /// 分录不属于该批次
    ForeignEntry { entry_id: LedgerEntryId },
    /// 序号不连续
    SequenceGap { expected: i64, found: i64 },
    /// 变动前快照与上一条的变动后快照不符
    SnapshotMismatch {
        sequence: i64,
        expected: LotBalance,
        found: LotBalance,
    },
    /// 变动后快照不等于变动前快照加增减量
    DeltaMismatch { sequence: i64 },
}

/// 批次校验报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub lot_id: LotId,
    pub entry_count: usize,
    pub lot_version: i64,
    /// 从零重放得到的余额
    pub replayed: LotBalance,
    /// 批次当前余额
    pub current: LotBalance,
    pub breaks: Vec<ChainBreak>,
}

impl ChainReport {
    pub fn is_consistent(&self) -> bool {
        self.breaks.is_empty()
            && self.replayed == self.current
            && self.entry_count as i64 == self.lot_version
    }
}

pub struct LedgerChain;

impl LedgerChain {
    /// 从 0/0 起依次应用每条分录的增减量
    pub fn replay<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> LotBalance {
        entries
            .into_iter()
            .fold(LotBalance::ZERO, |balance, entry| entry.apply_to(balance))
    }

    /// `entries` 需已按序号升序排列
    pub fn verify(lot: &Lot, entries: &[LedgerEntry]) -> ChainReport {
        let mut breaks = Vec::new();
        let mut previous = LotBalance::ZERO;

        for (index, entry) in entries.iter().enumerate() {
            if entry.lot_id != *lot.id() {
                breaks.push(ChainBreak::ForeignEntry { entry_id: entry.id });
            }

            let expected_sequence = index as i64 + 1;
            if entry.sequence != expected_sequence {
                breaks.push(ChainBreak::SequenceGap {
                    expected: expected_sequence,
                    found: entry.sequence,
                });
            }

            if entry.existing != previous {
                breaks.push(ChainBreak::SnapshotMismatch {
                    sequence: entry.sequence,
                    expected: previous,
                    found: entry.existing,
                });
            }

            if !entry.is_self_consistent() {
                breaks.push(ChainBreak::DeltaMismatch {
                    sequence: entry.sequence,
                });
            }

            previous = entry.updated;
        }

        ChainReport {
            lot_id: *lot.id(),
            entry_count: entries.len(),
            lot_version: lot.version(),
            replayed: Self::replay(entries),
            current: lot.balance(),
            breaks,
        }
    }
}
