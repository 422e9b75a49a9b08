//! 分配相关指标

use metrics::counter;

pub const ALLOCATION_BATCHES_TOTAL: &str = "sc_im_allocation_batches_total";
pub const ALLOCATED_QUANTITY_TOTAL: &str = "sc_im_allocated_quantity_total";
pub const ALLOCATION_SHORTFALL_TOTAL: &str = "sc_im_allocation_shortfall_total";
pub const ALLOCATION_CONFLICTS_TOTAL: &str = "sc_im_allocation_conflicts_total";

/// 批次结果：committed / rejected / conflict / failed
pub fn record_batch(outcome: &'static str) {
    counter!(ALLOCATION_BATCHES_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_allocation(allocated: i64, shortfall: i64) {
    if allocated > 0 {
        counter!(ALLOCATED_QUANTITY_TOTAL).increment(allocated as u64);
    }
    if shortfall > 0 {
        counter!(ALLOCATION_SHORTFALL_TOTAL).increment(shortfall as u64);
    }
}

pub fn record_conflict() {
    counter!(ALLOCATION_CONFLICTS_TOTAL).increment(1);
}
