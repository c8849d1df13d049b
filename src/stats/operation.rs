// src/stats/operation.rs
//! 操作统计 - 跟踪单个表的操作计数

use crate::types::OperationType;
use std::{
    fmt::Write,
    sync::atomic::{AtomicU64, Ordering},
};

/// 操作统计快照
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationStatsSnapshot {
    pub insert_count: u64,
    pub update_count: u64,
    pub lookup_count: u64,
    pub hit_count: u64,
    pub kick_count: u64,
    pub probe_count: u64,
    pub resize_count: u64,
    pub skipped_count: u64,
}

impl OperationStatsSnapshot {
    pub fn get(&self, op_type: OperationType) -> u64 {
        match op_type {
            OperationType::Insert => self.insert_count,
            OperationType::Update => self.update_count,
            OperationType::Lookup => self.lookup_count,
            OperationType::Hit => self.hit_count,
            OperationType::Kick => self.kick_count,
            OperationType::Probe => self.probe_count,
            OperationType::Resize => self.resize_count,
            OperationType::Skipped => self.skipped_count,
        }
    }

    /// 查询命中率
    pub fn hit_rate(&self) -> f64 {
        if self.lookup_count == 0 {
            0.0
        } else {
            self.hit_count as f64 / self.lookup_count as f64
        }
    }
}

/// 原子操作统计
///
/// 查询只持有共享引用，因此计数器使用原子类型。
#[derive(Debug, Default)]
pub struct OperationStats {
    insert_count: AtomicU64,
    update_count: AtomicU64,
    lookup_count: AtomicU64,
    hit_count: AtomicU64,
    kick_count: AtomicU64,
    probe_count: AtomicU64,
    resize_count: AtomicU64,
    skipped_count: AtomicU64,
}

impl OperationStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, op_type: OperationType) -> &AtomicU64 {
        match op_type {
            OperationType::Insert => &self.insert_count,
            OperationType::Update => &self.update_count,
            OperationType::Lookup => &self.lookup_count,
            OperationType::Hit => &self.hit_count,
            OperationType::Kick => &self.kick_count,
            OperationType::Probe => &self.probe_count,
            OperationType::Resize => &self.resize_count,
            OperationType::Skipped => &self.skipped_count,
        }
    }

    /// 记录一次操作
    pub fn record(&self, op_type: OperationType) {
        self.record_many(op_type, 1);
    }

    pub fn record_many(&self, op_type: OperationType, n: u64) {
        self.counter(op_type).fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> OperationStatsSnapshot {
        OperationStatsSnapshot {
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            lookup_count: self.lookup_count.load(Ordering::Relaxed),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            kick_count: self.kick_count.load(Ordering::Relaxed),
            probe_count: self.probe_count.load(Ordering::Relaxed),
            resize_count: self.resize_count.load(Ordering::Relaxed),
            skipped_count: self.skipped_count.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for op in OperationType::ALL {
            self.counter(op).store(0, Ordering::Relaxed);
        }
    }

    /// 导出Prometheus格式指标
    pub fn export_prometheus(&self, prefix: &str) -> String {
        let mut output = String::new();
        for op in OperationType::ALL {
            let name = op.as_str();
            // 写入 String 不会失败
            let _ = writeln!(output, "# HELP {prefix}_operation_{name}_count Total {name} operations");
            let _ = writeln!(output, "# TYPE {prefix}_operation_{name}_count counter");
            let _ = writeln!(
                output,
                "{prefix}_operation_{name}_count {}",
                self.counter(op).load(Ordering::Relaxed)
            );
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = OperationStats::new();
        stats.record(OperationType::Insert);
        stats.record(OperationType::Insert);
        stats.record_many(OperationType::Kick, 5);
        stats.record(OperationType::Lookup);
        stats.record(OperationType::Lookup);
        stats.record(OperationType::Hit);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.insert_count, 2);
        assert_eq!(snapshot.kick_count, 5);
        assert_eq!(snapshot.get(OperationType::Lookup), 2);
        assert!((snapshot.hit_rate() - 0.5).abs() < f64::EPSILON);

        stats.reset();
        assert_eq!(stats.snapshot(), OperationStatsSnapshot::default());
    }

    #[test]
    fn test_export_prometheus() {
        let stats = OperationStats::new();
        stats.record(OperationType::Resize);
        let metrics = stats.export_prometheus("cuckoo");
        assert!(metrics.contains("# TYPE cuckoo_operation_resize_count counter"));
        assert!(metrics.contains("cuckoo_operation_resize_count 1\n"));
        assert!(metrics.contains("cuckoo_operation_insert_count 0\n"));
    }
}
