// src/memory/allocator.rs
//! 内存分配器接口 - 槽位数组的分配策略与统计

use crate::error::AssocError;
use std::{
    alloc::Layout,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// 内存统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStats {
    pub total_allocated: u64,
    pub current_used: u64,
    pub peak_used: u64,
    pub allocation_count: u64,
    pub deallocation_count: u64,
}

/// 内存分配器特征
///
/// 表在创建或扩容时先向分配器申请槽位数组的布局，
/// 获准后才真正分配；数组释放时归还。
pub trait MemoryAllocator: Send + Sync {
    /// 申请指定布局
    fn allocate(&self, layout: Layout) -> Result<(), AssocError>;

    /// 归还已申请的布局
    fn deallocate(&self, layout: Layout);

    /// 获取内存统计信息
    fn stats(&self) -> MemoryStats;
}

impl fmt::Debug for dyn MemoryAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAllocator")
            .field("stats", &self.stats())
            .finish()
    }
}

/// 系统分配器（带统计）
#[derive(Debug, Default)]
pub struct SystemAllocator {
    stats: AllocationStats,
}

impl SystemAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryAllocator for SystemAllocator {
    fn allocate(&self, layout: Layout) -> Result<(), AssocError> {
        self.stats.record_allocation(layout.size());
        Ok(())
    }

    fn deallocate(&self, layout: Layout) {
        self.stats.record_deallocation(layout.size());
    }

    fn stats(&self) -> MemoryStats {
        self.stats.snapshot()
    }
}

/// 限额分配器：当前占用超过预算时拒绝分配
#[derive(Debug)]
pub struct BudgetAllocator {
    budget_bytes: u64,
    stats: AllocationStats,
}

impl BudgetAllocator {
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            budget_bytes: budget_bytes as u64,
            stats: AllocationStats::default(),
        }
    }

    pub fn budget(&self) -> u64 {
        self.budget_bytes
    }
}

impl MemoryAllocator for BudgetAllocator {
    fn allocate(&self, layout: Layout) -> Result<(), AssocError> {
        let used = self.stats.current_used.load(Ordering::Relaxed);
        if used.saturating_add(layout.size() as u64) > self.budget_bytes {
            log_warn!(
                "allocation of {} bytes rejected (used {}, budget {})",
                layout.size(),
                used,
                self.budget_bytes
            );
            return Err(AssocError::AllocationFailed {
                size: layout.size(),
                align: layout.align(),
            });
        }
        self.stats.record_allocation(layout.size());
        Ok(())
    }

    fn deallocate(&self, layout: Layout) {
        self.stats.record_deallocation(layout.size());
    }

    fn stats(&self) -> MemoryStats {
        self.stats.snapshot()
    }
}

/// 线程安全的分配统计
#[derive(Debug, Default)]
pub struct AllocationStats {
    total_allocated: AtomicU64,
    current_used: AtomicU64,
    peak_used: AtomicU64,
    allocation_count: AtomicU64,
    deallocation_count: AtomicU64,
}

impl AllocationStats {
    /// 记录分配操作
    pub fn record_allocation(&self, size: usize) {
        let size = size as u64;
        self.allocation_count.fetch_add(1, Ordering::Relaxed);
        let new_used = self.current_used.fetch_add(size, Ordering::Relaxed) + size;
        self.peak_used.fetch_max(new_used, Ordering::Relaxed);
        self.total_allocated.fetch_add(size, Ordering::Relaxed);
    }

    /// 记录释放操作
    pub fn record_deallocation(&self, size: usize) {
        self.deallocation_count.fetch_add(1, Ordering::Relaxed);
        self.current_used.fetch_sub(size as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MemoryStats {
        MemoryStats {
            total_allocated: self.total_allocated.load(Ordering::Relaxed),
            current_used: self.current_used.load(Ordering::Relaxed),
            peak_used: self.peak_used.load(Ordering::Relaxed),
            allocation_count: self.allocation_count.load(Ordering::Relaxed),
            deallocation_count: self.deallocation_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_allocator_stats() {
        let allocator = SystemAllocator::new();
        let layout = Layout::array::<u64>(16).unwrap();

        allocator.allocate(layout).unwrap();
        allocator.allocate(layout).unwrap();
        allocator.deallocate(layout);

        let stats = allocator.stats();
        assert_eq!(stats.allocation_count, 2);
        assert_eq!(stats.deallocation_count, 1);
        assert_eq!(stats.current_used, 128);
        assert_eq!(stats.peak_used, 256);
        assert_eq!(stats.total_allocated, 256);
    }

    #[test]
    fn test_budget_allocator_rejects_over_budget() {
        let allocator = BudgetAllocator::new(100);
        assert!(allocator.allocate(Layout::array::<u8>(60).unwrap()).is_ok());

        let err = allocator
            .allocate(Layout::array::<u8>(60).unwrap())
            .unwrap_err();
        assert_eq!(err, AssocError::AllocationFailed { size: 60, align: 1 });

        allocator.deallocate(Layout::array::<u8>(60).unwrap());
        assert!(allocator.allocate(Layout::array::<u8>(60).unwrap()).is_ok());
    }
}
