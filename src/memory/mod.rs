//! 内存管理模块 - 槽位数组分配与统计

pub mod allocator;
pub mod slot;

pub use allocator::{AllocationStats, BudgetAllocator, MemoryAllocator, MemoryStats, SystemAllocator};
pub use slot::{Slot, SlotArray};

use once_cell::sync::Lazy;
use std::sync::Arc;

/// 全局默认分配器实例
pub static GLOBAL_ALLOCATOR: Lazy<Arc<SystemAllocator>> = Lazy::new(|| Arc::new(SystemAllocator::new()));

/// 获取全局默认分配器
pub fn global_allocator() -> Arc<dyn MemoryAllocator> {
    GLOBAL_ALLOCATOR.clone()
}

/// 获取全局分配器统计信息
pub fn allocator_stats() -> MemoryStats {
    GLOBAL_ALLOCATOR.stats()
}
