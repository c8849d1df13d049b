//! 关联表核心模块 - 两种冲突解决引擎与共同接口

pub mod cuckoo_table;
pub mod open_address;

use std::sync::Arc;

pub use cuckoo_table::{CuckooConfig, CuckooTable};
pub use open_address::{OpenAddressConfig, OpenAddressTable};

use crate::{
    error::{AbortOnFailure, FailureHandler},
    memory::{global_allocator, MemoryAllocator},
    types::{KeyBytes, KeyMode},
};

/// 关联表公共接口
///
/// 表只借用调用方的键和数据，`'a` 约束它们必须比表中的条目活得更久。
/// 释放表 (`Drop`) 只归还槽位数组，不触碰键和数据。
pub trait AssocTable<'a> {
    type Key: KeyBytes + ?Sized + 'a;
    type Data: ?Sized + 'a;

    /// 插入或更新，可能触发扩容
    fn insert(&mut self, key: &'a Self::Key, data: &'a Self::Data);

    /// 查询，`None` 表示未找到
    fn lookup(&self, key: &Self::Key) -> Option<&'a Self::Data>;

    /// 当前条目数
    fn count(&self) -> usize;

    /// 槽位总数
    fn capacity(&self) -> usize;

    /// 键比较模式
    fn key_mode(&self) -> KeyMode;

    /// 负载因子
    fn load_factor(&self) -> f64 {
        self.count() as f64 / self.capacity() as f64
    }
}

/// 条目数，表不存在时为 0
pub fn count<'a, T: AssocTable<'a>>(table: Option<&T>) -> usize {
    table.map_or(0, |t| t.count())
}

/// 注入的外部协作者：分配策略与致命错误处理器
#[derive(Clone, Debug)]
pub struct Collaborators {
    pub allocator: Arc<dyn MemoryAllocator>,
    pub failure: Arc<dyn FailureHandler>,
}

impl Collaborators {
    pub fn new(allocator: Arc<dyn MemoryAllocator>, failure: Arc<dyn FailureHandler>) -> Self {
        Self { allocator, failure }
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn MemoryAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn with_failure(mut self, failure: Arc<dyn FailureHandler>) -> Self {
        self.failure = failure;
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            allocator: global_allocator(),
            failure: Arc::new(AbortOnFailure),
        }
    }
}
