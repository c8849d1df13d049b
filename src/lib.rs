//! 关联数组库：借用键值引用的两种哈希表引擎
//!
//! 提供同一接口的两种冲突解决实现：
//! - [`CuckooTable`]：双子表 cuckoo 哈希，查询最多两次探测
//! - [`OpenAddressTable`]：单表开放寻址，双重哈希探测，素数容量
//!
//! 表只保存调用方键和数据的引用，不复制、不释放。
//! 键模式在初始化时确定：0 为以 NUL 结尾的字符串键，N > 0 为 N 字节定长二进制键。
//!
//! ## 快速开始
//!
//! ```rust
//! use assoc_hashtable::*;
//!
//! let (a, b) = ("A", "B");
//! let mut table: CuckooTable<'_, str, str> = CuckooTable::new(0);
//! table.insert("test", a);
//! table.insert("test", b);
//! assert_eq!(table.count(), 1);
//! assert_eq!(table.lookup("test"), Some("B"));
//!
//! let keys = [1i32, 2, 3];
//! let mut table: OpenAddressTable<'_, i32, i32> = OpenAddressTable::new(4);
//! for k in &keys {
//!     table.insert(k, k);
//! }
//! assert_eq!(table.lookup(&2), Some(&2));
//! assert_eq!(table.lookup(&9), None);
//! ```

#![warn(clippy::all)]

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}

// 核心模块导出
pub mod error;
pub mod types;
pub mod hash;
pub mod memory;
pub mod map;
pub mod stats;

// 公共接口导出
pub use crate::{
    error::{AbortOnFailure, AssocError, FailureHandler, PanicOnFailure},
    hash::{HashAlgorithm, DoubleHashStrategy, CuckooHashPair, is_prime, next_prime},
    map::{
        count,
        AssocTable,
        Collaborators,
        CuckooConfig,
        CuckooTable,
        OpenAddressConfig,
        OpenAddressTable,
    },
    memory::{BudgetAllocator, MemoryAllocator, MemoryStats, SystemAllocator},
    stats::OperationStatsSnapshot,
    types::{KeyBytes, KeyMode, TableSide},
};

/// 字符串键、字符串数据的 cuckoo 表
pub type StrCuckooTable<'a> = CuckooTable<'a, str, str>;

/// 字符串键、字符串数据的开放寻址表
pub type StrOpenAddressTable<'a> = OpenAddressTable<'a, str, str>;

/// 批量插入，返回处理的条目数
pub fn batch_insert<'a, T: AssocTable<'a>>(
    table: &mut T,
    items: impl IntoIterator<Item = (&'a T::Key, &'a T::Data)>,
) -> usize {
    let mut n = 0;
    for (key, data) in items {
        table.insert(key, data);
        n += 1;
    }
    n
}

/// 批量查询
pub fn batch_lookup<'a, 'k, T: AssocTable<'a>>(
    table: &T,
    keys: impl IntoIterator<Item = &'k T::Key>,
) -> Vec<Option<&'a T::Data>>
where
    T::Key: 'k,
{
    keys.into_iter().map(|key| table.lookup(key)).collect()
}
