//! 哈希模块 - 统一管理哈希相关功能

pub mod strategy;
pub mod cuckoo_hash;
pub mod double_hash;
pub mod prime;

pub use strategy::{HashAlgorithm, HasherFunction};
pub use cuckoo_hash::CuckooHashPair;
pub use double_hash::DoubleHashStrategy;
pub use prime::{is_prime, next_prime};

/// djb2 初始种子
pub const DJB2_SEED: u64 = 5381;
/// djb2 左移位数 (乘 33)
pub const DJB2_SHIFT: u32 = 5;
/// sdbm 两个左移位数
pub const SDBM_SHIFT_1: u32 = 6;
pub const SDBM_SHIFT_2: u32 = 16;

/// djb2 哈希: h = h * 33 + c
pub fn djb2(bytes: &[u8]) -> u64 {
    bytes.iter().fold(DJB2_SEED, |hash, &c| {
        (hash << DJB2_SHIFT)
            .wrapping_add(hash)
            .wrapping_add(u64::from(c))
    })
}

/// sdbm 哈希: h = c + (h << 6) + (h << 16) - h
pub fn sdbm(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |hash, &c| {
        u64::from(c)
            .wrapping_add(hash << SDBM_SHIFT_1)
            .wrapping_add(hash << SDBM_SHIFT_2)
            .wrapping_sub(hash)
    })
}

/// 哈希工具函数
pub fn calculate_slot(hash: u64, slots: usize) -> usize {
    (hash % slots as u64) as usize
}
