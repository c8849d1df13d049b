//! Cuckoo 双函数定位 - 每个子表使用自己的哈希函数

use std::sync::Arc;

use crate::{
    hash::{calculate_slot, strategy::{HashAlgorithm, HasherFunction}},
    types::TableSide,
};

/// 两个独立哈希函数，分别服务两个子表
#[derive(Clone)]
pub struct CuckooHashPair {
    first: Arc<dyn HasherFunction>,
    second: Arc<dyn HasherFunction>,
    algorithm: HashAlgorithm,
}

impl CuckooHashPair {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            first: algorithm.primary(),
            second: algorithm.secondary(),
            algorithm,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// 原始哈希值
    pub fn raw_hash(&self, side: TableSide, key: &[u8]) -> u64 {
        match side {
            TableSide::First => self.first.hash_bytes(key),
            TableSide::Second => self.second.hash_bytes(key),
        }
    }

    /// 键在指定子表中的槽位，`half_capacity` 为单个子表的槽数
    pub fn slot(&self, side: TableSide, key: &[u8], half_capacity: usize) -> usize {
        calculate_slot(self.raw_hash(side, key), half_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{djb2, sdbm};

    #[test]
    fn test_classic_slots() {
        let pair = CuckooHashPair::new(HashAlgorithm::Classic);
        assert_eq!(pair.slot(TableSide::First, b"test", 8), (djb2(b"test") % 8) as usize);
        assert_eq!(pair.slot(TableSide::Second, b"test", 8), (sdbm(b"test") % 8) as usize);
    }

    #[test]
    fn test_slots_within_range() {
        for algorithm in [HashAlgorithm::Classic, HashAlgorithm::AHash, HashAlgorithm::XxHash] {
            let pair = CuckooHashPair::new(algorithm);
            for i in 0u32..200 {
                let key = i.to_le_bytes();
                assert!(pair.slot(TableSide::First, &key, 8) < 8, "槽位应在子表范围内");
                assert!(pair.slot(TableSide::Second, &key, 8) < 8, "槽位应在子表范围内");
            }
        }
    }
}
