//! 哈希算法选择 - 构建按字节工作的哈希函数

use ahash::RandomState;
use std::{
    hash::{BuildHasher, Hash, Hasher},
    sync::Arc,
};

use crate::hash::{djb2, sdbm};

/// 哈希算法选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    /// djb2 / sdbm
    #[default]
    Classic,
    AHash,
    XxHash,
}

/// 哈希函数特征
pub trait HasherFunction: Send + Sync {
    fn hash_bytes(&self, data: &[u8]) -> u64;
}

impl<T> HasherFunction for T
where
    T: Fn(&[u8]) -> u64 + Send + Sync,
{
    fn hash_bytes(&self, data: &[u8]) -> u64 {
        self(data)
    }
}

/// 第一哈希函数的种子
pub(crate) const PRIMARY_SEED: usize = 42;
/// 第二哈希函数的种子
pub(crate) const SECONDARY_SEED: usize = 123;

impl HashAlgorithm {
    /// 构建第一哈希函数 (Classic 下为 djb2)
    pub fn primary(self) -> Arc<dyn HasherFunction> {
        match self {
            Self::Classic => Arc::new(djb2),
            _ => self.seeded(PRIMARY_SEED),
        }
    }

    /// 构建第二哈希函数 (Classic 下为 sdbm)
    pub fn secondary(self) -> Arc<dyn HasherFunction> {
        match self {
            Self::Classic => Arc::new(sdbm),
            _ => self.seeded(SECONDARY_SEED),
        }
    }

    /// 构建带种子的哈希函数
    fn seeded(self, seed: usize) -> Arc<dyn HasherFunction> {
        match self {
            Self::AHash => {
                let state = RandomState::with_seed(seed);
                Arc::new(move |data: &[u8]| {
                    let mut hasher = state.build_hasher();
                    data.hash(&mut hasher);
                    hasher.finish()
                })
            }
            Self::XxHash => {
                let seed = seed as u64;
                Arc::new(move |data: &[u8]| {
                    let mut hasher = twox_hash::XxHash64::with_seed(seed);
                    data.hash(&mut hasher);
                    hasher.finish()
                })
            }
            Self::Classic => Arc::new(djb2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_algorithm(algorithm: HashAlgorithm) {
        let primary = algorithm.primary();
        let secondary = algorithm.secondary();

        assert_eq!(
            primary.hash_bytes(b"consistent_key"),
            primary.hash_bytes(b"consistent_key"),
            "相同键应有相同的哈希值"
        );
        assert_ne!(
            primary.hash_bytes(b"test_key"),
            secondary.hash_bytes(b"test_key"),
            "两个哈希函数应相互独立"
        );
    }

    #[test]
    fn test_classic() {
        check_algorithm(HashAlgorithm::Classic);
        assert_eq!(HashAlgorithm::Classic.primary().hash_bytes(b"a"), djb2(b"a"));
        assert_eq!(HashAlgorithm::Classic.secondary().hash_bytes(b"a"), sdbm(b"a"));
    }

    #[test]
    fn test_ahash() {
        check_algorithm(HashAlgorithm::AHash);
    }

    #[test]
    fn test_xxhash() {
        check_algorithm(HashAlgorithm::XxHash);
    }

    #[test]
    fn test_default_is_classic() {
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Classic);
    }
}
