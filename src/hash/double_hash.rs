//! 双重哈希策略 - 主哈希定位起点，派生步长生成探测序列

use std::sync::Arc;

use crate::hash::{calculate_slot, strategy::{HashAlgorithm, HasherFunction}};

/// 默认步长素数
pub const DEFAULT_STEP_PRIME: usize = 5;

/// 双重哈希策略
///
/// 起点为 `primary(key) mod capacity`，步长为
/// `step_prime - (起点 mod step_prime)`，恒在 `1..=step_prime` 内。
#[derive(Clone)]
pub struct DoubleHashStrategy {
    primary_hasher: Arc<dyn HasherFunction>,
    step_prime: usize,
    algorithm: HashAlgorithm,
}

impl DoubleHashStrategy {
    pub fn new(algorithm: HashAlgorithm, step_prime: usize) -> Self {
        Self {
            primary_hasher: algorithm.primary(),
            step_prime,
            algorithm,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn step_prime(&self) -> usize {
        self.step_prime
    }

    /// 主哈希：探测起点
    pub fn primary(&self, key: &[u8], capacity: usize) -> usize {
        calculate_slot(self.primary_hasher.hash_bytes(key), capacity)
    }

    /// 次哈希：探测步长，由主哈希派生
    pub fn step(&self, key: &[u8], capacity: usize) -> usize {
        self.step_prime - (self.primary(key, capacity) % self.step_prime)
    }

    /// 键的完整探测序列
    pub fn probe_sequence(&self, key: &[u8], capacity: usize) -> ProbeSequence {
        ProbeSequence::new(self.primary(key, capacity), self.step(key, capacity), capacity)
    }
}

impl Default for DoubleHashStrategy {
    fn default() -> Self {
        Self::new(HashAlgorithm::Classic, DEFAULT_STEP_PRIME)
    }
}

/// 探测序列迭代器，回到起点时结束
#[derive(Debug, Clone)]
pub struct ProbeSequence {
    start: usize,
    step: usize,
    capacity: usize,
    next: Option<usize>,
}

impl ProbeSequence {
    fn new(start: usize, step: usize, capacity: usize) -> Self {
        Self {
            start,
            step,
            capacity,
            next: Some(start),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn step(&self) -> usize {
        self.step
    }
}

impl Iterator for ProbeSequence {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        let following = (current + self.step) % self.capacity;
        self.next = (following != self.start).then_some(following);
        Some(current)
    }
}
