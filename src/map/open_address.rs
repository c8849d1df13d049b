//! 开放寻址哈希表 - 单表、双重哈希探测、素数容量

use std::fmt;

use crate::{
    error::AssocError,
    hash::{double_hash::ProbeSequence, is_prime, next_prime, DoubleHashStrategy, HashAlgorithm},
    map::{AssocTable, Collaborators},
    memory::SlotArray,
    stats::{OperationStats, OperationStatsSnapshot},
    types::{KeyBytes, KeyMode, OperationType},
};

/// 开放寻址表配置
#[derive(Clone, Debug, PartialEq)]
pub struct OpenAddressConfig {
    /// 初始容量，必须为大于步长素数的素数
    pub initial_capacity: usize,
    /// 插入前负载因子超过此值即扩容
    pub max_load_factor: f64,
    pub growth_factor: usize,
    pub step_prime: usize,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for OpenAddressConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 17,
            max_load_factor: 0.6,
            growth_factor: 2,
            step_prime: 5,
            hash_algorithm: HashAlgorithm::Classic,
        }
    }
}

impl OpenAddressConfig {
    pub fn validate(&self) -> Result<(), AssocError> {
        if self.step_prime == 0 {
            return Err(AssocError::InvalidConfig {
                reason: "step_prime must be >= 1".to_string(),
            });
        }
        if !is_prime(self.initial_capacity) || self.initial_capacity <= self.step_prime {
            return Err(AssocError::InvalidConfig {
                reason: format!(
                    "initial_capacity {} must be a prime greater than step_prime {}",
                    self.initial_capacity, self.step_prime
                ),
            });
        }
        if !(self.max_load_factor > 0.0 && self.max_load_factor < 1.0) {
            return Err(AssocError::InvalidConfig {
                reason: format!("max_load_factor {} must be in (0, 1)", self.max_load_factor),
            });
        }
        if self.growth_factor < 2 {
            return Err(AssocError::InvalidConfig {
                reason: format!("growth_factor {} must be >= 2", self.growth_factor),
            });
        }
        Ok(())
    }
}

/// 开放寻址哈希表
///
/// 容量恒为素数；每个键位于从 `primary(key)` 出发、
/// 以 `step(key)` 为步长的探测序列上。
pub struct OpenAddressTable<'a, K: ?Sized, D: ?Sized> {
    slots: SlotArray<'a, K, D>,
    capacity: usize,
    entries: usize,
    mode: KeyMode,
    strategy: DoubleHashStrategy,
    config: OpenAddressConfig,
    collaborators: Collaborators,
    stats: OperationStats,
}

impl<'a, K: KeyBytes + ?Sized, D: ?Sized> OpenAddressTable<'a, K, D> {
    /// 使用默认配置创建，出错时交给默认的致命错误处理器
    pub fn new(keysize: isize) -> Self {
        let collaborators = Collaborators::default();
        match Self::with_options(keysize, OpenAddressConfig::default(), collaborators.clone()) {
            Ok(table) => table,
            Err(err) => collaborators.failure.fail(err),
        }
    }

    pub fn try_new(keysize: isize) -> Result<Self, AssocError> {
        Self::with_options(keysize, OpenAddressConfig::default(), Collaborators::default())
    }

    pub fn with_options(
        keysize: isize,
        config: OpenAddressConfig,
        collaborators: Collaborators,
    ) -> Result<Self, AssocError> {
        let mode = KeyMode::from_keysize(keysize)?;
        config.validate()?;
        Self::build(mode, config.initial_capacity, config, collaborators)
    }

    fn build(
        mode: KeyMode,
        capacity: usize,
        config: OpenAddressConfig,
        collaborators: Collaborators,
    ) -> Result<Self, AssocError> {
        let slots = SlotArray::allocate(capacity, collaborators.allocator.clone())?;
        Ok(Self {
            slots,
            capacity,
            entries: 0,
            mode,
            strategy: DoubleHashStrategy::new(config.hash_algorithm, config.step_prime),
            config,
            collaborators,
            stats: OperationStats::new(),
        })
    }

    pub fn config(&self) -> &OpenAddressConfig {
        &self.config
    }

    pub fn stats(&self) -> OperationStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn export_prometheus(&self) -> String {
        self.stats.export_prometheus("open_address")
    }

    /// 键在当前容量下的探测序列
    pub fn probe_sequence(&self, key: &K) -> Option<ProbeSequence> {
        let bytes = self.mode.view(key.key_bytes())?;
        Some(self.strategy.probe_sequence(bytes, self.capacity))
    }

    /// 键当前所在槽位
    pub fn locate(&self, key: &K) -> Option<usize> {
        let bytes = self.mode.view(key.key_bytes())?;
        for index in self.strategy.probe_sequence(bytes, self.capacity) {
            let stored = self.slots[index].key()?;
            if self.mode.keys_equal(stored.key_bytes(), bytes) {
                return Some(index);
            }
        }
        None
    }

    /// 遍历所有已占用条目，按槽位顺序
    pub fn iter(&self) -> impl Iterator<Item = (&'a K, &'a D)> + '_ {
        self.slots.iter().filter_map(|slot| slot.entry())
    }

    /// 插入或更新，失败时交给致命错误处理器
    pub fn insert(&mut self, key: &'a K, data: &'a D) {
        if let Err(err) = self.try_insert(key, data) {
            let failure = self.collaborators.failure.clone();
            failure.fail(err);
        }
    }

    /// 插入或更新；插入前负载因子超过阈值时先扩容
    pub fn try_insert(&mut self, key: &'a K, data: &'a D) -> Result<(), AssocError> {
        if self.mode.view(key.key_bytes()).is_none() {
            log_debug!("open address insert skipped: key shorter than {}", self.mode);
            self.stats.record(OperationType::Skipped);
            return Ok(());
        }

        if self.entries as f64 / self.capacity as f64 > self.config.max_load_factor {
            self.resize()?;
        }

        // 探测序列走满一圈说明表已满，扩容后重试
        while !self.insert_data(key, data) {
            self.resize()?;
        }
        Ok(())
    }

    /// 沿探测序列写入，序列走完仍无空槽返回 false
    fn insert_data(&mut self, key: &'a K, data: &'a D) -> bool {
        let Some(bytes) = self.mode.view(key.key_bytes()) else {
            return true;
        };

        for index in self.strategy.probe_sequence(bytes, self.capacity) {
            self.stats.record(OperationType::Probe);
            let slot = &mut self.slots[index];
            match slot.key() {
                None => {
                    slot.replace(key, data);
                    self.entries += 1;
                    self.stats.record(OperationType::Insert);
                    return true;
                }
                Some(stored) if self.mode.keys_equal(stored.key_bytes(), bytes) => {
                    slot.set_data(data);
                    self.stats.record(OperationType::Update);
                    return true;
                }
                Some(_) => {}
            }
        }
        false
    }

    /// 容量扩至不小于两倍的最小素数并重新插入全部条目
    fn resize(&mut self) -> Result<(), AssocError> {
        let new_capacity = self
            .capacity
            .checked_mul(self.config.growth_factor)
            .and_then(next_prime)
            .ok_or(AssocError::CapacityOverflow { capacity: self.capacity })?;

        log_info!(
            "open address resize {} -> {} ({} entries)",
            self.capacity,
            new_capacity,
            self.entries
        );

        let mut grown = Self::build(
            self.mode,
            new_capacity,
            self.config.clone(),
            self.collaborators.clone(),
        )?;
        for (key, data) in self.iter() {
            grown.try_insert(key, data)?;
        }

        let nested = grown.stats.snapshot().resize_count;
        self.slots = grown.slots;
        self.capacity = grown.capacity;
        self.entries = grown.entries;
        self.stats.record_many(OperationType::Resize, nested + 1);
        Ok(())
    }

    /// 查询：遇到空槽或绕回起点即未找到
    pub fn lookup(&self, key: &K) -> Option<&'a D> {
        self.stats.record(OperationType::Lookup);
        let index = self.locate(key)?;
        self.stats.record(OperationType::Hit);
        self.slots[index].data()
    }

    pub fn count(&self) -> usize {
        self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn key_mode(&self) -> KeyMode {
        self.mode
    }

    /// 释放表自身的存储
    pub fn free(self) {
        log_debug!("open address table freed ({} entries)", self.entries);
    }
}

impl<'a, K: KeyBytes + ?Sized + 'a, D: ?Sized + 'a> AssocTable<'a> for OpenAddressTable<'a, K, D> {
    type Key = K;
    type Data = D;

    fn insert(&mut self, key: &'a K, data: &'a D) {
        OpenAddressTable::insert(self, key, data)
    }

    fn lookup(&self, key: &K) -> Option<&'a D> {
        OpenAddressTable::lookup(self, key)
    }

    fn count(&self) -> usize {
        self.entries
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn key_mode(&self) -> KeyMode {
        self.mode
    }
}

impl<K: ?Sized, D: ?Sized> fmt::Debug for OpenAddressTable<'_, K, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAddressTable")
            .field("size", &self.entries)
            .field("capacity", &self.capacity)
            .field("key_mode", &self.mode)
            .field("hash_algorithm", &self.strategy.algorithm())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::PanicOnFailure, hash::djb2, memory::BudgetAllocator};
    use std::sync::Arc;

    // 这组键在容量 17、37、79 下的主哈希互不冲突
    static INT_TEST_KEYS: [i32; 8] = [1, 0, 123, 10, 2, -7892, -90, 28];
    static INT_TEST_DATA: [i32; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    fn primary_slot(key: &i32, capacity: usize) -> usize {
        (djb2(&key.to_ne_bytes()) % capacity as u64) as usize
    }

    #[test]
    fn test_init() {
        let table: OpenAddressTable<'_, i32, i32> = OpenAddressTable::new(4);
        assert_eq!(table.capacity(), 17);
        assert_eq!(table.count(), 0);
        assert_eq!(table.key_mode().keysize(), 4);
    }

    #[test]
    fn test_negative_keysize_rejected() {
        let result: Result<OpenAddressTable<'_, str, u8>, _> = OpenAddressTable::try_new(-2);
        assert_eq!(result.unwrap_err(), AssocError::InvalidKeySize { keysize: -2 });
    }

    #[test]
    fn test_invalid_config() {
        for config in [
            OpenAddressConfig { initial_capacity: 16, ..Default::default() },
            OpenAddressConfig { initial_capacity: 5, ..Default::default() },
            OpenAddressConfig { max_load_factor: 1.0, ..Default::default() },
            OpenAddressConfig { growth_factor: 1, ..Default::default() },
        ] {
            let result = OpenAddressTable::<str, u8>::with_options(0, config, Collaborators::default());
            assert!(matches!(result, Err(AssocError::InvalidConfig { .. })));
        }
    }

    #[test]
    fn test_insert_at_primary_slot_across_resizes() {
        let mut table = OpenAddressTable::new(4);
        for (key, data) in INT_TEST_KEYS.iter().zip(&INT_TEST_DATA) {
            table.insert(key, data);
            assert_eq!(table.locate(key), Some(primary_slot(key, 17)));
        }

        table.resize().unwrap();
        assert_eq!(table.count(), 8);
        assert_eq!(table.capacity(), 37);
        for (key, data) in INT_TEST_KEYS.iter().zip(&INT_TEST_DATA) {
            assert_eq!(table.locate(key), Some(primary_slot(key, 37)));
            assert!(std::ptr::eq(table.lookup(key).unwrap(), data));
        }

        table.resize().unwrap();
        assert_eq!(table.capacity(), 79);
        assert_eq!(table.key_mode().keysize(), 4);
        for key in &INT_TEST_KEYS {
            assert_eq!(table.locate(key), Some(primary_slot(key, 79)));
        }
    }

    #[test]
    fn test_load_factor_trigger_uses_next_prime() {
        let keys: Vec<i32> = (0..12).collect();
        let mut table: OpenAddressTable<'_, i32, i32> = OpenAddressTable::new(4);

        // 10/17 未超过 0.6，第 11 个插入前不扩容
        for key in &keys[..11] {
            table.insert(key, key);
        }
        assert_eq!(table.capacity(), 17);
        assert_eq!(table.stats().resize_count, 0);

        // 11/17 > 0.6，下一次插入前扩容至 next_prime(34) = 37
        table.insert(&keys[11], &keys[11]);
        assert_eq!(table.capacity(), 37);
        assert_ne!(table.capacity(), 34);
        assert_eq!(table.count(), 12);
        assert_eq!(table.stats().resize_count, 1);
        for key in &keys {
            assert_eq!(table.lookup(key), Some(key));
        }
    }

    #[test]
    fn test_update_triggers_same_resize_check() {
        let keys: Vec<i32> = (0..11).collect();
        let other = 99;
        let mut table: OpenAddressTable<'_, i32, i32> = OpenAddressTable::new(4);
        for key in &keys {
            table.insert(key, key);
        }
        table.insert(&keys[0], &other);
        assert_eq!(table.count(), 11);
        assert_eq!(table.lookup(&keys[0]), Some(&99));
        assert_eq!(table.capacity(), 37);
    }

    #[test]
    fn test_string_update_not_duplicate() {
        let (a, b) = ("A", "B");
        let mut table: OpenAddressTable<'_, str, str> = OpenAddressTable::new(0);
        table.insert("test", a);
        table.insert("test", b);
        assert_eq!(table.count(), 1);
        assert_eq!(table.lookup("test"), Some("B"));
    }

    #[test]
    fn test_probe_sequence_matches_placement() {
        let keys: Vec<String> = (0..10).map(|i| format!("k{}", i)).collect();
        let mut table: OpenAddressTable<'_, String, String> = OpenAddressTable::new(0);
        for key in &keys {
            table.insert(key, key);
        }
        for key in &keys {
            let seq: Vec<usize> = table.probe_sequence(key).unwrap().collect();
            let again: Vec<usize> = table.probe_sequence(key).unwrap().collect();
            assert_eq!(seq, again, "探测序列应确定");
            assert!(seq.contains(&table.locate(key).unwrap()));
        }
    }

    #[test]
    fn test_lookup_absent() {
        let table: OpenAddressTable<'_, str, u8> = OpenAddressTable::new(0);
        assert_eq!(table.lookup("anything"), None);

        let one = 1u8;
        let mut table: OpenAddressTable<'_, str, u8> = OpenAddressTable::new(0);
        table.insert("present", &one);
        assert_eq!(table.lookup("absent"), None);
        assert_eq!(table.stats().hit_count, 0);
        assert_eq!(table.lookup("present"), Some(&1));
    }

    #[test]
    fn test_float_and_long_keys() {
        let float_keys: Vec<f32> = (0..5000).map(|i| i as f32 / 100.0).collect();
        let data: Vec<usize> = (0..5000).collect();
        let mut table: OpenAddressTable<'_, f32, usize> = OpenAddressTable::new(4);
        for (k, d) in float_keys.iter().zip(&data) {
            table.insert(k, d);
        }
        for (k, d) in float_keys.iter().zip(&data) {
            assert!(std::ptr::eq(table.lookup(k).unwrap(), d));
        }
        assert!(is_prime(table.capacity()));
        assert!(table.load_factor() <= 0.6 + 1.0 / table.capacity() as f64);

        let long_keys: Vec<i64> = (0..5000).map(|i| i * 1000).collect();
        let mut table: OpenAddressTable<'_, i64, usize> = OpenAddressTable::new(8);
        for (k, d) in long_keys.iter().zip(&data) {
            table.insert(k, d);
        }
        assert_eq!(table.count(), 5000);
        for (k, d) in long_keys.iter().zip(&data) {
            assert_eq!(table.lookup(k), Some(d));
        }
    }

    #[test]
    fn test_short_fixed_key_is_noop() {
        let d = 1u8;
        let mut table: OpenAddressTable<'_, [u8], u8> = OpenAddressTable::new(4);
        table.insert(b"ab".as_slice(), &d);
        assert_eq!(table.count(), 0);
        assert_eq!(table.lookup(b"ab".as_slice()), None);
    }

    #[test]
    #[should_panic(expected = "内存分配失败")]
    fn test_resize_failure_reported() {
        let slot_size = std::mem::size_of::<crate::memory::Slot<'_, i32, i32>>();
        let collaborators = Collaborators::default()
            .with_allocator(Arc::new(BudgetAllocator::new(slot_size * 17)))
            .with_failure(Arc::new(PanicOnFailure));
        let keys: Vec<i32> = (0..20).collect();
        let mut table: OpenAddressTable<'_, i32, i32> =
            OpenAddressTable::with_options(4, OpenAddressConfig::default(), collaborators).unwrap();
        for key in &keys {
            table.insert(key, key);
        }
    }
}
