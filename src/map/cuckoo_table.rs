//! Cuckoo 哈希表 - 双子表、双哈希函数、有界踢出链

use std::{fmt, mem};

use crate::{
    error::AssocError,
    hash::{CuckooHashPair, HashAlgorithm},
    map::{AssocTable, Collaborators},
    memory::SlotArray,
    stats::{OperationStats, OperationStatsSnapshot},
    types::{KeyBytes, KeyMode, OperationType, TableSide},
};

/// 哈希表配置
#[derive(Clone, Debug, PartialEq)]
pub struct CuckooConfig {
    /// 初始总槽数，两个子表各占一半
    pub initial_capacity: usize,
    pub growth_factor: usize,
    /// 单次插入内允许的最大扩容次数
    pub max_growth_per_insert: usize,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for CuckooConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            growth_factor: 2,
            max_growth_per_insert: 8,
            hash_algorithm: HashAlgorithm::Classic,
        }
    }
}

impl CuckooConfig {
    pub fn validate(&self) -> Result<(), AssocError> {
        if self.initial_capacity < 2 || self.initial_capacity % 2 != 0 {
            return Err(AssocError::InvalidConfig {
                reason: format!("initial_capacity {} must be even and >= 2", self.initial_capacity),
            });
        }
        if self.growth_factor < 2 {
            return Err(AssocError::InvalidConfig {
                reason: format!("growth_factor {} must be >= 2", self.growth_factor),
            });
        }
        if self.max_growth_per_insert == 0 {
            return Err(AssocError::InvalidConfig {
                reason: "max_growth_per_insert must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Cuckoo哈希表
///
/// 子表 i 中的每个键都恰好位于 `hash_i(key) mod (capacity / 2)`，
/// 因此查询最多探测两个槽位。
pub struct CuckooTable<'a, K: ?Sized, D: ?Sized> {
    tables: [SlotArray<'a, K, D>; 2],
    capacity: usize,
    entries: usize,
    // 当前踢出链长度
    displacements: usize,
    mode: KeyMode,
    hasher: CuckooHashPair,
    config: CuckooConfig,
    collaborators: Collaborators,
    stats: OperationStats,
}

/// 按模式取键的有效字节
fn key_view<K: KeyBytes + ?Sized>(mode: KeyMode, key: &K) -> Option<&[u8]> {
    mode.view(key.key_bytes())
}

impl<'a, K: KeyBytes + ?Sized, D: ?Sized> CuckooTable<'a, K, D> {
    /// 使用默认配置创建，出错时交给默认的致命错误处理器
    pub fn new(keysize: isize) -> Self {
        let collaborators = Collaborators::default();
        match Self::with_options(keysize, CuckooConfig::default(), collaborators.clone()) {
            Ok(table) => table,
            Err(err) => collaborators.failure.fail(err),
        }
    }

    /// 使用默认配置创建，返回错误而不终止
    pub fn try_new(keysize: isize) -> Result<Self, AssocError> {
        Self::with_options(keysize, CuckooConfig::default(), Collaborators::default())
    }

    /// 使用指定配置和协作者创建
    pub fn with_options(
        keysize: isize,
        config: CuckooConfig,
        collaborators: Collaborators,
    ) -> Result<Self, AssocError> {
        let mode = KeyMode::from_keysize(keysize)?;
        config.validate()?;
        Self::build(mode, config.initial_capacity, config, collaborators)
    }

    fn build(
        mode: KeyMode,
        capacity: usize,
        config: CuckooConfig,
        collaborators: Collaborators,
    ) -> Result<Self, AssocError> {
        let half = capacity / 2;
        let first = SlotArray::allocate(half, collaborators.allocator.clone())?;
        let second = SlotArray::allocate(half, collaborators.allocator.clone())?;

        Ok(Self {
            tables: [first, second],
            capacity,
            entries: 0,
            displacements: 0,
            mode,
            hasher: CuckooHashPair::new(config.hash_algorithm),
            config,
            collaborators,
            stats: OperationStats::new(),
        })
    }

    /// 单个子表的槽数
    pub fn half_capacity(&self) -> usize {
        self.capacity / 2
    }

    pub fn config(&self) -> &CuckooConfig {
        &self.config
    }

    /// 最近一次踢出链的长度
    ///
    /// 每次扩容后清零，插入中途扩容时只反映扩容之后那条链。
    pub fn displacements(&self) -> usize {
        self.displacements
    }

    pub fn stats(&self) -> OperationStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn export_prometheus(&self) -> String {
        self.stats.export_prometheus("cuckoo")
    }

    /// 键在指定子表中的槽位
    pub fn slot_index(&self, side: TableSide, key: &K) -> Option<usize> {
        let bytes = key_view(self.mode, key)?;
        Some(self.hasher.slot(side, bytes, self.half_capacity()))
    }

    /// 键当前所在的子表和槽位
    pub fn locate(&self, key: &K) -> Option<(TableSide, usize)> {
        let bytes = key_view(self.mode, key)?;
        [TableSide::First, TableSide::Second].into_iter().find_map(|side| {
            let index = self.hasher.slot(side, bytes, self.half_capacity());
            let stored = self.tables[side.index()][index].key()?;
            self.mode
                .keys_equal(stored.key_bytes(), bytes)
                .then_some((side, index))
        })
    }

    /// 遍历所有已占用条目，顺序不定
    pub fn iter(&self) -> impl Iterator<Item = (&'a K, &'a D)> + '_ {
        self.tables
            .iter()
            .flat_map(|table| table.iter().filter_map(|slot| slot.entry()))
    }

    /// 指定子表中的已占用条目及其槽位
    pub fn entries_in(&self, side: TableSide) -> impl Iterator<Item = (usize, &'a K, &'a D)> + '_ {
        self.tables[side.index()]
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.entry().map(|(key, data)| (index, key, data)))
    }

    /// 插入或更新；空键(定长模式下不足 N 字节)静默跳过
    pub fn insert(&mut self, key: &'a K, data: &'a D) {
        if let Err(err) = self.try_insert(key, data) {
            let failure = self.collaborators.failure.clone();
            failure.fail(err);
        }
    }

    /// 插入或更新，扩容失败时返回错误
    ///
    /// 返回错误时表与调用前完全一致：踢出链已按原路撤销，
    /// 本次插入中途扩容得到的存储也被丢弃，只有新键未被接受。
    pub fn try_insert(&mut self, key: &'a K, data: &'a D) -> Result<(), AssocError> {
        let Some(bytes) = key_view(self.mode, key) else {
            log_debug!("cuckoo insert skipped: key shorter than {}", self.mode);
            self.stats.record(OperationType::Skipped);
            return Ok(());
        };

        // 已存在则原地更新
        for side in [TableSide::First, TableSide::Second] {
            let index = self.hasher.slot(side, bytes, self.capacity / 2);
            let slot = &mut self.tables[side.index()][index];
            let same = slot
                .key()
                .is_some_and(|stored| self.mode.keys_equal(stored.key_bytes(), bytes));
            if same {
                slot.set_data(data);
                self.stats.record(OperationType::Update);
                return Ok(());
            }
        }

        self.displace_insert(key, data)
    }

    /// 踢出链超过上限时先撤销再扩容，新键在扩容后的表中从第一子表重新开始
    fn displace_insert(&mut self, key: &'a K, data: &'a D) -> Result<(), AssocError> {
        // 本次插入第一次扩容前的存储，插入失败时恢复
        let mut original: Option<([SlotArray<'a, K, D>; 2], usize)> = None;
        let mut resizes = 0;

        loop {
            if self.displace_chain(key, data) {
                return Ok(());
            }

            if resizes == self.config.max_growth_per_insert {
                log_error!(
                    "displacement chain did not terminate after {} resizes (capacity {})",
                    resizes,
                    self.capacity
                );
                let capacity = self.capacity;
                self.restore(original);
                return Err(AssocError::DisplacementCycle { capacity, resizes });
            }

            match self.resize() {
                Ok(previous) => {
                    if original.is_none() {
                        original = Some(previous);
                    }
                    resizes += 1;
                }
                Err(err) => {
                    self.restore(original);
                    return Err(err);
                }
            }
        }
    }

    /// 在当前容量下走一次踢出链
    ///
    /// 踢出次数超过 `log2(capacity)` 时按记录的路径逆序换回，
    /// 表恢复到链开始前的状态并返回 false。
    fn displace_chain(&mut self, key: &'a K, data: &'a D) -> bool {
        let (mut key, mut data, mut side) = (key, data, TableSide::First);
        let mut path: Vec<(TableSide, usize)> = Vec::new();
        self.displacements = 0;

        loop {
            if self.displacements > self.capacity.ilog2() as usize {
                for &(side, index) in path.iter().rev() {
                    // 路径上的槽位在链中都已被占用
                    if let Some((k, d)) = self.tables[side.index()][index].replace(key, data) {
                        key = k;
                        data = d;
                    }
                }
                return false;
            }

            // 表中的键均已通过视图检查
            let bytes = key_view(self.mode, key).unwrap_or_default();
            let index = self.hasher.slot(side, bytes, self.capacity / 2);
            match self.tables[side.index()][index].replace(key, data) {
                None => {
                    self.entries += 1;
                    self.stats.record(OperationType::Insert);
                    return true;
                }
                Some((evicted_key, evicted_data)) => {
                    path.push((side, index));
                    self.displacements += 1;
                    self.stats.record(OperationType::Kick);
                    key = evicted_key;
                    data = evicted_data;
                    side = side.other();
                }
            }
        }
    }

    /// 放回插入前的存储；条目数在撤销后本就未变
    fn restore(&mut self, original: Option<([SlotArray<'a, K, D>; 2], usize)>) {
        if let Some((tables, capacity)) = original {
            log_warn!("cuckoo insert failed, restoring capacity {}", capacity);
            self.tables = tables;
            self.capacity = capacity;
            self.displacements = 0;
        }
    }

    /// 容量翻倍并按新哈希位置重新插入全部条目，返回被替换的旧存储及旧容量
    ///
    /// 失败时表保持不变。
    fn resize(&mut self) -> Result<([SlotArray<'a, K, D>; 2], usize), AssocError> {
        let new_capacity = self
            .capacity
            .checked_mul(self.config.growth_factor)
            .ok_or(AssocError::CapacityOverflow { capacity: self.capacity })?;

        log_info!(
            "cuckoo resize {} -> {} ({} entries, chain {})",
            self.capacity,
            new_capacity,
            self.entries,
            self.displacements
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
        let previous = mem::replace(&mut self.tables, grown.tables);
        let old_capacity = mem::replace(&mut self.capacity, grown.capacity);
        self.entries = grown.entries;
        self.displacements = 0;
        self.stats.record_many(OperationType::Resize, nested + 1);
        Ok((previous, old_capacity))
    }

    /// 查询：只探测两个固定位置，不追踪踢出链
    pub fn lookup(&self, key: &K) -> Option<&'a D> {
        self.stats.record(OperationType::Lookup);
        let bytes = key_view(self.mode, key)?;

        for side in [TableSide::First, TableSide::Second] {
            let index = self.hasher.slot(side, bytes, self.half_capacity());
            let slot = &self.tables[side.index()][index];
            let stored = slot.key()?;
            if self.mode.keys_equal(stored.key_bytes(), bytes) {
                self.stats.record(OperationType::Hit);
                return slot.data();
            }
        }
        None
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
        log_debug!("cuckoo table freed ({} entries)", self.entries);
    }
}

impl<'a, K: KeyBytes + ?Sized + 'a, D: ?Sized + 'a> AssocTable<'a> for CuckooTable<'a, K, D> {
    type Key = K;
    type Data = D;

    fn insert(&mut self, key: &'a K, data: &'a D) {
        CuckooTable::insert(self, key, data)
    }

    fn lookup(&self, key: &K) -> Option<&'a D> {
        CuckooTable::lookup(self, key)
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

impl<K: ?Sized, D: ?Sized> fmt::Debug for CuckooTable<'_, K, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CuckooTable")
            .field("size", &self.entries)
            .field("capacity", &self.capacity)
            .field("key_mode", &self.mode)
            .field("hash_algorithm", &self.hasher.algorithm())
            .finish()
    }
}
