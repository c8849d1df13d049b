//! 槽位与槽位数组 - 借用键值引用的存储单元

use std::{alloc::Layout, fmt, mem, sync::Arc};

use crate::{error::AssocError, memory::MemoryAllocator};

/// 槽位：(键引用, 数据引用)，键为空即为空槽
pub struct Slot<'a, K: ?Sized, D: ?Sized> {
    entry: Option<(&'a K, &'a D)>,
}

impl<'a, K: ?Sized, D: ?Sized> Slot<'a, K, D> {
    pub const fn empty() -> Self {
        Self { entry: None }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn key(&self) -> Option<&'a K> {
        self.entry.map(|(key, _)| key)
    }

    pub fn data(&self) -> Option<&'a D> {
        self.entry.map(|(_, data)| data)
    }

    pub fn entry(&self) -> Option<(&'a K, &'a D)> {
        self.entry
    }

    /// 写入键值对，返回原有内容
    pub fn replace(&mut self, key: &'a K, data: &'a D) -> Option<(&'a K, &'a D)> {
        mem::replace(&mut self.entry, Some((key, data)))
    }

    /// 只更新数据引用，空槽不受影响
    pub fn set_data(&mut self, data: &'a D) {
        if let Some((_, slot_data)) = self.entry.as_mut() {
            *slot_data = data;
        }
    }
}

impl<K: ?Sized, D: ?Sized> Clone for Slot<'_, K, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: ?Sized, D: ?Sized> Copy for Slot<'_, K, D> {}

impl<K: ?Sized, D: ?Sized> Default for Slot<'_, K, D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: ?Sized, D: ?Sized> fmt::Debug for Slot<'_, K, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "Slot(empty)")
        } else {
            write!(f, "Slot(occupied)")
        }
    }
}

/// 定长槽位数组，创建时全部为空，释放时归还分配器
pub struct SlotArray<'a, K: ?Sized, D: ?Sized> {
    slots: Box<[Slot<'a, K, D>]>,
    layout: Layout,
    allocator: Arc<dyn MemoryAllocator>,
}

impl<'a, K: ?Sized, D: ?Sized> SlotArray<'a, K, D> {
    /// 分配 `len` 个空槽位
    pub fn allocate(len: usize, allocator: Arc<dyn MemoryAllocator>) -> Result<Self, AssocError> {
        let layout = Layout::array::<Slot<'a, K, D>>(len)
            .map_err(|_| AssocError::CapacityOverflow { capacity: len })?;
        allocator.allocate(layout)?;

        let mut slots = Vec::new();
        if slots.try_reserve_exact(len).is_err() {
            allocator.deallocate(layout);
            return Err(AssocError::AllocationFailed {
                size: layout.size(),
                align: layout.align(),
            });
        }
        slots.resize(len, Slot::empty());

        Ok(Self {
            slots: slots.into_boxed_slice(),
            layout,
            allocator,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slot<'a, K, D>> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot<'a, K, D>> {
        self.slots.iter()
    }

    /// 已占用槽位数
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_empty()).count()
    }
}

impl<'a, K: ?Sized, D: ?Sized> std::ops::Index<usize> for SlotArray<'a, K, D> {
    type Output = Slot<'a, K, D>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.slots[index]
    }
}

impl<K: ?Sized, D: ?Sized> std::ops::IndexMut<usize> for SlotArray<'_, K, D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.slots[index]
    }
}

impl<K: ?Sized, D: ?Sized> Drop for SlotArray<'_, K, D> {
    fn drop(&mut self) {
        // 只归还槽位数组本身，键值内存归调用方
        self.allocator.deallocate(self.layout);
    }
}

impl<K: ?Sized, D: ?Sized> fmt::Debug for SlotArray<'_, K, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotArray")
            .field("len", &self.slots.len())
            .field("occupied", &self.occupied())
            .finish()
    }
}
