//! 核心类型定义 - 键模式、键字节视图和子表选择

use std::{
    ffi::{CStr, CString},
    fmt,
    num::NonZeroUsize,
};

use crate::error::AssocError;

/// 键比较模式，在表初始化时确定且不可变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyMode {
    /// 以 NUL 结尾的字符串键 (keysize = 0)
    CString,
    /// 定长二进制键 (keysize = N > 0)
    Fixed(NonZeroUsize),
}

impl KeyMode {
    /// 从键长度参数解析模式，负数非法
    pub fn from_keysize(keysize: isize) -> Result<Self, AssocError> {
        match keysize {
            0 => Ok(Self::CString),
            n if n > 0 => Ok(Self::Fixed(NonZeroUsize::new(n as usize).ok_or(
                AssocError::InvalidKeySize { keysize },
            )?)),
            _ => Err(AssocError::InvalidKeySize { keysize }),
        }
    }

    /// 还原为键长度参数
    pub fn keysize(&self) -> usize {
        match self {
            Self::CString => 0,
            Self::Fixed(n) => n.get(),
        }
    }

    /// 按模式截取键的有效字节
    ///
    /// 字符串模式取到第一个 NUL 为止；定长模式取前 N 个字节，
    /// 不足 N 字节的键无法比较，返回 `None`。
    pub fn view<'k>(&self, raw: &'k [u8]) -> Option<&'k [u8]> {
        match self {
            Self::CString => {
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                Some(&raw[..end])
            }
            Self::Fixed(n) => raw.get(..n.get()),
        }
    }

    /// 按模式比较两个键
    pub fn keys_equal(&self, a: &[u8], b: &[u8]) -> bool {
        match (self.view(a), self.view(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CString => write!(f, "cstring"),
            Self::Fixed(n) => write!(f, "fixed({})", n),
        }
    }
}

/// 键特征 - 暴露调用方内存中键的原始字节
///
/// 表只借用键，不复制也不释放。
pub trait KeyBytes {
    fn key_bytes(&self) -> &[u8];
}

impl KeyBytes for [u8] {
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl<const N: usize> KeyBytes for [u8; N] {
    fn key_bytes(&self) -> &[u8] {
        self.as_slice()
    }
}

impl KeyBytes for Vec<u8> {
    fn key_bytes(&self) -> &[u8] {
        self.as_slice()
    }
}

impl KeyBytes for str {
    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl KeyBytes for String {
    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl KeyBytes for CStr {
    fn key_bytes(&self) -> &[u8] {
        self.to_bytes()
    }
}

impl KeyBytes for CString {
    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<T: KeyBytes + ?Sized> KeyBytes for &T {
    fn key_bytes(&self) -> &[u8] {
        (**self).key_bytes()
    }
}

macro_rules! impl_key_bytes_for_primitive {
    ($($t:ty),* $(,)?) => {
        $(
            impl KeyBytes for $t {
                fn key_bytes(&self) -> &[u8] {
                    // 无填充的数值类型，按内存布局直接视为字节
                    unsafe {
                        std::slice::from_raw_parts(
                            (self as *const $t).cast::<u8>(),
                            std::mem::size_of::<$t>(),
                        )
                    }
                }
            }
        )*
    };
}

impl_key_bytes_for_primitive!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

/// Cuckoo 子表选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableSide {
    First,
    Second,
}

impl TableSide {
    /// 另一侧子表
    pub const fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

/// 操作类型，用于统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Insert,
    Update,
    Lookup,
    Hit,
    Kick,
    Probe,
    Resize,
    Skipped,
}

impl OperationType {
    pub const ALL: [OperationType; 8] = [
        Self::Insert,
        Self::Update,
        Self::Lookup,
        Self::Hit,
        Self::Kick,
        Self::Probe,
        Self::Resize,
        Self::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Lookup => "lookup",
            Self::Hit => "hit",
            Self::Kick => "kick",
            Self::Probe => "probe",
            Self::Resize => "resize",
            Self::Skipped => "skipped",
        }
    }
}
