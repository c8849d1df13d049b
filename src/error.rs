//! 统一错误处理 - 错误类型与致命错误处理器

use std::fmt;

/// 关联表可能发生的错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssocError {
    #[error("无效键长度: {keysize} (必须 >= 0)")]
    InvalidKeySize {
        keysize: isize,
    },

    #[error("无效配置: {reason}")]
    InvalidConfig {
        reason: String,
    },

    #[error("内存分配失败 (大小: {size}, 对齐: {align})")]
    AllocationFailed {
        size: usize,
        align: usize,
    },

    #[error("容量溢出: {capacity} 无法再扩容")]
    CapacityOverflow {
        capacity: usize,
    },

    #[error("踢出链在 {resizes} 次扩容后仍未终止 (容量: {capacity})")]
    DisplacementCycle {
        capacity: usize,
        resizes: usize,
    },
}

impl AssocError {
    /// 获取错误恢复建议
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidKeySize { .. } => Some("键长度使用0(字符串)或正整数(定长二进制)"),
            Self::InvalidConfig { .. } => Some("检查配置参数"),
            Self::AllocationFailed { .. } => Some("检查系统内存或减小表大小"),
            Self::CapacityOverflow { .. } => Some("表已达到地址空间上限"),
            Self::DisplacementCycle { .. } => Some("尝试使用不同的哈希算法"),
        }
    }

    /// 判断错误是否可恢复
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidKeySize { .. } | Self::InvalidConfig { .. })
    }

    /// 是否为资源耗尽类错误
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailed { .. } | Self::CapacityOverflow { .. }
        )
    }
}

/// 致命错误处理器 - 接收无法在调用点返回的错误
///
/// 非 `try_` 操作遇到错误时交给处理器，处理器永不返回。
pub trait FailureHandler: Send + Sync {
    fn fail(&self, error: AssocError) -> !;
}

/// 默认处理器：记录日志后终止进程
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortOnFailure;

impl FailureHandler for AbortOnFailure {
    fn fail(&self, error: AssocError) -> ! {
        log_error!("fatal: {}", error);
        eprintln!("assoc-hashtable: {}", error);
        std::process::abort()
    }
}

/// 以 panic 报告错误，便于测试和可展开的宿主
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicOnFailure;

impl FailureHandler for PanicOnFailure {
    fn fail(&self, error: AssocError) -> ! {
        log_error!("fatal: {}", error);
        panic!("{}", error)
    }
}

impl fmt::Debug for dyn FailureHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FailureHandler")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = AssocError::InvalidKeySize { keysize: -1 };
        assert!(err.is_recoverable());
        assert!(!err.is_resource_exhausted());
        assert!(err.to_string().contains("-1"));

        let err = AssocError::AllocationFailed { size: 64, align: 8 };
        assert!(!err.is_recoverable());
        assert!(err.is_resource_exhausted());
    }

    #[test]
    fn test_every_error_has_suggestion() {
        let errors = [
            AssocError::InvalidKeySize { keysize: -3 },
            AssocError::InvalidConfig { reason: "x".into() },
            AssocError::AllocationFailed { size: 1, align: 1 },
            AssocError::CapacityOverflow { capacity: usize::MAX },
            AssocError::DisplacementCycle { capacity: 64, resizes: 8 },
        ];
        for err in errors {
            assert!(err.recovery_suggestion().is_some(), "{:?} 缺少恢复建议", err);
        }
    }

    #[test]
    #[should_panic(expected = "无效键长度")]
    fn test_panic_handler_reports_message() {
        PanicOnFailure.fail(AssocError::InvalidKeySize { keysize: -7 });
    }
}
