//! 统计模块 - 表级操作指标

pub mod operation;

pub use operation::{OperationStats, OperationStatsSnapshot};
