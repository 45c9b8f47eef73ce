//! Segment Store Port - 临时音频片段存储
//!
//! 每个临时产物（单轮音频、合并结果）对应一个唯一的句柄，
//! 由编排器在所有退出路径上统一清理

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 片段存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 临时产物句柄
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentHandle(PathBuf);

impl SegmentHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for SegmentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// 清理结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// 已删除（或本就不存在）的产物数量
    pub removed: usize,
    /// 删除失败的产物数量（仅记录日志）
    pub failed: usize,
}

impl PurgeReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Segment Store Port
#[async_trait]
pub trait SegmentStorePort: Send + Sync {
    /// 分配一个唯一命名的临时位置（不创建文件）
    fn allocate(&self, prefix: &str) -> SegmentHandle;

    /// 写入数据
    async fn write(&self, handle: &SegmentHandle, data: &[u8]) -> Result<(), StoreError>;

    /// 读取数据
    async fn read(&self, handle: &SegmentHandle) -> Result<Vec<u8>, StoreError>;

    /// 尽力删除所有句柄
    ///
    /// 单个删除失败只记录日志并计数，不中断其余删除，也从不向上返回错误
    async fn purge_all(&self, handles: &[SegmentHandle]) -> PurgeReport;

    /// 同步版本，供 Drop 路径使用（请求被取消时）
    fn purge_all_blocking(&self, handles: &[SegmentHandle]) -> PurgeReport;
}
