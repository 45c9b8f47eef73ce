//! Temp Segment Store - 文件系统临时片段存储
//!
//! 实现 SegmentStorePort trait

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{PurgeReport, SegmentHandle, SegmentStorePort, StoreError};
use crate::domain::AudioFormat;

/// 文件系统临时片段存储
///
/// 所有请求共享同一个根目录；文件名带随机 token，互不冲突
pub struct TempSegmentStore {
    /// 临时目录
    base_dir: PathBuf,
    /// 片段格式（决定扩展名）
    format: AudioFormat,
}

impl TempSegmentStore {
    /// 创建存储，根目录不存在时立即创建
    pub async fn new(base_dir: impl AsRef<Path>, format: AudioFormat) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        Ok(Self { base_dir, format })
    }

    /// 获取存储根目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[async_trait]
impl SegmentStorePort for TempSegmentStore {
    fn allocate(&self, prefix: &str) -> SegmentHandle {
        let file_name = format!(
            "{}_{}.{}",
            prefix,
            Uuid::new_v4().simple(),
            self.format.extension()
        );
        SegmentHandle::new(self.base_dir.join(file_name))
    }

    async fn write(&self, handle: &SegmentHandle, data: &[u8]) -> Result<(), StoreError> {
        fs::write(handle.path(), data)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        tracing::debug!(path = %handle, size = data.len(), "Saved segment");

        Ok(())
    }

    async fn read(&self, handle: &SegmentHandle) -> Result<Vec<u8>, StoreError> {
        fs::read(handle.path()).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::FileNotFound(handle.to_string()),
            _ => StoreError::IoError(e.to_string()),
        })
    }

    async fn purge_all(&self, handles: &[SegmentHandle]) -> PurgeReport {
        let mut report = PurgeReport::default();

        for handle in handles {
            record_removal(&mut report, handle, fs::remove_file(handle.path()).await);
        }

        log_report(&report);
        report
    }

    fn purge_all_blocking(&self, handles: &[SegmentHandle]) -> PurgeReport {
        let mut report = PurgeReport::default();

        for handle in handles {
            record_removal(&mut report, handle, std::fs::remove_file(handle.path()));
        }

        log_report(&report);
        report
    }
}

/// 不存在的文件视为已删除
fn record_removal(report: &mut PurgeReport, handle: &SegmentHandle, result: std::io::Result<()>) {
    match result {
        Ok(()) => report.removed += 1,
        Err(e) if e.kind() == ErrorKind::NotFound => report.removed += 1,
        Err(e) => {
            tracing::warn!(path = %handle, error = %e, "Failed to remove temporary artifact");
            report.failed += 1;
        }
    }
}

fn log_report(report: &PurgeReport) {
    if report.removed > 0 || report.failed > 0 {
        tracing::debug!(
            removed = report.removed,
            failed = report.failed,
            "Purged temporary artifacts"
        );
    }
}
