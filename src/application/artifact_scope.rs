//! 临时产物作用域
//!
//! 一次合成请求创建的所有临时产物都登记在这里。正常路径调用 `purge()`；
//! 若作用域在未清理时被丢弃（请求被取消），Drop 中同步清理

use std::sync::Arc;

use crate::application::ports::{PurgeReport, SegmentHandle, SegmentStorePort};

pub struct ArtifactScope {
    store: Arc<dyn SegmentStorePort>,
    handles: Vec<SegmentHandle>,
}

impl ArtifactScope {
    pub fn new(store: Arc<dyn SegmentStorePort>) -> Self {
        Self {
            store,
            handles: Vec::new(),
        }
    }

    /// 分配并登记一个临时位置
    pub fn allocate(&mut self, prefix: &str) -> SegmentHandle {
        let handle = self.store.allocate(prefix);
        self.handles.push(handle.clone());
        handle
    }

    /// 登记外部创建的产物（已登记的忽略）
    pub fn track(&mut self, handle: SegmentHandle) {
        if !self.handles.contains(&handle) {
            self.handles.push(handle);
        }
    }

    pub fn handles(&self) -> &[SegmentHandle] {
        &self.handles
    }

    /// 清理所有已登记的产物
    pub async fn purge(mut self) -> PurgeReport {
        let report = self.store.purge_all(&self.handles).await;
        self.handles.clear();
        report
    }
}

impl Drop for ArtifactScope {
    fn drop(&mut self) {
        if self.handles.is_empty() {
            return;
        }

        tracing::warn!(
            artifacts = self.handles.len(),
            "Artifact scope dropped before purge, cleaning up synchronously"
        );
        let handles = std::mem::take(&mut self.handles);
        self.store.purge_all_blocking(&handles);
    }
}
