use crate::PipelineError;
use domain::{CellSnapshot, GatewaySnapshot};
use std::sync::{Arc, RwLock};

/// 最新快照的持有者。
///
/// 发布只替换一个 `Arc`，读者拿到的总是某一次完整发布的快照，不会看到构建中的数据。
pub struct SnapshotStore {
    current: RwLock<Arc<GatewaySnapshot>>,
}

impl SnapshotStore {
    /// 创建空快照存储（首个周期完成前 `updated_at_ms` 为 None）
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(GatewaySnapshot::default())),
        }
    }

    /// 整体替换快照。
    pub fn publish(&self, snapshot: GatewaySnapshot) {
        let snapshot = Arc::new(snapshot);
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = snapshot;
    }

    /// 最近一次发布的快照。
    pub fn current(&self) -> Arc<GatewaySnapshot> {
        let current = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&current)
    }

    /// 单个单元的视图，连同其所属快照的时间戳。
    pub fn cell(&self, cell_id: &str) -> Result<(Option<i64>, CellSnapshot), PipelineError> {
        let snapshot = self.current();
        snapshot
            .cell(cell_id)
            .cloned()
            .map(|cell| (snapshot.updated_at_ms, cell))
            .ok_or_else(|| PipelineError::UnknownCell(cell_id.to_string()))
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
