//! 网关轮询流水线：设备读取 → 单元聚合 → 快照发布。
//!
//! ```text
//! PollCycle::run_once
//!   ├── spawn DeviceReader::read × N（各自超时，互不影响）
//!   ├── build_snapshot（按单元分组，缺失泵位以待机读数补齐）
//!   └── SnapshotStore::publish（整体替换）
//! ```

mod aggregate;
mod poll;
mod store;

pub use aggregate::{MAX_FLOW_RATE, aggregate};
pub use poll::{DeviceOutcome, PollCycle, build_snapshot, run_poll_loop};
pub use store::SnapshotStore;

/// 流水线错误。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("unknown cell: {0}")]
    UnknownCell(String),
}
