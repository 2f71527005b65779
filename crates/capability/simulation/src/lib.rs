//! # 过程模型
//!
//! 每个控制器持有一份 [`ProcessState`](domain::ProcessState)，由仿真节拍（默认 1 Hz）
//! 推进。状态以整体替换的方式发布到 [`StateHandle`]，协议刷新任务只会读到某一拍的完整值。
//!
//! ```text
//! ProcessModel::tick ──send_replace──▶ StateHandle ──borrow──▶ Modbus / S7 刷新任务
//! ```

mod model;
mod noise;
mod state;

pub use model::{ProcessModel, run_simulation};
pub use noise::{NoiseSource, RandomNoise, SequenceNoise};
pub use state::StateHandle;
