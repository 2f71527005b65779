//! 泵控制网络的核心领域模型。
//!
//! - 控制器侧：[`ProcessState`]（单个控制器的物理量记录）
//! - 网关侧：[`RawDeviceReading`] → [`CellAggregate`] → [`GatewaySnapshot`]

pub mod process;
pub mod snapshot;

pub use process::{ControllerIdentity, ProcessState, PumpSlot};
pub use snapshot::{
    CellAggregate, CellSnapshot, DeviceErrorEntry, GatewaySnapshot, PumpEntry, RawDeviceReading,
};
