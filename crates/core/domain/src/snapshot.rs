//! 网关侧的读数、聚合与快照。

use crate::process::PumpSlot;
use std::collections::BTreeMap;

/// 单台设备一次轮询的原始读数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawDeviceReading {
    pub run: bool,
    pub speed: i32,
    pub temperature_tenths_c: i32,
    pub pressure_kpa: i32,
}

impl RawDeviceReading {
    /// 设备不可用时用于聚合的默认待机读数。
    pub const IDLE: RawDeviceReading = RawDeviceReading {
        run: false,
        speed: 0,
        temperature_tenths_c: 0,
        pressure_kpa: 0,
    };
}

/// 单元级过程指标。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAggregate {
    /// 流量 [0,50]
    pub flow_rate: i32,
    pub pressure_in: i32,
    pub pressure_out: i32,
    /// 预留字段，当前模型恒为 false
    pub dirty_filters: bool,
    /// 预留字段，当前模型恒为 true
    pub control_valves: bool,
}

/// 快照中某个泵位的条目。
///
/// `online == false` 时 `reading` 为 [`RawDeviceReading::IDLE`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpEntry {
    pub reading: RawDeviceReading,
    pub online: bool,
}

impl PumpEntry {
    pub fn online(reading: RawDeviceReading) -> Self {
        Self {
            reading,
            online: true,
        }
    }

    pub fn offline() -> Self {
        Self {
            reading: RawDeviceReading::IDLE,
            online: false,
        }
    }
}

/// 设备读取失败记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceErrorEntry {
    pub pump: PumpSlot,
    pub message: String,
}

/// 单个单元在一次轮询周期中的完整视图。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSnapshot {
    pub pumps: BTreeMap<PumpSlot, PumpEntry>,
    pub process: CellAggregate,
    pub errors: Vec<DeviceErrorEntry>,
}

impl CellSnapshot {
    /// 泵位条目；缺失时视为离线待机。
    pub fn pump(&self, slot: PumpSlot) -> PumpEntry {
        self.pumps
            .get(&slot)
            .copied()
            .unwrap_or_else(PumpEntry::offline)
    }
}

/// 网关快照：最近一次完成的轮询周期的全部单元。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GatewaySnapshot {
    /// 周期开始时间（毫秒）；首个周期完成前为 None
    pub updated_at_ms: Option<i64>,
    pub cells: BTreeMap<String, CellSnapshot>,
}

impl GatewaySnapshot {
    pub fn cell(&self, cell_id: &str) -> Option<&CellSnapshot> {
        self.cells.get(cell_id)
    }
}
