use std::fmt;
use std::str::FromStr;

/// 单元内的泵位。每个单元固定两台泵。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PumpSlot {
    Pump1,
    Pump2,
}

impl PumpSlot {
    /// 单元内全部泵位（按顺序）。
    pub const ALL: [PumpSlot; 2] = [PumpSlot::Pump1, PumpSlot::Pump2];

    pub fn as_str(&self) -> &'static str {
        match self {
            PumpSlot::Pump1 => "pump1",
            PumpSlot::Pump2 => "pump2",
        }
    }
}

impl fmt::Display for PumpSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 泵位名称解析失败。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPumpSlot(pub String);

impl fmt::Display for UnknownPumpSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown pump slot: {} (expected pump1 or pump2)", self.0)
    }
}

impl std::error::Error for UnknownPumpSlot {}

impl FromStr for PumpSlot {
    type Err = UnknownPumpSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pump1" => Ok(PumpSlot::Pump1),
            "pump2" => Ok(PumpSlot::Pump2),
            other => Err(UnknownPumpSlot(other.to_string())),
        }
    }
}

/// 控制器静态身份：所属单元 + 泵位。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerIdentity {
    pub cell_id: String,
    pub pump: PumpSlot,
}

impl ControllerIdentity {
    pub fn new(cell_id: impl Into<String>, pump: PumpSlot) -> Self {
        Self {
            cell_id: cell_id.into(),
            pump,
        }
    }
}

/// 控制器过程状态。
///
/// 四个字段总是作为一个整体被替换，读者不会看到跨节拍的混合值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessState {
    /// 泵是否运行
    pub running: bool,
    /// 转速百分比 [0,100]
    pub speed: i32,
    /// 温度（0.1 ℃）
    pub temperature_tenths_c: i32,
    /// 出口压力（kPa）
    pub pressure_kpa: i32,
}

impl ProcessState {
    /// 按泵位生成初始状态：一号泵运行，二号泵待机。
    pub fn seed(pump: PumpSlot) -> Self {
        match pump {
            PumpSlot::Pump1 => Self {
                running: true,
                speed: 50,
                temperature_tenths_c: 160,
                pressure_kpa: 3158,
            },
            PumpSlot::Pump2 => Self {
                running: false,
                speed: 0,
                temperature_tenths_c: 150,
                pressure_kpa: 0,
            },
        }
    }
}
