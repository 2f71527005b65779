//! 协议相关常量与工具函数

/// 寄存器映射：线圈数量
pub const COIL_COUNT: usize = 16;
/// 寄存器映射：保持寄存器数量
pub const HOLDING_REGISTER_COUNT: usize = 32;

/// 线圈地址：运行状态
pub const COIL_RUNNING: u16 = 0;
/// 保持寄存器起始地址：转速、温度、压力
pub const REG_TAGS_START: u16 = 0;
/// 标签寄存器数量
pub const REG_TAGS_COUNT: u16 = 3;

/// S7 数据块编号
pub const BLOCK_DB_NUMBER: u16 = 1;
/// S7 数据块长度（字节）
pub const BLOCK_SIZE: usize = 64;

/// 获取当前时间戳（毫秒）
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

pub(crate) fn speed_word(speed: i32) -> u16 {
    speed.clamp(0, u16::MAX as i32) as u16
}

pub(crate) fn temperature_word(temperature_tenths_c: i32) -> i16 {
    temperature_tenths_c.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

pub(crate) fn pressure_word(pressure_kpa: i32) -> u16 {
    pressure_kpa.clamp(0, u16::MAX as i32) as u16
}
