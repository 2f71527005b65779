use domain::{CellAggregate, RawDeviceReading};

/// 单元流量上限。
pub const MAX_FLOW_RATE: i32 = 50;

const FLOW_PER_SPEED: f64 = 0.4;
const OUTLET_PRESSURE_FACTOR: f64 = 1.15;

fn pump_flow(reading: &RawDeviceReading) -> i32 {
    if reading.run {
        (reading.speed as f64 * FLOW_PER_SPEED).floor() as i32
    } else {
        0
    }
}

/// 由两台泵的原始读数计算单元过程指标。
///
/// 不可用的泵应传入 [`RawDeviceReading::IDLE`]。`dirty_filters` 与 `control_valves`
/// 是预留字段，本模型中恒为 `false` / `true`。
pub fn aggregate(pump1: &RawDeviceReading, pump2: &RawDeviceReading) -> CellAggregate {
    let flow_rate = (pump_flow(pump1) + pump_flow(pump2)).clamp(0, MAX_FLOW_RATE);
    let pressure_in = pump1.pressure_kpa.max(pump2.pressure_kpa);
    let pressure_out = if pressure_in > 0 {
        (pressure_in as f64 * OUTLET_PRESSURE_FACTOR).floor() as i32
    } else {
        0
    };

    CellAggregate {
        flow_rate,
        pressure_in,
        pressure_out,
        dirty_filters: false,
        control_valves: true,
    }
}
