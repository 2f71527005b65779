use crate::noise::NoiseSource;
use crate::state::StateHandle;
use domain::ProcessState;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

/// 泵的物理近似模型。
pub struct ProcessModel<N> {
    noise: N,
}

impl<N: NoiseSource> ProcessModel<N> {
    pub fn new(noise: N) -> Self {
        Self { noise }
    }

    /// 由当前状态计算下一拍状态。
    ///
    /// - 运行：压力 `500 + speed*55 ± 30`，温度 `150 + speed*0.2 ± 2`
    /// - 停机：压力每拍下降 50..=120（不低于 0），温度下降 1..=3（不低于 12.0 ℃）
    pub fn next_state(&mut self, current: ProcessState) -> ProcessState {
        let speed = current.speed.clamp(0, 100);
        let (pressure_kpa, temperature_tenths_c) = if current.running {
            (
                500 + speed * 55 + self.noise.draw(-30, 30),
                // speed 非负，整除即 floor(speed * 0.2)
                150 + speed / 5 + self.noise.draw(-2, 2),
            )
        } else {
            (
                (current.pressure_kpa - self.noise.draw(50, 120)).max(0),
                (current.temperature_tenths_c - self.noise.draw(1, 3)).max(120),
            )
        };

        ProcessState {
            running: current.running,
            speed,
            temperature_tenths_c,
            pressure_kpa,
        }
    }

    /// 推进一拍并整体发布。
    pub fn tick(&mut self, handle: &StateHandle) -> ProcessState {
        let next = self.next_state(handle.current());
        handle.publish(next);
        next
    }
}

/// 仿真循环：按固定节拍推进，直到任务被取消。
pub async fn run_simulation<N: NoiseSource>(
    mut model: ProcessModel<N>,
    handle: StateHandle,
    period: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let state = model.tick(&handle);
        debug!(
            target: "plc.sim",
            running = state.running,
            speed = state.speed,
            temp_c_x10 = state.temperature_tenths_c,
            kpa = state.pressure_kpa,
            "tick"
        );
    }
}
