//! 协议镜像：把 [`ProcessState`] 复制成协议专用的只读映像，并以单次引用替换的方式发布。
//!
//! 请求处理只读已发布的映像，从不直接访问过程状态。

use crate::types::{
    BLOCK_DB_NUMBER, BLOCK_SIZE, COIL_COUNT, COIL_RUNNING, HOLDING_REGISTER_COUNT,
    REG_TAGS_START, pressure_word, speed_word, temperature_word,
};
use domain::ProcessState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

/// 可由过程状态整体生成的协议映像。
pub trait ProcessImage: Send + Sync + 'static {
    fn capture(state: &ProcessState) -> Self;
}

/// Modbus 寄存器映像：线圈 + 保持寄存器（零基地址）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterImage {
    coils: Vec<bool>,
    holding: Vec<u16>,
}

impl RegisterImage {
    pub fn coils(&self) -> &[bool] {
        &self.coils
    }

    pub fn holding_registers(&self) -> &[u16] {
        &self.holding
    }
}

impl ProcessImage for RegisterImage {
    fn capture(state: &ProcessState) -> Self {
        let mut coils = vec![false; COIL_COUNT];
        let mut holding = vec![0u16; HOLDING_REGISTER_COUNT];
        coils[COIL_RUNNING as usize] = state.running;
        let start = REG_TAGS_START as usize;
        holding[start] = speed_word(state.speed);
        holding[start + 1] = temperature_word(state.temperature_tenths_c) as u16;
        holding[start + 2] = pressure_word(state.pressure_kpa);
        Self { coils, holding }
    }
}

/// S7 数据块映像（DB1，64 字节）。
///
/// | 字节 | 内容 |
/// |------|------|
/// | 0 bit0 | 运行 |
/// | 2-3 | 转速 u16 BE |
/// | 4-5 | 温度 i16 BE（0.1 ℃） |
/// | 6-7 | 压力 u16 BE（kPa） |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockImage {
    bytes: Vec<u8>,
}

impl BlockImage {
    pub fn db_number(&self) -> u16 {
        BLOCK_DB_NUMBER
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl ProcessImage for BlockImage {
    fn capture(state: &ProcessState) -> Self {
        let mut bytes = vec![0u8; BLOCK_SIZE];
        if state.running {
            bytes[0] |= 0x01;
        }
        bytes[2..4].copy_from_slice(&speed_word(state.speed).to_be_bytes());
        bytes[4..6].copy_from_slice(&temperature_word(state.temperature_tenths_c).to_be_bytes());
        bytes[6..8].copy_from_slice(&pressure_word(state.pressure_kpa).to_be_bytes());
        Self { bytes }
    }
}

/// 映像发布端（单写者）。
pub struct ImagePublisher<T> {
    sender: watch::Sender<Arc<T>>,
}

impl<T: ProcessImage> ImagePublisher<T> {
    pub fn new(state: &ProcessState) -> Self {
        let (sender, _) = watch::channel(Arc::new(T::capture(state)));
        Self { sender }
    }

    /// 由状态生成新映像并整体替换。
    pub fn refresh(&self, state: &ProcessState) {
        self.sender.send_replace(Arc::new(T::capture(state)));
    }

    pub fn reader(&self) -> ImageReader<T> {
        ImageReader {
            receiver: self.sender.subscribe(),
        }
    }
}

/// 映像读取端，可任意克隆给连接处理任务。
pub struct ImageReader<T> {
    receiver: watch::Receiver<Arc<T>>,
}

impl<T> Clone for ImageReader<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
        }
    }
}

impl<T> ImageReader<T> {
    /// 最近一次发布的完整映像。
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.receiver.borrow())
    }
}

/// 刷新任务：按固定周期读取整份过程状态并发布新映像。
pub async fn run_image_refresher<T: ProcessImage>(
    state: watch::Receiver<ProcessState>,
    publisher: ImagePublisher<T>,
    period: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let snapshot = *state.borrow();
        publisher.refresh(&snapshot);
        debug!(
            target: "plc.refresh",
            image = std::any::type_name::<T>(),
            "image refreshed"
        );
    }
}
