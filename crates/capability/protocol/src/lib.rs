//! # 协议通信能力模块
//!
//! 控制器侧把同一份过程状态通过两种工业协议暴露，网关侧通过 Modbus TCP 拉取：
//! - **Modbus TCP 服务端**：线圈 + 保持寄存器映像
//! - **S7 服务端**：DB1 固定布局字节块
//! - **Modbus TCP 设备客户端**：网关每周期一次短连接读取
//!
//! ## 架构设计
//!
//! ```text
//! ProcessState (watch)
//!       │
//!       ├── run_image_refresher ──▶ ImagePublisher<RegisterImage> ──▶ serve_registers
//!       └── run_image_refresher ──▶ ImagePublisher<BlockImage>    ──▶ serve_block
//!
//! Gateway ── ModbusDeviceClient::read ──▶ RawDeviceReading
//! ```
//!
//! 两个刷新任务各自按周期（默认 200 ms）复制完整状态并以单次引用替换发布映像；
//! 请求处理只读已发布映像，因此不会读到跨节拍的混合字段。
//!
//! ## 地址布局
//!
//! | 协议 | 地址 | 含义 |
//! |------|------|------|
//! | Modbus | coil 0 | 运行 |
//! | Modbus | HR 0 / 1 / 2 | 转速 / 温度 (i16, 0.1 ℃) / 压力 (kPa) |
//! | S7 | DB1.DBX0.0 | 运行 |
//! | S7 | DB1.DBW2 / DBW4 / DBW6 | 转速 / 温度 / 压力（大端） |

mod device_client;
mod error;
mod image;
mod modbus_server;
mod s7_codec;
mod s7_server;
mod types;

pub use device_client::{DeviceReader, ModbusDeviceClient, decode_reading};
pub use error::ProtocolError;
pub use image::{
    BlockImage, ImagePublisher, ImageReader, ProcessImage, RegisterImage, run_image_refresher,
};
pub use modbus_server::serve_registers;
pub use s7_codec::{ItemResult, ReadItem};
pub use s7_server::serve_block;
pub use types::*;
