//! Modbus TCP 设备客户端
//!
//! 网关每个周期对每台设备建立一次短连接：读线圈 0、读保持寄存器 0..3，然后断开。
//! 连接建立与两次读取共享同一个截止时间。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let client = ModbusDeviceClient::new();
//! let reading = client.read("10.10.0.11", 1502, Duration::from_secs(1)).await?;
//! ```

use crate::error::ProtocolError;
use crate::types::{COIL_RUNNING, REG_TAGS_COUNT, REG_TAGS_START};
use async_trait::async_trait;
use domain::RawDeviceReading;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::time::{Instant, timeout_at};
use tokio_modbus::prelude::*;
use tracing::debug;

/// 设备读取抽象（便于轮询周期替换为测试实现）。
#[async_trait]
pub trait DeviceReader: Send + Sync {
    async fn read(
        &self,
        address: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<RawDeviceReading, ProtocolError>;
}

/// 基于 tokio-modbus 的设备读取器。
#[derive(Debug, Clone, Default)]
pub struct ModbusDeviceClient;

impl ModbusDeviceClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceReader for ModbusDeviceClient {
    async fn read(
        &self,
        address: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<RawDeviceReading, ProtocolError> {
        let deadline = Instant::now() + timeout;

        let socket_addr = timeout_at(deadline, resolve(address, port))
            .await
            .map_err(|_| ProtocolError::Connect(format!("resolve {}:{} timed out", address, port)))??;

        let mut ctx = timeout_at(deadline, tcp::connect(socket_addr))
            .await
            .map_err(|_| ProtocolError::Connect(format!("connect to {} timed out", socket_addr)))?
            .map_err(|e| ProtocolError::Connect(format!("connect to {}: {}", socket_addr, e)))?;

        let result = match timeout_at(deadline, read_tags(&mut ctx)).await {
            Ok(result) => result,
            Err(_) => Err(ProtocolError::Protocol(format!(
                "no response from {} within {} ms",
                socket_addr,
                timeout.as_millis()
            ))),
        };
        let _ = ctx.disconnect().await;

        if let Ok(reading) = &result {
            debug!(target: "plc.modbus", addr = %socket_addr, reading = ?reading, "device read");
        }
        result
    }
}

async fn resolve(address: &str, port: u16) -> Result<SocketAddr, ProtocolError> {
    lookup_host((address, port))
        .await
        .map_err(|e| ProtocolError::Connect(format!("resolve {}:{}: {}", address, port, e)))?
        .next()
        .ok_or_else(|| ProtocolError::Connect(format!("no address for {}:{}", address, port)))
}

async fn read_tags(
    ctx: &mut tokio_modbus::client::Context,
) -> Result<RawDeviceReading, ProtocolError> {
    let coils = ctx
        .read_coils(COIL_RUNNING, 1)
        .await
        .map_err(|e| ProtocolError::Protocol(e.to_string()))?
        .map_err(|e| ProtocolError::Protocol(format!("exception: {:?}", e)))?;
    let registers = ctx
        .read_holding_registers(REG_TAGS_START, REG_TAGS_COUNT)
        .await
        .map_err(|e| ProtocolError::Protocol(e.to_string()))?
        .map_err(|e| ProtocolError::Protocol(format!("exception: {:?}", e)))?;
    decode_reading(&coils, &registers)
}

/// 把线圈与保持寄存器还原为原始读数。温度寄存器按 i16 解释。
pub fn decode_reading(coils: &[bool], registers: &[u16]) -> Result<RawDeviceReading, ProtocolError> {
    let run = *coils
        .first()
        .ok_or_else(|| ProtocolError::Protocol("empty coil response".to_string()))?;
    if registers.len() < REG_TAGS_COUNT as usize {
        return Err(ProtocolError::Protocol(format!(
            "expected {} holding registers, got {}",
            REG_TAGS_COUNT,
            registers.len()
        )));
    }
    Ok(RawDeviceReading {
        run,
        speed: registers[0] as i32,
        temperature_tenths_c: registers[1] as i16 as i32,
        pressure_kpa: registers[2] as i32,
    })
}
