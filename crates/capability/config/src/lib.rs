//! 应用运行配置加载。
//!
//! - 控制器：环境变量（身份 + 端口 + 节拍）
//! - 网关：YAML 设备清单 + 环境变量覆盖轮询参数

use domain::{ControllerIdentity, PumpSlot};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::time::Duration;

/// 配置加载错误。启动阶段出现即视为致命。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("config io error: {0}: {1}")]
    Io(String, std::io::Error),
}

/// 控制器运行配置。
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub identity: ControllerIdentity,
    pub bind_host: String,
    pub modbus_port: u16,
    pub s7_port: u16,
    pub http_port: u16,
    pub tick_ms: u64,
    pub refresh_ms: u64,
}

impl ControllerConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let cell_id = env::var("CELL_ID").unwrap_or_else(|_| "cell01".to_string());
        let pump_name = env::var("PUMP_NAME").unwrap_or_else(|_| "pump1".to_string());
        let pump = pump_name
            .parse::<PumpSlot>()
            .map_err(|_| ConfigError::Invalid("PUMP_NAME".to_string(), pump_name))?;
        if cell_id.trim().is_empty() {
            return Err(ConfigError::Invalid("CELL_ID".to_string(), cell_id));
        }
        let bind_host = env::var("PLC_BIND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let modbus_port = read_u16_with_default("MODBUS_PORT", 1502)?;
        let s7_port = read_u16_with_default("S7_PORT", 1102)?;
        let http_port = read_u16_with_default("HTTP_PORT", 8080)?;
        let tick_ms = read_positive_u64_with_default("PLC_TICK_MS", 1000)?;
        let refresh_ms = read_positive_u64_with_default("PLC_REFRESH_MS", 200)?;

        Ok(Self {
            identity: ControllerIdentity::new(cell_id, pump),
            bind_host,
            modbus_port,
            s7_port,
            http_port,
            tick_ms,
            refresh_ms,
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

/// 网关需要轮询的单台设备。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub cell_id: String,
    pub pump: PumpSlot,
    pub address: String,
    pub port: u16,
}

/// 网关运行配置。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub http_addr: String,
    pub devices: Vec<DeviceConfig>,
    pub poll_interval_ms: u64,
    pub device_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct GatewayFile {
    gateway: HttpSection,
    defaults: DefaultsSection,
    #[serde(default)]
    poll: PollSection,
    #[serde(default)]
    plcs: Vec<PlcEntry>,
}

#[derive(Debug, Deserialize)]
struct HttpSection {
    #[serde(default = "default_bind")]
    bind: String,
    port: u16,
}

#[derive(Debug, Deserialize)]
struct DefaultsSection {
    modbus_port: u16,
}

#[derive(Debug, Default, Deserialize)]
struct PollSection {
    interval_ms: Option<u64>,
    device_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PlcEntry {
    cell: String,
    pump: String,
    ip: String,
    modbus_port: Option<u16>,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

impl GatewayConfig {
    /// 读取 `GATEWAY_CONFIG` 指向的 YAML，再应用环境变量覆盖。
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var("GATEWAY_CONFIG").unwrap_or_else(|_| "/app/plcs.yaml".to_string());
        if path.trim().is_empty() {
            return Err(ConfigError::Missing("GATEWAY_CONFIG".to_string()));
        }
        let raw = std::fs::read_to_string(&path).map_err(|err| ConfigError::Io(path, err))?;
        let mut config = Self::from_yaml_str(&raw)?;
        if let Some(value) = read_optional_positive_u64("GATEWAY_POLL_INTERVAL_MS")? {
            config.poll_interval_ms = value;
        }
        if let Some(value) = read_optional_positive_u64("GATEWAY_DEVICE_TIMEOUT_MS")? {
            config.device_timeout_ms = value;
        }
        Ok(config)
    }

    /// 解析设备清单 YAML。
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: GatewayFile =
            serde_yaml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;

        let mut seen = HashSet::new();
        let mut devices = Vec::with_capacity(file.plcs.len());
        for entry in file.plcs {
            let pump = entry
                .pump
                .parse::<PumpSlot>()
                .map_err(|err| ConfigError::Invalid("plcs.pump".to_string(), err.to_string()))?;
            if entry.cell.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "plcs.cell".to_string(),
                    "empty cell id".to_string(),
                ));
            }
            if !seen.insert((entry.cell.clone(), pump)) {
                return Err(ConfigError::Invalid(
                    "plcs".to_string(),
                    format!("duplicate device {}/{}", entry.cell, pump),
                ));
            }
            devices.push(DeviceConfig {
                cell_id: entry.cell,
                pump,
                address: entry.ip,
                port: entry.modbus_port.unwrap_or(file.defaults.modbus_port),
            });
        }

        let poll_interval_ms = positive_or_default(file.poll.interval_ms, 1000, "poll.interval_ms")?;
        let device_timeout_ms =
            positive_or_default(file.poll.device_timeout_ms, 1000, "poll.device_timeout_ms")?;

        Ok(Self {
            http_addr: format!("{}:{}", file.gateway.bind, file.gateway.port),
            devices,
            poll_interval_ms,
            device_timeout_ms,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_millis(self.device_timeout_ms)
    }
}

fn positive_or_default(value: Option<u64>, default: u64, key: &str) -> Result<u64, ConfigError> {
    match value {
        None => Ok(default),
        Some(0) => Err(ConfigError::Invalid(key.to_string(), "0".to_string())),
        Some(value) => Ok(value),
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_positive_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    Ok(read_optional_positive_u64(key)?.unwrap_or(default))
}

fn read_optional_positive_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => match value.parse::<u64>() {
            Ok(parsed) if parsed > 0 => Ok(Some(parsed)),
            _ => Err(ConfigError::Invalid(key.to_string(), value)),
        },
        Err(_) => Ok(None),
    }
}
