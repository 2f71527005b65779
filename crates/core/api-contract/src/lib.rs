//! 稳定的 DTO 与 API 响应契约。
//!
//! 网关与控制器的 HTTP 输出都使用 camelCase 字段名；网关端点统一包裹在
//! [`ApiResponse`] 中，控制器诊断端点直接返回裸 JSON。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 标准 API 响应封装。
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 单台泵的读数（快照中的泵位条目）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpDto {
    pub run: bool,
    pub speed: i32,
    #[serde(rename = "tempCX10")]
    pub temp_c_x10: i32,
    pub kpa: i32,
    pub online: bool,
}

/// 单元聚合指标。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDto {
    pub flow_rate: i32,
    pub pressure_in: i32,
    pub pressure_out: i32,
    pub dirty_filters: bool,
    pub control_valves: bool,
}

/// 设备读取错误。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceErrorDto {
    pub pump: String,
    pub message: String,
}

/// 单元视图。`pumps` 的键为 `pump1` / `pump2`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDto {
    pub pumps: BTreeMap<String, PumpDto>,
    pub process: ProcessDto,
    pub errors: Vec<DeviceErrorDto>,
}

/// `GET /api/cells/{cell_id}` 返回结构。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDetailDto {
    pub cell: String,
    pub updated_at_ms: Option<i64>,
    #[serde(flatten)]
    pub detail: CellDto,
}

/// `GET /api/tags` 返回结构（完整快照）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDto {
    pub updated_at_ms: Option<i64>,
    pub cells: BTreeMap<String, CellDto>,
}

/// 健康检查。网关只填 `ok`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pump: Option<String>,
}

/// 控制器 `GET /local/tags`：当前过程状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTagsDto {
    pub cell_id: String,
    pub pump: String,
    pub run: bool,
    pub speed: i32,
    #[serde(rename = "tempCX10")]
    pub temp_c_x10: i32,
    pub kpa: i32,
}

/// 轮询指标。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollMetricsDto {
    pub poll_cycles: u64,
    pub device_read_success: u64,
    pub device_read_failure: u64,
    pub cycle_latency_ms_total: u64,
    pub cycle_latency_ms_max: u64,
    pub device_count: usize,
}
