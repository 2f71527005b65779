//! 追踪、请求 ID 与轮询指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 轮询指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub poll_cycles: u64,
    pub device_read_success: u64,
    pub device_read_failure: u64,
    pub cycle_latency_ms_total: u64,
    pub cycle_latency_ms_max: u64,
}

/// 网关轮询指标。
pub struct TelemetryMetrics {
    poll_cycles: AtomicU64,
    device_read_success: AtomicU64,
    device_read_failure: AtomicU64,
    cycle_latency_ms_total: AtomicU64,
    cycle_latency_ms_max: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            poll_cycles: AtomicU64::new(0),
            device_read_success: AtomicU64::new(0),
            device_read_failure: AtomicU64::new(0),
            cycle_latency_ms_total: AtomicU64::new(0),
            cycle_latency_ms_max: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            poll_cycles: self.poll_cycles.load(Ordering::Relaxed),
            device_read_success: self.device_read_success.load(Ordering::Relaxed),
            device_read_failure: self.device_read_failure.load(Ordering::Relaxed),
            cycle_latency_ms_total: self.cycle_latency_ms_total.load(Ordering::Relaxed),
            cycle_latency_ms_max: self.cycle_latency_ms_max.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录设备读取成功次数。
pub fn record_device_read_success() {
    metrics().device_read_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录设备读取失败次数。
pub fn record_device_read_failure() {
    metrics().device_read_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录一次完成的轮询周期及其耗时（毫秒）。
pub fn record_poll_cycle(latency_ms: u64) {
    let metrics = metrics();
    metrics.poll_cycles.fetch_add(1, Ordering::Relaxed);
    metrics
        .cycle_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .cycle_latency_ms_max
        .fetch_max(latency_ms, Ordering::Relaxed);
}
