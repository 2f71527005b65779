//! 轮询指标快照。
//!
//! - GET /api/metrics

use api_contract::{ApiResponse, PollMetricsDto};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use plc_telemetry::metrics;

use crate::AppState;

pub async fn get_metrics(State(state): State<AppState>) -> Response {
    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(PollMetricsDto {
            poll_cycles: snapshot.poll_cycles,
            device_read_success: snapshot.device_read_success,
            device_read_failure: snapshot.device_read_failure,
            cycle_latency_ms_total: snapshot.cycle_latency_ms_total,
            cycle_latency_ms_max: snapshot.cycle_latency_ms_max,
            device_count: state.device_count,
        })),
    )
        .into_response()
}
