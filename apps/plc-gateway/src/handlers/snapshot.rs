//! 快照查询。
//!
//! - GET /api/tags
//! - GET /api/cells/:cell_id

use api_contract::{ApiResponse, CellDetailDto};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use plc_pipeline::PipelineError;

use crate::AppState;
use crate::utils::response::{cell_to_dto, cell_not_found_error, snapshot_to_dto};

pub async fn get_snapshot(State(state): State<AppState>) -> Response {
    let snapshot = state.store.current();
    (
        StatusCode::OK,
        Json(ApiResponse::success(snapshot_to_dto(&snapshot))),
    )
        .into_response()
}

pub async fn get_cell(State(state): State<AppState>, Path(cell_id): Path<String>) -> Response {
    match state.store.cell(&cell_id) {
        Ok((updated_at_ms, cell)) => (
            StatusCode::OK,
            Json(ApiResponse::success(CellDetailDto {
                cell: cell_id,
                updated_at_ms,
                detail: cell_to_dto(&cell),
            })),
        )
            .into_response(),
        Err(err @ PipelineError::UnknownCell(_)) => cell_not_found_error(err),
    }
}
