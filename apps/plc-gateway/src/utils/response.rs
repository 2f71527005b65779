//! 响应处理工具
//!
//! - 错误响应：cell_not_found_error
//! - 领域快照到 DTO 的转换：snapshot_to_dto, cell_to_dto

use api_contract::{ApiResponse, CellDto, DeviceErrorDto, ProcessDto, PumpDto, SnapshotDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::{CellSnapshot, GatewaySnapshot, PumpEntry};
use plc_pipeline::PipelineError;

pub fn cell_not_found_error(err: PipelineError) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("CELL.NOT_FOUND", err.to_string())),
    )
        .into_response()
}

pub fn snapshot_to_dto(snapshot: &GatewaySnapshot) -> SnapshotDto {
    SnapshotDto {
        updated_at_ms: snapshot.updated_at_ms,
        cells: snapshot
            .cells
            .iter()
            .map(|(cell_id, cell)| (cell_id.clone(), cell_to_dto(cell)))
            .collect(),
    }
}

pub fn cell_to_dto(cell: &CellSnapshot) -> CellDto {
    CellDto {
        pumps: cell
            .pumps
            .iter()
            .map(|(slot, entry)| (slot.to_string(), pump_to_dto(entry)))
            .collect(),
        process: ProcessDto {
            flow_rate: cell.process.flow_rate,
            pressure_in: cell.process.pressure_in,
            pressure_out: cell.process.pressure_out,
            dirty_filters: cell.process.dirty_filters,
            control_valves: cell.process.control_valves,
        },
        errors: cell
            .errors
            .iter()
            .map(|error| DeviceErrorDto {
                pump: error.pump.to_string(),
                message: error.message.clone(),
            })
            .collect(),
    }
}

fn pump_to_dto(entry: &PumpEntry) -> PumpDto {
    PumpDto {
        run: entry.reading.run,
        speed: entry.reading.speed,
        temp_c_x10: entry.reading.temperature_tenths_c,
        kpa: entry.reading.pressure_kpa,
        online: entry.online,
    }
}
