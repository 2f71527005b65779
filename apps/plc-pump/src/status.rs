//! 控制器诊断端点（仅用于排查，网关不依赖）。
//!
//! - GET /health
//! - GET /local/tags

use api_contract::{HealthDto, LocalTagsDto};
use axum::{Json, Router, extract::State, routing::get};
use domain::ControllerIdentity;
use plc_simulation::StateHandle;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct StatusState {
    pub identity: ControllerIdentity,
    pub state: StateHandle,
}

pub fn create_status_router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/local/tags", get(local_tags))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health(State(status): State<StatusState>) -> Json<HealthDto> {
    Json(HealthDto {
        ok: true,
        cell: Some(status.identity.cell_id.clone()),
        pump: Some(status.identity.pump.to_string()),
    })
}

async fn local_tags(State(status): State<StatusState>) -> Json<LocalTagsDto> {
    let current = status.state.current();
    Json(LocalTagsDto {
        cell_id: status.identity.cell_id.clone(),
        pump: status.identity.pump.to_string(),
        run: current.running,
        speed: current.speed,
        temp_c_x10: current.temperature_tenths_c,
        kpa: current.pressure_kpa,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain::{ProcessState, PumpSlot};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn router(pump: PumpSlot) -> (Router, StateHandle) {
        let state = StateHandle::new(ProcessState::seed(pump));
        let router = create_status_router(StatusState {
            identity: ControllerIdentity::new("cell04", pump),
            state: state.clone(),
        });
        (router, state)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn health_reports_identity() {
        let (router, _) = router(PumpSlot::Pump2);
        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "cell": "cell04", "pump": "pump2"}));
    }

    #[tokio::test]
    async fn local_tags_follow_published_state() {
        let (router, state) = router(PumpSlot::Pump1);
        state.publish(ProcessState {
            running: true,
            speed: 70,
            temperature_tenths_c: 164,
            pressure_kpa: 4350,
        });
        let (status, body) = get_json(router, "/local/tags").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"cellId": "cell04", "pump": "pump1", "run": true, "speed": 70, "tempCX10": 164, "kpa": 4350})
        );
    }
}
