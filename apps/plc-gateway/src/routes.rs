//! 路由定义
//!
//! - 健康检查：/health
//! - 完整快照：/api/tags
//! - 单元视图：/api/cells/:cell_id
//! - 轮询指标：/api/metrics

use crate::AppState;
use crate::handlers::*;
use crate::middleware::request_context;
use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tags", get(get_snapshot))
        .route("/api/cells/:cell_id", get(get_cell))
        .route("/api/metrics", get(get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_context))
}
