//! 网关进程入口。
//!
//! 读取设备清单，启动后台轮询循环，并以 HTTP 暴露最新快照。

mod handlers;
mod middleware;
mod routes;
mod utils;

use plc_config::GatewayConfig;
use plc_pipeline::{PollCycle, SnapshotStore, run_poll_loop};
use plc_protocol::ModbusDeviceClient;
use plc_telemetry::init_tracing;
use std::sync::Arc;
use tracing::info;

/// 路由共享状态。
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub device_count: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 设备清单与轮询参数
    let config = GatewayConfig::from_env()?;
    init_tracing();

    let store = Arc::new(SnapshotStore::new());
    let cycle = PollCycle::new(
        config.devices.clone(),
        Arc::new(ModbusDeviceClient::new()),
        config.device_timeout(),
    );
    let state = AppState {
        store: Arc::clone(&store),
        device_count: cycle.device_count(),
    };
    info!(
        target: "plc.gateway",
        devices = state.device_count,
        poll_interval_ms = config.poll_interval_ms,
        device_timeout_ms = config.device_timeout_ms,
        http = %config.http_addr,
        "gateway starting"
    );

    // 后台轮询：与 HTTP 服务相互独立，HTTP 只读取已发布的快照
    let poller = tokio::spawn(run_poll_loop(cycle, store, config.poll_interval()));

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.abort();
    info!(target: "plc.gateway", "gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // 无法安装信号处理时不主动退出
        std::future::pending::<()>().await;
    }
}
