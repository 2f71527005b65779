//! 泵控制器进程入口。
//!
//! 启动顺序：配置 → 日志 → 绑定三个监听端口 → 启动运行时任务，Ctrl-C 时全部中止。

mod runtime;
mod status;

use plc_config::ControllerConfig;
use plc_simulation::RandomNoise;
use plc_telemetry::init_tracing;
use runtime::{ControllerListeners, ControllerRuntime};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = ControllerConfig::from_env()?;
    init_tracing();

    let listeners = ControllerListeners::bind(&config).await?;
    let runtime = ControllerRuntime::new(&config);
    info!(
        target: "plc.sim",
        cell = %config.identity.cell_id,
        pump = %config.identity.pump,
        modbus = %listeners.modbus_addr()?,
        s7 = %listeners.s7_addr()?,
        http = %listeners.http_addr()?,
        "controller starting"
    );

    let mut tasks = runtime.spawn(listeners, RandomNoise::from_entropy());
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!(target: "plc.sim", "shutdown requested");
        }
        Some(exited) = tasks.join_next() => {
            // 任务本应常驻；任一退出即整体停止
            warn!(target: "plc.sim", ?exited, "controller task exited unexpectedly");
        }
    }

    tasks.abort_all();
    while tasks.join_next().await.is_some() {}
    Ok(())
}
