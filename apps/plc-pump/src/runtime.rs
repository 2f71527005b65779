//! 控制器运行时：一份过程状态，五个常驻任务。
//!
//! ```text
//! run_simulation ──publish──▶ StateHandle ──subscribe──┬─▶ refresher<RegisterImage> ─▶ serve_registers
//!                                  │                   └─▶ refresher<BlockImage>    ─▶ serve_block
//!                                  └──────────────────────▶ status router (/health, /local/tags)
//! ```

use crate::status::{StatusState, create_status_router};
use domain::{ControllerIdentity, ProcessState};
use plc_config::ControllerConfig;
use plc_protocol::{
    BlockImage, ImagePublisher, RegisterImage, run_image_refresher, serve_block, serve_registers,
};
use plc_simulation::{NoiseSource, ProcessModel, StateHandle, run_simulation};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::error;

/// 控制器的三个监听端口。
pub struct ControllerListeners {
    pub modbus: TcpListener,
    pub s7: TcpListener,
    pub http: TcpListener,
}

impl ControllerListeners {
    pub async fn bind(config: &ControllerConfig) -> io::Result<Self> {
        let host = config.bind_host.as_str();
        Ok(Self {
            modbus: TcpListener::bind((host, config.modbus_port)).await?,
            s7: TcpListener::bind((host, config.s7_port)).await?,
            http: TcpListener::bind((host, config.http_port)).await?,
        })
    }

    pub fn modbus_addr(&self) -> io::Result<SocketAddr> {
        self.modbus.local_addr()
    }

    pub fn s7_addr(&self) -> io::Result<SocketAddr> {
        self.s7.local_addr()
    }

    pub fn http_addr(&self) -> io::Result<SocketAddr> {
        self.http.local_addr()
    }
}

pub struct ControllerRuntime {
    identity: ControllerIdentity,
    state: StateHandle,
    tick: Duration,
    refresh: Duration,
}

impl ControllerRuntime {
    /// 以泵位的种子状态初始化。
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            identity: config.identity.clone(),
            state: StateHandle::new(ProcessState::seed(config.identity.pump)),
            tick: config.tick_interval(),
            refresh: config.refresh_interval(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// 启动全部任务。两份映像在启动前由当前状态初始化，服务端从第一个请求起就有数据。
    pub fn spawn<N>(&self, listeners: ControllerListeners, noise: N) -> JoinSet<()>
    where
        N: NoiseSource + 'static,
    {
        let initial = self.state.current();
        let registers = ImagePublisher::<RegisterImage>::new(&initial);
        let block = ImagePublisher::<BlockImage>::new(&initial);
        let register_reader = registers.reader();
        let block_reader = block.reader();

        let mut tasks = JoinSet::new();
        tasks.spawn(run_simulation(
            ProcessModel::new(noise),
            self.state.clone(),
            self.tick,
        ));
        tasks.spawn(run_image_refresher(
            self.state.subscribe(),
            registers,
            self.refresh,
        ));
        tasks.spawn(run_image_refresher(self.state.subscribe(), block, self.refresh));
        tasks.spawn(async move {
            if let Err(err) = serve_registers(listeners.modbus, register_reader).await {
                error!(target: "plc.modbus", error = %err, "register server stopped");
            }
        });
        tasks.spawn(async move {
            if let Err(err) = serve_block(listeners.s7, block_reader).await {
                error!(target: "plc.s7", error = %err, "block server stopped");
            }
        });

        let router = create_status_router(StatusState {
            identity: self.identity.clone(),
            state: self.state.clone(),
        });
        let http = listeners.http;
        tasks.spawn(async move {
            if let Err(err) = axum::serve(http, router).await {
                error!(target: "plc.sim", error = %err, "status server stopped");
            }
        });
        tasks
    }
}
