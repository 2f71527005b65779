use domain::ProcessState;
use tokio::sync::watch;

/// 控制器状态的唯一持有者。
///
/// 写入方（仿真节拍）每次替换整个 [`ProcessState`]；读取方拿到的总是某次替换后的完整副本。
#[derive(Clone)]
pub struct StateHandle {
    sender: watch::Sender<ProcessState>,
}

impl StateHandle {
    pub fn new(initial: ProcessState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// 当前状态副本。
    pub fn current(&self) -> ProcessState {
        *self.sender.borrow()
    }

    /// 整体替换状态，返回旧值。
    pub fn publish(&self, next: ProcessState) -> ProcessState {
        self.sender.send_replace(next)
    }

    /// 订阅状态变化（用于等待下一拍）。
    pub fn subscribe(&self) -> watch::Receiver<ProcessState> {
        self.sender.subscribe()
    }
}
