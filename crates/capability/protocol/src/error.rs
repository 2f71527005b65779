//! 协议错误类型定义

/// 协议通信错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 无法在超时内建立到设备的传输连接
    #[error("connect error: {0}")]
    Connect(String),

    /// 设备响应缺失或格式不符
    #[error("protocol error: {0}")]
    Protocol(String),

    /// 入站帧无法解析（服务端关闭该连接）
    #[error("frame error: {0}")]
    Frame(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
