//! 协议错误类型定义

/// 传输层错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 连接错误
    #[error("connection error: {0}")]
    Connection(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Modbus 传输错误
    #[error("modbus error: {0}")]
    Modbus(String),

    /// 设备返回异常码（链路正常）
    #[error("modbus exception: {0}")]
    Exception(String),

    /// 超时错误
    #[error("timeout: {0}")]
    Timeout(String),

    /// 会话处于失败状态，等待下个周期重连
    #[error("session failed, reconnect scheduled for next cycle")]
    SessionFailed,
}

impl ProtocolError {
    /// 出错后会话是否仍可继续使用。
    ///
    /// 只有设备异常应答不影响链路；其余错误都要丢弃连接。
    pub fn keeps_session(&self) -> bool {
        matches!(self, Self::Exception(_))
    }
}
