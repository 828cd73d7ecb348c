//! 协议相关类型定义

use async_trait::async_trait;
use domain::Reading;

/// 传输层返回的原始数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawData {
    /// 线圈/离散输入
    Bits(Vec<bool>),
    /// 保持/输入寄存器
    Registers(Vec<u16>),
}

impl RawData {
    pub fn len(&self) -> usize {
        match self {
            Self::Bits(bits) => bits.len(),
            Self::Registers(words) => words.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 读数输出错误
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),
    #[error("sink write failed: {0}")]
    Write(String),
}

/// 读数输出端
///
/// 多个设备任务会并发调用同一个实例。
#[async_trait]
pub trait ReadingSink: Send + Sync {
    async fn accept(&self, reading: Reading) -> Result<(), SinkError>;
}
