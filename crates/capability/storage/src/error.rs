//! 存储层错误类型
//!
//! 封装底层错误：
//! - SQL 执行错误
//! - 连接错误

use dk_protocol::SinkError;

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct StorageError {
    message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<StorageError> for SinkError {
    fn from(err: StorageError) -> Self {
        SinkError::Write(err.to_string())
    }
}
