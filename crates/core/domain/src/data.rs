use crate::device::{AccessFunction, ValueType};
use std::fmt;

/// 解码后的点位值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingValue {
    Bool(bool),
    Int32(i32),
    Float32(f32),
}

impl ReadingValue {
    /// 值类别名（用于落库与日志）。
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int32",
            Self::Float32(_) => "float32",
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Bool(v) => f64::from(u8::from(*v)),
            Self::Int32(v) => f64::from(*v),
            Self::Float32(v) => f64::from(*v),
        }
    }
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{:.6}", v),
        }
    }
}

/// 单次点位读取的分类错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadingError {
    /// 值类型与读取功能不兼容（静态配置缺陷，不重试）
    #[error("config mismatch: value type {value_type} cannot be read with {access}")]
    ConfigMismatch {
        value_type: ValueType,
        access: AccessFunction,
    },
    /// 连接/超时/IO 失败（下个周期重连）
    #[error("transport error: {0}")]
    Transport(String),
    /// 短读或报文格式错误
    #[error("decode error: {0}")]
    Decode(String),
}

impl ReadingError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigMismatch { .. } => "config_mismatch",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
        }
    }
}

/// 每个点位每个周期产生一条的读数记录。
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub device_name: String,
    pub tag_name: String,
    /// 读取时刻（毫秒）
    pub ts_ms: i64,
    pub result: Result<ReadingValue, ReadingError>,
}

impl Reading {
    pub fn new(
        device_name: impl Into<String>,
        tag_name: impl Into<String>,
        result: Result<ReadingValue, ReadingError>,
    ) -> Self {
        Self {
            device_name: device_name.into(),
            tag_name: tag_name.into(),
            ts_ms: now_epoch_ms(),
            result,
        }
    }

    pub fn value(&self) -> Option<ReadingValue> {
        self.result.as_ref().ok().copied()
    }

    pub fn error(&self) -> Option<&ReadingError> {
        self.result.as_ref().err()
    }
}

/// 获取当前时间戳（毫秒）。
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
