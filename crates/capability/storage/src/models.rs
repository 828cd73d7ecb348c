//! 读数落库记录

use domain::{Reading, ReadingValue};

/// 一条读数的扁平化表示（readings 表的一行）
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRecord {
    pub device: String,
    pub tag: String,
    pub ts_ms: i64,
    /// `bool` / `int32` / `float32`；错误读数为空
    pub value_kind: Option<String>,
    pub value: Option<f64>,
    /// `config_mismatch` / `transport` / `decode`；成功读数为空
    pub error_kind: Option<String>,
    pub error: Option<String>,
}

impl ReadingRecord {
    pub fn from_reading(reading: &Reading) -> Self {
        let (value_kind, value, error_kind, error) = match &reading.result {
            Ok(value) => (
                Some(value.kind().to_string()),
                Some(value.as_f64()),
                None,
                None,
            ),
            Err(err) => (
                None,
                None,
                Some(err.kind().to_string()),
                Some(err.to_string()),
            ),
        };
        Self {
            device: reading.device_name.clone(),
            tag: reading.tag_name.clone(),
            ts_ms: reading.ts_ms,
            value_kind,
            value,
            error_kind,
            error,
        }
    }

    /// 按 value_kind 还原类型化的值
    pub fn typed_value(&self) -> Option<ReadingValue> {
        let value = self.value?;
        match self.value_kind.as_deref()? {
            "bool" => Some(ReadingValue::Bool(value != 0.0)),
            "int32" => Some(ReadingValue::Int32(value as i32)),
            "float32" => Some(ReadingValue::Float32(value as f32)),
            _ => None,
        }
    }
}
