//! 内存读数输出
//!
//! 仅用于本地测试和一次性运行。

use async_trait::async_trait;
use dk_protocol::{ReadingSink, SinkError};
use domain::Reading;
use std::sync::RwLock;
use tracing::warn;

/// 内存读数存储
#[derive(Debug, Default)]
pub struct InMemoryReadingSink {
    readings: RwLock<Vec<Reading>>,
}

impl InMemoryReadingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已接收的读数数量
    pub fn len(&self) -> usize {
        match self.readings.read() {
            Ok(readings) => readings.len(),
            Err(_) => {
                warn!(target: "dk.sink", "in-memory reading store lock poisoned");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 全部读数快照（按接收顺序）
    pub fn readings(&self) -> Vec<Reading> {
        match self.readings.read() {
            Ok(readings) => readings.clone(),
            Err(_) => {
                warn!(target: "dk.sink", "in-memory reading store lock poisoned");
                Vec::new()
            }
        }
    }

    /// 某个设备点位的全部读数
    pub fn readings_for(&self, device: &str, tag: &str) -> Vec<Reading> {
        self.readings()
            .into_iter()
            .filter(|r| r.device_name == device && r.tag_name == tag)
            .collect()
    }
}

#[async_trait]
impl ReadingSink for InMemoryReadingSink {
    async fn accept(&self, reading: Reading) -> Result<(), SinkError> {
        let mut readings = self
            .readings
            .write()
            .map_err(|_| SinkError::Unavailable("lock failed".to_string()))?;
        readings.push(reading);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ReadingValue;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_poisoned_lock_is_unavailable() {
        let sink = Arc::new(InMemoryReadingSink::new());
        sink.accept(Reading::new("plc", "T1", Ok(ReadingValue::Bool(true))))
            .await
            .unwrap();

        let poisoner = sink.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.readings.write().unwrap();
            panic!("poison");
        })
        .join();

        assert_eq!(sink.len(), 0);
        assert!(sink.readings().is_empty());
        let err = sink
            .accept(Reading::new("plc", "T1", Ok(ReadingValue::Bool(false))))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Unavailable(_)));
    }
}
