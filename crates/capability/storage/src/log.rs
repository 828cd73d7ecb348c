//! 日志读数输出
//!
//! 未配置数据库时使用，每条读数输出一条 `dk.readings` 日志。

use async_trait::async_trait;
use dk_protocol::{ReadingSink, SinkError};
use domain::Reading;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReadingSink;

#[async_trait]
impl ReadingSink for TracingReadingSink {
    async fn accept(&self, reading: Reading) -> Result<(), SinkError> {
        match &reading.result {
            Ok(value) => info!(
                target: "dk.readings",
                device = %reading.device_name,
                tag = %reading.tag_name,
                ts_ms = reading.ts_ms,
                kind = value.kind(),
                value = %value,
                "reading"
            ),
            Err(err) => warn!(
                target: "dk.readings",
                device = %reading.device_name,
                tag = %reading.tag_name,
                ts_ms = reading.ts_ms,
                kind = err.kind(),
                error = %err,
                "reading failed"
            ),
        }
        Ok(())
    }
}
