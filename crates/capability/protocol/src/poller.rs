//! 设备轮询循环
//!
//! 每台设备一个 [`DevicePoller`]，在独立任务中运行。每个周期：等待轮询间隔 →
//! 按配置顺序逐个点位读取、解码 → 每个点位输出一条读数。
//! 单个点位的任何失败都只影响该点位本身。

use crate::decoder::{decode, is_compatible};
use crate::session::{Connector, SessionManager, SessionState};
use crate::types::ReadingSink;
use dk_telemetry::{
    record_config_mismatch, record_cycle, record_decode_error, record_sink_failure,
    record_transport_error, record_value,
};
use domain::{DeviceDescriptor, Reading, ReadingError, ReadingValue, TagDescriptor};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 单个周期的结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub values: usize,
    pub config_mismatches: usize,
    pub transport_errors: usize,
    pub decode_errors: usize,
}

impl CycleSummary {
    pub fn total(&self) -> usize {
        self.values + self.config_mismatches + self.transport_errors + self.decode_errors
    }

    fn record(&mut self, result: &Result<ReadingValue, ReadingError>) {
        match result {
            Ok(_) => {
                self.values += 1;
                record_value();
            }
            Err(ReadingError::ConfigMismatch { .. }) => {
                self.config_mismatches += 1;
                record_config_mismatch();
            }
            Err(ReadingError::Transport(_)) => {
                self.transport_errors += 1;
                record_transport_error();
            }
            Err(ReadingError::Decode(_)) => {
                self.decode_errors += 1;
                record_decode_error();
            }
        }
    }
}

/// 单台设备的轮询驱动
pub struct DevicePoller {
    device: Arc<DeviceDescriptor>,
    session: SessionManager,
    sink: Arc<dyn ReadingSink>,
    /// 与 `device.tags` 一一对应的兼容性结论
    compatible: Vec<bool>,
}

impl DevicePoller {
    pub fn new(
        device: DeviceDescriptor,
        connector: Arc<dyn Connector>,
        sink: Arc<dyn ReadingSink>,
    ) -> Self {
        let device = Arc::new(device);
        let compatible = device
            .tags
            .iter()
            .map(|tag| {
                let ok = is_compatible(tag.value_type, tag.access);
                if !ok {
                    warn!(
                        target: "dk.poll",
                        device = %device.name,
                        tag = %tag.name,
                        value_type = %tag.value_type,
                        access = %tag.access,
                        "tag disabled: value type cannot be read with this function"
                    );
                }
                ok
            })
            .collect();

        Self {
            session: SessionManager::new(device.clone(), connector),
            device,
            sink,
            compatible,
        }
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// 运行轮询循环直到被取消
    ///
    /// 取消会立即打断周期前的等待；进行中的读取会完成或超时，然后停止本周期。
    pub async fn run(mut self, cancel: CancellationToken) {
        if self.device.poll_interval.is_zero() {
            warn!(
                target: "dk.poll",
                device = %self.device.name,
                "poll interval is zero, cycles run back to back"
            );
        }
        info!(
            target: "dk.poll",
            device = %self.device.name,
            endpoint = %self.device.endpoint(),
            tags = self.device.tags.len(),
            interval_ms = duration_ms(self.device.poll_interval),
            "device polling started"
        );

        let mut first = true;
        loop {
            let skip_wait = first && self.device.read_immediately;
            first = false;

            if !skip_wait {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.device.poll_interval) => {}
                }
            }
            if cancel.is_cancelled() {
                break;
            }

            self.cycle(&cancel).await;
        }

        self.session.disconnect().await;
        info!(
            target: "dk.poll",
            device = %self.device.name,
            "device polling stopped"
        );
    }

    /// 立即执行一个完整周期
    pub async fn poll_cycle(&mut self) -> CycleSummary {
        self.cycle(&CancellationToken::new()).await
    }

    /// 关闭会话
    pub async fn shutdown(&mut self) {
        self.session.disconnect().await;
    }

    async fn cycle(&mut self, cancel: &CancellationToken) -> CycleSummary {
        self.session.begin_cycle();

        let device = Arc::clone(&self.device);
        let sink = Arc::clone(&self.sink);
        let mut summary = CycleSummary::default();

        debug!(target: "dk.poll", device = %device.name, "polling device");

        for (index, tag) in device.tags.iter().enumerate() {
            let result = if self.compatible[index] {
                self.read_tag(tag).await
            } else {
                Err(ReadingError::ConfigMismatch {
                    value_type: tag.value_type,
                    access: tag.access,
                })
            };

            summary.record(&result);
            log_result(&device.name, tag, &result);
            emit(sink.as_ref(), Reading::new(&device.name, &tag.name, result)).await;

            if cancel.is_cancelled() {
                debug!(
                    target: "dk.poll",
                    device = %device.name,
                    "cycle interrupted by shutdown"
                );
                break;
            }
        }

        record_cycle();
        info!(
            target: "dk.poll",
            device = %device.name,
            values = summary.values,
            config_mismatches = summary.config_mismatches,
            transport_errors = summary.transport_errors,
            decode_errors = summary.decode_errors,
            "poll cycle finished"
        );
        summary
    }

    async fn read_tag(&mut self, tag: &TagDescriptor) -> Result<ReadingValue, ReadingError> {
        let raw = self
            .session
            .read_words(tag.access, tag.address, tag.value_type.word_count())
            .await
            .map_err(|e| ReadingError::Transport(e.to_string()))?;

        Ok(decode(tag.value_type, tag.access, &raw)?)
    }
}

async fn emit(sink: &dyn ReadingSink, reading: Reading) {
    let tag_name = reading.tag_name.clone();
    if let Err(e) = sink.accept(reading).await {
        record_sink_failure();
        warn!(
            target: "dk.sink",
            tag = %tag_name,
            error = %e,
            "failed to deliver reading"
        );
    }
}

fn log_result(device: &str, tag: &TagDescriptor, result: &Result<ReadingValue, ReadingError>) {
    match result {
        Ok(value) => debug!(
            target: "dk.poll",
            device = %device,
            tag = %tag.name,
            address = tag.address,
            function = tag.access.code(),
            value = %value,
            "tag read"
        ),
        Err(ReadingError::ConfigMismatch { .. }) => debug!(
            target: "dk.poll",
            device = %device,
            tag = %tag.name,
            "tag skipped: config mismatch"
        ),
        Err(err) => warn!(
            target: "dk.poll",
            device = %device,
            tag = %tag.name,
            address = tag.address,
            function = tag.access.code(),
            error = %err,
            "failed to read tag"
        ),
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }
}
