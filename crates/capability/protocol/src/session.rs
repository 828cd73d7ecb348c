//! 设备会话管理
//!
//! 每台设备一个会话，由该设备的轮询任务独占。状态机：
//!
//! ```text
//! Disconnected ──connect──▶ Connected
//!      ▲                       │ 连接/超时/IO 失败
//!      │ begin_cycle()         ▼
//!      └─────────────────── Failed
//! ```
//!
//! Failed 状态下的读取直接返回错误，不发起 IO；下个周期开始时重新连接。
//! 没有退避与重试上限：每个周期最多一次“重连或读取”。

use crate::error::ProtocolError;
use crate::types::RawData;
use async_trait::async_trait;
use dk_telemetry::{record_connect_attempt, record_connect_failure};
use domain::{AccessFunction, DeviceDescriptor};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 已建立的传输连接
#[async_trait]
pub trait Transport: Send {
    /// 按功能码读取 `count` 个位/寄存器
    async fn read(
        &mut self,
        function: AccessFunction,
        address: u16,
        count: u16,
    ) -> Result<RawData, ProtocolError>;

    /// 优雅关闭连接
    async fn close(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }
}

/// 传输连接工厂
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, device: &DeviceDescriptor) -> Result<Box<dyn Transport>, ProtocolError>;
}

/// 会话生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Failed,
}

/// 单台设备的会话
pub struct SessionManager {
    device: Arc<DeviceDescriptor>,
    connector: Arc<dyn Connector>,
    transport: Option<Box<dyn Transport>>,
    state: SessionState,
}

impl SessionManager {
    pub fn new(device: Arc<DeviceDescriptor>, connector: Arc<dyn Connector>) -> Self {
        Self {
            device,
            connector,
            transport: None,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 周期开始：失败的会话转为待重连
    pub fn begin_cycle(&mut self) {
        if self.state == SessionState::Failed {
            debug!(
                target: "dk.session",
                device = %self.device.name,
                "reconnect scheduled"
            );
            self.state = SessionState::Disconnected;
        }
    }

    /// 确保连接已建立
    pub async fn ensure_connected(&mut self) -> Result<(), ProtocolError> {
        match self.state {
            SessionState::Connected if self.transport.is_some() => return Ok(()),
            SessionState::Failed => return Err(ProtocolError::SessionFailed),
            _ => {}
        }

        record_connect_attempt();
        info!(
            target: "dk.session",
            device = %self.device.name,
            endpoint = %self.device.endpoint(),
            unit_id = self.device.unit_id,
            "connecting"
        );

        let connected = with_timeout(
            self.device.timeout,
            "connect",
            self.connector.connect(&self.device),
        )
        .await;

        match connected {
            Ok(transport) => {
                self.transport = Some(transport);
                self.state = SessionState::Connected;
                info!(
                    target: "dk.session",
                    device = %self.device.name,
                    endpoint = %self.device.endpoint(),
                    "connected"
                );
                Ok(())
            }
            Err(err) => {
                record_connect_failure();
                self.mark_failed(&err);
                Err(err)
            }
        }
    }

    /// 读取原始数据；必要时先建立连接
    pub async fn read_words(
        &mut self,
        function: AccessFunction,
        address: u16,
        count: u16,
    ) -> Result<RawData, ProtocolError> {
        if self.state == SessionState::Failed {
            return Err(ProtocolError::SessionFailed);
        }
        self.ensure_connected().await?;

        let timeout = self.device.timeout;
        let Some(transport) = self.transport.as_mut() else {
            return Err(ProtocolError::SessionFailed);
        };

        match with_timeout(timeout, "read", transport.read(function, address, count)).await {
            Ok(raw) => Ok(raw),
            Err(err) if err.keeps_session() => Err(err),
            Err(err) => {
                self.mark_failed(&err);
                Err(err)
            }
        }
    }

    /// 关闭连接（进程退出时调用）
    pub async fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(err) = transport.close().await {
                warn!(
                    target: "dk.session",
                    device = %self.device.name,
                    error = %err,
                    "failed to close connection"
                );
            }
        }
        self.state = SessionState::Disconnected;
    }

    fn mark_failed(&mut self, err: &ProtocolError) {
        self.transport = None;
        self.state = SessionState::Failed;
        warn!(
            target: "dk.session",
            device = %self.device.name,
            endpoint = %self.device.endpoint(),
            error = %err,
            "session failed"
        );
    }
}

/// 为传输操作加超时；`limit` 为零时不限时
async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T, ProtocolError>
where
    F: Future<Output = Result<T, ProtocolError>>,
{
    if limit.is_zero() {
        return fut.await;
    }
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::Timeout(format!(
            "{} exceeded {}ms",
            operation,
            limit.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 可控的连接工厂：前 `fail_connects` 次连接失败
    struct ScriptedConnector {
        fail_connects: usize,
        connects: AtomicUsize,
        reads: Arc<AtomicUsize>,
        fail_reads: bool,
    }

    struct ScriptedTransport {
        reads: Arc<AtomicUsize>,
        fail_reads: bool,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn read(
            &mut self,
            _function: AccessFunction,
            _address: u16,
            count: u16,
        ) -> Result<RawData, ProtocolError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(ProtocolError::Modbus("broken pipe".to_string()));
            }
            Ok(RawData::Registers(vec![7; usize::from(count)]))
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(
            &self,
            _device: &DeviceDescriptor,
        ) -> Result<Box<dyn Transport>, ProtocolError> {
            let attempt = self.connects.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_connects {
                return Err(ProtocolError::Connection("refused".to_string()));
            }
            Ok(Box::new(ScriptedTransport {
                reads: self.reads.clone(),
                fail_reads: self.fail_reads,
            }))
        }
    }

    fn scripted_session(fail_connects: usize, fail_reads: bool) -> (SessionManager, Arc<ScriptedConnector>) {
        let connector = Arc::new(ScriptedConnector {
            fail_connects,
            connects: AtomicUsize::new(0),
            reads: Arc::new(AtomicUsize::new(0)),
            fail_reads,
        });
        let device = Arc::new(DeviceDescriptor::new("plc", "127.0.0.1", 502));
        (SessionManager::new(device, connector.clone()), connector)
    }

    #[tokio::test]
    async fn test_connects_lazily_on_first_read() {
        let (mut session, connector) = scripted_session(0, false);
        assert_eq!(session.state(), SessionState::Disconnected);

        let raw = session
            .read_words(AccessFunction::ReadHoldingRegisters, 10, 2)
            .await
            .unwrap();
        assert_eq!(raw, RawData::Registers(vec![7, 7]));
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);

        // 已连接时不再重连
        session
            .read_words(AccessFunction::ReadHoldingRegisters, 10, 1)
            .await
            .unwrap();
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_session_short_circuits_until_next_cycle() {
        let (mut session, connector) = scripted_session(1, false);

        let err = session
            .read_words(AccessFunction::ReadCoils, 1, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Connection(_)));
        assert_eq!(session.state(), SessionState::Failed);

        // 同一周期内不再尝试连接
        let err = session
            .read_words(AccessFunction::ReadCoils, 2, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::SessionFailed));
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);

        session.begin_cycle();
        assert_eq!(session.state(), SessionState::Disconnected);
        session
            .read_words(AccessFunction::ReadInputRegisters, 3, 1)
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_read_failure_drops_transport() {
        let (mut session, connector) = scripted_session(0, true);
        let err = session
            .read_words(AccessFunction::ReadHoldingRegisters, 1, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Modbus(_)));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(connector.reads.load(Ordering::SeqCst), 1);

        let _ = session
            .read_words(AccessFunction::ReadHoldingRegisters, 1, 1)
            .await;
        assert_eq!(connector.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disconnect_resets_state() {
        let (mut session, _connector) = scripted_session(0, false);
        session.ensure_connected().await.unwrap();
        assert_eq!(session.state(), SessionState::Connected);
        session.disconnect().await;
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        struct HangingConnector;

        #[async_trait]
        impl Connector for HangingConnector {
            async fn connect(
                &self,
                _device: &DeviceDescriptor,
            ) -> Result<Box<dyn Transport>, ProtocolError> {
                std::future::pending().await
            }
        }

        let mut device = DeviceDescriptor::new("slow", "127.0.0.1", 502);
        device.timeout = Duration::from_millis(20);
        let mut session = SessionManager::new(Arc::new(device), Arc::new(HangingConnector));
        let err = session.ensure_connected().await.unwrap_err();
        assert!(matches!(err, ProtocolError::Timeout(_)));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[tokio::test]
    async fn test_read_timeout_drops_session_and_reconnects() {
        struct HangingTransport;

        #[async_trait]
        impl Transport for HangingTransport {
            async fn read(
                &mut self,
                _function: AccessFunction,
                _address: u16,
                _count: u16,
            ) -> Result<RawData, ProtocolError> {
                std::future::pending().await
            }
        }

        struct HangingReadConnector {
            connects: AtomicUsize,
        }

        #[async_trait]
        impl Connector for HangingReadConnector {
            async fn connect(
                &self,
                _device: &DeviceDescriptor,
            ) -> Result<Box<dyn Transport>, ProtocolError> {
                self.connects.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(HangingTransport))
            }
        }

        let connector = Arc::new(HangingReadConnector {
            connects: AtomicUsize::new(0),
        });
        let mut device = DeviceDescriptor::new("slow", "127.0.0.1", 502);
        device.timeout = Duration::from_millis(20);
        let mut session = SessionManager::new(Arc::new(device), connector.clone());

        let err = session
            .read_words(AccessFunction::ReadHoldingRegisters, 1, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Timeout(_)));
        assert_eq!(err.to_string(), "timeout: read exceeded 20ms");
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);

        session.begin_cycle();
        let err = session
            .read_words(AccessFunction::ReadHoldingRegisters, 1, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Timeout(_)));
        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
    }
}
