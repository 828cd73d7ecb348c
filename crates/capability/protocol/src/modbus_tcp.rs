//! Modbus TCP 传输实现
//!
//! 基于 `tokio-modbus` 的 [`Connector`] / [`Transport`]。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let device = DeviceDescriptor::new("boiler", "192.168.1.100", 502);
//! let connector: Arc<dyn Connector> = Arc::new(ModbusTcpConnector);
//! let mut session = SessionManager::new(Arc::new(device), connector);
//! let raw = session.read_words(AccessFunction::ReadHoldingRegisters, 100, 2).await?;
//! ```

use crate::error::ProtocolError;
use crate::session::{Connector, Transport};
use crate::types::RawData;
use async_trait::async_trait;
use domain::{AccessFunction, DeviceDescriptor};
use std::net::SocketAddr;
use tokio_modbus::prelude::*;
use tracing::debug;

/// Modbus TCP 连接工厂
#[derive(Debug, Default, Clone, Copy)]
pub struct ModbusTcpConnector;

#[async_trait]
impl Connector for ModbusTcpConnector {
    async fn connect(&self, device: &DeviceDescriptor) -> Result<Box<dyn Transport>, ProtocolError> {
        let addr = resolve(device).await?;
        let ctx = tcp::connect_slave(addr, Slave(device.unit_id))
            .await
            .map_err(|e| ProtocolError::Connection(format!("{}: {}", addr, e)))?;

        debug!(
            target: "dk.session",
            device = %device.name,
            addr = %addr,
            "modbus tcp context ready"
        );

        Ok(Box::new(ModbusTcpTransport { ctx }))
    }
}

/// 解析主机名（IP 字面量直接返回）
async fn resolve(device: &DeviceDescriptor) -> Result<SocketAddr, ProtocolError> {
    let endpoint = device.endpoint();
    let mut addrs = tokio::net::lookup_host((device.host.as_str(), device.port))
        .await
        .map_err(|e| ProtocolError::Connection(format!("cannot resolve {}: {}", endpoint, e)))?;
    addrs
        .next()
        .ok_or_else(|| ProtocolError::Connection(format!("no address for {}", endpoint)))
}

/// 已连接的 Modbus TCP 会话
pub struct ModbusTcpTransport {
    ctx: tokio_modbus::client::Context,
}

#[async_trait]
impl Transport for ModbusTcpTransport {
    async fn read(
        &mut self,
        function: AccessFunction,
        address: u16,
        count: u16,
    ) -> Result<RawData, ProtocolError> {
        let raw = match function {
            AccessFunction::ReadCoils => {
                RawData::Bits(flatten(self.ctx.read_coils(address, count).await)?)
            }
            AccessFunction::ReadDiscreteInputs => {
                RawData::Bits(flatten(self.ctx.read_discrete_inputs(address, count).await)?)
            }
            AccessFunction::ReadHoldingRegisters => RawData::Registers(flatten(
                self.ctx.read_holding_registers(address, count).await,
            )?),
            AccessFunction::ReadInputRegisters => RawData::Registers(flatten(
                self.ctx.read_input_registers(address, count).await,
            )?),
        };

        debug!(
            target: "dk.session",
            function = function.code(),
            address,
            count,
            values = ?raw,
            "read modbus data"
        );

        Ok(raw)
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        self.ctx.disconnect().await.map_err(ProtocolError::Io)
    }
}

/// 拆开 tokio-modbus 的双层结果：外层为传输错误，内层为设备异常码
fn flatten<T>(response: tokio_modbus::Result<T>) -> Result<T, ProtocolError> {
    response
        .map_err(|e| ProtocolError::Modbus(e.to_string()))?
        .map_err(|e| ProtocolError::Exception(format!("{:?}", e)))
}
