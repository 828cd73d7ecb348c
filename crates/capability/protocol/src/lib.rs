//! # 协议能力模块
//!
//! 点位解码与设备轮询引擎：
//! - **值解码**：值类型/读取功能兼容性查表、位/整数/浮点（ABCD、DCBA）解码
//! - **会话管理**：每台设备一个连接，失败后下个周期自动重连
//! - **Modbus TCP**：基于 `tokio-modbus` 的传输实现
//! - **轮询循环**：按间隔逐点读取，每个点位每个周期输出一条读数
//!
//! ## 架构设计
//!
//! ```text
//! DeviceDescriptor
//!       │
//!       ▼
//! DevicePoller ──read_words──▶ SessionManager ──▶ Connector / Transport
//!       │                                              (ModbusTcpConnector)
//!       ▼
//! decode(value_type, access, raw)
//!       │
//!       ▼
//! ReadingSink (由进程入口注入)
//! ```
//!
//! ## 兼容性
//!
//! | 值类型 | 合法读取功能 |
//! |---|---|
//! | Bit | ReadCoils, ReadDiscreteInputs |
//! | Integer16 | ReadHoldingRegisters, ReadInputRegisters |
//! | Float32 | ReadHoldingRegisters (ABCD), ReadInputRegisters (DCBA) |

mod decoder;
mod error;
mod modbus_tcp;
mod poller;
mod session;
mod types;

pub use decoder::{
    ByteOrder, DecodeError, check_compatibility, decode, decode_f32, encode_f32, is_compatible,
};
pub use error::ProtocolError;
pub use modbus_tcp::{ModbusTcpConnector, ModbusTcpTransport};
pub use poller::{CycleSummary, DevicePoller};
pub use session::{Connector, SessionManager, SessionState, Transport};
pub use types::{RawData, ReadingSink, SinkError};
