//! 设备与点位的静态描述（加载后不可变）。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 点位值类型。
///
/// 反序列化时同时接受配置文件里的简写（`Coil` / `Int` / `Real`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// 单个位（线圈或离散输入）
    #[serde(alias = "Coil")]
    Bit,
    /// 16 位无符号寄存器
    #[serde(alias = "Int")]
    Integer16,
    /// 两个连续寄存器组成的 IEEE-754 单精度浮点
    #[serde(alias = "Real")]
    Float32,
}

impl ValueType {
    /// 一次读取所需的位/寄存器数量。
    pub fn word_count(self) -> u16 {
        match self {
            Self::Bit | Self::Integer16 => 1,
            Self::Float32 => 2,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bit => "Bit",
            Self::Integer16 => "Integer16",
            Self::Float32 => "Float32",
        };
        f.write_str(name)
    }
}

/// 读取功能（Modbus 功能码 1..=4）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessFunction {
    /// 读线圈状态 (0x01)
    #[serde(alias = "Coil")]
    ReadCoils = 1,
    /// 读离散输入 (0x02)
    #[serde(alias = "Discrete")]
    ReadDiscreteInputs = 2,
    /// 读保持寄存器 (0x03)
    #[serde(alias = "Holding")]
    ReadHoldingRegisters = 3,
    /// 读输入寄存器 (0x04)
    #[serde(alias = "Input")]
    ReadInputRegisters = 4,
}

impl AccessFunction {
    /// Modbus 功能码。
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 是否按位读取（线圈/离散输入）。
    pub fn reads_bits(self) -> bool {
        matches!(self, Self::ReadCoils | Self::ReadDiscreteInputs)
    }
}

impl fmt::Display for AccessFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadCoils => "ReadCoils",
            Self::ReadDiscreteInputs => "ReadDiscreteInputs",
            Self::ReadHoldingRegisters => "ReadHoldingRegisters",
            Self::ReadInputRegisters => "ReadInputRegisters",
        };
        f.write_str(name)
    }
}

/// 单个监控点位。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDescriptor {
    pub name: String,
    pub address: u16,
    pub value_type: ValueType,
    pub access: AccessFunction,
}

impl TagDescriptor {
    pub fn new(
        name: impl Into<String>,
        address: u16,
        value_type: ValueType,
        access: AccessFunction,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            value_type,
            access,
        }
    }
}

/// 一台可达设备及其点位列表。
///
/// 点位顺序即上报顺序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub name: String,
    /// IP 或主机名
    pub host: String,
    pub port: u16,
    /// Modbus 从站/单元 ID
    pub unit_id: u8,
    /// 连接与单次读取的超时；为零表示不限时
    pub timeout: Duration,
    /// 轮询间隔；为零时各周期背靠背执行
    pub poll_interval: Duration,
    /// 首个周期是否跳过初始等待
    pub read_immediately: bool,
    pub tags: Vec<TagDescriptor>,
}

impl DeviceDescriptor {
    /// 使用默认参数构造设备（单元 ID 1、超时 3 秒、间隔 1 秒、先等待后读取）。
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            unit_id: 1,
            timeout: Duration::from_secs(3),
            poll_interval: Duration::from_secs(1),
            read_immediately: false,
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<TagDescriptor>) -> Self {
        self.tags = tags;
        self
    }

    /// `host:port` 形式的端点。
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
