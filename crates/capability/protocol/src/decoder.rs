//! 点位值解码
//!
//! 纯函数：(值类型, 读取功能, 原始数据) → 点位值。兼容性规则以查表方式声明，
//! 在发起任何读取之前检查。

use crate::types::RawData;
use domain::{AccessFunction, ReadingError, ReadingValue, ValueType};

/// 解码错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// 值类型与读取功能不兼容
    #[error("value type {value_type} cannot be read with {access}")]
    Incompatible {
        value_type: ValueType,
        access: AccessFunction,
    },

    /// 返回的字数少于所需
    #[error("short read: expected {expected} words, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// 报文形态错误
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<DecodeError> for ReadingError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Incompatible { value_type, access } => {
                ReadingError::ConfigMismatch { value_type, access }
            }
            other => ReadingError::Decode(other.to_string()),
        }
    }
}

/// 值类型 → 合法的读取功能
const COMPATIBILITY: &[(ValueType, &[AccessFunction])] = &[
    (
        ValueType::Bit,
        &[AccessFunction::ReadCoils, AccessFunction::ReadDiscreteInputs],
    ),
    (
        ValueType::Integer16,
        &[
            AccessFunction::ReadHoldingRegisters,
            AccessFunction::ReadInputRegisters,
        ],
    ),
    (
        ValueType::Float32,
        &[
            AccessFunction::ReadHoldingRegisters,
            AccessFunction::ReadInputRegisters,
        ],
    ),
];

/// 查表判断值类型与读取功能是否兼容
pub fn is_compatible(value_type: ValueType, access: AccessFunction) -> bool {
    COMPATIBILITY
        .iter()
        .find(|(candidate, _)| *candidate == value_type)
        .is_some_and(|(_, allowed)| allowed.contains(&access))
}

/// 兼容性检查，失败时返回 [`DecodeError::Incompatible`]
pub fn check_compatibility(
    value_type: ValueType,
    access: AccessFunction,
) -> Result<(), DecodeError> {
    if is_compatible(value_type, access) {
        Ok(())
    } else {
        Err(DecodeError::Incompatible { value_type, access })
    }
}

/// 32 位值在两个 16 位寄存器中的字节序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// 高寄存器在前、寄存器内高字节在前
    Abcd,
    /// ABCD 的完全反序
    Dcba,
}

impl ByteOrder {
    /// 保持寄存器按 ABCD，输入寄存器按 DCBA。
    pub fn for_access(access: AccessFunction) -> Self {
        match access {
            AccessFunction::ReadHoldingRegisters => Self::Abcd,
            AccessFunction::ReadInputRegisters => Self::Dcba,
            // 位读取不涉及浮点
            AccessFunction::ReadCoils | AccessFunction::ReadDiscreteInputs => Self::Abcd,
        }
    }
}

/// 两个寄存器按给定字节序组合为单精度浮点
pub fn decode_f32(words: [u16; 2], order: ByteOrder) -> f32 {
    let [a, b] = words[0].to_be_bytes();
    let [c, d] = words[1].to_be_bytes();
    let bytes = match order {
        ByteOrder::Abcd => [a, b, c, d],
        ByteOrder::Dcba => [d, c, b, a],
    };
    f32::from_be_bytes(bytes)
}

/// 单精度浮点按给定字节序拆为两个寄存器
pub fn encode_f32(value: f32, order: ByteOrder) -> [u16; 2] {
    let [a, b, c, d] = value.to_be_bytes();
    let (high, low) = match order {
        ByteOrder::Abcd => ([a, b], [c, d]),
        ByteOrder::Dcba => ([d, c], [b, a]),
    };
    [u16::from_be_bytes(high), u16::from_be_bytes(low)]
}

/// 解码一次读取的原始数据
pub fn decode(
    value_type: ValueType,
    access: AccessFunction,
    raw: &RawData,
) -> Result<ReadingValue, DecodeError> {
    check_compatibility(value_type, access)?;

    let expected = usize::from(value_type.word_count());
    let actual = raw.len();
    if actual < expected {
        return Err(DecodeError::ShortRead { expected, actual });
    }
    if actual > expected {
        return Err(DecodeError::Malformed(format!(
            "expected {} words, got {}",
            expected, actual
        )));
    }

    match (value_type, raw) {
        (ValueType::Bit, RawData::Bits(bits)) => Ok(ReadingValue::Bool(bits[0])),
        (ValueType::Integer16, RawData::Registers(words)) => {
            Ok(ReadingValue::Int32(i32::from(words[0])))
        }
        (ValueType::Float32, RawData::Registers(words)) => {
            let order = ByteOrder::for_access(access);
            Ok(ReadingValue::Float32(decode_f32([words[0], words[1]], order)))
        }
        (ValueType::Bit, RawData::Registers(_)) => Err(DecodeError::Malformed(
            "expected bits, got registers".to_string(),
        )),
        (_, RawData::Bits(_)) => Err(DecodeError::Malformed(
            "expected registers, got bits".to_string(),
        )),
    }
}
