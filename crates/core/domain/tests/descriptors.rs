use domain::{
    AccessFunction, DeviceDescriptor, Reading, ReadingError, ReadingValue, TagDescriptor,
    ValueType,
};
use std::time::Duration;

#[test]
fn device_descriptor_builds_with_defaults() {
    let device = DeviceDescriptor::new("boiler", "192.168.1.10", 502).with_tags(vec![
        TagDescriptor::new("T1", 100, ValueType::Bit, AccessFunction::ReadCoils),
        TagDescriptor::new(
            "T2",
            200,
            ValueType::Float32,
            AccessFunction::ReadHoldingRegisters,
        ),
    ]);

    assert_eq!(device.endpoint(), "192.168.1.10:502");
    assert_eq!(device.unit_id, 1);
    assert_eq!(device.timeout, Duration::from_secs(3));
    assert!(!device.read_immediately);
    assert_eq!(device.tags[0].name, "T1");
    assert_eq!(device.tags[1].name, "T2");
}

#[test]
fn word_count_follows_value_type() {
    assert_eq!(ValueType::Bit.word_count(), 1);
    assert_eq!(ValueType::Integer16.word_count(), 1);
    assert_eq!(ValueType::Float32.word_count(), 2);
}

#[test]
fn access_function_codes() {
    assert_eq!(AccessFunction::ReadCoils.code(), 1);
    assert_eq!(AccessFunction::ReadDiscreteInputs.code(), 2);
    assert_eq!(AccessFunction::ReadHoldingRegisters.code(), 3);
    assert_eq!(AccessFunction::ReadInputRegisters.code(), 4);
    assert!(AccessFunction::ReadDiscreteInputs.reads_bits());
    assert!(!AccessFunction::ReadInputRegisters.reads_bits());
}

#[test]
fn reading_exposes_value_or_error() {
    let ok = Reading::new("boiler", "T1", Ok(ReadingValue::Int32(42)));
    assert_eq!(ok.value(), Some(ReadingValue::Int32(42)));
    assert!(ok.error().is_none());
    assert!(ok.ts_ms > 0);

    let err = Reading::new(
        "boiler",
        "T2",
        Err(ReadingError::ConfigMismatch {
            value_type: ValueType::Float32,
            access: AccessFunction::ReadCoils,
        }),
    );
    assert!(err.value().is_none());
    assert_eq!(err.error().map(ReadingError::kind), Some("config_mismatch"));
    assert_eq!(
        err.error().map(ToString::to_string).as_deref(),
        Some("config mismatch: value type Float32 cannot be read with ReadCoils")
    );
}
