pub mod data;
pub mod device;

pub use data::{Reading, ReadingError, ReadingValue, now_epoch_ms};
pub use device::{AccessFunction, DeviceDescriptor, TagDescriptor, ValueType};
