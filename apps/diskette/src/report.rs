//! `--validate` 的兼容性报告。

use dk_config::GatewayConfig;
use dk_protocol::is_compatible;
use domain::{AccessFunction, ValueType};
use std::fmt;

/// 单个点位的兼容性结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVerdict {
    pub device: String,
    pub tag: String,
    pub address: u16,
    pub value_type: ValueType,
    pub access: AccessFunction,
    pub compatible: bool,
}

impl fmt::Display for TagVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} @{}: {} via {} -> {}",
            self.device,
            self.tag,
            self.address,
            self.value_type,
            self.access,
            if self.compatible { "ok" } else { "config mismatch" }
        )
    }
}

/// 按配置顺序列出所有点位的结论
pub fn compatibility_report(config: &GatewayConfig) -> Vec<TagVerdict> {
    config
        .devices
        .iter()
        .flat_map(|device| {
            device.tags.iter().map(move |tag| TagVerdict {
                device: device.name.clone(),
                tag: tag.name.clone(),
                address: tag.address,
                value_type: tag.value_type,
                access: tag.access,
                compatible: is_compatible(tag.value_type, tag.access),
            })
        })
        .collect()
}
