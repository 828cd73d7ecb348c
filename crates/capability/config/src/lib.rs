//! 网关配置加载。
//!
//! 配置来自 YAML 文件，加载后再应用环境变量覆盖：
//! - `DK_DB_PATH`：替换 `db_path`
//! - `DK_READ_IMMEDIATELY`（`1|true|on`）：所有设备启动后立即执行首个周期
//!
//! 校验只检查结构（设备名、主机、点位名）；值类型与读取功能的兼容性由轮询端判定。

use domain::{AccessFunction, DeviceDescriptor, TagDescriptor, ValueType};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 网关运行配置。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 读数数据库路径；为空时读数只输出到日志
    pub db_path: Option<String>,
    pub devices: Vec<DeviceDescriptor>,
}

impl GatewayConfig {
    /// 读取并校验配置文件，然后应用环境变量覆盖。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// 只读取并校验配置文件。
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(text)?;
        let config = Self {
            db_path: file.db_path.filter(|p| !p.trim().is_empty()),
            devices: file
                .modbus_tcp_devices
                .into_iter()
                .map(DeviceEntry::into_descriptor)
                .collect(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 结构校验，错误信息带上出错的设备/点位名。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::Invalid("no modbus_tcp_devices configured".to_string()));
        }

        let mut device_names = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                return Err(ConfigError::Invalid("device name is empty".to_string()));
            }
            if !device_names.insert(device.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate device name: {}",
                    device.name
                )));
            }
            if device.host.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "device {}: ip is empty",
                    device.name
                )));
            }

            let mut tag_names = HashSet::new();
            for tag in &device.tags {
                if tag.name.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "device {}: tag at address {} has an empty name",
                        device.name, tag.address
                    )));
                }
                if !tag_names.insert(tag.name.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "device {}: duplicate tag name: {}",
                        device.name, tag.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// 应用环境变量覆盖。
    pub fn apply_env_overrides(&mut self) {
        if let Some(db_path) = read_optional("DK_DB_PATH") {
            self.db_path = Some(db_path);
        }
        if read_bool_with_default("DK_READ_IMMEDIATELY", false) {
            for device in &mut self.devices {
                device.read_immediately = true;
            }
        }
    }

    /// 点位总数。
    pub fn tag_count(&self) -> usize {
        self.devices.iter().map(|d| d.tags.len()).sum()
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    db_path: Option<String>,
    #[serde(default)]
    modbus_tcp_devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct DeviceEntry {
    name: String,
    ip: String,
    port: u16,
    /// 秒；0 表示不限时
    timeout: u64,
    /// 秒
    poll_delay: u64,
    #[serde(default = "default_unit_id")]
    unit_id: u8,
    #[serde(default)]
    read_immediately: bool,
    #[serde(default)]
    tags: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
    address: u16,
    value_type: ValueType,
    modbus_function: AccessFunction,
}

fn default_unit_id() -> u8 {
    1
}

impl DeviceEntry {
    fn into_descriptor(self) -> DeviceDescriptor {
        let tags = self
            .tags
            .into_iter()
            .map(|t| TagDescriptor::new(t.name, t.address, t.value_type, t.modbus_function))
            .collect();
        let mut device = DeviceDescriptor::new(self.name, self.ip, self.port).with_tags(tags);
        device.unit_id = self.unit_id;
        device.timeout = Duration::from_secs(self.timeout);
        device.poll_interval = Duration::from_secs(self.poll_delay);
        device.read_immediately = self.read_immediately;
        device
    }
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
