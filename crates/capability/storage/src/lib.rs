//! # 读数存储模块
//!
//! 轮询读数的输出端，均实现 [`dk_protocol::ReadingSink`]：
//!
//! - [`InMemoryReadingSink`]：内存存储，用于测试和 `--once` 调试
//! - [`TracingReadingSink`]：每条读数输出一条日志（未配置数据库时的默认输出）
//! - [`SqliteReadingSink`]：写入 SQLite `readings` 表
//!
//! ## 表结构
//!
//! | 列 | 说明 |
//! |---|---|
//! | device, tag | 设备名、点位名 |
//! | ts_ms | 读数时间（Unix 毫秒） |
//! | value_kind, value | 成功读数的类型与数值 |
//! | error_kind, error | 失败读数的分类与描述 |
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let sink = SqliteReadingSink::open("readings.db").await?;
//! sink.accept(reading).await?;
//! let latest = sink.recent(10).await?;
//! ```

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod log;
pub mod models;
pub mod sqlite;

pub use connection::*;
pub use error::*;
pub use in_memory::InMemoryReadingSink;
pub use log::TracingReadingSink;
pub use models::*;
pub use sqlite::SqliteReadingSink;
