//! 数据库连接管理
//!
//! 提供 SQLite 连接池初始化：
//! - connect_pool：打开（必要时创建）数据库文件
//! - connect_memory_pool：进程内数据库（测试用）

use crate::error::StorageError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// 建立 SQLite 连接池
///
/// 数据库文件不存在时自动创建，最大连接数限制为 4。
pub async fn connect_pool(db_path: &str) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// 建立内存 SQLite 连接池
///
/// 内存库随连接关闭而消失，因此只保留一个常驻连接。
pub async fn connect_memory_pool() -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}
