//! SQLite 读数输出
//!
//! 每条读数插入 `readings` 表一行；成功读数写 value 列，失败读数写 error 列。

use crate::connection::{connect_memory_pool, connect_pool};
use crate::error::StorageError;
use crate::models::ReadingRecord;
use async_trait::async_trait;
use dk_protocol::{ReadingSink, SinkError};
use domain::Reading;
use sqlx::{Row, SqlitePool};
use tracing::info;

const CREATE_TABLE: &str = "create table if not exists readings (\
     id integer primary key autoincrement, \
     device text not null, \
     tag text not null, \
     ts_ms integer not null, \
     value_kind text, \
     value real, \
     error_kind text, \
     error text)";

const CREATE_INDEX: &str =
    "create index if not exists readings_device_tag_ts on readings (device, tag, ts_ms)";

pub struct SqliteReadingSink {
    pub pool: SqlitePool,
}

impl SqliteReadingSink {
    /// 使用已有连接池并建表
    pub async fn new(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_INDEX).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// 打开数据库文件
    pub async fn open(db_path: &str) -> Result<Self, StorageError> {
        let pool = connect_pool(db_path).await?;
        let sink = Self::new(pool).await?;
        info!(target: "dk.sink", db_path = %db_path, "sqlite reading sink ready");
        Ok(sink)
    }

    /// 打开内存数据库
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        let pool = connect_memory_pool().await?;
        Self::new(pool).await
    }

    pub async fn insert(&self, record: &ReadingRecord) -> Result<(), StorageError> {
        sqlx::query(
            "insert into readings (device, tag, ts_ms, value_kind, value, error_kind, error) \
             values (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.device)
        .bind(&record.tag)
        .bind(record.ts_ms)
        .bind(&record.value_kind)
        .bind(record.value)
        .bind(&record.error_kind)
        .bind(&record.error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, StorageError> {
        let row = sqlx::query("select count(*) as n from readings")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    /// 最近的读数（新的在前）
    pub async fn recent(&self, limit: i64) -> Result<Vec<ReadingRecord>, StorageError> {
        let rows = sqlx::query(
            "select device, tag, ts_ms, value_kind, value, error_kind, error \
             from readings order by id desc limit ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ReadingRecord {
                    device: row.try_get("device")?,
                    tag: row.try_get("tag")?,
                    ts_ms: row.try_get("ts_ms")?,
                    value_kind: row.try_get("value_kind")?,
                    value: row.try_get("value")?,
                    error_kind: row.try_get("error_kind")?,
                    error: row.try_get("error")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ReadingSink for SqliteReadingSink {
    async fn accept(&self, reading: Reading) -> Result<(), SinkError> {
        let record = ReadingRecord::from_reading(&reading);
        self.insert(&record).await?;
        Ok(())
    }
}
