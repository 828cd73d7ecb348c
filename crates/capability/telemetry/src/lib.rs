//! 日志初始化与轮询计数。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 轮询指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub values: u64,
    pub config_mismatches: u64,
    pub transport_errors: u64,
    pub decode_errors: u64,
    pub connect_attempts: u64,
    pub connect_failures: u64,
    pub sink_failures: u64,
}

impl MetricsSnapshot {
    /// 已上报的读数总数（成功 + 各类错误）。
    pub fn readings(&self) -> u64 {
        self.values + self.config_mismatches + self.transport_errors + self.decode_errors
    }
}

/// 进程级轮询指标。
pub struct PollMetrics {
    cycles: AtomicU64,
    values: AtomicU64,
    config_mismatches: AtomicU64,
    transport_errors: AtomicU64,
    decode_errors: AtomicU64,
    connect_attempts: AtomicU64,
    connect_failures: AtomicU64,
    sink_failures: AtomicU64,
}

impl PollMetrics {
    pub fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            values: AtomicU64::new(0),
            config_mismatches: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            connect_attempts: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            values: self.values.load(Ordering::Relaxed),
            config_mismatches: self.config_mismatches.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for PollMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<PollMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static PollMetrics {
    METRICS.get_or_init(PollMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// 初始化 tracing；`RUST_LOG` 未设置时使用给定的默认过滤器。
pub fn init_tracing_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 记录完成的轮询周期。
pub fn record_cycle() {
    metrics().cycles.fetch_add(1, Ordering::Relaxed);
}

/// 记录成功解码的读数。
pub fn record_value() {
    metrics().values.fetch_add(1, Ordering::Relaxed);
}

/// 记录配置不兼容的点位读数。
pub fn record_config_mismatch() {
    metrics().config_mismatches.fetch_add(1, Ordering::Relaxed);
}

/// 记录传输失败。
pub fn record_transport_error() {
    metrics().transport_errors.fetch_add(1, Ordering::Relaxed);
}

/// 记录解码失败。
pub fn record_decode_error() {
    metrics().decode_errors.fetch_add(1, Ordering::Relaxed);
}

/// 记录一次连接尝试。
pub fn record_connect_attempt() {
    metrics().connect_attempts.fetch_add(1, Ordering::Relaxed);
}

/// 记录连接失败。
pub fn record_connect_failure() {
    metrics().connect_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录读数输出失败。
pub fn record_sink_failure() {
    metrics().sink_failures.fetch_add(1, Ordering::Relaxed);
}
