//! diskette：Modbus TCP 点位轮询网关。
//!
//! 每台设备一个轮询任务，读数写入 SQLite（配置了 `db_path` 时）或输出到日志。

mod report;

use clap::Parser;
use dk_config::GatewayConfig;
use dk_protocol::{Connector, DevicePoller, ModbusTcpConnector, ReadingSink};
use dk_storage::{SqliteReadingSink, TracingReadingSink};
use dk_telemetry::{init_tracing, metrics};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "diskette", version, about = "Modbus TCP tag polling gateway")]
struct Args {
    /// YAML 配置文件
    #[arg(env = "DK_CONFIG")]
    config: PathBuf,

    /// 读数数据库路径（优先于配置文件与 DK_DB_PATH）
    #[arg(long)]
    db_path: Option<String>,

    /// 只检查配置并输出每个点位的兼容性结论
    #[arg(long)]
    validate: bool,

    /// 每台设备立即执行一个周期后退出
    #[arg(long, conflicts_with = "validate")]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在）
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing();

    let mut config = GatewayConfig::load(&args.config)?;
    if let Some(db_path) = args.db_path {
        config.db_path = Some(db_path);
    }
    info!(
        config = %args.config.display(),
        devices = config.devices.len(),
        tags = config.tag_count(),
        "config loaded"
    );

    if args.validate {
        let report = report::compatibility_report(&config);
        for verdict in &report {
            println!("{}", verdict);
        }
        let incompatible = report.iter().filter(|v| !v.compatible).count();
        if incompatible > 0 {
            return Err(format!("{} incompatible tag(s)", incompatible).into());
        }
        return Ok(());
    }

    let sink: Arc<dyn ReadingSink> = match &config.db_path {
        Some(db_path) => Arc::new(SqliteReadingSink::open(db_path).await?),
        None => {
            info!("no db_path configured, readings go to the log");
            Arc::new(TracingReadingSink)
        }
    };
    let connector: Arc<dyn Connector> = Arc::new(ModbusTcpConnector);

    if args.once {
        run_once(config, connector, sink).await;
    } else {
        run_until_ctrl_c(config, connector, sink).await?;
    }

    let snapshot = metrics().snapshot();
    info!(
        cycles = snapshot.cycles,
        readings = snapshot.readings(),
        values = snapshot.values,
        config_mismatches = snapshot.config_mismatches,
        transport_errors = snapshot.transport_errors,
        decode_errors = snapshot.decode_errors,
        connect_failures = snapshot.connect_failures,
        sink_failures = snapshot.sink_failures,
        "gateway stopped"
    );
    Ok(())
}

/// 每台设备并发执行一个周期
async fn run_once(
    config: GatewayConfig,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn ReadingSink>,
) {
    let mut handles = Vec::with_capacity(config.devices.len());
    for device in config.devices {
        let mut poller = DevicePoller::new(device, connector.clone(), sink.clone());
        handles.push(tokio::spawn(async move {
            let summary = poller.poll_cycle().await;
            poller.shutdown().await;
            (poller.device().name.clone(), summary)
        }));
    }

    for handle in handles {
        match handle.await {
            Ok((device, summary)) => info!(
                device = %device,
                readings = summary.total(),
                values = summary.values,
                "single cycle done"
            ),
            Err(e) => warn!(error = %e, "device task failed"),
        }
    }
}

/// 持续轮询，Ctrl-C 后取消所有设备任务并等待退出
async fn run_until_ctrl_c(
    config: GatewayConfig,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn ReadingSink>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let mut handles = Vec::with_capacity(config.devices.len());
    for device in config.devices {
        let poller = DevicePoller::new(device, connector.clone(), sink.clone());
        handles.push(tokio::spawn(poller.run(cancel.child_token())));
    }
    info!(devices = handles.len(), "gateway running, press Ctrl-C to stop");

    let signal = tokio::signal::ctrl_c().await;
    cancel.cancel();
    info!("shutdown requested");

    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "device task failed");
        }
    }
    signal?;
    Ok(())
}
