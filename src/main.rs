// ==========================================
// 洪涝风险监测系统 - 命令行入口
// ==========================================
// 用法: flood-monitor [db_path] [live|demo]
// 默认: 数据库见 db::get_default_db_path, 模式 demo
// Ctrl-C 优雅停止 (进行中的批次执行完毕)
// ==========================================

use anyhow::{bail, Context};
use flood_risk_monitor::config::ConfigManager;
use flood_risk_monitor::db::{get_default_db_path, init_schema, open_sqlite_connection};
use flood_risk_monitor::monitor::{LoggingRefreshNotifier, MonitorMode, MonitoringScheduler};
use flood_risk_monitor::repository::SqliteAreaRepository;
use flood_risk_monitor::weather::{OpenWeatherProvider, WeatherProvider};
use flood_risk_monitor::{logging, APP_NAME, VERSION};
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!("==================================================");

    // 解析参数
    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(get_default_db_path);
    let mode = match args.next() {
        Some(raw) => match MonitorMode::parse(&raw) {
            Some(mode) => mode,
            None => bail!("未知模式: {} (可选 live / demo)", raw),
        },
        None => MonitorMode::Demo,
    };
    tracing::info!("使用数据库: {}", db_path);

    // 数据库
    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn).context("数据库初始化失败")?;
    let conn = Arc::new(Mutex::new(conn));

    // 配置
    let config_manager = ConfigManager::from_connection(Arc::clone(&conn));
    let monitor_config = config_manager
        .load_monitor_config()
        .context("监测参数加载失败")?;

    // 天气数据源 (密钥缺失或格式错误时只禁用实时模式)
    let weather: Option<Arc<dyn WeatherProvider>> = match config_manager.load_weather_credential() {
        Ok(credential) => {
            let provider = OpenWeatherProvider::new(
                credential,
                &config_manager.weather_base_url()?,
                config_manager.weather_timeout()?,
            )?;
            let provider: Arc<dyn WeatherProvider> = Arc::new(provider);
            Some(provider)
        }
        Err(e) => {
            tracing::warn!(error = %e, "天气接口密钥不可用, 实时模式已禁用");
            None
        }
    };

    let store = Arc::new(SqliteAreaRepository::from_connection(conn));
    let scheduler = MonitoringScheduler::new(
        store,
        weather,
        Arc::new(LoggingRefreshNotifier),
        monitor_config,
    );

    scheduler
        .start(mode)
        .await
        .with_context(|| format!("无法以 {} 模式启动监测", mode))?;

    tokio::signal::ctrl_c()
        .await
        .context("无法监听 Ctrl-C 信号")?;

    tracing::info!("收到停止信号, 等待当前批次完成...");
    scheduler.stop().await;

    let status = scheduler.status();
    tracing::info!(completed_cycles = status.completed_cycles, "已退出");
    Ok(())
}
