// ==========================================
// 洪涝风险监测系统 - 监测调度层
// ==========================================
// 职责: 周期调度、演示场景、刷新通知
// 依赖: repository::AreaStore, weather::WeatherProvider, engine::RiskScoringEngine
// ==========================================

pub mod error;
pub mod notifier;
pub mod scenarios;
pub mod scheduler;

// 重导出
pub use error::{MonitorError, MonitorResult};
pub use notifier::{
    ChannelRefreshNotifier, LoggingRefreshNotifier, NoOpRefreshNotifier, RefreshEvent,
    RefreshNotifier,
};
pub use scenarios::{DemoScenario, ScenarioCatalog, DEMO_SCENARIOS};
pub use scheduler::{CycleReport, MonitorMode, MonitorState, MonitorStatus, MonitoringScheduler};
