// ==========================================
// 洪涝风险监测系统 - 核心库
// ==========================================
// 组成: 风险评分引擎 + 周期监测调度
// 技术栈: Rust + Tokio + SQLite
// 系统定位: 风险研判支持 (展示层由外部系统负责)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 风险评分
pub mod engine;

// 天气数据源层
pub mod weather;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 监测调度层
pub mod monitor;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FloodLevel, GroundCondition};

// 领域实体
pub use domain::{Area, AreaSnapshot, Coordinate, Geometry, RiskAssessment, WeatherSnapshot};

// 引擎
pub use engine::RiskScoringEngine;

// 仓储
pub use repository::{AreaStore, RiskUpdate, SqliteAreaRepository};

// 天气数据源
pub use weather::{OpenWeatherProvider, WeatherProvider};

// 监测调度
pub use monitor::{CycleReport, MonitorMode, MonitorState, MonitorStatus, MonitoringScheduler};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "洪涝风险监测系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
