// ==========================================
// 洪涝风险监测系统 - 配置层
// ==========================================
// 职责: 监测参数与天气接口密钥
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod credential;
pub mod error;
pub mod monitor_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager, WEATHER_API_KEY_ENV};
pub use credential::{WeatherCredential, CREDENTIAL_LENGTH};
pub use error::{ConfigError, ConfigResult};
pub use monitor_config::MonitorConfig;
