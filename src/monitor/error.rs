// ==========================================
// 洪涝风险监测系统 - 监测调度错误类型
// ==========================================
// 说明: 除 Configuration / InvalidState 外均在周期内就地恢复
// ==========================================

use crate::config::ConfigError;
use crate::repository::{AreaDecodeError, RepositoryError};
use crate::weather::WeatherError;
use thiserror::Error;

/// 监测调度错误
#[derive(Error, Debug)]
pub enum MonitorError {
    // ===== 启动期错误 =====
    #[error("配置错误: {0}")]
    Configuration(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("当前状态不允许该操作: {0}")]
    InvalidState(String),

    // ===== 周期内错误 (记录日志后跳过) =====
    #[error("天气获取失败 (area_id={area_id}): {source}")]
    Fetch {
        area_id: String,
        source: WeatherError,
    },

    #[error(transparent)]
    Parse(#[from] AreaDecodeError),

    #[error("风险写回失败 (area_id={area_id}): {source}")]
    Persistence {
        area_id: String,
        source: RepositoryError,
    },

    #[error("区域列表读取失败: {0}")]
    Store(RepositoryError),
}

/// Result 类型别名
pub type MonitorResult<T> = Result<T, MonitorError>;
