// ==========================================
// 洪涝风险监测系统 - 天气数据源错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 天气数据获取错误
///
/// 调度器对所有变体一视同仁: 记录日志并跳过该区域本轮评估
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    #[error("天气接口返回非成功状态: status={status}, message={message}")]
    Http { status: u16, message: String },

    #[error("天气接口网络错误: {0}")]
    Network(String),

    #[error("天气接口请求超时")]
    Timeout,

    #[error("天气数据解析失败: {0}")]
    Decode(String),
}

impl WeatherError {
    /// 是否为可重试的瞬时错误 (网关类 5xx)
    pub fn is_transient(&self) -> bool {
        matches!(self, WeatherError::Http { status, .. } if matches!(status, 502..=504))
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Timeout
        } else if err.is_decode() {
            WeatherError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            WeatherError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            WeatherError::Network(err.to_string())
        }
    }
}

/// Result 类型别名
pub type WeatherResult<T> = Result<T, WeatherError>;
