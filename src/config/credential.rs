// ==========================================
// 洪涝风险监测系统 - 天气接口密钥
// ==========================================
// 红线: 密钥缺失/格式错误只禁用实时模式, 演示模式不受影响
// ==========================================

use crate::config::error::ConfigError;
use std::fmt;

/// 密钥固定长度
pub const CREDENTIAL_LENGTH: usize = 32;

/// 已校验的天气接口密钥
#[derive(Clone, PartialEq, Eq)]
pub struct WeatherCredential(String);

impl WeatherCredential {
    /// 校验并构造密钥
    ///
    /// 规则: 去除首尾空白后为 32 位 ASCII 字母数字
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        if key.len() != CREDENTIAL_LENGTH {
            return Err(ConfigError::MalformedCredential(format!(
                "长度应为 {}, 实际 {}",
                CREDENTIAL_LENGTH,
                key.len()
            )));
        }
        if !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::MalformedCredential(
                "包含非字母数字字符".to_string(),
            ));
        }
        Ok(Self(key.to_string()))
    }

    /// 取出明文 (仅用于请求参数)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

// 日志中不输出明文
impl fmt::Debug for WeatherCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeatherCredential(****{})", &self.0[CREDENTIAL_LENGTH - 4..])
    }
}
