// ==========================================
// 洪涝风险监测系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope, 仅使用 global)
// 环境变量: FLOOD_MONITOR_WEATHER_API_KEY 覆盖库中的密钥
// ==========================================

use crate::config::credential::WeatherCredential;
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::monitor_config::{
    MonitorConfig, DEFAULT_BATCH_PACING_MS, DEFAULT_BATCH_SIZE, DEFAULT_DEMO_INTERVAL_SECS,
    DEFAULT_LIVE_INTERVAL_SECS, DEFAULT_WEATHER_TIMEOUT_SECS,
};
use crate::db::open_sqlite_connection;
use crate::weather::open_weather::DEFAULT_BASE_URL;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 密钥环境变量
pub const WEATHER_API_KEY_ENV: &str = "FLOOD_MONITOR_WEATHER_API_KEY";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ConfigResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::Storage(format!("锁获取失败: {}", e)))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照 (密钥除外)
    pub fn get_config_snapshot(&self) -> ConfigResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            if key == config_keys::WEATHER_API_KEY {
                continue;
            }
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 读取数值配置, 缺失或格式错误时使用默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    // ===== 监测调度配置 =====

    /// 加载监测调度参数
    pub fn load_monitor_config(&self) -> ConfigResult<MonitorConfig> {
        let live_secs =
            self.get_parsed_or_default(config_keys::LIVE_INTERVAL_SECS, DEFAULT_LIVE_INTERVAL_SECS)?;
        let demo_secs =
            self.get_parsed_or_default(config_keys::DEMO_INTERVAL_SECS, DEFAULT_DEMO_INTERVAL_SECS)?;
        let batch_size = self.get_parsed_or_default(config_keys::BATCH_SIZE, DEFAULT_BATCH_SIZE)?;
        let pacing_ms =
            self.get_parsed_or_default(config_keys::BATCH_PACING_MS, DEFAULT_BATCH_PACING_MS)?;

        if live_secs == 0 || demo_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: if live_secs == 0 {
                    config_keys::LIVE_INTERVAL_SECS.to_string()
                } else {
                    config_keys::DEMO_INTERVAL_SECS.to_string()
                },
                message: "监测周期必须大于 0".to_string(),
            });
        }
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: config_keys::BATCH_SIZE.to_string(),
                message: "批大小必须大于 0".to_string(),
            });
        }

        Ok(MonitorConfig {
            live_interval: Duration::from_secs(live_secs),
            demo_interval: Duration::from_secs(demo_secs),
            batch_size,
            batch_pacing: Duration::from_millis(pacing_ms),
        })
    }

    // ===== 天气数据源配置 =====

    /// 读取并校验天气接口密钥
    ///
    /// 优先级: 环境变量 > config_kv
    pub fn load_weather_credential(&self) -> ConfigResult<WeatherCredential> {
        let from_env = std::env::var(WEATHER_API_KEY_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());
        let raw = match from_env {
            Some(value) => value,
            None => self
                .get_config_value(config_keys::WEATHER_API_KEY)?
                .ok_or(ConfigError::MissingCredential)?,
        };
        WeatherCredential::parse(&raw)
    }

    /// 天气接口地址
    pub fn weather_base_url(&self) -> ConfigResult<String> {
        Ok(self
            .get_config_value(config_keys::WEATHER_BASE_URL)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))
    }

    /// 天气请求超时
    pub fn weather_timeout(&self) -> ConfigResult<Duration> {
        let secs = self
            .get_parsed_or_default(config_keys::WEATHER_TIMEOUT_SECS, DEFAULT_WEATHER_TIMEOUT_SECS)?;
        Ok(Duration::from_secs(secs.max(1)))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 天气数据源
    pub const WEATHER_API_KEY: &str = "weather_api_key";
    pub const WEATHER_BASE_URL: &str = "weather_base_url";
    pub const WEATHER_TIMEOUT_SECS: &str = "weather_timeout_secs";

    // 监测调度
    pub const LIVE_INTERVAL_SECS: &str = "live_interval_secs";
    pub const DEMO_INTERVAL_SECS: &str = "demo_interval_secs";
    pub const BATCH_SIZE: &str = "batch_size";
    pub const BATCH_PACING_MS: &str = "batch_pacing_ms";
}
