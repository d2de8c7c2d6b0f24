// ==========================================
// 洪涝风险监测系统 - 监测调度参数
// ==========================================

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 实时模式周期 (秒)
pub const DEFAULT_LIVE_INTERVAL_SECS: u64 = 300;
/// 演示模式周期 (秒)
pub const DEFAULT_DEMO_INTERVAL_SECS: u64 = 10;
/// 每批区域数
pub const DEFAULT_BATCH_SIZE: usize = 3;
/// 实时模式批间节流 (毫秒)
pub const DEFAULT_BATCH_PACING_MS: u64 = 1_000;
/// 单次天气请求超时 (秒)
pub const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 10;

/// 监测调度参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub live_interval: Duration,
    pub demo_interval: Duration,
    pub batch_size: usize,
    pub batch_pacing: Duration, // 仅实时模式生效
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            live_interval: Duration::from_secs(DEFAULT_LIVE_INTERVAL_SECS),
            demo_interval: Duration::from_secs(DEFAULT_DEMO_INTERVAL_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pacing: Duration::from_millis(DEFAULT_BATCH_PACING_MS),
        }
    }
}

impl MonitorConfig {
    /// 批次数量 = ceil(n / batch_size)
    pub fn batch_count(&self, area_count: usize) -> usize {
        area_count.div_ceil(self.batch_size.max(1))
    }
}
