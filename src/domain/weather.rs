// ==========================================
// 洪涝风险监测系统 - 天气快照
// ==========================================

use serde::{Deserialize, Serialize};

/// 预报降雨累计时长 (小时)
pub const FORECAST_HORIZON_HOURS: u32 = 24;

/// 天气快照 (嵌入在 Area 中, 由调度器更新)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub rainfall_mm_hr: f64,       // 当前降雨强度 (mm/h)
    pub forecast_rainfall_mm: f64, // 预报期内累计降雨 (mm)
    pub wind_speed_kmh: f64,       // 风速 (km/h)
    pub temperature_c: f64,        // 气温 (°C)
    pub storm_alert: Option<String>, // 风暴预警文本, None 表示无预警
}

impl WeatherSnapshot {
    /// 晴好无雨的默认快照
    pub fn calm() -> Self {
        Self::default()
    }

    /// 是否存在风暴预警
    pub fn has_storm_alert(&self) -> bool {
        self.storm_alert
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storm_alert_blank_text_is_not_alert() {
        let mut weather = WeatherSnapshot::calm();
        assert!(!weather.has_storm_alert());
        weather.storm_alert = Some("  ".to_string());
        assert!(!weather.has_storm_alert());
        weather.storm_alert = Some("Typhoon Signal No. 3".to_string());
        assert!(weather.has_storm_alert());
    }
}
