// ==========================================
// 洪涝风险监测系统 - 天气数据源层
// ==========================================
// 职责: 定义天气数据源接口 (当前天气 + 预报降雨)
// 说明: 调度器只依赖 trait, HTTP 实现见 open_weather
// ==========================================

pub mod error;
pub mod open_weather;

use crate::domain::area::Coordinate;
use crate::domain::weather::WeatherSnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::{WeatherError, WeatherResult};
pub use open_weather::OpenWeatherProvider;

/// 当前天气
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub rainfall_mm_hr: f64,
    pub wind_speed_kmh: f64,
    pub temperature_c: f64,
    pub storm_alert: Option<String>,
}

/// 预报降雨
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastWeather {
    pub forecast_rainfall_mm: f64, // 预报期内累计
}

impl CurrentWeather {
    /// 与预报合并为天气快照
    pub fn into_snapshot(self, forecast: ForecastWeather) -> WeatherSnapshot {
        WeatherSnapshot {
            rainfall_mm_hr: self.rainfall_mm_hr,
            forecast_rainfall_mm: forecast.forecast_rainfall_mm,
            wind_speed_kmh: self.wind_speed_kmh,
            temperature_c: self.temperature_c,
            storm_alert: self.storm_alert,
        }
    }
}

// ==========================================
// WeatherProvider Trait
// ==========================================
// 实现者: OpenWeatherProvider (reqwest), 测试中的 mock
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// 获取当前天气
    async fn fetch_current(&self, coord: Coordinate) -> WeatherResult<CurrentWeather>;

    /// 获取预报降雨
    async fn fetch_forecast(&self, coord: Coordinate) -> WeatherResult<ForecastWeather>;
}

/// 获取完整天气快照
///
/// - 当前天气失败: 返回错误 (该区域本轮跳过)
/// - 预报失败: 预报降雨按 0 处理
pub async fn fetch_snapshot(
    provider: &dyn WeatherProvider,
    coord: Coordinate,
) -> WeatherResult<WeatherSnapshot> {
    let (current, forecast) =
        futures::join!(provider.fetch_current(coord), provider.fetch_forecast(coord));

    let current = current?;
    let forecast = forecast.unwrap_or_else(|e| {
        tracing::warn!(lat = coord.lat, lng = coord.lng, error = %e, "预报获取失败, 预报降雨按 0 处理");
        ForecastWeather::default()
    });

    Ok(current.into_snapshot(forecast))
}
