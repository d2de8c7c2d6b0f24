// ==========================================
// 洪涝风险监测系统 - OpenWeather HTTP 数据源
// ==========================================
// 接口: /data/2.5/weather (当前) + /data/2.5/forecast (3 小时粒度预报)
// 单位: units=metric (风速 m/s, 转换为 km/h)
// 重试: 502/503/504 指数退避, 其余错误直接返回
// ==========================================

use super::{CurrentWeather, ForecastWeather, WeatherError, WeatherProvider, WeatherResult};
use crate::config::WeatherCredential;
use crate::domain::area::Coordinate;
use crate::domain::weather::FORECAST_HORIZON_HOURS;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// 默认接口地址
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// 最大重试次数
const MAX_RETRIES: u32 = 2;

/// 初始退避 (毫秒, 每次翻倍)
const INITIAL_BACKOFF_MS: u64 = 250;

/// 预报时间粒度 (小时)
const FORECAST_STEP_HOURS: u32 = 3;

/// m/s -> km/h
const MS_TO_KMH: f64 = 3.6;

/// 飓风级风速阈值 (km/h, 蒲福 12 级)
const HURRICANE_FORCE_KMH: f64 = 118.0;

// ==========================================
// 响应结构 (只取所需字段)
// ==========================================

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    weather: Vec<ConditionEntry>,
    main: MainEntry,
    #[serde(default)]
    wind: Option<WindEntry>,
    #[serde(default)]
    rain: Option<RainEntry>,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    id: u32,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainEntry {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct WindEntry {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct RainEntry {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
    #[serde(rename = "3h", default)]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    #[serde(default)]
    rain: Option<RainEntry>,
}

// ==========================================
// 响应解析
// ==========================================

/// 天气状况码是否属于风暴类 (雷暴 2xx / 龙卷 781 / 旧版极端天气 900-902)
fn is_storm_condition(id: u32) -> bool {
    matches!(id, 200..=299 | 781 | 900..=902)
}

pub(crate) fn parse_current(body: &str) -> WeatherResult<CurrentWeather> {
    let resp: CurrentResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::Decode(e.to_string()))?;

    let rainfall_mm_hr = resp
        .rain
        .as_ref()
        .and_then(|r| r.one_hour.or(r.three_hours.map(|v| v / 3.0)))
        .unwrap_or(0.0);
    let wind_speed_kmh = resp.wind.map(|w| w.speed * MS_TO_KMH).unwrap_or(0.0);

    let storm_alert = resp
        .weather
        .iter()
        .find(|c| is_storm_condition(c.id))
        .map(|c| c.description.clone())
        .or_else(|| {
            (wind_speed_kmh >= HURRICANE_FORCE_KMH).then(|| "hurricane-force wind".to_string())
        });

    Ok(CurrentWeather {
        rainfall_mm_hr,
        wind_speed_kmh,
        temperature_c: resp.main.temp,
        storm_alert,
    })
}

pub(crate) fn parse_forecast(body: &str) -> WeatherResult<ForecastWeather> {
    let resp: ForecastResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::Decode(e.to_string()))?;

    let slots = (FORECAST_HORIZON_HOURS / FORECAST_STEP_HOURS) as usize;
    let forecast_rainfall_mm = resp
        .list
        .iter()
        .take(slots)
        .filter_map(|entry| entry.rain.as_ref().and_then(|r| r.three_hours))
        .sum();

    Ok(ForecastWeather {
        forecast_rainfall_mm,
    })
}

// ==========================================
// OpenWeatherProvider
// ==========================================
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    client: Client,
    base_url: String,
    credential: WeatherCredential,
}

impl OpenWeatherProvider {
    /// 创建数据源
    ///
    /// # 参数
    /// - credential: 已校验的接口密钥
    /// - base_url: 接口地址 (测试时可指向本地桩服务)
    /// - timeout: 单次请求超时
    pub fn new(
        credential: WeatherCredential,
        base_url: &str,
        timeout: Duration,
    ) -> WeatherResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// GET 请求 (网关类错误自动退避重试)
    async fn get(&self, path: &str, coord: Coordinate) -> WeatherResult<String> {
        let url = format!("{}{}", self.base_url, path);
        let lat = coord.lat.to_string();
        let lon = coord.lng.to_string();

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("units", "metric"),
                    ("appid", self.credential.expose()),
                ])
                .send()
                .await?;

            let success = response.status().is_success();
            let status = response.status().as_u16();
            let body = response.text().await?;

            if success {
                return Ok(body);
            }

            let err = WeatherError::Http {
                status,
                message: body,
            };
            if err.is_transient() && attempt < MAX_RETRIES {
                let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt));
                warn!(
                    status,
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    path,
                    "天气接口瞬时错误, 退避重试"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }
            return Err(err);
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, coord: Coordinate) -> WeatherResult<CurrentWeather> {
        let body = self.get("/data/2.5/weather", coord).await?;
        let current = parse_current(&body)?;
        debug!(
            lat = coord.lat,
            lng = coord.lng,
            rainfall = current.rainfall_mm_hr,
            wind = current.wind_speed_kmh,
            "当前天气获取成功"
        );
        Ok(current)
    }

    async fn fetch_forecast(&self, coord: Coordinate) -> WeatherResult<ForecastWeather> {
        let body = self.get("/data/2.5/forecast", coord).await?;
        parse_forecast(&body)
    }
}
