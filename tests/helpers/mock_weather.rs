// ==========================================
// Mock 天气数据源 - 用于调度器测试
// ==========================================
// 支持: 按坐标注入失败, 闸门阻塞 (模拟进行中的请求)
// ==========================================

use async_trait::async_trait;
use flood_risk_monitor::domain::area::Coordinate;
use flood_risk_monitor::weather::{
    CurrentWeather, ForecastWeather, WeatherError, WeatherProvider, WeatherResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub struct MockWeatherProvider {
    current: CurrentWeather,
    forecast: ForecastWeather,
    failing: Mutex<Vec<Coordinate>>,
    forecast_fails: bool,
    gate: Option<Arc<Semaphore>>,
    entered: AtomicUsize,
}

impl MockWeatherProvider {
    /// 暴雨 + 风暴预警
    pub fn stormy() -> Self {
        Self::new(
            CurrentWeather {
                rainfall_mm_hr: 85.0,
                wind_speed_kmh: 130.0,
                temperature_c: 25.0,
                storm_alert: Some("Typhoon Signal No. 4".to_string()),
            },
            ForecastWeather {
                forecast_rainfall_mm: 220.0,
            },
        )
    }

    pub fn new(current: CurrentWeather, forecast: ForecastWeather) -> Self {
        Self {
            current,
            forecast,
            failing: Mutex::new(Vec::new()),
            forecast_fails: false,
            gate: None,
            entered: AtomicUsize::new(0),
        }
    }

    /// 对该坐标的当前天气请求返回错误
    pub fn fail_at(self, lat: f64, lng: f64) -> Self {
        self.failing.lock().unwrap().push(Coordinate::new(lat, lng));
        self
    }

    pub fn failing_forecast(mut self) -> Self {
        self.forecast_fails = true;
        self
    }

    /// 请求在闸门放行前阻塞
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// 已进入 fetch_current 的请求数
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn fetch_current(&self, coord: Coordinate) -> WeatherResult<CurrentWeather> {
        self.entered.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| WeatherError::Network(e.to_string()))?;
        }

        if self.failing.lock().unwrap().contains(&coord) {
            return Err(WeatherError::Http {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(self.current.clone())
    }

    async fn fetch_forecast(&self, _coord: Coordinate) -> WeatherResult<ForecastWeather> {
        if self.forecast_fails {
            return Err(WeatherError::Timeout);
        }
        Ok(self.forecast)
    }
}
