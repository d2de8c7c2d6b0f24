// ==========================================
// 洪涝风险监测系统 - 演示天气场景
// ==========================================
// 职责: 固定有序的演示场景目录, 人工切换 (循环)
// 红线: 切换场景不触发重算, 下一个周期读取当时选中的场景
// ==========================================

use crate::domain::weather::WeatherSnapshot;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 演示场景
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DemoScenario {
    pub name: &'static str,
    pub rainfall_mm_hr: f64,
    pub forecast_rainfall_mm: f64,
    pub wind_speed_kmh: f64,
    pub temperature_c: f64,
    pub storm_alert: Option<&'static str>,
}

impl DemoScenario {
    /// 转换为天气快照
    pub fn weather(&self) -> WeatherSnapshot {
        WeatherSnapshot {
            rainfall_mm_hr: self.rainfall_mm_hr,
            forecast_rainfall_mm: self.forecast_rainfall_mm,
            wind_speed_kmh: self.wind_speed_kmh,
            temperature_c: self.temperature_c,
            storm_alert: self.storm_alert.map(str::to_string),
        }
    }
}

/// 场景目录 (顺序固定)
pub const DEMO_SCENARIOS: [DemoScenario; 5] = [
    DemoScenario {
        name: "Heavy Rain Storm",
        rainfall_mm_hr: 45.0,
        forecast_rainfall_mm: 180.0,
        wind_speed_kmh: 60.0,
        temperature_c: 24.0,
        storm_alert: Some("Heavy Rainfall Warning"),
    },
    DemoScenario {
        name: "Severe Typhoon",
        rainfall_mm_hr: 70.0,
        forecast_rainfall_mm: 250.0,
        wind_speed_kmh: 150.0,
        temperature_c: 25.0,
        storm_alert: Some("Typhoon Signal No. 3"),
    },
    DemoScenario {
        name: "Super Typhoon",
        rainfall_mm_hr: 100.0,
        forecast_rainfall_mm: 400.0,
        wind_speed_kmh: 220.0,
        temperature_c: 26.0,
        storm_alert: Some("Super Typhoon Signal No. 5"),
    },
    DemoScenario {
        name: "Moderate Rain",
        rainfall_mm_hr: 15.0,
        forecast_rainfall_mm: 60.0,
        wind_speed_kmh: 25.0,
        temperature_c: 27.0,
        storm_alert: None,
    },
    DemoScenario {
        name: "Clear Weather",
        rainfall_mm_hr: 0.0,
        forecast_rainfall_mm: 0.0,
        wind_speed_kmh: 10.0,
        temperature_c: 31.0,
        storm_alert: None,
    },
];

// ==========================================
// ScenarioCatalog - 当前场景游标
// ==========================================
#[derive(Debug, Default)]
pub struct ScenarioCatalog {
    index: AtomicUsize,
}

impl ScenarioCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部场景
    pub fn scenarios(&self) -> &'static [DemoScenario] {
        &DEMO_SCENARIOS
    }

    /// 当前场景
    pub fn current(&self) -> &'static DemoScenario {
        &DEMO_SCENARIOS[self.index.load(Ordering::SeqCst) % DEMO_SCENARIOS.len()]
    }

    /// 切换到下一个场景 (末尾回到第一个), 返回切换后的场景
    pub fn advance(&self) -> &'static DemoScenario {
        let previous = self
            .index
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| {
                Some((i + 1) % DEMO_SCENARIOS.len())
            })
            .unwrap_or_default();
        &DEMO_SCENARIOS[(previous + 1) % DEMO_SCENARIOS.len()]
    }
}
