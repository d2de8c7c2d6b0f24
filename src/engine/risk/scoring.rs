// ==========================================
// 洪涝风险评分 - 因子子分与权重表
// ==========================================
// 所有子分 ∈ [0,1]; 权重为参考设计, 需与历史样本对齐时在此统一调整
// ==========================================

use crate::domain::area::{ExposureAttributes, FloodHistory};
use crate::domain::risk::{BaseFactorScores, WeatherFactorScores};
use crate::domain::types::{
    DrainageQuality, FloodFrequency, GroundCondition, SlopeClass, SurfaceCover, WaterBodyType,
};
use crate::domain::weather::WeatherSnapshot;

// ===== 静态因子权重 (合计 1.0) =====
pub(super) const W_ELEVATION: f64 = 0.20;
pub(super) const W_SLOPE: f64 = 0.10;
pub(super) const W_DRAINAGE: f64 = 0.15;
pub(super) const W_SURFACE: f64 = 0.10;
pub(super) const W_WATER: f64 = 0.20;
pub(super) const W_GROUND: f64 = 0.10;
pub(super) const W_HISTORY: f64 = 0.15;

// ===== 天气因子权重 =====
pub(super) const W_RAINFALL: f64 = 0.5;
pub(super) const W_FORECAST: f64 = 0.3;
pub(super) const W_WIND: f64 = 0.2;
pub(super) const STORM_ALERT_OFFSET: f64 = 0.15;

// ===== 归一化基准 =====
const ELEVATION_SAFE_M: f64 = 30.0;
const WATER_INFLUENCE_M: f64 = 1000.0;
const HISTORY_DEPTH_REF_M: f64 = 3.0;
const RAINFALL_REF_MM_HR: f64 = 50.0;
const FORECAST_REF_MM: f64 = 200.0;
const WIND_REF_KMH: f64 = 120.0;

// ===== 暴露度上浮 =====
pub(super) const EXPOSURE_CAP: f64 = 0.20;
const VULNERABLE_UPLIFT: f64 = 0.05;
const CRITICAL_ASSET_UPLIFT: f64 = 0.05;

/// 截断到 [0,1], NaN 按 0 处理
pub(super) fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// 非负比值, 截断到 [0,1]
fn ratio(value: f64, reference: f64) -> f64 {
    unit(value.max(0.0) / reference)
}

// ==========================================
// 静态因子
// ==========================================

pub(super) fn elevation_score(elevation_m: f64) -> f64 {
    if elevation_m.is_nan() {
        return 0.0;
    }
    // 低于海平面按最高风险
    unit(1.0 - (elevation_m / ELEVATION_SAFE_M).min(1.0))
}

pub(super) fn slope_score(slope: SlopeClass) -> f64 {
    match slope {
        SlopeClass::Flat => 1.0,
        SlopeClass::Gentle => 0.5,
        SlopeClass::Steep => 0.1,
    }
}

pub(super) fn drainage_score(drainage: DrainageQuality) -> f64 {
    match drainage {
        DrainageQuality::None => 1.0,
        DrainageQuality::Poor => 0.75,
        DrainageQuality::Moderate => 0.5,
        DrainageQuality::Good => 0.25,
        DrainageQuality::Engineered => 0.1,
    }
}

pub(super) fn surface_score(surface: SurfaceCover) -> f64 {
    match surface {
        SurfaceCover::Paved => 0.8,
        SurfaceCover::BareSoil => 0.6,
        SurfaceCover::Mixed => 0.5,
        SurfaceCover::Vegetation => 0.3,
    }
}

fn water_body_weight(water_body: WaterBodyType) -> f64 {
    match water_body {
        WaterBodyType::Sea | WaterBodyType::River => 1.0,
        WaterBodyType::Lake => 0.8,
        WaterBodyType::Stream => 0.6,
        WaterBodyType::Canal => 0.4,
        WaterBodyType::None => 0.0,
    }
}

pub(super) fn water_proximity_score(water_body: WaterBodyType, distance_m: f64) -> f64 {
    let distance_m = if distance_m.is_nan() {
        WATER_INFLUENCE_M
    } else {
        distance_m.max(0.0)
    };
    let proximity = (1.0 - distance_m / WATER_INFLUENCE_M).max(0.0);
    unit(proximity * water_body_weight(water_body))
}

pub(super) fn ground_score(ground: GroundCondition) -> f64 {
    match ground {
        GroundCondition::Dry => 0.0,
        GroundCondition::Moist => 0.3,
        GroundCondition::Saturated => 0.6,
        GroundCondition::AlreadyFlooded => 1.0,
    }
}

fn frequency_weight(frequency: Option<FloodFrequency>) -> f64 {
    match frequency {
        Some(FloodFrequency::Rare) => 0.2,
        Some(FloodFrequency::Occasional) => 0.4,
        Some(FloodFrequency::Frequent) => 0.7,
        Some(FloodFrequency::VeryFrequent) => 1.0,
        None => 0.0,
    }
}

pub(super) fn history_score(history: &FloodHistory) -> f64 {
    if !history.has_flooded {
        return 0.0;
    }
    unit(frequency_weight(history.frequency) * ratio(history.max_depth_m, HISTORY_DEPTH_REF_M))
}

// ==========================================
// 天气因子
// ==========================================

pub(super) fn weather_factors(weather: &WeatherSnapshot) -> WeatherFactorScores {
    WeatherFactorScores {
        rainfall: ratio(weather.rainfall_mm_hr, RAINFALL_REF_MM_HR),
        forecast: ratio(weather.forecast_rainfall_mm, FORECAST_REF_MM),
        wind: ratio(weather.wind_speed_kmh, WIND_REF_KMH),
        storm_offset: if weather.has_storm_alert() {
            STORM_ALERT_OFFSET
        } else {
            0.0
        },
    }
}

pub(super) fn weighted_weather(factors: &WeatherFactorScores) -> f64 {
    unit(
        factors.rainfall * W_RAINFALL
            + factors.forecast * W_FORECAST
            + factors.wind * W_WIND
            + factors.storm_offset,
    )
}

pub(super) fn weighted_base(factors: &BaseFactorScores) -> f64 {
    unit(
        factors.elevation * W_ELEVATION
            + factors.slope * W_SLOPE
            + factors.drainage * W_DRAINAGE
            + factors.surface * W_SURFACE
            + factors.water_proximity * W_WATER
            + factors.ground * W_GROUND
            + factors.history * W_HISTORY,
    )
}

// ==========================================
// 暴露度
// ==========================================

fn population_uplift(population: u64) -> f64 {
    match population {
        0..=99 => 0.0,
        100..=999 => 0.05,
        1_000..=9_999 => 0.10,
        _ => 0.15,
    }
}

/// 暴露度乘数 ∈ [1.0, 1.2]
pub(super) fn exposure_multiplier(exposure: &ExposureAttributes) -> f64 {
    let mut uplift = population_uplift(exposure.population);
    if !exposure.vulnerable_groups.is_empty() {
        uplift += VULNERABLE_UPLIFT;
    }
    if !exposure.critical_assets.is_empty() {
        uplift += CRITICAL_ASSET_UPLIFT;
    }
    1.0 + uplift.min(EXPOSURE_CAP)
}
