// ==========================================
// 洪涝风险监测系统 - 风险评估领域模型
// ==========================================
// 职责: 评分引擎的输入快照与输出结果
// ==========================================

use crate::domain::area::{Area, ExposureAttributes, HydrologicalAttributes, PhysicalAttributes};
use crate::domain::types::{FloodLevel, GroundCondition};
use crate::domain::weather::WeatherSnapshot;
use serde::{Deserialize, Serialize};

// ==========================================
// AreaSnapshot - 评分输入快照
// ==========================================
// 用途: 区域静态属性 + 本轮天气, 所有字段由调用方填充
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSnapshot {
    pub physical: PhysicalAttributes,
    pub hydrology: HydrologicalAttributes,
    pub exposure: ExposureAttributes,
    pub ground_condition: GroundCondition,
    pub weather: WeatherSnapshot,
}

impl AreaSnapshot {
    /// 合并区域存量属性与本轮天气
    pub fn merge(area: &Area, weather: WeatherSnapshot) -> Self {
        Self {
            physical: area.physical.clone(),
            hydrology: area.hydrology.clone(),
            exposure: area.exposure.clone(),
            ground_condition: area.ground_condition,
            weather,
        }
    }
}

// ==========================================
// 评分明细 (诊断用)
// ==========================================

/// 静态因子子分 (各项 ∈ [0,1], 未加权)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseFactorScores {
    pub elevation: f64,
    pub slope: f64,
    pub drainage: f64,
    pub surface: f64,
    pub water_proximity: f64,
    pub ground: f64,
    pub history: f64,
}

/// 天气因子子分 (各项 ∈ [0,1], 未加权)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherFactorScores {
    pub rainfall: f64,
    pub forecast: f64,
    pub wind: f64,
    pub storm_offset: f64,
}

/// 强制下限规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideRule {
    /// 地面已被淹 => 至少 Severe
    AlreadyFlooded,
    /// 历史淹没超出区域且非常频繁 => 至少 High
    ChronicBeyondPolygon,
}

impl OverrideRule {
    /// 规则对应的等级下限
    pub fn floor(&self) -> FloodLevel {
        match self {
            OverrideRule::AlreadyFlooded => FloodLevel::Severe,
            OverrideRule::ChronicBeyondPolygon => FloodLevel::High,
        }
    }
}

/// 评分明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub base_factors: BaseFactorScores,
    pub base_score: f64,
    pub weather_factors: WeatherFactorScores,
    pub weather_score: f64,
    pub exposure_multiplier: f64,
    pub score_level: FloodLevel,       // 仅按分值的分级
    pub overrides: Vec<OverrideRule>,  // 命中的强制下限
}

// ==========================================
// RiskAssessment - 评估结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64, // 综合分值 ∈ [0,1]
    pub level: FloodLevel,
    pub breakdown: RiskBreakdown,
}

impl RiskAssessment {
    /// 等级是否由强制规则抬升
    pub fn is_overridden(&self) -> bool {
        self.level > self.breakdown.score_level
    }
}
