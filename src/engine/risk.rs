// ==========================================
// 洪涝风险监测系统 - 风险评分引擎
// ==========================================
// 职责: 区域快照 -> 风险评估
// 输入: AreaSnapshot (静态属性 + 本轮天气)
// 输出: RiskAssessment (综合分值 + 等级 + 明细)
// 红线: 纯函数, 无 I/O, 同输入必同输出
// ==========================================

mod scoring;


use crate::domain::risk::{AreaSnapshot, BaseFactorScores, OverrideRule, RiskAssessment, RiskBreakdown};
use crate::domain::types::{FloodCoverage, FloodFrequency, FloodLevel, GroundCondition};
use scoring::*;

/// 静态分与天气分在综合分中的占比
const BASE_SHARE: f64 = 0.5;
const WEATHER_SHARE: f64 = 0.5;

// ==========================================
// RiskScoringEngine - 风险评分引擎
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct RiskScoringEngine {
    // 无状态引擎, 权重见 scoring 模块
}

impl RiskScoringEngine {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 评估区域快照
    ///
    /// 流程:
    /// 1. 静态基础分 S_base (加权平均)
    /// 2. 天气分 S_weather (含风暴预警偏移)
    /// 3. 暴露度乘数 (1.0 ~ 1.2)
    /// 4. 综合分 = clamp((S_base*0.5 + S_weather*0.5) * 乘数, 0, 1), 按阈值分级
    /// 5. 强制下限规则 (只抬升不降低)
    pub fn evaluate(&self, snapshot: &AreaSnapshot) -> RiskAssessment {
        // 1. 静态基础分
        let base_factors = self.base_factors(snapshot);
        let base_score = weighted_base(&base_factors);

        // 2. 天气分
        let weather_factors = weather_factors(&snapshot.weather);
        let weather_score = weighted_weather(&weather_factors);

        // 3. 暴露度乘数
        let exposure_multiplier = exposure_multiplier(&snapshot.exposure);

        // 4. 综合分与分级
        let score = unit((base_score * BASE_SHARE + weather_score * WEATHER_SHARE) * exposure_multiplier);
        let score_level = FloodLevel::from_score(score);

        // 5. 强制下限
        let overrides = self.matched_overrides(snapshot);
        let level = overrides
            .iter()
            .map(OverrideRule::floor)
            .fold(score_level, FloodLevel::max);

        RiskAssessment {
            score,
            level,
            breakdown: RiskBreakdown {
                base_factors,
                base_score,
                weather_factors,
                weather_score,
                exposure_multiplier,
                score_level,
                overrides,
            },
        }
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn base_factors(&self, snapshot: &AreaSnapshot) -> BaseFactorScores {
        let physical = &snapshot.physical;
        let hydrology = &snapshot.hydrology;

        BaseFactorScores {
            elevation: elevation_score(physical.elevation_m),
            slope: slope_score(physical.slope),
            drainage: drainage_score(physical.drainage),
            surface: surface_score(physical.surface),
            water_proximity: water_proximity_score(hydrology.water_body, hydrology.water_distance_m),
            ground: ground_score(snapshot.ground_condition),
            history: history_score(&hydrology.history),
        }
    }

    /// 命中的强制下限规则
    ///
    /// - 地面已被淹 => 至少 Severe
    /// - 历史淹没范围超出区域 且 频次为非常频繁 => 至少 High
    fn matched_overrides(&self, snapshot: &AreaSnapshot) -> Vec<OverrideRule> {
        let mut rules = Vec::new();

        if snapshot.ground_condition == GroundCondition::AlreadyFlooded {
            rules.push(OverrideRule::AlreadyFlooded);
        }

        let history = &snapshot.hydrology.history;
        if history.coverage == Some(FloodCoverage::BeyondPolygon)
            && history.frequency == Some(FloodFrequency::VeryFrequent)
        {
            rules.push(OverrideRule::ChronicBeyondPolygon);
        }

        rules
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for RiskScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}
