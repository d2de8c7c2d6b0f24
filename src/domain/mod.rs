// ==========================================
// 洪涝风险监测系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod area;
pub mod risk;
pub mod types;
pub mod weather;

// 重导出核心类型
pub use area::{
    Area, Coordinate, ExposureAttributes, FloodHistory, Geometry, GeometryError,
    HydrologicalAttributes, PhysicalAttributes,
};
pub use risk::{
    AreaSnapshot, BaseFactorScores, OverrideRule, RiskAssessment, RiskBreakdown,
    WeatherFactorScores,
};
pub use types::{
    BuildingType, DrainageQuality, FloodCause, FloodCoverage, FloodFrequency, FloodLevel,
    GroundCondition, SlopeClass, SoilClass, SurfaceCover, WaterBodyType,
};
pub use weather::{WeatherSnapshot, FORECAST_HORIZON_HOURS};
