// ==========================================
// 洪涝风险监测系统 - 引擎层
// ==========================================
// 职责: 风险评分规则
// 红线: 引擎不做 I/O, 数据由调度器传入
// ==========================================

pub mod risk;

pub use risk::RiskScoringEngine;
