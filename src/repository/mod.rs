// ==========================================
// 洪涝风险监测系统 - 数据仓储层
// ==========================================
// 职责: 区域记录读取与风险字段写回
// 红线: 不含业务逻辑, 几何原始文本只在 geometry_codec 中处理
// ==========================================

pub mod area_repo;
pub mod error;
pub mod geometry_codec;

// 重导出
pub use area_repo::{AreaStore, LoadedArea, RiskUpdate, SqliteAreaRepository};
pub use error::{AreaDecodeError, RepositoryError, RepositoryResult};
