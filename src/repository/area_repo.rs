// ==========================================
// 洪涝风险监测系统 - 监测区域数据仓储
// ==========================================
// 职责: area 表读取与风险字段更新
// 红线: Repository 不含业务逻辑
// 红线: 调度器只允许更新 {risk_level, weather, last_risk_update}
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::area::{
    Area, ExposureAttributes, FloodHistory, HydrologicalAttributes, PhysicalAttributes,
};
use crate::domain::types::{
    BuildingType, DrainageQuality, FloodLevel, GroundCondition, SlopeClass, SoilClass,
    SurfaceCover, WaterBodyType,
};
use crate::domain::weather::WeatherSnapshot;
use crate::repository::error::{AreaDecodeError, RepositoryError, RepositoryResult};
use crate::repository::geometry_codec;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::FromSql;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// 单条区域读取结果 (解码失败不影响其他记录)
pub type LoadedArea = Result<Area, AreaDecodeError>;

// ==========================================
// RiskUpdate - 调度器可写字段
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RiskUpdate {
    pub risk_level: FloodLevel,
    pub weather: WeatherSnapshot,
    pub last_risk_update: DateTime<Utc>,
}

// ==========================================
// AreaStore Trait
// ==========================================
// 实现者: SqliteAreaRepository, 测试中的内存仓储
#[async_trait]
pub trait AreaStore: Send + Sync {
    /// 列出全部区域
    async fn list(&self) -> RepositoryResult<Vec<LoadedArea>>;

    /// 按 ID 查询区域
    async fn get(&self, area_id: &str) -> RepositoryResult<Option<Area>>;

    /// 更新风险字段
    async fn update(&self, area_id: &str, update: &RiskUpdate) -> RepositoryResult<()>;
}

// ==========================================
// SqliteAreaRepository - 区域仓储
// ==========================================
pub struct SqliteAreaRepository {
    conn: Arc<Mutex<Connection>>,
}

const SELECT_COLUMNS: &str = r#"
    area_id, name, geometry,
    elevation_m, slope, soil, drainage, surface,
    water_body, water_distance_m, flood_history,
    population, vulnerable_groups, critical_assets, building_type,
    ground_condition,
    rainfall_mm_hr, forecast_rainfall_mm, wind_speed_kmh, temperature_c, storm_alert,
    risk_level, last_risk_update
"#;

impl SqliteAreaRepository {
    /// 创建新的 SqliteAreaRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入区域 (INSERT OR REPLACE)
    ///
    /// 说明: 区域录入由外部系统负责, 此方法供初始化数据与测试使用
    pub fn insert(&self, area: &Area) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO area (
                area_id, name, geometry,
                elevation_m, slope, soil, drainage, surface,
                water_body, water_distance_m, flood_history,
                population, vulnerable_groups, critical_assets, building_type,
                ground_condition,
                rainfall_mm_hr, forecast_rainfall_mm, wind_speed_kmh, temperature_c, storm_alert,
                risk_level, last_risk_update
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23
            )
            "#,
            params![
                area.id,
                area.name,
                geometry_codec::encode(&area.geometry),
                area.physical.elevation_m,
                area.physical.slope.as_str(),
                area.physical.soil.as_str(),
                area.physical.drainage.as_str(),
                area.physical.surface.as_str(),
                area.hydrology.water_body.as_str(),
                area.hydrology.water_distance_m,
                serde_json::to_string(&area.hydrology.history)?,
                area.exposure.population as i64,
                serde_json::to_string(&area.exposure.vulnerable_groups)?,
                serde_json::to_string(&area.exposure.critical_assets)?,
                area.exposure.building_type.as_str(),
                area.ground_condition.as_str(),
                area.weather.rainfall_mm_hr,
                area.weather.forecast_rainfall_mm,
                area.weather.wind_speed_kmh,
                area.weather.temperature_c,
                area.weather.storm_alert,
                area.risk_level.as_str(),
                area.last_risk_update.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// 列出全部区域 (同步版本)
    pub fn list_all(&self) -> RepositoryResult<Vec<LoadedArea>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM area ORDER BY area_id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], AreaRow::from_row)?;

        let mut areas = Vec::new();
        for row in rows {
            areas.push(row?.and_then(AreaRow::into_area));
        }
        Ok(areas)
    }

    /// 按 ID 查询 (同步版本)
    pub fn find_by_id(&self, area_id: &str) -> RepositoryResult<Option<Area>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM area WHERE area_id = ?1", SELECT_COLUMNS);
        let row = conn
            .query_row(&sql, params![area_id], AreaRow::from_row)
            .optional()?;

        match row {
            Some(row) => Ok(Some(row.and_then(AreaRow::into_area)?)),
            None => Ok(None),
        }
    }

    /// 更新风险字段 (同步版本)
    pub fn update_risk(&self, area_id: &str, update: &RiskUpdate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE area SET
                risk_level = ?1,
                rainfall_mm_hr = ?2,
                forecast_rainfall_mm = ?3,
                wind_speed_kmh = ?4,
                temperature_c = ?5,
                storm_alert = ?6,
                last_risk_update = ?7
            WHERE area_id = ?8
            "#,
            params![
                update.risk_level.as_str(),
                update.weather.rainfall_mm_hr,
                update.weather.forecast_rainfall_mm,
                update.weather.wind_speed_kmh,
                update.weather.temperature_c,
                update.weather.storm_alert,
                update.last_risk_update.to_rfc3339(),
                area_id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "area".to_string(),
                id: area_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AreaStore for SqliteAreaRepository {
    async fn list(&self) -> RepositoryResult<Vec<LoadedArea>> {
        self.list_all()
    }

    async fn get(&self, area_id: &str) -> RepositoryResult<Option<Area>> {
        self.find_by_id(area_id)
    }

    async fn update(&self, area_id: &str, update: &RiskUpdate) -> RepositoryResult<()> {
        self.update_risk(area_id, update)
    }
}

// ==========================================
// AreaRow - 原始行 (解码前)
// ==========================================
struct AreaRow {
    area_id: String,
    name: String,
    geometry: String,
    elevation_m: f64,
    slope: String,
    soil: String,
    drainage: String,
    surface: String,
    water_body: String,
    water_distance_m: f64,
    flood_history: String,
    population: i64,
    vulnerable_groups: String,
    critical_assets: String,
    building_type: String,
    ground_condition: String,
    rainfall_mm_hr: f64,
    forecast_rainfall_mm: f64,
    wind_speed_kmh: f64,
    temperature_c: f64,
    storm_alert: Option<String>,
    risk_level: String,
    last_risk_update: Option<String>,
}

impl AreaRow {
    /// 逐列读取; 列类型不符只影响本行 (外层 Err 仅表示语句级失败)
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Result<Self, AreaDecodeError>> {
        let area_id: String = match row.get(0) {
            Ok(id) => id,
            Err(e) => return Ok(Err(AreaDecodeError::new("<unknown>", "area_id", e.to_string()))),
        };
        Ok(Self::read_columns(row, area_id))
    }

    fn read_columns(row: &Row<'_>, area_id: String) -> Result<Self, AreaDecodeError> {
        Ok(Self {
            name: column(row, 1, "name", &area_id)?,
            geometry: column(row, 2, "geometry", &area_id)?,
            elevation_m: column(row, 3, "elevation_m", &area_id)?,
            slope: column(row, 4, "slope", &area_id)?,
            soil: column(row, 5, "soil", &area_id)?,
            drainage: column(row, 6, "drainage", &area_id)?,
            surface: column(row, 7, "surface", &area_id)?,
            water_body: column(row, 8, "water_body", &area_id)?,
            water_distance_m: column(row, 9, "water_distance_m", &area_id)?,
            flood_history: column(row, 10, "flood_history", &area_id)?,
            population: column(row, 11, "population", &area_id)?,
            vulnerable_groups: column(row, 12, "vulnerable_groups", &area_id)?,
            critical_assets: column(row, 13, "critical_assets", &area_id)?,
            building_type: column(row, 14, "building_type", &area_id)?,
            ground_condition: column(row, 15, "ground_condition", &area_id)?,
            rainfall_mm_hr: column(row, 16, "rainfall_mm_hr", &area_id)?,
            forecast_rainfall_mm: column(row, 17, "forecast_rainfall_mm", &area_id)?,
            wind_speed_kmh: column(row, 18, "wind_speed_kmh", &area_id)?,
            temperature_c: column(row, 19, "temperature_c", &area_id)?,
            storm_alert: column(row, 20, "storm_alert", &area_id)?,
            risk_level: column(row, 21, "risk_level", &area_id)?,
            last_risk_update: column(row, 22, "last_risk_update", &area_id)?,
            area_id,
        })
    }

    /// 解码为领域对象
    fn into_area(self) -> LoadedArea {
        let id = self.area_id.as_str();

        let geometry = geometry_codec::decode(&self.geometry)
            .map_err(|e| AreaDecodeError::new(id, "geometry", e.to_string()))?;

        let history: FloodHistory = serde_json::from_str(&self.flood_history)
            .map_err(|e| AreaDecodeError::new(id, "flood_history", e.to_string()))?;
        let vulnerable_groups = parse_tags(id, "vulnerable_groups", &self.vulnerable_groups)?;
        let critical_assets = parse_tags(id, "critical_assets", &self.critical_assets)?;

        if self.water_distance_m.is_nan() || self.water_distance_m < 0.0 {
            return Err(AreaDecodeError::new(
                id,
                "water_distance_m",
                format!("距离不能为负: {}", self.water_distance_m),
            ));
        }
        let population = u64::try_from(self.population).map_err(|_| {
            AreaDecodeError::new(id, "population", format!("人口不能为负: {}", self.population))
        })?;

        let last_risk_update = match self.last_risk_update.as_deref() {
            Some(text) => Some(
                DateTime::parse_from_rfc3339(text)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| AreaDecodeError::new(id, "last_risk_update", e.to_string()))?,
            ),
            None => None,
        };

        Ok(Area {
            id: self.area_id.clone(),
            name: self.name,
            geometry,
            physical: PhysicalAttributes {
                elevation_m: self.elevation_m,
                slope: parse_class(id, "slope", &self.slope, SlopeClass::parse)?,
                soil: parse_class(id, "soil", &self.soil, SoilClass::parse)?,
                drainage: parse_class(id, "drainage", &self.drainage, DrainageQuality::parse)?,
                surface: parse_class(id, "surface", &self.surface, SurfaceCover::parse)?,
            },
            hydrology: HydrologicalAttributes {
                water_body: parse_class(id, "water_body", &self.water_body, WaterBodyType::parse)?,
                water_distance_m: self.water_distance_m,
                history,
            },
            exposure: ExposureAttributes {
                population,
                vulnerable_groups,
                critical_assets,
                building_type: parse_class(
                    id,
                    "building_type",
                    &self.building_type,
                    BuildingType::parse,
                )?,
            },
            ground_condition: parse_class(
                id,
                "ground_condition",
                &self.ground_condition,
                GroundCondition::parse,
            )?,
            weather: WeatherSnapshot {
                rainfall_mm_hr: self.rainfall_mm_hr,
                forecast_rainfall_mm: self.forecast_rainfall_mm,
                wind_speed_kmh: self.wind_speed_kmh,
                temperature_c: self.temperature_c,
                storm_alert: self.storm_alert,
            },
            risk_level: parse_class(id, "risk_level", &self.risk_level, FloodLevel::parse)?,
            last_risk_update,
        })
    }
}

fn parse_class<T>(
    area_id: &str,
    field: &str,
    raw: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, AreaDecodeError> {
    parse(raw).ok_or_else(|| AreaDecodeError::new(area_id, field, format!("未知取值: {}", raw)))
}

/// 读取单列, 类型错误归入本行解码错误
fn column<T: FromSql>(
    row: &Row<'_>,
    idx: usize,
    field: &str,
    area_id: &str,
) -> Result<T, AreaDecodeError> {
    row.get(idx)
        .map_err(|e| AreaDecodeError::new(area_id, field, e.to_string()))
}

fn parse_tags(area_id: &str, field: &str, raw: &str) -> Result<BTreeSet<String>, AreaDecodeError> {
    serde_json::from_str(raw).map_err(|e| AreaDecodeError::new(area_id, field, e.to_string()))
}
