// ==========================================
// 洪涝风险监测系统 - 监测区域领域模型
// ==========================================
// 职责: 区域几何、静态属性、洪涝历史
// 红线: 几何始终至少包含 1 个坐标; 距离与人口非负
// ==========================================

use crate::domain::types::{
    BuildingType, DrainageQuality, FloodCause, FloodCoverage, FloodFrequency, FloodLevel,
    GroundCondition, SlopeClass, SoilClass, SurfaceCover, WaterBodyType,
};
use crate::domain::weather::WeatherSnapshot;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

// ==========================================
// 坐标与几何
// ==========================================

/// WGS84 坐标 (度)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// 坐标是否有效 (有限值且在经纬度范围内)
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// 几何构造错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("多边形顶点为空")]
    EmptyRing,

    #[error("坐标无效: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },
}

/// 区域几何 (点 / 多边形)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coordinate),
    Polygon(Vec<Coordinate>),
}

impl Geometry {
    /// 构造点几何
    pub fn point(coord: Coordinate) -> Result<Self, GeometryError> {
        validate_coordinate(&coord)?;
        Ok(Geometry::Point(coord))
    }

    /// 构造多边形几何 (有序顶点环)
    pub fn polygon(ring: Vec<Coordinate>) -> Result<Self, GeometryError> {
        if ring.is_empty() {
            return Err(GeometryError::EmptyRing);
        }
        for coord in &ring {
            validate_coordinate(coord)?;
        }
        Ok(Geometry::Polygon(ring))
    }

    /// 代表点 (天气查询用)
    ///
    /// - Point: 点本身
    /// - Polygon: 顶点平均值 (闭合环的重复终点不计入)
    pub fn representative_point(&self) -> Coordinate {
        match self {
            Geometry::Point(coord) => *coord,
            Geometry::Polygon(ring) => {
                let vertices = match ring.split_last() {
                    Some((last, rest)) if !rest.is_empty() && *last == ring[0] => rest,
                    _ => ring.as_slice(),
                };
                let n = vertices.len().max(1) as f64;
                let (lat_sum, lng_sum) = vertices
                    .iter()
                    .fold((0.0, 0.0), |(lat, lng), c| (lat + c.lat, lng + c.lng));
                Coordinate::new(lat_sum / n, lng_sum / n)
            }
        }
    }

    /// 顶点数量
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::Polygon(ring) => ring.len(),
        }
    }
}

fn validate_coordinate(coord: &Coordinate) -> Result<(), GeometryError> {
    if coord.is_valid() {
        Ok(())
    } else {
        Err(GeometryError::InvalidCoordinate {
            lat: coord.lat,
            lng: coord.lng,
        })
    }
}

// ==========================================
// 静态属性
// ==========================================

/// 物理属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAttributes {
    pub elevation_m: f64,          // 海拔 (米)
    pub slope: SlopeClass,         // 坡度
    pub soil: SoilClass,           // 土壤
    pub drainage: DrainageQuality, // 排水条件
    pub surface: SurfaceCover,     // 地表覆盖
}

/// 洪涝历史
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodHistory {
    pub has_flooded: bool,
    pub past_dates: Vec<NaiveDate>, // 按时间先后
    pub cause: Option<FloodCause>,
    pub max_depth_m: f64,
    pub duration: Option<String>,   // 持续时间 (自由文本, 如 "2-3 days")
    pub frequency: Option<FloodFrequency>,
    pub coverage: Option<FloodCoverage>,
    pub impacts: BTreeSet<String>,

    // ===== 自由文本备注 =====
    pub recovery_notes: Option<String>,
    pub defense_notes: Option<String>,
    pub preparedness_notes: Option<String>,
}

impl FloodHistory {
    /// 无洪涝历史
    pub fn none() -> Self {
        Self {
            has_flooded: false,
            past_dates: Vec::new(),
            cause: None,
            max_depth_m: 0.0,
            duration: None,
            frequency: None,
            coverage: None,
            impacts: BTreeSet::new(),
            recovery_notes: None,
            defense_notes: None,
            preparedness_notes: None,
        }
    }

    /// 最近一次洪涝日期
    pub fn last_flood_date(&self) -> Option<NaiveDate> {
        self.past_dates.iter().max().copied()
    }
}

impl Default for FloodHistory {
    fn default() -> Self {
        Self::none()
    }
}

/// 水文属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrologicalAttributes {
    pub water_body: WaterBodyType,
    pub water_distance_m: f64, // 距最近水体 (米), >= 0
    pub history: FloodHistory,
}

/// 暴露度属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureAttributes {
    pub population: u64,
    pub vulnerable_groups: BTreeSet<String>, // 如 elderly / children / disabled
    pub critical_assets: BTreeSet<String>,   // 如 hospital / school / power_station
    pub building_type: BuildingType,
}

// ==========================================
// Area - 监测区域
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    pub geometry: Geometry,

    // ===== 静态属性 =====
    pub physical: PhysicalAttributes,
    pub hydrology: HydrologicalAttributes,
    pub exposure: ExposureAttributes,
    pub ground_condition: GroundCondition,

    // ===== 监测状态 (仅调度器更新) =====
    pub weather: WeatherSnapshot,
    pub risk_level: FloodLevel,
    pub last_risk_update: Option<DateTime<Utc>>,
}
