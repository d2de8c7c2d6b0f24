// ==========================================
// 洪涝风险监测系统 - 几何编解码
// ==========================================
// 存储格式 (GeoJSON 子集, 坐标顺序 [lng, lat]):
//   {"type":"Point","coordinates":[lng,lat]}
//   {"type":"Polygon","coordinates":[[[lng,lat],...]]}
// 兼容读取:
//   - Polygon 单层环 [[lng,lat],...]
//   - coordinates 为字符串化的 JSON 数组 (历史数据)
// 红线: 只在存储边界使用, 领域层只接触 Geometry 枚举
// ==========================================

use crate::domain::area::{Coordinate, Geometry, GeometryError};
use serde_json::{json, Value};
use thiserror::Error;

/// 几何编解码错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryCodecError {
    #[error("几何 JSON 格式错误: {0}")]
    Json(String),

    #[error("不支持的几何类型: {0}")]
    UnsupportedType(String),

    #[error("坐标格式错误: {0}")]
    BadCoordinates(String),

    #[error(transparent)]
    Invalid(#[from] GeometryError),
}

/// 编码为存储文本
pub fn encode(geometry: &Geometry) -> String {
    let value = match geometry {
        Geometry::Point(c) => json!({ "type": "Point", "coordinates": [c.lng, c.lat] }),
        Geometry::Polygon(ring) => {
            let ring: Vec<[f64; 2]> = ring.iter().map(|c| [c.lng, c.lat]).collect();
            json!({ "type": "Polygon", "coordinates": [ring] })
        }
    };
    value.to_string()
}

/// 从存储文本解码
pub fn decode(raw: &str) -> Result<Geometry, GeometryCodecError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| GeometryCodecError::Json(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeometryCodecError::Json("缺少 type 字段".to_string()))?;

    let coordinates = match value.get("coordinates") {
        Some(Value::String(text)) => serde_json::from_str::<Value>(text)
            .map_err(|e| GeometryCodecError::BadCoordinates(e.to_string()))?,
        Some(other) => other.clone(),
        None => return Err(GeometryCodecError::BadCoordinates("缺少 coordinates 字段".to_string())),
    };

    match kind {
        "Point" => Ok(Geometry::point(parse_position(&coordinates)?)?),
        "Polygon" => {
            let ring = outer_ring(&coordinates)?;
            let ring = ring
                .iter()
                .map(parse_position)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Geometry::polygon(ring)?)
        }
        other => Err(GeometryCodecError::UnsupportedType(other.to_string())),
    }
}

/// [lng, lat] -> Coordinate
fn parse_position(value: &Value) -> Result<Coordinate, GeometryCodecError> {
    let pair = value
        .as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| GeometryCodecError::BadCoordinates(format!("无效坐标: {}", value)))?;

    let lng = pair[0]
        .as_f64()
        .ok_or_else(|| GeometryCodecError::BadCoordinates(format!("经度非数值: {}", pair[0])))?;
    let lat = pair[1]
        .as_f64()
        .ok_or_else(|| GeometryCodecError::BadCoordinates(format!("纬度非数值: {}", pair[1])))?;

    Ok(Coordinate::new(lat, lng))
}

/// 取外环: 兼容 [[[lng,lat],...]] 与 [[lng,lat],...]
fn outer_ring(value: &Value) -> Result<&Vec<Value>, GeometryCodecError> {
    let outer = value
        .as_array()
        .ok_or_else(|| GeometryCodecError::BadCoordinates("多边形坐标应为数组".to_string()))?;

    match outer.first() {
        Some(Value::Array(first)) if first.first().map(Value::is_array).unwrap_or(false) => {
            Ok(first)
        }
        _ => Ok(outer),
    }
}
