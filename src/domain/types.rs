// ==========================================
// 洪涝风险监测系统 - 领域类型定义
// ==========================================
// 职责: 风险等级与场地分类枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 洪涝风险等级 (Flood Level)
// ==========================================
// 顺序: VeryLow < Low < Moderate < High < Severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FloodLevel {
    VeryLow,  // 极低
    Low,      // 低
    Moderate, // 中
    High,     // 高
    Severe,   // 极高
}

impl FloodLevel {
    /// 全部等级 (升序)
    pub const ALL: [FloodLevel; 5] = [
        FloodLevel::VeryLow,
        FloodLevel::Low,
        FloodLevel::Moderate,
        FloodLevel::High,
        FloodLevel::Severe,
    ];

    /// 按综合分值分级
    ///
    /// 区间为左闭右开, 恰好落在边界上的分值归入更高一级:
    /// [0, 0.2) VeryLow, [0.2, 0.4) Low, [0.4, 0.6) Moderate, [0.6, 0.8) High, [0.8, 1.0] Severe
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            FloodLevel::Severe
        } else if score >= 0.6 {
            FloodLevel::High
        } else if score >= 0.4 {
            FloodLevel::Moderate
        } else if score >= 0.2 {
            FloodLevel::Low
        } else {
            FloodLevel::VeryLow
        }
    }

    /// 数据库存储值
    pub fn as_str(&self) -> &'static str {
        match self {
            FloodLevel::VeryLow => "VERY_LOW",
            FloodLevel::Low => "LOW",
            FloodLevel::Moderate => "MODERATE",
            FloodLevel::High => "HIGH",
            FloodLevel::Severe => "SEVERE",
        }
    }

    /// 展示名称
    pub fn label(&self) -> &'static str {
        match self {
            FloodLevel::VeryLow => "Very Low",
            FloodLevel::Low => "Low",
            FloodLevel::Moderate => "Moderate",
            FloodLevel::High => "High",
            FloodLevel::Severe => "Severe",
        }
    }

    /// 从字符串解析 (兼容存储值与展示名称)
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "VERY_LOW" => Some(FloodLevel::VeryLow),
            "LOW" => Some(FloodLevel::Low),
            "MODERATE" => Some(FloodLevel::Moderate),
            "HIGH" => Some(FloodLevel::High),
            "SEVERE" => Some(FloodLevel::Severe),
            _ => None,
        }
    }
}

impl fmt::Display for FloodLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 场地分类枚举
// ==========================================
// 存储值统一为 SCREAMING_SNAKE_CASE, 解析时忽略大小写/空格/连字符
macro_rules! class_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// 数据库存储值
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// 从字符串解析
            pub fn parse(s: &str) -> Option<Self> {
                let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
                match normalized.as_str() {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        // 反序列化与 parse 同样宽松 (兼容小写/空格写法的历史 JSON)
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                $name::parse(&raw)
                    .ok_or_else(|| de::Error::custom(format!("未知取值: {}", raw)))
            }
        }
    };
}

class_enum! {
    /// 坡度分类
    SlopeClass { Flat => "FLAT", Gentle => "GENTLE", Steep => "STEEP" }
}

class_enum! {
    /// 土壤分类 (仅描述, 不参与评分)
    SoilClass {
        Clay => "CLAY",
        Silt => "SILT",
        Loam => "LOAM",
        Sand => "SAND",
        Gravel => "GRAVEL",
        Rock => "ROCK",
    }
}

class_enum! {
    /// 排水条件
    DrainageQuality {
        None => "NONE",
        Poor => "POOR",
        Moderate => "MODERATE",
        Good => "GOOD",
        Engineered => "ENGINEERED",
    }
}

class_enum! {
    /// 地表覆盖
    SurfaceCover {
        Paved => "PAVED",
        BareSoil => "BARE_SOIL",
        Mixed => "MIXED",
        Vegetation => "VEGETATION",
    }
}

class_enum! {
    /// 最近水体类型
    WaterBodyType {
        Sea => "SEA",
        River => "RIVER",
        Lake => "LAKE",
        Stream => "STREAM",
        Canal => "CANAL",
        None => "NONE",
    }
}

class_enum! {
    /// 地面状况
    GroundCondition {
        Dry => "DRY",
        Moist => "MOIST",
        Saturated => "SATURATED",
        AlreadyFlooded => "ALREADY_FLOODED",
    }
}

class_enum! {
    /// 建筑类型 (仅描述, 不参与评分)
    BuildingType {
        Concrete => "CONCRETE",
        Mixed => "MIXED",
        LightMaterial => "LIGHT_MATERIAL",
        Makeshift => "MAKESHIFT",
    }
}

class_enum! {
    /// 历史洪涝成因
    FloodCause {
        HeavyRain => "HEAVY_RAIN",
        RiverOverflow => "RIVER_OVERFLOW",
        StormSurge => "STORM_SURGE",
        DrainageFailure => "DRAINAGE_FAILURE",
        DamRelease => "DAM_RELEASE",
        Other => "OTHER",
    }
}

class_enum! {
    /// 历史洪涝频次
    FloodFrequency {
        Rare => "RARE",
        Occasional => "OCCASIONAL",
        Frequent => "FREQUENT",
        VeryFrequent => "VERY_FREQUENT",
    }
}

class_enum! {
    /// 历史洪涝覆盖范围
    FloodCoverage {
        Partial => "PARTIAL",
        EntireArea => "ENTIRE_AREA",
        BeyondPolygon => "BEYOND_POLYGON",
    }
}
