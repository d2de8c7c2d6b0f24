// ==========================================
// Area 构建器 - 用于集成测试
// ==========================================
// 默认值: 海拔 10m, 缓坡, 排水一般, 无水体, 干燥, 无历史, 无人口
// 默认区域在晴天为 VeryLow, 在 "Heavy Rain Storm" 场景下为 High
// ==========================================

use chrono::NaiveDate;
use flood_risk_monitor::domain::area::{
    Area, Coordinate, ExposureAttributes, FloodHistory, Geometry, HydrologicalAttributes,
    PhysicalAttributes,
};
use flood_risk_monitor::domain::types::{
    BuildingType, DrainageQuality, FloodCause, FloodCoverage, FloodFrequency, FloodLevel,
    GroundCondition, SlopeClass, SoilClass, SurfaceCover, WaterBodyType,
};
use flood_risk_monitor::domain::weather::WeatherSnapshot;
use std::collections::BTreeSet;

pub struct AreaBuilder {
    area: Area,
}

impl AreaBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            area: Area {
                id: id.to_string(),
                name: format!("Area {}", id),
                geometry: Geometry::Point(Coordinate::new(14.6, 121.0)),
                physical: PhysicalAttributes {
                    elevation_m: 10.0,
                    slope: SlopeClass::Gentle,
                    soil: SoilClass::Loam,
                    drainage: DrainageQuality::Moderate,
                    surface: SurfaceCover::Mixed,
                },
                hydrology: HydrologicalAttributes {
                    water_body: WaterBodyType::None,
                    water_distance_m: 2_000.0,
                    history: FloodHistory::none(),
                },
                exposure: ExposureAttributes {
                    population: 0,
                    vulnerable_groups: BTreeSet::new(),
                    critical_assets: BTreeSet::new(),
                    building_type: BuildingType::Concrete,
                },
                ground_condition: GroundCondition::Dry,
                weather: WeatherSnapshot::calm(),
                risk_level: FloodLevel::VeryLow,
                last_risk_update: None,
            },
        }
    }

    /// 低洼沿河区域 (接近 Example A 的静态属性)
    pub fn flood_prone(id: &str) -> Self {
        Self::new(id)
            .elevation(2.0)
            .slope(SlopeClass::Flat)
            .drainage(DrainageQuality::None)
            .surface(SurfaceCover::Paved)
            .water(WaterBodyType::River, 50.0)
    }

    pub fn name(mut self, name: &str) -> Self {
        self.area.name = name.to_string();
        self
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.area.geometry = Geometry::Point(Coordinate::new(lat, lng));
        self
    }

    pub fn polygon(mut self, ring: &[(f64, f64)]) -> Self {
        self.area.geometry = Geometry::Polygon(
            ring.iter()
                .map(|&(lat, lng)| Coordinate::new(lat, lng))
                .collect(),
        );
        self
    }

    pub fn elevation(mut self, elevation_m: f64) -> Self {
        self.area.physical.elevation_m = elevation_m;
        self
    }

    pub fn slope(mut self, slope: SlopeClass) -> Self {
        self.area.physical.slope = slope;
        self
    }

    pub fn drainage(mut self, drainage: DrainageQuality) -> Self {
        self.area.physical.drainage = drainage;
        self
    }

    pub fn surface(mut self, surface: SurfaceCover) -> Self {
        self.area.physical.surface = surface;
        self
    }

    pub fn water(mut self, body: WaterBodyType, distance_m: f64) -> Self {
        self.area.hydrology.water_body = body;
        self.area.hydrology.water_distance_m = distance_m;
        self
    }

    pub fn ground(mut self, ground: GroundCondition) -> Self {
        self.area.ground_condition = ground;
        self
    }

    /// 多次洪涝历史
    pub fn flooded_history(mut self, frequency: FloodFrequency, coverage: FloodCoverage, depth_m: f64) -> Self {
        self.area.hydrology.history = FloodHistory {
            has_flooded: true,
            past_dates: vec![
                NaiveDate::from_ymd_opt(2020, 11, 12).unwrap(),
                NaiveDate::from_ymd_opt(2024, 7, 24).unwrap(),
            ],
            cause: Some(FloodCause::RiverOverflow),
            max_depth_m: depth_m,
            duration: Some("2-3 days".to_string()),
            frequency: Some(frequency),
            coverage: Some(coverage),
            impacts: ["roads_closed", "homes_damaged"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            recovery_notes: Some("Cleared within a week".to_string()),
            defense_notes: None,
            preparedness_notes: Some("Evacuation center at the barangay hall".to_string()),
        };
        self
    }

    pub fn population(mut self, population: u64) -> Self {
        self.area.exposure.population = population;
        self
    }

    pub fn vulnerable(mut self, tag: &str) -> Self {
        self.area.exposure.vulnerable_groups.insert(tag.to_string());
        self
    }

    pub fn critical_asset(mut self, tag: &str) -> Self {
        self.area.exposure.critical_assets.insert(tag.to_string());
        self
    }

    pub fn risk_level(mut self, level: FloodLevel) -> Self {
        self.area.risk_level = level;
        self
    }

    pub fn weather(mut self, weather: WeatherSnapshot) -> Self {
        self.area.weather = weather;
        self
    }

    pub fn build(self) -> Area {
        self.area
    }
}
