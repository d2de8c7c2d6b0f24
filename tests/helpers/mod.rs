// ==========================================
// 集成测试公共辅助
// ==========================================
#![allow(dead_code, unused_imports)]

pub mod area_builder;
pub mod mock_store;
pub mod mock_weather;

pub use area_builder::AreaBuilder;
pub use mock_store::{CountingNotifier, InMemoryAreaStore};
pub use mock_weather::MockWeatherProvider;
