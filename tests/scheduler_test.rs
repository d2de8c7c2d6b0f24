// ==========================================
// MonitoringScheduler 集成测试
// ==========================================
// 测试目标: 周期调度、分批、写回、通知、取消
// 工具: 内存仓储 + mock 天气源, tokio 暂停时钟
// ==========================================

mod helpers;

use flood_risk_monitor::config::MonitorConfig;
use flood_risk_monitor::domain::types::{FloodLevel, GroundCondition};
use flood_risk_monitor::monitor::{
    ChannelRefreshNotifier, MonitorError, MonitorMode, MonitorState, MonitoringScheduler,
    NoOpRefreshNotifier,
};
use flood_risk_monitor::weather::WeatherProvider;
use helpers::{AreaBuilder, CountingNotifier, InMemoryAreaStore, MockWeatherProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

// ==========================================
// 测试辅助函数
// ==========================================

fn scheduler_with(
    store: Arc<InMemoryAreaStore>,
    weather: Option<Arc<dyn WeatherProvider>>,
    notifier: Arc<CountingNotifier>,
) -> MonitoringScheduler {
    MonitoringScheduler::new(store, weather, notifier, MonitorConfig::default())
}

/// n 个默认区域 (坐标各不相同)
fn default_areas(n: usize) -> Vec<flood_risk_monitor::Area> {
    (0..n)
        .map(|i| {
            AreaBuilder::new(&format!("A{:02}", i))
                .at(14.0 + i as f64 * 0.01, 121.0)
                .build()
        })
        .collect()
}

/// 让出执行权若干次, 使后台任务推进
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

// ==========================================
// 生命周期
// ==========================================

#[tokio::test]
async fn test_live_mode_requires_provider() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(2)));
    let scheduler = scheduler_with(store.clone(), None, Arc::new(CountingNotifier::default()));

    let err = scheduler.start(MonitorMode::Live).await.unwrap_err();
    assert!(matches!(err, MonitorError::Configuration(_)));
    assert_eq!(scheduler.status().state, MonitorState::Idle);
    assert!(!scheduler.status().live_available);

    // Demo 模式不受影响
    scheduler.start(MonitorMode::Demo).await.unwrap();
    assert_eq!(scheduler.status().state, MonitorState::Monitoring);
    scheduler.stop().await;
    assert_eq!(scheduler.status().state, MonitorState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_first_cycle_runs_immediately_then_every_demo_period() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(2)));
    let scheduler = scheduler_with(store.clone(), None, Arc::new(CountingNotifier::default()));

    scheduler.start(MonitorMode::Demo).await.unwrap();
    settle().await;
    assert_eq!(store.list_calls(), 1);

    tokio::time::sleep(Duration::from_millis(9_900)).await;
    assert_eq!(store.list_calls(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.list_calls(), 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.list_calls(), 3);

    scheduler.stop().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(store.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_live_period_is_five_minutes() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(1)));
    let weather: Arc<dyn WeatherProvider> = Arc::new(MockWeatherProvider::stormy());
    let scheduler = scheduler_with(store.clone(), Some(weather), Arc::new(CountingNotifier::default()));

    scheduler.start(MonitorMode::Live).await.unwrap();
    settle().await;
    assert_eq!(store.list_calls(), 1);

    tokio::time::sleep(Duration::from_secs(299)).await;
    assert_eq!(store.list_calls(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(store.list_calls(), 2);

    scheduler.stop().await;
}

/// 周期按启动时刻计算: 批间节流 (7 区域 = 3 批, 2 s) 不顺延下一周期
#[tokio::test(start_paused = true)]
async fn test_live_period_does_not_drift_with_cycle_duration() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(7)));
    let weather: Arc<dyn WeatherProvider> = Arc::new(MockWeatherProvider::stormy());
    let scheduler = scheduler_with(store.clone(), Some(weather), Arc::new(CountingNotifier::default()));

    scheduler.start(MonitorMode::Live).await.unwrap();
    settle().await;
    assert_eq!(store.list_calls(), 1);

    tokio::time::sleep(Duration::from_millis(300_500)).await;
    assert_eq!(store.list_calls(), 2);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(store.list_calls(), 3);

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_start_while_monitoring_is_noop() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(1)));
    let scheduler = scheduler_with(store.clone(), None, Arc::new(CountingNotifier::default()));

    scheduler.start(MonitorMode::Demo).await.unwrap();
    settle().await;
    scheduler.start(MonitorMode::Demo).await.unwrap();
    settle().await;

    assert_eq!(store.list_calls(), 1);
    scheduler.stop().await;
}

#[tokio::test]
async fn test_set_mode_only_while_idle() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(1)));
    let weather: Arc<dyn WeatherProvider> = Arc::new(MockWeatherProvider::stormy());
    let scheduler = scheduler_with(store, Some(weather), Arc::new(CountingNotifier::default()));

    scheduler.set_mode(MonitorMode::Live).unwrap();
    assert_eq!(scheduler.status().mode, MonitorMode::Live);

    scheduler.start(MonitorMode::Demo).await.unwrap();
    let err = scheduler.set_mode(MonitorMode::Live).unwrap_err();
    assert!(matches!(err, MonitorError::InvalidState(_)));

    scheduler.stop().await;
    scheduler.set_mode(MonitorMode::Live).unwrap();
}

// ==========================================
// 周期行为
// ==========================================

#[tokio::test(start_paused = true)]
async fn test_live_cycle_batches_with_pacing() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(7)));
    let weather: Arc<dyn WeatherProvider> = Arc::new(MockWeatherProvider::stormy());
    let scheduler = scheduler_with(store.clone(), Some(weather), Arc::new(CountingNotifier::default()));
    scheduler.set_mode(MonitorMode::Live).unwrap();

    let started = Instant::now();
    let report = scheduler.run_cycle_now().await.unwrap().unwrap();
    let elapsed = started.elapsed();

    // ⌈7/3⌉ = 3 批, 批间 2 次节流
    assert_eq!(report.batches, 3);
    assert_eq!(report.areas_seen, 7);
    assert_eq!(report.evaluated, 7);
    assert!(elapsed >= Duration::from_secs(2), "elapsed = {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "elapsed = {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_demo_cycle_has_no_pacing() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(7)));
    let scheduler = scheduler_with(store.clone(), None, Arc::new(CountingNotifier::default()));

    let started = Instant::now();
    let report = scheduler.run_cycle_now().await.unwrap().unwrap();

    assert_eq!(report.batches, 3);
    assert_eq!(report.mode, MonitorMode::Demo);
    assert_eq!(report.scenario.as_deref(), Some("Heavy Rain Storm"));
    assert!(started.elapsed() < Duration::from_millis(1));
}

#[tokio::test]
async fn test_notifies_once_per_dirty_cycle() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(5)));
    let notifier = Arc::new(CountingNotifier::default());
    let scheduler = scheduler_with(store.clone(), None, notifier.clone());

    // Heavy Rain Storm: 默认区域 VeryLow -> High
    let report = scheduler.run_cycle_now().await.unwrap().unwrap();
    assert_eq!(report.updated, 5);
    assert!(report.notified);
    assert_eq!(notifier.count(), 1);
    assert_eq!(notifier.events()[0].changed, 5);
    assert_eq!(store.area("A00").unwrap().risk_level, FloodLevel::High);
    assert!(store.area("A00").unwrap().last_risk_update.is_some());
}

#[tokio::test]
async fn test_unchanged_level_is_not_written() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(4)));
    let notifier = Arc::new(CountingNotifier::default());
    let scheduler = scheduler_with(store.clone(), None, notifier.clone());

    scheduler.run_cycle_now().await.unwrap().unwrap();
    assert_eq!(store.update_count(), 4);

    // 同一场景再跑一次: 等级不变, 不写回, 不通知
    let report = scheduler.run_cycle_now().await.unwrap().unwrap();
    assert_eq!(report.evaluated, 4);
    assert_eq!(report.updated, 0);
    assert!(!report.notified);
    assert_eq!(store.update_count(), 4);
    assert_eq!(notifier.count(), 1);
    assert_eq!(scheduler.status().completed_cycles, 2);
}

#[tokio::test]
async fn test_advance_scenario_applies_on_next_cycle_only() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(2)));
    let scheduler = scheduler_with(store.clone(), None, Arc::new(CountingNotifier::default()));

    scheduler.run_cycle_now().await.unwrap();
    assert_eq!(store.area("A01").unwrap().risk_level, FloodLevel::High);

    // 切到 "Clear Weather", 切换本身不触发重算
    for _ in 0..4 {
        scheduler.advance_scenario();
    }
    assert_eq!(scheduler.current_scenario().name, "Clear Weather");
    assert_eq!(store.list_calls(), 1);
    assert_eq!(store.area("A01").unwrap().risk_level, FloodLevel::High);

    let report = scheduler.run_cycle_now().await.unwrap().unwrap();
    assert_eq!(report.scenario.as_deref(), Some("Clear Weather"));
    assert_eq!(store.area("A01").unwrap().risk_level, FloodLevel::VeryLow);

    // 循环回到第一个场景
    assert_eq!(scheduler.advance_scenario().name, "Heavy Rain Storm");
}

// ==========================================
// 故障隔离
// ==========================================

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_skips_only_that_area() {
    let areas = default_areas(3);
    let broken = areas[1].geometry.representative_point();
    let store = Arc::new(InMemoryAreaStore::new(areas));
    let weather: Arc<dyn WeatherProvider> =
        Arc::new(MockWeatherProvider::stormy().fail_at(broken.lat, broken.lng));
    let scheduler = scheduler_with(store.clone(), Some(weather), Arc::new(CountingNotifier::default()));
    scheduler.set_mode(MonitorMode::Live).unwrap();

    let report = scheduler.run_cycle_now().await.unwrap().unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.updated, 2);
    assert_eq!(store.updated_ids(), vec!["A00".to_string(), "A02".to_string()]);
    assert_eq!(store.area("A01").unwrap().risk_level, FloodLevel::VeryLow);
    assert!(store.area("A01").unwrap().last_risk_update.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_forecast_failure_defaults_to_zero() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(1)));
    let weather: Arc<dyn WeatherProvider> =
        Arc::new(MockWeatherProvider::stormy().failing_forecast());
    let scheduler = scheduler_with(store.clone(), Some(weather), Arc::new(CountingNotifier::default()));
    scheduler.set_mode(MonitorMode::Live).unwrap();

    let report = scheduler.run_cycle_now().await.unwrap().unwrap();
    assert_eq!(report.skipped, 0);
    assert_eq!(report.updated, 1);

    let area = store.area("A00").unwrap();
    assert_eq!(area.weather.forecast_rainfall_mm, 0.0);
    assert_eq!(area.weather.rainfall_mm_hr, 85.0);
}

#[tokio::test]
async fn test_undecodable_area_is_skipped() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(2)));
    store.push_broken("BROKEN", "geometry");
    let scheduler = scheduler_with(store.clone(), None, Arc::new(CountingNotifier::default()));

    let report = scheduler.run_cycle_now().await.unwrap().unwrap();
    assert_eq!(report.areas_seen, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.updated, 2);
}

#[tokio::test]
async fn test_persistence_failure_keeps_stale_level() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(3)));
    store.reject_updates_for("A02");
    let notifier = Arc::new(CountingNotifier::default());
    let scheduler = scheduler_with(store.clone(), None, notifier.clone());

    let report = scheduler.run_cycle_now().await.unwrap().unwrap();
    assert_eq!(report.persistence_failures, 1);
    assert_eq!(report.updated, 2);
    assert_eq!(notifier.count(), 1);
    assert_eq!(store.area("A02").unwrap().risk_level, FloodLevel::VeryLow);
}

#[tokio::test]
async fn test_already_flooded_area_goes_severe() {
    let area = AreaBuilder::new("FLOODED")
        .ground(GroundCondition::AlreadyFlooded)
        .build();
    let store = Arc::new(InMemoryAreaStore::new(vec![area]));
    let scheduler = scheduler_with(store.clone(), None, Arc::new(CountingNotifier::default()));

    // Clear Weather
    for _ in 0..4 {
        scheduler.advance_scenario();
    }
    scheduler.run_cycle_now().await.unwrap();
    assert_eq!(store.area("FLOODED").unwrap().risk_level, FloodLevel::Severe);
}

// ==========================================
// 取消与并发保护
// ==========================================

/// 批次进行中停止: 当前批次完成并写回, 之后不再启动新批次
#[tokio::test]
async fn test_stop_during_batch_finishes_batch_then_idles() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(4)));
    let (provider, gate) = MockWeatherProvider::stormy().gated();
    let provider = Arc::new(provider);
    let weather: Arc<dyn WeatherProvider> = provider.clone();
    let notifier = Arc::new(CountingNotifier::default());
    let scheduler = scheduler_with(store.clone(), Some(weather), notifier.clone());

    scheduler.start(MonitorMode::Live).await.unwrap();
    while provider.entered() < 3 {
        tokio::task::yield_now().await;
    }

    tokio::join!(scheduler.stop(), async {
        settle().await;
        gate.add_permits(16);
    });

    assert_eq!(scheduler.status().state, MonitorState::Idle);
    assert_eq!(provider.entered(), 3);
    assert_eq!(store.updated_ids(), vec!["A00", "A01", "A02"]);
    assert_eq!(store.area("A03").unwrap().risk_level, FloodLevel::VeryLow);
    assert_eq!(notifier.count(), 1);

    let report = scheduler.status().last_report.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.batches, 1);
}

#[tokio::test]
async fn test_manual_cycle_skipped_while_cycle_running() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(2)));
    let (provider, gate) = MockWeatherProvider::stormy().gated();
    let provider = Arc::new(provider);
    let weather: Arc<dyn WeatherProvider> = provider.clone();
    let scheduler = scheduler_with(store.clone(), Some(weather), Arc::new(CountingNotifier::default()));

    scheduler.start(MonitorMode::Live).await.unwrap();
    while provider.entered() < 2 {
        tokio::task::yield_now().await;
    }

    assert!(scheduler.run_cycle_now().await.unwrap().is_none());

    gate.add_permits(16);
    scheduler.stop().await;
    assert_eq!(scheduler.status().completed_cycles, 1);
}

#[tokio::test]
async fn test_channel_notifier_receives_cycle_event() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(2)));
    let (notifier, mut rx) = ChannelRefreshNotifier::new(4);
    let scheduler = MonitoringScheduler::new(
        store,
        None,
        Arc::new(notifier),
        MonitorConfig::default(),
    );

    scheduler.run_cycle_now().await.unwrap();
    let event = rx.recv().await.unwrap();
    assert_eq!(event.cycle, 1);
    assert_eq!(event.changed, 2);
}

#[tokio::test]
async fn test_status_reports_last_cycle() {
    let store = Arc::new(InMemoryAreaStore::new(default_areas(1)));
    let scheduler = MonitoringScheduler::new(
        store,
        None,
        Arc::new(NoOpRefreshNotifier),
        MonitorConfig::default(),
    );

    let status = scheduler.status();
    assert_eq!(status.state, MonitorState::Idle);
    assert_eq!(status.mode, MonitorMode::Demo);
    assert_eq!(status.scenario, "Heavy Rain Storm");
    assert!(status.last_report.is_none());

    scheduler.run_cycle_now().await.unwrap();
    let status = scheduler.status();
    assert_eq!(status.completed_cycles, 1);
    assert_eq!(status.last_report.unwrap().updated, 1);
}
