// ==========================================
// 洪涝风险监测系统 - 监测调度器
// ==========================================
// 职责: 周期性重算全部区域的风险等级
// 状态: Idle / Monitoring, 模式: Live / Demo (正交)
// 周期流程:
//   1. 读取全部区域 (解码失败的区域跳过)
//   2. 按 batch_size 分批, 批次严格顺序执行
//   3. 批内并发: 获取天气 (Live) 或读取演示场景 (Demo) -> 评分
//   4. 等级变化才写回 {risk_level, weather, last_risk_update}
//   5. Live 模式批间节流
//   6. 有变化时通知一次
// 红线: 取消只在批次之间生效, 进行中的请求不会被中断
// 红线: 同一时刻至多一个周期在运行
// ==========================================

use crate::config::MonitorConfig;
use crate::domain::area::Area;
use crate::domain::risk::AreaSnapshot;
use crate::domain::types::FloodLevel;
use crate::domain::weather::WeatherSnapshot;
use crate::engine::RiskScoringEngine;
use crate::monitor::error::{MonitorError, MonitorResult};
use crate::monitor::notifier::{RefreshEvent, RefreshNotifier};
use crate::monitor::scenarios::{DemoScenario, ScenarioCatalog};
use crate::repository::{AreaStore, RiskUpdate};
use crate::weather::{fetch_snapshot, WeatherProvider};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// ==========================================
// 状态与模式
// ==========================================

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorState {
    Idle,
    Monitoring,
}

/// 天气来源模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorMode {
    /// 外部天气接口 (需要密钥)
    Live,
    /// 演示场景 (无外部调用)
    #[default]
    Demo,
}

impl MonitorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorMode::Live => "LIVE",
            MonitorMode::Demo => "DEMO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIVE" => Some(MonitorMode::Live),
            "DEMO" => Some(MonitorMode::Demo),
            _ => None,
        }
    }
}

impl std::fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 周期报告与状态快照
// ==========================================

/// 单个周期的执行报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: String,
    pub cycle: u64,
    pub mode: MonitorMode,
    pub scenario: Option<String>, // 仅 Demo 模式
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    pub areas_seen: usize,           // 读取到的区域数 (含解码失败)
    pub batches: usize,              // 实际执行的批次数
    pub evaluated: usize,            // 完成评分的区域数
    pub updated: usize,              // 等级变化且写回成功
    pub skipped: usize,              // 解码/取数失败而跳过
    pub persistence_failures: usize, // 写回失败
    pub notified: bool,
    pub cancelled: bool, // 因停止请求提前结束
}

/// 调度器状态快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub mode: MonitorMode,
    pub scenario: String,
    pub live_available: bool,
    pub completed_cycles: u64,
    pub last_report: Option<CycleReport>,
}

// ==========================================
// 内部结构
// ==========================================

/// 单个区域的处理结果
enum AreaOutcome {
    Unchanged,
    Updated,
}

/// 周期内的天气来源
enum WeatherSource<'a> {
    Live(&'a dyn WeatherProvider),
    Demo(WeatherSnapshot),
}

/// 循环任务的取消信号 (每次 start 新建)
#[derive(Default)]
struct LoopSignal {
    cancel: AtomicBool,
    wake: Notify,
}

impl LoopSignal {
    fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

struct LoopTask {
    signal: Arc<LoopSignal>,
    join: JoinHandle<()>,
}

/// 周期运行标志守卫 (drop 时释放)
struct CycleGuard<'a>(&'a AtomicBool);

impl<'a> CycleGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| CycleGuard(flag))
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy)]
struct Control {
    state: MonitorState,
    mode: MonitorMode,
}

struct SchedulerInner {
    store: Arc<dyn AreaStore>,
    weather: Option<Arc<dyn WeatherProvider>>,
    notifier: Arc<dyn RefreshNotifier>,
    engine: RiskScoringEngine,
    scenarios: ScenarioCatalog,
    config: MonitorConfig,

    control: Mutex<Control>,
    cycle_running: AtomicBool,
    completed_cycles: AtomicU64,
    last_report: Mutex<Option<CycleReport>>,
}

// ==========================================
// MonitoringScheduler - 监测调度器
// ==========================================
pub struct MonitoringScheduler {
    inner: Arc<SchedulerInner>,
    task: tokio::sync::Mutex<Option<LoopTask>>,
}

impl MonitoringScheduler {
    /// 构造函数
    ///
    /// # 参数
    /// - store: 区域仓储
    /// - weather: 天气数据源 (None 时只能使用 Demo 模式)
    /// - notifier: 刷新通知
    /// - config: 调度参数
    pub fn new(
        store: Arc<dyn AreaStore>,
        weather: Option<Arc<dyn WeatherProvider>>,
        notifier: Arc<dyn RefreshNotifier>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                weather,
                notifier,
                engine: RiskScoringEngine::new(),
                scenarios: ScenarioCatalog::new(),
                config,
                control: Mutex::new(Control {
                    state: MonitorState::Idle,
                    mode: MonitorMode::default(),
                }),
                cycle_running: AtomicBool::new(false),
                completed_cycles: AtomicU64::new(0),
                last_report: Mutex::new(None),
            }),
            task: tokio::sync::Mutex::new(None),
        }
    }

    // ==========================================
    // 生命周期
    // ==========================================

    /// 开始监测 (首个周期立即执行)
    ///
    /// - 已在监测中: 无操作
    /// - Live 模式且无天气数据源: 返回 Configuration 错误
    pub async fn start(&self, mode: MonitorMode) -> MonitorResult<()> {
        let mut task = self.task.lock().await;

        {
            let mut control = self.inner.lock_control();
            if control.state == MonitorState::Monitoring {
                debug!(mode = %control.mode, "监测已在运行, 忽略重复启动");
                return Ok(());
            }
            self.inner.ensure_mode_available(mode)?;
            control.state = MonitorState::Monitoring;
            control.mode = mode;
        }

        let signal = Arc::new(LoopSignal::default());
        let join = tokio::spawn(run_loop(Arc::clone(&self.inner), Arc::clone(&signal)));
        *task = Some(LoopTask { signal, join });

        info!(mode = %mode, "监测已启动");
        Ok(())
    }

    /// 停止监测
    ///
    /// 进行中的批次会执行完毕 (含写回), 之后不再启动新批次
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;

        if let Some(LoopTask { signal, join }) = task.take() {
            signal.cancel();
            if let Err(e) = join.await {
                error!(error = %e, "监测循环异常退出");
            }
        }

        let mut control = self.inner.lock_control();
        if control.state == MonitorState::Monitoring {
            control.state = MonitorState::Idle;
            info!(mode = %control.mode, "监测已停止");
        }
    }

    /// 切换模式 (仅 Idle 状态)
    pub fn set_mode(&self, mode: MonitorMode) -> MonitorResult<()> {
        let mut control = self.inner.lock_control();
        if control.state == MonitorState::Monitoring {
            return Err(MonitorError::InvalidState(
                "监测运行中不能切换模式, 请先停止".to_string(),
            ));
        }
        self.inner.ensure_mode_available(mode)?;
        control.mode = mode;
        Ok(())
    }

    // ==========================================
    // 人工操作
    // ==========================================

    /// 立即执行一个周期 (当前模式)
    ///
    /// 已有周期在运行时跳过, 返回 Ok(None)
    pub async fn run_cycle_now(&self) -> MonitorResult<Option<CycleReport>> {
        let mode = self.inner.lock_control().mode;
        self.inner.ensure_mode_available(mode)?;

        let signal = LoopSignal::default();
        Ok(self.inner.run_cycle(mode, &signal).await)
    }

    /// 切换到下一个演示场景 (不触发重算)
    pub fn advance_scenario(&self) -> &'static DemoScenario {
        let scenario = self.inner.scenarios.advance();
        info!(scenario = scenario.name, "演示场景已切换");
        scenario
    }

    /// 当前演示场景
    pub fn current_scenario(&self) -> &'static DemoScenario {
        self.inner.scenarios.current()
    }

    /// 状态快照
    pub fn status(&self) -> MonitorStatus {
        let control = *self.inner.lock_control();
        let last_report = self
            .inner
            .last_report
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone());

        MonitorStatus {
            state: control.state,
            mode: control.mode,
            scenario: self.inner.scenarios.current().name.to_string(),
            live_available: self.inner.weather.is_some(),
            completed_cycles: self.inner.completed_cycles.load(Ordering::SeqCst),
            last_report,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }
}

impl Drop for MonitoringScheduler {
    fn drop(&mut self) {
        // 调度器被丢弃时通知循环退出 (无法在 drop 中等待)
        if let Ok(mut task) = self.task.try_lock() {
            if let Some(task) = task.take() {
                task.signal.cancel();
            }
        }
    }
}

// ==========================================
// 监测循环
// ==========================================

async fn run_loop(inner: Arc<SchedulerInner>, signal: Arc<LoopSignal>) {
    // 周期按启动时刻计算, 周期自身耗时 (含批间节流) 不顺延下一次启动
    let mut mode = inner.lock_control().mode;
    let mut ticker = cycle_ticker(inner.period(mode), true);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = signal.wake.notified() => {}
        }
        if signal.is_cancelled() {
            break;
        }

        let current = inner.lock_control().mode;
        if current != mode {
            mode = current;
            ticker = cycle_ticker(inner.period(mode), false);
        }

        inner.run_cycle(mode, &signal).await;

        if signal.is_cancelled() {
            break;
        }
    }
    debug!("监测循环退出");
}

/// 周期定时器 (首次立即触发或延后一个周期; 超时的周期顺延而不补发)
fn cycle_ticker(period: Duration, immediate: bool) -> Interval {
    let start = if immediate {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

impl SchedulerInner {
    fn lock_control(&self) -> std::sync::MutexGuard<'_, Control> {
        self.control
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_mode_available(&self, mode: MonitorMode) -> MonitorResult<()> {
        if mode == MonitorMode::Live && self.weather.is_none() {
            return Err(MonitorError::Configuration(
                "实时模式需要有效的天气接口密钥".to_string(),
            ));
        }
        Ok(())
    }

    fn period(&self, mode: MonitorMode) -> Duration {
        match mode {
            MonitorMode::Live => self.config.live_interval,
            MonitorMode::Demo => self.config.demo_interval,
        }
    }

    /// 执行一个周期; 已有周期在运行时返回 None
    async fn run_cycle(&self, mode: MonitorMode, signal: &LoopSignal) -> Option<CycleReport> {
        let Some(_guard) = CycleGuard::try_acquire(&self.cycle_running) else {
            warn!("上一个周期仍在运行, 本次跳过");
            return None;
        };

        let cycle = self.completed_cycles.load(Ordering::SeqCst) + 1;
        let cycle_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let (source, scenario) = match mode {
            MonitorMode::Live => match self.weather.as_deref() {
                Some(provider) => (WeatherSource::Live(provider), None),
                None => {
                    error!(cycle, "实时模式缺少天气数据源, 周期跳过");
                    return None;
                }
            },
            MonitorMode::Demo => {
                let scenario = self.scenarios.current();
                (WeatherSource::Demo(scenario.weather()), Some(scenario.name.to_string()))
            }
        };

        let mut report = CycleReport {
            cycle_id,
            cycle,
            mode,
            scenario,
            started_at,
            finished_at: started_at,
            areas_seen: 0,
            batches: 0,
            evaluated: 0,
            updated: 0,
            skipped: 0,
            persistence_failures: 0,
            notified: false,
            cancelled: false,
        };

        debug!(cycle, cycle_id = %report.cycle_id, mode = %mode, "周期开始");

        // 1. 读取区域
        let areas = match self.load_areas(&mut report).await {
            Ok(areas) => areas,
            Err(e) => {
                error!(cycle, error = %e, "区域读取失败, 本周期无评估");
                Vec::new()
            }
        };

        // 2. 分批顺序执行
        let batch_size = self.config.batch_size.max(1);
        let total_batches = self.config.batch_count(areas.len());

        for (index, batch) in areas.chunks(batch_size).enumerate() {
            let outcomes = join_all(
                batch
                    .iter()
                    .map(|area| self.process_area(area, &source, started_at)),
            )
            .await;
            report.batches += 1;

            for outcome in outcomes {
                match outcome {
                    Ok(AreaOutcome::Updated) => {
                        report.evaluated += 1;
                        report.updated += 1;
                    }
                    Ok(AreaOutcome::Unchanged) => report.evaluated += 1,
                    Err(e @ MonitorError::Persistence { .. }) => {
                        report.evaluated += 1;
                        report.persistence_failures += 1;
                        error!(cycle, batch = index, error = %e, "风险写回失败, 等待后续周期");
                    }
                    Err(e) => {
                        report.skipped += 1;
                        warn!(cycle, batch = index, error = %e, "区域本周期跳过");
                    }
                }
            }

            let is_last = index + 1 == total_batches;
            if is_last {
                break;
            }
            if signal.is_cancelled() {
                report.cancelled = true;
                break;
            }

            // 3. Live 模式批间节流
            if matches!(source, WeatherSource::Live(_)) && !self.config.batch_pacing.is_zero() {
                tokio::time::sleep(self.config.batch_pacing).await;
                if signal.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
            }
        }

        // 4. 有变化时通知一次
        if report.updated > 0 {
            self.notifier.notify_changed(RefreshEvent {
                cycle,
                changed: report.updated,
            });
            report.notified = true;
        }

        report.finished_at = Utc::now();
        self.completed_cycles.fetch_add(1, Ordering::SeqCst);
        info!(
            cycle,
            mode = %mode,
            areas = report.areas_seen,
            batches = report.batches,
            updated = report.updated,
            skipped = report.skipped,
            persistence_failures = report.persistence_failures,
            cancelled = report.cancelled,
            "周期完成"
        );

        match self.last_report.lock() {
            Ok(mut last) => *last = Some(report.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(report.clone()),
        }
        Some(report)
    }

    /// 读取区域, 解码失败的记录记日志后丢弃
    async fn load_areas(&self, report: &mut CycleReport) -> MonitorResult<Vec<Area>> {
        let loaded = self.store.list().await.map_err(MonitorError::Store)?;
        report.areas_seen = loaded.len();

        let mut areas = Vec::with_capacity(loaded.len());
        for entry in loaded {
            match entry {
                Ok(area) => areas.push(area),
                Err(e) => {
                    report.skipped += 1;
                    let area_id = e.area_id.clone();
                    let err = MonitorError::Parse(e);
                    warn!(area_id = %area_id, error = %err, "区域记录解析失败, 本周期跳过");
                }
            }
        }
        Ok(areas)
    }

    /// 处理单个区域: 取天气 -> 评分 -> 等级变化时写回
    async fn process_area(
        &self,
        area: &Area,
        source: &WeatherSource<'_>,
        now: DateTime<Utc>,
    ) -> MonitorResult<AreaOutcome> {
        let weather = match source {
            WeatherSource::Live(provider) => {
                fetch_snapshot(*provider, area.geometry.representative_point())
                    .await
                    .map_err(|e| MonitorError::Fetch {
                        area_id: area.id.clone(),
                        source: e,
                    })?
            }
            WeatherSource::Demo(weather) => weather.clone(),
        };

        let snapshot = AreaSnapshot::merge(area, weather);
        let assessment = self.engine.evaluate(&snapshot);

        debug!(
            area_id = %area.id,
            score = assessment.score,
            level = %assessment.level,
            breakdown = %serde_json::to_string(&assessment.breakdown).unwrap_or_default(),
            "区域评分完成"
        );

        if assessment.level == area.risk_level {
            return Ok(AreaOutcome::Unchanged);
        }

        let update = RiskUpdate {
            risk_level: assessment.level,
            weather: snapshot.weather,
            last_risk_update: now,
        };
        self.store
            .update(&area.id, &update)
            .await
            .map_err(|e| MonitorError::Persistence {
                area_id: area.id.clone(),
                source: e,
            })?;

        log_transition(area, area.risk_level, assessment.level);
        Ok(AreaOutcome::Updated)
    }
}

fn log_transition(area: &Area, from: FloodLevel, to: FloodLevel) {
    if to > from {
        info!(area_id = %area.id, name = %area.name, from = %from, to = %to, "风险等级上升");
    } else {
        info!(area_id = %area.id, name = %area.name, from = %from, to = %to, "风险等级下降");
    }
}
