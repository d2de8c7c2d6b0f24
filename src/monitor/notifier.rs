// ==========================================
// 洪涝风险监测系统 - 刷新通知
// ==========================================
// 职责: 周期内有区域等级变化时通知展示层 (每周期至多一次)
// 实现: NoOp / 日志 / tokio broadcast 通道
// ==========================================

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// 刷新事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshEvent {
    pub cycle: u64,     // 周期序号 (从 1 开始)
    pub changed: usize, // 本周期等级变化的区域数
}

// ==========================================
// RefreshNotifier Trait
// ==========================================
pub trait RefreshNotifier: Send + Sync {
    /// 通知展示层刷新
    fn notify_changed(&self, event: RefreshEvent);
}

/// 不做任何事
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRefreshNotifier;

impl RefreshNotifier for NoOpRefreshNotifier {
    fn notify_changed(&self, _event: RefreshEvent) {}
}

/// 仅记录日志
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRefreshNotifier;

impl RefreshNotifier for LoggingRefreshNotifier {
    fn notify_changed(&self, event: RefreshEvent) {
        tracing::info!(cycle = event.cycle, changed = event.changed, "区域风险等级已刷新");
    }
}

// ==========================================
// ChannelRefreshNotifier - 广播通道
// ==========================================
// 展示层通过 subscribe() 订阅; 无订阅者时事件直接丢弃
#[derive(Debug, Clone)]
pub struct ChannelRefreshNotifier {
    sender: broadcast::Sender<RefreshEvent>,
}

impl ChannelRefreshNotifier {
    /// 创建通知器与首个订阅端
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<RefreshEvent>) {
        let (sender, receiver) = broadcast::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// 新增订阅端
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.sender.subscribe()
    }
}

impl RefreshNotifier for ChannelRefreshNotifier {
    fn notify_changed(&self, event: RefreshEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!(cycle = event.cycle, "无刷新订阅者, 事件丢弃");
        }
    }
}
