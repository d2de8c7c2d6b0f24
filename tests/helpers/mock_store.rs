// ==========================================
// 内存仓储与计数通知器 - 用于调度器测试
// ==========================================

use async_trait::async_trait;
use flood_risk_monitor::domain::area::Area;
use flood_risk_monitor::monitor::{RefreshEvent, RefreshNotifier};
use flood_risk_monitor::repository::{
    AreaDecodeError, AreaStore, LoadedArea, RepositoryError, RepositoryResult, RiskUpdate,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ==========================================
// InMemoryAreaStore
// ==========================================
#[derive(Default)]
pub struct InMemoryAreaStore {
    entries: Mutex<Vec<LoadedArea>>,
    rejected: Mutex<HashSet<String>>,
    updates: Mutex<Vec<(String, RiskUpdate)>>,
    list_calls: AtomicUsize,
}

impl InMemoryAreaStore {
    pub fn new(areas: Vec<Area>) -> Self {
        Self {
            entries: Mutex::new(areas.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    /// 追加一条无法解码的记录
    pub fn push_broken(&self, area_id: &str, field: &str) {
        self.entries
            .lock()
            .unwrap()
            .push(Err(AreaDecodeError::new(area_id, field, "malformed")));
    }

    /// 对指定区域的写回返回错误
    pub fn reject_updates_for(&self, area_id: &str) {
        self.rejected.lock().unwrap().insert(area_id.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn updated_ids(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn area(&self, area_id: &str) -> Option<Area> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| e.as_ref().ok())
            .find(|a| a.id == area_id)
            .cloned()
    }
}

#[async_trait]
impl AreaStore for InMemoryAreaStore {
    async fn list(&self) -> RepositoryResult<Vec<LoadedArea>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn get(&self, area_id: &str) -> RepositoryResult<Option<Area>> {
        Ok(self.area(area_id))
    }

    async fn update(&self, area_id: &str, update: &RiskUpdate) -> RepositoryResult<()> {
        if self.rejected.lock().unwrap().contains(area_id) {
            return Err(RepositoryError::DatabaseQueryError("database is locked".to_string()));
        }

        let mut entries = self.entries.lock().unwrap();
        let area = entries
            .iter_mut()
            .filter_map(|e| e.as_mut().ok())
            .find(|a| a.id == area_id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "area".to_string(),
                id: area_id.to_string(),
            })?;

        area.risk_level = update.risk_level;
        area.weather = update.weather.clone();
        area.last_risk_update = Some(update.last_risk_update);

        self.updates
            .lock()
            .unwrap()
            .push((area_id.to_string(), update.clone()));
        Ok(())
    }
}

// ==========================================
// CountingNotifier
// ==========================================
#[derive(Default)]
pub struct CountingNotifier {
    events: Mutex<Vec<RefreshEvent>>,
}

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<RefreshEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RefreshNotifier for CountingNotifier {
    fn notify_changed(&self, event: RefreshEvent) {
        self.events.lock().unwrap().push(event);
    }
}
