//! InMemoryTaskStore - 開発・テスト用のリモートストア
//!
//! # 学習ポイント
//! - tokio::sync::Mutex で状態を共有（await を跨いでロックを持たない）
//! - 各呼び出しで一度 yield して、ネットワーク往復の「途中」を再現
//! - 失敗注入（一覧取得・部分更新・特定タイトルの作成）

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::domain::{
    normalize_title, ContainerKey, Item, ItemId, NewTask, ProfileId, RecordId, SourceRecord,
    TaskId, TaskPatch,
};
use crate::ports::{Clock, StoreError, SystemClock, TaskStore};

/// 呼び出し回数（テストでの観測用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub list_tasks: usize,
    pub list_records: usize,
    pub create_task: usize,
    pub patch_task: usize,
}

struct InMemoryStoreState {
    /// All tasks (single source of truth).
    tasks: BTreeMap<TaskId, Item>,

    /// Records per profile (read-only from the engine's point of view).
    records: HashMap<ProfileId, Vec<SourceRecord>>,

    next_task_id: u64,
    next_record_id: u64,

    fail_listing: bool,
    fail_patches: usize,
    fail_create_titles: HashSet<String>,

    calls: StoreCalls,
}

impl InMemoryStoreState {
    fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            records: HashMap::new(),
            next_task_id: 1,
            next_record_id: 1,
            fail_listing: false,
            fail_patches: 0,
            fail_create_titles: HashSet::new(),
            calls: StoreCalls::default(),
        }
    }

    fn allocate_task_id(&mut self) -> TaskId {
        let id = TaskId::new(self.next_task_id);
        self.next_task_id += 1;
        id
    }

    fn allocate_record_id(&mut self) -> RecordId {
        let id = RecordId::new(self.next_record_id);
        self.next_record_id += 1;
        id
    }

    /// 新規タスクは列の末尾に付く
    fn next_order(&self, profile_id: ProfileId, status: ContainerKey) -> u32 {
        let count = self
            .tasks
            .values()
            .filter(|item| item.profile_id == profile_id && item.status == status)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn insert_task(&mut self, profile_id: ProfileId, task: &NewTask, clock: &dyn Clock) -> Item {
        let task_id = self.allocate_task_id();
        let now = clock.now();
        let item = Item {
            id: ItemId::Task(task_id),
            profile_id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            order: self.next_order(profile_id, task.status),
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert(task_id, item.clone());
        item
    }

    fn tasks_for(&self, profile_id: ProfileId) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .tasks
            .values()
            .filter(|item| item.profile_id == profile_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| (item.status, item.order));
        items
    }
}

/// In-memory remote store.
pub struct InMemoryTaskStore {
    state: Arc<Mutex<InMemoryStoreState>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryStoreState::new())),
            clock,
        }
    }

    /// 既存タスクを直接登録（呼び出し回数には数えない）
    pub async fn seed_task(
        &self,
        profile_id: ProfileId,
        title: &str,
        status: ContainerKey,
    ) -> Item {
        let mut state = self.state.lock().await;
        state.insert_task(profile_id, &NewTask::new(title, status), self.clock.as_ref())
    }

    pub async fn seed_record(
        &self,
        profile_id: ProfileId,
        title: &str,
        date: NaiveDate,
    ) -> SourceRecord {
        let mut state = self.state.lock().await;
        let record = SourceRecord {
            id: state.allocate_record_id(),
            title: title.to_string(),
            date,
            description: String::new(),
        };
        state
            .records
            .entry(profile_id)
            .or_default()
            .push(record.clone());
        record
    }

    /// 一覧取得（tasks / records）を失敗させる
    pub async fn fail_listing(&self, fail: bool) {
        self.state.lock().await.fail_listing = fail;
    }

    /// 次の `n` 回の部分更新を失敗させる
    pub async fn fail_next_patches(&self, n: usize) {
        self.state.lock().await.fail_patches = n;
    }

    /// 指定タイトル（正規化して比較）の作成を失敗させる
    pub async fn fail_creates_for(&self, title: &str) {
        self.state
            .lock()
            .await
            .fail_create_titles
            .insert(normalize_title(title));
    }

    pub async fn calls(&self) -> StoreCalls {
        self.state.lock().await.calls
    }

    /// プロフィールのタスク（status, order 順）
    pub async fn tasks_for(&self, profile_id: ProfileId) -> Vec<Item> {
        self.state.lock().await.tasks_for(profile_id)
    }

    pub async fn get(&self, task_id: TaskId) -> Option<Item> {
        self.state.lock().await.tasks.get(&task_id).cloned()
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list_tasks(&self, profile_id: ProfileId) -> Result<Vec<Item>, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.calls.list_tasks += 1;
        if state.fail_listing {
            return Err(StoreError::Transport("simulated outage".to_string()));
        }
        Ok(state.tasks_for(profile_id))
    }

    async fn list_records(&self, profile_id: ProfileId) -> Result<Vec<SourceRecord>, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.calls.list_records += 1;
        if state.fail_listing {
            return Err(StoreError::Transport("simulated outage".to_string()));
        }
        Ok(state.records.get(&profile_id).cloned().unwrap_or_default())
    }

    async fn create_task(&self, profile_id: ProfileId, task: &NewTask) -> Result<Item, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.calls.create_task += 1;
        if state.fail_create_titles.contains(&normalize_title(&task.title)) {
            return Err(StoreError::Status {
                status: 503,
                body: "simulated create failure".to_string(),
            });
        }
        Ok(state.insert_task(profile_id, task, self.clock.as_ref()))
    }

    async fn patch_task(&self, task_id: TaskId, patch: &TaskPatch) -> Result<Item, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.calls.patch_task += 1;
        if state.fail_patches > 0 {
            state.fail_patches -= 1;
            return Err(StoreError::Transport("simulated patch failure".to_string()));
        }
        let now = self.clock.now();
        let item = state
            .tasks
            .get_mut(&task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        patch.apply_to(item);
        item.updated_at = now;
        Ok(item.clone())
    }
}
