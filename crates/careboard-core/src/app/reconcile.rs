//! ReconciliationClient - ローカル変更をリモートへの最小限の呼び出しに変換する
//!
//! # 失敗時の方針
//! - move: warn ログ + MoveSyncFailed イベント。ボードは巻き戻さない
//! - create: CreateFailed イベント。プレースホルダーの扱いは呼び出し側（engine）が決める
//! - edit: EditFailed イベント。巻き戻しは engine がスナップショットから行う
//!
//! いずれも `Result<_, SyncError>` を返すので、呼び出し側は警告を表示できます。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    BoardEvent, ContainerKey, ErrorKind, Item, NewTask, ProfileId, SourceRecord, TaskId,
    TaskPatch,
};
use crate::ports::{EventSink, StoreError, TaskStore};

/// spawn された同期処理のハンドル（テストでは await して結果を確認する）
pub type SyncHandle<T> = tokio::task::JoinHandle<Result<T, SyncError>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("failed to sync move of {task_id}: {source}")]
    Move {
        task_id: TaskId,
        #[source]
        source: StoreError,
    },

    #[error("failed to create task {title:?}: {source}")]
    Create {
        title: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to sync edit of {task_id}: {source}")]
    Edit {
        task_id: TaskId,
        #[source]
        source: StoreError,
    },
}

impl SyncError {
    pub fn store_error(&self) -> &StoreError {
        match self {
            SyncError::Move { source, .. }
            | SyncError::Create { source, .. }
            | SyncError::Edit { source, .. } => source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.store_error().kind()
    }
}

/// TaskStore の薄いラッパー（ログとイベント通知を担当）
#[derive(Clone)]
pub struct ReconciliationClient {
    store: Arc<dyn TaskStore>,
    events: Arc<dyn EventSink>,
}

impl ReconciliationClient {
    pub fn new(store: Arc<dyn TaskStore>, events: Arc<dyn EventSink>) -> Self {
        Self { store, events }
    }

    /// PATCH `{status, order}`
    pub async fn sync_move(
        &self,
        task_id: TaskId,
        status: ContainerKey,
        order: u32,
    ) -> Result<Item, SyncError> {
        debug!(%task_id, %status, order, "syncing move");
        match self
            .store
            .patch_task(task_id, &TaskPatch::placement(status, order))
            .await
        {
            Ok(item) => {
                self.events.emit(BoardEvent::MoveSynced {
                    task_id,
                    status,
                    order,
                });
                Ok(item)
            }
            Err(source) => {
                warn!(%task_id, %status, order, error = %source, "move sync failed, keeping local position");
                self.events.emit(BoardEvent::MoveSyncFailed {
                    task_id,
                    status,
                    order,
                    message: source.to_string(),
                });
                Err(SyncError::Move { task_id, source })
            }
        }
    }

    /// POST、サーバーの正規アイテムを返す
    pub async fn sync_create(
        &self,
        profile_id: ProfileId,
        task: &NewTask,
    ) -> Result<Item, SyncError> {
        debug!(%profile_id, title = %task.title, "creating task");
        match self.store.create_task(profile_id, task).await {
            Ok(item) => {
                if let Some(task_id) = item.id.task_id() {
                    info!(%profile_id, %task_id, title = %item.title, "task created");
                    self.events.emit(BoardEvent::TaskCreated {
                        task_id,
                        title: item.title.clone(),
                    });
                }
                Ok(item)
            }
            Err(source) => {
                warn!(%profile_id, title = %task.title, error = %source, "task creation failed");
                self.events.emit(BoardEvent::CreateFailed {
                    title: task.title.clone(),
                    message: source.to_string(),
                });
                Err(SyncError::Create {
                    title: task.title.clone(),
                    source,
                })
            }
        }
    }

    /// PATCH `{title, description}`
    pub async fn sync_edit(
        &self,
        task_id: TaskId,
        title: &str,
        description: &str,
    ) -> Result<Item, SyncError> {
        debug!(%task_id, "syncing edit");
        match self
            .store
            .patch_task(task_id, &TaskPatch::fields(title, description))
            .await
        {
            Ok(item) => {
                self.events.emit(BoardEvent::EditSynced { task_id });
                Ok(item)
            }
            Err(source) => {
                warn!(%task_id, error = %source, "edit sync failed");
                self.events.emit(BoardEvent::EditFailed {
                    task_id,
                    message: source.to_string(),
                });
                Err(SyncError::Edit { task_id, source })
            }
        }
    }

    pub async fn fetch_tasks(&self, profile_id: ProfileId) -> Result<Vec<Item>, StoreError> {
        self.store.list_tasks(profile_id).await
    }

    pub async fn fetch_records(
        &self,
        profile_id: ProfileId,
    ) -> Result<Vec<SourceRecord>, StoreError> {
        self.store.list_records(profile_id).await
    }
}
