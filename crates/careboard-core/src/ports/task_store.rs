//! TaskStore port - リモートストア（REST リソースストア）の抽象化
//!
//! 正本（source of truth）はリモート側。ボードはそのキャッシュに過ぎません。
//!
//! # 対応する REST 面
//! - `GET /profiles/{id}/tasks`    → list_tasks
//! - `GET /profiles/{id}/records`  → list_records
//! - `POST /profiles/{id}/tasks`   → create_task
//! - `PATCH /tasks/{id}`           → patch_task

use async_trait::async_trait;

use crate::domain::{ErrorKind, Item, NewTask, ProfileId, SourceRecord, TaskId, TaskPatch};

/// StoreError はリモート呼び出しの失敗
///
/// イベントに載せるため Clone 可能（メッセージは文字列で保持）。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Transport(_) | StoreError::Decode(_) => ErrorKind::Transient,
            StoreError::Status { status, .. } if (400..500).contains(status) => {
                ErrorKind::Validation
            }
            StoreError::Status { .. } => ErrorKind::Transient,
            StoreError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// TaskStore はタスク・記録の取得と作成/部分更新を提供
///
/// # 設計原則
/// - 作成・更新はサーバーの正規レコードを返す
/// - 部分更新は送ったフィールドだけを変更する
/// - order の衝突解決はリモート側の責務
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_tasks(&self, profile_id: ProfileId) -> Result<Vec<Item>, StoreError>;

    async fn list_records(&self, profile_id: ProfileId) -> Result<Vec<SourceRecord>, StoreError>;

    async fn create_task(&self, profile_id: ProfileId, task: &NewTask) -> Result<Item, StoreError>;

    async fn patch_task(&self, task_id: TaskId, patch: &TaskPatch) -> Result<Item, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::transport(StoreError::Transport("reset".into()), ErrorKind::Transient)]
    #[case::server(StoreError::Status { status: 503, body: String::new() }, ErrorKind::Transient)]
    #[case::rejected(StoreError::Status { status: 400, body: "bad".into() }, ErrorKind::Validation)]
    #[case::missing(StoreError::NotFound("task-1".into()), ErrorKind::NotFound)]
    fn store_errors_are_classified(#[case] err: StoreError, #[case] kind: ErrorKind) {
        assert_eq!(err.kind(), kind);
    }
}
