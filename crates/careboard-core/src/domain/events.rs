//! Events - 呼び出し側に通知するボードイベント
//!
//! ログとは別に、UI が警告として表示できる型付きチャネルです。
//! EventSink port 経由で送信されます。

use super::{ContainerKey, TaskId};

/// BoardEvent は同期処理の結果通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    MoveSynced {
        task_id: TaskId,
        status: ContainerKey,
        order: u32,
    },
    /// 楽観的な移動は巻き戻さない（次回 refresh で整合）
    MoveSyncFailed {
        task_id: TaskId,
        status: ContainerKey,
        order: u32,
        message: String,
    },
    TaskCreated {
        task_id: TaskId,
        title: String,
    },
    /// プレースホルダーは次回 refresh まで残る
    CreateFailed {
        title: String,
        message: String,
    },
    EditSynced {
        task_id: TaskId,
    },
    EditFailed {
        task_id: TaskId,
        message: String,
    },
    /// 編集失敗でローカルの title/description を編集前に戻した
    EditReverted {
        task_id: TaskId,
    },
    ReconcileCompleted {
        created: usize,
        failed: usize,
    },
}

impl BoardEvent {
    /// UI に警告として出すべきイベントか
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            BoardEvent::MoveSyncFailed { .. }
                | BoardEvent::CreateFailed { .. }
                | BoardEvent::EditFailed { .. }
                | BoardEvent::EditReverted { .. }
        )
    }
}
