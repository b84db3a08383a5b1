//! Item (board task) and the wire shapes that create/patch it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ContainerKey, ItemId, ProfileId, RecordId, TempId};

/// A task on a profile's board.
///
/// Design:
/// - The remote store owns the canonical copy; the board holds a cache.
/// - `status` and `order` describe placement and are rewritten by the board on every move.
/// - `order` is the index within its container (dense, 0-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,

    #[serde(rename = "profile")]
    pub profile_id: ProfileId,

    pub title: String,

    #[serde(default)]
    pub description: String,

    pub status: ContainerKey,

    #[serde(default)]
    pub order: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// 楽観的作成用のプレースホルダー（サーバー確定前）
    pub fn placeholder(
        temp_id: TempId,
        profile_id: ProfileId,
        title: impl Into<String>,
        status: ContainerKey,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ItemId::Temp(temp_id),
            profile_id,
            title: title.into(),
            description: String::new(),
            status,
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }
}

/// Title identity used to match records to generated tasks.
///
/// Case-insensitive and whitespace-trimmed. There is no stronger link between a
/// record and its task.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// `POST /profiles/{id}/tasks` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: ContainerKey,
}

impl NewTask {
    pub fn new(title: impl Into<String>, status: ContainerKey) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status,
        }
    }

    /// 医療記録からフォローアップタスクを生成する
    pub fn follow_up(record: &SourceRecord) -> Self {
        Self {
            title: record.title.trim().to_string(),
            description: format!(
                "Follow up on medical record from {}",
                record.date.format("%Y-%m-%d")
            ),
            status: ContainerKey::Todo,
        }
    }
}

/// `PATCH /tasks/{id}` body: any subset of the mutable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContainerKey>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TaskPatch {
    /// ドラッグ結果の送信用（status + order のみ）
    pub fn placement(status: ContainerKey, order: u32) -> Self {
        Self {
            status: Some(status),
            order: Some(order),
            ..Self::default()
        }
    }

    /// 編集結果の送信用（title + description のみ）
    pub fn fields(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.order.is_none()
            && self.title.is_none()
            && self.description.is_none()
    }

    /// Apply this patch to an item (used by store doubles).
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(order) = self.order {
            item.order = order;
        }
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
    }
}

/// A medical record: read-only input for generated follow-up tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: RecordId,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

impl SourceRecord {
    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }
}
