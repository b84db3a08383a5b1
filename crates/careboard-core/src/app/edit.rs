//! EditSession - 1 アイテム分の編集ドラフト
//!
//! open でスナップショットから下書きを作り、commit で確定（検証つき）、cancel で破棄します。
//! 同時に開けるドラフトは 1 つだけです。

use crate::domain::{ErrorKind, Item, ItemId, TaskId, TempId};

/// 編集中の値（確定まで EditSession が所有する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub item_id: ItemId,
    pub title: String,
    pub description: String,
}

/// 検証を通った編集。engine が楽観的に適用し、sync_edit に渡す
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
    /// 失敗時に戻す編集前の状態
    pub snapshot: Item,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("an edit of {0} is already open")]
    AlreadyOpen(ItemId),

    #[error("no edit is open")]
    NotOpen,

    #[error("title must not be empty")]
    EmptyTitle,

    /// サーバー確定前のアイテムは編集を送れない
    #[error("{0} has not been saved yet")]
    NotPersisted(TempId),
}

impl EditError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditError::AlreadyOpen(_) => ErrorKind::Conflict,
            EditError::NotOpen | EditError::EmptyTitle | EditError::NotPersisted(_) => {
                ErrorKind::Validation
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EditSession {
    open: Option<(EditDraft, Item)>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, item: &Item) -> Result<&EditDraft, EditError> {
        if let Some((draft, _)) = &self.open {
            return Err(EditError::AlreadyOpen(draft.item_id));
        }
        let draft = EditDraft {
            item_id: item.id,
            title: item.title.clone(),
            description: item.description.clone(),
        };
        let (draft, _) = self.open.insert((draft, item.clone()));
        Ok(draft)
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.open.as_ref().map(|(draft, _)| draft)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), EditError> {
        let (draft, _) = self.open.as_mut().ok_or(EditError::NotOpen)?;
        draft.title = title.into();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), EditError> {
        let (draft, _) = self.open.as_mut().ok_or(EditError::NotOpen)?;
        draft.description = description.into();
        Ok(())
    }

    /// 検証して確定する。失敗してもドラフトは開いたまま
    pub fn commit(&mut self) -> Result<PendingEdit, EditError> {
        let (draft, _) = self.open.as_ref().ok_or(EditError::NotOpen)?;

        let title = draft.title.trim();
        if title.is_empty() {
            return Err(EditError::EmptyTitle);
        }
        let task_id = match draft.item_id {
            ItemId::Task(task_id) => task_id,
            ItemId::Temp(temp_id) => return Err(EditError::NotPersisted(temp_id)),
        };
        let title = title.to_string();

        let (draft, snapshot) = self.open.take().ok_or(EditError::NotOpen)?;
        Ok(PendingEdit {
            task_id,
            title,
            description: draft.description,
            snapshot,
        })
    }

    /// ドラフトを捨てる（副作用なし）
    pub fn cancel(&mut self) -> Option<EditDraft> {
        self.open.take().map(|(draft, _)| draft)
    }
}
