//! BoardEngine - 1 プロフィール分のボードを所有し、各コンポーネントをつなぐ
//!
//! # 制御の流れ
//! - mount / refresh: タスクと記録を並行取得 → ボードを丸ごと置き換え → 派生タスクの補完
//! - ドラッグ: DragCoordinator でボードを楽観的に更新 → sync_move を spawn
//! - 編集: EditSession で確定 → 楽観的に適用 → sync_edit を spawn（失敗時は巻き戻し）
//! - 追加: プレースホルダーを挿入 → sync_create を spawn → 正規アイテムで置き換え
//!
//! # ロック
//! ボードは `tokio::sync::Mutex` の下で同期コードだけが触ります（await を跨がない）。
//! ネットワーク応答の順序が前後しても、編集は項目ごとの連番で最新のものだけを反映します。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::app::derive::{DerivedItemSynchronizer, ReconcileError, ReconcileOutcome};
use crate::app::drag::{DragCoordinator, DragError, DragState, DropOutcome, DropTarget};
use crate::app::edit::{EditDraft, EditError, EditSession};
use crate::app::reconcile::{ReconciliationClient, SyncHandle};
use crate::app::status::BoardSummary;
use crate::domain::{
    Board, BoardError, BoardEvent, ContainerKey, ErrorKind, Item, ItemId, NewTask, ProfileId,
    SourceRecord, TempId,
};
use crate::ports::{Clock, EventSink, IdGenerator, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 一覧取得の失敗（再 mount で回復可能）
    #[error("could not load board: {0}")]
    Load(#[from] StoreError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Drag(#[from] DragError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Load(err) => err.kind(),
            EngineError::Reconcile(err) => err.kind(),
            EngineError::Board(BoardError::ItemNotFound(_)) => ErrorKind::NotFound,
            EngineError::Board(_) => ErrorKind::Conflict,
            EngineError::Drag(DragError::UnknownItem(_)) => ErrorKind::NotFound,
            EngineError::Drag(_) => ErrorKind::Validation,
            EngineError::Edit(err) => err.kind(),
        }
    }
}

/// ドロップの結果と、送信した場合はその同期ハンドル
#[derive(Debug)]
pub struct DropResult {
    pub outcome: DropOutcome,
    /// プレースホルダーの移動や無変更のときは None
    pub sync: Option<SyncHandle<Item>>,
}

/// 追加したプレースホルダーと作成処理のハンドル
#[derive(Debug)]
pub struct AddedTask {
    pub temp_id: TempId,
    pub sync: SyncHandle<Item>,
}

/// 項目ごとの最新の編集番号。番号はエンジン全体で単調増加し、再利用しない
#[derive(Debug, Default)]
struct EditSequences {
    next: u64,
    latest: HashMap<ItemId, u64>,
}

impl EditSequences {
    fn begin(&mut self, item_id: ItemId) -> u64 {
        self.next += 1;
        self.latest.insert(item_id, self.next);
        self.next
    }

    /// `seq` が最新なら記録を消して true
    fn finish(&mut self, item_id: ItemId, seq: u64) -> bool {
        if self.latest.get(&item_id) != Some(&seq) {
            return false;
        }
        self.latest.remove(&item_id);
        true
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.latest.len()
    }
}

type SharedEditSequences = Arc<std::sync::Mutex<EditSequences>>;

fn lock_sequences(sequences: &SharedEditSequences) -> std::sync::MutexGuard<'_, EditSequences> {
    sequences
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct BoardEngine {
    profile_id: ProfileId,
    board: Arc<Mutex<Board>>,
    records: Vec<SourceRecord>,
    edit_seq: SharedEditSequences,

    client: ReconciliationClient,
    synchronizer: DerivedItemSynchronizer,
    drag: DragCoordinator,
    edit: EditSession,

    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    events: Arc<dyn EventSink>,
}

impl BoardEngine {
    pub(crate) fn new(
        profile_id: ProfileId,
        client: ReconciliationClient,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            profile_id,
            board: Arc::new(Mutex::new(Board::new(profile_id))),
            records: Vec::new(),
            edit_seq: Arc::default(),
            synchronizer: DerivedItemSynchronizer::new(client.clone(), events.clone()),
            client,
            drag: DragCoordinator::new(),
            edit: EditSession::new(),
            clock,
            ids,
            events,
        }
    }

    pub fn profile_id(&self) -> ProfileId {
        self.profile_id
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    /// 現在のボードのコピー
    pub async fn snapshot(&self) -> Board {
        self.board.lock().await.clone()
    }

    pub async fn summary(&self) -> BoardSummary {
        BoardSummary::from(&*self.board.lock().await)
    }

    /// 初回表示: 読み込み + 派生タスクの補完
    #[instrument(skip(self), fields(profile_id = %self.profile_id))]
    pub async fn mount(&mut self) -> Result<ReconcileOutcome, EngineError> {
        let outcome = self.refresh().await?;
        let items = self.board.lock().await.len();
        info!(profile_id = %self.profile_id, items, "board mounted");
        Ok(outcome)
    }

    /// 再取得してボードを丸ごと置き換え、補完パスを走らせる
    #[instrument(skip(self), fields(profile_id = %self.profile_id))]
    pub async fn refresh(&mut self) -> Result<ReconcileOutcome, EngineError> {
        self.load().await?;
        self.reconcile_derived().await
    }

    async fn load(&mut self) -> Result<(), EngineError> {
        let profile_id = self.profile_id;
        let (items, records) = tokio::try_join!(
            self.client.fetch_tasks(profile_id),
            self.client.fetch_records(profile_id),
        )?;
        debug!(%profile_id, items = items.len(), records = records.len(), "fetched board data");

        *self.board.lock().await = Board::from_items(profile_id, items);
        self.records = records;
        Ok(())
    }

    /// 別プロフィールへ切り替える。進行中のドラッグ・編集は破棄
    #[instrument(skip(self), fields(from = %self.profile_id))]
    pub async fn switch_profile(
        &mut self,
        profile_id: ProfileId,
    ) -> Result<ReconcileOutcome, EngineError> {
        if self.drag.cancel() {
            debug!("discarded active drag on profile switch");
        }
        if let Some(draft) = self.edit.cancel() {
            debug!(item_id = %draft.item_id, "discarded open edit on profile switch");
        }
        // 旧プロフィールの編集応答は反映しない
        lock_sequences(&self.edit_seq).latest.clear();

        self.profile_id = profile_id;
        self.records.clear();
        *self.board.lock().await = Board::new(profile_id);
        self.refresh().await
    }

    /// 記録から足りないフォローアップタスクを作る（同時に呼ばれても安全）
    pub async fn reconcile_derived(&self) -> Result<ReconcileOutcome, EngineError> {
        let outcome = self
            .synchronizer
            .reconcile(self.profile_id, &self.records, &self.board)
            .await?;
        Ok(outcome)
    }

    // ========================================
    // ドラッグ
    // ========================================

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub async fn begin_drag(&mut self, item_id: ItemId) -> Result<(), EngineError> {
        let board = self.board.lock().await;
        self.drag.start(&board, item_id)?;
        Ok(())
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.drag.cancel()
    }

    /// ドロップを適用し、確定済みアイテムなら sync_move を spawn する
    #[instrument(skip(self))]
    pub async fn end_drag(&mut self, target: Option<DropTarget>) -> Result<DropResult, EngineError> {
        let outcome = {
            let mut board = self.board.lock().await;
            self.drag.end(&mut board, target)?
        };

        let DropOutcome::Moved(instruction) = outcome else {
            return Ok(DropResult {
                outcome,
                sync: None,
            });
        };

        let Some(task_id) = instruction.item_id.task_id() else {
            // 作成完了時に現在位置を送る
            debug!(item_id = %instruction.item_id, "placeholder moved, sync deferred until created");
            return Ok(DropResult {
                outcome,
                sync: None,
            });
        };

        let client = self.client.clone();
        let sync = tokio::spawn(async move {
            client
                .sync_move(task_id, instruction.to, instruction.order)
                .await
        });
        Ok(DropResult {
            outcome,
            sync: Some(sync),
        })
    }

    // ========================================
    // 追加
    // ========================================

    /// 列の末尾にプレースホルダーを置き、作成を spawn する
    #[instrument(skip(self))]
    pub async fn add_task(
        &self,
        container: ContainerKey,
        title: &str,
    ) -> Result<AddedTask, EngineError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EditError::EmptyTitle.into());
        }

        let temp_id = self.ids.generate_temp_id();
        let placeholder = Item::placeholder(
            temp_id,
            self.profile_id,
            title,
            container,
            self.clock.now(),
        );
        self.board
            .lock()
            .await
            .insert(placeholder, container, usize::MAX)?;
        debug!(%temp_id, %container, "placeholder inserted");

        let task = NewTask::new(title, container);
        let profile_id = self.profile_id;
        let client = self.client.clone();
        let board = Arc::clone(&self.board);
        let sync = tokio::spawn(async move {
            // 失敗時はプレースホルダーを残す（次回 refresh で消える）
            let created = client.sync_create(profile_id, &task).await?;
            let Some(task_id) = created.id.task_id() else {
                return Ok(created);
            };

            let placed = {
                let mut board = board.lock().await;
                if board.contains(created.id) {
                    // refresh 等で既に取り込まれている
                    let _ = board.remove(ItemId::Temp(temp_id));
                    None
                } else {
                    match board.replace(ItemId::Temp(temp_id), created.clone()) {
                        Ok(placement) => Some((
                            placement.container,
                            board.order_of(placement.container, placement.index),
                        )),
                        Err(err) => {
                            debug!(%temp_id, %task_id, error = %err, "placeholder gone, skipping replace");
                            None
                        }
                    }
                }
            };

            match placed {
                Some((status, order)) if status != created.status || order != created.order => {
                    debug!(%task_id, %status, order, "placeholder moved before confirmation, pushing position");
                    let mut moved = created.clone();
                    moved.status = status;
                    moved.order = order;
                    // 失敗は MoveSyncFailed として通知済み。作成自体は成功扱い
                    let _ = client.sync_move(task_id, status, order).await;
                    Ok(moved)
                }
                _ => Ok(created),
            }
        });

        Ok(AddedTask { temp_id, sync })
    }

    // ========================================
    // 編集
    // ========================================

    pub async fn open_edit(&mut self, item_id: ItemId) -> Result<EditDraft, EngineError> {
        let item = self
            .board
            .lock()
            .await
            .get(item_id)
            .cloned()
            .ok_or(BoardError::ItemNotFound(item_id))?;
        Ok(self.edit.open(&item)?.clone())
    }

    pub fn edit_mut(&mut self) -> &mut EditSession {
        &mut self.edit
    }

    pub fn cancel_edit(&mut self) -> Option<EditDraft> {
        self.edit.cancel()
    }

    /// 確定して楽観的に適用し、sync_edit を spawn する
    ///
    /// 応答は、その間に同じアイテムの新しい編集が始まっていなければ反映する
    /// （成功ならサーバーの値、失敗なら編集前のスナップショット）。
    #[instrument(skip(self))]
    pub async fn commit_edit(&mut self) -> Result<SyncHandle<Item>, EngineError> {
        let item_id = self.edit.draft().ok_or(EditError::NotOpen)?.item_id;
        if !self.board.lock().await.contains(item_id) {
            self.edit.cancel();
            return Err(BoardError::ItemNotFound(item_id).into());
        }

        let pending = self.edit.commit()?;
        let seq = {
            // 番号の発行と楽観的適用はボードのロック下でまとめて行う
            let mut board = self.board.lock().await;
            board.update_fields(item_id, &pending.title, &pending.description, None)?;
            lock_sequences(&self.edit_seq).begin(item_id)
        };

        let client = self.client.clone();
        let board = Arc::clone(&self.board);
        let edit_seq = Arc::clone(&self.edit_seq);
        let events = Arc::clone(&self.events);
        let sync = tokio::spawn(async move {
            let result = client
                .sync_edit(pending.task_id, &pending.title, &pending.description)
                .await;

            let mut board = board.lock().await;
            if !lock_sequences(&edit_seq).finish(item_id, seq) {
                debug!(%item_id, seq, "newer edit in flight, ignoring response");
                return result;
            }

            let applied = match &result {
                Ok(item) => board.update_fields(
                    item_id,
                    &item.title,
                    &item.description,
                    Some(item.updated_at),
                ),
                Err(_) => {
                    let snapshot = &pending.snapshot;
                    let reverted = board.update_fields(
                        item_id,
                        &snapshot.title,
                        &snapshot.description,
                        Some(snapshot.updated_at),
                    );
                    if reverted.is_ok() {
                        warn!(%item_id, "edit reverted to previous values");
                        events.emit(BoardEvent::EditReverted {
                            task_id: pending.task_id,
                        });
                    }
                    reverted
                }
            };
            if let Err(err) = applied {
                debug!(%item_id, error = %err, "edited item no longer on board");
            }
            result
        });
        Ok(sync)
    }
}
