//! DerivedItemSynchronizer - 医療記録からフォローアップタスクを冪等に生成する
//!
//! # 保証
//! 1 回のパスで、正規化タイトルごとに生成されるタスクは高々 1 つ。
//! 連打されても `reconciling` フラグで 2 本目のパスは即座に返る。
//!
//! # 手順
//! 1. フラグを取得（取れなければ AlreadyRunning、ネットワーク呼び出しなし）
//! 2. リモートの正本一覧を取得し、正規化タイトルの集合を作る
//! 3. 集合にもローカルボードにも無い記録だけ作成し、成功したら即座に集合へ追加
//! 4. 作成したアイテムを todo の末尾にマージ
//! 5. どの経路でもフラグを解放（RAII ガード）

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::app::reconcile::ReconciliationClient;
use crate::domain::{
    normalize_title, Board, BoardEvent, ContainerKey, ErrorKind, Item, NewTask, ProfileId,
    SourceRecord,
};
use crate::ports::{EventSink, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// 正本一覧の取得失敗。パス全体を中断する（再実行で回復可能）
    #[error("could not fetch tasks for reconciliation: {0}")]
    Fetch(#[from] StoreError),
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::Fetch(err) => err.kind(),
        }
    }
}

/// 1 回のパスの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// 作成に成功したアイテム
    pub created: Vec<Item>,
    /// 作成に失敗した記録タイトル
    pub failed: Vec<String>,
    /// 既に対応するタスクがあった記録の数
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    AlreadyRunning,
    Completed(ReconcileReport),
}

/// drop でフラグを下ろす
struct ReconcileGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ReconcileGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct DerivedItemSynchronizer {
    client: ReconciliationClient,
    events: Arc<dyn EventSink>,
    reconciling: Arc<AtomicBool>,
}

impl DerivedItemSynchronizer {
    pub fn new(client: ReconciliationClient, events: Arc<dyn EventSink>) -> Self {
        Self {
            client,
            events,
            reconciling: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.reconciling.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<ReconcileGuard<'_>> {
        self.reconciling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ReconcileGuard {
                flag: &self.reconciling,
            })
    }

    /// 足りないフォローアップタスクを作成してボードにマージする
    pub async fn reconcile(
        &self,
        profile_id: ProfileId,
        records: &[SourceRecord],
        board: &Mutex<Board>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let Some(_guard) = self.try_acquire() else {
            debug!(%profile_id, "reconciliation already running, skipping");
            return Ok(ReconcileOutcome::AlreadyRunning);
        };

        let remote = self.client.fetch_tasks(profile_id).await?;
        let mut known: HashSet<String> = remote.iter().map(Item::normalized_title).collect();
        let local = board.lock().await.normalized_titles();

        let mut report = ReconcileReport::default();
        for record in records {
            let title = normalize_title(&record.title);
            if title.is_empty() {
                warn!(%profile_id, record_id = %record.id, "record has a blank title, skipping");
                report.skipped += 1;
                continue;
            }
            if known.contains(&title) || local.contains(&title) {
                report.skipped += 1;
                continue;
            }

            match self
                .client
                .sync_create(profile_id, &NewTask::follow_up(record))
                .await
            {
                Ok(item) => {
                    known.insert(title);
                    report.created.push(item);
                }
                Err(err) => {
                    warn!(%profile_id, record_id = %record.id, error = %err, "follow-up creation failed, continuing");
                    report.failed.push(record.title.clone());
                }
            }
        }

        {
            let mut board = board.lock().await;
            for item in &report.created {
                if board.contains(item.id) {
                    continue;
                }
                if let Err(err) = board.insert(item.clone(), ContainerKey::Todo, usize::MAX) {
                    warn!(item_id = %item.id, error = %err, "could not merge follow-up task");
                }
            }
        }

        info!(
            %profile_id,
            created = report.created.len(),
            failed = report.failed.len(),
            skipped = report.skipped,
            "reconciliation finished"
        );
        self.events.emit(BoardEvent::ReconcileCompleted {
            created: report.created.len(),
            failed: report.failed.len(),
        });
        Ok(ReconcileOutcome::Completed(report))
    }
}
