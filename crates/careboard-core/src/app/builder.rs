//! EngineBuilder - BoardEngine の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 差し替え可能な port（時計・仮 ID・イベント通知）にはデフォルトを用意

use std::sync::Arc;

use crate::app::engine::BoardEngine;
use crate::app::reconcile::ReconciliationClient;
use crate::domain::ProfileId;
use crate::ports::{Clock, EventSink, IdGenerator, NoopEventSink, SystemClock, TaskStore, UlidGenerator};

/// EngineBuilder は BoardEngine を構築
///
/// # 使用例
/// ```ignore
/// let mut engine = EngineBuilder::new(Arc::new(HttpTaskStore::from_config(&config)?))
///     .event_sink(sink.clone())
///     .build(profile_id);
/// engine.mount().await?;
/// ```
///
/// # デフォルト
/// - clock: SystemClock
/// - id_generator: 同じ時計を使う UlidGenerator
/// - event_sink: NoopEventSink
pub struct EngineBuilder {
    store: Arc<dyn TaskStore>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    events: Option<Arc<dyn EventSink>>,
}

impl EngineBuilder {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            clock: None,
            ids: None,
            events: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// プロフィールに束縛した BoardEngine を生成（まだ読み込みはしない）
    pub fn build(self, profile_id: ProfileId) -> BoardEngine {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));
        let events = self.events.unwrap_or_else(|| Arc::new(NoopEventSink));

        let client = ReconciliationClient::new(self.store, Arc::clone(&events));
        BoardEngine::new(profile_id, client, clock, ids, events)
    }
}
