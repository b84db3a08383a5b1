//! EventSink port - ボードイベントの通知先
//!
//! # 実装
//! - NoopEventSink: 何もしない（デフォルト）
//! - RecordingEventSink: 受け取ったイベントを保持（UI の警告表示やテストで使用）

use std::sync::Mutex;

use crate::domain::BoardEvent;

/// EventSink は同期結果を呼び出し側に届ける
///
/// 非同期の同期処理（spawn されたタスク）から呼ばれるので `Send + Sync`。
/// 実装はブロックしないこと。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BoardEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: BoardEvent) {}
}

/// 受け取ったイベントを順に溜める
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<BoardEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BoardEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn warnings(&self) -> Vec<BoardEvent> {
        self.events()
            .into_iter()
            .filter(BoardEvent::is_warning)
            .collect()
    }

    /// 溜まったイベントを取り出して空にする
    pub fn drain(&self) -> Vec<BoardEvent> {
        std::mem::take(
            &mut *self
                .events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: BoardEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskId;

    #[test]
    fn recording_sink_keeps_order_and_filters_warnings() {
        let sink = RecordingEventSink::new();
        sink.emit(BoardEvent::EditSynced {
            task_id: TaskId::new(1),
        });
        sink.emit(BoardEvent::EditFailed {
            task_id: TaskId::new(2),
            message: "timeout".to_string(),
        });

        assert_eq!(sink.events().len(), 2);
        assert_eq!(
            sink.warnings(),
            vec![BoardEvent::EditFailed {
                task_id: TaskId::new(2),
                message: "timeout".to_string(),
            }]
        );

        assert_eq!(sink.drain().len(), 2);
        assert!(sink.events().is_empty());
    }
}
