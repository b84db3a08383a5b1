//! App - アプリケーション層
//!
//! このモジュールは、domain と ports を組み合わせてボード同期エンジンを実装します。
//!
//! # 主要コンポーネント
//! - **EngineBuilder**: エンジンの構築とワイヤリング
//! - **BoardEngine**: プロフィールに束縛されたボードの所有者
//! - **ReconciliationClient**: ローカル変更 → 最小限のリモート呼び出し
//! - **DragCoordinator**: ドラッグ操作 → 1 つの移動命令
//! - **DerivedItemSynchronizer**: 医療記録 → フォローアップタスクの冪等な生成
//! - **EditSession**: 1 アイテム分の編集ドラフト
//! - **BoardSummary**: 状態表示用の件数

pub mod builder;
pub mod derive;
pub mod drag;
pub mod edit;
pub mod engine;
pub mod reconcile;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::EngineBuilder;
pub use self::derive::{DerivedItemSynchronizer, ReconcileError, ReconcileOutcome, ReconcileReport};
pub use self::drag::{DragCoordinator, DragError, DragState, DropOutcome, DropTarget, MoveInstruction};
pub use self::edit::{EditDraft, EditError, EditSession, PendingEdit};
pub use self::engine::{AddedTask, BoardEngine, DropResult, EngineError};
pub use self::reconcile::{ReconciliationClient, SyncError, SyncHandle};
pub use self::status::BoardSummary;
