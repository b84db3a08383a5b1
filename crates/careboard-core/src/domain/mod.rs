//! Domain model (ids, containers, items, board, errors, events).
//!
//! ネットワークにも非同期ランタイムにも依存しない純粋な層です。
//! - ids: TaskId / ProfileId / RecordId / TempId / ItemId
//! - container: 固定の列集合（todo / inprogress / done）
//! - item: タスク本体とワイヤ形式（NewTask, TaskPatch, SourceRecord）
//! - board: 列ごとに順序付けられたアイテム集合（移動・挿入・削除）

pub mod board;
pub mod container;
pub mod errors;
pub mod events;
pub mod ids;
pub mod item;

pub use self::board::{Board, BoardError, Placement};
pub use self::container::{ContainerKey, UnknownContainer};
pub use self::errors::ErrorKind;
pub use self::events::BoardEvent;
pub use self::ids::{IdParseError, ItemId, ProfileId, RecordId, TaskId, TempId};
pub use self::item::{normalize_title, Item, NewTask, SourceRecord, TaskPatch};
