//! Domain identifiers (strongly-typed IDs).
//!
//! # サーバー採番 ID + クライアント仮 ID
//! タスク・プロフィール・記録の ID はリモートストアが採番する整数です。
//! `Id<T>` は Phantom type パターンでそれらを区別します（TaskId と ProfileId は混同できない）。
//!
//! 楽観的に作成したタスクはサーバー確定前に ID を持たないため、
//! ULID ベースの [`TempId`] を仮 ID として使い、確定後に正規の [`TaskId`] へ置き換えます。
//! ボード上の識別子はこの 2 つを束ねた [`ItemId`] です。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"task-", "profile-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "task-"）
    fn prefix() -> &'static str;
}

/// サーバー採番のジェネリック ID 型
///
/// ワイヤ上は素の整数としてシリアライズされます。
///
/// # 例
/// ```ignore
/// let task_id = TaskId::new(42);
/// let profile_id = ProfileId::new(42);
/// // 値が同じでも異なる型なので、混同できない
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: u64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub const fn new(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// REST パスに埋め込む生の値
    pub const fn value(&self) -> u64 {
        self.value
    }
}

impl<T: IdMarker> From<u64> for Id<T> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = IdParseError;

    /// "42" と "task-42" の両方を受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(T::prefix()).unwrap_or(s);
        raw.parse::<u64>()
            .map(Self::new)
            .map_err(|_| IdParseError(s.to_string()))
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Profile のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Profile {}

impl IdMarker for Profile {
    fn prefix() -> &'static str {
        "profile-"
    }
}

/// Record のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Record {}

impl IdMarker for Record {
    fn prefix() -> &'static str {
        "record-"
    }
}

/// Identifier of a persisted task (assigned by the remote store).
pub type TaskId = Id<Task>;

/// Identifier of a family member profile (one board per profile).
pub type ProfileId = Id<Profile>;

/// Identifier of a medical record (read-only input).
pub type RecordId = Id<Record>;

// ========================================
// 仮 ID
// ========================================

/// 楽観的作成用の仮 ID（ULID）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(Ulid);

impl TempId {
    const PREFIX: &'static str = "temp-";

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for TempId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(Self::PREFIX).unwrap_or(s);
        Ulid::from_string(raw)
            .map(Self)
            .map_err(|_| IdParseError(s.to_string()))
    }
}

/// ボード上のアイテム識別子
///
/// サーバー確定済みなら `Task`、楽観的プレースホルダーなら `Temp`。
/// ワイヤ上は整数（Task）または ULID 文字列（Temp）になります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Task(TaskId),
    Temp(TempId),
}

impl ItemId {
    /// サーバー確定済みの ID（プレースホルダーなら None）
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            ItemId::Task(id) => Some(*id),
            ItemId::Temp(_) => None,
        }
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, ItemId::Temp(_))
    }
}

impl From<TaskId> for ItemId {
    fn from(id: TaskId) -> Self {
        ItemId::Task(id)
    }
}

impl From<TempId> for ItemId {
    fn from(id: TempId) -> Self {
        ItemId::Temp(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Task(id) => id.fmt(f),
            ItemId::Temp(id) => id.fmt(f),
        }
    }
}

impl FromStr for ItemId {
    type Err = IdParseError;

    /// 入力層から渡される文字列 ID を解釈する（"42" / "task-42" / "temp-<ulid>"）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with(TempId::PREFIX) {
            return s.parse::<TempId>().map(ItemId::Temp);
        }
        s.parse::<TaskId>().map(ItemId::Task)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier: {0:?}")]
pub struct IdParseError(pub String);
