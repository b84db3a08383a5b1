//! Container - ボードの列（ステータス）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ContainerKey はアイテムが属する列
///
/// # 固定の列集合
/// - todo: 未着手
/// - inprogress: 対応中
/// - done: 完了
///
/// ワイヤ上の `status` 文字列と一致します。
/// 表示順は宣言順（`Ord` もこの順）。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKey {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl ContainerKey {
    /// 全ての列（表示順）
    pub const ALL: [ContainerKey; 3] = [
        ContainerKey::Todo,
        ContainerKey::InProgress,
        ContainerKey::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerKey::Todo => "todo",
            ContainerKey::InProgress => "inprogress",
            ContainerKey::Done => "done",
        }
    }

    /// 列見出し
    pub fn label(self) -> &'static str {
        match self {
            ContainerKey::Todo => "To Do",
            ContainerKey::InProgress => "In Progress",
            ContainerKey::Done => "Done",
        }
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerKey {
    type Err = UnknownContainer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(ContainerKey::Todo),
            "inprogress" => Ok(ContainerKey::InProgress),
            "done" => Ok(ContainerKey::Done),
            other => Err(UnknownContainer(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown container: {0:?}")]
pub struct UnknownContainer(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::todo(ContainerKey::Todo, "\"todo\"")]
    #[case::inprogress(ContainerKey::InProgress, "\"inprogress\"")]
    #[case::done(ContainerKey::Done, "\"done\"")]
    fn wire_names_match_status_strings(#[case] key: ContainerKey, #[case] wire: &str) {
        assert_eq!(serde_json::to_string(&key).unwrap(), wire);
        assert_eq!(key.as_str().parse::<ContainerKey>().unwrap(), key);
    }

    #[test]
    fn unknown_container_is_rejected() {
        assert_eq!(
            "in_progress".parse::<ContainerKey>(),
            Err(UnknownContainer("in_progress".to_string()))
        );
    }

    #[test]
    fn display_order_follows_declaration() {
        let mut keys = vec![ContainerKey::Done, ContainerKey::Todo, ContainerKey::InProgress];
        keys.sort();
        assert_eq!(keys, ContainerKey::ALL.to_vec());
    }
}
