//! Status views - ボードの状態表示用

use serde::Serialize;

use crate::domain::{Board, ContainerKey};

/// 列ごとの件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub todo: usize,
    pub inprogress: usize,
    pub done: usize,
    /// サーバー確定前のプレースホルダー数
    pub pending: usize,
}

impl BoardSummary {
    pub fn total(&self) -> usize {
        self.todo + self.inprogress + self.done
    }

    pub fn count(&self, key: ContainerKey) -> usize {
        match key {
            ContainerKey::Todo => self.todo,
            ContainerKey::InProgress => self.inprogress,
            ContainerKey::Done => self.done,
        }
    }
}

impl From<&Board> for BoardSummary {
    fn from(board: &Board) -> Self {
        Self {
            todo: board.container(ContainerKey::Todo).len(),
            inprogress: board.container(ContainerKey::InProgress).len(),
            done: board.container(ContainerKey::Done).len(),
            pending: board.items().filter(|item| item.id.is_temp()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::board::tests::item;
    use crate::domain::{Item, ProfileId, TempId};
    use chrono::Utc;
    use ulid::Ulid;

    #[test]
    fn counts_each_container_and_placeholders() {
        let mut board = Board::from_items(
            ProfileId::new(1),
            vec![
                item(1, "A", ContainerKey::Todo, 0),
                item(2, "B", ContainerKey::Todo, 1),
                item(3, "C", ContainerKey::Done, 0),
            ],
        );
        let placeholder = Item::placeholder(
            TempId::from_ulid(Ulid::new()),
            ProfileId::new(1),
            "new",
            ContainerKey::InProgress,
            Utc::now(),
        );
        board
            .insert(placeholder, ContainerKey::InProgress, 0)
            .unwrap();

        let summary = BoardSummary::from(&board);

        assert_eq!(
            summary,
            BoardSummary {
                todo: 2,
                inprogress: 1,
                done: 1,
                pending: 1,
            }
        );
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.count(ContainerKey::Todo), 2);
    }
}
