//! DragCoordinator - ドラッグ操作を 1 つの移動命令に変換する
//!
//! 入力・描画の技術には依存しません。受け取るのは ID（アイテム or 列）だけです。
//!
//! # 状態遷移
//! ```text
//! Idle ──start──▶ Dragging ──end(target)──▶ Idle
//!                    │
//!                    └──cancel / end(None)──▶ Idle
//! ```
//!
//! # ドロップ先の解決（優先順）
//! 1. 別のアイテムの上 → そのアイテムの列・現在の index
//! 2. 空の列の上 → その列の末尾
//! 3. それ以外 → キャンセル

use std::str::FromStr;

use tracing::{debug, warn};

use crate::domain::{Board, BoardError, ContainerKey, IdParseError, ItemId, Placement};

/// ポインタを離した位置にあったもの
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Item(ItemId),
    Container(ContainerKey),
}

impl DropTarget {
    /// 文字列 ID を解釈する（列のワイヤキーなら列、それ以外はアイテム ID）
    pub fn parse(raw: &str) -> Result<Self, IdParseError> {
        if let Ok(key) = ContainerKey::from_str(raw) {
            return Ok(DropTarget::Container(key));
        }
        raw.parse::<ItemId>().map(DropTarget::Item)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        item_id: ItemId,
        source: ContainerKey,
    },
}

/// 適用済みの移動（engine が ReconciliationClient に渡す）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveInstruction {
    pub item_id: ItemId,
    pub from: ContainerKey,
    pub to: ContainerKey,
    pub index: usize,
    /// リモートに送る order（= 移動後の index）
    pub order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// 有効なドロップ先なし。ボードは変更していない
    Cancelled,
    /// 自分自身、または現在位置へのドロップ。ボードは変更していない
    Unchanged,
    Moved(MoveInstruction),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    #[error("cannot drag {0}: not on the board")]
    UnknownItem(ItemId),

    #[error("no drag in progress")]
    NotDragging,

    #[error(transparent)]
    Board(#[from] BoardError),
}

#[derive(Debug, Default)]
pub struct DragCoordinator {
    state: DragState,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// ドラッグ開始。進行中のドラッグがあれば置き換える
    pub fn start(&mut self, board: &Board, item_id: ItemId) -> Result<(), DragError> {
        let placement = board
            .locate(item_id)
            .ok_or(DragError::UnknownItem(item_id))?;

        if let DragState::Dragging { item_id: previous, .. } = self.state {
            warn!(%previous, %item_id, "drag started while another was active, replacing it");
        }
        debug!(%item_id, source = %placement.container, "drag started");
        self.state = DragState::Dragging {
            item_id,
            source: placement.container,
        };
        Ok(())
    }

    /// ドラッグを破棄する。進行中だったかを返す
    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }

    /// ドラッグ終了。解決できたドロップ先へボード上で移動する
    pub fn end(
        &mut self,
        board: &mut Board,
        target: Option<DropTarget>,
    ) -> Result<DropOutcome, DragError> {
        let DragState::Dragging { item_id, .. } = std::mem::take(&mut self.state) else {
            return Err(DragError::NotDragging);
        };

        // 開始後に refresh 等で位置が変わっていることがあるので、現在位置を使う
        let Some(current) = board.locate(item_id) else {
            debug!(%item_id, "dragged item disappeared, cancelling");
            return Ok(DropOutcome::Cancelled);
        };

        let Some(destination) = resolve(board, item_id, target) else {
            debug!(%item_id, ?target, "no valid drop target");
            return Ok(DropOutcome::Cancelled);
        };

        if destination == current {
            return Ok(DropOutcome::Unchanged);
        }

        board.move_item(item_id, current.container, destination.container, destination.index)?;
        let landed = board
            .locate(item_id)
            .ok_or(DragError::Board(BoardError::ItemNotFound(item_id)))?;

        let instruction = MoveInstruction {
            item_id,
            from: current.container,
            to: landed.container,
            index: landed.index,
            order: board.order_of(landed.container, landed.index),
        };
        debug!(%item_id, from = %instruction.from, to = %instruction.to, index = instruction.index, "drop applied");
        Ok(DropOutcome::Moved(instruction))
    }
}

/// ドロップ先を (列, index) に解決する。自分自身へのドロップは現在位置
fn resolve(board: &Board, active: ItemId, target: Option<DropTarget>) -> Option<Placement> {
    match target? {
        DropTarget::Item(over) if over == active => board.locate(active),
        DropTarget::Item(over) => board.locate(over),
        DropTarget::Container(key) if board.container(key).is_empty() => Some(Placement {
            container: key,
            index: 0,
        }),
        DropTarget::Container(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::board::tests::{assert_invariants, item};
    use crate::domain::{ProfileId, TaskId, TempId};
    use rstest::rstest;
    use ulid::Ulid;

    fn id(value: u64) -> ItemId {
        ItemId::Task(TaskId::new(value))
    }

    fn titles(board: &Board, key: ContainerKey) -> Vec<&str> {
        board.container(key).iter().map(|i| i.title.as_str()).collect()
    }

    /// todo:[A,B,C], inprogress:[D], done:[]
    fn board() -> Board {
        Board::from_items(
            ProfileId::new(1),
            vec![
                item(1, "A", ContainerKey::Todo, 0),
                item(2, "B", ContainerKey::Todo, 1),
                item(3, "C", ContainerKey::Todo, 2),
                item(4, "D", ContainerKey::InProgress, 0),
            ],
        )
    }

    fn drop_on(board: &mut Board, active: u64, target: Option<DropTarget>) -> DropOutcome {
        let mut drag = DragCoordinator::new();
        drag.start(board, id(active)).unwrap();
        let outcome = drag.end(board, target).unwrap();
        assert!(!drag.is_dragging());
        outcome
    }

    #[test]
    fn move_to_empty_container_lands_at_end() {
        let mut board = Board::from_items(
            ProfileId::new(1),
            vec![item(1, "A", ContainerKey::Todo, 0), item(2, "B", ContainerKey::Todo, 1)],
        );

        let outcome = drop_on(
            &mut board,
            1,
            Some(DropTarget::Container(ContainerKey::InProgress)),
        );

        assert_eq!(
            outcome,
            DropOutcome::Moved(MoveInstruction {
                item_id: id(1),
                from: ContainerKey::Todo,
                to: ContainerKey::InProgress,
                index: 0,
                order: 0,
            })
        );
        assert_eq!(titles(&board, ContainerKey::Todo), vec!["B"]);
        assert_eq!(titles(&board, ContainerKey::InProgress), vec!["A"]);
        assert_invariants(&board);
    }

    #[rstest]
    #[case::over_later_sibling(1, 3, vec!["B", "C", "A"])]
    #[case::over_earlier_sibling(3, 1, vec!["C", "A", "B"])]
    #[case::over_middle(1, 2, vec!["B", "A", "C"])]
    fn reorder_within_container(
        #[case] active: u64,
        #[case] over: u64,
        #[case] expected: Vec<&str>,
    ) {
        let mut board = board();

        let outcome = drop_on(&mut board, active, Some(DropTarget::Item(id(over))));

        assert!(matches!(outcome, DropOutcome::Moved(_)));
        assert_eq!(titles(&board, ContainerKey::Todo), expected);
        assert_invariants(&board);
    }

    #[test]
    fn drop_over_item_in_other_container_takes_its_index() {
        let mut board = board();

        let outcome = drop_on(&mut board, 2, Some(DropTarget::Item(id(4))));

        let DropOutcome::Moved(instruction) = outcome else {
            panic!("expected a move, got {outcome:?}");
        };
        assert_eq!(instruction.to, ContainerKey::InProgress);
        assert_eq!(instruction.order, 0);
        assert_eq!(titles(&board, ContainerKey::InProgress), vec!["B", "D"]);
        assert_eq!(titles(&board, ContainerKey::Todo), vec!["A", "C"]);
    }

    #[rstest]
    #[case::nothing(None)]
    #[case::non_empty_container(Some(DropTarget::Container(ContainerKey::InProgress)))]
    #[case::unknown_item(Some(DropTarget::Item(ItemId::Task(TaskId::new(99)))))]
    fn unresolvable_targets_cancel(#[case] target: Option<DropTarget>) {
        let mut board = board();
        let before = board.clone();

        assert_eq!(drop_on(&mut board, 1, target), DropOutcome::Cancelled);
        assert_eq!(board, before);
    }

    #[test]
    fn dropping_onto_itself_is_a_no_op() {
        let mut board = board();
        let before = board.clone();

        let outcome = drop_on(&mut board, 2, Some(DropTarget::Item(id(2))));

        assert_eq!(outcome, DropOutcome::Unchanged);
        assert_eq!(board, before);
    }

    #[test]
    fn start_on_unknown_item_is_rejected() {
        let board = board();
        let mut drag = DragCoordinator::new();

        let err = drag.start(&board, id(42)).unwrap_err();

        assert_eq!(err, DragError::UnknownItem(id(42)));
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn end_without_start_is_an_error_and_cancel_resets() {
        let mut board = board();
        let mut drag = DragCoordinator::new();
        assert_eq!(drag.end(&mut board, None), Err(DragError::NotDragging));

        drag.start(&board, id(1)).unwrap();
        assert!(drag.cancel());
        assert!(!drag.cancel());
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn restart_replaces_active_gesture() {
        let mut board = board();
        let mut drag = DragCoordinator::new();
        drag.start(&board, id(1)).unwrap();
        drag.start(&board, id(4)).unwrap();

        assert_eq!(
            drag.state(),
            DragState::Dragging {
                item_id: id(4),
                source: ContainerKey::InProgress,
            }
        );
        let outcome = drag
            .end(&mut board, Some(DropTarget::Container(ContainerKey::Done)))
            .unwrap();
        assert!(matches!(outcome, DropOutcome::Moved(m) if m.item_id == id(4)));
    }

    #[test]
    fn end_uses_current_location_after_board_changed() {
        let mut board = board();
        let mut drag = DragCoordinator::new();
        drag.start(&board, id(1)).unwrap();

        // 別経路で A が done に移された
        board
            .move_item(id(1), ContainerKey::Todo, ContainerKey::Done, 0)
            .unwrap();

        let outcome = drag
            .end(&mut board, Some(DropTarget::Item(id(2))))
            .unwrap();
        let DropOutcome::Moved(instruction) = outcome else {
            panic!("expected a move, got {outcome:?}");
        };
        assert_eq!(instruction.from, ContainerKey::Done);
        assert_eq!(titles(&board, ContainerKey::Todo), vec!["A", "B", "C"]);
        assert_invariants(&board);
    }

    #[rstest]
    #[case::todo("todo", DropTarget::Container(ContainerKey::Todo))]
    #[case::done("done", DropTarget::Container(ContainerKey::Done))]
    #[case::numeric("7", DropTarget::Item(ItemId::Task(TaskId::new(7))))]
    #[case::prefixed("task-7", DropTarget::Item(ItemId::Task(TaskId::new(7))))]
    fn parses_raw_target_ids(#[case] raw: &str, #[case] expected: DropTarget) {
        assert_eq!(DropTarget::parse(raw).unwrap(), expected);
    }

    #[test]
    fn parses_temp_ids_and_rejects_garbage() {
        let temp = TempId::from_ulid(Ulid::new());
        assert_eq!(
            DropTarget::parse(&temp.to_string()).unwrap(),
            DropTarget::Item(ItemId::Temp(temp))
        );
        assert!(DropTarget::parse("backlog").is_err());
    }
}
