//! Board: items partitioned into ordered containers.
//!
//! Design:
//! - Each container is a `Vec<Item>` in display order.
//! - `order` is rewritten to the array index after every mutation (dense ranking).
//! - Invariant: an item id appears in exactly one container, exactly once.
//!
//! All operations are synchronous and touch nothing outside the board.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::{ContainerKey, Item, ItemId, ProfileId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("item {0} is not on the board")]
    ItemNotFound(ItemId),

    #[error("item {item_id} is not in container {container}")]
    NotInContainer {
        item_id: ItemId,
        container: ContainerKey,
    },

    #[error("item {0} is already on the board")]
    DuplicateItem(ItemId),
}

/// Where an item currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub container: ContainerKey,
    pub index: usize,
}

/// A profile-scoped kanban board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    profile_id: ProfileId,
    containers: BTreeMap<ContainerKey, Vec<Item>>,
}

impl Board {
    /// Empty board with every container present.
    pub fn new(profile_id: ProfileId) -> Self {
        let containers = ContainerKey::ALL
            .iter()
            .map(|key| (*key, Vec::new()))
            .collect();
        Self {
            profile_id,
            containers,
        }
    }

    /// Build a board from a fetched task list.
    ///
    /// Items are partitioned by `status`, sorted by `order` (stable, so ties keep
    /// fetch order), then renumbered. A repeated id keeps its first occurrence.
    pub fn from_items(profile_id: ProfileId, items: impl IntoIterator<Item = Item>) -> Self {
        let mut board = Self::new(profile_id);
        let mut seen = HashSet::new();

        for item in items {
            if !seen.insert(item.id) {
                warn!(item_id = %item.id, "duplicate item in fetched task list, keeping first");
                continue;
            }
            board.column_mut(item.status).push(item);
        }

        for key in ContainerKey::ALL {
            board.column_mut(key).sort_by_key(|item| item.order);
            board.renumber(key);
        }
        board
    }

    pub fn profile_id(&self) -> ProfileId {
        self.profile_id
    }

    /// Items of one container in display order.
    pub fn container(&self, key: ContainerKey) -> &[Item] {
        self.containers.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All items, container by container.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.containers.values().flat_map(|items| items.iter())
    }

    pub fn len(&self) -> usize {
        self.containers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.locate(item_id).is_some()
    }

    pub fn locate(&self, item_id: ItemId) -> Option<Placement> {
        self.containers.iter().find_map(|(key, items)| {
            items
                .iter()
                .position(|item| item.id == item_id)
                .map(|index| Placement {
                    container: *key,
                    index,
                })
        })
    }

    pub fn get(&self, item_id: ItemId) -> Option<&Item> {
        self.locate(item_id)
            .map(|placement| &self.container(placement.container)[placement.index])
    }

    /// Move an item between (or within) containers.
    ///
    /// `target_index` is clamped to `[0, len]` of the destination after removal.
    /// Other items keep their relative order. Returns the resulting board.
    pub fn move_item(
        &mut self,
        item_id: ItemId,
        from: ContainerKey,
        to: ContainerKey,
        target_index: usize,
    ) -> Result<Board, BoardError> {
        let source = self.column_mut(from);
        let Some(index) = source.iter().position(|item| item.id == item_id) else {
            return Err(if self.contains(item_id) {
                BoardError::NotInContainer {
                    item_id,
                    container: from,
                }
            } else {
                BoardError::ItemNotFound(item_id)
            });
        };

        let mut item = source.remove(index);
        item.status = to;

        let destination = self.column_mut(to);
        let target_index = target_index.min(destination.len());
        destination.insert(target_index, item);

        self.renumber(from);
        if from != to {
            self.renumber(to);
        }
        Ok(self.clone())
    }

    /// Add a new item at `index` (clamped). Returns the index it landed on.
    pub fn insert(
        &mut self,
        mut item: Item,
        container: ContainerKey,
        index: usize,
    ) -> Result<usize, BoardError> {
        if self.contains(item.id) {
            return Err(BoardError::DuplicateItem(item.id));
        }
        item.status = container;

        let items = self.column_mut(container);
        let index = index.min(items.len());
        items.insert(index, item);
        self.renumber(container);
        Ok(index)
    }

    /// Remove an item from whichever container holds it.
    pub fn remove(&mut self, item_id: ItemId) -> Result<Item, BoardError> {
        let placement = self
            .locate(item_id)
            .ok_or(BoardError::ItemNotFound(item_id))?;
        let item = self
            .column_mut(placement.container)
            .remove(placement.index);
        self.renumber(placement.container);
        Ok(item)
    }

    /// The `order` to submit to the remote store for a position: the array index.
    ///
    /// Not unique across concurrent clients; the remote side resolves collisions.
    pub fn order_of(&self, _container: ContainerKey, index: usize) -> u32 {
        u32::try_from(index).unwrap_or(u32::MAX)
    }

    /// Swap a placeholder for its canonical item, keeping the placeholder's position.
    ///
    /// Returns the placement the canonical item now occupies.
    pub fn replace(&mut self, item_id: ItemId, mut canonical: Item) -> Result<Placement, BoardError> {
        if canonical.id != item_id && self.contains(canonical.id) {
            return Err(BoardError::DuplicateItem(canonical.id));
        }
        let placement = self
            .locate(item_id)
            .ok_or(BoardError::ItemNotFound(item_id))?;

        canonical.status = placement.container;
        canonical.order = self.order_of(placement.container, placement.index);
        self.column_mut(placement.container)[placement.index] = canonical;
        Ok(placement)
    }

    /// Overwrite the editable fields of one item.
    pub fn update_fields(
        &mut self,
        item_id: ItemId,
        title: &str,
        description: &str,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<(), BoardError> {
        let placement = self
            .locate(item_id)
            .ok_or(BoardError::ItemNotFound(item_id))?;
        let item = &mut self.column_mut(placement.container)[placement.index];
        item.title = title.to_string();
        item.description = description.to_string();
        if let Some(updated_at) = updated_at {
            item.updated_at = updated_at;
        }
        Ok(())
    }

    /// Normalized titles of every item on the board.
    pub fn normalized_titles(&self) -> HashSet<String> {
        self.items().map(Item::normalized_title).collect()
    }

    fn column_mut(&mut self, key: ContainerKey) -> &mut Vec<Item> {
        self.containers.entry(key).or_default()
    }

    fn renumber(&mut self, key: ContainerKey) {
        for (index, item) in self.column_mut(key).iter_mut().enumerate() {
            item.order = u32::try_from(index).unwrap_or(u32::MAX);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::TaskId;
    use chrono::TimeZone;
    use proptest::prelude::*;

    pub(crate) fn item(id: u64, title: &str, status: ContainerKey, order: u32) -> Item {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Item {
            id: ItemId::Task(TaskId::new(id)),
            profile_id: ProfileId::new(1),
            title: title.to_string(),
            description: String::new(),
            status,
            order,
            created_at: at,
            updated_at: at,
        }
    }

    fn id(value: u64) -> ItemId {
        ItemId::Task(TaskId::new(value))
    }

    fn titles(board: &Board, key: ContainerKey) -> Vec<&str> {
        board.container(key).iter().map(|i| i.title.as_str()).collect()
    }

    pub(crate) fn assert_invariants(board: &Board) {
        let mut seen = HashSet::new();
        for key in ContainerKey::ALL {
            for (index, item) in board.container(key).iter().enumerate() {
                assert!(seen.insert(item.id), "{} appears twice", item.id);
                assert_eq!(item.status, key);
                assert_eq!(item.order as usize, index);
            }
        }
    }

    fn sample() -> Board {
        Board::from_items(
            ProfileId::new(1),
            vec![
                item(1, "A", ContainerKey::Todo, 0),
                item(2, "B", ContainerKey::Todo, 1),
            ],
        )
    }

    #[test]
    fn from_items_partitions_sorts_and_renumbers() {
        let board = Board::from_items(
            ProfileId::new(1),
            vec![
                item(1, "late", ContainerKey::Todo, 9),
                item(2, "early", ContainerKey::Todo, 2),
                item(3, "tie-first", ContainerKey::Done, 4),
                item(4, "tie-second", ContainerKey::Done, 4),
                item(5, "doing", ContainerKey::InProgress, 0),
            ],
        );

        assert_eq!(titles(&board, ContainerKey::Todo), vec!["early", "late"]);
        assert_eq!(titles(&board, ContainerKey::Done), vec!["tie-first", "tie-second"]);
        assert_eq!(titles(&board, ContainerKey::InProgress), vec!["doing"]);
        assert_invariants(&board);
    }

    #[test]
    fn from_items_drops_repeated_ids() {
        let board = Board::from_items(
            ProfileId::new(1),
            vec![
                item(1, "first", ContainerKey::Todo, 0),
                item(1, "again", ContainerKey::Done, 0),
            ],
        );
        assert_eq!(board.len(), 1);
        assert_eq!(board.get(id(1)).unwrap().title, "first");
    }

    #[test]
    fn move_to_other_container_reassigns_status_and_order() {
        let mut board = sample();

        let snapshot = board
            .move_item(id(1), ContainerKey::Todo, ContainerKey::InProgress, 0)
            .unwrap();

        assert_eq!(snapshot, board);
        assert_eq!(titles(&board, ContainerKey::Todo), vec!["B"]);
        assert_eq!(titles(&board, ContainerKey::InProgress), vec!["A"]);
        assert!(board.container(ContainerKey::Done).is_empty());
        assert_eq!(board.get(id(1)).unwrap().status, ContainerKey::InProgress);
        assert_eq!(board.get(id(2)).unwrap().order, 0);
        assert_invariants(&board);
    }

    #[test]
    fn move_within_container_behaves_like_array_move() {
        let mut board = Board::from_items(
            ProfileId::new(1),
            (1..=4).map(|n| item(n, &n.to_string(), ContainerKey::Todo, n as u32)),
        );

        board
            .move_item(id(1), ContainerKey::Todo, ContainerKey::Todo, 2)
            .unwrap();
        assert_eq!(titles(&board, ContainerKey::Todo), vec!["2", "3", "1", "4"]);

        board
            .move_item(id(4), ContainerKey::Todo, ContainerKey::Todo, 0)
            .unwrap();
        assert_eq!(titles(&board, ContainerKey::Todo), vec!["4", "2", "3", "1"]);
        assert_invariants(&board);
    }

    #[test]
    fn move_clamps_target_index() {
        let mut board = sample();
        board
            .move_item(id(1), ContainerKey::Todo, ContainerKey::Done, 99)
            .unwrap();
        board
            .move_item(id(2), ContainerKey::Todo, ContainerKey::Done, 99)
            .unwrap();
        assert_eq!(titles(&board, ContainerKey::Done), vec!["A", "B"]);
        assert_invariants(&board);
    }

    #[test]
    fn move_from_wrong_container_is_rejected_without_mutation() {
        let mut board = sample();
        let before = board.clone();

        let err = board
            .move_item(id(1), ContainerKey::Done, ContainerKey::Todo, 0)
            .unwrap_err();
        assert_eq!(
            err,
            BoardError::NotInContainer {
                item_id: id(1),
                container: ContainerKey::Done
            }
        );

        let err = board
            .move_item(id(9), ContainerKey::Todo, ContainerKey::Done, 0)
            .unwrap_err();
        assert_eq!(err, BoardError::ItemNotFound(id(9)));
        assert_eq!(board, before);
    }

    #[test]
    fn round_trip_restores_relative_order() {
        let mut board = Board::from_items(
            ProfileId::new(1),
            (1..=5).map(|n| item(n, &n.to_string(), ContainerKey::Todo, n as u32)),
        );
        let before = titles(&board, ContainerKey::Todo)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        board
            .move_item(id(3), ContainerKey::Todo, ContainerKey::Done, 0)
            .unwrap();
        board
            .move_item(id(3), ContainerKey::Done, ContainerKey::Todo, 2)
            .unwrap();

        assert_eq!(titles(&board, ContainerKey::Todo), before);
        assert_invariants(&board);
    }

    #[test]
    fn insert_rejects_duplicates_and_clamps() {
        let mut board = sample();

        let landed = board
            .insert(item(3, "C", ContainerKey::Done, 7), ContainerKey::Todo, 50)
            .unwrap();
        assert_eq!(landed, 2);
        assert_eq!(board.get(id(3)).unwrap().status, ContainerKey::Todo);

        let err = board
            .insert(item(1, "A again", ContainerKey::Todo, 0), ContainerKey::Done, 0)
            .unwrap_err();
        assert_eq!(err, BoardError::DuplicateItem(id(1)));
        assert_invariants(&board);
    }

    #[test]
    fn remove_renumbers_remaining_items() {
        let mut board = sample();
        let removed = board.remove(id(1)).unwrap();
        assert_eq!(removed.title, "A");
        assert_eq!(board.get(id(2)).unwrap().order, 0);
        assert_eq!(board.remove(id(1)), Err(BoardError::ItemNotFound(id(1))));
    }

    #[test]
    fn replace_keeps_current_position() {
        let mut board = sample();
        board
            .move_item(id(2), ContainerKey::Todo, ContainerKey::Done, 0)
            .unwrap();

        let canonical = item(20, "B", ContainerKey::Todo, 5);
        let placement = board.replace(id(2), canonical).unwrap();

        assert_eq!(
            placement,
            Placement {
                container: ContainerKey::Done,
                index: 0
            }
        );
        assert!(!board.contains(id(2)));
        let replaced = board.get(id(20)).unwrap();
        assert_eq!(replaced.status, ContainerKey::Done);
        assert_eq!(replaced.order, 0);
        assert_invariants(&board);
    }

    #[test]
    fn update_fields_only_touches_text() {
        let mut board = sample();
        board.update_fields(id(2), "B2", "notes", None).unwrap();
        let updated = board.get(id(2)).unwrap();
        assert_eq!(updated.title, "B2");
        assert_eq!(updated.description, "notes");
        assert_eq!(updated.order, 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Move { pick: usize, to: usize, index: usize },
        Insert { to: usize, index: usize },
        Remove { pick: usize },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0..16usize, 0..3usize, 0..8usize)
                .prop_map(|(pick, to, index)| Op::Move { pick, to, index }),
            1 => (0..3usize, 0..8usize).prop_map(|(to, index)| Op::Insert { to, index }),
            1 => (0..16usize).prop_map(|pick| Op::Remove { pick }),
        ]
    }

    proptest! {
        #[test]
        fn any_operation_sequence_keeps_containers_consistent(
            ops in proptest::collection::vec(op_strategy(), 0..64)
        ) {
            let mut board = Board::from_items(
                ProfileId::new(1),
                (1..=6).map(|n| item(n, &n.to_string(), ContainerKey::ALL[(n % 3) as usize], 0)),
            );
            let mut next_id = 100;

            for op in ops {
                let ids: Vec<ItemId> = board.items().map(|i| i.id).collect();
                match op {
                    Op::Move { pick, to, index } => {
                        if ids.is_empty() {
                            continue;
                        }
                        let item_id = ids[pick % ids.len()];
                        let from = board.locate(item_id).unwrap().container;
                        let before_len = board.len();
                        board.move_item(item_id, from, ContainerKey::ALL[to], index).unwrap();
                        prop_assert_eq!(board.len(), before_len);
                    }
                    Op::Insert { to, index } => {
                        next_id += 1;
                        let new_item = item(next_id, "new", ContainerKey::Todo, 0);
                        board.insert(new_item, ContainerKey::ALL[to], index).unwrap();
                    }
                    Op::Remove { pick } => {
                        if ids.is_empty() {
                            continue;
                        }
                        board.remove(ids[pick % ids.len()]).unwrap();
                    }
                }

                let mut seen = HashSet::new();
                for key in ContainerKey::ALL {
                    let orders: Vec<u32> = board.container(key).iter().map(|i| i.order).collect();
                    prop_assert!(orders.windows(2).all(|w| w[0] < w[1]));
                    for (index, it) in board.container(key).iter().enumerate() {
                        prop_assert!(seen.insert(it.id));
                        prop_assert_eq!(it.order as usize, index);
                        prop_assert_eq!(it.status, key);
                    }
                }
            }
        }

        #[test]
        fn moving_away_and_back_preserves_others(
            len in 2usize..8,
            pick in 0usize..8,
            to in 1usize..3,
            parked_at in 0usize..8,
        ) {
            let mut board = Board::from_items(
                ProfileId::new(1),
                (0..len as u64).map(|n| item(n + 1, &n.to_string(), ContainerKey::Todo, n as u32)),
            );
            let original_index = pick % len;
            let moved = board.container(ContainerKey::Todo)[original_index].id;
            let others_before: Vec<ItemId> = board
                .container(ContainerKey::Todo)
                .iter()
                .map(|i| i.id)
                .filter(|i| *i != moved)
                .collect();

            board.move_item(moved, ContainerKey::Todo, ContainerKey::ALL[to], parked_at).unwrap();
            board.move_item(moved, ContainerKey::ALL[to], ContainerKey::Todo, original_index).unwrap();

            let after: Vec<ItemId> = board.container(ContainerKey::Todo).iter().map(|i| i.id).collect();
            prop_assert_eq!(after[original_index], moved);
            let others_after: Vec<ItemId> = after.into_iter().filter(|i| *i != moved).collect();
            prop_assert_eq!(others_before, others_after);
        }
    }
}
