use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::SchedulingError;
use crate::services::records::{RecordArena, SlotId};

type NodeId = usize;

/// Tree key: appointment time, ties broken by insertion sequence so equal
/// times keep arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TimeKey {
    time: i64,
    seq: u64,
}

#[derive(Debug, Clone)]
struct TimeNode {
    key: TimeKey,
    slot: SlotId,
    height: i32,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// AVL tree over appointment times, stored in a node arena with child
/// indices. Supports ordered range scans and exact-time collision checks.
#[derive(Debug, Default)]
pub struct TimeIndex {
    nodes: Vec<TimeNode>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    keys: HashMap<SlotId, TimeKey>,
    next_seq: u64,
}

impl TimeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the record at `slot` under its current time. Fails with
    /// `TimeConflict` if a record for the same patient and doctor already
    /// sits at exactly that time.
    pub fn insert(&mut self, slot: SlotId, records: &RecordArena) -> Result<(), SchedulingError> {
        let appointment = records
            .get(slot)
            .ok_or_else(|| SchedulingError::NotFound(format!("record slot {}", slot.index())))?;

        let time = appointment.time;
        let (patient_id, doctor_id) = (&appointment.patient_id, &appointment.doctor_id);
        if self.has_collision(patient_id, doctor_id, time, Some(slot), records) {
            return Err(SchedulingError::TimeConflict { time });
        }

        if self.keys.contains_key(&slot) {
            self.remove(slot);
        }

        let key = TimeKey { time, seq: self.next_seq };
        self.next_seq += 1;
        self.root = Some(self.insert_at(self.root, key, slot));
        self.keys.insert(slot, key);
        Ok(())
    }

    /// True when a record for the same patient and doctor is indexed at
    /// exactly `time`. Tombstoned records still count while they are indexed.
    pub fn has_collision(
        &self,
        patient_id: &str,
        doctor_id: &str,
        time: i64,
        exclude: Option<SlotId>,
        records: &RecordArena,
    ) -> bool {
        let mut collides = false;
        self.visit_range(time, time, |other| {
            if Some(other) == exclude {
                return;
            }
            if let Some(existing) = records.get(other) {
                if existing.patient_id == patient_id && existing.doctor_id == doctor_id {
                    collides = true;
                }
            }
        });
        collides
    }

    /// Removes the entry for `slot`, returning whether it was present.
    pub fn remove(&mut self, slot: SlotId) -> bool {
        match self.keys.remove(&slot) {
            Some(key) => {
                self.root = self.remove_at(self.root, key);
                true
            }
            None => false,
        }
    }

    /// Valid records with `time` in `[start, end]`, ascending.
    pub fn range(&self, start: i64, end: i64, records: &RecordArena) -> Vec<SlotId> {
        let mut found = Vec::new();
        self.visit_range(start, end, |slot| {
            if records.is_valid(slot) {
                found.push(slot);
            }
        });
        found
    }

    pub fn contains(&self, slot: SlotId) -> bool {
        self.keys.contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn height(&self) -> i32 {
        self.height_of(self.root)
    }

    /// In-order walk restricted to `[start, end]`. Left subtrees are skipped
    /// once a node is already before `start`; the walk stops at the first
    /// node past `end`.
    fn visit_range(&self, start: i64, end: i64, mut visit: impl FnMut(SlotId)) {
        let mut stack = Vec::new();
        let mut current = self.root;

        loop {
            while let Some(id) = current {
                stack.push(id);
                let node = &self.nodes[id];
                current = if node.key.time >= start { node.left } else { None };
            }

            let Some(id) = stack.pop() else { break };
            let node = &self.nodes[id];
            if node.key.time > end {
                break;
            }
            if node.key.time >= start {
                visit(node.slot);
            }
            current = node.right;
        }
    }

    fn insert_at(&mut self, node: Option<NodeId>, key: TimeKey, slot: SlotId) -> NodeId {
        let Some(id) = node else {
            return self.alloc(key, slot);
        };

        if key < self.nodes[id].key {
            let left = self.insert_at(self.nodes[id].left, key, slot);
            self.nodes[id].left = Some(left);
        } else {
            let right = self.insert_at(self.nodes[id].right, key, slot);
            self.nodes[id].right = Some(right);
        }

        self.rebalance(id)
    }

    fn remove_at(&mut self, node: Option<NodeId>, key: TimeKey) -> Option<NodeId> {
        let id = node?;

        match key.cmp(&self.nodes[id].key) {
            Ordering::Less => {
                let left = self.remove_at(self.nodes[id].left, key);
                self.nodes[id].left = left;
            }
            Ordering::Greater => {
                let right = self.remove_at(self.nodes[id].right, key);
                self.nodes[id].right = right;
            }
            Ordering::Equal => match (self.nodes[id].left, self.nodes[id].right) {
                (None, child) | (child, None) => {
                    self.free.push(id);
                    return child;
                }
                (Some(_), Some(right)) => {
                    // Promote the in-order successor into this node.
                    let successor = self.min_node(right);
                    let (successor_key, successor_slot) =
                        (self.nodes[successor].key, self.nodes[successor].slot);
                    let right = self.remove_at(Some(right), successor_key);
                    let node = &mut self.nodes[id];
                    node.right = right;
                    node.key = successor_key;
                    node.slot = successor_slot;
                }
            },
        }

        Some(self.rebalance(id))
    }

    fn min_node(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    fn alloc(&mut self, key: TimeKey, slot: SlotId) -> NodeId {
        let node = TimeNode { key, slot, height: 1, left: None, right: None };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn height_of(&self, node: Option<NodeId>) -> i32 {
        node.map_or(0, |id| self.nodes[id].height)
    }

    fn balance_factor(&self, id: NodeId) -> i32 {
        self.height_of(self.nodes[id].left) - self.height_of(self.nodes[id].right)
    }

    fn update_height(&mut self, id: NodeId) {
        let height = 1 + self
            .height_of(self.nodes[id].left)
            .max(self.height_of(self.nodes[id].right));
        self.nodes[id].height = height;
    }

    /// Restores the AVL property at `id` and returns the subtree's new root.
    /// The case (LL, LR, RR, RL) follows from the balance factors of the
    /// node and of its heavier child.
    fn rebalance(&mut self, id: NodeId) -> NodeId {
        self.update_height(id);
        let balance = self.balance_factor(id);

        if balance > 1 {
            if let Some(left) = self.nodes[id].left {
                if self.balance_factor(left) < 0 {
                    let rotated = self.rotate_left(left);
                    self.nodes[id].left = Some(rotated);
                }
            }
            return self.rotate_right(id);
        }

        if balance < -1 {
            if let Some(right) = self.nodes[id].right {
                if self.balance_factor(right) > 0 {
                    let rotated = self.rotate_right(right);
                    self.nodes[id].right = Some(rotated);
                }
            }
            return self.rotate_left(id);
        }

        id
    }

    fn rotate_right(&mut self, y: NodeId) -> NodeId {
        let Some(x) = self.nodes[y].left else { return y };
        self.nodes[y].left = self.nodes[x].right;
        self.nodes[x].right = Some(y);
        self.update_height(y);
        self.update_height(x);
        x
    }

    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let Some(y) = self.nodes[x].right else { return x };
        self.nodes[x].right = self.nodes[y].left;
        self.nodes[y].left = Some(x);
        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Checks ordering, stored heights and balance. Returns the node count.
    #[cfg(test)]
    fn assert_invariants(&self) -> usize {
        fn walk(
            index: &TimeIndex,
            node: Option<NodeId>,
            low: Option<TimeKey>,
            high: Option<TimeKey>,
        ) -> (i32, usize) {
            let Some(id) = node else { return (0, 0) };
            let n = &index.nodes[id];
            if let Some(low) = low {
                assert!(n.key > low, "ordering violated");
            }
            if let Some(high) = high {
                assert!(n.key < high, "ordering violated");
            }
            let (lh, lc) = walk(index, n.left, low, Some(n.key));
            let (rh, rc) = walk(index, n.right, Some(n.key), high);
            assert!((lh - rh).abs() <= 1, "unbalanced node");
            assert_eq!(n.height, 1 + lh.max(rh), "stale height");
            (n.height, lc + rc + 1)
        }
        let (_, count) = walk(self, self.root, None, None);
        assert_eq!(count, self.keys.len());
        count
    }
}
