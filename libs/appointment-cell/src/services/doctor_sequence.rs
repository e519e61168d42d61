use crate::services::records::{RecordArena, SlotId};

type LinkId = usize;

#[derive(Debug, Clone)]
struct SequenceNode {
    slot: SlotId,
    prev: Option<LinkId>,
    next: Option<LinkId>,
}

/// Doubly linked list of record slots in booking order. Gives a doctor's
/// caseload a display order independent of appointment time.
#[derive(Debug, Default)]
pub struct DoctorSequence {
    nodes: Vec<Option<SequenceNode>>,
    free: Vec<LinkId>,
    head: Option<LinkId>,
    tail: Option<LinkId>,
    len: usize,
}

impl DoctorSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, slot: SlotId) {
        let node = SequenceNode { slot, prev: self.tail, next: None };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        match self.tail.and_then(|tail| self.nodes[tail].as_mut()) {
            Some(tail) => tail.next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    /// Unlinks the first node holding `slot`. Linear in the list length.
    pub fn remove(&mut self, slot: SlotId) -> bool {
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let Some(node) = self.nodes[id].as_ref() else { break };
            if node.slot != slot {
                cursor = node.next;
                continue;
            }

            let (prev, next) = (node.prev, node.next);
            match prev.and_then(|p| self.nodes[p].as_mut()) {
                Some(prev_node) => prev_node.next = next,
                None => self.head = next,
            }
            match next.and_then(|n| self.nodes[n].as_mut()) {
                Some(next_node) => next_node.prev = prev,
                None => self.tail = prev,
            }

            self.nodes[id] = None;
            self.free.push(id);
            self.len -= 1;
            return true;
        }
        false
    }

    /// Valid records of `doctor_id`, in booking order.
    pub fn list_by_doctor(&self, doctor_id: &str, records: &RecordArena) -> Vec<SlotId> {
        self.iter()
            .filter(|slot| {
                records
                    .get(*slot)
                    .is_some_and(|record| record.valid && record.doctor_id == doctor_id)
            })
            .collect()
    }

    pub fn iter(&self) -> SequenceIter<'_> {
        SequenceIter { sequence: self, cursor: self.head }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

pub struct SequenceIter<'a> {
    sequence: &'a DoctorSequence,
    cursor: Option<LinkId>,
}

impl Iterator for SequenceIter<'_> {
    type Item = SlotId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.sequence.nodes[self.cursor?].as_ref()?;
        self.cursor = node.next;
        Some(node.slot)
    }
}
