// rob.rs - Reorder buffer for in-order retirement
//
// The ROB is a fixed slot array rather than a ring: free-slot reuse is
// decoupled from commit order, and a monotonic enqueue sequence assigned at
// allocation defines the retirement order instead of a head/tail pair.

use serde::Serialize;

use super::instruction::Opcode;

/// What a ROB entry retires into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RobEntryKind {
    /// Writes a register at commit (arithmetic and LW).
    Register,
    /// Writes memory at commit (SW).
    Store,
    /// No architectural write; recovery happened at resolution (BEQ).
    Branch,
}

/// A pending result. Stores carry both the address and the data; the scalar
/// part is what dependents receive over the CDB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RobValue {
    Int(i64),
    Store { address: i64, data: i64 },
}

impl RobValue {
    pub fn scalar(&self) -> i64 {
        match self {
            RobValue::Int(value) => *value,
            RobValue::Store { data, .. } => *data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RobEntry {
    pub id: usize,
    pub busy: bool,
    pub pc: Option<i64>,
    pub op: Option<Opcode>,
    pub dest: Option<usize>,
    pub value: Option<RobValue>,
    pub ready: bool,
    pub committed: bool,
    pub speculative: bool,
    pub kind: Option<RobEntryKind>,
    pub branch_taken: Option<bool>,
    pub checkpoint_id: Option<usize>,
    pub enqueue_seq: Option<u64>,
}

impl RobEntry {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            busy: false,
            pc: None,
            op: None,
            dest: None,
            value: None,
            ready: false,
            committed: false,
            speculative: false,
            kind: None,
            branch_taken: None,
            checkpoint_id: None,
            enqueue_seq: None,
        }
    }

    /// Free the slot, discarding everything it held.
    pub fn clear(&mut self) {
        let id = self.id;
        *self = Self::new(id);
    }

    /// Free the slot after retirement. The committed flag survives until the
    /// slot is reused so views can show it.
    pub fn retire(&mut self) {
        self.clear();
        self.committed = true;
    }
}

#[derive(Debug, Clone)]
pub struct ReorderBuffer {
    entries: Vec<RobEntry>,
    next_seq: u64,
}

impl ReorderBuffer {
    pub fn new(size: usize) -> Self {
        Self {
            entries: (0..size).map(RobEntry::new).collect(),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, id: usize) -> &RobEntry {
        &self.entries[id]
    }

    pub fn entry_mut(&mut self, id: usize) -> &mut RobEntry {
        &mut self.entries[id]
    }

    pub fn entries(&self) -> &[RobEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [RobEntry] {
        &mut self.entries
    }

    /// Linear scan by ascending slot index, like every other free-slot search.
    pub fn find_free(&self) -> Option<usize> {
        self.entries.iter().position(|entry| !entry.busy)
    }

    pub fn occupancy(&self) -> usize {
        self.entries.iter().filter(|entry| entry.busy).count()
    }

    pub fn no_busy_entries(&self) -> bool {
        self.entries.iter().all(|entry| !entry.busy)
    }

    /// The sequence number the next allocation will receive.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Claim a slot and stamp it with the next enqueue sequence. The caller
    /// fills in the remaining fields.
    pub fn allocate(&mut self, id: usize, pc: i64, op: Opcode, kind: RobEntryKind) -> &mut RobEntry {
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = &mut self.entries[id];
        entry.busy = true;
        entry.pc = Some(pc);
        entry.op = Some(op);
        entry.dest = None;
        entry.value = None;
        entry.ready = false;
        entry.committed = false;
        entry.speculative = false;
        entry.kind = Some(kind);
        entry.branch_taken = None;
        entry.checkpoint_id = None;
        entry.enqueue_seq = Some(seq);
        entry
    }

    /// Busy slot ids sorted by ascending enqueue sequence; the prefix of this
    /// list is what commit considers each cycle.
    pub fn commit_order(&self) -> Vec<usize> {
        let mut busy: Vec<&RobEntry> = self.entries.iter().filter(|entry| entry.busy).collect();
        busy.sort_by_key(|entry| entry.enqueue_seq.unwrap_or(0));
        busy.iter().map(|entry| entry.id).collect()
    }

    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.clear();
            entry.committed = false;
        }
        self.next_seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_order_follows_enqueue_sequence_not_slot_index() {
        let mut rob = ReorderBuffer::new(4);
        // Allocate out of slot order.
        rob.allocate(2, 0, Opcode::Add, RobEntryKind::Register);
        rob.allocate(0, 4, Opcode::Sub, RobEntryKind::Register);
        rob.allocate(3, 8, Opcode::Mul, RobEntryKind::Register);
        assert_eq!(rob.commit_order(), vec![2, 0, 3]);
    }

    #[test]
    fn freed_slots_are_found_again() {
        let mut rob = ReorderBuffer::new(2);
        rob.allocate(0, 0, Opcode::Add, RobEntryKind::Register);
        rob.allocate(1, 4, Opcode::Add, RobEntryKind::Register);
        assert_eq!(rob.find_free(), None);

        rob.entry_mut(0).retire();
        assert_eq!(rob.find_free(), Some(0));
        assert!(rob.entry(0).committed);
    }

    #[test]
    fn store_value_broadcasts_its_data_portion() {
        let value = RobValue::Store {
            address: 100,
            data: 42,
        };
        assert_eq!(value.scalar(), 42);
    }
}
