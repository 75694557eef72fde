// stations.rs - Reservation stations and the load/store buffer
//
// Both station kinds are fixed slot arrays. A slot waits for its operand
// tags to clear, counts down its execution latency, and is freed by the
// write-result stage (or by misprediction recovery).

use serde::Serialize;

use super::instruction::Opcode;

/// An arithmetic/branch reservation station slot.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationStation {
    pub id: usize,
    pub busy: bool,
    pub op: Option<Opcode>,
    /// Value of the first source operand, once known.
    pub vj: Option<i64>,
    /// Value of the second source operand, once known.
    pub vk: Option<i64>,
    /// ROB entry that will produce the first operand.
    pub qj: Option<usize>,
    /// ROB entry that will produce the second operand.
    pub qk: Option<usize>,
    pub rob_id: Option<usize>,
    pub pc: Option<i64>,
    pub cycles_left: usize,
}

impl ReservationStation {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            busy: false,
            op: None,
            vj: None,
            vk: None,
            qj: None,
            qk: None,
            rob_id: None,
            pc: None,
            cycles_left: 0,
        }
    }

    pub fn clear(&mut self) {
        let id = self.id;
        *self = Self::new(id);
    }

    pub fn operands_ready(&self) -> bool {
        self.qj.is_none() && self.qk.is_none()
    }

    /// Eligible for write-back: execution drained and nothing outstanding.
    pub fn is_complete(&self) -> bool {
        self.busy && self.cycles_left == 0 && self.operands_ready()
    }
}

/// A load/store buffer slot. The effective address is resolved at issue;
/// only a store's data operand can still be renamed (Qt).
#[derive(Debug, Clone, Serialize)]
pub struct LoadStoreSlot {
    pub id: usize,
    pub busy: bool,
    pub op: Option<Opcode>,
    pub address: Option<i64>,
    /// Value to store (SW), once known.
    pub vt: Option<i64>,
    /// ROB entry that will produce the store value.
    pub qt: Option<usize>,
    pub rob_id: Option<usize>,
    pub pc: Option<i64>,
    pub cycles_left: usize,
}

impl LoadStoreSlot {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            busy: false,
            op: None,
            address: None,
            vt: None,
            qt: None,
            rob_id: None,
            pc: None,
            cycles_left: 0,
        }
    }

    pub fn clear(&mut self) {
        let id = self.id;
        *self = Self::new(id);
    }

    pub fn operands_ready(&self) -> bool {
        self.qt.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.busy && self.cycles_left == 0 && self.operands_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_is_not_complete_while_a_tag_is_outstanding() {
        let mut station = ReservationStation::new(0);
        station.busy = true;
        station.op = Some(Opcode::Add);
        station.qj = Some(3);
        station.cycles_left = 0;
        assert!(!station.is_complete());

        station.qj = None;
        station.vj = Some(5);
        assert!(station.is_complete());
    }

    #[test]
    fn clear_preserves_the_slot_id() {
        let mut slot = LoadStoreSlot::new(7);
        slot.busy = true;
        slot.address = Some(0x100);
        slot.clear();
        assert_eq!(slot.id, 7);
        assert!(!slot.busy);
        assert_eq!(slot.address, None);
    }
}
