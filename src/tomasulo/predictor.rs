// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// predictor.rs
//
// This file contains the one-bit branch predictor and the checkpoint store
// used for speculation recovery. The predictor remembers the last observed
// outcome per branch PC; a PC it has never seen predicts not-taken. A
// checkpoint is a full RAT snapshot taken when a branch is dispatched.

use std::collections::HashMap;

/// One-bit predictor: last outcome per branch PC, not-taken by default.
#[derive(Debug, Clone, Default)]
pub struct OneBitPredictor {
    outcomes: HashMap<i64, bool>,
    predictions: usize,
    correct_predictions: usize,
}

impl OneBitPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current prediction for a branch PC, without counting it.
    pub fn lookup(&self, pc: i64) -> bool {
        self.outcomes.get(&pc).copied().unwrap_or(false)
    }

    /// Prediction consumed at dispatch; counted toward accuracy statistics.
    pub fn predict(&mut self, pc: i64) -> bool {
        self.predictions += 1;
        self.lookup(pc)
    }

    /// Record the actual outcome, scoring the prediction that was in effect.
    pub fn update(&mut self, pc: i64, taken: bool) {
        if self.lookup(pc) == taken {
            self.correct_predictions += 1;
        }
        self.outcomes.insert(pc, taken);
    }

    pub fn accuracy(&self) -> f32 {
        if self.predictions == 0 {
            return 0.0;
        }
        self.correct_predictions as f32 / self.predictions as f32
    }

    pub fn reset(&mut self) {
        self.outcomes.clear();
        self.predictions = 0;
        self.correct_predictions = 0;
    }
}

/// A RAT snapshot taken at branch dispatch, plus the enqueue-sequence
/// watermark at that point: every entry allocated under this checkpoint has
/// a sequence at or above the watermark.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub id: usize,
    pub rat: Vec<Option<usize>>,
    pub enqueue_mark: u64,
}

/// Owns the live checkpoints and the single active speculation window.
/// Dispatching a second branch overwrites the active slot.
#[derive(Debug, Clone, Default)]
pub struct CheckpointStore {
    checkpoints: HashMap<usize, Checkpoint>,
    next_id: usize,
    active: Option<usize>,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self {
            checkpoints: HashMap::new(),
            next_id: 1,
            active: None,
        }
    }

    /// Snapshot the RAT and make the new checkpoint the active window.
    pub fn take(&mut self, rat: Vec<Option<usize>>, enqueue_mark: u64) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.checkpoints.insert(
            id,
            Checkpoint {
                id,
                rat,
                enqueue_mark,
            },
        );
        self.active = Some(id);
        id
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn get(&self, id: usize) -> Option<&Checkpoint> {
        self.checkpoints.get(&id)
    }

    /// Drop a resolved checkpoint. The active slot is cleared only if it
    /// still names this checkpoint.
    pub fn discard(&mut self, id: usize) {
        self.checkpoints.remove(&id);
        if self.active == Some(id) {
            self.active = None;
        }
    }

    pub fn reset(&mut self) {
        self.checkpoints.clear();
        self.next_id = 1;
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_branches_predict_not_taken() {
        let mut predictor = OneBitPredictor::new();
        assert!(!predictor.predict(0x40));
    }

    #[test]
    fn predictor_remembers_the_last_outcome() {
        let mut predictor = OneBitPredictor::new();
        predictor.update(0x40, true);
        assert!(predictor.lookup(0x40));
        predictor.update(0x40, false);
        assert!(!predictor.lookup(0x40));
    }

    #[test]
    fn accuracy_scores_predictions_against_later_outcomes() {
        let mut predictor = OneBitPredictor::new();
        assert!(!predictor.predict(0x10)); // predicted not-taken
        predictor.update(0x10, true); // was taken: miss
        assert!(predictor.predict(0x10)); // now predicted taken
        predictor.update(0x10, true); // was taken: hit
        assert!((predictor.accuracy() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn discarding_a_stale_checkpoint_keeps_a_newer_active_window() {
        let mut store = CheckpointStore::new();
        let first = store.take(vec![None; 4], 0);
        let second = store.take(vec![None; 4], 3);
        assert_eq!(store.active(), Some(second));

        store.discard(first);
        assert_eq!(store.active(), Some(second));
        store.discard(second);
        assert_eq!(store.active(), None);
    }
}
