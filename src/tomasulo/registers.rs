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

// registers.rs
//
// This file contains the architectural register file and the register alias
// table (RAT). The RAT maps each architectural register to the ROB entry
// that will produce its next value, or to nothing when the register file
// already holds the current value.

#[derive(Debug, Clone)]
pub struct RegisterFile {
    data: Vec<i64>,
}

impl RegisterFile {
    pub fn new(count: usize) -> Self {
        Self {
            data: vec![0; count],
        }
    }

    pub fn read(&self, reg: usize) -> i64 {
        if reg < self.data.len() {
            self.data[reg]
        } else {
            0 // Out-of-bounds reads yield 0
        }
    }

    pub fn write(&mut self, reg: usize, value: i64) {
        if reg < self.data.len() {
            self.data[reg] = value;
        }
        // Ignore out-of-bounds writes
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[i64] {
        &self.data
    }

    pub fn dump(&self) -> String {
        let mut result = String::new();
        for (i, chunk) in self.data.chunks(8).enumerate() {
            let line: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(j, v)| format!("R{}: {}", i * 8 + j, v))
                .collect();
            result.push_str(&line.join(" | "));
            result.push('\n');
        }
        result
    }
}

/// Register Alias Table. A snapshot of the whole table is cheap for 32
/// registers, which is what checkpoints rely on.
#[derive(Debug, Clone)]
pub struct RegisterAliasTable {
    tags: Vec<Option<usize>>,
}

impl RegisterAliasTable {
    pub fn new(count: usize) -> Self {
        Self {
            tags: vec![None; count],
        }
    }

    pub fn get(&self, reg: usize) -> Option<usize> {
        self.tags.get(reg).copied().flatten()
    }

    pub fn set(&mut self, reg: usize, rob_id: usize) {
        if reg < self.tags.len() {
            self.tags[reg] = Some(rob_id);
        }
    }

    pub fn clear(&mut self, reg: usize) {
        if reg < self.tags.len() {
            self.tags[reg] = None;
        }
    }

    pub fn clear_all(&mut self) {
        for tag in &mut self.tags {
            *tag = None;
        }
    }

    pub fn snapshot(&self) -> Vec<Option<usize>> {
        self.tags.clone()
    }

    pub fn restore(&mut self, snapshot: &[Option<usize>]) {
        self.tags.clear();
        self.tags.extend_from_slice(snapshot);
    }

    pub fn tags(&self) -> &[Option<usize>] {
        &self.tags
    }

    /// Registers currently renamed, as (register, ROB id) pairs.
    pub fn renamed(&self) -> Vec<(usize, usize)> {
        self.tags
            .iter()
            .enumerate()
            .filter_map(|(reg, tag)| tag.map(|rob_id| (reg, rob_id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_access_is_absorbed() {
        let mut registers = RegisterFile::new(32);
        registers.write(100, 7);
        assert_eq!(registers.read(100), 0);

        registers.write(5, 7);
        assert_eq!(registers.read(5), 7);
    }

    #[test]
    fn snapshot_round_trips_through_restore() {
        let mut rat = RegisterAliasTable::new(32);
        rat.set(1, 3);
        rat.set(7, 12);
        let snapshot = rat.snapshot();

        rat.set(1, 9);
        rat.clear(7);
        rat.set(2, 0);

        rat.restore(&snapshot);
        assert_eq!(rat.get(1), Some(3));
        assert_eq!(rat.get(7), Some(12));
        assert_eq!(rat.get(2), None);
    }
}
