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

// memory.rs
//
// This file contains the data memory for the Tomasulo simulator: a sparse
// word-addressed store. Addresses that were never written read as 0, and
// stores only reach memory when their ROB entry commits.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct DataMemory {
    words: HashMap<i64, i64>,
}

impl DataMemory {
    pub fn new() -> Self {
        Self {
            words: HashMap::new(),
        }
    }

    pub fn read_word(&self, address: i64) -> i64 {
        self.words.get(&address).copied().unwrap_or(0)
    }

    pub fn write_word(&mut self, address: i64, value: i64) {
        self.words.insert(address, value);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Written addresses with their values, sorted by address for display.
    pub fn entries(&self) -> Vec<(i64, i64)> {
        let mut entries: Vec<(i64, i64)> = self.words.iter().map(|(&a, &v)| (a, v)).collect();
        entries.sort_by_key(|&(address, _)| address);
        entries
    }
}
