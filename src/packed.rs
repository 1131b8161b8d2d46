//  Copyright 2026 MrCroxx
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum supported counter width in bits.
pub const MAX_COUNTER_BITS: u8 = 32;

/// A fixed array of saturating unsigned counters, `bits` wide each, packed
/// into `u64` words.
///
/// Cell `i` occupies bits `[i * bits, (i + 1) * bits)` of the word stream,
/// filled LSB-first; a cell may straddle two adjacent words. The layout is
/// stable, so serializing the words round-trips across processes.
///
/// Every cell value stays within `[0, 2^bits - 1]`: increments at the maximum
/// and decrements at zero are no-ops. Saturation is enforced here and nowhere
/// else.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackedCounters {
    cells: usize,
    bits: u8,

    words: Box<[u64]>,
}

impl PackedCounters {
    /// Allocates `cells` zeroed counters of `bits` bits each.
    pub fn new(cells: usize, bits: u8) -> Result<Self> {
        if cells == 0 {
            return Err(Error::ZeroCells);
        }
        if bits == 0 || bits > MAX_COUNTER_BITS {
            return Err(Error::BitsOutOfRange(bits));
        }

        let words = {
            let len = (cells * bits as usize).div_ceil(u64::BITS as usize);
            // Use `resize` instead of `vec![]` to avoid page faults caused by delayed allocation.
            let mut data = Vec::with_capacity(len);
            data.resize(len, 0);
            data.into_boxed_slice()
        };

        Ok(Self { cells, bits, words })
    }

    /// Returns the value stored at `index`.
    ///
    /// Panics if `index` is out of range; callers derive indices from the cell
    /// count, so an out-of-range access is a programming error.
    pub fn get(&self, index: usize) -> u64 {
        assert!(
            index < self.cells,
            "cell index out of range: {index} >= {}",
            self.cells
        );

        let (word, shift) = self.location(index);
        let mut value = self.words[word] >> shift;
        if shift + self.bits as u32 > u64::BITS {
            value |= self.words[word + 1] << (u64::BITS - shift);
        }
        value & self.max_value()
    }

    /// Stores `value` at `index`.
    ///
    /// Panics if `index` is out of range or `value` exceeds the counter
    /// capacity.
    pub fn set(&mut self, index: usize, value: u64) {
        assert!(
            index < self.cells,
            "cell index out of range: {index} >= {}",
            self.cells
        );
        let max = self.max_value();
        assert!(value <= max, "value out of range: {value} > {max}");

        let (word, shift) = self.location(index);
        self.words[word] = (self.words[word] & !(max << shift)) | (value << shift);
        if shift + self.bits as u32 > u64::BITS {
            // The high part spills into the next word.
            let spill = u64::BITS - shift;
            self.words[word + 1] = (self.words[word + 1] & !(max >> spill)) | (value >> spill);
        }
    }

    /// Adds 1 to the cell at `index`, saturating at `2^bits - 1`.
    pub fn increment(&mut self, index: usize) {
        let value = self.get(index);
        if value < self.max_value() {
            self.set(index, value + 1);
        }
    }

    /// Subtracts 1 from the cell at `index`, saturating at 0.
    pub fn decrement(&mut self, index: usize) {
        let value = self.get(index);
        if value > 0 {
            self.set(index, value - 1);
        }
    }

    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }

    pub fn cells(&self) -> usize {
        self.cells
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn max_value(&self) -> u64 {
        (1u64 << self.bits) - 1
    }

    pub fn memory(&self) -> usize {
        (u64::BITS as usize * self.words.len() + usize::BITS as usize * 2) / 8
    }

    #[inline(always)]
    fn location(&self, index: usize) -> (usize, u32) {
        let offset = index * self.bits as usize;
        (
            offset / u64::BITS as usize,
            (offset % u64::BITS as usize) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use paste::paste;

    use super::*;

    macro_rules! test_packed {
        ($( $bits:literal, )*) => {
            paste! {
                $(
                    #[test]
                    fn [<test_roundtrip_ $bits bit>]() {
                        let mut counters = PackedCounters::new(100, $bits).unwrap();
                        let max = counters.max_value();

                        for cell in 0..100 {
                            counters.set(cell, cell as u64 % (max + 1));
                        }

                        for cell in 0..100 {
                            assert_eq!(counters.get(cell), cell as u64 % (max + 1));
                        }
                    }

                    #[test]
                    fn [<test_adjacent_max_values_ $bits bit>]() {
                        let mut counters = PackedCounters::new(100, $bits).unwrap();
                        let max = counters.max_value();

                        for cell in 0..100 {
                            counters.set(cell, max);
                        }

                        for cell in 0..100 {
                            assert_eq!(counters.get(cell), max);
                        }
                    }

                    #[test]
                    fn [<test_saturating_increment_ $bits bit>]() {
                        let mut counters = PackedCounters::new(3, $bits).unwrap();
                        let max = counters.max_value();

                        counters.set(1, max - 1);
                        counters.increment(1);
                        assert_eq!(counters.get(1), max);
                        counters.increment(1);
                        assert_eq!(counters.get(1), max);

                        assert_eq!(counters.get(0), 0);
                        assert_eq!(counters.get(2), 0);
                    }

                    #[test]
                    fn [<test_saturating_decrement_ $bits bit>]() {
                        let mut counters = PackedCounters::new(3, $bits).unwrap();

                        counters.decrement(1);
                        assert_eq!(counters.get(1), 0);

                        counters.set(1, 1);
                        counters.decrement(1);
                        counters.decrement(1);
                        assert_eq!(counters.get(1), 0);
                    }

                    #[test]
                    fn [<test_clear_ $bits bit>]() {
                        let mut counters = PackedCounters::new(64, $bits).unwrap();
                        let max = counters.max_value();

                        for cell in 0..64 {
                            counters.set(cell, max);
                        }
                        counters.clear();

                        for cell in 0..64 {
                            assert_eq!(counters.get(cell), 0);
                        }
                    }

                    #[test]
                    #[should_panic]
                    fn [<test_get_out_of_range_ $bits bit>]() {
                        let counters = PackedCounters::new(8, $bits).unwrap();
                        counters.get(8);
                    }
                )*
            }
        };
    }

    macro_rules! for_all_counter_widths {
        ($macro:ident) => {
            $macro! { 1, 2, 3, 4, 7, 8, 12, 16, 24, 32, }
        };
    }

    for_all_counter_widths! { test_packed }

    #[test]
    fn test_new_with_invalid_args() {
        assert_eq!(PackedCounters::new(0, 4).unwrap_err(), Error::ZeroCells);
        assert_eq!(
            PackedCounters::new(16, 0).unwrap_err(),
            Error::BitsOutOfRange(0)
        );
        assert_eq!(
            PackedCounters::new(16, 33).unwrap_err(),
            Error::BitsOutOfRange(33)
        );
    }

    #[test]
    #[should_panic]
    fn test_set_above_capacity() {
        let mut counters = PackedCounters::new(8, 4).unwrap();
        counters.set(0, 16);
    }

    #[test]
    fn test_word_straddling_cells() {
        // 12-bit cells: cell 5 spans the first word boundary (bits 60..72).
        let mut counters = PackedCounters::new(16, 12).unwrap();

        counters.set(4, 0xFFF);
        counters.set(5, 0xABC);
        counters.set(6, 0xFFF);
        assert_eq!(counters.get(4), 0xFFF);
        assert_eq!(counters.get(5), 0xABC);
        assert_eq!(counters.get(6), 0xFFF);

        counters.set(5, 0);
        assert_eq!(counters.get(4), 0xFFF);
        assert_eq!(counters.get(5), 0);
        assert_eq!(counters.get(6), 0xFFF);
    }

    #[test]
    fn test_memory() {
        let counters = PackedCounters::new(1024, 4).unwrap();
        assert!(counters.memory() >= 1024 * 4 / 8);
    }
}
