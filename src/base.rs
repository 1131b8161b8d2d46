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

use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use xxhash_rust::xxh3::Xxh3;

use crate::{
    error::{Error, Result},
    packed::PackedCounters,
};

const DEFAULT_SEED: u64 = 0x9e3779b97f4a7c15;

/// Hash counts rarely exceed this; slot scratch space stays on the stack below it.
const TYPICAL_HASHES: usize = 8;

type Slots = SmallVec<[usize; TYPICAL_HASHES]>;
type Values = SmallVec<[u64; TYPICAL_HASHES]>;

/// A counting bloom filter with minimal-increase insertion.
///
/// The k hash positions of an item all index one shared counter array.
/// Insertion reads the k counters, finds their minimum and increments only the
/// counters currently holding it; the estimate for an item is the minimum of
/// its k counters. Leaving the non-minimal counters untouched keeps one
/// popular item from inflating the estimates of items it shares counters with.
///
/// Without removals the estimate never drops below the true insertion count
/// until counters saturate at `2^bits - 1`. Removal via [`dec`] is lossy: the
/// minimal set is recomputed under current state, so removing one item can
/// drag a still-present neighbour's estimate below its true count, possibly
/// to 0.
///
/// [`dec`]: CountingBloomFilter::dec
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CountingBloomFilter {
    counters: PackedCounters,
    hashes: usize,
    seed: u64,
}

impl CountingBloomFilter {
    /// Constructs a filter with `cells` counters of `bits` bits each and
    /// `hashes` probe positions per item.
    pub fn new(cells: usize, hashes: usize, bits: u8) -> Result<Self> {
        Self::with_seed(cells, hashes, bits, DEFAULT_SEED)
    }

    /// Same as [`new`], with an explicit seed for the hash family. Two filters
    /// built with identical parameters probe identical positions, across
    /// processes and platforms.
    ///
    /// [`new`]: CountingBloomFilter::new
    pub fn with_seed(cells: usize, hashes: usize, bits: u8, seed: u64) -> Result<Self> {
        if hashes == 0 {
            return Err(Error::ZeroHashes);
        }
        let counters = PackedCounters::new(cells, bits)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(cells, hashes, bits, seed, "allocated counting bloom filter");

        Ok(Self {
            counters,
            hashes,
            seed,
        })
    }

    /// cells = -items * ln(rate) / ln(2)^2; hashes = cells / items * ln(2)
    ///
    /// items, error rate => cells, hashes:
    ///
    /// 1000, 0.01 => 9586, 7
    /// 1000, 0.05 => 6236, 5
    pub fn with_error_rate(items: usize, error_rate: f64, bits: u8) -> Result<Self> {
        if items == 0 {
            return Err(Error::ZeroItems);
        }
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(Error::ErrorRateOutOfBounds(error_rate));
        }

        let ln2 = std::f64::consts::LN_2;
        let cells = (-(items as f64) * error_rate.ln() / (ln2 * ln2)).ceil() as usize;
        let hashes = (cells as f64 / items as f64 * ln2).ceil() as usize;

        Self::with_seed(cells, hashes, bits, DEFAULT_SEED)
    }

    /// Records one occurrence of `hash`.
    ///
    /// Only the probed counters currently holding the minimal value are
    /// incremented, each once per probe landing on it. The counter reads and
    /// writes of one call form a single logical unit; interleaving calls on
    /// overlapping positions requires external synchronization (or
    /// [`SyncCountingBloomFilter`]).
    ///
    /// [`SyncCountingBloomFilter`]: crate::SyncCountingBloomFilter
    pub fn inc(&mut self, hash: u64) {
        let slots: Slots = self.indices(hash).collect();
        self.inc_slots(&slots);
    }

    /// Removes one occurrence of `hash` by the decrease symmetric to [`inc`]:
    /// the probed counters holding the minimal value under *current* state are
    /// decremented, saturating at 0.
    ///
    /// This is not the inverse of [`inc`], which may have left non-minimal
    /// counters untouched. Removing an item can push the estimate of a
    /// still-present item below its true count, down to 0. Skip removal
    /// entirely if that is not acceptable.
    ///
    /// [`inc`]: CountingBloomFilter::inc
    pub fn dec(&mut self, hash: u64) {
        let slots: Slots = self.indices(hash).collect();
        self.dec_slots(&slots);
    }

    /// Returns the estimated occurrence count of `hash`: the minimum value of
    /// its probed counters.
    pub fn estimate(&self, hash: u64) -> u64 {
        // `hashes` is validated positive at construction, so the iterator is never empty.
        unsafe {
            self.indices(hash)
                .map(|slot| self.counters.get(slot))
                .min()
                .unwrap_unchecked()
        }
    }

    /// Records one occurrence of `item`.
    pub fn inc_item<T: Hash + ?Sized>(&mut self, item: &T) {
        let hash = self.hash_item(item);
        self.inc(hash);
    }

    /// Removes one occurrence of `item`. Lossy, see [`dec`].
    ///
    /// [`dec`]: CountingBloomFilter::dec
    pub fn dec_item<T: Hash + ?Sized>(&mut self, item: &T) {
        let hash = self.hash_item(item);
        self.dec(hash);
    }

    /// Returns the estimated occurrence count of `item`.
    pub fn estimate_item<T: Hash + ?Sized>(&self, item: &T) -> u64 {
        self.estimate(self.hash_item(item))
    }

    /// Hashes `item` with the filter's seed. Stable across processes and
    /// platforms for the same seed.
    pub fn hash_item<T: Hash + ?Sized>(&self, item: &T) -> u64 {
        let mut hasher = Xxh3::with_seed(self.seed);
        item.hash(&mut hasher);
        hasher.finish()
    }

    /// The probed counter positions for `hash`, in derivation order.
    /// Positions are not deduplicated; collisions between probes are treated
    /// as distinct slots landing on one cell.
    pub fn indices(&self, hash: u64) -> impl Iterator<Item = usize> + '_ {
        (0..self.hashes).map(move |depth| self.index(depth, hash))
    }

    pub fn clear(&mut self) {
        self.counters.clear();
    }

    pub fn cells(&self) -> usize {
        self.counters.cells()
    }

    pub fn hashes(&self) -> usize {
        self.hashes
    }

    pub fn counter_bits(&self) -> u8 {
        self.counters.bits()
    }

    pub fn capacity(&self) -> u64 {
        self.counters.max_value()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn memory(&self) -> usize {
        self.counters.memory()
    }

    #[inline(always)]
    fn index(&self, depth: usize, hash: u64) -> usize {
        combine_hashes(twang_mix64(self.seed ^ depth as u64), hash) as usize
            % self.counters.cells()
    }

    /// The snapshot is taken before any mutation so that a slot probed twice
    /// at the minimum advances once per probe.
    fn inc_slots(&mut self, slots: &[usize]) {
        let values: Values = slots.iter().map(|&slot| self.counters.get(slot)).collect();
        let min = values.iter().copied().min().unwrap_or(0);
        for (&slot, &value) in slots.iter().zip(values.iter()) {
            if value == min {
                self.counters.increment(slot);
            }
        }
    }

    fn dec_slots(&mut self, slots: &[usize]) {
        let values: Values = slots.iter().map(|&slot| self.counters.get(slot)).collect();
        let min = values.iter().copied().min().unwrap_or(0);
        for (&slot, &value) in slots.iter().zip(values.iter()) {
            if value == min {
                self.counters.decrement(slot);
            }
        }
    }
}

/// Reduce two 64-bit hashes into one.
///
/// Ported from CacheLib, which uses the `Hash128to64` function from Google's city hash.
#[inline(always)]
fn combine_hashes(upper: u64, lower: u64) -> u64 {
    const MUL: u64 = 0x9ddfea08eb382d69;

    let mut a = (lower ^ upper).wrapping_mul(MUL);
    a ^= a >> 47;
    let mut b = (upper ^ a).wrapping_mul(MUL);
    b ^= b >> 47;
    b = b.wrapping_mul(MUL);
    b
}

#[inline(always)]
fn twang_mix64(val: u64) -> u64 {
    let mut val = (!val).wrapping_add(val << 21); // val *= (1 << 21); val -= 1
    val = val ^ (val >> 24);
    val = val.wrapping_add(val << 3).wrapping_add(val << 8); // val *= 1 + (1 << 3) + (1 << 8)
    val = val ^ (val >> 14);
    val = val.wrapping_add(val << 2).wrapping_add(val << 4); // va; *= 1 + (1 << 2) + (1 << 4)
    val = val ^ (val >> 28);
    val = val.wrapping_add(val << 31); // val *= 1 + (1 << 31)
    val
}
