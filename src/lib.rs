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

//! A probabilistic multiset that estimates how many times each item was
//! inserted. It is a counting bloom filter: one array of `bits`-wide
//! saturating counters, with every item probing k hashed positions of that
//! array. The classic variant increments all k counters on insertion, so an
//! item sharing even one counter with popular neighbours gets dragged upward
//! everywhere. Here insertion increments only the counters currently holding
//! the minimal value among the k, which leaves the already-inflated counters
//! alone and curbs overestimation. Querying the count returns the minimum
//! value of these counters.
//!
//! Without removals the estimate never drops below the true insertion count
//! until counters saturate. Removal is supported but lossy: the symmetric
//! decrease can push a still-present item's estimate below its true count.
//!
//! Insertion reads all k counters before mutating the minimal ones, so it is
//! not parallelizable. Users are supposed to synchronize concurrent accesses
//! to the data structure, or wrap it in the coarse-locked
//! [`SyncCountingBloomFilter`].
//!
//! E.g. inc(x) with 3 hashes:
//! hash1(x) = 2 -> counter 2 holds 4
//! hash2(x) = 5 -> counter 5 holds 1, minimal -> increment
//! hash3(x) = 3 -> counter 3 holds 1, minimal -> increment
//!
//! # Usage
//!
//! ```
//! use cbfilter::CountingBloomFilter;
//!
//! fn main() {
//!     let mut filter = CountingBloomFilter::new(1024, 4, 8).unwrap();
//!     for kmer in ["ACGTTGCA", "TTGCAGGT", "GGTACGTT"] {
//!         for _ in 0..3 {
//!             filter.inc_item(kmer);
//!         }
//!     }
//!
//!     for kmer in ["ACGTTGCA", "TTGCAGGT", "GGTACGTT"] {
//!         assert!(filter.estimate_item(kmer) >= 3);
//!         assert!(filter.estimate_item(kmer) <= filter.capacity());
//!     }
//! }
//! ```

mod base;
pub use base::*;

mod error;
pub use error::*;

mod packed;
pub use packed::*;

mod sync;
pub use sync::*;
