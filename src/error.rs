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

use thiserror::Error;

/// Result alias with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors raised at construction time.
///
/// All fallible paths in this crate are constructors. Once a filter is built,
/// `inc`, `dec` and `estimate` are total and never fail.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("cell count must be positive")]
    ZeroCells,
    #[error("hash count must be positive")]
    ZeroHashes,
    #[error("counter width must be within 1..=32 bits, got {0}")]
    BitsOutOfRange(u8),
    #[error("expected item count must be positive")]
    ZeroItems,
    #[error("error rate must be within (0, 1), got {0}")]
    ErrorRateOutOfBounds(f64),
}
