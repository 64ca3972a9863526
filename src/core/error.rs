// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for the emulator core
//!
//! Register handlers themselves never fail: every VIF control write is a total
//! function of the current state and the written value. Errors only surface at
//! the edges of the core (address decoding, configuration, save states and the
//! VU1 worker thread).

use thiserror::Error;

/// Emulator error type
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// Access to an address that no VIF register window decodes
    #[error("Invalid memory access at address 0x{address:08X}")]
    InvalidMemoryAccess {
        /// Physical address that was accessed
        address: u32,
    },

    /// Register access that is not 4-byte aligned
    #[error("Unaligned access at address 0x{address:08X} (size {size})")]
    UnalignedAccess {
        /// Physical address that was accessed
        address: u32,
        /// Access size in bytes
        size: u32,
    },

    /// VIF channel index outside 0..=1
    #[error("Invalid VIF channel {index}")]
    InvalidChannel {
        /// Requested channel index
        index: usize,
    },

    /// Configuration could not be parsed or applied
    #[error("Configuration error: {0}")]
    Config(String),

    /// Save state encoding failed
    #[error("Failed to encode snapshot: {0}")]
    SnapshotEncode(#[from] bincode::error::EncodeError),

    /// Save state decoding failed
    #[error("Failed to decode snapshot: {0}")]
    SnapshotDecode(#[from] bincode::error::DecodeError),

    /// The VU1 worker thread could not be started or has gone away
    #[error("VU1 thread error: {0}")]
    VuThread(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formats_address() {
        let err = EmulatorError::InvalidMemoryAccess {
            address: 0x1000_3900,
        };
        assert_eq!(
            err.to_string(),
            "Invalid memory access at address 0x10003900"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: EmulatorError = io.into();
        assert!(matches!(err, EmulatorError::Io(_)));
    }
}
