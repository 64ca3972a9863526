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

//! Persistent VIF channel state
//!
//! Everything the VIF keeps outside of its register window: stall latch,
//! command/in-progress latches and the row/column filling registers.

use serde::{Deserialize, Serialize};

use super::registers::VifRegisters;

/// Row and column filling registers (VIFn_R0-R3 / VIFn_C0-C3)
///
/// These are the only fields shared with the VU1 execution thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRegisters {
    /// Row lanes, R0 in lane 0
    pub row: [u32; 4],

    /// Column lanes, C0 in lane 0
    pub col: [u32; 4],
}

/// Why the VIF latched a stall
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StallCause {
    /// No stall latched
    #[default]
    None,
    /// Stalled at a timing break
    TimingBreak,
    /// Stalled by STOP, ForceBreak or a VIFcode interrupt
    IrqStall,
}

/// Control state of one VIF channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    /// A stall must be acknowledged before DMA resumes
    pub stall_pending: bool,

    /// Cause of the latched stall
    pub stall_cause: StallCause,

    /// In-progress latch
    ///
    /// - Bit 0: transfer in progress
    /// - Bit 4: MFIFO ring empty (VIF1 only)
    pub in_progress: u8,

    /// Command latch (current VIFcode command byte)
    pub cmd: u8,

    /// Last transfer finished
    pub done: bool,

    /// Row / column filling registers
    pub masks: MaskRegisters,

    /// Size of the last GS → memory download announced by the GS (VIF1 only)
    pub last_download_size: u32,

    /// Cycle accumulator for the running DMA slice
    pub cycles: u32,
}

impl ChannelState {
    /// In-progress latch: MFIFO ring empty
    pub const IN_PROGRESS_MFIFO_EMPTY: u8 = 0x10;
}

/// Verbatim copy of a channel for save states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VifSnapshot {
    /// Channel index the snapshot was taken from
    pub channel: u8,

    /// Control state, including both mask registers
    pub state: ChannelState,

    /// Register image
    pub registers: VifRegisters,
}

impl VifSnapshot {
    /// Encode with the bincode standard configuration
    pub fn to_bytes(&self) -> crate::core::error::Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(
            self,
            bincode::config::standard(),
        )?)
    }

    /// Decode a snapshot produced by [`VifSnapshot::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> crate::core::error::Result<Self> {
        let (snapshot, _) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_zeroed() {
        let state = ChannelState::default();
        assert!(!state.stall_pending);
        assert_eq!(state.stall_cause, StallCause::None);
        assert_eq!(state.in_progress, 0);
        assert_eq!(state.masks, MaskRegisters::default());
    }

    #[test]
    fn test_snapshot_bytes() {
        let mut snapshot = VifSnapshot {
            channel: 1,
            state: ChannelState::default(),
            registers: VifRegisters::default(),
        };
        snapshot.state.masks.col[3] = 0xDEAD_BEEF;
        snapshot.state.last_download_size = 12;

        let bytes = snapshot.to_bytes().unwrap();
        assert_eq!(VifSnapshot::from_bytes(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_snapshot_rejects_truncated_input() {
        assert!(VifSnapshot::from_bytes(&[]).is_err());
    }
}
