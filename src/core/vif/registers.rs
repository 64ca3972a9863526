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

//! VIF register type definitions
//!
//! This module contains the hardware-visible register image of a VIF channel:
//! the STAT/ERR/FBRST bit layouts, the register offset map and the generic
//! word storage that plain writebacks land in.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Register offsets relative to the channel base (0x10003800 / 0x10003C00)
pub mod offsets {
    /// Status register
    pub const STAT: u32 = 0x000;
    /// Force break / reset register
    pub const FBRST: u32 = 0x010;
    /// Error mask register
    pub const ERR: u32 = 0x020;
    /// Mark register
    pub const MARK: u32 = 0x030;
    /// Write cycle register
    pub const CYCLE: u32 = 0x040;
    /// Addition mode register
    pub const MODE: u32 = 0x050;
    /// Remaining data count
    pub const NUM: u32 = 0x060;
    /// Write mask pattern
    pub const MASK: u32 = 0x070;
    /// Last processed VIFcode
    pub const CODE: u32 = 0x080;
    /// ITOPS setting
    pub const ITOPS: u32 = 0x090;
    /// Double buffer base (VIF1 only)
    pub const BASE: u32 = 0x0A0;
    /// Double buffer offset (VIF1 only)
    pub const OFST: u32 = 0x0B0;
    /// Next TOPS (VIF1 only)
    pub const TOPS: u32 = 0x0C0;
    /// ITOP value
    pub const ITOP: u32 = 0x0D0;
    /// TOP value (VIF1 only)
    pub const TOP: u32 = 0x0E0;
    /// Row filling data, lanes 0-3
    pub const R0: u32 = 0x100;
    pub const R1: u32 = 0x110;
    pub const R2: u32 = 0x120;
    pub const R3: u32 = 0x130;
    /// Column filling data, lanes 0-3
    pub const C0: u32 = 0x140;
    pub const C1: u32 = 0x150;
    pub const C2: u32 = 0x160;
    pub const C3: u32 = 0x170;

    /// Size of the register window
    pub const WINDOW_SIZE: u32 = 0x180;
}

bitflags! {
    /// VIFn_STAT
    ///
    /// Only FDR is writable by the CPU (and only on VIF1); every other bit is
    /// set by the hardware.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct VifStat: u32 {
        /// VIF pipeline status field (bits 0-1), see [`VifPipelineState`]
        const VPS = 0b11;
        /// Waiting for end of VU execution
        const VEW = 1 << 2;
        /// Waiting for GIF PATH3 (VIF1 only)
        const VGW = 1 << 3;
        /// MARK detected
        const MRK = 1 << 6;
        /// Double buffer flag (VIF1 only)
        const DBF = 1 << 7;
        /// Stopped by STOP
        const VSS = 1 << 8;
        /// Stopped by ForceBreak
        const VFS = 1 << 9;
        /// Stopped by an interrupt (i bit of a VIFcode)
        const VIS = 1 << 10;
        /// Interrupt bit detected
        const INT = 1 << 11;
        /// DMAtag mismatch error
        const ER0 = 1 << 12;
        /// Invalid VIFcode error
        const ER1 = 1 << 13;
        /// FIFO direction, set = VIF → memory (VIF1 only)
        const FDR = 1 << 23;
        /// FIFO quadword count field (bits 24-28)
        const FQC = 0x1F << 24;
    }
}

/// VIF pipeline state (STAT.VPS)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VifPipelineState {
    /// Idle
    Idle = 0,
    /// Waiting for data following a VIFcode
    Waiting = 1,
    /// Decoding a VIFcode
    Decoding = 2,
    /// Decompressing / transferring data
    Transferring = 3,
}

impl VifStat {
    /// Flags that indicate the channel is stalled
    pub const STALL_SOURCES: VifStat = VifStat::VSS.union(VifStat::VFS).union(VifStat::VIS);

    /// Pipeline state field
    pub fn vps(self) -> VifPipelineState {
        match self.bits() & Self::VPS.bits() {
            0 => VifPipelineState::Idle,
            1 => VifPipelineState::Waiting,
            2 => VifPipelineState::Decoding,
            _ => VifPipelineState::Transferring,
        }
    }

    /// Replace the pipeline state field
    pub fn set_vps(&mut self, state: VifPipelineState) {
        *self = Self::from_bits_retain((self.bits() & !Self::VPS.bits()) | state as u32);
    }

    /// FIFO quadword count
    pub fn fqc(self) -> u32 {
        (self.bits() & Self::FQC.bits()) >> 24
    }

    /// Replace the FIFO quadword count, truncated to the 5-bit field
    pub fn set_fqc(&mut self, count: u32) {
        let field = (count << 24) & Self::FQC.bits();
        *self = Self::from_bits_retain((self.bits() & !Self::FQC.bits()) | field);
    }
}

bitflags! {
    /// VIFn_ERR
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct VifErr: u32 {
        /// Mask interrupt by the i bit of a VIFcode
        const MII = 1 << 0;
        /// Ignore DMAtag mismatch error
        const ME0 = 1 << 1;
        /// Ignore invalid VIFcode error
        const ME1 = 1 << 2;
    }
}

bitflags! {
    /// VIFn_FBRST request bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Fbrst: u32 {
        /// Reset the VIF
        const RST = 1 << 0;
        /// Force break
        const FBK = 1 << 1;
        /// Stop after the current VIFcode
        const STP = 1 << 2;
        /// Cancel a stall
        const STC = 1 << 3;
    }
}

/// Hardware-visible register image of one VIF channel
///
/// STAT, ERR, MODE and MARK have typed storage; every other word of the
/// register window is kept in generic storage, addressed by offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VifRegisters {
    /// STAT
    pub stat: VifStat,

    /// ERR
    pub err: VifErr,

    /// MODE (bits 0-1)
    pub mode: u32,

    /// MARK
    pub mark: u32,

    /// Remaining register words, indexed by `offset >> 4`
    words: [u32; 24],

    /// Shadow of the 128-bit FIFO window (VIFn_FIFO)
    pub fifo_shadow: [u32; 4],

    /// MSKPATH3 state (VIF1 only)
    pub mskpath3: bool,
}

impl Default for VifRegisters {
    fn default() -> Self {
        Self {
            stat: VifStat::empty(),
            err: VifErr::empty(),
            mode: 0,
            mark: 0,
            words: [0; 24],
            fifo_shadow: [0; 4],
            mskpath3: false,
        }
    }
}

impl VifRegisters {
    /// Storage slot of a register; only the first word of each 16-byte slot is decoded
    fn slot(offset: u32) -> Option<usize> {
        (offset & 0xF == 0).then_some((offset >> 4) as usize)
    }

    /// Plain register load by offset
    pub fn load(&self, offset: u32) -> u32 {
        match offset {
            offsets::STAT => self.stat.bits(),
            offsets::ERR => self.err.bits(),
            offsets::MARK => self.mark,
            offsets::MODE => self.mode,
            _ => Self::slot(offset)
                .and_then(|slot| self.words.get(slot))
                .copied()
                .unwrap_or(0),
        }
    }

    /// Plain register store by offset (caller writeback)
    pub fn store(&mut self, offset: u32, value: u32) {
        match offset {
            offsets::STAT => self.stat = VifStat::from_bits_retain(value),
            offsets::ERR => self.err = VifErr::from_bits_truncate(value),
            offsets::MARK => self.mark = value & 0xFFFF,
            offsets::MODE => self.mode = value & 0b11,
            _ => match Self::slot(offset).and_then(|slot| self.words.get_mut(slot)) {
                Some(word) => *word = value,
                None => log::warn!(
                    "Dropping VIF store to unmapped offset 0x{:03X} = 0x{:08X}",
                    offset,
                    value
                ),
            },
        }
    }
}
