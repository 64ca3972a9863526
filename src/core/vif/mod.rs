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

//! VIF (VPU Interface) control registers
//!
//! The PlayStation 2 has two VIF channels sitting between the DMAC and the
//! vector units. This module implements their control-register behaviour:
//!
//! - **FBRST**: reset, force break, stop and stall cancel
//! - **STAT**: FIFO direction reversal (VIF1 only)
//! - **R0-R3 / C0-C3**: row/column filling registers, shared with VU1
//! - **MARK**: clears STAT.MRK on write
//!
//! # Channels
//!
//! | Channel | Registers   | FIFO        | DMA ch | Direction | VU thread |
//! |---------|-------------|-------------|--------|-----------|-----------|
//! | VIF0    | 0x10003800  | 0x10004000  | 0      | no        | no        |
//! | VIF1    | 0x10003C00  | 0x10005000  | 1      | yes       | yes       |
//!
//! Both channels run the same handlers; the differences are captured by a
//! [`ChannelDescriptor`].
//!
//! # References
//!
//! - EE User's Manual, chapter 6 (VIF)

mod direction;
mod fbrst;
mod mux;
pub mod registers;
mod state;

pub use mux::WriteOutcome;
pub use registers::{offsets, Fbrst, VifErr, VifPipelineState, VifRegisters, VifStat};
pub use state::{ChannelState, MaskRegisters, StallCause, VifSnapshot};

use crate::core::dma::Dmac;
use crate::core::gif::Gif;
use crate::core::timing::{DmaEvent, EventScheduler};
use crate::core::vu::VuSync;

/// VIF channel selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VifId {
    /// VIF0, feeding VU0
    Vif0,
    /// VIF1, feeding VU1 and the GIF
    Vif1,
}

impl VifId {
    /// Both channels in index order
    pub const ALL: [VifId; 2] = [VifId::Vif0, VifId::Vif1];

    /// Channel index (0 or 1)
    pub fn index(self) -> usize {
        match self {
            VifId::Vif0 => 0,
            VifId::Vif1 => 1,
        }
    }

    /// Static description of the channel
    pub fn descriptor(self) -> ChannelDescriptor {
        match self {
            VifId::Vif0 => ChannelDescriptor::VIF0,
            VifId::Vif1 => ChannelDescriptor::VIF1,
        }
    }
}

/// Per-channel hardware differences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// Channel index (0 or 1)
    pub index: usize,

    /// Base address of the register window
    pub base_address: u32,

    /// DMAC channel feeding this VIF
    pub dma_channel: usize,

    /// Direct DMA event
    pub dma_event: DmaEvent,

    /// DMA can be routed through the MFIFO ring
    pub mfifo_routing: bool,

    /// STAT.FDR is writable
    pub direction_control: bool,

    /// Row/column registers are shared with a VU thread
    pub vu_sync: bool,
}

impl ChannelDescriptor {
    /// VIF0
    pub const VIF0: ChannelDescriptor = ChannelDescriptor {
        index: 0,
        base_address: 0x1000_3800,
        dma_channel: Dmac::CH_VIF0,
        dma_event: DmaEvent::Vif0,
        mfifo_routing: false,
        direction_control: false,
        vu_sync: false,
    };

    /// VIF1
    pub const VIF1: ChannelDescriptor = ChannelDescriptor {
        index: 1,
        base_address: 0x1000_3C00,
        dma_channel: Dmac::CH_VIF1,
        dma_event: DmaEvent::Vif1,
        mfifo_routing: true,
        direction_control: true,
        vu_sync: true,
    };

    /// MFIFO event, if this channel can be routed through the MFIFO
    pub fn mfifo_event(&self) -> Option<DmaEvent> {
        self.mfifo_routing.then_some(DmaEvent::MfifoVif)
    }

    /// Check if `address` is inside this channel's register window
    pub fn contains(&self, address: u32) -> bool {
        address >= self.base_address && address < self.base_address + offsets::WINDOW_SIZE
    }
}

/// Collaborators a VIF handler may touch during one register access
pub struct VifPeers<'a> {
    /// DMA controller (CHCR.STR, QWC, D_CTRL.MFD, D_STAT)
    pub dmac: &'a mut Dmac,

    /// DMA event scheduler
    pub scheduler: &'a mut EventScheduler,

    /// GIF status (PATH3 mask)
    pub gif: &'a mut Gif,

    /// VU1 synchronization
    pub vu: &'a mut dyn VuSync,
}

/// One VIF channel: control state plus register image
#[derive(Debug, Clone)]
pub struct Vif {
    desc: ChannelDescriptor,
    state: ChannelState,
    regs: VifRegisters,
}

impl Vif {
    /// Create a channel in its power-on state
    pub fn new(id: VifId) -> Self {
        Self {
            desc: id.descriptor(),
            state: ChannelState::default(),
            regs: VifRegisters::default(),
        }
    }

    /// Channel descriptor
    pub fn descriptor(&self) -> &ChannelDescriptor {
        &self.desc
    }

    /// Control state
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Register image
    pub fn registers(&self) -> &VifRegisters {
        &self.regs
    }

    /// Current STAT value
    pub fn stat(&self) -> VifStat {
        self.regs.stat
    }

    /// Record the size of the GS download the VIF will reverse into
    pub fn set_last_download_size(&mut self, size: u32) {
        self.state.last_download_size = size;
    }

    /// Plain register store, used for caller writeback
    pub fn store(&mut self, offset: u32, value: u32) {
        self.regs.store(offset, value);
    }

    /// Zero the whole channel, mask registers included (emulator reset)
    pub fn reset(&mut self) {
        self.state = ChannelState::default();
        self.regs = VifRegisters::default();
        log::debug!("VIF{} power-on reset", self.desc.index);
    }

    /// Copy the channel for a save state
    pub fn snapshot(&self) -> VifSnapshot {
        VifSnapshot {
            channel: self.desc.index as u8,
            state: self.state.clone(),
            registers: self.regs.clone(),
        }
    }

    /// Restore a save state copy
    pub fn restore(&mut self, snapshot: VifSnapshot) {
        self.state = snapshot.state;
        self.regs = snapshot.registers;
    }
}
