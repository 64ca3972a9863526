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

//! DMAC (Direct Memory Access Controller) register model
//!
//! This module models the parts of the PlayStation 2 DMA controller that the
//! VIF control registers observe and manipulate. The transfer engine that
//! actually streams quadwords is not part of this core.
//!
//! # DMA Channels
//!
//! | Channel | Device      | Base Address |
//! |---------|-------------|--------------|
//! | 0       | VIF0        | 0x10008000   |
//! | 1       | VIF1        | 0x10009000   |
//! | 2       | GIF         | 0x1000A000   |
//! | 3       | IPU_FROM    | 0x1000B000   |
//! | 4       | IPU_TO      | 0x1000B400   |
//! | 5       | SIF0        | 0x1000C000   |
//! | 6       | SIF1        | 0x1000C400   |
//! | 7       | SIF2        | 0x1000C800   |
//! | 8       | SPR_FROM    | 0x1000D000   |
//! | 9       | SPR_TO      | 0x1000D400   |
//!
//! # Channel Registers
//!
//! - **CHCR** (+0x00): Channel control register
//! - **MADR** (+0x10): Memory address register
//! - **QWC** (+0x20): Quadword count
//! - **TADR** (+0x30): Tag address register
//!
//! # Global Registers
//!
//! - **D_CTRL** (0x1000E000): DMAC control (enable, MFIFO drain channel, ...)
//! - **D_STAT** (0x1000E010): DMAC interrupt status, see [`crate::core::interrupt`]

use crate::core::interrupt::DmacInterrupts;

/// Destination of the MFIFO drain (D_CTRL.MFD, bits 2-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfifoDrain {
    /// MFIFO disabled
    None,
    /// Reserved encoding, behaves like `None`
    Reserved,
    /// MFIFO drains into VIF1
    Vif1,
    /// MFIFO drains into GIF
    Gif,
}

/// Single DMA channel register block
#[derive(Debug, Clone, Default)]
pub struct DmaChannel {
    /// Channel Control Register (CHCR)
    ///
    /// - Bit 0: Direction (0=to memory, 1=from memory)
    /// - Bits 2-3: Mode (0=normal, 1=chain, 2=interleave)
    /// - Bits 4-5: Address stack pointer
    /// - Bit 6: Tag transfer enable
    /// - Bit 7: Tag interrupt enable
    /// - Bit 8: Start/busy flag (STR)
    /// - Bits 16-31: Last tag read
    chcr: u32,

    /// Memory Address Register (MADR)
    madr: u32,

    /// Quadword count (QWC), 16 bits
    qwc: u32,

    /// Tag Address Register (TADR)
    tadr: u32,

    /// Channel ID (0-9)
    channel_id: u8,
}

impl DmaChannel {
    const CHCR_STR: u32 = 1 << 8;

    fn new(channel_id: u8) -> Self {
        Self {
            channel_id,
            ..Self::default()
        }
    }

    /// Check if the channel is running (CHCR.STR)
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        (self.chcr & Self::CHCR_STR) != 0
    }

    /// Set or clear CHCR.STR
    pub fn set_running(&mut self, running: bool) {
        if running {
            self.chcr |= Self::CHCR_STR;
        } else {
            self.chcr &= !Self::CHCR_STR;
            log::trace!("DMA channel {} stopped", self.channel_id);
        }
    }

    /// Remaining quadword count
    #[inline(always)]
    pub fn qwc(&self) -> u32 {
        self.qwc
    }

    /// Overwrite the quadword count
    pub fn set_qwc(&mut self, qwc: u32) {
        self.qwc = qwc & 0xFFFF;
    }

    /// Read a channel register by offset from the channel base
    pub fn read(&self, offset: u32) -> u32 {
        match offset {
            0x00 => self.chcr,
            0x10 => self.madr,
            0x20 => self.qwc,
            0x30 => self.tadr,
            _ => 0,
        }
    }

    /// Write a channel register by offset from the channel base
    pub fn write(&mut self, offset: u32, value: u32) {
        match offset {
            0x00 => self.chcr = value,
            0x10 => self.madr = value & 0x7FFF_FFF0,
            0x20 => self.qwc = value & 0xFFFF,
            0x30 => self.tadr = value & 0x7FFF_FFF0,
            _ => {
                log::warn!(
                    "DMA{} write to unknown register +0x{:02X}",
                    self.channel_id,
                    offset
                );
                return;
            }
        }
        log::trace!(
            "DMA{} +0x{:02X} = 0x{:08X}",
            self.channel_id,
            offset,
            value
        );
    }
}

/// DMA controller with 10 channels
///
/// # Examples
///
/// ```
/// use ps2vif::core::dma::{Dmac, MfifoDrain};
///
/// let mut dmac = Dmac::new();
/// dmac.write_control(0b1001);
/// assert_eq!(dmac.mfifo_drain(), MfifoDrain::Vif1);
/// ```
#[derive(Debug, Clone)]
pub struct Dmac {
    channels: [DmaChannel; 10],

    /// D_CTRL
    control: u32,

    /// D_STAT
    interrupts: DmacInterrupts,
}

impl Dmac {
    /// Channel 0: VIF0
    pub const CH_VIF0: usize = 0;

    /// Channel 1: VIF1
    pub const CH_VIF1: usize = 1;

    /// Base address of the channel register blocks
    pub const CHANNEL_BASES: [u32; 10] = [
        0x1000_8000,
        0x1000_9000,
        0x1000_A000,
        0x1000_B000,
        0x1000_B400,
        0x1000_C000,
        0x1000_C400,
        0x1000_C800,
        0x1000_D000,
        0x1000_D400,
    ];

    /// D_CTRL address
    pub const D_CTRL: u32 = 0x1000_E000;

    /// D_STAT address
    pub const D_STAT: u32 = 0x1000_E010;

    /// Create a DMAC with every channel idle
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|i| DmaChannel::new(i as u8)),
            control: 0,
            interrupts: DmacInterrupts::new(),
        }
    }

    /// Borrow a channel
    pub fn channel(&self, index: usize) -> &DmaChannel {
        &self.channels[index]
    }

    /// Mutably borrow a channel
    pub fn channel_mut(&mut self, index: usize) -> &mut DmaChannel {
        &mut self.channels[index]
    }

    /// Raise the completion interrupt of a channel
    pub fn raise_interrupt(&mut self, index: usize) {
        log::debug!("DMAC channel {} completion interrupt", index);
        self.interrupts.raise(1 << index);
    }

    /// Interrupt status block
    pub fn interrupts(&self) -> &DmacInterrupts {
        &self.interrupts
    }

    /// Current MFIFO drain destination (D_CTRL.MFD)
    pub fn mfifo_drain(&self) -> MfifoDrain {
        match (self.control >> 2) & 3 {
            0 => MfifoDrain::None,
            1 => MfifoDrain::Reserved,
            2 => MfifoDrain::Vif1,
            _ => MfifoDrain::Gif,
        }
    }

    /// Read D_CTRL
    pub fn read_control(&self) -> u32 {
        self.control
    }

    /// Write D_CTRL
    pub fn write_control(&mut self, value: u32) {
        self.control = value;
        log::trace!("D_CTRL = 0x{:08X}", value);
    }

    /// Check whether `address` falls into a DMAC register block
    pub fn contains(address: u32) -> bool {
        Self::decode(address).is_some() || address == Self::D_CTRL || address == Self::D_STAT
    }

    fn decode(address: u32) -> Option<(usize, u32)> {
        Self::CHANNEL_BASES
            .iter()
            .position(|&base| address >= base && address < base + 0x40)
            .map(|index| (index, address - Self::CHANNEL_BASES[index]))
    }

    /// Read a DMAC register by physical address
    pub fn read32(&self, address: u32) -> Option<u32> {
        match address {
            Self::D_CTRL => Some(self.control),
            Self::D_STAT => Some(self.interrupts.read_status()),
            _ => Self::decode(address).map(|(ch, offset)| self.channels[ch].read(offset)),
        }
    }

    /// Write a DMAC register by physical address
    ///
    /// Returns `false` if the address is not decoded by the DMAC.
    pub fn write32(&mut self, address: u32, value: u32) -> bool {
        match address {
            Self::D_CTRL => self.write_control(value),
            Self::D_STAT => self.interrupts.write_status(value),
            _ => match Self::decode(address) {
                Some((ch, offset)) => self.channels[ch].write(offset, value),
                None => return false,
            },
        }
        true
    }
}

impl Default for Dmac {
    fn default() -> Self {
        Self::new()
    }
}
