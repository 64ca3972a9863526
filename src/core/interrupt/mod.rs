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

//! DMAC Interrupt Status Implementation
//!
//! The DMA controller reports channel completion through the D_STAT register.
//! The EE core sees an INT1 request whenever an unmasked status bit is set.
//!
//! ## Register
//!
//! - **D_STAT** (0x1000E010): DMAC interrupt status / mask register (R/W)
//!   - Bits 0-9 (CIS): channel interrupt status, writing 1 clears the bit
//!   - Bits 16-25 (CIM): channel interrupt mask, writing 1 toggles the bit
//!
//! ## Interrupt Sources (Bit Positions)
//!
//! ```text
//! Bit  | Source        | Description
//! -----|---------------|----------------------------------
//! 0    | VIF0          | VIF0 DMA transfer complete
//! 1    | VIF1          | VIF1 DMA transfer complete
//! 2    | GIF           | GIF DMA transfer complete
//! 3    | IPU_FROM      | IPU → memory transfer complete
//! 4    | IPU_TO        | memory → IPU transfer complete
//! 5-7  | SIF0-SIF2     | SIF transfers complete
//! 8    | SPR_FROM      | Scratchpad → memory transfer complete
//! 9    | SPR_TO        | memory → Scratchpad transfer complete
//! ```

/// DMAC channel interrupt bits
///
/// These constants represent the CIS bit positions in D_STAT for each channel.
pub mod interrupts {
    /// VIF0 transfer complete (bit 0)
    pub const VIF0: u32 = 1 << 0;

    /// VIF1 transfer complete (bit 1)
    pub const VIF1: u32 = 1 << 1;

    /// GIF transfer complete (bit 2)
    pub const GIF: u32 = 1 << 2;

}

/// DMAC interrupt status controller
///
/// Holds the CIS/CIM halves of D_STAT and keeps a running count of raised
/// interrupts so callers can tell how many completions were signalled.
///
/// # Example
///
/// ```
/// use ps2vif::core::interrupt::{DmacInterrupts, interrupts};
///
/// let mut irq = DmacInterrupts::new();
/// irq.raise(interrupts::VIF1);
///
/// // Unmask VIF1 (write 1 toggles CIM)
/// irq.write_status(interrupts::VIF1 << 16);
/// assert!(irq.is_pending());
///
/// // Acknowledge (write 1 clears CIS)
/// irq.write_status(interrupts::VIF1);
/// assert!(!irq.is_pending());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DmacInterrupts {
    /// CIS bits (0-9)
    status: u32,

    /// CIM bits, stored shifted down to bit 0
    mask: u32,

    /// Number of `raise` calls since creation
    raised: u64,
}

impl DmacInterrupts {
    const CHANNEL_BITS: u32 = 0x3FF;

    /// Create a new controller with every status and mask bit clear
    ///
    /// # Example
    ///
    /// ```
    /// use ps2vif::core::interrupt::DmacInterrupts;
    ///
    /// let irq = DmacInterrupts::new();
    /// assert_eq!(irq.read_status(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a channel completion interrupt
    ///
    /// # Arguments
    ///
    /// * `interrupt` - CIS bit(s) to set
    pub fn raise(&mut self, interrupt: u32) {
        self.status |= interrupt & Self::CHANNEL_BITS;
        self.raised += 1;
        log::trace!(
            "DMAC IRQ raised: 0x{:03X}, status=0x{:03X}",
            interrupt,
            self.status
        );
    }

    /// Check whether an interrupt bit is currently set in CIS
    pub fn is_raised(&self, interrupt: u32) -> bool {
        self.status & interrupt != 0
    }

    /// Total number of interrupts raised so far
    pub fn raised_count(&self) -> u64 {
        self.raised
    }

    /// Check if any unmasked interrupt is pending for the EE
    pub fn is_pending(&self) -> bool {
        (self.status & self.mask) != 0
    }

    /// Read D_STAT
    pub fn read_status(&self) -> u32 {
        self.status | (self.mask << 16)
    }

    /// Write D_STAT
    ///
    /// Lower half clears CIS bits written as 1, upper half toggles CIM bits
    /// written as 1.
    pub fn write_status(&mut self, value: u32) {
        self.status &= !(value & Self::CHANNEL_BITS);
        self.mask ^= (value >> 16) & Self::CHANNEL_BITS;
        log::trace!("D_STAT = 0x{:08X}", self.read_status());
    }
}
