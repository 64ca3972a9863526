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

//! System integration module
//!
//! Owns both VIF channels together with the pieces of the EE they reach into
//! (DMAC, DMA event scheduler, GIF status and the VU1 execution context), and
//! decodes physical addresses onto them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::config::EmulatorConfig;
use super::dma::Dmac;
use super::error::{EmulatorError, Result};
use super::gif::{self, Gif};
use super::timing::{DmaEvent, EventScheduler};
use super::vif::{ChannelDescriptor, Vif, VifId, VifPeers, VifSnapshot, WriteOutcome};
use super::vu::{InlineVu, VuSync, VuThread};

/// Save state for both VIF channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    /// VIF0 and VIF1, in channel order
    pub vifs: Vec<VifSnapshot>,
}

impl SystemSnapshot {
    /// Encode with the bincode standard configuration
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(
            self,
            bincode::config::standard(),
        )?)
    }

    /// Decode a snapshot produced by [`SystemSnapshot::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (snapshot, _) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(snapshot)
    }
}

/// PlayStation 2 VIF subsystem
///
/// # Components
/// - VIF0 / VIF1 control registers
/// - DMAC: channel control, D_CTRL and D_STAT
/// - Event scheduler for the VIF DMA events
/// - GIF status (PATH3 mask)
/// - VU1 synchronization (inline or threaded)
///
/// # Example
/// ```
/// use ps2vif::core::system::System;
///
/// let mut system = System::new();
/// system.write32(0x1000_3D00, 0x1234).unwrap(); // VIF1_R0
/// assert_eq!(system.read32(0x1000_3D00).unwrap(), 0x1234);
/// ```
pub struct System {
    /// VIF0 and VIF1
    vifs: [Vif; 2],
    /// DMA controller
    dmac: Dmac,
    /// DMA event scheduler
    scheduler: EventScheduler,
    /// GIF status
    gif: Gif,
    /// VU1 execution context
    vu1: Box<dyn VuSync>,
}

impl System {
    /// Create a system with VU1 running inline
    pub fn new() -> Self {
        Self::with_vu(Box::new(InlineVu))
    }

    /// Create a system around an existing VU1 adapter
    pub fn with_vu(vu1: Box<dyn VuSync>) -> Self {
        log::debug!("VIF system using {}", vu1.name());
        Self {
            vifs: [Vif::new(VifId::Vif0), Vif::new(VifId::Vif1)],
            dmac: Dmac::new(),
            scheduler: EventScheduler::new(),
            gif: Gif::new(),
            vu1,
        }
    }

    /// Create a system from configuration
    ///
    /// # Errors
    ///
    /// Returns [`EmulatorError::VuThread`] or [`EmulatorError::Io`] if the
    /// VU1 worker cannot be spawned.
    pub fn with_config(config: &EmulatorConfig) -> Result<Self> {
        let vu1: Box<dyn VuSync> = if config.threaded_vu1 {
            Box::new(VuThread::spawn()?)
        } else {
            Box::new(InlineVu)
        };
        Ok(Self::with_vu(vu1))
    }

    /// Split one channel away from its collaborators
    fn parts(&mut self, id: VifId) -> (&mut Vif, VifPeers<'_>) {
        let Self {
            vifs,
            dmac,
            scheduler,
            gif,
            vu1,
        } = self;
        (
            &mut vifs[id.index()],
            VifPeers {
                dmac,
                scheduler,
                gif,
                vu: vu1.as_mut(),
            },
        )
    }

    /// Write VIFn_FBRST
    pub fn handle_force_break_reset(&mut self, id: VifId, value: u32) {
        let (vif, mut peers) = self.parts(id);
        vif.write_fbrst(value, &mut peers);
    }

    /// Write VIF1_STAT (FIFO direction)
    pub fn handle_direction_toggle(&mut self, value: u32) {
        let (vif, mut peers) = self.parts(VifId::Vif1);
        vif.write_stat(value, &mut peers);
    }

    /// Read a VIF register by channel offset
    pub fn read_vif_register(&mut self, id: VifId, offset: u32) -> u32 {
        let Self { vifs, vu1, .. } = self;
        vifs[id.index()].read32(offset, vu1.as_mut())
    }

    /// Write a VIF register by channel offset
    ///
    /// The caller is responsible for storing `value` when the result is
    /// [`WriteOutcome::Writeback`].
    pub fn write_vif_register(&mut self, id: VifId, offset: u32, value: u32) -> WriteOutcome {
        let (vif, mut peers) = self.parts(id);
        vif.write32(offset, value, &mut peers)
    }

    fn decode_vif(address: u32) -> Option<(VifId, u32)> {
        VifId::ALL.into_iter().find_map(|id| {
            let desc: ChannelDescriptor = id.descriptor();
            desc.contains(address)
                .then(|| (id, address - desc.base_address))
        })
    }

    fn check_alignment(address: u32) -> Result<()> {
        if address & 3 != 0 {
            return Err(EmulatorError::UnalignedAccess { address, size: 4 });
        }
        Ok(())
    }

    /// Read a 32-bit register by physical address
    ///
    /// # Errors
    ///
    /// - [`EmulatorError::UnalignedAccess`] if `address` is not word aligned
    /// - [`EmulatorError::InvalidMemoryAccess`] if nothing decodes `address`
    pub fn read32(&mut self, address: u32) -> Result<u32> {
        Self::check_alignment(address)?;

        if let Some((id, offset)) = Self::decode_vif(address) {
            return Ok(self.read_vif_register(id, offset));
        }
        if address == gif::GIF_STAT {
            return Ok(self.gif.read_status());
        }
        if let Some(value) = self.dmac.read32(address) {
            return Ok(value);
        }

        log::warn!("Unmapped read32 at 0x{:08X}", address);
        Err(EmulatorError::InvalidMemoryAccess { address })
    }

    /// Write a 32-bit register by physical address
    ///
    /// VIF writes that the multiplexer hands back are stored into the
    /// register image here.
    ///
    /// # Errors
    ///
    /// - [`EmulatorError::UnalignedAccess`] if `address` is not word aligned
    /// - [`EmulatorError::InvalidMemoryAccess`] if nothing decodes `address`
    pub fn write32(&mut self, address: u32, value: u32) -> Result<()> {
        Self::check_alignment(address)?;

        if let Some((id, offset)) = Self::decode_vif(address) {
            if self.write_vif_register(id, offset, value) == WriteOutcome::Writeback {
                self.vifs[id.index()].store(offset, value);
            }
            return Ok(());
        }
        if address == gif::GIF_STAT {
            log::debug!("Ignoring write to read-only GIF_STAT: 0x{:08X}", value);
            return Ok(());
        }
        if self.dmac.write32(address, value) {
            return Ok(());
        }

        log::warn!("Unmapped write32 at 0x{:08X} = 0x{:08X}", address, value);
        Err(EmulatorError::InvalidMemoryAccess { address })
    }

    /// Record the size of the most recent GS local→host download
    pub fn set_gs_download_size(&mut self, size: u32) {
        self.vifs[VifId::Vif1.index()].set_last_download_size(size);
    }

    /// Power-on reset of one channel, mask registers included
    pub fn reset_vif(&mut self, id: VifId) {
        let (vif, peers) = self.parts(id);
        vif.reset();
        if vif.descriptor().vu_sync {
            peers.vu.publish_row([0; 4]);
            peers.vu.publish_col([0; 4]);
        }
    }

    /// Power-on reset of the whole subsystem
    ///
    /// The VU1 adapter is kept; its mask image is zeroed.
    pub fn reset(&mut self) {
        for id in VifId::ALL {
            self.reset_vif(id);
        }
        self.dmac = Dmac::new();
        self.scheduler = EventScheduler::new();
        self.gif = Gif::new();
        log::info!("VIF system reset");
    }

    /// Advance the event scheduler
    ///
    /// # Returns
    ///
    /// Events that became due, in bit order.
    pub fn step(&mut self, cycles: u32) -> Vec<DmaEvent> {
        let fired = self.scheduler.advance(cycles);
        for event in &fired {
            log::trace!("{} event fired", event.name());
        }
        fired
    }

    /// Copy both channels for a save state
    ///
    /// Mask registers shared with a threaded VU1 are refreshed first.
    pub fn snapshot(&mut self) -> SystemSnapshot {
        if self.vu1.is_threaded() {
            self.vu1.wait_for_quiescence();
            if let Some(masks) = self.vu1.committed_masks() {
                let mut vif1 = self.vifs[VifId::Vif1.index()].snapshot();
                vif1.state.masks = masks;
                return SystemSnapshot {
                    vifs: vec![self.vifs[VifId::Vif0.index()].snapshot(), vif1],
                };
            }
        }
        SystemSnapshot {
            vifs: self.vifs.iter().map(Vif::snapshot).collect(),
        }
    }

    /// Restore a save state
    ///
    /// # Errors
    ///
    /// Returns [`EmulatorError::InvalidChannel`] if the snapshot does not hold
    /// exactly VIF0 followed by VIF1.
    pub fn restore(&mut self, snapshot: SystemSnapshot) -> Result<()> {
        if snapshot.vifs.len() != self.vifs.len() {
            return Err(EmulatorError::InvalidChannel {
                index: snapshot.vifs.len(),
            });
        }
        for (index, vif) in snapshot.vifs.iter().enumerate() {
            if vif.channel as usize != index {
                return Err(EmulatorError::InvalidChannel {
                    index: vif.channel as usize,
                });
            }
        }

        for (vif, channel) in self.vifs.iter_mut().zip(snapshot.vifs) {
            vif.restore(channel);
        }
        let masks = self.vifs[VifId::Vif1.index()].state().masks;
        self.vu1.publish_row(masks.row);
        self.vu1.publish_col(masks.col);
        log::info!("VIF state restored");
        Ok(())
    }

    /// Write a save state file
    pub fn save_state<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = self.snapshot().to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a save state file
    pub fn load_state<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = std::fs::read(path)?;
        self.restore(SystemSnapshot::from_bytes(&bytes)?)
    }

    /// Get reference to a VIF channel
    pub fn vif(&self, id: VifId) -> &Vif {
        &self.vifs[id.index()]
    }

    /// Get reference to the DMAC
    pub fn dmac(&self) -> &Dmac {
        &self.dmac
    }

    /// Get mutable reference to the DMAC
    pub fn dmac_mut(&mut self) -> &mut Dmac {
        &mut self.dmac
    }

    /// Get reference to the event scheduler
    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    /// Get reference to the GIF
    pub fn gif(&self) -> &Gif {
        &self.gif
    }

    /// Get reference to the VU1 adapter
    pub fn vu1(&self) -> &dyn VuSync {
        self.vu1.as_ref()
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}
