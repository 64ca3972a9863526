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

//! VIFn_FBRST handling
//!
//! A single FBRST write may carry up to four requests. They are always
//! processed as force break, stop, stall cancel, reset, so that a reset in
//! the same write sees the flags the earlier requests left behind.

use super::registers::{Fbrst, VifPipelineState, VifStat};
use super::state::{ChannelState, StallCause};
use super::{Vif, VifPeers};
use crate::core::dma::{Dmac, MfifoDrain};

impl Vif {
    /// Write VIFn_FBRST
    ///
    /// # Arguments
    ///
    /// * `value` - Raw register value; bits 0-3 are RST, FBK, STP, STC
    /// * `peers` - DMAC, scheduler, GIF and VU1 collaborators
    pub fn write_fbrst(&mut self, value: u32, peers: &mut VifPeers<'_>) {
        log::debug!("VIF{}_FBRST write32 0x{:08X}", self.desc.index, value);
        let request = Fbrst::from_bits_truncate(value);

        if request.contains(Fbrst::FBK) {
            self.force_break(peers);
        }
        if request.contains(Fbrst::STP) {
            self.stop(peers.dmac);
        }
        if request.contains(Fbrst::STC) {
            self.cancel_stall(peers);
        }
        if request.contains(Fbrst::RST) {
            self.reset_channel(peers);
        }
    }

    fn force_break(&mut self, peers: &mut VifPeers<'_>) {
        self.regs.stat.insert(VifStat::VFS);
        self.regs.stat.set_vps(VifPipelineState::Idle);

        peers.scheduler.cancel(self.desc.dma_event);
        if let Some(event) = self.desc.mfifo_event() {
            peers.scheduler.cancel(event);
        }

        // VIF0 never latches a stall here; its VU runs on the control thread.
        if self.desc.vu_sync {
            self.latch_stall(peers.dmac);
        }

        log::info!("VIF{} force break", self.desc.index);
    }

    fn stop(&mut self, dmac: &Dmac) {
        self.regs.stat.insert(VifStat::VSS);
        self.regs.stat.set_vps(VifPipelineState::Idle);
        self.latch_stall(dmac);
        log::debug!("VIF{} stop", self.desc.index);
    }

    fn latch_stall(&mut self, dmac: &Dmac) {
        self.state.stall_pending = dmac.channel(self.desc.dma_channel).is_running();
        self.state.stall_cause = StallCause::IrqStall;
    }

    fn cancel_stall(&mut self, peers: &mut VifPeers<'_>) {
        let cancel = self.regs.stat.intersects(VifStat::STALL_SOURCES);

        self.regs.stat.remove(
            VifStat::VSS
                | VifStat::VFS
                | VifStat::VIS
                | VifStat::INT
                | VifStat::ER0
                | VifStat::ER1,
        );

        if !cancel {
            log::debug!("VIF{} stall cancel with no stall", self.desc.index);
            return;
        }

        self.state.cycles = 0;

        let running = peers.dmac.channel(self.desc.dma_channel).is_running();
        if !running || self.regs.stat.contains(VifStat::FDR) {
            return;
        }

        let event = match (self.desc.mfifo_event(), peers.dmac.mfifo_drain()) {
            (Some(mfifo), MfifoDrain::Vif1) => mfifo,
            _ => self.desc.dma_event,
        };
        log::debug!(
            "VIF{} stall cancelled, resuming via {}",
            self.desc.index,
            event.name()
        );
        peers.scheduler.schedule(event, 0);
    }

    fn reset_channel(&mut self, peers: &mut VifPeers<'_>) {
        let masks = self.state.masks;
        let mfifo_empty = self.state.in_progress & ChannelState::IN_PROGRESS_MFIFO_EMPTY;

        self.state = ChannelState {
            masks,
            ..ChannelState::default()
        };

        let dma = peers.dmac.channel_mut(self.desc.dma_channel);
        dma.set_qwc(0);
        dma.set_running(false);
        peers.scheduler.cancel(self.desc.dma_event);

        self.regs.fifo_shadow = [0; 4];
        self.regs.err = Default::default();

        if self.desc.direction_control {
            if self.regs.mskpath3 {
                log::debug!("VIF{} reset while PATH3 masked", self.desc.index);
            }
            self.regs.mskpath3 = false;
            peers.gif.set_path3_masked(false);
            self.state.in_progress = mfifo_empty;
            self.regs.stat = VifStat::empty();
        } else {
            self.regs.stat.remove(
                VifStat::FQC
                    | VifStat::INT
                    | VifStat::VSS
                    | VifStat::VIS
                    | VifStat::VFS
                    | VifStat::VPS,
            );
        }

        log::info!("VIF{} reset", self.desc.index);
    }
}
