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

//! VIF1_STAT writes: FIFO direction reversal
//!
//! FDR is the only CPU-writable STAT bit. Reversing the FIFO while a transfer
//! is still in flight ends that transfer first, raising the completion
//! interrupt software waits on.

use super::registers::VifStat;
use super::{Vif, VifPeers};

impl Vif {
    /// Largest FQC value reported after reversing to VIF → memory
    pub const FQC_MAX: u32 = 16;

    /// Write VIFn_STAT
    ///
    /// Only FDR is honoured; VIF0 ignores the write entirely.
    pub fn write_stat(&mut self, value: u32, peers: &mut VifPeers<'_>) {
        log::debug!("VIF{}_STAT write32 0x{:08X}", self.desc.index, value);

        if !self.desc.direction_control {
            log::trace!("VIF{}_STAT is read-only", self.desc.index);
            return;
        }

        let reverse = VifStat::from_bits_retain(value).contains(VifStat::FDR);
        let ch = self.desc.dma_channel;

        if self.regs.stat.contains(VifStat::FDR) != reverse {
            let stalled = self
                .regs
                .stat
                .intersects(VifStat::INT | VifStat::STALL_SOURCES);
            let qwc = peers.dmac.channel(ch).qwc();
            if stalled {
                log::debug!(
                    "VIF{} direction change while stalled: done={} qwc={} stat=0x{:08X}",
                    self.desc.index,
                    self.state.done,
                    qwc,
                    self.regs.stat.bits()
                );
            }

            if qwc > 0 || !stalled {
                if peers.dmac.channel(ch).is_running() {
                    let dma = peers.dmac.channel_mut(ch);
                    dma.set_qwc(0);
                    dma.set_running(false);
                    peers.dmac.raise_interrupt(ch);
                }
                peers.scheduler.cancel(self.desc.dma_event);
                if let Some(event) = self.desc.mfifo_event() {
                    peers.scheduler.cancel(event);
                }
            }
        }

        self.regs.stat.set(VifStat::FDR, reverse);

        if reverse {
            // The GS starts buffering as soon as TRXDIR is written
            let fqc = self.state.last_download_size.min(Self::FQC_MAX);
            self.regs.stat.set_fqc(fqc);
        } else {
            self.regs.stat.set_fqc(0);
            if peers.dmac.channel(ch).is_running() {
                peers.scheduler.schedule(self.desc.dma_event, 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::super::VifId;
    use super::*;
    use crate::core::dma::Dmac;
    use crate::core::interrupt::interrupts;
    use crate::core::timing::DmaEvent;

    fn reverse(vif: &mut Vif, h: &mut Harness) {
        vif.write_stat(VifStat::FDR.bits(), &mut h.peers());
    }

    #[test]
    fn test_fqc_capped_at_sixteen() {
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif1);
        vif.set_last_download_size(20);
        reverse(&mut vif, &mut h);
        assert!(vif.stat().contains(VifStat::FDR));
        assert_eq!(vif.stat().fqc(), 16);
    }

    #[test]
    fn test_fqc_follows_small_download() {
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif1);
        vif.set_last_download_size(3);
        reverse(&mut vif, &mut h);
        assert_eq!(vif.stat().fqc(), 3);
    }

    #[test]
    fn test_reverse_with_outstanding_transfer_raises_once() {
        let mut h = Harness::new();
        h.dmac.channel_mut(Dmac::CH_VIF1).set_running(true);
        h.dmac.channel_mut(Dmac::CH_VIF1).set_qwc(8);
        h.scheduler.schedule(DmaEvent::Vif1, 100);
        h.scheduler.schedule(DmaEvent::MfifoVif, 100);
        let mut vif = Vif::new(VifId::Vif1);
        vif.regs.stat = VifStat::VSS | VifStat::INT;

        reverse(&mut vif, &mut h);

        assert_eq!(h.dmac.interrupts().raised_count(), 1);
        assert!(h.dmac.interrupts().is_raised(interrupts::VIF1));
        assert!(!h.dmac.channel(Dmac::CH_VIF1).is_running());
        assert_eq!(h.dmac.channel(Dmac::CH_VIF1).qwc(), 0);
        assert_eq!(h.scheduler.pending_mask(), 0);
    }

    #[test]
    fn test_reverse_while_stalled_and_drained_keeps_dma() {
        let mut h = Harness::new();
        h.dmac.channel_mut(Dmac::CH_VIF1).set_running(true);
        h.scheduler.schedule(DmaEvent::Vif1, 100);
        let mut vif = Vif::new(VifId::Vif1);
        vif.regs.stat = VifStat::VIS;

        reverse(&mut vif, &mut h);

        assert_eq!(h.dmac.interrupts().raised_count(), 0);
        assert!(h.dmac.channel(Dmac::CH_VIF1).is_running());
        assert!(h.scheduler.is_scheduled(DmaEvent::Vif1));
        assert!(vif.stat().contains(VifStat::FDR | VifStat::VIS));
    }

    #[test]
    fn test_reverse_idle_channel_only_cancels_events() {
        let mut h = Harness::new();
        h.scheduler.schedule(DmaEvent::MfifoVif, 4);
        let mut vif = Vif::new(VifId::Vif1);

        reverse(&mut vif, &mut h);

        assert_eq!(h.dmac.interrupts().raised_count(), 0);
        assert!(!h.scheduler.is_scheduled(DmaEvent::MfifoVif));
    }

    #[test]
    fn test_back_to_memory_direction_reschedules() {
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif1);
        vif.set_last_download_size(5);
        reverse(&mut vif, &mut h);

        // The game restarts DMA in the reversed direction, then flips back
        h.dmac.channel_mut(Dmac::CH_VIF1).set_running(true);
        vif.regs.stat.insert(VifStat::VIS);
        vif.write_stat(0, &mut h.peers());

        assert!(!vif.stat().contains(VifStat::FDR));
        assert_eq!(vif.stat().fqc(), 0);
        assert_eq!(h.scheduler.delay_of(DmaEvent::Vif1), Some(0));
    }

    #[test]
    fn test_non_fdr_bits_ignored() {
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif1);
        vif.write_stat(!VifStat::FDR.bits(), &mut h.peers());
        assert_eq!(vif.stat(), VifStat::empty());
        assert_eq!(h.scheduler.pending_mask(), 0);
    }

    #[test]
    fn test_vif0_stat_is_read_only() {
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif0);
        vif.set_last_download_size(10);
        reverse(&mut vif, &mut h);
        assert_eq!(vif.stat(), VifStat::empty());
    }
}
