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

//! VIF special-register multiplexer
//!
//! Routes 32-bit register accesses either to the control handlers, to the
//! VU-shared row/column registers, or back to the caller for a plain store.

use super::registers::{offsets, VifStat};
use super::{Vif, VifPeers};
use crate::core::vu::VuSync;

/// What the caller still has to do after [`Vif::write32`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The VIF consumed the write; nothing to store
    Handled,
    /// The caller must store the raw value into the register image
    Writeback,
}

/// Which filling register an offset addresses
enum FillLane {
    Row(usize),
    Col(usize),
}

fn fill_lane(offset: u32) -> Option<FillLane> {
    match offset {
        offsets::R0..=offsets::R3 if offset & 0xF == 0 => {
            Some(FillLane::Row(((offset - offsets::R0) >> 4) as usize))
        }
        offsets::C0..=offsets::C3 if offset & 0xF == 0 => {
            Some(FillLane::Col(((offset - offsets::C0) >> 4) as usize))
        }
        _ => None,
    }
}

impl Vif {
    /// Read a VIF register
    ///
    /// Row/column reads on a channel shared with a VU thread first wait for
    /// that thread to go quiet, then pick up whatever it committed.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset from the channel base
    /// * `vu` - VU1 synchronization
    pub fn read32(&mut self, offset: u32, vu: &mut dyn VuSync) -> u32 {
        let value = match fill_lane(offset) {
            Some(lane) => {
                if self.desc.vu_sync && vu.is_threaded() {
                    vu.wait_for_quiescence();
                    if let Some(masks) = vu.committed_masks() {
                        self.state.masks = masks;
                    }
                }
                match lane {
                    FillLane::Row(i) => self.state.masks.row[i],
                    FillLane::Col(i) => self.state.masks.col[i],
                }
            }
            None => self.regs.load(offset),
        };
        log::trace!(
            "VIF{} read32 +0x{:03X} -> 0x{:08X}",
            self.desc.index,
            offset,
            value
        );
        value
    }

    /// Write a VIF register
    ///
    /// # Returns
    ///
    /// [`WriteOutcome::Writeback`] when the caller must store `value` itself.
    pub fn write32(&mut self, offset: u32, value: u32, peers: &mut VifPeers<'_>) -> WriteOutcome {
        log::trace!(
            "VIF{} write32 +0x{:03X} = 0x{:08X}",
            self.desc.index,
            offset,
            value
        );

        if let Some(lane) = fill_lane(offset) {
            match lane {
                FillLane::Row(i) => {
                    self.state.masks.row[i] = value;
                    if self.desc.vu_sync {
                        peers.vu.publish_row(self.state.masks.row);
                    }
                }
                FillLane::Col(i) => {
                    self.state.masks.col[i] = value;
                    if self.desc.vu_sync {
                        peers.vu.publish_col(self.state.masks.col);
                    }
                }
            }
            return WriteOutcome::Handled;
        }

        match offset {
            offsets::FBRST => {
                self.write_fbrst(value, peers);
                WriteOutcome::Handled
            }
            offsets::STAT => {
                self.write_stat(value, peers);
                WriteOutcome::Handled
            }
            offsets::MARK => {
                log::debug!("VIF{}_MARK write32 0x{:08X}", self.desc.index, value);
                self.regs.stat.remove(VifStat::MRK);
                WriteOutcome::Writeback
            }
            _ => WriteOutcome::Writeback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{CountingVu, Harness};
    use super::super::{Fbrst, MaskRegisters, VifId};
    use super::*;
    use crate::core::vu::{InlineVu, VuThread};
    use std::sync::mpsc;

    #[test]
    fn test_mark_clears_mrk_and_requests_writeback() {
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif1);
        vif.regs.stat = VifStat::MRK | VifStat::VSS;

        let outcome = vif.write32(offsets::MARK, 0x1234, &mut h.peers());

        assert_eq!(outcome, WriteOutcome::Writeback);
        assert_eq!(vif.stat(), VifStat::VSS);
    }

    #[test]
    fn test_row_write_vif0_never_syncs() {
        let mut h = Harness::with_vu(Box::new(CountingVu::default()));
        let mut vif = Vif::new(VifId::Vif0);

        for (lane, offset) in [offsets::R0, offsets::R1, offsets::R2, offsets::R3]
            .into_iter()
            .enumerate()
        {
            let outcome = vif.write32(offset, 0x100 + lane as u32, &mut h.peers());
            assert_eq!(outcome, WriteOutcome::Handled);
        }
        assert_eq!(vif.state.masks.row, [0x100, 0x101, 0x102, 0x103]);

        let mut counting = CountingVu::default();
        assert_eq!(vif.read32(offsets::R2, &mut counting), 0x102);
        assert_eq!(counting.waits, 0);
        assert!(counting.rows.is_empty());
    }

    #[test]
    fn test_vif0_write_does_not_publish() {
        let mut counting = CountingVu::default();
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif0);
        {
            let mut peers = h.peers();
            peers.vu = &mut counting;
            vif.write32(offsets::C1, 9, &mut peers);
            vif.write32(offsets::R3, 9, &mut peers);
        }
        assert!(counting.rows.is_empty());
        assert!(counting.cols.is_empty());
        assert_eq!(counting.waits, 0);
    }

    #[test]
    fn test_vif1_mask_writes_publish_full_register() {
        let mut counting = CountingVu::default();
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif1);
        {
            let mut peers = h.peers();
            peers.vu = &mut counting;
            vif.write32(offsets::R1, 0xAA, &mut peers);
            vif.write32(offsets::C3, 0xBB, &mut peers);
        }
        assert_eq!(counting.rows, vec![[0, 0xAA, 0, 0]]);
        assert_eq!(counting.cols, vec![[0, 0, 0, 0xBB]]);
    }

    #[test]
    fn test_vif1_mask_read_waits_only_when_threaded() {
        let mut vif = Vif::new(VifId::Vif1);
        vif.state.masks.col[0] = 5;

        let mut counting = CountingVu::default();
        vif.read32(offsets::C0, &mut counting);
        assert_eq!(counting.waits, 1);

        let mut inline = InlineVu;
        assert_eq!(vif.read32(offsets::C0, &mut inline), 5);
    }

    #[test]
    fn test_non_mask_read_never_waits() {
        let mut vif = Vif::new(VifId::Vif1);
        let mut counting = CountingVu::default();
        vif.read32(offsets::STAT, &mut counting);
        vif.read32(offsets::MODE, &mut counting);
        assert_eq!(counting.waits, 0);
    }

    #[test]
    fn test_fbrst_and_stat_handled_internally() {
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif1);
        assert_eq!(
            vif.write32(offsets::FBRST, Fbrst::STP.bits(), &mut h.peers()),
            WriteOutcome::Handled
        );
        assert!(vif.stat().contains(VifStat::VSS));
        assert_eq!(
            vif.write32(offsets::STAT, VifStat::FDR.bits(), &mut h.peers()),
            WriteOutcome::Handled
        );
        assert!(vif.stat().contains(VifStat::FDR));
    }

    #[test]
    fn test_vif0_stat_write_swallowed() {
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif0);
        assert_eq!(
            vif.write32(offsets::STAT, 0xFFFF_FFFF, &mut h.peers()),
            WriteOutcome::Handled
        );
        assert_eq!(vif.stat(), VifStat::empty());
    }

    #[test]
    fn test_pass_through_offsets() {
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif1);
        for offset in [offsets::ERR, offsets::MODE, offsets::CYCLE, offsets::ITOPS, 0x104] {
            assert_eq!(
                vif.write32(offset, 1, &mut h.peers()),
                WriteOutcome::Writeback,
                "offset 0x{:03X}",
                offset
            );
        }
    }

    #[test]
    fn test_threaded_vu_read_sees_vu_side_write() {
        let mut thread = VuThread::spawn().unwrap();
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif1);
        {
            let mut peers = h.peers();
            peers.vu = &mut thread;
            vif.write32(offsets::R0, 0x11, &mut peers);
        }
        thread.run(|ctx| ctx.masks.row[1] = 0x22).unwrap();

        assert_eq!(vif.read32(offsets::R1, &mut thread), 0x22);
        assert_eq!(vif.read32(offsets::R0, &mut thread), 0x11);
        assert_eq!(thread.completed(), thread.submitted());
    }

    #[test]
    fn test_interleaved_vu_and_control_writes_never_read_stale() {
        const ROWS: [u32; 4] = [offsets::R0, offsets::R1, offsets::R2, offsets::R3];
        const COLS: [u32; 4] = [offsets::C0, offsets::C1, offsets::C2, offsets::C3];

        let mut thread = VuThread::spawn().unwrap();
        let mut h = Harness::new();
        let mut vif = Vif::new(VifId::Vif1);
        let mut expected = MaskRegisters::default();
        let (tx, rx) = mpsc::channel();

        for i in 1..=500u32 {
            let lane = (i % 4) as usize;
            let vu_lane = (lane + 1) % 4;

            {
                let mut peers = h.peers();
                peers.vu = &mut thread;
                vif.write32(ROWS[lane], i, &mut peers);
            }
            expected.row[lane] = i;

            // VU1 reads the control write, then writes lanes of its own
            let tx = tx.clone();
            thread
                .run(move |ctx| {
                    tx.send((i, ctx.masks.row[lane])).unwrap();
                    ctx.masks.row[vu_lane] = i << 8;
                    ctx.masks.col[lane] = !i;
                })
                .unwrap();
            expected.row[vu_lane] = i << 8;
            expected.col[lane] = !i;

            for k in 0..4 {
                assert_eq!(
                    vif.read32(ROWS[k], &mut thread),
                    expected.row[k],
                    "row {} after step {}",
                    k,
                    i
                );
                assert_eq!(thread.completed(), thread.submitted());
                assert_eq!(
                    vif.read32(COLS[k], &mut thread),
                    expected.col[k],
                    "col {} after step {}",
                    k,
                    i
                );
                assert_eq!(thread.completed(), thread.submitted());
            }
        }
        drop(tx);

        let observed: Vec<(u32, u32)> = rx.iter().collect();
        assert_eq!(observed.len(), 500);
        for (written, seen) in observed {
            assert_eq!(written, seen, "VU1 saw a stale row lane");
        }
    }
}
