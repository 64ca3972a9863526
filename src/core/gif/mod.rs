// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! GIF status peer
//!
//! Only the slice of the GIF that VIF1 touches is modelled here: the PATH3
//! mask status bit (GIF_STAT.M3P), which VIF1 sets through MSKPATH3 and
//! clears on an FBRST reset.

/// GIF_STAT register address
pub const GIF_STAT: u32 = 0x1000_3020;

/// GIF status register
#[derive(Debug, Clone, Default)]
pub struct Gif {
    /// GIF_STAT
    ///
    /// - Bit 0: M3R, PATH3 masked by GIF_MODE
    /// - Bit 1: M3P, PATH3 masked by VIF1 MSKPATH3
    /// - Bit 2: IMT, intermittent mode
    /// - Bit 12: DIR, transfer direction
    stat: u32,
}

impl Gif {
    const STAT_M3P: u32 = 1 << 1;

    /// Create a GIF with all status bits clear
    pub fn new() -> Self {
        Self::default()
    }

    /// Read GIF_STAT
    pub fn read_status(&self) -> u32 {
        self.stat
    }

    /// Whether PATH3 is masked through VIF1
    pub fn is_path3_masked(&self) -> bool {
        self.stat & Self::STAT_M3P != 0
    }

    /// Set or clear GIF_STAT.M3P
    pub fn set_path3_masked(&mut self, masked: bool) {
        if masked {
            self.stat |= Self::STAT_M3P;
        } else {
            self.stat &= !Self::STAT_M3P;
        }
        log::trace!("GIF_STAT.M3P = {}", masked);
    }
}
