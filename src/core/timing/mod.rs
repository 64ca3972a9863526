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

//! DMA event scheduler
//!
//! The EE keeps one pending bit per DMA event source together with a cycle
//! countdown. Peripherals request a re-evaluation of a channel with
//! [`EventScheduler::schedule`] (a delay of 0 means "at the next opportunity")
//! and the system drains due events with [`EventScheduler::advance`].
//!
//! The VIF core never runs the DMA engine itself; it only schedules and cancels
//! these events.

use serde::{Deserialize, Serialize};

/// DMA event sources relevant to the VIF channels
///
/// The discriminant is the bit position in the pending mask, matching the
/// EE interrupt slot numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DmaEvent {
    /// VIF0 direct DMA
    Vif0 = 0,
    /// VIF1 direct DMA
    Vif1 = 1,
    /// VIF1 DMA routed through the MFIFO ring
    MfifoVif = 10,
}

impl DmaEvent {
    /// All events, in bit order
    pub const ALL: [DmaEvent; 3] = [DmaEvent::Vif0, DmaEvent::Vif1, DmaEvent::MfifoVif];

    /// Bit of this event in [`EventScheduler::pending_mask`]
    #[inline(always)]
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Human readable event name for logging
    pub fn name(self) -> &'static str {
        match self {
            DmaEvent::Vif0 => "VIF0 DMA",
            DmaEvent::Vif1 => "VIF1 DMA",
            DmaEvent::MfifoVif => "MFIFO VIF DMA",
        }
    }
}

/// Pending DMA event table
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    /// One bit per pending [`DmaEvent`]
    pending: u32,

    /// Remaining cycles per event slot
    countdown: [u32; 32],

    /// Total number of `schedule` calls, for diagnostics and tests
    scheduled_total: u64,
}

impl EventScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a re-evaluation of `event` after `cycles` cycles
    ///
    /// Rescheduling an already pending event replaces its countdown.
    pub fn schedule(&mut self, event: DmaEvent, cycles: u32) {
        self.pending |= event.bit();
        self.countdown[event as usize] = cycles;
        self.scheduled_total += 1;
        log::trace!("{} scheduled in {} cycles", event.name(), cycles);
    }

    /// Drop a pending event, if any
    pub fn cancel(&mut self, event: DmaEvent) {
        if self.pending & event.bit() != 0 {
            log::trace!("{} cancelled", event.name());
        }
        self.pending &= !event.bit();
        self.countdown[event as usize] = 0;
    }

    /// Check whether `event` is pending
    pub fn is_scheduled(&self, event: DmaEvent) -> bool {
        self.pending & event.bit() != 0
    }

    /// Remaining cycles for `event`, or `None` if it is not pending
    pub fn delay_of(&self, event: DmaEvent) -> Option<u32> {
        self.is_scheduled(event)
            .then(|| self.countdown[event as usize])
    }

    /// Raw pending mask
    pub fn pending_mask(&self) -> u32 {
        self.pending
    }

    /// Number of schedule requests since creation
    pub fn scheduled_total(&self) -> u64 {
        self.scheduled_total
    }

    /// Advance time by `cycles` and return the events that became due
    ///
    /// Due events are removed from the pending set. Events are returned in
    /// bit order.
    pub fn advance(&mut self, cycles: u32) -> Vec<DmaEvent> {
        let mut due = Vec::new();
        for event in DmaEvent::ALL {
            if !self.is_scheduled(event) {
                continue;
            }
            let slot = &mut self.countdown[event as usize];
            *slot = slot.saturating_sub(cycles);
            if *slot == 0 {
                self.pending &= !event.bit();
                due.push(event);
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_cancel() {
        let mut sched = EventScheduler::new();
        sched.schedule(DmaEvent::Vif1, 0);
        assert!(sched.is_scheduled(DmaEvent::Vif1));
        assert_eq!(sched.delay_of(DmaEvent::Vif1), Some(0));

        sched.cancel(DmaEvent::Vif1);
        assert!(!sched.is_scheduled(DmaEvent::Vif1));
        assert_eq!(sched.delay_of(DmaEvent::Vif1), None);
    }

    #[test]
    fn test_pending_mask_bit_positions() {
        let mut sched = EventScheduler::new();
        sched.schedule(DmaEvent::Vif0, 4);
        sched.schedule(DmaEvent::MfifoVif, 4);
        assert_eq!(sched.pending_mask(), (1 << 0) | (1 << 10));
    }

    #[test]
    fn test_advance_releases_due_events() {
        let mut sched = EventScheduler::new();
        sched.schedule(DmaEvent::Vif0, 0);
        sched.schedule(DmaEvent::Vif1, 8);

        assert_eq!(sched.advance(0), vec![DmaEvent::Vif0]);
        assert!(sched.advance(4).is_empty());
        assert_eq!(sched.advance(4), vec![DmaEvent::Vif1]);
        assert_eq!(sched.pending_mask(), 0);
    }

    #[test]
    fn test_cancel_unscheduled_is_noop() {
        let mut sched = EventScheduler::new();
        sched.cancel(DmaEvent::MfifoVif);
        assert_eq!(sched.pending_mask(), 0);
        assert_eq!(sched.scheduled_total(), 0);
    }
}
