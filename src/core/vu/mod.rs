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

//! VU1 synchronization
//!
//! VU1 may execute on its own thread. The VIF1 row/column filling registers
//! are read by VU1-side unpacks, so every control-side write has to be
//! forwarded to that thread and every control-side read has to wait until the
//! thread has drained its queue.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  publish_row / publish_col  ┌──────────────────┐
//! │  control thread  │ ──────────────────────────▶ │   VU1 thread     │
//! │  (VIF registers) │                             │  (VuContext)     │
//! │                  │ ◀────────────────────────── │                  │
//! └──────────────────┘  wait_for_quiescence +      └──────────────────┘
//!                       committed_masks
//! ```
//!
//! [`InlineVu`] is used when VU1 runs on the control thread; every operation
//! is a no-op.

mod thread;

pub use thread::{VuContext, VuThread};

use crate::core::vif::MaskRegisters;

/// Synchronization seam between the VIF registers and the VU1 execution context
pub trait VuSync {
    /// Whether VU1 executes on an independent thread
    fn is_threaded(&self) -> bool;

    /// Block until the VU1 context has processed everything submitted so far
    ///
    /// Never times out.
    fn wait_for_quiescence(&mut self);

    /// Forward a row register update to the VU1 context
    fn publish_row(&mut self, row: [u32; 4]);

    /// Forward a column register update to the VU1 context
    fn publish_col(&mut self, col: [u32; 4]);

    /// Mask image as last committed by the VU1 context
    ///
    /// Only meaningful right after [`VuSync::wait_for_quiescence`]. Returns
    /// `None` when there is no independent context.
    fn committed_masks(&self) -> Option<MaskRegisters> {
        None
    }

    /// Optional: Name for debugging
    fn name(&self) -> &str {
        "VU1"
    }
}

/// VU1 running on the control thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineVu;

impl VuSync for InlineVu {
    fn is_threaded(&self) -> bool {
        false
    }

    fn wait_for_quiescence(&mut self) {}

    fn publish_row(&mut self, _row: [u32; 4]) {}

    fn publish_col(&mut self, _col: [u32; 4]) {}

    fn name(&self) -> &str {
        "VU1 (inline)"
    }
}
