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

//! ps2vif: PlayStation 2 VIF control-register core
//!
//! This crate emulates the control side of the two PS2 VPU interfaces
//! (VIF0 and VIF1): force break, stop, stall cancel and reset through FBRST,
//! FIFO direction reversal through STAT, and the row/column filling
//! registers VIF1 shares with a possibly threaded VU1.
//!
//! # Architecture
//!
//! - [`core::vif`]: VIF channels and their register handlers
//! - [`core::dma`]: DMAC channels, D_CTRL and D_STAT
//! - [`core::timing`]: DMA event scheduler
//! - [`core::vu`]: VU1 synchronization (inline or threaded)
//! - [`core::system`]: System context and physical address decoding
//! - [`core::config`]: Configuration loading
//!
//! # Example
//!
//! ```
//! use ps2vif::core::system::System;
//! use ps2vif::core::vif::{Fbrst, VifId, VifStat};
//!
//! let mut system = System::new();
//! system.handle_force_break_reset(VifId::Vif1, Fbrst::FBK.bits());
//! assert!(system.vif(VifId::Vif1).stat().contains(VifStat::VFS));
//! # Ok::<(), ps2vif::core::error::EmulatorError>(())
//! ```
//!
//! # Error Handling
//!
//! Register handlers never fail. Address decoding, configuration and save
//! states return [`core::error::Result<T>`] which is an alias for
//! `Result<T, EmulatorError>`.

pub mod core;

// Re-export commonly used types
pub use core::error::{EmulatorError, Result};
