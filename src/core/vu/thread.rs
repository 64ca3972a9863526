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

//! Threaded VU1 context
//!
//! Commands travel to the worker over an mpsc channel. After each command the
//! worker commits its mask image and bumps a completion counter; the control
//! thread reaches quiescence once the counter catches up with the number of
//! commands it submitted.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use super::VuSync;
use crate::core::error::{EmulatorError, Result};
use crate::core::vif::MaskRegisters;

/// VU1-side view of the shared registers
#[derive(Debug, Default)]
pub struct VuContext {
    /// Row / column registers as seen by VU1 unpacks
    pub masks: MaskRegisters,
}

type VuJob = Box<dyn FnOnce(&mut VuContext) + Send + 'static>;

enum VuCommand {
    WriteRow([u32; 4]),
    WriteCol([u32; 4]),
    Run(VuJob),
    Shutdown,
}

#[derive(Default)]
struct Progress {
    completed: Mutex<u64>,
    advanced: Condvar,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// VU1 executing on a dedicated worker thread
///
/// # Example
///
/// ```
/// use ps2vif::core::vu::{VuSync, VuThread};
///
/// let mut vu = VuThread::spawn().unwrap();
/// vu.publish_row([1, 2, 3, 4]);
/// vu.wait_for_quiescence();
/// assert_eq!(vu.committed_masks().unwrap().row, [1, 2, 3, 4]);
/// ```
pub struct VuThread {
    sender: Option<Sender<VuCommand>>,
    submitted: u64,
    progress: Arc<Progress>,
    committed: Arc<Mutex<MaskRegisters>>,
    handle: Option<JoinHandle<()>>,
}

impl VuThread {
    /// Start the worker thread
    pub fn spawn() -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<VuCommand>();
        let progress = Arc::new(Progress::default());
        let committed = Arc::new(Mutex::new(MaskRegisters::default()));

        let worker_progress = Arc::clone(&progress);
        let worker_committed = Arc::clone(&committed);
        let handle = thread::Builder::new()
            .name("vu1".to_string())
            .spawn(move || {
                let mut context = VuContext::default();
                for command in receiver {
                    match command {
                        VuCommand::WriteRow(row) => context.masks.row = row,
                        VuCommand::WriteCol(col) => context.masks.col = col,
                        VuCommand::Run(job) => job(&mut context),
                        VuCommand::Shutdown => break,
                    }
                    *lock(&worker_committed) = context.masks;
                    *lock(&worker_progress.completed) += 1;
                    worker_progress.advanced.notify_all();
                }
                log::debug!("VU1 thread exiting");
            })?;

        log::info!("VU1 thread started");
        Ok(Self {
            sender: Some(sender),
            submitted: 0,
            progress,
            committed,
            handle: Some(handle),
        })
    }

    fn submit(&mut self, command: VuCommand) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| EmulatorError::VuThread("thread already stopped".to_string()))?;
        sender
            .send(command)
            .map_err(|_| EmulatorError::VuThread("worker disconnected".to_string()))?;
        self.submitted += 1;
        Ok(())
    }

    /// Queue work on the VU1 thread
    ///
    /// Jobs run in submission order, interleaved with mask publications.
    pub fn run<F>(&mut self, job: F) -> Result<()>
    where
        F: FnOnce(&mut VuContext) + Send + 'static,
    {
        self.submit(VuCommand::Run(Box::new(job)))
    }

    /// Number of commands handed to the worker
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Number of commands the worker has finished
    pub fn completed(&self) -> u64 {
        *lock(&self.progress.completed)
    }
}

impl VuSync for VuThread {
    fn is_threaded(&self) -> bool {
        true
    }

    fn wait_for_quiescence(&mut self) {
        let target = self.submitted;
        let mut completed = lock(&self.progress.completed);
        while *completed < target {
            completed = self
                .progress
                .advanced
                .wait(completed)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn publish_row(&mut self, row: [u32; 4]) {
        if let Err(e) = self.submit(VuCommand::WriteRow(row)) {
            log::error!("Failed to publish VIF1 row: {}", e);
        }
    }

    fn publish_col(&mut self, col: [u32; 4]) {
        if let Err(e) = self.submit(VuCommand::WriteCol(col)) {
            log::error!("Failed to publish VIF1 column: {}", e);
        }
    }

    fn committed_masks(&self) -> Option<MaskRegisters> {
        Some(*lock(&self.committed))
    }

    fn name(&self) -> &str {
        "VU1 (threaded)"
    }
}

impl Drop for VuThread {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(VuCommand::Shutdown);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("VU1 thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_publish_then_wait_commits() {
        let mut vu = VuThread::spawn().unwrap();
        vu.publish_row([1, 2, 3, 4]);
        vu.publish_col([5, 6, 7, 8]);
        vu.wait_for_quiescence();

        let masks = vu.committed_masks().unwrap();
        assert_eq!(masks.row, [1, 2, 3, 4]);
        assert_eq!(masks.col, [5, 6, 7, 8]);
        assert_eq!(vu.completed(), vu.submitted());
    }

    #[test]
    fn test_wait_with_nothing_submitted_returns() {
        let mut vu = VuThread::spawn().unwrap();
        vu.wait_for_quiescence();
        assert_eq!(vu.submitted(), 0);
    }

    #[test]
    fn test_jobs_observe_prior_publications() {
        let mut vu = VuThread::spawn().unwrap();
        let (tx, rx) = mpsc::channel();

        for i in 1..=200u32 {
            vu.publish_row([i, 0, 0, 0]);
            let tx = tx.clone();
            vu.run(move |ctx| {
                tx.send((i, ctx.masks.row[0])).unwrap();
            })
            .unwrap();
        }
        vu.wait_for_quiescence();
        drop(tx);

        let observed: Vec<(u32, u32)> = rx.iter().collect();
        assert_eq!(observed.len(), 200);
        for (written, seen) in observed {
            assert_eq!(written, seen, "job saw a stale row value");
        }
    }

    #[test]
    fn test_vu_side_writes_visible_after_wait() {
        let mut vu = VuThread::spawn().unwrap();
        vu.run(|ctx| ctx.masks.col[2] = 0xCAFE).unwrap();
        vu.wait_for_quiescence();
        assert_eq!(vu.committed_masks().unwrap().col[2], 0xCAFE);
    }

    #[test]
    fn test_drop_joins_worker() {
        let mut vu = VuThread::spawn().unwrap();
        vu.publish_row([9; 4]);
        drop(vu);
    }
}
