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

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use ps2vif::core::config::EmulatorConfig;
use ps2vif::core::system::System;
use ps2vif::core::vif::{offsets, Fbrst, VifId, VifStat};

fn bench_register_writes(c: &mut Criterion) {
    let mut g = c.benchmark_group("vif-mux");
    let n = 1_000u64;
    g.throughput(Throughput::Elements(n));

    let mut system = System::new();
    g.bench_function("row_writes_inline", |b| {
        b.iter(|| {
            for i in 0..n as u32 {
                system.write_vif_register(VifId::Vif1, offsets::R0 + ((i & 3) << 4), black_box(i));
            }
        })
    });

    g.bench_function("mark_writeback", |b| {
        b.iter(|| {
            for i in 0..n as u32 {
                system
                    .write32(0x1000_3C00 + offsets::MARK, black_box(i))
                    .unwrap_or_default();
            }
        })
    });

    let config = EmulatorConfig {
        threaded_vu1: true,
        ..EmulatorConfig::default()
    };
    if let Ok(mut threaded) = System::with_config(&config) {
        g.bench_function("row_write_read_threaded", |b| {
            b.iter(|| {
                for i in 0..n as u32 {
                    threaded.write_vif_register(VifId::Vif1, offsets::C1, i);
                    black_box(threaded.read_vif_register(VifId::Vif1, offsets::C1));
                }
            })
        });
    }

    g.finish();
}

fn bench_fbrst(c: &mut Criterion) {
    let mut system = System::new();
    c.bench_function("fbrst_stall_cancel_reset", |b| {
        b.iter(|| {
            system.handle_force_break_reset(VifId::Vif1, Fbrst::FBK.bits());
            system.handle_force_break_reset(VifId::Vif1, Fbrst::STC.bits());
            system.handle_force_break_reset(VifId::Vif1, Fbrst::RST.bits());
            black_box(system.vif(VifId::Vif1).stat() == VifStat::empty())
        })
    });
}

criterion_group!(benches, bench_register_writes, bench_fbrst);
criterion_main!(benches);
