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

//! vifctl entry point
//!
//! Replays a TOML script of register accesses against a fresh VIF system and
//! prints the resulting state.
//!
//! ```toml
//! [[step]]
//! op = "gs_download"
//! size = 20
//!
//! [[step]]
//! op = "write"
//! address = 0x10003C00   # VIF1_STAT
//! value = 0x00800000     # FDR
//!
//! [[step]]
//! op = "read"
//! address = 0x10003C00
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use ps2vif::core::config::EmulatorConfig;
use ps2vif::core::system::System;
use ps2vif::core::vif::VifId;

#[derive(Parser, Debug)]
#[command(name = "vifctl", version, about = "Replay VIF register scripts")]
struct Args {
    /// TOML script to replay
    script: PathBuf,

    /// Emulator configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run VU1 on its own thread (overrides the configuration)
    #[arg(long)]
    threaded_vu1: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    /// 32-bit register write by physical address
    Write { address: u32, value: u32 },
    /// 32-bit register read by physical address
    Read { address: u32 },
    /// Record a GS local→host download of `size` quadwords
    GsDownload { size: u32 },
    /// Advance the DMA event scheduler
    Advance { cycles: u32 },
    /// Power-on reset of everything
    Reset,
}

#[derive(Debug, Default, Deserialize)]
struct Script {
    #[serde(default, rename = "step")]
    steps: Vec<Step>,
}

impl Script {
    fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[derive(Debug, Serialize)]
struct ReadRecord {
    address: u32,
    value: u32,
}

#[derive(Debug, Serialize)]
struct ChannelReport {
    channel: usize,
    stat: u32,
    fqc: u32,
    row: [u32; 4],
    col: [u32; 4],
    dma_running: bool,
    qwc: u32,
}

#[derive(Debug, Serialize)]
struct Report {
    reads: Vec<ReadRecord>,
    fired_events: Vec<String>,
    interrupts_raised: u64,
    d_stat: u32,
    channels: Vec<ChannelReport>,
}

fn replay(system: &mut System, script: &Script) -> ps2vif::Result<Report> {
    let mut reads = Vec::new();
    let mut fired_events = Vec::new();

    for step in &script.steps {
        log::debug!("Step: {:?}", step);
        match *step {
            Step::Write { address, value } => system.write32(address, value)?,
            Step::Read { address } => {
                let value = system.read32(address)?;
                reads.push(ReadRecord { address, value });
            }
            Step::GsDownload { size } => system.set_gs_download_size(size),
            Step::Advance { cycles } => {
                fired_events.extend(system.step(cycles).iter().map(|e| e.name().to_string()))
            }
            Step::Reset => system.reset(),
        }
    }

    let channels = VifId::ALL
        .into_iter()
        .map(|id| {
            let vif = system.vif(id);
            let dma = system.dmac().channel(vif.descriptor().dma_channel);
            ChannelReport {
                channel: id.index(),
                stat: vif.stat().bits(),
                fqc: vif.stat().fqc(),
                row: vif.state().masks.row,
                col: vif.state().masks.col,
                dma_running: dma.is_running(),
                qwc: dma.qwc(),
            }
        })
        .collect();

    Ok(Report {
        reads,
        fired_events,
        interrupts_raised: system.dmac().interrupts().raised_count(),
        d_stat: system.dmac().interrupts().read_status(),
        channels,
    })
}

fn print_text(report: &Report) {
    for read in &report.reads {
        println!("read  0x{:08X} -> 0x{:08X}", read.address, read.value);
    }
    for event in &report.fired_events {
        println!("event {}", event);
    }
    for ch in &report.channels {
        println!(
            "VIF{}: STAT=0x{:08X} FQC={} STR={} QWC={} ROW={:08X?} COL={:08X?}",
            ch.channel, ch.stat, ch.fqc, ch.dma_running, ch.qwc, ch.row, ch.col
        );
    }
    println!(
        "D_STAT=0x{:08X} ({} interrupts raised)",
        report.d_stat, report.interrupts_raised
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = EmulatorConfig::from_env(args.config.as_deref())?;
    if args.threaded_vu1 {
        config.threaded_vu1 = true;
    }

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_filters(&config.log_level)
        .parse_default_env()
        .init();

    log::info!("Replaying {}", args.script.display());
    let script = Script::parse(&std::fs::read_to_string(&args.script)?)?;

    let mut system = System::with_config(&config)?;
    let report = replay(&mut system, &script)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTION_SCRIPT: &str = r#"
[[step]]
op = "gs_download"
size = 20

[[step]]
op = "write"
address = 0x10003C00
value = 0x00800000

[[step]]
op = "read"
address = 0x10003C00
"#;

    #[test]
    fn test_parse_script() {
        let script = Script::parse(DIRECTION_SCRIPT).unwrap();
        assert_eq!(script.steps.len(), 3);
        assert_eq!(script.steps[0], Step::GsDownload { size: 20 });
        assert_eq!(
            script.steps[2],
            Step::Read {
                address: 0x1000_3C00
            }
        );
    }

    #[test]
    fn test_replay_direction_toggle() {
        let script = Script::parse(DIRECTION_SCRIPT).unwrap();
        let mut system = System::new();
        let report = replay(&mut system, &script).unwrap();

        assert_eq!(report.reads.len(), 1);
        // FDR plus FQC = 16
        assert_eq!(report.reads[0].value, 0x0080_0000 | (16 << 24));
        assert_eq!(report.channels[1].fqc, 16);
    }

    #[test]
    fn test_replay_stops_on_unmapped_access() {
        let script = Script::parse("[[step]]\nop = \"read\"\naddress = 0x1000_3A00\n").unwrap();
        let mut system = System::new();
        assert!(replay(&mut system, &script).is_err());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let script = Script::parse("[[step]]\nop = \"advance\"\ncycles = 4\n").unwrap();
        let mut system = System::new();
        let report = replay(&mut system, &script).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["channels"].as_array().unwrap().len(), 2);
        assert_eq!(json["interrupts_raised"], 0);
    }

    #[test]
    fn test_empty_script() {
        let script = Script::parse("").unwrap();
        assert!(script.steps.is_empty());
    }
}
