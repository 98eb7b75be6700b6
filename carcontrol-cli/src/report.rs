//! Report generation
//!
//! Renders replayed cycles as a plain-text listing or as JSON.

use crate::replay::CycleRecord;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use subaru_carcontrol::signals::MessageDatabase;
use subaru_carcontrol::{CanPacker, MessageKind, OutboundFrame};

/// One frame as it appears in the JSON report
#[derive(Debug, Serialize)]
struct FrameEntry<'a> {
    name: &'a str,
    address: u32,
    bus: u8,
    data: String,
}

/// One cycle as it appears in the JSON report
#[derive(Debug, Serialize)]
struct CycleEntry<'a> {
    cycle: u64,
    enabled: bool,
    applied_steer: i32,
    steer_rate_limited: bool,
    frames: Vec<FrameEntry<'a>>,
}

/// Totals over the whole replay
#[derive(Debug, Serialize)]
struct Summary<'a> {
    cycles: usize,
    frames: usize,
    rate_limited_cycles: usize,
    frames_per_message: BTreeMap<&'a str, usize>,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    summary: Summary<'a>,
    cycles: Vec<CycleEntry<'a>>,
}

/// Render cycles as JSON
pub fn render_json(records: &[CycleRecord], db: &MessageDatabase) -> Result<String> {
    let cycles = records
        .iter()
        .map(|record| CycleEntry {
            cycle: record.cycle,
            enabled: record.enabled,
            applied_steer: record.applied_steer,
            steer_rate_limited: record.steer_rate_limited,
            frames: record.frames.iter().map(|f| frame_entry(f, db)).collect(),
        })
        .collect();

    let report = JsonReport {
        summary: summarize(records, db),
        cycles,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Render cycles as a text listing
///
/// With `decode_signals`, every frame is followed by its unpacked values.
pub fn render_txt(
    records: &[CycleRecord],
    packer: &CanPacker,
    db: &MessageDatabase,
    decode_signals: bool,
) -> Result<String> {
    let mut out = String::new();
    write_txt(&mut out, records, packer, db, decode_signals)?;
    Ok(out)
}

fn write_txt(
    out: &mut impl Write,
    records: &[CycleRecord],
    packer: &CanPacker,
    db: &MessageDatabase,
    decode_signals: bool,
) -> fmt::Result {
    for record in records {
        writeln!(
            out,
            "cycle {:>5}  {}  steer {:>5}{}",
            record.cycle,
            if record.enabled { "ON " } else { "OFF" },
            record.applied_steer,
            if record.steer_rate_limited { " (limited)" } else { "" }
        )?;

        for frame in &record.frames {
            let name = message_name(frame, db);
            writeln!(out, "    {:<14} {}", name, frame)?;

            if decode_signals {
                if let Some(values) = message_kind(name).and_then(|kind| packer.unpack(kind, &frame.data)) {
                    for (signal, value) in values {
                        writeln!(out, "        {:<28} {}", signal, value)?;
                    }
                }
            }
        }
    }

    let summary = summarize(records, db);
    writeln!(out, "\n═══════════════════════════════════════════════")?;
    writeln!(out, "  Cycles:             {}", summary.cycles)?;
    writeln!(out, "  Frames:             {}", summary.frames)?;
    writeln!(out, "  Rate-limited steer: {}", summary.rate_limited_cycles)?;
    for (name, count) in &summary.frames_per_message {
        writeln!(out, "    {:<14} {}", name, count)?;
    }

    Ok(())
}

fn summarize<'a>(records: &[CycleRecord], db: &'a MessageDatabase) -> Summary<'a> {
    let mut frames_per_message = BTreeMap::new();
    for frame in records.iter().flat_map(|r| r.frames.iter()) {
        *frames_per_message.entry(message_name(frame, db)).or_insert(0) += 1;
    }

    Summary {
        cycles: records.len(),
        frames: records.iter().map(|r| r.frames.len()).sum(),
        rate_limited_cycles: records.iter().filter(|r| r.steer_rate_limited).count(),
        frames_per_message,
    }
}

fn frame_entry<'a>(frame: &OutboundFrame, db: &'a MessageDatabase) -> FrameEntry<'a> {
    FrameEntry {
        name: message_name(frame, db),
        address: frame.address,
        bus: frame.bus,
        data: frame.data.iter().map(|b| format!("{:02X}", b)).collect(),
    }
}

fn message_name<'a>(frame: &OutboundFrame, db: &'a MessageDatabase) -> &'a str {
    db.get_message_by_address(frame.address)
        .map(|m| m.name.as_str())
        .unwrap_or("unknown")
}

fn message_kind(name: &str) -> Option<MessageKind> {
    MessageKind::ALL.into_iter().find(|kind| kind.name() == name)
}
