//! Text output: the end-of-run summary (table or CSV) and the per-access
//! verbose trace.

use std::io::{self, Write};

use crate::error::Error;
use crate::process::Process;
use crate::simulation::SimulationSummary;
use crate::translation::{AccessKind, AccessRecord, PhysicalAddress, VirtualAddress};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    #[default]
    Table,
    Csv,
}

pub fn write_summary<W: Write>(
    out: &mut W,
    summary: &SimulationSummary,
    format: SummaryFormat,
) -> io::Result<()> {
    match format {
        SummaryFormat::Table => write_table(out, summary),
        SummaryFormat::Csv => write_csv(out, summary),
    }
}

fn write_table<W: Write>(out: &mut W, summary: &SimulationSummary) -> io::Result<()> {
    for (pid, stats) in &summary.processes {
        writeln!(
            out,
            "Process {:>3}:  ACCESSES: {:<6} FAULTS: {:<6} FAULT RATE: {:<8.2} RSS: {:<6}",
            pid.0, stats.memory_accesses, stats.page_faults, stats.fault_percent, stats.rss
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{:<25} {:>12}", "Total memory accesses:", summary.total_accesses)?;
    writeln!(out, "{:<25} {:>12}", "Total page faults:", summary.total_faults)?;
    writeln!(out, "{:<25} {:>12}", "Free frames remaining:", summary.free_frames)
}

fn write_csv<W: Write>(out: &mut W, summary: &SimulationSummary) -> io::Result<()> {
    for (pid, stats) in &summary.processes {
        writeln!(
            out,
            "{},{},{},{:.2},{}",
            pid.0, stats.memory_accesses, stats.page_faults, stats.fault_percent, stats.rss
        )?;
    }
    writeln!(out, "{},,,,", summary.total_accesses)?;
    writeln!(out, "{},,,,", summary.total_faults)?;
    writeln!(out, "{},,,,", summary.free_frames)
}

/// Verbose trace lines for one successful access
pub fn write_access<W: Write>(out: &mut W, record: &AccessRecord) -> io::Result<()> {
    writeln!(out, "{}", record.address)?;
    write_resolution(out, record.kind, &record.physical)?;
    writeln!(out, "\t-> RSS: {}", record.rss)?;
    writeln!(out)
}

fn write_resolution<W: Write>(
    out: &mut W,
    kind: AccessKind,
    physical: &PhysicalAddress,
) -> io::Result<()> {
    match kind {
        AccessKind::Fault {
            evicted: Some(victim),
        } => writeln!(out, "\t-> PAGE FAULT (replaced page {})", victim)?,
        k if k.is_fault() => writeln!(out, "\t-> PAGE FAULT")?,
        _ => writeln!(out, "\t-> IN MEMORY")?,
    }
    writeln!(out, "\t-> physical address {}", physical)
}

/// Trace lines for the access that ended the run.
///
/// Without `verbose` only the `SEGFAULT` line is written. With it, the
/// address comes first and an offset fault also shows how the page was
/// resolved before the offset was rejected.
pub fn write_fatal<W: Write>(
    out: &mut W,
    address: &VirtualAddress,
    error: &Error,
    verbose: bool,
) -> io::Result<()> {
    if verbose {
        writeln!(out, "{}", address)?;
    }
    match error {
        Error::InvalidPage { .. } => writeln!(out, "SEGFAULT - INVALID PAGE"),
        Error::InvalidOffset { frame, kind, .. } => {
            if verbose {
                let physical = PhysicalAddress {
                    frame: *frame,
                    offset: address.offset,
                };
                write_resolution(out, *kind, &physical)?;
            }
            writeln!(out, "SEGFAULT - INVALID OFFSET")
        }
        other => writeln!(out, "ERROR - {}", other),
    }
}

/// File-verbose listing of loaded processes and the parsed trace
pub fn write_inputs<'a, W, P>(out: &mut W, processes: P, trace: &[VirtualAddress]) -> io::Result<()>
where
    W: Write,
    P: IntoIterator<Item = &'a Process>,
{
    for process in processes {
        writeln!(out, "Process {:>3}: Size: {}", process.pid().0, process.size())?;
    }
    for va in trace {
        writeln!(out, "{}", va)?;
    }
    Ok(())
}
