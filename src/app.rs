//! One complete simulator run: load the inputs, feed the trace through the
//! engine and write the report to any `Write` sink.

use std::io::Write;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::io::{load_process_image, SimulationFile};
use crate::report::{self, SummaryFormat};
use crate::simulation::{SimConfig, Simulation};

/// Everything the front end decides before a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub file: PathBuf,
    pub config: SimConfig,
    pub verbose: bool,
    pub file_verbose: bool,
    pub format: SummaryFormat,
}

/// How the trace ended; both outcomes still print a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Segfault,
}

/// Run the simulation described by `opts`, writing the trace and summary to `out`.
///
/// A segmentation fault is a simulated outcome, not an error: the fault line
/// and the summary are written and `RunOutcome::Segfault` is returned. I/O,
/// parse and configuration problems are returned as `Err`.
pub fn run<W: Write>(opts: &RunOptions, out: &mut W) -> Result<RunOutcome> {
    let input = SimulationFile::from_file(&opts.file)?;

    let mut sim = Simulation::new(opts.config)?;
    for (pid, image) in &input.processes {
        sim.add_process(load_process_image(*pid, image)?)?;
    }

    if opts.file_verbose {
        report::write_inputs(out, sim.processes(), &input.addresses)?;
    }

    let mut write_err = None;
    let mut last = None;
    let trace = input.addresses.iter().copied().inspect(|va| last = Some(*va));
    let result = sim.run_with(trace, |record| {
        if opts.verbose && write_err.is_none() {
            write_err = report::write_access(out, record).err();
        }
    });
    if let Some(e) = write_err {
        return Err(Error::Output(e));
    }

    let outcome = match result {
        Ok(()) => RunOutcome::Completed,
        Err(e) if e.is_segfault() => {
            if let Some(va) = last {
                report::write_fatal(out, &va, &e, opts.verbose)?;
            }
            RunOutcome::Segfault
        }
        Err(e) => return Err(e),
    };

    report::write_summary(out, &sim.summary(), opts.format)?;
    out.flush()?;
    Ok(outcome)
}
