use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};
use crate::process::{Pid, Process};
use crate::translation::VirtualAddress;

/// Parsed simulation file: process images to load and the access trace
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimulationFile {
    pub processes: Vec<(Pid, PathBuf)>,
    pub addresses: Vec<VirtualAddress>,
}

impl SimulationFile {
    /// Read and parse a simulation file.
    ///
    /// Relative image paths are resolved against the file's directory when
    /// that yields an existing file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut parsed = Self::parse(&content)?;

        if let Some(base) = path.parent() {
            for (_, image) in &mut parsed.processes {
                let candidate = base.join(&*image);
                if image.is_relative() && candidate.is_file() {
                    *image = candidate;
                }
            }
        }
        info!(
            "{}: {} processes, {} accesses",
            path.display(),
            parsed.processes.len(),
            parsed.addresses.len()
        );
        Ok(parsed)
    }

    /// Parse `N`, then `N` lines of `pid image_path`, then any number of
    /// `pid address` lines with 16-digit binary addresses.
    pub fn parse(content: &str) -> Result<Self> {
        let mut tokens = content
            .lines()
            .enumerate()
            .flat_map(|(i, line)| line.split_whitespace().map(move |t| (i + 1, t)));

        let (line, count) = tokens
            .next()
            .ok_or_else(|| Error::parse(1, "simulation file is empty"))?;
        let count: usize = count
            .parse()
            .map_err(|_| Error::parse(line, format!("invalid process count: {}", count)))?;

        let mut processes = Vec::with_capacity(count);
        for _ in 0..count {
            let (line, pid) = tokens
                .next()
                .ok_or_else(|| Error::parse(line, format!("expected {} processes", count)))?;
            let pid = parse_pid(line, pid)?;
            let (line, image) = tokens
                .next()
                .ok_or_else(|| Error::parse(line, format!("missing image path for process {}", pid)))?;
            if processes.iter().any(|(p, _)| *p == pid) {
                return Err(Error::parse(line, format!("process {} listed twice", pid)));
            }
            processes.push((pid, PathBuf::from(image)));
        }

        let mut addresses = Vec::new();
        while let Some((line, pid)) = tokens.next() {
            let pid = parse_pid(line, pid)?;
            let (line, bits) = tokens
                .next()
                .ok_or_else(|| Error::parse(line, format!("missing address for process {}", pid)))?;
            let va = VirtualAddress::from_bits(pid, bits).map_err(|msg| Error::parse(line, msg))?;
            addresses.push(va);
        }

        Ok(SimulationFile {
            processes,
            addresses,
        })
    }
}

fn parse_pid(line: usize, token: &str) -> Result<Pid> {
    token
        .parse()
        .map(Pid)
        .map_err(|_| Error::parse(line, format!("invalid process id: {}", token)))
}

/// Build a process whose image size is the byte length of the file at `path`
pub fn load_process_image<P: AsRef<Path>>(pid: Pid, path: P) -> Result<Process> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(Process::new(pid, bytes.len()))
}
