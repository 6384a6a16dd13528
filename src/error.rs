//! Error types for the paging simulator.
//!
//! `InvalidPage` and `InvalidOffset` are the simulated segmentation faults:
//! they end the run but are an expected outcome of a trace, not a failure of
//! the tool. Everything else is a configuration or input problem.

use std::path::PathBuf;
use thiserror::Error;

use crate::memory::FrameId;
use crate::process::Pid;
use crate::translation::AccessKind;

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Page index outside the process's page table
    #[error("SEGFAULT - INVALID PAGE (process {pid}: page {page}, table has {page_count} pages)")]
    InvalidPage {
        pid: Pid,
        page: usize,
        page_count: usize,
    },

    /// Offset outside the bytes backing the page
    #[error("SEGFAULT - INVALID OFFSET (process {pid}: page {page}, offset {offset}, page holds {page_len} bytes)")]
    InvalidOffset {
        pid: Pid,
        page: usize,
        offset: usize,
        page_len: usize,
        /// Frame the page was resolved to before the offset was checked
        frame: FrameId,
        kind: AccessKind,
    },

    #[error("no process with id {0}")]
    UnknownProcess(Pid),

    #[error("process {0} is already loaded")]
    DuplicateProcess(Pid),

    /// A process was under its frame budget but the pool was empty
    #[error("no free frame for process {pid} with {rss} resident pages")]
    OutOfFrames { pid: Pid, rss: usize },

    /// The simulation already stopped on a fatal fault
    #[error("simulation halted after a fatal fault")]
    Halted,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// True for the two faults that terminate a simulated run.
    pub fn is_segfault(&self) -> bool {
        matches!(self, Self::InvalidPage { .. } | Self::InvalidOffset { .. })
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
