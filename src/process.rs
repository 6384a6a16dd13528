use std::fmt;

use crate::constants::PAGE_SIZE;
use crate::page_table::PageTable;

/// Process identifier as it appears in the simulation file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A process image plus its page table and access counters.
///
/// The image size is fixed at creation; the page table has one entry per
/// `PAGE_SIZE` chunk of it, the last of which may be partial.
#[derive(Debug, Clone)]
pub struct Process {
    pid: Pid,
    num_bytes: usize,
    pub(crate) page_table: PageTable,
    pub(crate) memory_accesses: usize,
    pub(crate) page_faults: usize,
}

/// Counters reported for one process at the end of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessStats {
    pub memory_accesses: usize,
    pub page_faults: usize,
    pub fault_percent: f64,
    pub rss: usize,
}

impl Process {
    pub fn new(pid: Pid, num_bytes: usize) -> Self {
        let page_count = num_bytes.div_ceil(PAGE_SIZE);
        Process {
            pid,
            num_bytes,
            page_table: PageTable::new(page_count),
            memory_accesses: 0,
            page_faults: 0,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Image size in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.num_bytes
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.page_table.len()
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn memory_accesses(&self) -> usize {
        self.memory_accesses
    }

    pub fn page_faults(&self) -> usize {
        self.page_faults
    }

    #[inline]
    pub fn is_valid_page(&self, page: usize) -> bool {
        self.page_table.is_valid_index(page)
    }

    /// Bytes of the image backing `page`; zero for pages past the end
    pub fn page_len(&self, page: usize) -> usize {
        let start = page.saturating_mul(PAGE_SIZE);
        self.num_bytes.saturating_sub(start).min(PAGE_SIZE)
    }

    pub fn is_valid_offset(&self, page: usize, offset: usize) -> bool {
        offset < self.page_len(page)
    }

    /// Resident set size
    pub fn rss(&self) -> usize {
        self.page_table.present_count()
    }

    /// Percentage of accesses that faulted; 0 before any access
    pub fn fault_percent(&self) -> f64 {
        if self.memory_accesses == 0 {
            0.0
        } else {
            (self.page_faults as f64 / self.memory_accesses as f64) * 100.0
        }
    }

    pub fn stats(&self) -> ProcessStats {
        ProcessStats {
            memory_accesses: self.memory_accesses,
            page_faults: self.page_faults,
            fault_percent: self.fault_percent(),
            rss: self.rss(),
        }
    }
}
