use std::fmt;

use crate::constants::*;
use crate::memory::FrameId;
use crate::process::Pid;

/// A trace entry: which process touched which byte of which page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub pid: Pid,
    pub page: usize,
    pub offset: usize,
}

impl VirtualAddress {
    pub fn new(pid: Pid, page: usize, offset: usize) -> Self {
        VirtualAddress { pid, page, offset }
    }

    /// Split a raw 16-bit address into page and offset
    pub fn from_raw(pid: Pid, raw: u16) -> Self {
        let page = ((raw >> OFFSET_BITS) & PAGE_MASK) as usize;
        let offset = (raw & OFFSET_MASK) as usize;
        VirtualAddress { pid, page, offset }
    }

    /// Parse an address written as exactly `ADDRESS_BITS` binary digits
    pub fn from_bits(pid: Pid, bits: &str) -> Result<Self, String> {
        if bits.len() != ADDRESS_BITS as usize {
            return Err(format!(
                "virtual address {:?} must have {} bits, got {}",
                bits,
                ADDRESS_BITS,
                bits.len()
            ));
        }
        if !bits.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(format!("virtual address {:?} is not binary", bits));
        }
        let raw = u16::from_str_radix(bits, 2)
            .map_err(|e| format!("virtual address {:?}: {}", bits, e))?;
        Ok(Self::from_raw(pid, raw))
    }

    /// Recombine page and offset; only meaningful for in-range fields
    #[inline]
    pub fn raw(&self) -> u32 {
        ((self.page as u32) << OFFSET_BITS) | self.offset as u32
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PID {} @ {:0width$b} [page: {}; offset: {}]",
            self.pid,
            self.raw(),
            self.page,
            self.offset,
            width = ADDRESS_BITS as usize
        )
    }
}

/// Frame plus offset; derived on each access, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalAddress {
    pub frame: FrameId,
    pub offset: usize,
}

impl PhysicalAddress {
    #[inline]
    pub fn raw(&self) -> usize {
        self.frame.0 * PAGE_SIZE + self.offset
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:0width$b} [frame: {}; offset: {}]",
            self.raw(),
            self.frame,
            self.offset,
            width = ADDRESS_BITS as usize
        )
    }
}

/// How an access was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Hit,
    /// Page fault; `evicted` is the victim page when the process was at budget
    Fault { evicted: Option<usize> },
}

impl AccessKind {
    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(self, AccessKind::Fault { .. })
    }
}

/// Everything the engine knows about one completed access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRecord {
    pub address: VirtualAddress,
    pub physical: PhysicalAddress,
    pub kind: AccessKind,
    /// Resident set size of the process after the access
    pub rss: usize,
}
