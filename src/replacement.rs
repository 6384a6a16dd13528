//! Victim selection for a process that is at its frame budget.
//!
//! Both strategies look only at the faulting process's own resident set.
//! FIFO keys on `loaded_at`, so a page that is evicted and faulted back in
//! goes to the back of the queue.

use std::fmt;
use std::str::FromStr;

use crate::page_table::PageTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplacementStrategy {
    /// Evict the page resident the longest
    #[default]
    Fifo,
    /// Evict the page referenced least recently
    Lru,
}

impl ReplacementStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ReplacementStrategy::Fifo => "FIFO",
            ReplacementStrategy::Lru => "LRU",
        }
    }
}

impl fmt::Display for ReplacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReplacementStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FIFO" => Ok(ReplacementStrategy::Fifo),
            "LRU" => Ok(ReplacementStrategy::Lru),
            _ => Err(format!("unknown replacement strategy: {} (expected FIFO or LRU)", s)),
        }
    }
}

/// Pick the page to evict from `table`, or `None` if nothing is resident
pub fn select_victim(table: &PageTable, strategy: ReplacementStrategy) -> Option<usize> {
    match strategy {
        ReplacementStrategy::Fifo => table.oldest_resident(),
        ReplacementStrategy::Lru => table.least_recently_used_resident(),
    }
}
