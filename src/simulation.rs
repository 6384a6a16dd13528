//! Memory access engine.
//!
//! Owns every process, the shared frame pool and the logical clock, and
//! applies one trace entry at a time. A segmentation fault halts the
//! simulation; the counters accumulated up to that point stay readable.

use std::collections::BTreeMap;

use log::{debug, info, trace, warn};

use crate::constants::{DEFAULT_MAX_FRAMES, NUM_FRAMES};
use crate::error::{Error, Result};
use crate::memory::{FrameId, FrameOwner, FramePool};
use crate::page_table::Tick;
use crate::process::{Pid, Process, ProcessStats};
use crate::replacement::{select_victim, ReplacementStrategy};
use crate::translation::{AccessKind, AccessRecord, PhysicalAddress, VirtualAddress};

/// Fixed parameters of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    pub num_frames: usize,
    pub max_frames_per_process: usize,
    pub strategy: ReplacementStrategy,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            num_frames: NUM_FRAMES,
            max_frames_per_process: DEFAULT_MAX_FRAMES,
            strategy: ReplacementStrategy::Fifo,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_frames == 0 {
            return Err(Error::InvalidConfig("frame count must be at least 1".into()));
        }
        if self.max_frames_per_process == 0 {
            return Err(Error::InvalidConfig(
                "max frames per process must be at least 1".into(),
            ));
        }
        if self.max_frames_per_process > self.num_frames {
            return Err(Error::InvalidConfig(format!(
                "max frames per process ({}) exceeds frame count ({})",
                self.max_frames_per_process, self.num_frames
            )));
        }
        Ok(())
    }
}

/// End-of-run counters handed to the reporter
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    /// Per-process stats in pid order
    pub processes: Vec<(Pid, ProcessStats)>,
    pub total_accesses: usize,
    pub total_faults: usize,
    pub free_frames: usize,
}

pub struct Simulation {
    config: SimConfig,
    processes: BTreeMap<Pid, Process>,
    frames: FramePool,
    time: Tick,
    total_accesses: usize,
    total_faults: usize,
    halted: bool,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "simulation: {} frames, {} per process, {} replacement",
            config.num_frames, config.max_frames_per_process, config.strategy
        );
        Ok(Simulation {
            config,
            processes: BTreeMap::new(),
            frames: FramePool::new(config.num_frames),
            time: 0,
            total_accesses: 0,
            total_faults: 0,
            halted: false,
        })
    }

    pub fn add_process(&mut self, process: Process) -> Result<()> {
        let pid = process.pid();
        if self.processes.contains_key(&pid) {
            return Err(Error::DuplicateProcess(pid));
        }
        // every process must be able to fill its budget from the shared pool
        let reserved = (self.processes.len() + 1) * self.config.max_frames_per_process;
        if reserved > self.config.num_frames {
            return Err(Error::InvalidConfig(format!(
                "{} processes at {} frames each need {} frames, only {} exist",
                self.processes.len() + 1,
                self.config.max_frames_per_process,
                reserved,
                self.config.num_frames
            )));
        }
        debug!(
            "process {}: {} bytes, {} pages",
            pid,
            process.size(),
            process.page_count()
        );
        self.processes.insert(pid, process);
        Ok(())
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn frames(&self) -> &FramePool {
        &self.frames
    }

    /// Current logical clock value
    pub fn time(&self) -> Tick {
        self.time
    }

    pub fn total_accesses(&self) -> usize {
        self.total_accesses
    }

    pub fn total_faults(&self) -> usize {
        self.total_faults
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Translate one virtual address, faulting the page in if needed.
    ///
    /// The clock advances once for every access that reaches a process,
    /// including one that ends in a segmentation fault.
    pub fn access(&mut self, va: VirtualAddress) -> Result<AccessRecord> {
        if self.halted {
            return Err(Error::Halted);
        }
        if !self.processes.contains_key(&va.pid) {
            return Err(Error::UnknownProcess(va.pid));
        }

        let result = self.translate(va);
        self.time += 1;

        match &result {
            Ok(_) => debug_assert!(self.check_invariants().is_ok()),
            Err(e) if e.is_segfault() => {
                warn!("{}", e);
                self.halted = true;
            }
            Err(_) => self.halted = true,
        }
        result
    }

    fn translate(&mut self, va: VirtualAddress) -> Result<AccessRecord> {
        let now = self.time;
        let max_frames = self.config.max_frames_per_process;
        let strategy = self.config.strategy;

        let process = self
            .processes
            .get_mut(&va.pid)
            .ok_or(Error::UnknownProcess(va.pid))?;

        // the attempt counts even if the page turns out to be invalid
        process.memory_accesses += 1;
        self.total_accesses += 1;

        if !process.is_valid_page(va.page) {
            return Err(Error::InvalidPage {
                pid: va.pid,
                page: va.page,
                page_count: process.page_count(),
            });
        }

        let present = process.page_table.get(va.page).is_some_and(|e| e.present);
        let kind = if present {
            trace!("{} -> hit", va);
            process.page_table.touch(va.page, now);
            AccessKind::Hit
        } else {
            let owner = FrameOwner {
                pid: va.pid,
                page: va.page,
            };
            let rss = process.rss();
            let (frame, evicted) = if rss < max_frames {
                let frame = self
                    .frames
                    .allocate_free_frame(owner)
                    .ok_or(Error::OutOfFrames { pid: va.pid, rss })?;
                (frame, None)
            } else {
                let victim = select_victim(&process.page_table, strategy)
                    .ok_or(Error::OutOfFrames { pid: va.pid, rss })?;
                let frame = process.page_table.evict(victim);
                self.frames.reassign(frame, owner);
                (frame, Some(victim))
            };

            process.page_table.load(va.page, frame, now);
            process.page_faults += 1;
            self.total_faults += 1;
            match evicted {
                Some(victim) => debug!(
                    "{} -> fault, evicted page {} from frame {} ({})",
                    va, victim, frame, strategy
                ),
                None => debug!("{} -> fault, loaded into free frame {}", va, frame),
            }
            AccessKind::Fault { evicted }
        };

        let frame: FrameId = process.page_table.entries()[va.page].frame;
        if !process.is_valid_offset(va.page, va.offset) {
            return Err(Error::InvalidOffset {
                pid: va.pid,
                page: va.page,
                offset: va.offset,
                page_len: process.page_len(va.page),
                frame,
                kind,
            });
        }

        Ok(AccessRecord {
            address: va,
            physical: PhysicalAddress {
                frame,
                offset: va.offset,
            },
            kind,
            rss: process.rss(),
        })
    }

    /// Feed a trace through the engine, stopping at the first error.
    pub fn run<I>(&mut self, trace: I) -> Result<()>
    where
        I: IntoIterator<Item = VirtualAddress>,
    {
        self.run_with(trace, |_| {})
    }

    /// Like [`run`](Self::run), calling `observer` after each successful access.
    pub fn run_with<I, F>(&mut self, trace: I, mut observer: F) -> Result<()>
    where
        I: IntoIterator<Item = VirtualAddress>,
        F: FnMut(&AccessRecord),
    {
        for va in trace {
            let record = self.access(va)?;
            observer(&record);
        }
        Ok(())
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            processes: self
                .processes
                .iter()
                .map(|(pid, p)| (*pid, p.stats()))
                .collect(),
            total_accesses: self.total_accesses,
            total_faults: self.total_faults,
            free_frames: self.frames.free_count(),
        }
    }

    /// Verify frame accounting and page-table consistency.
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut resident_total = 0;
        for (pid, process) in &self.processes {
            let rss = process.rss();
            if rss > self.config.max_frames_per_process {
                return Err(format!(
                    "process {} holds {} frames, budget is {}",
                    pid, rss, self.config.max_frames_per_process
                ));
            }
            resident_total += rss;

            for (page, entry) in process.page_table.entries().iter().enumerate() {
                if entry.loaded_at > entry.last_accessed_at {
                    return Err(format!(
                        "process {} page {} loaded at {} after last access at {}",
                        pid, page, entry.loaded_at, entry.last_accessed_at
                    ));
                }
            }
            for (page, frame) in process.page_table.resident_pages() {
                let expected = FrameOwner { pid: *pid, page };
                if self.frames.owner(frame) != Some(expected) {
                    return Err(format!(
                        "frame {} should belong to process {} page {}, owner is {:?}",
                        frame,
                        pid,
                        page,
                        self.frames.owner(frame)
                    ));
                }
            }
        }

        if resident_total + self.frames.free_count() != self.frames.capacity() {
            return Err(format!(
                "{} resident pages + {} free frames != {} frames",
                resident_total,
                self.frames.free_count(),
                self.frames.capacity()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PAGE_SIZE;
    use proptest::prelude::*;

    fn sim(max_frames: usize, strategy: ReplacementStrategy, sizes: &[(u32, usize)]) -> Simulation {
        let config = SimConfig {
            num_frames: NUM_FRAMES,
            max_frames_per_process: max_frames,
            strategy,
        };
        let mut sim = Simulation::new(config).expect("valid config");
        for &(pid, pages) in sizes {
            sim.add_process(Process::new(Pid(pid), pages * PAGE_SIZE))
                .expect("unique pid");
        }
        sim
    }

    fn va(pid: u32, page: usize) -> VirtualAddress {
        VirtualAddress::new(Pid(pid), page, 0)
    }

    fn resident(sim: &Simulation, pid: u32) -> Vec<usize> {
        sim.process(Pid(pid))
            .expect("process exists")
            .page_table()
            .resident_pages()
            .map(|(page, _)| page)
            .collect()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();
        assert!(config.validate().is_ok());
        config.max_frames_per_process = 0;
        assert!(matches!(Simulation::new(config), Err(Error::InvalidConfig(_))));
        config.max_frames_per_process = 1;
        config.num_frames = 0;
        assert!(matches!(Simulation::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_budget_larger_than_pool_rejected() {
        let config = SimConfig {
            num_frames: 1,
            max_frames_per_process: 2,
            strategy: ReplacementStrategy::Fifo,
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        assert!(matches!(Simulation::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_process_budgets_must_fit_pool() {
        let config = SimConfig {
            num_frames: 3,
            max_frames_per_process: 2,
            strategy: ReplacementStrategy::Lru,
        };
        let mut s = Simulation::new(config).unwrap();
        s.add_process(Process::new(Pid(1), 4 * PAGE_SIZE)).unwrap();
        let err = s.add_process(Process::new(Pid(2), 4 * PAGE_SIZE)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(s.process(Pid(2)).is_none());
    }

    #[test]
    fn test_full_pool_never_starves_a_process_under_budget() {
        // pool exactly as large as the combined budgets
        let config = SimConfig {
            num_frames: 4,
            max_frames_per_process: 2,
            strategy: ReplacementStrategy::Fifo,
        };
        let mut s = Simulation::new(config).unwrap();
        s.add_process(Process::new(Pid(1), 4 * PAGE_SIZE)).unwrap();
        s.add_process(Process::new(Pid(2), 4 * PAGE_SIZE)).unwrap();
        for page in 0..4 {
            s.access(va(1, page)).unwrap();
            s.access(va(2, page)).unwrap();
        }
        assert_eq!(s.frames().free_count(), 0);
        assert_eq!(s.total_faults(), 8);
        let faults: usize = s.processes().map(|p| p.page_faults()).sum();
        let resident: usize = s.processes().map(|p| p.rss()).sum();
        assert_eq!(faults, s.total_faults());
        assert_eq!(resident, 4);
        assert!(s.check_invariants().is_ok());
    }

    #[test]
    fn test_duplicate_process_rejected() {
        let mut s = sim(2, ReplacementStrategy::Fifo, &[(1, 4)]);
        let err = s.add_process(Process::new(Pid(1), 64)).unwrap_err();
        assert!(matches!(err, Error::DuplicateProcess(Pid(1))));
    }

    // =========================================================================
    // Hits and faults
    // =========================================================================

    #[test]
    fn test_first_access_faults_then_hits() {
        let mut s = sim(4, ReplacementStrategy::Fifo, &[(1, 4)]);

        let first = s.access(VirtualAddress::new(Pid(1), 2, 9)).unwrap();
        assert_eq!(first.kind, AccessKind::Fault { evicted: None });
        assert_eq!(first.physical.frame, FrameId(0));
        assert_eq!(first.physical.offset, 9);
        assert_eq!(first.rss, 1);

        let second = s.access(VirtualAddress::new(Pid(1), 2, 11)).unwrap();
        assert_eq!(second.kind, AccessKind::Hit);
        assert_eq!(second.physical.frame, FrameId(0));

        let p = s.process(Pid(1)).unwrap();
        assert_eq!(p.memory_accesses(), 2);
        assert_eq!(p.page_faults(), 1);
        assert_eq!(s.time(), 2);
    }

    #[test]
    fn test_hit_updates_recency_only() {
        let mut s = sim(4, ReplacementStrategy::Lru, &[(1, 4)]);
        s.run([va(1, 0), va(1, 1), va(1, 0)]).unwrap();
        let entry = s.process(Pid(1)).unwrap().page_table().entries()[0];
        assert_eq!(entry.loaded_at, 0);
        assert_eq!(entry.last_accessed_at, 2);
    }

    #[test]
    fn test_processes_share_frame_pool() {
        let mut s = sim(2, ReplacementStrategy::Fifo, &[(1, 4), (2, 4)]);
        let a = s.access(va(1, 0)).unwrap();
        let b = s.access(va(2, 0)).unwrap();
        let c = s.access(va(1, 3)).unwrap();
        assert_eq!(a.physical.frame, FrameId(0));
        assert_eq!(b.physical.frame, FrameId(1));
        assert_eq!(c.physical.frame, FrameId(2));
        assert_eq!(s.frames().free_count(), NUM_FRAMES - 3);
    }

    #[test]
    fn test_eviction_stays_within_process() {
        let mut s = sim(1, ReplacementStrategy::Fifo, &[(1, 4), (2, 4)]);
        s.run([va(1, 0), va(2, 0), va(1, 1)]).unwrap();
        assert_eq!(resident(&s, 1), vec![1]);
        assert_eq!(resident(&s, 2), vec![0]);
        assert!(s.check_invariants().is_ok());
    }

    #[test]
    fn test_victim_frame_is_reused_in_place() {
        let mut s = sim(1, ReplacementStrategy::Fifo, &[(1, 4)]);
        let first = s.access(va(1, 0)).unwrap();
        let second = s.access(va(1, 1)).unwrap();
        assert_eq!(second.kind, AccessKind::Fault { evicted: Some(0) });
        assert_eq!(first.physical.frame, second.physical.frame);
        assert_eq!(s.frames().free_count(), NUM_FRAMES - 1);
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    #[test]
    fn test_fifo_single_frame_thrashes() {
        let mut s = sim(1, ReplacementStrategy::Fifo, &[(1, 2)]);
        s.run([va(1, 0), va(1, 1), va(1, 0), va(1, 1)]).unwrap();

        let summary = s.summary();
        assert_eq!(summary.total_accesses, 4);
        assert_eq!(summary.total_faults, 4);
        let (_, stats) = summary.processes[0];
        assert_eq!(stats.fault_percent, 100.0);
        assert_eq!(stats.rss, 1);
    }

    #[test]
    fn test_lru_single_frame_matches_fifo() {
        let trace = [va(1, 0), va(1, 1), va(1, 0), va(1, 1)];
        let mut fifo = sim(1, ReplacementStrategy::Fifo, &[(1, 2)]);
        let mut lru = sim(1, ReplacementStrategy::Lru, &[(1, 2)]);

        let mut fifo_kinds = Vec::new();
        let mut lru_kinds = Vec::new();
        fifo.run_with(trace, |r| fifo_kinds.push(r.kind)).unwrap();
        lru.run_with(trace, |r| lru_kinds.push(r.kind)).unwrap();

        assert_eq!(fifo_kinds, lru_kinds);
        assert_eq!(lru.summary().total_faults, 4);
    }

    #[test]
    fn test_lru_evicts_least_recently_used() {
        let mut s = sim(2, ReplacementStrategy::Lru, &[(1, 4)]);
        let mut kinds = Vec::new();
        s.run_with([va(1, 0), va(1, 1), va(1, 0), va(1, 2)], |r| kinds.push(r.kind))
            .unwrap();

        assert_eq!(kinds[2], AccessKind::Hit);
        assert_eq!(kinds[3], AccessKind::Fault { evicted: Some(1) });
        assert_eq!(resident(&s, 1), vec![0, 2]);
    }

    #[test]
    fn test_fifo_evicts_oldest_despite_hit() {
        let mut s = sim(2, ReplacementStrategy::Fifo, &[(1, 4)]);
        s.run([va(1, 0), va(1, 1), va(1, 0), va(1, 2)]).unwrap();
        assert_eq!(resident(&s, 1), vec![1, 2]);
    }

    // =========================================================================
    // Fatal faults
    // =========================================================================

    #[test]
    fn test_invalid_page_halts_run() {
        let mut s = sim(2, ReplacementStrategy::Fifo, &[(1, 2)]);
        let mut seen = 0;
        let err = s
            .run_with([va(1, 0), va(1, 5), va(1, 1)], |_| seen += 1)
            .unwrap_err();

        assert!(matches!(err, Error::InvalidPage { page: 5, page_count: 2, .. }));
        assert_eq!(seen, 1);
        assert!(s.is_halted());

        // the faulting attempt is counted, the entry after it is never read
        let p = s.process(Pid(1)).unwrap();
        assert_eq!(p.memory_accesses(), 2);
        assert_eq!(p.page_faults(), 1);
        assert_eq!(s.total_accesses(), 2);

        assert!(matches!(s.access(va(1, 1)), Err(Error::Halted)));
        assert_eq!(s.total_accesses(), 2);
    }

    #[test]
    fn test_invalid_offset_on_partial_page() {
        let mut s = Simulation::new(SimConfig::default()).unwrap();
        s.add_process(Process::new(Pid(1), PAGE_SIZE + 10)).unwrap();

        assert!(s.access(VirtualAddress::new(Pid(1), 1, 9)).is_ok());
        let err = s.access(VirtualAddress::new(Pid(1), 1, 10)).unwrap_err();
        assert!(err.is_segfault());
        assert!(matches!(
            err,
            Error::InvalidOffset {
                offset: 10,
                page_len: 10,
                kind: AccessKind::Hit,
                ..
            }
        ));
        assert!(s.is_halted());
    }

    #[test]
    fn test_unknown_process() {
        let mut s = sim(2, ReplacementStrategy::Fifo, &[(1, 2)]);
        assert!(matches!(s.access(va(9, 0)), Err(Error::UnknownProcess(Pid(9)))));
        assert_eq!(s.total_accesses(), 0);
    }

    #[test]
    fn test_empty_trace_summary() {
        let s = sim(3, ReplacementStrategy::Lru, &[(2, 1), (1, 1)]);
        let summary = s.summary();
        assert_eq!(summary.total_accesses, 0);
        assert_eq!(summary.free_frames, NUM_FRAMES);
        let pids: Vec<_> = summary.processes.iter().map(|(pid, _)| *pid).collect();
        assert_eq!(pids, vec![Pid(1), Pid(2)]);
        assert_eq!(summary.processes[0].1.fault_percent, 0.0);
    }

    // =========================================================================
    // Properties
    // =========================================================================

    fn strategy_arb() -> impl Strategy<Value = ReplacementStrategy> {
        prop_oneof![Just(ReplacementStrategy::Fifo), Just(ReplacementStrategy::Lru)]
    }

    proptest! {
        /// Frame accounting and per-process budgets hold after every access.
        #[test]
        fn prop_invariants_hold(
            strategy in strategy_arb(),
            max_frames in 1_usize..6,
            trace in prop::collection::vec((1_u32..4, 0_usize..12), 0..200),
        ) {
            let config = SimConfig { num_frames: 16, max_frames_per_process: max_frames, strategy };
            let mut s = Simulation::new(config).unwrap();
            for pid in 1..4 {
                s.add_process(Process::new(Pid(pid), 12 * PAGE_SIZE)).unwrap();
            }
            for (pid, page) in trace {
                s.access(va(pid, page)).unwrap();
                prop_assert!(s.check_invariants().is_ok(), "{:?}", s.check_invariants());
            }
        }

        /// The evicted page was never younger (FIFO) or more recently used (LRU)
        /// than any page left resident.
        #[test]
        fn prop_victim_is_minimal(
            strategy in strategy_arb(),
            max_frames in 1_usize..5,
            trace in prop::collection::vec(0_usize..8, 1..150),
        ) {
            let config = SimConfig { num_frames: 8, max_frames_per_process: max_frames, strategy };
            let mut s = Simulation::new(config).unwrap();
            s.add_process(Process::new(Pid(1), 8 * PAGE_SIZE)).unwrap();

            for page in trace {
                let before = s.process(Pid(1)).unwrap().page_table().clone();
                let record = s.access(va(1, page)).unwrap();
                if let AccessKind::Fault { evicted: Some(victim) } = record.kind {
                    let key = |e: &crate::page_table::PageTableEntry| match strategy {
                        ReplacementStrategy::Fifo => e.loaded_at,
                        ReplacementStrategy::Lru => e.last_accessed_at,
                    };
                    let victim_key = key(&before.entries()[victim]);
                    for (other, _) in before.resident_pages() {
                        prop_assert!(victim_key <= key(&before.entries()[other]));
                    }
                }
            }
        }

        /// Fault percentage is exactly faults / accesses * 100.
        #[test]
        fn prop_fault_percent_matches_counters(
            trace in prop::collection::vec(0_usize..6, 0..60),
        ) {
            let mut s = sim(2, ReplacementStrategy::Lru, &[(1, 6)]);
            s.run(trace.iter().map(|&page| va(1, page))).unwrap();
            let p = s.process(Pid(1)).unwrap();
            if p.memory_accesses() == 0 {
                prop_assert_eq!(p.fault_percent(), 0.0);
            } else {
                let expected = (p.page_faults() as f64 / p.memory_accesses() as f64) * 100.0;
                prop_assert_eq!(p.fault_percent(), expected);
            }
        }
    }
}
