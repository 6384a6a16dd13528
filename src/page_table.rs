use crate::memory::FrameId;

/// Logical clock value; one tick per processed access.
pub type Tick = u64;

/// One row of a process's page table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTableEntry {
    pub present: bool,
    /// Only meaningful while `present`
    pub frame: FrameId,
    /// Tick of the most recent fault-in
    pub loaded_at: Tick,
    /// Tick of the most recent reference, hit or fault
    pub last_accessed_at: Tick,
}

impl PageTableEntry {
    /// The backing frame, if the page is resident
    #[inline]
    pub fn resident_frame(&self) -> Option<FrameId> {
        self.present.then_some(self.frame)
    }
}

/// Single-level page table with one entry per virtual page
#[derive(Debug, Clone)]
pub struct PageTable {
    entries: Vec<PageTableEntry>,
}

impl PageTable {
    /// Create a table of `page_count` non-present entries
    pub fn new(page_count: usize) -> Self {
        PageTable {
            entries: vec![PageTableEntry::default(); page_count],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_valid_index(&self, page: usize) -> bool {
        page < self.entries.len()
    }

    pub fn get(&self, page: usize) -> Option<&PageTableEntry> {
        self.entries.get(page)
    }

    pub fn entries(&self) -> &[PageTableEntry] {
        &self.entries
    }

    /// Number of resident pages (the resident set size)
    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| e.present).count()
    }

    /// Resident pages with their frames, in page order
    pub fn resident_pages(&self) -> impl Iterator<Item = (usize, FrameId)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(page, e)| e.resident_frame().map(|frame| (page, frame)))
    }

    /// Resident page with the smallest `loaded_at`, lowest index on ties
    pub fn oldest_resident(&self) -> Option<usize> {
        self.min_resident_by(|e| e.loaded_at)
    }

    /// Resident page with the smallest `last_accessed_at`, lowest index on ties
    pub fn least_recently_used_resident(&self) -> Option<usize> {
        self.min_resident_by(|e| e.last_accessed_at)
    }

    // forward scan with strict `<`, so the first minimum wins
    fn min_resident_by<F>(&self, key: F) -> Option<usize>
    where
        F: Fn(&PageTableEntry) -> Tick,
    {
        let mut best: Option<(usize, Tick)> = None;
        for (page, entry) in self.entries.iter().enumerate() {
            if !entry.present {
                continue;
            }
            let t = key(entry);
            match best {
                Some((_, best_t)) if t >= best_t => {}
                _ => best = Some((page, t)),
            }
        }
        best.map(|(page, _)| page)
    }

    /// Record a hit on a resident page
    pub(crate) fn touch(&mut self, page: usize, now: Tick) {
        let entry = &mut self.entries[page];
        debug_assert!(entry.present, "touch on non-resident page {}", page);
        entry.last_accessed_at = now;
    }

    /// Make a page resident in `frame` as of `now`
    pub(crate) fn load(&mut self, page: usize, frame: FrameId, now: Tick) {
        self.entries[page] = PageTableEntry {
            present: true,
            frame,
            loaded_at: now,
            last_accessed_at: now,
        };
    }

    /// Mark a resident page non-present and hand back its frame
    pub(crate) fn evict(&mut self, page: usize) -> FrameId {
        let entry = &mut self.entries[page];
        debug_assert!(entry.present, "evicting non-resident page {}", page);
        entry.present = false;
        entry.frame
    }
}
