use std::collections::BTreeSet;
use std::fmt;

use crate::process::Pid;

/// Physical frame number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub usize);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The (process, page) pair currently held by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOwner {
    pub pid: Pid,
    pub page: usize,
}

/// Tracks which physical frames are free and who owns the rest.
///
/// Frames are handed out lowest id first so runs are reproducible.
#[derive(Debug, Clone)]
pub struct FramePool {
    free: BTreeSet<usize>,
    owners: Vec<Option<FrameOwner>>,
}

impl FramePool {
    /// Create a pool of `num_frames` free frames, ids `0..num_frames`
    pub fn new(num_frames: usize) -> Self {
        FramePool {
            free: (0..num_frames).collect(),
            owners: vec![None; num_frames],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.owners.len()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn assigned_count(&self) -> usize {
        self.owners.iter().filter(|o| o.is_some()).count()
    }

    pub fn is_free(&self, frame: FrameId) -> bool {
        self.free.contains(&frame.0)
    }

    pub fn owner(&self, frame: FrameId) -> Option<FrameOwner> {
        self.owners.get(frame.0).copied().flatten()
    }

    /// Take the lowest free frame and record its owner
    pub fn allocate_free_frame(&mut self, owner: FrameOwner) -> Option<FrameId> {
        let frame = self.free.pop_first()?;
        self.owners[frame] = Some(owner);
        Some(FrameId(frame))
    }

    /// Hand an assigned frame straight to a new owner without freeing it
    pub fn reassign(&mut self, frame: FrameId, owner: FrameOwner) {
        debug_assert!(!self.is_free(frame), "reassigning free frame {}", frame);
        debug_assert!(
            self.owners[frame.0].is_some(),
            "reassigning unowned frame {}",
            frame
        );
        self.owners[frame.0] = Some(owner);
    }

    /// Return a frame to the free set
    pub fn release(&mut self, frame: FrameId) {
        let previous = self.owners[frame.0].take();
        assert!(previous.is_some(), "double release of frame {}", frame);
        self.free.insert(frame.0);
    }
}
