pub mod app;
pub mod constants;
pub mod error;
pub mod io;
pub mod memory;
pub mod page_table;
pub mod process;
pub mod replacement;
pub mod report;
pub mod simulation;
pub mod translation;

// Re-export commonly used items for convenience
pub use constants::*;
pub use error::{Error, Result};
pub use memory::{FrameId, FramePool};
pub use process::{Pid, Process, ProcessStats};
pub use replacement::ReplacementStrategy;
pub use simulation::{SimConfig, Simulation, SimulationSummary};
pub use translation::{AccessKind, AccessRecord, PhysicalAddress, VirtualAddress};
