// virtual addresses are 16 bits: 10 bits of page number, 6 bits of offset
pub const OFFSET_BITS: u32 = 6;
pub const PAGE_BITS: u32 = 10;
pub const ADDRESS_BITS: u32 = PAGE_BITS + OFFSET_BITS;

pub const PAGE_SIZE: usize = 1 << OFFSET_BITS;
pub const MAX_PAGES: usize = 1 << PAGE_BITS;

pub const OFFSET_MASK: u16 = (1 << OFFSET_BITS) - 1;
pub const PAGE_MASK: u16 = (1 << PAGE_BITS) - 1;

pub const NUM_FRAMES: usize = 512;
pub const DEFAULT_MAX_FRAMES: usize = 10;
