use super::constants::CELL_SIZE;

/// A run of free cells inside a fixed block page, in cell indices.
///
/// Cells `[first, last)` can be handed out by bumping `first`. When
/// `last` is below the page end, the cell at `last` is free as well and holds
/// the next `FreeRange` of the chain. `last == end` terminates the chain.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeRange {
    pub first: u32,
    pub last: u32,
}

impl FreeRange {
    pub const fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }
}

// Which field is meaningful is decided by the free chain alone: a cell is
// only ever read as `next_free` when the chain says it is the last cell of a
// free range. Live cells are opaque payload.
#[repr(C, align(8))]
#[derive(Clone, Copy)]
pub(crate) union FixedBlockCell {
    pub data: [u8; CELL_SIZE],
    pub next_free: FreeRange,
}

impl FixedBlockCell {
    pub const ZERO: FixedBlockCell = FixedBlockCell { data: [0; CELL_SIZE] };
}
