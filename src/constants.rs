pub const KIB: usize = 1024;

// Every block in a fixed block page is a whole number of cells.
pub const CELL_SIZE: usize = 8;
pub const PAGE_ALIGN: usize = 8;

pub const FIXED_BLOCK_PAGE_SIZE: usize = 256 * KIB;

// measured in cells
pub const FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE: u32 = 128;

// Number of bits kept below the most significant bit when rounding a block
// size up to its bucket. Worst case waste is 1/2^BIT_LENGTH of the request.
pub const FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH: u32 = 2;
pub const FIXED_BLOCK_PAGE_BUCKET_BIT_MASK: u32 = (1 << FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH) - 1;

const _: () = assert!(FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH >= 1);
const _: () = assert!(FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE as usize * CELL_SIZE < FIXED_BLOCK_PAGE_SIZE);
