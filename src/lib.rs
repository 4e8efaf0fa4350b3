mod cell;
mod constants;
mod error;
mod fixed_block_page;
mod memory;
mod page;
mod single_object_page;
mod size_class;
mod sweep;
mod tracker;

pub use cell::FreeRange;
pub use constants::{
    CELL_SIZE, FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH, FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE,
    FIXED_BLOCK_PAGE_SIZE,
};
pub use error::AllocError;
pub use fixed_block_page::{FixedBlockPage, FIXED_BLOCK_PAGE_CELL_COUNT};
pub use memory::mapped_bytes;
pub use page::Page;
pub use single_object_page::SingleObjectPage;
pub use size_class::{
    bucket_index, bucket_size, cells_for_bytes, float_bucket_index, msb_bucket_index, SizeClass,
    FIXED_BLOCK_PAGE_BUCKET_COUNT, MAX_EXACT_FLOAT_SIZE,
};
pub use sweep::SweepScope;
pub use tracker::{AllocatedSizeTracker, HeapSizeTracker, TrackerStats};
