use core::alloc::LayoutError;
use thiserror::Error;

impl From<LayoutError> for AllocError {
    fn from(_: LayoutError) -> Self {
        Self::LayoutError
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("out of memory: failed to acquire {requested} bytes")]
    OutOfMemory { requested: usize },

    #[error("page size computation overflowed")]
    AllocOverflow,

    #[error("invalid page layout")]
    LayoutError,
}
