use super::constants::CELL_SIZE;
use super::error::AllocError;
use super::memory;
use super::size_class::{cells_for_bytes, SizeClass};
use super::sweep::SweepScope;
use super::tracker::AllocatedSizeTracker;
use core::mem::size_of;
use std::ptr::{self, NonNull};
use std::sync::Arc;

// The object starts right after the header and is only reached through
// `data`, which is derived from the region rather than from the header.
#[repr(C)]
pub struct SingleObjectPage {
    size: usize,
    object_size: usize,
    tracker: Arc<dyn AllocatedSizeTracker>,
    data: NonNull<u8>,
}

impl SingleObjectPage {
    pub fn create(
        cell_count: u64,
        tracker: Arc<dyn AllocatedSizeTracker>,
    ) -> Result<NonNull<SingleObjectPage>, AllocError> {
        log::info!("SingleObjectPage::create({})", cell_count);
        assert!(
            SizeClass::for_cell_count(cell_count) == SizeClass::SingleObject,
            "cell count {} too small for SingleObjectPage",
            cell_count
        );

        let size = usize::try_from(cell_count)
            .ok()
            .and_then(|cells| cells.checked_mul(CELL_SIZE))
            .and_then(|bytes| bytes.checked_add(size_of::<SingleObjectPage>()))
            .ok_or(AllocError::AllocOverflow)?;

        let region = memory::safe_alloc(size)?;
        let page = region.cast::<SingleObjectPage>();

        unsafe {
            let data = region.as_ptr().add(size_of::<SingleObjectPage>());

            page.as_ptr().write(SingleObjectPage {
                size,
                object_size: 0,
                tracker,
                data: NonNull::new_unchecked(data),
            });
        }

        Ok(page)
    }

    /// # Safety
    ///
    /// `page` must come from `create` and must not be used afterwards.
    pub unsafe fn destroy(page: NonNull<SingleObjectPage>) {
        log::info!("SingleObjectPage({:p})::destroy()", page.as_ptr());

        let size = page.as_ref().size;

        ptr::drop_in_place(page.as_ptr());
        memory::free(page.cast(), size);
    }

    pub fn data(&self) -> NonNull<u8> {
        self.data
    }

    pub fn capacity(&self) -> usize {
        self.size - size_of::<SingleObjectPage>()
    }

    pub fn page_size(&self) -> usize {
        self.size
    }

    pub fn object_size(&self) -> usize {
        self.object_size
    }

    pub fn allocate(&mut self, object_size: usize) -> NonNull<u8> {
        assert!(
            object_size <= self.capacity(),
            "object of {} bytes does not fit a SingleObjectPage of {} bytes",
            object_size,
            self.capacity()
        );

        self.object_size = object_size;
        self.tracker.record_difference(object_size as isize, false);

        self.data()
    }

    /// Returns whether the object is still alive. On `false` the page is gone.
    ///
    /// # Safety
    ///
    /// `page` must come from `create`. After a `false` result it dangles, as
    /// does the object address.
    pub unsafe fn sweep_and_destroy<S: SweepScope>(
        page: NonNull<SingleObjectPage>,
        scope: &mut S,
        finalizer_queue: &mut S::FinalizerQueue,
    ) -> bool {
        let this = page.as_ref();
        log::debug!("SingleObjectPage({:p})::sweep_and_destroy()", this);

        if scope.sweep_object(this.data(), finalizer_queue) {
            return true;
        }

        let size = cells_for_bytes(this.object_size) as usize * CELL_SIZE;
        this.tracker.record_difference(-(size as isize), false);

        Self::destroy(page);

        false
    }

    pub fn get_allocated_blocks(&self) -> Vec<NonNull<u8>> {
        vec![self.data()]
    }
}
