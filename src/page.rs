use super::error::AllocError;
use super::fixed_block_page::FixedBlockPage;
use super::single_object_page::SingleObjectPage;
use super::size_class::SizeClass;
use super::sweep::SweepScope;
use super::tracker::AllocatedSizeTracker;
use std::ptr::NonNull;
use std::sync::Arc;

pub enum Page {
    FixedBlock(NonNull<FixedBlockPage>),
    SingleObject(NonNull<SingleObjectPage>),
}

// A page is reachable only through its handle, so it can move between
// collector threads. Concurrent use of one page is still up to the caller.
unsafe impl Send for Page {}

impl Page {
    pub fn create(
        size_class: SizeClass,
        cell_count: u64,
        tracker: Arc<dyn AllocatedSizeTracker>,
    ) -> Result<Page, AllocError> {
        match size_class {
            SizeClass::FixedBlock { block_size, .. } => {
                FixedBlockPage::create(block_size, tracker).map(Page::FixedBlock)
            }
            SizeClass::SingleObject => {
                SingleObjectPage::create(cell_count, tracker).map(Page::SingleObject)
            }
        }
    }

    /// Gives the page back unless sweeping released it. Fixed block pages
    /// always come back, empty or not.
    pub fn sweep<S: SweepScope>(
        self,
        scope: &mut S,
        finalizer_queue: &mut S::FinalizerQueue,
    ) -> Option<Page> {
        match self {
            Page::FixedBlock(mut page) => {
                unsafe { page.as_mut().sweep(scope, finalizer_queue) };
                Some(self)
            }
            Page::SingleObject(page) => unsafe {
                SingleObjectPage::sweep_and_destroy(page, scope, finalizer_queue).then_some(self)
            },
        }
    }

    pub fn get_allocated_blocks(&self) -> Vec<NonNull<u8>> {
        unsafe {
            match self {
                Page::FixedBlock(page) => page.as_ref().get_allocated_blocks(),
                Page::SingleObject(page) => page.as_ref().get_allocated_blocks(),
            }
        }
    }

    /// # Safety
    ///
    /// Blocks handed out by the page dangle afterwards.
    pub unsafe fn destroy(self) {
        match self {
            Page::FixedBlock(page) => FixedBlockPage::destroy(page),
            Page::SingleObject(page) => SingleObjectPage::destroy(page),
        }
    }
}
