use super::cell::{FixedBlockCell, FreeRange};
use super::constants::{CELL_SIZE, FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE, FIXED_BLOCK_PAGE_SIZE};
use super::error::AllocError;
use super::memory;
use super::sweep::SweepScope;
use super::tracker::AllocatedSizeTracker;
use core::mem::size_of;
use std::ptr::{self, NonNull};
use std::sync::Arc;

pub const FIXED_BLOCK_PAGE_CELL_COUNT: usize =
    (FIXED_BLOCK_PAGE_SIZE - size_of::<FixedBlockPage>()) / CELL_SIZE;

// The cells follow the header in the same region. They are only reached
// through `cells`, which carries the provenance of the whole region, so
// references to the header never cover block memory.
#[repr(C)]
pub struct FixedBlockPage {
    next_free: FreeRange,
    block_size: u32,
    end: u32,
    tracker: Arc<dyn AllocatedSizeTracker>,
    cells: NonNull<FixedBlockCell>,
}

const _: () = assert!(size_of::<FixedBlockPage>() % CELL_SIZE == 0);

#[derive(Clone, Copy)]
enum RangeSlot {
    Header,
    Cell(u32),
}

impl FixedBlockPage {
    pub fn create(
        block_size: u32,
        tracker: Arc<dyn AllocatedSizeTracker>,
    ) -> Result<NonNull<FixedBlockPage>, AllocError> {
        log::info!("FixedBlockPage::create({})", block_size);
        assert!(
            block_size > 0 && block_size <= FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE,
            "block size {} out of range for FixedBlockPage",
            block_size
        );

        let region = memory::safe_alloc(FIXED_BLOCK_PAGE_SIZE)?;
        let page = region.cast::<FixedBlockPage>();
        let end = Self::end_for(block_size);

        // cells are already zeroed by safe_alloc
        unsafe {
            let raw = page.as_ptr();
            let cells = region.as_ptr().add(size_of::<FixedBlockPage>()).cast::<FixedBlockCell>();

            ptr::addr_of_mut!((*raw).next_free).write(FreeRange::new(0, end));
            ptr::addr_of_mut!((*raw).block_size).write(block_size);
            ptr::addr_of_mut!((*raw).end).write(end);
            ptr::addr_of_mut!((*raw).tracker).write(tracker);
            ptr::addr_of_mut!((*raw).cells).write(NonNull::new_unchecked(cells));
        }

        Ok(page)
    }

    /// # Safety
    ///
    /// `page` must come from `create` and must not be used afterwards. Blocks
    /// handed out by the page dangle once it is destroyed.
    pub unsafe fn destroy(page: NonNull<FixedBlockPage>) {
        log::info!("FixedBlockPage({:p})::destroy()", page.as_ptr());

        ptr::drop_in_place(ptr::addr_of_mut!((*page.as_ptr()).tracker));
        memory::free(page.cast(), FIXED_BLOCK_PAGE_SIZE);
    }

    fn end_for(block_size: u32) -> u32 {
        FIXED_BLOCK_PAGE_CELL_COUNT as u32 / block_size * block_size
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_free.first >= self.end
    }

    #[inline]
    pub fn try_allocate(&mut self, block_size: u32) -> Option<NonNull<u8>> {
        assert_eq!(
            block_size, self.block_size,
            "allocating block of size {} in a FixedBlockPage with block size {}",
            block_size, self.block_size
        );

        let next = self.next_free.first;

        if next < self.next_free.last {
            self.next_free.first += block_size;
            return Some(self.block_address(next));
        }

        if next >= self.end {
            return None;
        }

        // The cursor sits on the last cell of its range, which holds the
        // next range of the chain.
        self.next_free = self.read_range(next);
        unsafe { self.cell_ptr(next).write(FixedBlockCell::ZERO) };

        log::trace!(
            "FixedBlockPage({:p}) followed chain to {:?}",
            self,
            self.next_free
        );

        Some(self.block_address(next))
    }

    pub fn on_page_overflow(&self) {
        assert!(self.is_exhausted(), "page must overflow");

        self.tracker.on_page_overflow(self.end as usize * CELL_SIZE);
    }

    pub fn sweep<S: SweepScope>(
        &mut self,
        scope: &mut S,
        finalizer_queue: &mut S::FinalizerQueue,
    ) -> bool {
        log::debug!("FixedBlockPage({:p})::sweep()", self);

        let block_size = self.block_size;
        let end = self.end;

        // the old chain is read from a copy while the new one overwrites it
        let mut old = self.next_free;
        let mut slot = RangeSlot::Header;
        let mut run_start = 0;
        let mut live_blocks = 0;
        let mut cell = 0;

        loop {
            while cell < old.first {
                if scope.sweep_object(self.block_address(cell), finalizer_queue) {
                    live_blocks += 1;

                    if run_start < cell {
                        slot = self.close_run(slot, run_start, cell);
                    }

                    run_start = cell + block_size;
                }

                cell += block_size;
            }

            if old.last >= end {
                break;
            }

            // skip the known free range, record cell included
            let record = old.last;

            old = self.read_range(record);
            cell = record + block_size;
        }

        self.zero_cells(run_start, cell.min(end));
        self.set_range(slot, FreeRange::new(run_start, end));

        self.tracker.after_sweep(live_blocks * block_size as usize * CELL_SIZE);

        let alive = self.next_free.first > 0 || self.next_free.last < end;
        log::debug!(
            "FixedBlockPage({:p}) swept: {} live blocks, alive: {}",
            self,
            live_blocks,
            alive
        );

        alive
    }

    pub fn get_allocated_blocks(&self) -> Vec<NonNull<u8>> {
        let mut allocated = vec![];
        let mut next_free = self.next_free;
        let mut cell = 0;

        loop {
            while cell < next_free.first {
                allocated.push(self.block_address(cell));
                cell += self.block_size;
            }

            if next_free.last >= self.end {
                break;
            }

            cell = next_free.last + self.block_size;
            next_free = self.read_range(next_free.last);
        }

        allocated
    }

    pub fn free_ranges(&self) -> Vec<FreeRange> {
        let mut range = self.next_free;
        let mut ranges = vec![range];

        while range.last < self.end {
            range = self.read_range(range.last);
            ranges.push(range);
        }

        ranges
    }

    fn close_run(&mut self, slot: RangeSlot, run_start: u32, live_cell: u32) -> RangeSlot {
        let last = live_cell - self.block_size;

        self.zero_cells(run_start, live_cell);
        self.set_range(slot, FreeRange::new(run_start, last));

        RangeSlot::Cell(last)
    }

    fn set_range(&mut self, slot: RangeSlot, range: FreeRange) {
        match slot {
            RangeSlot::Header => self.next_free = range,
            RangeSlot::Cell(cell) => unsafe {
                ptr::addr_of_mut!((*self.cell_ptr(cell)).next_free).write(range)
            },
        }
    }

    fn read_range(&self, cell: u32) -> FreeRange {
        // only called on the last cell of a free range
        unsafe { ptr::addr_of!((*self.cell_ptr(cell)).next_free).read() }
    }

    fn zero_cells(&mut self, from: u32, to: u32) {
        if from < to {
            unsafe { ptr::write_bytes(self.cell_ptr(from), 0, (to - from) as usize) }
        }
    }

    fn cell_ptr(&self, cell: u32) -> *mut FixedBlockCell {
        assert!(cell < self.end);

        unsafe { self.cells.as_ptr().add(cell as usize) }
    }

    fn block_address(&self, cell: u32) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked(self.cell_ptr(cell).cast()) }
    }
}
