// The fuzzer keeps an in memory copy of every value it considers alive.
//
// Each thread owns its pages, allocates into them, drops some values and
// sweeps, all while the other threads do the same to their own pages.
use cellpage::{
    FixedBlockPage, HeapSizeTracker, SingleObjectPage, SizeClass, SweepScope, CELL_SIZE,
    FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE,
};
use rand::prelude::*;
use std::collections::{HashMap, HashSet};
use std::ptr::NonNull;
use std::sync::Arc;

unsafe impl Send for Fuzzer {}

#[derive(Clone)]
struct Value {
    data: Vec<u8>,
}

impl Value {
    fn new(size: usize) -> Self {
        let mut data = Vec::with_capacity(size);
        let mut rng = rand::thread_rng();

        for _ in 0..size {
            let n: u8 = rng.gen();

            data.push(n);
        }

        Self { data }
    }
}

struct Roots<'a> {
    values: &'a HashMap<usize, Value>,
}

impl SweepScope for Roots<'_> {
    type FinalizerQueue = usize;

    fn sweep_object(&mut self, object: NonNull<u8>, finalized: &mut usize) -> bool {
        let alive = self.values.contains_key(&(object.as_ptr() as usize));

        if !alive {
            *finalized += 1;
        }

        alive
    }
}

struct Fuzzer {
    block_size: u32,
    pages: Vec<NonNull<FixedBlockPage>>,
    large: Vec<NonNull<SingleObjectPage>>,
    values: HashMap<usize, Value>,
    tracker: Arc<HeapSizeTracker>,
}

impl Fuzzer {
    fn new(block_size: u32, tracker: Arc<HeapSizeTracker>) -> Self {
        Self {
            block_size,
            pages: vec![],
            large: vec![],
            values: HashMap::new(),
            tracker,
        }
    }

    fn assert(&self) {
        for (ptr, value) in self.values.iter() {
            for (i, v) in value.data.iter().enumerate() {
                unsafe { assert!(*(*ptr as *const u8).add(i) == *v) }
            }
        }

        let mut allocated = HashSet::new();

        unsafe {
            for page in self.pages.iter() {
                let page = page.as_ref();
                let mut free = HashSet::new();

                for range in page.free_ranges() {
                    free.extend((range.first..range.last).step_by(self.block_size as usize));

                    if range.last < page.end() {
                        free.insert(range.last);
                    }
                }

                let blocks = page.get_allocated_blocks();
                assert_eq!(free.len() + blocks.len(), (page.end() / self.block_size) as usize);

                allocated.extend(blocks.iter().map(|ptr| ptr.as_ptr() as usize));
            }

            for page in self.large.iter() {
                allocated.extend(page.as_ref().get_allocated_blocks().iter().map(|ptr| ptr.as_ptr() as usize));
            }
        }

        for ptr in self.values.keys() {
            assert!(allocated.contains(ptr));
        }
    }

    fn alloc(&mut self) {
        let mut rng = rand::thread_rng();

        for _ in 0..ALLOC_LOOPS {
            let (dest, size) = if rng.gen_range(0..100) < 2 {
                self.alloc_large(&mut rng)
            } else {
                self.alloc_fixed()
            };

            let value = Value::new(size);

            unsafe {
                std::ptr::copy_nonoverlapping(value.data.as_ptr(), dest.as_ptr(), size);
            }

            let coin_flip = rng.gen_range(0..100);
            if coin_flip < 20 {
                self.values.insert(dest.as_ptr() as usize, value);
            } else {
                // this is garbage and will be swept
            }
        }
    }

    fn alloc_fixed(&mut self) -> (NonNull<u8>, usize) {
        let size = self.block_size as usize * CELL_SIZE;

        loop {
            if let Some(page) = self.pages.last_mut() {
                let page = unsafe { page.as_mut() };

                if let Some(ptr) = page.try_allocate(self.block_size) {
                    return (ptr, size);
                }

                page.on_page_overflow();
            }

            let page = FixedBlockPage::create(self.block_size, self.tracker.clone()).unwrap();
            self.pages.push(page);
        }
    }

    fn alloc_large(&mut self, rng: &mut ThreadRng) -> (NonNull<u8>, usize) {
        let cells = rng.gen_range(FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE as u64 + 1..4096);
        let size = cells as usize * CELL_SIZE - rng.gen_range(0..CELL_SIZE);

        let mut page = SingleObjectPage::create(cells, self.tracker.clone()).unwrap();
        let ptr = unsafe { page.as_mut().allocate(size) };

        self.large.push(page);

        (ptr, size)
    }

    fn release_some(&mut self) {
        let mut rng = rand::thread_rng();

        self.values.retain(|_, _| rng.gen_range(0..100) >= 30);
    }

    fn sweep(&mut self) {
        let mut finalized = 0;
        let mut roots = Roots { values: &self.values };

        let mut pages = vec![];
        for mut page in self.pages.drain(..) {
            if unsafe { page.as_mut().sweep(&mut roots, &mut finalized) } {
                pages.push(page);
            } else {
                unsafe { FixedBlockPage::destroy(page) };
            }
        }

        let mut large = vec![];
        for page in self.large.drain(..) {
            if unsafe { SingleObjectPage::sweep_and_destroy(page, &mut roots, &mut finalized) } {
                large.push(page);
            }
        }

        self.pages = pages;
        self.large = large;
    }

    fn teardown(self) {
        unsafe {
            for page in self.pages {
                FixedBlockPage::destroy(page);
            }

            for page in self.large {
                SingleObjectPage::destroy(page);
            }
        }
    }
}

const NUM_THREADS: usize = 16;
const SWEEP_LOOPS: usize = 10;
const ALLOC_LOOPS: usize = 2000;

#[test]
fn fuzz() {
    let tracker = Arc::new(HeapSizeTracker::new());
    let mut rng = rand::thread_rng();
    let mut fuzzers = vec![];

    for _ in 0..NUM_THREADS {
        let size_class = SizeClass::for_cell_count(rng.gen_range(1..=FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE as u64));
        let block_size = match size_class {
            SizeClass::FixedBlock { block_size, .. } => block_size,
            SizeClass::SingleObject => 1,
        };

        fuzzers.push(Fuzzer::new(block_size, tracker.clone()));
    }

    for l in 1..=SWEEP_LOOPS {
        println!("=== SWEEP LOOP {l} ===");

        let mut join_handles = vec![];

        for mut fuzzer in fuzzers.drain(..) {
            fuzzer.assert();

            let jh = std::thread::spawn(move || {
                fuzzer.alloc();
                fuzzer.assert();
                fuzzer.release_some();
                fuzzer.sweep();
                fuzzer.assert();
                fuzzer
            });

            join_handles.push(jh);
        }

        for jh in join_handles.into_iter() {
            fuzzers.push(jh.join().unwrap());
        }

        let live = tracker.take_swept_live_bytes();
        let mb = (live as f64 / 1024.0) / 1024.0;
        println!("LIVE AFTER SWEEP: {:.2} mb", mb);
    }

    for fuzzer in fuzzers {
        fuzzer.teardown();
    }
}
