use super::constants::{
    CELL_SIZE, FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH, FIXED_BLOCK_PAGE_BUCKET_BIT_MASK,
    FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE,
};

const SMALL_BUCKET_LIMIT: u32 = 2 << FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH;

// f32 stores 23 fraction bits below an 8 bit exponent biased by 127.
const F32_FRACTION_BITS: u32 = f32::MANTISSA_DIGITS - 1;
const F32_EXPONENT_BIAS: u32 = 127;

pub const MAX_EXACT_FLOAT_SIZE: u32 = 1 << f32::MANTISSA_DIGITS;

pub const FIXED_BLOCK_PAGE_BUCKET_COUNT: u32 = msb_bucket_index(FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE + 1);

// Keeps the BIT_LENGTH + 1 most significant bits and sets all lower ones.
#[inline]
pub fn bucket_size(block_size: u32) -> u32 {
    let shift = block_size.leading_zeros() + FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH + 1;

    block_size | u32::MAX.checked_shr(shift).unwrap_or(0)
}

#[inline]
pub fn bucket_index(block_size: u32) -> u32 {
    if block_size < SMALL_BUCKET_LIMIT {
        return block_size;
    }

    if cfg!(feature = "soft-float-buckets") || block_size > MAX_EXACT_FLOAT_SIZE {
        msb_bucket_index(block_size)
    } else {
        float_bucket_index(block_size)
    }
}

// exponent and top BIT_LENGTH fraction bits of the f32 encoding, rebased onto
// the small buckets
#[inline]
pub fn float_bucket_index(block_size: u32) -> u32 {
    if block_size < SMALL_BUCKET_LIMIT {
        return block_size;
    }

    assert!(
        block_size <= MAX_EXACT_FLOAT_SIZE,
        "block size {} is not exact as f32",
        block_size
    );

    let bits = (block_size as f32).to_bits();
    let bucket = bits >> (F32_FRACTION_BITS - FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH);

    bucket - ((F32_EXPONENT_BIAS + FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH - 1) << FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH)
}

// e.g. with a bit length of 3, 83 = 0b1010011 has msb 6 and fraction 0b010,
// giving (6 << 3 | 0b010) - (2 << 3)
#[inline]
pub const fn msb_bucket_index(block_size: u32) -> u32 {
    if block_size < SMALL_BUCKET_LIMIT {
        return block_size;
    }

    let msb = 31 - block_size.leading_zeros();
    let fraction = (block_size >> (msb - FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH)) & FIXED_BLOCK_PAGE_BUCKET_BIT_MASK;
    let bucket = (msb << FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH) | fraction;

    bucket - ((FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH - 1) << FIXED_BLOCK_PAGE_BUCKET_BIT_LENGTH)
}

pub const fn cells_for_bytes(bytes: usize) -> u64 {
    bytes.div_ceil(CELL_SIZE) as u64
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeClass {
    FixedBlock { block_size: u32, bucket: u32 },
    SingleObject,
}

impl SizeClass {
    pub fn for_cell_count(cell_count: u64) -> SizeClass {
        let cells = match u32::try_from(cell_count.max(1)) {
            Ok(cells) => cells,
            Err(_) => return SizeClass::SingleObject,
        };
        let block_size = bucket_size(cells);

        if block_size <= FIXED_BLOCK_PAGE_MAX_BLOCK_SIZE {
            SizeClass::FixedBlock {
                block_size,
                bucket: bucket_index(block_size),
            }
        } else {
            SizeClass::SingleObject
        }
    }

    pub fn for_bytes(bytes: usize) -> SizeClass {
        Self::for_cell_count(cells_for_bytes(bytes))
    }
}
