//! Fixed-width bit packing, least significant bit first.

use crate::error::{malformed, Result};

/// Bytes needed to pack `count` values of `width` bits.
pub fn packed_len(count: usize, width: u32) -> usize {
    (count * width as usize).div_ceil(8)
}

/// Append `values` packed at `width` bits each, padding the last byte with
/// zero bits.
pub fn pack_bits(values: &[u64], width: u32, out: &mut Vec<u8>) {
    debug_assert!((1..=64).contains(&width), "width must be in 1..=64");
    out.reserve(packed_len(values.len(), width));

    let mut acc: u128 = 0;
    let mut nbits: u32 = 0;
    for &v in values {
        debug_assert!(width == 64 || v >> width == 0, "value wider than width");
        acc |= (v as u128) << nbits;
        nbits += width;
        while nbits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            nbits -= 8;
        }
    }
    if nbits > 0 {
        out.push(acc as u8);
    }
}

/// Unpack `count` values of `width` bits from exactly
/// `packed_len(count, width)` bytes.
///
/// Padding bits in the final byte must be zero.
pub fn unpack_bits(bytes: &[u8], count: usize, width: u32) -> Result<Vec<u64>> {
    debug_assert!((1..=64).contains(&width), "width must be in 1..=64");
    debug_assert_eq!(bytes.len(), packed_len(count, width));

    let mask: u128 = (1u128 << width) - 1;
    let mut values = Vec::with_capacity(count);
    let mut acc: u128 = 0;
    let mut nbits: u32 = 0;
    let mut iter = bytes.iter();

    for _ in 0..count {
        while nbits < width {
            let byte = iter
                .next()
                .ok_or_else(|| malformed!("packed block shorter than {} values", count))?;
            acc |= (*byte as u128) << nbits;
            nbits += 8;
        }
        values.push((acc & mask) as u64);
        acc >>= width;
        nbits -= width;
    }

    if acc != 0 || iter.next().is_some() {
        return Err(malformed!("nonzero padding bits in packed block"));
    }
    Ok(values)
}
