//! Conversions between signal values (`BitVec<u32>`, LSB first) and
//! integers or binary strings.

use bitvec::{field::BitField, order::Lsb0, vec::BitVec};

pub fn from_u64(value: u64, width: usize) -> BitVec<u32> {
    let mut bit_vec = BitVec::<u32, Lsb0>::repeat(false, 64);
    bit_vec.store_le(value);
    bit_vec.resize(width, false);
    bit_vec
}

/// `None` if a bit above bit 63 is set.
pub fn to_u64(bit_vec: &BitVec<u32>) -> Option<u64> {
    if bit_vec.len() > 64 && bit_vec[64..].any() {
        return None;
    }
    let len = bit_vec.len().min(64);
    if len == 0 {
        return Some(0);
    }
    Some(bit_vec[..len].load_le::<u64>())
}

/// Zero-extends or truncates `bit_vec` to `width`. Truncation that would drop
/// a set bit yields `None`.
pub fn fit_to_width(bit_vec: &BitVec<u32>, width: usize) -> Option<BitVec<u32>> {
    if bit_vec.len() > width && bit_vec[width..].any() {
        return None;
    }
    let mut fitted = bit_vec.clone();
    fitted.resize(width, false);
    Some(fitted)
}

/// Binary digits, most significant first.
pub fn binary(bit_vec: &BitVec<u32>) -> String {
    bit_vec
        .iter()
        .rev()
        .map(|b| if *b { '1' } else { '0' })
        .collect()
}
