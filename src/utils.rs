/// copy up to `N` little endian bytes into a fixed size array, zero filling the rest
pub(crate) fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut arr = [0; N];
    bytes
        .iter()
        .take(N)
        .enumerate()
        .for_each(|(idx, value)| arr[idx] = *value);
    arr
}

/// byte count header that precedes every binary block when `header_type="UInt64"`
pub(crate) fn block_header(num_bytes: usize) -> [u8; 8] {
    (num_bytes as u64).to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_zero_filled() {
        let arr: [u8; 4] = le_array(&[1, 2]);
        assert_eq!(arr, [1, 2, 0, 0]);
    }

    #[test]
    fn header_is_little_endian_u64() {
        assert_eq!(block_header(24), [24, 0, 0, 0, 0, 0, 0, 0]);
    }
}
