mod block;
mod decoder;
mod encoder;
mod galois;

pub(crate) use block::*;

use super::{CodecFault, CodecResult};

pub const MAX_BLOCK_SIZE: usize = 256;

pub const MAX_EC_SIZE: usize = 64;

// Reed-Solomon codewords are elements of GF(256), so no block may exceed 255 of them
const MAX_BLOCK_LEN: usize = 255;

// Share of each block spent on parity, indexed by ecc level 1-10
static ECC_PERCENT: [usize; 11] = [0, 4, 6, 8, 10, 12, 14, 16, 18, 20, 24];

/// Block shape as (data length, ecc length).
pub(crate) type BlockShape = (usize, usize);

// Block layout
//------------------------------------------------------------------------------

/// Splits a symbol's `total` codewords into blocks protected at `level`.
pub(crate) fn codeword_layout(total: usize, level: u8) -> Vec<BlockShape> {
    debug_assert!((1..=10).contains(&level), "Ecc level must be resolved before layout: {level}");
    if total < 4 {
        return Vec::new();
    }

    let count = total.div_ceil(MAX_BLOCK_LEN);
    let (base, extra) = (total / count, total % count);
    (0..count)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let ec_len = ((len * ECC_PERCENT[level as usize] / 100) & !1).clamp(2, MAX_EC_SIZE);
            let ec_len = ec_len.min(len - 1);
            (len - ec_len, ec_len)
        })
        .collect()
}

/// Splits `data_len` bytes into blocks that each carry `ec_len` parity codewords.
pub(crate) fn data_layout(data_len: usize, ec_len: usize) -> Vec<BlockShape> {
    debug_assert!(ec_len < MAX_EC_SIZE, "Ecc length overflow: {ec_len}");
    let per_block = MAX_BLOCK_LEN - ec_len;
    let count = data_len.div_ceil(per_block).max(1);
    let (base, extra) = (data_len / count, data_len % count);
    (0..count).map(|i| (base + usize::from(i < extra), ec_len)).collect()
}

pub(crate) fn data_capacity(layout: &[BlockShape]) -> usize {
    layout.iter().map(|(d, _)| d).sum()
}

pub(crate) fn codeword_len(layout: &[BlockShape]) -> usize {
    layout.iter().map(|(d, e)| d + e).sum()
}

// Protect & recover
//------------------------------------------------------------------------------

/// Appends parity to every block of `data`, which must fill the layout exactly.
pub(crate) fn protect(data: &[u8], layout: &[BlockShape]) -> Vec<u8> {
    debug_assert!(
        data.len() == data_capacity(layout),
        "Data len doesn't match layout capacity: Data len {}, Capacity {}",
        data.len(),
        data_capacity(layout)
    );

    let mut res = Vec::with_capacity(codeword_len(layout));
    let mut offset = 0;
    for &(dlen, ec_len) in layout {
        let blk = Block::encode(&data[offset..offset + dlen], ec_len);
        res.extend_from_slice(blk.codewords());
        offset += dlen;
    }
    res
}

/// Rectifies every block of `codewords` and returns the concatenated data.
pub(crate) fn recover(codewords: &[u8], layout: &[BlockShape]) -> CodecResult<Vec<u8>> {
    if codewords.len() < codeword_len(layout) {
        return Err(CodecFault::Truncated);
    }

    let mut res = Vec::with_capacity(data_capacity(layout));
    let mut offset = 0;
    for &(dlen, ec_len) in layout {
        let len = dlen + ec_len;
        let mut blk = Block::received(&codewords[offset..offset + len], dlen);
        res.extend_from_slice(blk.rectify()?);
        offset += len;
    }
    Ok(res)
}

#[cfg(test)]
mod ec_layout_tests {
    use test_case::test_case;

    use super::{
        codeword_layout, codeword_len, data_capacity, data_layout, protect, recover, MAX_EC_SIZE,
    };

    #[test_case(165, 3)]
    #[test_case(110, 1)]
    #[test_case(7884, 10)]
    #[test_case(2000, 5)]
    fn test_codeword_layout(total: usize, level: u8) {
        let layout = codeword_layout(total, level);
        assert_eq!(codeword_len(&layout), total);
        assert!(layout.iter().all(|&(d, e)| d + e <= 255 && e >= 2 && e <= MAX_EC_SIZE));
        assert!(layout.iter().all(|&(_, e)| e % 2 == 0));
    }

    #[test]
    fn test_codeword_layout_levels_monotonic() {
        let caps = (1..=10).map(|l| data_capacity(&codeword_layout(600, l))).collect::<Vec<_>>();
        assert!(caps.windows(2).all(|w| w[0] >= w[1]), "Capacities {caps:?}");
    }

    #[test]
    fn test_data_layout() {
        let layout = data_layout(370, 16);
        assert_eq!(data_capacity(&layout), 370);
        assert_eq!(layout.len(), 2);
        assert_eq!(data_layout(0, 16), vec![(0, 16)]);
    }

    #[test]
    fn test_protect_recover() {
        let data = (0..=255u8).cycle().take(600).collect::<Vec<_>>();
        let layout = data_layout(data.len(), 20);
        let mut cw = protect(&data, &layout);
        assert_eq!(cw.len(), codeword_len(&layout));

        // A few errors per block stay within correction capacity
        for (i, b) in cw.iter_mut().enumerate() {
            if i % 97 == 3 {
                *b ^= 0xff;
            }
        }
        assert_eq!(recover(&cw, &layout).unwrap(), data);
    }

    #[test]
    fn test_recover_truncated() {
        let layout = data_layout(10, 4);
        assert!(recover(&[0; 5], &layout).is_err());
    }
}
