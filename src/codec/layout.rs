use std::collections::HashSet;

use super::{
    ec::{codeword_len, data_layout},
    mask::MaskPattern,
    CodecFault, CodecResult,
};
use crate::common::metadata::{
    ColorNumber, SideVersion, SymbolPosition, MAX_ECC_LEVEL, MAX_SIDE_VERSION, MAX_SYMBOL_NUMBER,
};

// Global constants
//------------------------------------------------------------------------------

pub(crate) const HEADER_MAGIC: u8 = b'J';

pub(crate) const HEADER_EC_LEN: usize = 16;

const HEADER_FIXED_LEN: usize = 4;

const HEADER_ENTRY_LEN: usize = 6;

pub(crate) const HEADER_MAX_LEN: usize = HEADER_FIXED_LEN + HEADER_ENTRY_LEN * MAX_SYMBOL_NUMBER;

// Light margin around the frame, in modules
pub(crate) const QUIET_ZONE: usize = 2;

// Dark border plus light gap on each side of the content
pub(crate) const FRAME: usize = 2;

// Bits spent on the header length prefix
pub(crate) const HEADER_PREFIX_BITS: usize = 16;

// Header
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SymbolEntry {
    pub position: SymbolPosition,
    pub version: SideVersion,
    pub ecc_level: u8,
    pub data_len: usize,
}

/// Layout description carried in the two-tone band above the symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub colors: ColorNumber,
    pub mask: MaskPattern,
    pub symbols: Vec<SymbolEntry>,
}

impl Header {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut res = Vec::with_capacity(HEADER_FIXED_LEN + HEADER_ENTRY_LEN * self.symbols.len());
        res.extend([HEADER_MAGIC, self.colors.count() as u8, *self.mask, self.symbols.len() as u8]);
        for s in self.symbols.iter() {
            let [hi, lo] = (s.data_len as u16).to_be_bytes();
            res.extend([*s.position, s.version.x, s.version.y, s.ecc_level, hi, lo]);
        }
        res
    }

    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() < HEADER_FIXED_LEN {
            return Err(CodecFault::InvalidHeader("too short"));
        }
        if bytes[0] != HEADER_MAGIC {
            return Err(CodecFault::InvalidHeader("bad magic"));
        }
        let colors =
            ColorNumber::from_count(bytes[1]).ok_or(CodecFault::InvalidHeader("bad color number"))?;
        if bytes[2] >= 8 {
            return Err(CodecFault::InvalidHeader("bad mask reference"));
        }
        let mask = MaskPattern::new(bytes[2]);
        let count = bytes[3] as usize;
        if !(1..=MAX_SYMBOL_NUMBER).contains(&count) {
            return Err(CodecFault::InvalidHeader("bad symbol number"));
        }
        if bytes.len() != HEADER_FIXED_LEN + HEADER_ENTRY_LEN * count {
            return Err(CodecFault::InvalidHeader("length mismatch"));
        }

        let mut seen = HashSet::with_capacity(count);
        let mut symbols = Vec::with_capacity(count);
        for (i, e) in bytes[HEADER_FIXED_LEN..].chunks_exact(HEADER_ENTRY_LEN).enumerate() {
            let (pos, vx, vy, ecc) = (e[0], e[1], e[2], e[3]);
            if pos as usize >= MAX_SYMBOL_NUMBER || !seen.insert(pos) || (i == 0 && pos != 0) {
                return Err(CodecFault::InvalidHeader("bad symbol position"));
            }
            let ver_range = 1..=MAX_SIDE_VERSION;
            if !ver_range.contains(&vx) || !ver_range.contains(&vy) {
                return Err(CodecFault::InvalidHeader("bad symbol version"));
            }
            if !(1..=MAX_ECC_LEVEL).contains(&ecc) {
                return Err(CodecFault::InvalidHeader("bad ecc level"));
            }
            symbols.push(SymbolEntry {
                position: SymbolPosition::new(pos),
                version: SideVersion::new(vx, vy),
                ecc_level: ecc,
                data_len: u16::from_be_bytes([e[4], e[5]]) as usize,
            });
        }

        Ok(Self { colors, mask, symbols })
    }

    pub fn placements(&self) -> Vec<(SymbolPosition, SideVersion)> {
        self.symbols.iter().map(|s| (s.position, s.version)).collect()
    }
}

/// Modules needed by the header band for a header of `header_len` bytes.
pub(crate) fn header_band_bits(header_len: usize) -> usize {
    HEADER_PREFIX_BITS + 8 * codeword_len(&data_layout(header_len, HEADER_EC_LEN))
}


// Grid layout
//------------------------------------------------------------------------------

/// Module geometry of a composite code. Coordinates are in modules, relative to the
/// outer corner of the frame; the quiet zone lies outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    // Width of each grid column and height of each grid row
    pub cols: Vec<usize>,
    pub rows: Vec<usize>,
    pub inner_w: usize,
    pub band_rows: usize,
    pub canvas_w: usize,
    pub canvas_h: usize,
    // Top left module of each symbol
    pub origins: Vec<(usize, usize)>,
}

impl Layout {
    pub fn new(placements: &[(SymbolPosition, SideVersion)], band_bits: usize) -> Self {
        let offsets = placements.iter().map(|(p, _)| p.offset()).collect::<Vec<_>>();
        let min_x = offsets.iter().map(|o| o.0).min().unwrap_or(0);
        let max_x = offsets.iter().map(|o| o.0).max().unwrap_or(0);
        let min_y = offsets.iter().map(|o| o.1).min().unwrap_or(0);
        let max_y = offsets.iter().map(|o| o.1).max().unwrap_or(0);

        let mut cols = vec![0; (max_x - min_x + 1) as usize];
        let mut rows = vec![0; (max_y - min_y + 1) as usize];
        for (&(x, y), (_, v)) in offsets.iter().zip(placements) {
            let (cx, cy) = ((x - min_x) as usize, (y - min_y) as usize);
            cols[cx] = cols[cx].max(v.width());
            rows[cy] = rows[cy].max(v.height());
        }

        let inner_w = cols.iter().sum::<usize>();
        let band_rows = band_bits.div_ceil(inner_w.max(1));
        let grid_top = FRAME + band_rows + 1;

        let origins = offsets
            .iter()
            .map(|&(x, y)| {
                let cx = (x - min_x) as usize;
                let cy = (y - min_y) as usize;
                (FRAME + cols[..cx].iter().sum::<usize>(), grid_top + rows[..cy].iter().sum::<usize>())
            })
            .collect();

        let canvas_w = inner_w + 2 * FRAME;
        let canvas_h = grid_top + rows.iter().sum::<usize>() + FRAME;

        Self { cols, rows, inner_w, band_rows, canvas_w, canvas_h, origins }
    }

    /// Module holding bit `k` of the header band.
    pub fn band_module(&self, k: usize) -> (usize, usize) {
        (FRAME + k % self.inner_w, FRAME + k / self.inner_w)
    }
}

#[cfg(test)]
mod layout_tests {
    use super::{Layout, FRAME};
    use crate::common::metadata::{SideVersion, SymbolPosition};

    #[test]
    fn test_single_symbol() {
        let layout = Layout::new(&[(SymbolPosition::MASTER, SideVersion::new(1, 2))], 100);
        assert_eq!(layout.cols, vec![21]);
        assert_eq!(layout.rows, vec![25]);
        assert_eq!(layout.band_rows, 5);
        assert_eq!(layout.origins, vec![(FRAME, FRAME + 5 + 1)]);
        assert_eq!(layout.canvas_w, 21 + 4);
        assert_eq!(layout.canvas_h, FRAME + 5 + 1 + 25 + FRAME);
        assert_eq!(layout.band_module(22), (FRAME + 1, FRAME + 1));
    }

    #[test]
    fn test_multi_symbol_grid() {
        // Master, slave above (slot 1) and slave to the left (slot 2)
        let placements = [
            (SymbolPosition::MASTER, SideVersion::new(2, 2)),
            (SymbolPosition::new(1), SideVersion::new(2, 1)),
            (SymbolPosition::new(2), SideVersion::new(1, 2)),
        ];
        let layout = Layout::new(&placements, 10);
        assert_eq!(layout.cols, vec![21, 25]);
        assert_eq!(layout.rows, vec![21, 25]);
        assert_eq!(layout.inner_w, 46);
        assert_eq!(layout.band_rows, 1);
        let top = FRAME + 1 + 1;
        assert_eq!(layout.origins, vec![(FRAME + 21, top + 21), (FRAME + 21, top), (FRAME, top + 21)]);
    }
}
