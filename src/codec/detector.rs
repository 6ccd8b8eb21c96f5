use image::{Rgb, RgbImage};
use tracing::{debug, warn};

use super::{
    ec::{codeword_layout, codeword_len, data_capacity, data_layout, recover},
    layout::{
        header_band_bits, Header, Layout, SymbolEntry, FRAME, HEADER_EC_LEN, HEADER_MAX_LEN,
        HEADER_PREFIX_BITS,
    },
    mask::ModuleGrid,
    palette::{is_dark, nearest},
    writer::symbol_codewords,
    CodecFault, CodecResult, DecodeMode, DecodeStatus, Decoded,
};
use crate::common::{bit_utils::BitStream, metadata::side_size};

// Frame
//------------------------------------------------------------------------------

/// Located code frame: pixel corner, module size and extent in modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    x0: u32,
    y0: u32,
    ms: u32,
    cols: usize,
    rows: usize,
}

impl Frame {
    fn locate(img: &RgbImage) -> Option<Self> {
        let (w, h) = img.dimensions();
        let dark = |x: u32, y: u32| is_dark(img.get_pixel(x, y));

        // First dark pixel in row major order is the frame's outer corner
        let (x0, y0) = (0..h).flat_map(|y| (0..w).map(move |x| (x, y))).find(|&(x, y)| dark(x, y))?;

        let ms = (0..).take_while(|&k| x0 + k < w && y0 + k < h && dark(x0 + k, y0 + k)).count() as u32;
        let run_x = (x0..w).take_while(|&x| dark(x, y0)).count() as u32;
        let run_y = (y0..h).take_while(|&y| dark(x0, y)).count() as u32;
        if ms == 0 {
            return None;
        }

        let cols = ((run_x + ms / 2) / ms) as usize;
        let rows = ((run_y + ms / 2) / ms) as usize;
        let min_side = 2 * FRAME + side_size(1);
        if cols < min_side || rows < min_side {
            return None;
        }
        Some(Self { x0, y0, ms, cols, rows })
    }

    fn sample(&self, img: &RgbImage, x: usize, y: usize) -> Option<Rgb<u8>> {
        let px = self.x0 + x as u32 * self.ms + self.ms / 2;
        let py = self.y0 + y as u32 * self.ms + self.ms / 2;
        img.get_pixel_checked(px, py).copied()
    }

    fn inner_w(&self) -> usize {
        self.cols - 2 * FRAME
    }
}

// Decode
//------------------------------------------------------------------------------

pub(super) fn decode(img: &RgbImage, mode: DecodeMode, max_symbols: usize) -> CodecResult<Decoded> {
    let frame = Frame::locate(img).ok_or(CodecFault::NotFound)?;
    debug!("Frame of {}x{} modules at {} px per module", frame.cols, frame.rows, frame.ms);

    let header = read_header(img, &frame)?;
    let layout = Layout::new(&header.placements(), header_band_bits(header.to_bytes().len()));
    if layout.canvas_w != frame.cols || layout.canvas_h > frame.rows {
        return Err(CodecFault::InvalidHeader("layout doesn't match frame"));
    }

    let total = header.symbols.len();
    let limit = total.min(max_symbols);
    let mut data = Vec::new();
    let mut decoded = 0;
    for (i, entry) in header.symbols.iter().enumerate().take(limit) {
        match read_symbol(img, &frame, &header, entry, layout.origins[i]) {
            Ok(bytes) => {
                data.extend(bytes);
                decoded += 1;
            }
            Err(e) if i == 0 => return Err(CodecFault::MasterUnreadable(Box::new(e))),
            Err(e) => {
                warn!("Symbol {i} at position {} unreadable: {e}", *entry.position);
                match mode {
                    DecodeMode::Normal => break,
                    DecodeMode::Compatible => continue,
                }
            }
        }
    }

    let status = if decoded == total {
        DecodeStatus::Complete
    } else {
        DecodeStatus::Partial { decoded, total }
    };
    debug!("Decoded {decoded} of {total} symbol(s), {} bytes", data.len());
    Ok(Decoded { data, status })
}

fn read_header(img: &RgbImage, frame: &Frame) -> CodecResult<Header> {
    let inner_w = frame.inner_w();
    let read_bits = |from: usize, count: usize| {
        let mut bits = BitStream::new(count);
        for k in from..from + count {
            let px = frame.sample(img, FRAME + k % inner_w, FRAME + k / inner_w);
            bits.push(px.is_some_and(|p| is_dark(&p)));
        }
        bits
    };

    let header_len =
        read_bits(0, HEADER_PREFIX_BITS).take_bits(HEADER_PREFIX_BITS).unwrap_or(0) as usize;
    if !(1..=HEADER_MAX_LEN).contains(&header_len) {
        return Err(CodecFault::InvalidHeader("bad header length"));
    }

    let header_layout = data_layout(header_len, HEADER_EC_LEN);
    let cw_len = codeword_len(&header_layout);
    let band = read_bits(HEADER_PREFIX_BITS, cw_len * 8);
    let bytes = recover(band.data(), &header_layout)?;
    Header::from_bytes(&bytes)
}

fn read_symbol(
    img: &RgbImage,
    frame: &Frame,
    header: &Header,
    entry: &SymbolEntry,
    (ox, oy): (usize, usize),
) -> CodecResult<Vec<u8>> {
    let colors = header.colors;
    let (w, h) = (entry.version.width(), entry.version.height());

    let mut cells = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            let px = frame.sample(img, ox + x, oy + y).ok_or(CodecFault::Truncated)?;
            cells.push(nearest(colors, &px));
        }
    }
    let mut grid = ModuleGrid::new(w, h, cells);
    grid.apply_mask(header.mask, colors.count());

    let bpm = colors.bits_per_module();
    let mut bits = BitStream::new(w * h * bpm);
    grid.cells.iter().for_each(|&c| bits.push_bits(c, bpm));

    let layout = codeword_layout(symbol_codewords(&entry.version, colors), entry.ecc_level);
    if entry.data_len > data_capacity(&layout) {
        return Err(CodecFault::InvalidHeader("symbol data length exceeds capacity"));
    }
    let mut data = recover(bits.data(), &layout)?;
    data.truncate(entry.data_len);
    Ok(data)
}
