use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use tracing::debug;

use super::{
    ec::{codeword_layout, data_capacity, data_layout, protect},
    layout::{header_band_bits, Header, Layout, SymbolEntry, HEADER_EC_LEN, QUIET_ZONE},
    mask::{apply_best_mask, ModuleGrid},
    palette::{color_of, DARK, LIGHT},
    CodecFault, CodecResult, EncodeParams,
};
use crate::common::{
    bit_utils::BitStream,
    metadata::{
        find_host, ColorNumber, SideVersion, SymbolPosition, DEFAULT_ECC_LEVEL, MAX_ECC_LEVEL,
        MAX_SIDE_VERSION,
    },
};

// Global constants
//------------------------------------------------------------------------------

// Largest rendered image, in pixels
pub(crate) const MAX_CANVAS_PIXELS: u64 = 1 << 28;

// Generate
//------------------------------------------------------------------------------

pub(super) fn generate(params: &EncodeParams, data: &[u8]) -> CodecResult<RgbImage> {
    if data.is_empty() {
        return Err(CodecFault::EmptyData);
    }

    let n = params.symbol_number as usize;
    let colors = params.color_number;
    if params.symbol_positions.len() != n
        || params.symbol_versions.len() != n
        || params.symbol_ecc_levels.len() != n
    {
        return Err(CodecFault::InvalidLayout(format!(
            "per-symbol parameters must hold {n} entries"
        )));
    }

    let positions = &params.symbol_positions;
    let levels = resolve_ecc_levels(params, positions)?;
    let versions = resolve_versions(params, data.len(), levels[0])?;

    let layouts = versions
        .iter()
        .zip(levels.iter())
        .map(|(v, &l)| codeword_layout(symbol_codewords(v, colors), l))
        .collect::<Vec<_>>();
    let capacity = layouts.iter().map(|l| data_capacity(l)).sum::<usize>();
    if data.len() > capacity {
        return Err(CodecFault::DataTooLong { len: data.len(), capacity });
    }
    debug!("Payload {} bytes, capacity {capacity} bytes over {n} symbol(s)", data.len());

    // Fill symbols in order, the last ones may stay empty
    let mut rest = data;
    let mut entries = Vec::with_capacity(n);
    let mut grids = Vec::with_capacity(n);
    for i in 0..n {
        let cap = data_capacity(&layouts[i]);
        let (chunk, tail) = rest.split_at(cap.min(rest.len()));
        rest = tail;

        let mut padded = chunk.to_vec();
        padded.resize(cap, 0);
        let codewords = protect(&padded, &layouts[i]);
        grids.push(fill_modules(&codewords, versions[i], colors));
        entries.push(SymbolEntry {
            position: positions[i],
            version: versions[i],
            ecc_level: levels[i],
            data_len: chunk.len(),
        });
    }

    let mask = apply_best_mask(&mut grids, colors.count());
    debug!("Selected mask {}", *mask);

    let header = Header { colors, mask, symbols: entries };
    let header_bytes = header.to_bytes();
    let header_cw = protect(&header_bytes, &data_layout(header_bytes.len(), HEADER_EC_LEN));

    let layout = Layout::new(&header.placements(), header_band_bits(header_bytes.len()));
    let module_size = module_size(params, versions[0]);
    let (width, height) = canvas_size(&layout, module_size)?;
    debug!(
        "Rendering {}x{} modules at {module_size} px per module, {width}x{height} px",
        layout.canvas_w, layout.canvas_h
    );

    let mut img = RgbImage::from_pixel(width, height, LIGHT);
    render(&mut img, &layout, header_bytes.len(), &header_cw, &grids, colors, module_size);
    Ok(img)
}

fn resolve_ecc_levels(params: &EncodeParams, positions: &[SymbolPosition]) -> CodecResult<Vec<u8>> {
    let mut levels: Vec<u8> = Vec::with_capacity(positions.len());
    for (i, lvl) in params.symbol_ecc_levels.iter().enumerate() {
        let lvl = **lvl;
        if lvl > MAX_ECC_LEVEL {
            return Err(CodecFault::InvalidLayout(format!("ecc level {lvl} out of range")));
        }
        let resolved = match (lvl, i) {
            (0, 0) => DEFAULT_ECC_LEVEL,
            (0, _) => find_host(positions, i).map_or(levels[0], |h| levels[h]),
            (l, _) => l,
        };
        levels.push(resolved);
    }
    Ok(levels)
}

fn resolve_versions(
    params: &EncodeParams,
    data_len: usize,
    master_level: u8,
) -> CodecResult<Vec<SideVersion>> {
    if let [None] = params.symbol_versions.as_slice() {
        return Ok(vec![fit_square_version(data_len, params.color_number, master_level)?]);
    }
    params
        .symbol_versions
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| CodecFault::InvalidLayout(format!("no side version for symbol {i}")))
        })
        .collect()
}

// Smallest square symbol holding the whole payload
fn fit_square_version(data_len: usize, colors: ColorNumber, level: u8) -> CodecResult<SideVersion> {
    let cap = |v: u8| {
        let ver = SideVersion::square(v);
        data_capacity(&codeword_layout(symbol_codewords(&ver, colors), level))
    };
    (1..=MAX_SIDE_VERSION)
        .find(|&v| cap(v) >= data_len)
        .map(SideVersion::square)
        .ok_or_else(|| CodecFault::DataTooLong { len: data_len, capacity: cap(MAX_SIDE_VERSION) })
}

pub(super) fn symbol_codewords(ver: &SideVersion, colors: ColorNumber) -> usize {
    ver.width() * ver.height() * colors.bits_per_module() / 8
}

// A requested master width or height in pixels overrides the module size
fn module_size(params: &EncodeParams, master: SideVersion) -> u32 {
    let (w, h) = (master.width() as u32, master.height() as u32);
    let size = match (params.master_symbol_width, params.master_symbol_height) {
        (0, 0) => params.module_size,
        (sw, 0) => sw / w,
        (0, sh) => sh / h,
        (sw, sh) => (sw / w).min(sh / h),
    };
    size.max(1)
}

/// Pixel size of the rendered code, quiet zone included.
pub(super) fn canvas_size(layout: &Layout, module_size: u32) -> CodecResult<(u32, u32)> {
    let side = |modules: usize| (modules as u64 + 2 * QUIET_ZONE as u64) * module_size as u64;
    let (width, height) = (side(layout.canvas_w), side(layout.canvas_h));
    let too_large = CodecFault::CanvasTooLarge { width, height, max: MAX_CANVAS_PIXELS };
    match width.checked_mul(height) {
        Some(px) if px <= MAX_CANVAS_PIXELS => Ok((width as u32, height as u32)),
        _ => Err(too_large),
    }
}

// Module placement
//------------------------------------------------------------------------------

pub(super) fn fill_modules(codewords: &[u8], ver: SideVersion, colors: ColorNumber) -> ModuleGrid {
    let (w, h) = (ver.width(), ver.height());
    let bpm = colors.bits_per_module();

    let mut padded = codewords.to_vec();
    padded.resize((w * h * bpm).div_ceil(8), 0);
    let mut bits = BitStream::from(&padded);
    let cells = (0..w * h).map(|_| bits.take_bits(bpm).unwrap_or(0) as u8).collect();

    ModuleGrid::new(w, h, cells)
}

// Render
//------------------------------------------------------------------------------

// Paints onto a light canvas sized by `canvas_size`
fn render(
    img: &mut RgbImage,
    layout: &Layout,
    header_len: usize,
    header_cw: &[u8],
    grids: &[ModuleGrid],
    colors: ColorNumber,
    module_size: u32,
) {
    let ms = module_size;
    let qz = QUIET_ZONE as u32;
    let (cw, ch) = (layout.canvas_w as u32, layout.canvas_h as u32);

    let mut paint = |x: usize, y: usize, clr: Rgb<u8>| {
        let rect = Rect::at(((qz + x as u32) * ms) as i32, ((qz + y as u32) * ms) as i32);
        draw_filled_rect_mut(img, rect.of_size(ms, ms), clr);
    };

    // Frame
    for x in 0..cw as usize {
        paint(x, 0, DARK);
        paint(x, ch as usize - 1, DARK);
    }
    for y in 0..ch as usize {
        paint(0, y, DARK);
        paint(cw as usize - 1, y, DARK);
    }

    // Header band, dark modules carry 1s
    let band_bits = header_band_bits(header_len);
    let mut band = BitStream::new(band_bits);
    band.push_bits(header_len as u16, 16);
    band.extend(header_cw);
    debug_assert_eq!(band.len(), band_bits, "Header band not filled");
    for (k, bit) in band.enumerate() {
        if bit {
            let (x, y) = layout.band_module(k);
            paint(x, y, DARK);
        }
    }

    // Symbols
    for (grid, &(ox, oy)) in grids.iter().zip(layout.origins.iter()) {
        for y in 0..grid.h {
            for x in 0..grid.w {
                paint(ox + x, oy + y, color_of(colors, grid.get(x, y)));
            }
        }
    }
}
