use image::Rgb;

use crate::common::metadata::ColorNumber;

// Palette
//------------------------------------------------------------------------------

pub(crate) const LIGHT: Rgb<u8> = Rgb([255, 255, 255]);

pub(crate) const DARK: Rgb<u8> = Rgb([0, 0, 0]);

// Corners of the RGB cube, index bits are (r, g, b)
static PALETTE_8: [[u8; 3]; 8] = [
    [0, 0, 0],
    [0, 0, 255],
    [0, 255, 0],
    [0, 255, 255],
    [255, 0, 0],
    [255, 0, 255],
    [255, 255, 0],
    [255, 255, 255],
];

static PALETTE_4: [[u8; 3]; 4] = [[0, 0, 0], [0, 255, 255], [255, 0, 255], [255, 255, 0]];

pub(crate) fn palette(colors: ColorNumber) -> &'static [[u8; 3]] {
    match colors {
        ColorNumber::Four => &PALETTE_4,
        ColorNumber::Eight => &PALETTE_8,
    }
}

pub(crate) fn color_of(colors: ColorNumber, index: u8) -> Rgb<u8> {
    Rgb(palette(colors)[index as usize])
}

/// Palette index closest to `px` in RGB distance.
pub(crate) fn nearest(colors: ColorNumber, px: &Rgb<u8>) -> u8 {
    let dist = |c: &[u8; 3]| {
        c.iter().zip(px.0.iter()).map(|(&a, &b)| (a as i32 - b as i32).pow(2)).sum::<i32>()
    };
    palette(colors)
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| dist(c))
        .map(|(i, _)| i as u8)
        .unwrap_or(0)
}

pub(crate) fn is_dark(px: &Rgb<u8>) -> bool {
    let [r, g, b] = px.0;
    let luma = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000;
    luma < 128
}
