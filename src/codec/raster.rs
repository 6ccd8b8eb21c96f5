use std::{fs::File, io::BufReader, path::Path};

use image::{ImageFormat, RgbImage};
use tiff::{
    decoder::{Decoder, DecodingResult},
    encoder::{colortype, TiffEncoder},
    ColorType,
};
use tracing::debug;

use super::CodecResult;

// Save
//------------------------------------------------------------------------------

pub(super) fn save_png(bitmap: &RgbImage, path: &Path) -> CodecResult<()> {
    bitmap.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

pub(super) fn save_cmyk_tiff(bitmap: &RgbImage, path: &Path) -> CodecResult<()> {
    let cmyk = bitmap.pixels().flat_map(|p| rgb_to_cmyk(p.0)).collect::<Vec<_>>();
    let mut file = File::create(path)?;
    let mut encoder = TiffEncoder::new(&mut file)?;
    encoder.write_image::<colortype::CMYK8>(bitmap.width(), bitmap.height(), &cmyk)?;
    Ok(())
}

// Load
//------------------------------------------------------------------------------

pub(super) fn read_image(path: &Path) -> CodecResult<RgbImage> {
    if is_tiff(path) {
        if let Some(img) = read_tiff(path)? {
            return Ok(img);
        }
        debug!("Unhandled TIFF layout in {}, falling back to generic loader", path.display());
    }
    Ok(image::open(path)?.to_rgb8())
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
}

// Handles 8 bit CMYK and RGB strips, None for anything else
fn read_tiff(path: &Path) -> CodecResult<Option<RgbImage>> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let (w, h) = decoder.dimensions()?;
    let color = decoder.colortype()?;
    let DecodingResult::U8(buf) = decoder.read_image()? else {
        return Ok(None);
    };

    let rgb = match color {
        ColorType::RGB(8) => buf,
        ColorType::CMYK(8) => buf.chunks_exact(4).flat_map(cmyk_to_rgb).collect(),
        _ => return Ok(None),
    };
    Ok(RgbImage::from_raw(w, h, rgb))
}

// Color conversion
//------------------------------------------------------------------------------

fn rgb_to_cmyk([r, g, b]: [u8; 3]) -> [u8; 4] {
    let max = r.max(g).max(b) as u32;
    if max == 0 {
        return [0, 0, 0, 255];
    }
    let ink = |c: u8| ((max - c as u32) * 255 / max) as u8;
    [ink(r), ink(g), ink(b), (255 - max) as u8]
}

fn cmyk_to_rgb(px: &[u8]) -> [u8; 3] {
    let k = 255 - px[3] as u32;
    let chan = |c: u8| ((255 - c as u32) * k / 255) as u8;
    [chan(px[0]), chan(px[1]), chan(px[2])]
}

#[cfg(test)]
mod raster_tests {
    use image::{Rgb, RgbImage};
    use test_case::test_case;

    use super::{cmyk_to_rgb, read_image, rgb_to_cmyk, save_cmyk_tiff, save_png};

    #[test_case([0, 0, 0], [0, 0, 0, 255])]
    #[test_case([255, 255, 255], [0, 0, 0, 0])]
    #[test_case([0, 255, 255], [255, 0, 0, 0])]
    #[test_case([255, 0, 255], [0, 255, 0, 0])]
    #[test_case([128, 0, 0], [0, 255, 255, 127])]
    fn test_rgb_to_cmyk(rgb: [u8; 3], cmyk: [u8; 4]) {
        assert_eq!(rgb_to_cmyk(rgb), cmyk);
    }

    #[test]
    fn test_palette_colors_survive_cmyk() {
        for r in [0, 255] {
            for g in [0, 255] {
                for b in [0, 255] {
                    assert_eq!(cmyk_to_rgb(&rgb_to_cmyk([r, g, b])), [r, g, b]);
                }
            }
        }
    }

    fn checker() -> RgbImage {
        RgbImage::from_fn(8, 6, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 0, 255])
            } else {
                Rgb([0, 255, 0])
            }
        })
    }

    #[test]
    fn test_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        save_png(&checker(), &path).unwrap();
        assert_eq!(read_image(&path).unwrap(), checker());
    }

    #[test]
    fn test_cmyk_tiff_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.tif");
        save_cmyk_tiff(&checker(), &path).unwrap();
        assert_eq!(read_image(&path).unwrap(), checker());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_image(&dir.path().join("nothing.png")).is_err());
        assert!(read_image(&dir.path().join("nothing.tiff")).is_err());
    }
}
