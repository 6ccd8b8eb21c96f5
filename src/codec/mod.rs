//! Symbol codec boundary.
//!
//! The orchestration layer only talks to a [`Codec`]: it asks for default encode
//! parameters, hands a payload over for generation, saves the produced bitmap, and on
//! the reading side loads and decodes images. [`JabCodec`] is the built-in reference
//! implementation; its raster format is private to this crate.

pub(crate) mod ec;

mod detector;
mod layout;
mod mask;
mod palette;
mod raster;
mod writer;

use std::path::Path;

use image::RgbImage;
use thiserror::Error;

use crate::common::metadata::{
    ColorNumber, EccLevel, SideVersion, SymbolPosition, DEFAULT_MODULE_SIZE, MAX_SYMBOL_NUMBER,
};

// Codec fault
//------------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum CodecFault {
    #[error("no input data")]
    EmptyData,

    #[error("input of {len} bytes exceeds code capacity of {capacity} bytes")]
    DataTooLong { len: usize, capacity: usize },

    #[error("unsupported color number {0}")]
    UnsupportedColorNumber(u8),

    #[error("unsupported symbol number {0}")]
    UnsupportedSymbolNumber(u8),

    #[error("invalid symbol layout: {0}")]
    InvalidLayout(String),

    #[error("code image of {width}x{height} px exceeds the limit of {max} pixels")]
    CanvasTooLarge { width: u64, height: u64, max: u64 },

    #[error("no bitmap to save")]
    MissingBitmap,

    #[error("no code found in image")]
    NotFound,

    #[error("invalid code header: {0}")]
    InvalidHeader(&'static str),

    #[error("code data truncated")]
    Truncated,

    #[error("too many errors to correct")]
    TooManyErrors,

    #[error("master symbol unreadable: {0}")]
    MasterUnreadable(Box<CodecFault>),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CodecResult<T> = Result<T, CodecFault>;

// Encode parameters
//------------------------------------------------------------------------------

/// Mutable parameter record a codec hands out before generation. Per-symbol vectors
/// always hold `symbol_number` entries.
#[derive(Debug, Clone)]
pub struct EncodeParams {
    pub color_number: ColorNumber,
    pub symbol_number: u8,
    pub module_size: u32,
    pub master_symbol_width: u32,
    pub master_symbol_height: u32,
    pub symbol_ecc_levels: Vec<EccLevel>,
    // None picks the smallest square version that fits, single symbol only
    pub symbol_versions: Vec<Option<SideVersion>>,
    pub symbol_positions: Vec<SymbolPosition>,
    pub bitmap: Option<RgbImage>,
}

impl EncodeParams {
    pub fn new(color_number: ColorNumber, symbol_number: u8) -> Self {
        let n = symbol_number as usize;
        Self {
            color_number,
            symbol_number,
            module_size: DEFAULT_MODULE_SIZE,
            master_symbol_width: 0,
            master_symbol_height: 0,
            symbol_ecc_levels: vec![EccLevel::default(); n],
            symbol_versions: vec![None; n],
            symbol_positions: (0..n as u8).map(SymbolPosition::new).collect(),
            bitmap: None,
        }
    }
}

// Decode result
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum DecodeMode {
    /// Stop at the first unreadable slave symbol.
    #[default]
    Normal,
    /// Skip unreadable slave symbols and keep going.
    Compatible,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum DecodeStatus {
    Complete,
    Partial { decoded: usize, total: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub data: Vec<u8>,
    pub status: DecodeStatus,
}

// Codec
//------------------------------------------------------------------------------

pub trait Codec {
    fn create_encode(&self, color_number: u8, symbol_number: u8) -> CodecResult<EncodeParams>;

    /// Builds the code for `data` and stores the bitmap in `params`.
    fn generate(&self, params: &mut EncodeParams, data: &[u8]) -> CodecResult<()>;

    fn save_image(&self, bitmap: &RgbImage, path: &Path) -> CodecResult<()>;

    fn save_image_cmyk(&self, bitmap: &RgbImage, path: &Path) -> CodecResult<()>;

    fn read_image(&self, path: &Path) -> CodecResult<RgbImage>;

    fn decode(&self, img: &RgbImage, mode: DecodeMode, max_symbols: usize) -> CodecResult<Decoded>;

    fn max_symbols(&self) -> usize {
        MAX_SYMBOL_NUMBER
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JabCodec;

impl Codec for JabCodec {
    fn create_encode(&self, color_number: u8, symbol_number: u8) -> CodecResult<EncodeParams> {
        let colors = ColorNumber::from_count(color_number)
            .ok_or(CodecFault::UnsupportedColorNumber(color_number))?;
        if !(1..=MAX_SYMBOL_NUMBER).contains(&(symbol_number as usize)) {
            return Err(CodecFault::UnsupportedSymbolNumber(symbol_number));
        }
        Ok(EncodeParams::new(colors, symbol_number))
    }

    fn generate(&self, params: &mut EncodeParams, data: &[u8]) -> CodecResult<()> {
        params.bitmap = Some(writer::generate(params, data)?);
        Ok(())
    }

    fn save_image(&self, bitmap: &RgbImage, path: &Path) -> CodecResult<()> {
        raster::save_png(bitmap, path)
    }

    fn save_image_cmyk(&self, bitmap: &RgbImage, path: &Path) -> CodecResult<()> {
        raster::save_cmyk_tiff(bitmap, path)
    }

    fn read_image(&self, path: &Path) -> CodecResult<RgbImage> {
        raster::read_image(path)
    }

    fn decode(&self, img: &RgbImage, mode: DecodeMode, max_symbols: usize) -> CodecResult<Decoded> {
        detector::decode(img, mode, max_symbols)
    }
}

#[cfg(test)]
mod codec_tests {
    use super::{Codec, CodecFault, DecodeMode, DecodeStatus, JabCodec};
    use crate::common::metadata::{EccLevel, SideVersion, SymbolPosition};

    #[test]
    fn test_create_encode_defaults() {
        let params = JabCodec.create_encode(8, 3).unwrap();
        assert_eq!(params.module_size, 12);
        assert_eq!(params.symbol_ecc_levels, vec![EccLevel::default(); 3]);
        assert_eq!(params.symbol_versions, vec![None; 3]);
        assert_eq!(params.symbol_positions[2], SymbolPosition::new(2));
        assert!(params.bitmap.is_none());
    }

    #[test]
    fn test_create_encode_rejects() {
        assert!(matches!(JabCodec.create_encode(5, 1), Err(CodecFault::UnsupportedColorNumber(5))));
        assert!(matches!(JabCodec.create_encode(4, 0), Err(CodecFault::UnsupportedSymbolNumber(0))));
        assert!(matches!(JabCodec.create_encode(4, 62), Err(CodecFault::UnsupportedSymbolNumber(62))));
    }

    #[test]
    fn test_generate_decode_in_memory() {
        let codec = JabCodec;
        let mut params = codec.create_encode(8, 1).unwrap();
        params.module_size = 3;
        let data = b"in memory round trip".to_vec();
        codec.generate(&mut params, &data).unwrap();

        let img = params.bitmap.unwrap();
        let res = codec.decode(&img, DecodeMode::Normal, codec.max_symbols()).unwrap();
        assert_eq!(res.data, data);
        assert_eq!(res.status, DecodeStatus::Complete);
    }

    #[test]
    fn test_generate_decode_multi_symbol() {
        let codec = JabCodec;
        let mut params = codec.create_encode(4, 3).unwrap();
        params.module_size = 2;
        params.symbol_positions = [0, 1, 2].map(SymbolPosition::new).to_vec();
        params.symbol_versions = vec![
            Some(SideVersion::new(2, 2)),
            Some(SideVersion::new(2, 1)),
            Some(SideVersion::new(1, 2)),
        ];
        params.symbol_ecc_levels = [4, 0, 6].map(EccLevel::new).to_vec();
        let data = (0..300u32).map(|i| (i * 7 % 251) as u8).collect::<Vec<_>>();
        codec.generate(&mut params, &data).unwrap();

        let img = params.bitmap.unwrap();
        let res = codec.decode(&img, DecodeMode::Normal, 61).unwrap();
        assert_eq!(res.status, DecodeStatus::Complete);
        assert_eq!(res.data, data);
    }
}
