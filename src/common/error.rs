use std::{io, path::PathBuf};

use thiserror::Error;

use super::metadata::ColorSpace;
use crate::codec::CodecFault;

// Config error
//------------------------------------------------------------------------------

/// Field-level or cross-field validation failure. Every variant names the host
/// field it refers to through [`ConfigError::field`].
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("invalid color number {0}: must be 4 or 8")]
    InvalidColorNumber(i32),

    #[error("invalid module size {0}: must not be negative")]
    InvalidModuleSize(i32),

    #[error("invalid symbol width {0}: must not be negative")]
    InvalidSymbolWidth(i32),

    #[error("invalid symbol height {0}: must not be negative")]
    InvalidSymbolHeight(i32),

    #[error("invalid symbol number {0}: must be in range 1-61")]
    InvalidSymbolNumber(i32),

    #[error("invalid color space {0}: must be 0 (RGB) or 1 (CMYK)")]
    InvalidColorSpace(i32),

    #[error("too many ecc levels: {given} given for {symbols} symbol(s)")]
    TooManyEccLevels { given: usize, symbols: usize },

    #[error("invalid ecc level {value} for symbol {index}: must be in range 0-10")]
    InvalidEccLevel { index: usize, value: i32 },

    #[error("symbol versions must be coordinate pairs, got {0} value(s)")]
    UnpairedVersions(usize),

    #[error("too many symbol versions: {given} given for {symbols} symbol(s)")]
    TooManyVersions { given: usize, symbols: usize },

    #[error("invalid symbol version ({x}, {y}) for symbol {index}: components must be in range 1-32")]
    InvalidVersion { index: usize, x: i32, y: i32 },

    #[error("too many symbol positions: {given} given for {symbols} symbol(s)")]
    TooManyPositions { given: usize, symbols: usize },

    #[error("invalid symbol position {value} for symbol {index}: must be in range 0-60")]
    InvalidPosition { index: usize, value: i32 },

    #[error("symbol position information incomplete: {given} of {expected} position(s) given")]
    PositionsIncomplete { given: usize, expected: usize },

    #[error("symbol version information incomplete: {given} of {expected} version(s) given")]
    VersionsIncomplete { given: usize, expected: usize },

    #[error("master symbol must occupy position 0, got {0}")]
    MasterPosition(u8),

    #[error("symbol {index} reuses position {position}")]
    DuplicatePosition { index: usize, position: u8 },

    #[error("symbol {index} at position {position} does not dock to any earlier symbol")]
    UndockedSymbol { index: usize, position: u8 },

    #[error("symbol {index} must share its docked side version with symbol {neighbour}")]
    MismatchedSideVersion { index: usize, neighbour: usize },

    #[error("malformed options: {0}")]
    Malformed(String),
}

impl ConfigError {
    /// Host field name, as spelled in serialized options.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidColorNumber(_) => "colorNumber",
            Self::InvalidModuleSize(_) => "moduleSize",
            Self::InvalidSymbolWidth(_) => "symbolWidth",
            Self::InvalidSymbolHeight(_) => "symbolHeight",
            Self::InvalidSymbolNumber(_) => "symbolNumber",
            Self::InvalidColorSpace(_) => "colorSpace",
            Self::TooManyEccLevels { .. } | Self::InvalidEccLevel { .. } => "eccLevels",
            Self::UnpairedVersions(_)
            | Self::TooManyVersions { .. }
            | Self::InvalidVersion { .. }
            | Self::VersionsIncomplete { .. }
            | Self::MismatchedSideVersion { .. } => "symbolVersions",
            Self::TooManyPositions { .. }
            | Self::InvalidPosition { .. }
            | Self::PositionsIncomplete { .. }
            | Self::MasterPosition(_)
            | Self::DuplicatePosition { .. }
            | Self::UndockedSymbol { .. } => "symbolPositions",
            Self::Malformed(_) => "options",
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// Io error
//------------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum IoError {
    #[error("cannot open source file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("short read from {path}: expected {expected} bytes, read {read}")]
    ShortRead { path: PathBuf, expected: usize, read: usize },

    #[error("cannot read source file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("source file {path} of {len} bytes does not fit in memory")]
    TooLarge { path: PathBuf, len: u64 },
}

// Encode error
//------------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("input: {0}")]
    Input(#[from] IoError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot create encode parameters for {color_number} colors and {symbol_number} symbol(s): {reason}")]
    ParamInit { color_number: u8, symbol_number: u8, reason: CodecFault },

    #[error("creating code failed: {0}")]
    Generate(CodecFault),

    #[error("saving {format} image to {path} failed: {reason}")]
    Save { format: ColorSpace, path: PathBuf, reason: CodecFault },
}

pub type EncodeResult<T> = Result<T, EncodeError>;

// Decode error
//------------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("cannot load image {path}: {reason}")]
    ImageLoad { path: PathBuf, reason: CodecFault },

    #[error("decoding failed: {0}")]
    Decode(CodecFault),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

// Warning
//------------------------------------------------------------------------------

/// Soft condition reported alongside a successful result.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum Warning {
    #[error("the code is only partly decoded: {decoded} of {total} symbol(s) recovered, the rest are ignored")]
    PartialDecode { decoded: usize, total: usize },

    #[error("source file {path} was not removed: {reason}")]
    SourceNotRemoved { path: PathBuf, reason: String },
}
