//! # jabism
//!
//! A Rust library that turns loosely specified, host-supplied options into a validated
//! configuration for multi-symbol JAB-style color barcodes, and drives encoding and
//! decoding through a pluggable codec.
//!
//! ## Features
//!
//! - **Option Model**: Every recognized field with its default and valid range, loadable from JSON
//! - **Validation**: Field and cross-field checks for codes of up to 61 docked symbols
//! - **Scoped Resources**: Payload and per-symbol buffers owned per call and released on every exit
//! - **Orchestration**: Encode and decode entry points with a structured error per stage
//! - **Reference Codec**: 4 and 8 color symbols with Reed-Solomon protection, PNG and CMYK TIFF output
//!
//! ## Quick Start
//!
//! ### Encoding a File
//!
//! ```rust,no_run
//! use jabism::{encode, EncodeOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Defaults: 8 colors, one symbol, module size 12, RGB/PNG output
//! let report = encode("hello.txt", "hello.png", &EncodeOptions::default(), false)?;
//! println!("Saved {}", report.output.display());
//! # Ok(())
//! # }
//! ```
//!
//! ### Multi-Symbol Codes
//!
//! ```rust,no_run
//! use jabism::{encode, EncodeOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut opts = EncodeOptions::new();
//! opts.color_number(4)
//!     .symbol_number(3)
//!     .ecc_levels(&[5])                                // Slaves inherit from their host
//!     .symbol_positions(&[0, 3, 4])                    // Master, right of master, below master
//!     .symbol_versions(&[(4, 4), (2, 4), (4, 3)])      // Docked sides must match
//!     .color_space(1);                                 // CMYK/TIFF
//! encode("data.bin", "data.tif", &opts, true)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Decoding
//!
//! ```rust,no_run
//! use jabism::decode;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let out = decode("hello.png")?;
//! for warning in out.warnings.iter() {
//!     eprintln!("warning: {warning}");
//! }
//! println!("{}", out.text());
//! # Ok(())
//! # }
//! ```
//!
//! ## Symbol Layout
//!
//! A code has one master symbol at position 0 and up to 60 slaves. Positions are slots
//! around the master, ring by ring: slots 1-4 touch the master (above, left, right,
//! below), slots 5-12 form the second ring and so on. Every slave must dock to an
//! earlier symbol, which becomes its host. Side versions (1-32, a side of `4v + 17`
//! modules) of docked neighbours must agree on the touching side.
//!
//! ## Error Correction Levels
//!
//! Levels 1-10 spend between 4% and 24% of each block on parity. Level 0 means "default":
//! level 3 for the master, the host's level for a slave.
//!
//! ## Custom Codecs
//!
//! [`encode_with`] and [`decode_with`] accept any [`Codec`], so the validation and
//! resource handling can drive another symbol implementation.

pub mod builder;
pub mod codec;
pub(crate) mod common;
pub mod reader;

pub use builder::{
    acquire_input, encode, encode_with, validate, EncodeReport, InputPayload, SymbolDescriptor,
    SymbolSpec,
};
pub use codec::{
    Codec, CodecFault, CodecResult, DecodeMode, DecodeStatus, Decoded, EncodeParams, JabCodec,
};
pub use common::error::{
    ConfigError, ConfigResult, DecodeError, DecodeResult, EncodeError, EncodeResult, IoError,
    Warning,
};
pub use common::metadata::{
    ColorNumber, ColorSpace, Dock, EccLevel, SideVersion, SymbolPosition, MAX_SYMBOL_NUMBER,
};
pub use common::options::{versions_from_flat, EncodeOptions};
pub use reader::{decode, decode_with, DecodeOutput};
