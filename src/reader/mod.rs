use std::{borrow::Cow, path::Path};

use encoding_rs::UTF_8;
use tracing::{debug, info, warn};

use crate::{
    codec::{Codec, CodecFault, DecodeMode, DecodeStatus, JabCodec},
    common::error::{DecodeError, DecodeResult, Warning},
};

// Decode output
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutput {
    pub data: Vec<u8>,
    pub status: DecodeStatus,
    pub warnings: Vec<Warning>,
}

impl DecodeOutput {
    pub fn is_partial(&self) -> bool {
        matches!(self.status, DecodeStatus::Partial { .. })
    }

    /// Payload as UTF-8 text, malformed sequences replaced with U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        UTF_8.decode_without_bom_handling(&self.data).0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

// Decode
//------------------------------------------------------------------------------

/// Reads the code image at `path` with the built-in codec.
///
/// A code whose slave symbols could only partly be read still succeeds: the recovered
/// bytes are returned together with a [`Warning::PartialDecode`].
pub fn decode(path: impl AsRef<Path>) -> DecodeResult<DecodeOutput> {
    decode_with(&JabCodec, path, DecodeMode::Normal)
}

pub fn decode_with<C: Codec + ?Sized>(
    codec: &C,
    path: impl AsRef<Path>,
    mode: DecodeMode,
) -> DecodeResult<DecodeOutput> {
    let path = path.as_ref();
    info!("Decoding {}", path.display());

    debug!("Loading image...");
    let img = codec
        .read_image(path)
        .map_err(|reason| DecodeError::ImageLoad { path: path.to_path_buf(), reason })?;

    debug!("Detecting symbols...");
    let decoded = codec.decode(&img, mode, codec.max_symbols());
    drop(img);
    let decoded = decoded.map_err(DecodeError::Decode)?;
    if decoded.data.is_empty() {
        return Err(DecodeError::Decode(CodecFault::NotFound));
    }

    let mut warnings = Vec::new();
    if let DecodeStatus::Partial { decoded, total } = decoded.status {
        let warning = Warning::PartialDecode { decoded, total };
        warn!("{warning}");
        warnings.push(warning);
    }

    info!("Decoded {} bytes", decoded.data.len());
    Ok(DecodeOutput { data: decoded.data, status: decoded.status, warnings })
}
