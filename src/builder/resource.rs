use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::validate::SymbolDescriptor;
use crate::{codec::EncodeParams, common::error::IoError};

// Input payload
//------------------------------------------------------------------------------

/// Bytes read from the encode source, owned by a single encode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPayload {
    path: PathBuf,
    data: Vec<u8>,
}

impl InputPayload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Reads the whole file at `path` into a buffer sized to its length.
pub fn acquire_input(path: &Path) -> Result<InputPayload, IoError> {
    let file =
        File::open(path).map_err(|source| IoError::Open { path: path.to_path_buf(), source })?;
    let len = file
        .metadata()
        .map_err(|source| IoError::Read { path: path.to_path_buf(), source })?
        .len();
    let expected =
        usize::try_from(len).map_err(|_| IoError::TooLarge { path: path.to_path_buf(), len })?;

    let data = read_sized(file, expected, path)?;
    debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(InputPayload { path: path.to_path_buf(), data })
}

// Exactly `expected` bytes, anything less is a short read
fn read_sized(src: impl Read, expected: usize, path: &Path) -> Result<Vec<u8>, IoError> {
    let mut data = Vec::with_capacity(expected);
    src.take(expected as u64)
        .read_to_end(&mut data)
        .map_err(|source| IoError::Read { path: path.to_path_buf(), source })?;
    if data.len() < expected {
        return Err(IoError::ShortRead { path: path.to_path_buf(), expected, read: data.len() });
    }
    Ok(data)
}

// Encode context
//------------------------------------------------------------------------------

#[cfg(test)]
thread_local! {
    static RELEASES: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Number of releases performed on this thread.
#[cfg(test)]
pub(crate) fn release_count() -> usize {
    RELEASES.with(|c| c.get())
}

/// Owns everything one encode call allocates. Dropping the context releases it, so
/// early returns and unwinding never leak a buffer into the next call.
#[derive(Debug, Default)]
pub(crate) struct EncodeContext {
    pub descriptor: Option<SymbolDescriptor>,
    pub payload: Option<InputPayload>,
    pub params: Option<EncodeParams>,
    released: bool,
}

impl EncodeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Frees every held allocation. Later calls are no-ops.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.params = None;
        self.payload = None;
        self.descriptor = None;
        self.released = true;

        #[cfg(test)]
        RELEASES.with(|c| c.set(c.get() + 1));
        debug!("Released encode resources");
    }
}

impl Drop for EncodeContext {
    fn drop(&mut self) {
        self.release();
    }
}
