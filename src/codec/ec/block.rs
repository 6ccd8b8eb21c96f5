use super::{encoder::parity, MAX_BLOCK_SIZE};

/// One Reed-Solomon codeword: data bytes followed by parity bytes.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct Block {
    pub(super) cw: Vec<u8>,
    pub(super) dlen: usize,
}

impl Block {
    /// Protects `data` with `ec_len` parity bytes.
    pub fn encode(data: &[u8], ec_len: usize) -> Self {
        debug_assert!(
            ec_len > 0 && data.len() + ec_len < MAX_BLOCK_SIZE,
            "Invalid block shape: Data len {}, Ecc len {ec_len}",
            data.len()
        );
        let mut cw = Vec::with_capacity(data.len() + ec_len);
        cw.extend_from_slice(data);
        cw.extend(parity(data, ec_len));
        Self { cw, dlen: data.len() }
    }

    /// Wraps codewords as read back, whose first `dlen` bytes carry data.
    pub fn received(cw: &[u8], dlen: usize) -> Self {
        debug_assert!(dlen < cw.len(), "No parity in block: Data len {dlen}, Len {}", cw.len());
        Self { cw: cw.to_vec(), dlen }
    }

    pub fn ec_len(&self) -> usize {
        self.cw.len() - self.dlen
    }

    pub fn codewords(&self) -> &[u8] {
        &self.cw
    }

    pub fn data(&self) -> &[u8] {
        &self.cw[..self.dlen]
    }

    #[cfg(test)]
    pub fn parity(&self) -> &[u8] {
        &self.cw[self.dlen..]
    }
}
