use super::{galois::G, Block};
use crate::codec::{CodecFault, CodecResult};

// Rectifier
//------------------------------------------------------------------------------

impl Block {
    /// Corrects up to `ec_len / 2` byte errors in place and returns the data bytes.
    pub fn rectify(&mut self) -> CodecResult<&[u8]> {
        let ec_len = self.ec_len();
        let synd = syndromes(&self.cw, ec_len);
        if synd.iter().all(|s| s.0 == 0) {
            return Ok(self.data());
        }

        let locator = berlekamp_massey(&synd);
        let errs = locator.len() - 1;
        if 2 * errs > ec_len {
            return Err(CodecFault::TooManyErrors);
        }

        let n = self.cw.len();
        let positions = (0..n).filter(|&k| eval(&locator, x_inv(n, k)).0 == 0).collect::<Vec<_>>();
        if positions.len() != errs {
            return Err(CodecFault::TooManyErrors);
        }

        // Forney with the first consecutive root at a^0: e = X * omega(X^-1) / locator'(X^-1)
        let omega = evaluator(&synd, &locator);
        let deriv = derivative(&locator);
        for k in positions {
            let xi = x_inv(n, k);
            let den = eval(&deriv, xi);
            if den.0 == 0 {
                return Err(CodecFault::TooManyErrors);
            }
            let mag = G::gen_pow(n - 1 - k) * eval(&omega, xi) / den;
            self.cw[k] ^= mag.0;
        }

        if syndromes(&self.cw, ec_len).iter().any(|s| s.0 != 0) {
            return Err(CodecFault::TooManyErrors);
        }
        Ok(self.data())
    }
}

// Polynomials
//------------------------------------------------------------------------------

// Inverse locator of byte k, whose term in the received polynomial has degree n - 1 - k
fn x_inv(n: usize, k: usize) -> G {
    G::gen_pow(255 - (n - 1 - k))
}

// Received polynomial evaluated at a^0..a^(ec_len - 1)
fn syndromes(cw: &[u8], ec_len: usize) -> Vec<G> {
    (0..ec_len)
        .map(|i| {
            let x = G::gen_pow(i);
            cw.iter().fold(G(0), |acc, &c| acc * x + G(c))
        })
        .collect()
}

// Lowest degree first
fn eval(poly: &[G], x: G) -> G {
    poly.iter().rev().fold(G(0), |acc, &c| acc * x + c)
}

// Error locator, lowest degree first, of length errors + 1
fn berlekamp_massey(synd: &[G]) -> Vec<G> {
    let mut cur = vec![G(1)];
    let mut prev = vec![G(1)];
    let mut errs = 0;
    let mut shift = 1;
    let mut prev_disc = G(1);

    for n in 0..synd.len() {
        let disc = (1..=errs)
            .fold(synd[n], |acc, i| acc + cur.get(i).copied().unwrap_or(G(0)) * synd[n - i]);
        if disc.0 == 0 {
            shift += 1;
            continue;
        }

        let snapshot = cur.clone();
        let scale = disc / prev_disc;
        if cur.len() < prev.len() + shift {
            cur.resize(prev.len() + shift, G(0));
        }
        for (i, &p) in prev.iter().enumerate() {
            cur[i + shift] += scale * p;
        }

        if 2 * errs <= n {
            errs = n + 1 - errs;
            prev = snapshot;
            prev_disc = disc;
            shift = 1;
        } else {
            shift += 1;
        }
    }

    cur.resize(errs + 1, G(0));
    cur
}

// Error evaluator: syndromes times locator, mod x^ec_len
fn evaluator(synd: &[G], locator: &[G]) -> Vec<G> {
    (0..synd.len())
        .map(|i| {
            locator.iter().take(i + 1).enumerate().fold(G(0), |acc, (j, &l)| acc + l * synd[i - j])
        })
        .collect()
}

// Formal derivative; even powers vanish in characteristic 2
fn derivative(poly: &[G]) -> Vec<G> {
    poly.iter()
        .enumerate()
        .skip(1)
        .map(|(i, &c)| if i % 2 == 1 { c } else { G(0) })
        .collect()
}
