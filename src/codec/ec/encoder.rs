use super::galois::G;

// Parity
//------------------------------------------------------------------------------

/// Remainder of `data(x) * x^ec_len` divided by the generator polynomial.
pub(super) fn parity(data: &[u8], ec_len: usize) -> Vec<u8> {
    let gen = generator_poly(ec_len);

    // Shift register holding the running remainder, highest degree first
    let mut rem = vec![G(0); ec_len];
    for &b in data {
        let lead = G(b) + rem[0];
        rem.rotate_left(1);
        rem[ec_len - 1] = G(0);
        if lead.0 != 0 {
            rem.iter_mut().zip(&gen[1..]).for_each(|(r, &g)| *r += lead * g);
        }
    }
    rem.into_iter().map(u8::from).collect()
}

// Monic generator polynomial with roots a^0..a^(ec_len - 1), highest degree first
pub(crate) fn generator_poly(ec_len: usize) -> Vec<G> {
    let mut poly = vec![G(1)];
    for i in 0..ec_len {
        let root = G::gen_pow(i);
        let mut next = vec![G(0); poly.len() + 1];
        for (j, &c) in poly.iter().enumerate() {
            next[j] += c;
            next[j + 1] += c * root;
        }
        poly = next;
    }
    poly
}
