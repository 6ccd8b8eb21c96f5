use std::ops::{Add, AddAssign, Div, Mul, MulAssign};

// Galois field GF(256) with primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub(crate) struct G(pub u8);

impl G {
    pub fn gen_pow(i: usize) -> Self {
        G(EXP_TABLE[i % 255])
    }
}

impl From<G> for u8 {
    fn from(g: G) -> Self {
        g.0
    }
}

impl Add for G {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        G(self.0 ^ rhs.0)
    }
}

impl AddAssign for G {
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Mul for G {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        if self.0 == 0 || rhs.0 == 0 {
            return G(0);
        }
        let log_sum = LOG_TABLE[self.0 as usize] as usize + LOG_TABLE[rhs.0 as usize] as usize;
        G(EXP_TABLE[log_sum % 255])
    }
}

impl MulAssign for G {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

// Division by zero yields zero. The rectifier re-checks syndromes afterwards, so a
// degenerate locator surfaces as an uncorrectable block instead of a panic.
impl Div for G {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        if self.0 == 0 || rhs.0 == 0 {
            return G(0);
        }
        let log_diff =
            LOG_TABLE[self.0 as usize] as usize + 255 - LOG_TABLE[rhs.0 as usize] as usize;
        G(EXP_TABLE[log_diff % 255])
    }
}

// Global constants
//------------------------------------------------------------------------------

const TABLES: ([u8; 256], [u8; 256]) = build_tables();

pub(crate) static EXP_TABLE: [u8; 256] = TABLES.0;

pub(crate) static LOG_TABLE: [u8; 256] = TABLES.1;

const fn build_tables() -> ([u8; 256], [u8; 256]) {
    let mut exp = [0u8; 256];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= 0x11d;
        }
        i += 1;
    }
    exp[255] = exp[0];
    (exp, log)
}

#[cfg(test)]
mod galois_tests {
    use super::{G, EXP_TABLE, LOG_TABLE};

    #[test]
    fn test_tables() {
        assert_eq!(EXP_TABLE[0], 1);
        assert_eq!(EXP_TABLE[8], 0x1d);
        assert_eq!(LOG_TABLE[2], 1);
        for i in 0..255 {
            assert_eq!(LOG_TABLE[EXP_TABLE[i] as usize] as usize, i);
        }
    }

    #[test]
    fn test_mul_div_inverse() {
        for a in 1..=255u8 {
            for b in [1u8, 2, 3, 29, 142, 255] {
                assert_eq!((G(a) * G(b)) / G(b), G(a));
            }
        }
        assert_eq!(G(0) * G(17), G(0));
        assert_eq!(G(17) / G(0), G(0));
    }

    #[test]
    fn test_gen_pow_wraps() {
        assert_eq!(G::gen_pow(255), G(1));
        assert_eq!(G::gen_pow(256), G(2));
    }
}
