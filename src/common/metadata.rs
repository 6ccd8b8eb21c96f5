use std::{
    fmt::{Display, Formatter},
    ops::Deref,
};

// Global constants
//------------------------------------------------------------------------------

pub const MAX_SYMBOL_NUMBER: usize = 61;

pub const MAX_SIDE_VERSION: u8 = 32;

pub const MAX_ECC_LEVEL: u8 = 10;

pub const DEFAULT_ECC_LEVEL: u8 = 3;

pub const DEFAULT_MODULE_SIZE: u32 = 12;

// Color number
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ColorNumber {
    Four = 4,
    Eight = 8,
}

impl ColorNumber {
    pub fn from_count(count: u8) -> Option<Self> {
        match count {
            4 => Some(Self::Four),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    pub fn count(self) -> usize {
        self as usize
    }

    pub fn bits_per_module(self) -> usize {
        match self {
            Self::Four => 2,
            Self::Eight => 3,
        }
    }
}

// Color space
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum ColorSpace {
    #[default]
    Rgb = 0,
    Cmyk = 1,
}

impl ColorSpace {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Rgb),
            1 => Some(Self::Cmyk),
            _ => None,
        }
    }
}

impl Display for ColorSpace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rgb => f.write_str("RGB/PNG"),
            Self::Cmyk => f.write_str("CMYK/TIFF"),
        }
    }
}

// Error correction level
//------------------------------------------------------------------------------

/// Level 0 is a placeholder: the master falls back to [`DEFAULT_ECC_LEVEL`], a slave
/// inherits the level of its host symbol.
#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Default)]
pub struct EccLevel(u8);

impl EccLevel {
    pub fn new(level: u8) -> Self {
        debug_assert!(level <= MAX_ECC_LEVEL, "Invalid ecc level: {level}");
        Self(level)
    }
}

impl Deref for EccLevel {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Side version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct SideVersion {
    pub x: u8,
    pub y: u8,
}

impl SideVersion {
    pub fn new(x: u8, y: u8) -> Self {
        debug_assert!((1..=MAX_SIDE_VERSION).contains(&x), "Invalid horizontal version: {x}");
        debug_assert!((1..=MAX_SIDE_VERSION).contains(&y), "Invalid vertical version: {y}");
        Self { x, y }
    }

    pub fn square(v: u8) -> Self {
        Self::new(v, v)
    }

    pub fn width(&self) -> usize {
        side_size(self.x)
    }

    pub fn height(&self) -> usize {
        side_size(self.y)
    }
}

impl Display for SideVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

pub fn side_size(version: u8) -> usize {
    version as usize * 4 + 17
}

// Symbol position
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct SymbolPosition(u8);

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Dock {
    Horizontal,
    Vertical,
}

impl SymbolPosition {
    pub const MASTER: Self = Self(0);

    pub fn new(slot: u8) -> Self {
        debug_assert!((slot as usize) < MAX_SYMBOL_NUMBER, "Invalid symbol position: {slot}");
        Self(slot)
    }

    /// Grid offset (column, row) relative to the master symbol.
    pub fn offset(self) -> (i32, i32) {
        let (x, y) = SYMBOL_OFFSETS[self.0 as usize];
        (x as i32, y as i32)
    }

    pub fn dock(self, other: Self) -> Option<Dock> {
        let (ax, ay) = self.offset();
        let (bx, by) = other.offset();
        match ((ax - bx).abs(), (ay - by).abs()) {
            (1, 0) => Some(Dock::Horizontal),
            (0, 1) => Some(Dock::Vertical),
            _ => None,
        }
    }
}

impl Deref for SymbolPosition {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Slots are laid out ring by ring around the master, 4 * d slots on ring d
static SYMBOL_OFFSETS: [(i8, i8); MAX_SYMBOL_NUMBER] = build_offset_table();

const fn build_offset_table() -> [(i8, i8); MAX_SYMBOL_NUMBER] {
    let mut table = [(0i8, 0i8); MAX_SYMBOL_NUMBER];
    let mut idx = 1;
    let mut d: i8 = 1;
    while d <= 5 {
        let mut dy = -d;
        while dy <= d {
            let dx = d - if dy < 0 { -dy } else { dy };
            if dx == 0 {
                table[idx] = (0, dy);
                idx += 1;
            } else {
                table[idx] = (-dx, dy);
                table[idx + 1] = (dx, dy);
                idx += 2;
            }
            dy += 1;
        }
        d += 1;
    }
    table
}

/// Index of the first earlier symbol that `positions[idx]` docks to.
pub fn find_host(positions: &[SymbolPosition], idx: usize) -> Option<usize> {
    let pos = positions[idx];
    positions[..idx].iter().position(|&p| p.dock(pos).is_some())
}

#[cfg(test)]
mod metadata_tests {
    use std::collections::HashSet;

    use test_case::test_case;

    use super::{find_host, side_size, Dock, SymbolPosition, MAX_SYMBOL_NUMBER, SYMBOL_OFFSETS};

    #[test]
    fn test_offset_table_unique() {
        let uniq = SYMBOL_OFFSETS.iter().collect::<HashSet<_>>();
        assert_eq!(uniq.len(), MAX_SYMBOL_NUMBER);
        assert_eq!(SYMBOL_OFFSETS[0], (0, 0));
    }

    #[test]
    fn test_offset_table_rings() {
        let mut start = 1;
        for d in 1..=5 {
            let ring = &SYMBOL_OFFSETS[start..start + 4 * d];
            assert!(ring.iter().all(|(x, y)| (x.abs() + y.abs()) as usize == d));
            start += 4 * d;
        }
        assert_eq!(start, MAX_SYMBOL_NUMBER);
    }

    #[test_case(1, 17 + 4)]
    #[test_case(32, 145)]
    fn test_side_size(ver: u8, exp: usize) {
        assert_eq!(side_size(ver), exp);
    }

    #[test]
    fn test_dock() {
        let master = SymbolPosition::MASTER;
        for slot in 1..=4 {
            assert!(master.dock(SymbolPosition::new(slot)).is_some());
        }
        assert_eq!(master.dock(SymbolPosition::new(2)), Some(Dock::Horizontal));
        assert_eq!(master.dock(SymbolPosition::new(1)), Some(Dock::Vertical));
        assert_eq!(master.dock(SymbolPosition::new(5)), None);
        assert_eq!(master.dock(master), None);
    }

    #[test]
    fn test_find_host() {
        // 0 -> (0, 0), 1 -> (0, -1), 5 -> (0, -2)
        let pos = [0, 1, 5].map(SymbolPosition::new);
        assert_eq!(find_host(&pos, 1), Some(0));
        assert_eq!(find_host(&pos, 2), Some(1));

        let pos = [0, 5].map(SymbolPosition::new);
        assert_eq!(find_host(&pos, 1), None);
    }
}
