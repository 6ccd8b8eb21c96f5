use std::ops::Deref;

// Mask pattern
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> Self {
        debug_assert!(pattern < 8, "Invalid masking pattern");
        Self(pattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

mod mask_functions {
    pub fn diagonal(x: i32, y: i32) -> i32 {
        x + y
    }

    pub fn columns(x: i32, _: i32) -> i32 {
        x
    }

    pub fn rows(_: i32, y: i32) -> i32 {
        y
    }

    pub fn wide_tiles(x: i32, y: i32) -> i32 {
        x / 2 + y / 3
    }

    pub fn tall_tiles(x: i32, y: i32) -> i32 {
        x / 3 + y / 2
    }

    pub fn stripes(x: i32, y: i32) -> i32 {
        (x + y) / 2 + (x + y) / 3
    }

    pub fn meadow(x: i32, y: i32) -> i32 {
        (x * x * y) % 7 + (2 * x * x + 2 * y) % 19
    }

    pub fn waves(x: i32, y: i32) -> i32 {
        (x * y * y) % 5 + (2 * x + y * y) % 13
    }
}

impl MaskPattern {
    pub fn mask_functions(self) -> fn(i32, i32) -> i32 {
        match *self {
            0b000 => mask_functions::diagonal,
            0b001 => mask_functions::columns,
            0b010 => mask_functions::rows,
            0b011 => mask_functions::wide_tiles,
            0b100 => mask_functions::tall_tiles,
            0b101 => mask_functions::stripes,
            0b110 => mask_functions::meadow,
            0b111 => mask_functions::waves,
            _ => unreachable!(),
        }
    }

    /// Mask value XORed onto the color index of module (x, y).
    pub fn value(self, x: usize, y: usize, colors: usize) -> u8 {
        let f = self.mask_functions();
        (f(x as i32, y as i32) as usize % colors) as u8
    }
}

// Masked grid
//------------------------------------------------------------------------------

/// Color indices of one symbol, row major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModuleGrid {
    pub w: usize,
    pub h: usize,
    pub cells: Vec<u8>,
}

impl ModuleGrid {
    pub fn new(w: usize, h: usize, cells: Vec<u8>) -> Self {
        debug_assert!(cells.len() == w * h, "Grid size mismatch: {} != {w}x{h}", cells.len());
        Self { w, h, cells }
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.w + x]
    }

    // Masking is an involution, the same call removes it
    pub fn apply_mask(&mut self, pattern: MaskPattern, colors: usize) {
        for y in 0..self.h {
            for x in 0..self.w {
                self.cells[y * self.w + x] ^= pattern.value(x, y, colors);
            }
        }
    }
}

pub(crate) fn apply_best_mask(grids: &mut [ModuleGrid], colors: usize) -> MaskPattern {
    let best_mask = (0..8)
        .min_by_key(|&m| {
            grids
                .iter()
                .map(|g| {
                    let mut g = g.clone();
                    g.apply_mask(MaskPattern(m), colors);
                    compute_total_penalty(&g)
                })
                .sum::<u32>()
        })
        .unwrap_or(7);
    let best_mask = MaskPattern(best_mask);
    grids.iter_mut().for_each(|g| g.apply_mask(best_mask, colors));
    best_mask
}

pub(crate) fn compute_total_penalty(grid: &ModuleGrid) -> u32 {
    compute_adjacent_penalty(grid) + compute_block_penalty(grid)
}

// Runs of 5 or more same-colored modules in a row or column
fn compute_adjacent_penalty(grid: &ModuleGrid) -> u32 {
    let mut pen = 0;
    let mut cols = vec![(u8::MAX, 0); grid.w];
    for r in 0..grid.h {
        let mut last = u8::MAX;
        let mut consec_row_len = 0;
        for (c, col) in cols.iter_mut().enumerate() {
            let clr = grid.get(c, r);
            if last != clr {
                last = clr;
                consec_row_len = 0;
            }
            consec_row_len += 1;
            if consec_row_len >= 5 {
                pen += if consec_row_len == 5 { 3 } else { 1 };
            }
            if col.0 != clr {
                col.0 = clr;
                col.1 = 0;
            }
            col.1 += 1;
            if col.1 >= 5 {
                pen += if col.1 == 5 { 3 } else { 1 };
            }
        }
    }
    pen
}

fn compute_block_penalty(grid: &ModuleGrid) -> u32 {
    let mut pen = 0;
    for r in 0..grid.h.saturating_sub(1) {
        for c in 0..grid.w.saturating_sub(1) {
            let clr = grid.get(c, r);
            if clr == grid.get(c + 1, r) && clr == grid.get(c, r + 1) && clr == grid.get(c + 1, r + 1)
            {
                pen += 3;
            }
        }
    }
    pen
}
