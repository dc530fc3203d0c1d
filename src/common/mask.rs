use std::ops::Deref;

use itertools::Itertools;
use rayon::prelude::*;

use crate::builder::Symbol;

// Mask pattern
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> Self {
        debug_assert!(pattern < 8, "Invalid mask pattern {pattern}");
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
    pub fn checkerboard(r: i16, c: i16) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i16, _: i16) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i16, c: i16) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i16, c: i16) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i16, c: i16) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i16, c: i16) -> bool {
        (r * c) % 2 + (r * c) % 3 == 0
    }

    pub fn diamonds(r: i16, c: i16) -> bool {
        ((r * c) % 2 + (r * c) % 3) % 2 == 0
    }

    pub fn meadow(r: i16, c: i16) -> bool {
        ((r + c) % 2 + (r * c) % 3) % 2 == 0
    }
}

impl MaskPattern {
    pub(crate) fn mask_function(self) -> fn(i16, i16) -> bool {
        match self.0 {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            0b111 => mask_functions::meadow,
            _ => unreachable!("Invalid mask pattern"),
        }
    }
}

// Mask selection
//------------------------------------------------------------------------------

/// Scores all eight masks on independent clones and applies the cheapest one;
/// ties go to the smallest pattern number.
pub(crate) fn apply_best_mask(symbol: &mut Symbol) -> MaskPattern {
    let (_, best) = (0..8u8)
        .into_par_iter()
        .map(|m| {
            let mut candidate = symbol.clone();
            candidate.apply_mask(MaskPattern::new(m));
            (compute_total_penalty(&candidate), m)
        })
        .min()
        .expect("At least one mask candidate");
    let best = MaskPattern::new(best);
    symbol.apply_mask(best);
    best
}

// Penalty scoring
//------------------------------------------------------------------------------

pub(crate) fn compute_total_penalty(symbol: &Symbol) -> u32 {
    compute_run_penalty(symbol)
        + compute_block_penalty(symbol)
        + compute_finder_penalty(symbol)
        + compute_balance_penalty(symbol)
}

// Rule 1: 3 + (len - 5) for every run of 5 or more same-colored modules
fn compute_run_penalty(symbol: &Symbol) -> u32 {
    let w = symbol.width() as i16;
    let mut penalty = 0;
    for i in 0..w {
        penalty += run_score((0..w).map(|j| symbol.is_dark(i, j)));
        penalty += run_score((0..w).map(|j| symbol.is_dark(j, i)));
    }
    penalty
}

fn run_score(line: impl Iterator<Item = bool>) -> u32 {
    line.dedup_with_count().filter(|&(len, _)| len >= 5).map(|(len, _)| len as u32 - 2).sum()
}

// Rule 2: 3 for every 2x2 block of one color, overlaps included
fn compute_block_penalty(symbol: &Symbol) -> u32 {
    let w = symbol.width() as i16;
    let mut penalty = 0;
    for r in 0..w - 1 {
        for c in 0..w - 1 {
            let dark = symbol.is_dark(r, c);
            if dark == symbol.is_dark(r + 1, c)
                && dark == symbol.is_dark(r, c + 1)
                && dark == symbol.is_dark(r + 1, c + 1)
            {
                penalty += 3;
            }
        }
    }
    penalty
}

// Rule 3: 40 for every finder-like 1011101 run with a 4-module light flank
fn compute_finder_penalty(symbol: &Symbol) -> u32 {
    static PATTERN: &[bool] =
        &[true, false, true, true, true, false, true, false, false, false, false];
    static REVERSED: &[bool] =
        &[false, false, false, false, true, false, true, true, true, false, true];

    let w = symbol.width() as i16;
    let mut penalty = 0;
    for i in 0..w {
        let row: Vec<bool> = (0..w).map(|j| symbol.is_dark(i, j)).collect();
        let col: Vec<bool> = (0..w).map(|j| symbol.is_dark(j, i)).collect();
        for window in row.windows(11).chain(col.windows(11)) {
            if window == PATTERN || window == REVERSED {
                penalty += 40;
            }
        }
    }
    penalty
}

// Rule 4: 10 per full 5% the dark share sits away from 50%
fn compute_balance_penalty(symbol: &Symbol) -> u32 {
    let total = symbol.width() * symbol.width();
    let percent = symbol.count_dark_modules() * 100 / total;
    (percent.abs_diff(50) / 5 * 10) as u32
}
