use std::str::FromStr;

use super::codec::Mode;
use super::error::{QrError, QrResult};
use super::mask::MaskPattern;
use super::version_db::{
    ALIGNMENT_CENTERS, DATA_CODEWORDS_PER_BLOCK, ECC_PER_BLOCK, REMAINDER_BITS, TOTAL_CODEWORDS,
};

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    /// The level bit pair of the format information word.
    pub(crate) fn info_bits(self) -> u32 {
        match self {
            Self::L => 0b01,
            Self::M => 0b00,
            Self::Q => 0b11,
            Self::H => 0b10,
        }
    }
}

impl TryFrom<u8> for ECLevel {
    type Error = QrError;

    fn try_from(value: u8) -> QrResult<Self> {
        match value {
            0 => Ok(Self::L),
            1 => Ok(Self::M),
            2 => Ok(Self::Q),
            3 => Ok(Self::H),
            _ => Err(QrError::InvalidECLevel),
        }
    }
}

impl FromStr for ECLevel {
    type Err = QrError;

    fn from_str(s: &str) -> QrResult<Self> {
        match s {
            "L" | "l" => Ok(Self::L),
            "M" | "m" => Ok(Self::M),
            "Q" | "q" => Ok(Self::Q),
            "H" | "h" => Ok(Self::H),
            _ => Err(QrError::InvalidECLevel),
        }
    }
}

// Version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub struct Version(usize);

impl Version {
    pub fn new(version: usize) -> Self {
        debug_assert!((1..=40).contains(&version), "Invalid version {version}");
        Self(version)
    }

    pub fn number(self) -> usize {
        self.0
    }

    /// Modules per side.
    pub fn width(self) -> usize {
        17 + self.0 * 4
    }

    // The three bands 1-9, 10-26 and 27-40 share their header widths
    fn band(self) -> usize {
        match self.0 {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        }
    }

    /// Width of the character count header for `mode`.
    pub(crate) fn char_count_bits(self, mode: Mode) -> usize {
        match mode {
            Mode::Numeric => [10, 12, 14][self.band()],
            Mode::Alphanumeric => [9, 11, 13][self.band()],
            Mode::Byte => [8, 16, 16][self.band()],
        }
    }

    pub(crate) fn total_codewords(self) -> usize {
        TOTAL_CODEWORDS[self.0]
    }

    pub(crate) fn data_codewords(self, ec_level: ECLevel) -> usize {
        let (size1, count1, size2, count2) = self.data_codewords_per_block(ec_level);
        size1 * count1 + size2 * count2
    }

    /// Payload capacity in bits, terminator and padding included.
    pub fn data_bit_capacity(self, ec_level: ECLevel) -> usize {
        self.data_codewords(ec_level) * 8
    }

    pub(crate) fn ecc_per_block(self, ec_level: ECLevel) -> usize {
        ECC_PER_BLOCK[self.0][ec_level as usize]
    }

    /// Block layout as (group1 size, group1 count, group2 size, group2 count).
    pub(crate) fn data_codewords_per_block(self, ec_level: ECLevel) -> (usize, usize, usize, usize) {
        DATA_CODEWORDS_PER_BLOCK[self.0][ec_level as usize]
    }

    pub(crate) fn remainder_bits(self) -> usize {
        REMAINDER_BITS[self.0]
    }

    pub(crate) fn alignment_centers(self) -> &'static [i16] {
        ALIGNMENT_CENTERS[self.0]
    }

    /// The 18-bit version information word; versions 7 and up only.
    pub(crate) fn info(self) -> u32 {
        debug_assert!(self.0 >= 7, "No version info below version 7");
        let data = (self.0 as u32) << 12;
        data | bch_remainder(data, VERSION_INFO_GENERATOR)
    }
}

impl TryFrom<usize> for Version {
    type Error = QrError;

    fn try_from(value: usize) -> QrResult<Self> {
        if (1..=40).contains(&value) {
            Ok(Self(value))
        } else {
            Err(QrError::InvalidVersion)
        }
    }
}

// Format & version information words
//------------------------------------------------------------------------------

/// The 15-bit format information word for a level and mask choice:
/// 5 data bits, 10 BCH remainder bits, the whole word XOR-masked.
pub(crate) fn format_info(ec_level: ECLevel, mask: MaskPattern) -> u32 {
    let data = ((ec_level.info_bits() << 3) | *mask as u32) << 10;
    (data | bch_remainder(data, FORMAT_INFO_GENERATOR)) ^ FORMAT_INFO_MASK
}

fn bch_remainder(data: u32, generator: u32) -> u32 {
    let degree = 32 - generator.leading_zeros();
    let mut rem = data;
    while 32 - rem.leading_zeros() >= degree {
        rem ^= generator << (32 - rem.leading_zeros() - degree);
    }
    rem
}

// Global constants
//------------------------------------------------------------------------------

const FORMAT_INFO_GENERATOR: u32 = 0b101_0011_0111;
const FORMAT_INFO_MASK: u32 = 0b101_0100_0001_0010;
const VERSION_INFO_GENERATOR: u32 = 0b1_1111_0010_0101;

pub(crate) const FORMAT_INFO_BIT_LEN: usize = 15;
pub(crate) const VERSION_INFO_BIT_LEN: usize = 18;

// Coordinates are (row, column), most significant bit first; negative values
// index from the bottom/right edge.

pub(crate) static FORMAT_INFO_COORDS_MAIN: [(i16, i16); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

pub(crate) static FORMAT_INFO_COORDS_SIDE: [(i16, i16); 15] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];

pub(crate) static VERSION_INFO_COORDS_TR: [(i16, i16); 18] = [
    (5, -9),
    (5, -10),
    (5, -11),
    (4, -9),
    (4, -10),
    (4, -11),
    (3, -9),
    (3, -10),
    (3, -11),
    (2, -9),
    (2, -10),
    (2, -11),
    (1, -9),
    (1, -10),
    (1, -11),
    (0, -9),
    (0, -10),
    (0, -11),
];

pub(crate) static VERSION_INFO_COORDS_BL: [(i16, i16); 18] = [
    (-9, 5),
    (-10, 5),
    (-11, 5),
    (-9, 4),
    (-10, 4),
    (-11, 4),
    (-9, 3),
    (-10, 3),
    (-11, 3),
    (-9, 2),
    (-10, 2),
    (-11, 2),
    (-9, 1),
    (-10, 1),
    (-11, 1),
    (-9, 0),
    (-10, 0),
    (-11, 0),
];
