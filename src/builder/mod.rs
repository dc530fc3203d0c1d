mod symbol;

pub use symbol::Symbol;

use std::ops::Deref;

use crate::common::bitstream::BitStream;
use crate::common::codec::{encode, encode_with_version};
use crate::common::ec::ecc;
use crate::common::error::QrResult;
use crate::common::mask::{apply_best_mask, MaskPattern};
use crate::common::metadata::{ECLevel, Version};

// Builder
//------------------------------------------------------------------------------

/// Assembles a QR symbol from raw bytes: segment encoding, blockwise error
/// correction, interleaving, layout, and mask selection.
pub struct QrBuilder<'a> {
    data: &'a [u8],
    version: Option<Version>,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
    quiet_zone: bool,
}

impl<'a> QrBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, version: None, ec_level: ECLevel::M, mask: None, quiet_zone: true }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    /// Pins the version instead of searching for the smallest fit.
    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    /// Pins the mask pattern instead of scoring all eight.
    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    /// Whether the bitmap is framed by the four-module light border.
    pub fn quiet_zone(&mut self, quiet_zone: bool) -> &mut Self {
        self.quiet_zone = quiet_zone;
        self
    }

    pub fn build(&self) -> QrResult<Symbol> {
        let (encoded, version) = match self.version {
            Some(v) => (encode_with_version(self.data, self.ec_level, v)?, v),
            None => encode(self.data, self.ec_level)?,
        };

        let payload = interleaved_payload(encoded.data(), version, self.ec_level);

        let mut symbol = Symbol::new(version, self.ec_level, self.quiet_zone);
        symbol.draw_function_patterns();
        symbol.draw_encoding_region(&payload);

        match self.mask {
            Some(m) => symbol.apply_mask(m),
            None => {
                apply_best_mask(&mut symbol);
            }
        }

        Ok(symbol)
    }
}

// Error correction & interleaving
//------------------------------------------------------------------------------

/// Splits the data codewords into blocks, appends error correction to each,
/// and emits data then error correction in column-major order.
fn interleaved_payload(data: &[u8], version: Version, ec_level: ECLevel) -> BitStream {
    debug_assert_eq!(
        data.len(),
        version.data_codewords(ec_level),
        "Encoded data does not fill the data codewords"
    );

    let blocks = blockify(data, version, ec_level);
    let ec_len = version.ecc_per_block(ec_level);
    let ec_blocks: Vec<Vec<u8>> = blocks.iter().map(|b| ecc(b, ec_len)).collect();

    let mut payload =
        BitStream::with_capacity(version.total_codewords() * 8 + version.remainder_bits());
    payload.extend(&interleave(&blocks));
    payload.extend(&interleave(&ec_blocks));
    payload.push_run(false, version.remainder_bits());
    payload
}

fn blockify(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<&[u8]> {
    let (size1, count1, size2, count2) = version.data_codewords_per_block(ec_level);
    let group1_len = size1 * count1;

    let mut blocks = Vec::with_capacity(count1 + count2);
    blocks.extend(data[..group1_len].chunks(size1));
    if size2 > 0 {
        blocks.extend(data[group1_len..].chunks(size2));
    }
    blocks
}

// One byte per block per column; blocks shorter than the column index are
// skipped, which only happens in the data half of two-group versions.
fn interleave<T: Copy, B: Deref<Target = [T]>>(blocks: &[B]) -> Vec<T> {
    let longest = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
    let mut out = Vec::with_capacity(blocks.iter().map(|b| b.len()).sum());
    for i in 0..longest {
        out.extend(blocks.iter().filter_map(|b| b.get(i)));
    }
    out
}
