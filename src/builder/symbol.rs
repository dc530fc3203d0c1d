use std::io::Cursor;

use image::{GrayImage, ImageFormat, ImageResult, Luma, Rgb, RgbImage};

use crate::common::bitstream::BitStream;
use crate::common::iter::ZigZagIter;
use crate::common::mask::MaskPattern;
use crate::common::metadata::{
    format_info, ECLevel, Version, FORMAT_INFO_BIT_LEN, FORMAT_INFO_COORDS_MAIN,
    FORMAT_INFO_COORDS_SIDE, VERSION_INFO_BIT_LEN, VERSION_INFO_COORDS_BL, VERSION_INFO_COORDS_TR,
};

// Module
//------------------------------------------------------------------------------

/// One cell of the grid. Function, format and version cells are reserved:
/// payload streaming and masking leave them alone. `true` is dark.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Module {
    Empty,
    Func(bool),
    Format(bool),
    Version(bool),
    Data(bool),
}

impl Module {
    fn is_dark(self) -> bool {
        matches!(self, Self::Func(true) | Self::Format(true) | Self::Version(true) | Self::Data(true))
    }
}

// Symbol
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Symbol {
    version: Version,
    width: usize,
    ec_level: ECLevel,
    mask_pattern: Option<MaskPattern>,
    quiet_zone: bool,
    grid: Vec<Module>,
}

impl Symbol {
    pub(crate) fn new(version: Version, ec_level: ECLevel, quiet_zone: bool) -> Self {
        let width = version.width();
        Self {
            version,
            width,
            ec_level,
            mask_pattern: None,
            quiet_zone,
            grid: vec![Module::Empty; width * width],
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Modules per side, quiet zone not included.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    pub fn mask_pattern(&self) -> Option<MaskPattern> {
        self.mask_pattern
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.width as i16;
        debug_assert!(-w <= r && r < w, "Row {r} out of range {w}");
        debug_assert!(-w <= c && c < w, "Column {c} out of range {w}");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        (r * w + c) as usize
    }

    pub(crate) fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    pub(crate) fn set(&mut self, r: i16, c: i16, module: Module) {
        let index = self.coord_to_index(r, c);
        self.grid[index] = module;
    }

    pub(crate) fn is_dark(&self, r: i16, c: i16) -> bool {
        self.get(r, c).is_dark()
    }

    pub(crate) fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|m| m.is_dark()).count()
    }

    fn count_empty_modules(&self) -> usize {
        self.grid.iter().filter(|&&m| m == Module::Empty).count()
    }

    #[cfg(test)]
    pub(crate) fn fill_data(&mut self, f: impl Fn(i16, i16) -> bool) {
        let w = self.width as i16;
        for r in 0..w {
            for c in 0..w {
                self.set(r, c, Module::Data(f(r, c)));
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn to_debug_str(&self) -> String {
        let w = self.width as i16;
        let mut res = String::with_capacity((w * (w + 1)) as usize);
        res.push('\n');
        for r in 0..w {
            for c in 0..w {
                res.push(match self.get(r, c) {
                    Module::Empty => '.',
                    Module::Func(true) => 'f',
                    Module::Func(false) => 'F',
                    Module::Format(true) => 'm',
                    Module::Format(false) => 'M',
                    Module::Version(true) => 'v',
                    Module::Version(false) => 'V',
                    Module::Data(true) => 'd',
                    Module::Data(false) => 'D',
                });
            }
            res.push('\n');
        }
        res
    }
}

// Function patterns
//------------------------------------------------------------------------------

impl Symbol {
    pub(crate) fn draw_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_patterns();
        self.draw_alignment_patterns();
    }

    fn draw_finder_patterns(&mut self) {
        self.draw_finder_pattern_at(3, 3);
        self.draw_finder_pattern_at(3, -4);
        self.draw_finder_pattern_at(-4, 3);
    }

    // 3x3 dark core, light ring, dark ring, and the light separator strip
    // clamped to the symbol edges
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let (dr_min, dr_max): (i16, i16) = if r > 0 { (-3, 4) } else { (-4, 3) };
        let (dc_min, dc_max): (i16, i16) = if c > 0 { (-3, 4) } else { (-4, 3) };
        for i in dr_min..=dr_max {
            for j in dc_min..=dc_max {
                let dark = match i.abs().max(j.abs()) {
                    4 => false,
                    3 => true,
                    2 => false,
                    _ => true,
                };
                self.set(r + i, c + j, Module::Func(dark));
            }
        }
    }

    fn draw_timing_patterns(&mut self) {
        let last = self.width as i16 - 9;
        for k in 8..=last {
            let dark = k & 1 == 0;
            self.set(6, k, Module::Func(dark));
            self.set(k, 6, Module::Func(dark));
        }
    }

    fn draw_alignment_patterns(&mut self) {
        let centers = self.version.alignment_centers();
        for &r in centers {
            for &c in centers {
                self.draw_alignment_pattern_at(r, c);
            }
        }
    }

    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        let last = self.width as i16 - 7;
        if (r == 6 && (c == 6 || c == last)) || (r == last && c == 6) {
            // would overlap a finder pattern
            return;
        }
        for i in -2..=2i16 {
            for j in -2..=2i16 {
                let dark = i.abs() == 2 || j.abs() == 2 || (i == 0 && j == 0);
                self.set(r + i, c + j, Module::Func(dark));
            }
        }
    }
}

// Format & version info
//------------------------------------------------------------------------------

impl Symbol {
    // Reserving draws a throwaway all-ones word; the real word lands when the
    // mask is applied.
    fn reserve_format_area(&mut self) {
        self.draw_format_info((1 << FORMAT_INFO_BIT_LEN) - 1);
    }

    fn draw_format_info(&mut self, info: u32) {
        self.draw_number(info, FORMAT_INFO_BIT_LEN, &FORMAT_INFO_COORDS_MAIN, Module::Format);
        self.draw_number(info, FORMAT_INFO_BIT_LEN, &FORMAT_INFO_COORDS_SIDE, Module::Format);
        // the one module that is always dark
        self.set(-8, 8, Module::Func(true));
    }

    fn draw_version_info(&mut self) {
        if self.version.number() < 7 {
            return;
        }
        let info = self.version.info();
        self.draw_number(info, VERSION_INFO_BIT_LEN, &VERSION_INFO_COORDS_TR, Module::Version);
        self.draw_number(info, VERSION_INFO_BIT_LEN, &VERSION_INFO_COORDS_BL, Module::Version);
    }

    fn draw_number(
        &mut self,
        number: u32,
        bit_len: usize,
        coords: &[(i16, i16)],
        module: fn(bool) -> Module,
    ) {
        let mut mask = 1 << (bit_len - 1);
        for &(r, c) in coords {
            self.set(r, c, module(number & mask != 0));
            mask >>= 1;
        }
    }
}

// Encoding region
//------------------------------------------------------------------------------

impl Symbol {
    pub(crate) fn draw_encoding_region(&mut self, payload: &BitStream) {
        self.reserve_format_area();
        self.draw_version_info();
        self.draw_payload(payload);
    }

    fn draw_payload(&mut self, payload: &BitStream) {
        let mut bits = payload.iter();
        for (r, c) in ZigZagIter::new(self.version) {
            if self.get(r, c) != Module::Empty {
                continue;
            }
            match bits.next() {
                Some(bit) => self.set(r, c, Module::Data(bit)),
                None => break,
            }
        }

        let empty = self.count_empty_modules();
        assert!(empty == 0, "{empty} empty module(s) left after payload streaming");
        assert!(bits.next().is_none(), "Payload bits left over after streaming");
    }

    pub(crate) fn apply_mask(&mut self, pattern: MaskPattern) {
        self.mask_pattern = Some(pattern);
        let mask_fn = pattern.mask_function();
        let w = self.width as i16;
        for r in 0..w {
            for c in 0..w {
                if mask_fn(r, c) {
                    if let Module::Data(bit) = self.get(r, c) {
                        self.set(r, c, Module::Data(!bit));
                    }
                }
            }
        }
        self.draw_format_info(format_info(self.ec_level, pattern));
    }
}

// Output
//------------------------------------------------------------------------------

impl Symbol {
    /// The finished matrix, row-major, `true` for dark modules, framed by a
    /// four-module quiet zone unless the builder disabled it.
    pub fn bitmap(&self) -> Vec<Vec<bool>> {
        let border = if self.quiet_zone { QUIET_ZONE_WIDTH } else { 0 };
        let size = self.width + 2 * border;
        let mut rows = vec![vec![false; size]; size];
        for r in 0..self.width {
            for c in 0..self.width {
                rows[r + border][c + border] = self.is_dark(r as i16, c as i16);
            }
        }
        rows
    }

    /// Terminal art, two block characters per module. Light modules print
    /// filled so the symbol keeps its contrast on dark terminals; `invert`
    /// flips that for light ones.
    pub fn to_str(&self, invert: bool) -> String {
        let bitmap = self.bitmap();
        let mut out = String::with_capacity(bitmap.len() * (bitmap.len() * 2 + 1));
        for row in &bitmap {
            for &dark in row {
                out.push_str(if dark == invert { "██" } else { "  " });
            }
            out.push('\n');
        }
        out
    }

    /// Half-height terminal art: half blocks pack two module rows into each
    /// text line. Same color convention as `to_str`.
    pub fn to_small_str(&self, invert: bool) -> String {
        let bitmap = self.bitmap();
        let size = bitmap.len();
        let mut out = String::with_capacity((size / 2 + 1) * (size + 1) * 3);
        for pair in bitmap.chunks(2) {
            for x in 0..size {
                let top = pair[0][x] == invert;
                let bottom = pair.get(1).is_some_and(|row| row[x] == invert);
                out.push(match (top, bottom) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            out.push('\n');
        }
        out
    }

    pub fn render(&self, module_size: u32) -> GrayImage {
        let bitmap = self.bitmap();
        let size = bitmap.len() as u32 * module_size;
        GrayImage::from_fn(size, size, |x, y| {
            let dark = bitmap[(y / module_size) as usize][(x / module_size) as usize];
            Luma([if dark { 0 } else { 255 }])
        })
    }

    /// Like `render`, with caller-chosen colors. The colors are opaque here;
    /// dark modules get `foreground`.
    pub fn render_color(&self, module_size: u32, foreground: [u8; 3], background: [u8; 3]) -> RgbImage {
        let bitmap = self.bitmap();
        let size = bitmap.len() as u32 * module_size;
        RgbImage::from_fn(size, size, |x, y| {
            let dark = bitmap[(y / module_size) as usize][(x / module_size) as usize];
            Rgb(if dark { foreground } else { background })
        })
    }

    pub fn to_png(&self, module_size: u32) -> ImageResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.render(module_size).write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

// Global constants
//------------------------------------------------------------------------------

const QUIET_ZONE_WIDTH: usize = 4;


#[cfg(test)]
mod function_pattern_tests {
    use super::Symbol;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_finder_patterns() {
        let mut symbol = Symbol::new(Version::new(1), ECLevel::L, true);
        symbol.draw_finder_patterns();
        assert_eq!(
            symbol.to_debug_str(),
            "\n\
             fffffffF.....Ffffffff\n\
             fFFFFFfF.....FfFFFFFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFFFFFfF.....FfFFFFFf\n\
             fffffffF.....Ffffffff\n\
             FFFFFFFF.....FFFFFFFF\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             FFFFFFFF.............\n\
             fffffffF.............\n\
             fFFFFFfF.............\n\
             fFfffFfF.............\n\
             fFfffFfF.............\n\
             fFfffFfF.............\n\
             fFFFFFfF.............\n\
             fffffffF.............\n"
        );
    }

    #[test]
    fn test_timing_patterns() {
        let mut symbol = Symbol::new(Version::new(1), ECLevel::L, true);
        symbol.draw_timing_patterns();
        assert_eq!(
            symbol.to_debug_str(),
            "\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             ........fFfFf........\n\
             .....................\n\
             ......f..............\n\
             ......F..............\n\
             ......f..............\n\
             ......F..............\n\
             ......f..............\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n"
        );
    }

    #[test]
    fn test_alignment_patterns_skip_finder_corners() {
        let mut symbol = Symbol::new(Version::new(7), ECLevel::L, true);
        symbol.draw_finder_patterns();
        symbol.draw_alignment_patterns();
        // center grid is 6, 22, 38; the three finder corners stay untouched
        for (r, c) in [(22i16, 22i16), (6, 22), (22, 6), (38, 22), (22, 38), (38, 38)] {
            assert!(symbol.is_dark(r, c), "center ({r}, {c})");
            assert!(symbol.is_dark(r - 2, c - 2), "ring ({r}, {c})");
            assert!(!symbol.is_dark(r - 1, c), "inner ring ({r}, {c})");
        }
        assert_eq!(symbol.get(8, 8), super::Module::Empty);
        // the (6, 38) center overlaps the top-right finder and is skipped
        assert_eq!(symbol.get(4, 36), super::Module::Empty);
    }

    // The cells left over after every reservation must hold exactly the
    // interleaved codewords plus the remainder bits, for every version.
    #[test]
    fn test_data_region_size() {
        for v in 1..=40 {
            let version = Version::new(v);
            let mut symbol = Symbol::new(version, ECLevel::L, true);
            symbol.draw_function_patterns();
            symbol.reserve_format_area();
            symbol.draw_version_info();
            let expected = version.total_codewords() * 8 + version.remainder_bits();
            assert_eq!(symbol.count_empty_modules(), expected, "version {v}");
        }
    }
}

#[cfg(test)]
mod encoding_region_tests {
    use super::{Module, Symbol};
    use crate::common::bitstream::BitStream;
    use crate::common::mask::MaskPattern;
    use crate::common::metadata::{ECLevel, Version};

    fn payload(version: Version, head: u8) -> BitStream {
        let bits = version.total_codewords() * 8 + version.remainder_bits();
        let mut payload = BitStream::with_capacity(bits);
        payload.push_bits(head, 4);
        payload.push_run(false, bits - 4);
        payload
    }

    fn drawn_symbol(head: u8) -> Symbol {
        let mut symbol = Symbol::new(Version::new(1), ECLevel::L, true);
        symbol.draw_function_patterns();
        symbol.draw_encoding_region(&payload(Version::new(1), head));
        symbol
    }

    #[test]
    fn test_payload_starts_bottom_right() {
        let symbol = drawn_symbol(0b1011);
        assert_eq!(symbol.get(20, 20), Module::Data(true));
        assert_eq!(symbol.get(20, 19), Module::Data(false));
        assert_eq!(symbol.get(19, 20), Module::Data(true));
        assert_eq!(symbol.get(19, 19), Module::Data(true));
        assert_eq!(symbol.get(18, 20), Module::Data(false));
    }

    #[test]
    #[should_panic]
    fn test_short_payload_panics() {
        let mut symbol = Symbol::new(Version::new(1), ECLevel::L, true);
        symbol.draw_function_patterns();
        let mut short = BitStream::new();
        short.push_run(false, 100);
        symbol.draw_encoding_region(&short);
    }

    #[test]
    fn test_mask_flips_only_data_modules() {
        let mut symbol = drawn_symbol(0);
        symbol.apply_mask(MaskPattern::new(0));
        // (20, 20) is on the checkerboard, (20, 19) is off it
        assert_eq!(symbol.get(20, 20), Module::Data(true));
        assert_eq!(symbol.get(20, 19), Module::Data(false));
        // function patterns stay as drawn
        assert!(symbol.is_dark(0, 0));
        assert!(!symbol.is_dark(7, 7));
    }

    #[test]
    fn test_format_info_placement() {
        let mut symbol = drawn_symbol(0);
        symbol.apply_mask(MaskPattern::new(0));
        // format word for (L, mask 0) is 0x77C4 = 111011111000100
        assert_eq!(symbol.get(8, 0), Module::Format(true));
        assert_eq!(symbol.get(8, 1), Module::Format(true));
        assert_eq!(symbol.get(8, 3), Module::Format(false));
        assert_eq!(symbol.get(7, 8), Module::Format(true));
        assert_eq!(symbol.get(2, 8), Module::Format(true));
        assert_eq!(symbol.get(0, 8), Module::Format(false));
        // the side copy mirrors the same word
        assert_eq!(symbol.get(-1, 8), Module::Format(true));
        assert_eq!(symbol.get(8, -1), Module::Format(false));
        assert_eq!(symbol.get(8, -8), Module::Format(true));
        // dark module
        assert_eq!(symbol.get(-8, 8), Module::Func(true));
    }

    #[test]
    fn test_bitmap_quiet_zone() {
        let symbol = drawn_symbol(0);
        let bitmap = symbol.bitmap();
        assert_eq!(bitmap.len(), 29);
        assert!(bitmap[0].iter().all(|&d| !d));
        assert!(bitmap.iter().all(|row| !row[3] && !row[25]));
        // top-left finder corner sits just inside the border
        assert!(bitmap[4][4]);
    }

    #[test]
    fn test_to_str_dimensions() {
        let symbol = drawn_symbol(0);
        let art = symbol.to_str(false);
        assert_eq!(art.lines().count(), 29);
        assert!(art.lines().all(|l| l.chars().count() == 58));
        // light quiet zone prints filled, the finder corner prints blank
        assert_eq!(art.lines().next().unwrap(), "█".repeat(58));
        assert_eq!(&art.lines().nth(4).unwrap().chars().nth(8).unwrap(), &' ');
    }

    #[test]
    fn test_to_str_invert_swaps_colors() {
        let symbol = drawn_symbol(0);
        let plain = symbol.to_str(false);
        let inverted = symbol.to_str(true);
        assert!(inverted.lines().next().unwrap().chars().all(|ch| ch == ' '));
        let swap = |s: &str| {
            s.chars().map(|ch| if ch == '█' { ' ' } else if ch == ' ' { '█' } else { ch }).collect::<String>()
        };
        assert_eq!(swap(&plain), inverted);
    }

    #[test]
    fn test_to_small_str_packs_two_rows_per_line() {
        let symbol = drawn_symbol(0);
        let art = symbol.to_small_str(false);
        // 29 module rows become 14 paired lines plus an odd half-height one
        assert_eq!(art.lines().count(), 15);
        assert!(art.lines().all(|l| l.chars().count() == 29));
        assert_eq!(art.lines().next().unwrap(), "█".repeat(29));
        assert_eq!(art.lines().last().unwrap(), "▀".repeat(29));
        // finder core over its light ring: dark module above a light one
        assert_eq!(art.lines().nth(4).unwrap().chars().nth(6).unwrap(), '▄');
    }

    #[test]
    fn test_render_scales_modules() {
        let symbol = drawn_symbol(0);
        let img = symbol.render(3);
        assert_eq!(img.dimensions(), (87, 87));
        // quiet zone is light, finder corner dark
        assert_eq!(img.get_pixel(0, 0).0, [255]);
        assert_eq!(img.get_pixel(12, 12).0, [0]);
    }

    #[test]
    fn test_render_color_uses_given_colors() {
        let symbol = drawn_symbol(0);
        let img = symbol.render_color(1, [10, 20, 30], [200, 210, 220]);
        assert_eq!(img.get_pixel(0, 0).0, [200, 210, 220]);
        assert_eq!(img.get_pixel(4, 4).0, [10, 20, 30]);
    }

    #[test]
    fn test_to_png_signature() {
        let symbol = drawn_symbol(0);
        let png = symbol.to_png(2).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_bitmap_without_quiet_zone() {
        let mut symbol = Symbol::new(Version::new(1), ECLevel::L, false);
        symbol.draw_function_patterns();
        symbol.draw_encoding_region(&payload(Version::new(1), 0));
        let bitmap = symbol.bitmap();
        assert_eq!(bitmap.len(), 21);
        assert!(bitmap[0][0]);
    }
}
