use super::metadata::Version;

// Zig-zag iterator over the encoding region
//------------------------------------------------------------------------------

/// Walks the data track: column pairs right to left, rows alternating upward
/// and downward, with the vertical timing column left out entirely.
pub(crate) struct ZigZagIter {
    width: i16,
    // Right column of the current pair
    col: i16,
    row: i16,
    // 0 selects the right cell of the pair, 1 the left
    offset: i16,
    upward: bool,
}

impl ZigZagIter {
    pub fn new(version: Version) -> Self {
        let width = version.width() as i16;
        Self { width, col: width - 1, row: width - 1, offset: 0, upward: true }
    }
}

impl Iterator for ZigZagIter {
    type Item = (i16, i16);

    fn next(&mut self) -> Option<Self::Item> {
        if self.col < 0 {
            return None;
        }
        let res = (self.row, self.col - self.offset);

        if self.offset == 0 {
            self.offset = 1;
            return Some(res);
        }
        self.offset = 0;

        let at_turn = if self.upward { self.row == 0 } else { self.row == self.width - 1 };
        if at_turn {
            self.upward = !self.upward;
            self.col -= 2;
            if self.col == 6 {
                // vertical timing column
                self.col -= 1;
            }
        } else if self.upward {
            self.row -= 1;
        } else {
            self.row += 1;
        }
        Some(res)
    }
}
