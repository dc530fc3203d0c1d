use std::cmp::min;
use std::mem::swap;

use super::{Mode, Segment, MODES, MODE_BITS, PADDING_CODEWORDS};
use crate::common::bitstream::BitStream;
use crate::common::error::{QrError, QrResult};
use crate::common::metadata::{ECLevel, Version};

// Encoder
//------------------------------------------------------------------------------

/// Encodes `data` into the smallest version that holds it, terminator and
/// padding included.
pub(crate) fn encode(data: &[u8], ec_level: ECLevel) -> QrResult<(BitStream, Version)> {
    let (version, segments) = find_optimal_version_and_segments(data, ec_level)?;
    Ok((encode_segments(&segments, version.data_bit_capacity(ec_level)), version))
}

/// Encodes `data` for a caller-pinned version.
pub(crate) fn encode_with_version(
    data: &[u8],
    ec_level: ECLevel,
    version: Version,
) -> QrResult<BitStream> {
    let bit_capacity = version.data_bit_capacity(ec_level);
    let segments = compute_optimal_segments(data, version);
    let size: usize = segments.iter().map(|s| s.bit_len()).sum();
    if size > bit_capacity {
        return Err(QrError::DataTooLong);
    }
    Ok(encode_segments(&segments, bit_capacity))
}

fn encode_segments(segments: &[Segment], bit_capacity: usize) -> BitStream {
    let mut out = BitStream::with_capacity(bit_capacity);
    for segment in segments {
        push_segment(segment, &mut out);
    }
    push_terminator(&mut out, bit_capacity);
    pad_remaining_capacity(&mut out, bit_capacity);
    debug_assert!(out.len() == bit_capacity, "Padded length {} != capacity {bit_capacity}", out.len());
    out
}

/// Segments have to be recomputed whenever the char count widths change,
/// which happens at the band heads 1, 10 and 27.
fn find_optimal_version_and_segments(
    data: &[u8],
    ec_level: ECLevel,
) -> QrResult<(Version, Vec<Segment>)> {
    let mut segments = vec![];
    let mut size = 0;
    for v in 1..=40 {
        let version = Version::new(v);
        if v == 1 || v == 10 || v == 27 {
            segments = compute_optimal_segments(data, version);
            size = segments.iter().map(|s| s.bit_len()).sum();
        }
        if size <= version.data_bit_capacity(ec_level) {
            return Ok((version, segments));
        }
    }
    Err(QrError::DataTooLong)
}

// Dynamic program over per-character mode choices. Costs are counted in
// sixths of a bit so the 10/3-bit numeric and 11/2-bit alphanumeric
// per-character costs stay integral.
fn compute_optimal_segments<'a>(data: &'a [u8], version: Version) -> Vec<Segment<'a>> {
    if data.is_empty() {
        return vec![];
    }

    let header_cost = |m: Mode| (MODE_BITS + version.char_count_bits(m)) * 6;

    let mut prev_cost = [0usize; 3];
    MODES.iter().enumerate().for_each(|(i, &m)| prev_cost[i] = header_cost(m));
    let mut cur_cost = [usize::MAX; 3];
    let mut min_path = vec![[usize::MAX; 3]; data.len()];

    for (i, b) in data.iter().enumerate() {
        for (j, to_mode) in MODES.iter().enumerate() {
            if !to_mode.contains(*b) {
                continue;
            }
            let char_cost = match to_mode {
                Mode::Numeric => 20,
                Mode::Alphanumeric => 33,
                Mode::Byte => 48,
            };
            for (k, from_mode) in MODES.iter().enumerate() {
                if prev_cost[k] == usize::MAX {
                    continue;
                }
                let mut cost = if to_mode == from_mode {
                    prev_cost[k]
                } else {
                    // Close the open segment on a whole bit, open a new one
                    (prev_cost[k] + 5) / 6 * 6 + header_cost(*to_mode)
                };
                cost += char_cost;
                if cost < cur_cost[j] {
                    cur_cost[j] = cost;
                    min_path[i][j] = k;
                }
            }
        }
        swap(&mut prev_cost, &mut cur_cost);
        cur_cost.fill(usize::MAX);
    }

    let char_modes = trace_optimal_modes(min_path, prev_cost);
    build_segments(version, &char_modes, data)
}

// Backtrack through the predecessor table to a per-character mode list
fn trace_optimal_modes(min_path: Vec<[usize; 3]>, final_cost: [usize; 3]) -> Vec<Mode> {
    let len = min_path.len();
    let mut mode_index = 0;
    for i in 1..3 {
        if final_cost[i] < final_cost[mode_index] {
            mode_index = i;
        }
    }
    (0..len)
        .rev()
        .scan(mode_index, |mi, i| {
            let old_mi = *mi;
            *mi = min_path[i][*mi];
            Some(MODES[old_mi])
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}

// Coalesce equal-mode runs into segments
fn build_segments<'a>(version: Version, char_modes: &[Mode], data: &'a [u8]) -> Vec<Segment<'a>> {
    let mut segments = vec![];
    let mut seg_start = 0;
    let mut seg_mode = char_modes[0];
    for (i, &m) in char_modes.iter().enumerate().skip(1) {
        if seg_mode != m {
            segments.push(Segment::new(seg_mode, version.char_count_bits(seg_mode), &data[seg_start..i]));
            seg_mode = m;
            seg_start = i;
        }
    }
    segments.push(Segment::new(seg_mode, version.char_count_bits(seg_mode), &data[seg_start..]));
    segments
}

// Writer for encoded data
//------------------------------------------------------------------------------

fn push_segment(segment: &Segment, out: &mut BitStream) {
    push_header(segment, out);
    match segment.mode {
        Mode::Numeric => push_numeric_data(segment.data, out),
        Mode::Alphanumeric => push_alphanumeric_data(segment.data, out),
        Mode::Byte => push_byte_data(segment.data, out),
    }
}

fn push_header(segment: &Segment, out: &mut BitStream) {
    out.push_bits(segment.mode as u8, MODE_BITS);
    let char_count = segment.data.len();
    debug_assert!(
        char_count < (1 << segment.len_bits),
        "Char count {char_count} exceeds the {}-bit header",
        segment.len_bits
    );
    out.push_bits(char_count as u16, segment.len_bits);
}

fn push_numeric_data(data: &[u8], out: &mut BitStream) {
    for chunk in data.chunks(3) {
        out.push_bits(Mode::Numeric.encode_chunk(chunk), Mode::Numeric.encoded_len(chunk.len()));
    }
}

fn push_alphanumeric_data(data: &[u8], out: &mut BitStream) {
    for chunk in data.chunks(2) {
        out.push_bits(
            Mode::Alphanumeric.encode_chunk(chunk),
            Mode::Alphanumeric.encoded_len(chunk.len()),
        );
    }
}

fn push_byte_data(data: &[u8], out: &mut BitStream) {
    out.extend(data);
}

/// Up to four zero bits, fewer when the capacity leaves no room.
fn push_terminator(out: &mut BitStream, bit_capacity: usize) {
    debug_assert!(out.len() <= bit_capacity);
    out.push_run(false, min(4, bit_capacity - out.len()));
}

fn pad_remaining_capacity(out: &mut BitStream, bit_capacity: usize) {
    // Zero-fill up to the codeword boundary
    out.push_run(false, (8 - (out.len() & 7)) & 7);

    let remaining_codewords = (bit_capacity - out.len()) >> 3;
    PADDING_CODEWORDS.iter().copied().cycle().take(remaining_codewords).for_each(|pc| {
        out.push_bits(pc, 8);
    });
}
