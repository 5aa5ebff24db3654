use crate::error::{Error, Result, Section};
use crate::raster::ValidityMask;

use super::byteorder::ByteReader;

/// Terminates every RLE-encoded mask payload.
pub const RLE_END_MARKER: i16 = i16::MIN;

/// Expands the RLE payload at `blob[offset..offset + size]`.
///
/// Each run starts with a signed 16-bit count: a negative count repeats the
/// following byte `|count|` times, a non-negative count copies that many
/// literal bytes. Runs are read while more than two payload bytes remain;
/// the final two bytes must hold [`RLE_END_MARKER`]. The expansion must be
/// exactly `expected_len` bytes long.
///
/// # Errors
///
/// Returns an error if the payload runs past its declared size, lacks the end
/// marker, or expands to a different length.
pub fn decode_rle(blob: &[u8], offset: usize, size: usize, expected_len: usize) -> Result<Vec<u8>> {
    let end = offset.checked_add(size).ok_or_else(|| {
        Error::corrupted(Section::Mask, "mask payload size overflows the blob offset")
    })?;
    let payload = blob.get(..end).ok_or(Error::Truncated {
        section: Section::Mask,
        needed: size,
        available: blob.len().saturating_sub(offset),
    })?;

    let mut reader = ByteReader::new(payload, offset, Section::Mask);
    let mut output = Vec::with_capacity(expected_len);
    let mut remaining = size;

    while remaining > 2 {
        let count = reader.read_i16()?;
        let consumed = if count < 0 {
            let value = reader.read_u8()?;
            let run = usize::from(count.unsigned_abs());
            ensure_room(&output, run, expected_len)?;
            output.resize(output.len() + run, value);
            3
        } else {
            let run = usize::from(count.unsigned_abs());
            let literal = reader.take(run)?;
            ensure_room(&output, run, expected_len)?;
            output.extend_from_slice(literal);
            2 + run
        };
        remaining = remaining.saturating_sub(consumed);
    }

    let marker = reader.read_i16()?;
    if marker != RLE_END_MARKER {
        return Err(Error::corrupted(
            Section::Mask,
            format!("RLE payload ends with {marker} instead of the end marker"),
        ));
    }
    if output.len() != expected_len {
        return Err(Error::corrupted(
            Section::Mask,
            format!(
                "RLE payload expands to {} bytes, expected {expected_len}",
                output.len()
            ),
        ));
    }
    Ok(output)
}

fn ensure_room(output: &[u8], run: usize, expected_len: usize) -> Result<()> {
    if output.len() + run > expected_len {
        return Err(Error::corrupted(
            Section::Mask,
            format!("RLE run of {run} bytes exceeds the {expected_len}-byte mask"),
        ));
    }
    Ok(())
}

/// Decodes the validity mask of a `width` x `height` grid.
///
/// A zero-length payload means a uniform mask: `max_value` holds the
/// per-pixel count, so `1.0` marks every pixel valid and `0.0` every pixel
/// invalid.
///
/// # Errors
///
/// Returns an error if the RLE payload is corrupt; see [`decode_rle`].
pub fn decode_mask(
    blob: &[u8],
    offset: usize,
    byte_length: usize,
    height: u32,
    width: u32,
    max_value: f32,
) -> Result<ValidityMask> {
    if byte_length == 0 {
        return Ok(if max_value > 0.0 {
            ValidityMask::all_valid(width, height)
        } else {
            ValidityMask::all_invalid(width, height)
        });
    }

    let expected_len = ValidityMask::byte_len(width, height);
    let bits = decode_rle(blob, offset, byte_length, expected_len)?;
    ValidityMask::from_bitset(width, height, bits)
        .ok_or_else(|| Error::corrupted(Section::Mask, "mask size does not match the grid"))
}
