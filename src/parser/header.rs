use crate::error::{Error, Result, Section};
use crate::metadata::{BlockGridInfo, Header};

use super::byteorder::ByteReader;

pub const LERC1_MAGIC: &[u8; 10] = b"CntZImage ";
pub const LERC1_FILE_VERSION: u32 = 11;
pub const LERC1_IMAGE_TYPE: u32 = 8;

/// Size of the fixed part: magic, version, type, height, width, half error.
pub const LERC1_FIXED_HEADER_SIZE: usize = 34;
pub const LERC1_BLOCK_GRID_RECORD_SIZE: usize = 16;

/// Parses the LERC1 header of the blob starting at `offset`.
///
/// The first block-grid record is taken as the mask record only when the blob
/// also holds a second record after its payload and the record has the shape
/// of a mask (no tiling, value `0.0` or `1.0`). Otherwise it is the data record.
///
/// # Errors
///
/// Returns an error if the magic, version or image type do not match the
/// supported legacy layout, or if a record lies outside the blob.
pub fn parse_header_at(blob: &[u8], offset: usize) -> Result<Header> {
    let mut reader = ByteReader::new(blob, offset, Section::Header);

    let magic = reader.take(LERC1_MAGIC.len())?;
    if magic != LERC1_MAGIC {
        return Err(Error::unsupported("unrecognized LERC1 magic tag"));
    }

    let file_version = reader.read_u32()?;
    if file_version != LERC1_FILE_VERSION {
        return Err(Error::unsupported(format!(
            "file version {file_version} (expected {LERC1_FILE_VERSION})"
        )));
    }
    let image_type = reader.read_u32()?;
    if image_type != LERC1_IMAGE_TYPE {
        return Err(Error::unsupported(format!(
            "image type {image_type} (expected {LERC1_IMAGE_TYPE})"
        )));
    }

    let height = reader.read_u32()?;
    let width = reader.read_u32()?;
    let max_z_error = reader.read_f64()? * 2.0;

    let first = read_block_grid(&mut reader)?;
    let payload_offset = reader.position();

    let (mask, data) = if has_second_record(blob, payload_offset, &first) && first.looks_like_mask()
    {
        reader.skip(first.num_bytes as usize)?;
        (Some(first), read_block_grid(&mut reader)?)
    } else {
        (None, first)
    };

    Ok(Header {
        file_version,
        image_type,
        height,
        width,
        max_z_error,
        mask,
        data,
        mask_offset: payload_offset,
        data_offset: reader.position(),
    })
}

/// Parses the LERC1 header at the start of `blob`.
///
/// # Errors
///
/// See [`parse_header_at`].
pub fn parse_header(blob: &[u8]) -> Result<Header> {
    parse_header_at(blob, 0)
}

fn read_block_grid(reader: &mut ByteReader<'_>) -> Result<BlockGridInfo> {
    Ok(BlockGridInfo {
        num_blocks_y: reader.read_u32()?,
        num_blocks_x: reader.read_u32()?,
        num_bytes: reader.read_u32()?,
        max_value: reader.read_f32()?,
    })
}

fn has_second_record(blob: &[u8], payload_offset: usize, first: &BlockGridInfo) -> bool {
    payload_offset
        .checked_add(first.num_bytes as usize)
        .and_then(|end| end.checked_add(LERC1_BLOCK_GRID_RECORD_SIZE))
        .is_some_and(|end| end <= blob.len())
}
