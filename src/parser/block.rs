use crate::error::{Error, Result, Section};
use crate::metadata::TileEncoding;
use crate::raster::{DecodedGrid, ValidityMask};

use super::bitstuffer::read_packed_run;
use super::byteorder::ByteReader;
use super::tiles::TileRect;

const FLAG_HAS_MINIMUM: u8 = 1;
const FLAG_CONSTANT: u8 = 2;
const FLAG_LIMIT: u8 = 4;

/// Quantization parameters shared by every tile of the data block grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantization {
    /// Step between adjacent packed integers (the blob's `max_z_error`).
    pub quantum: f64,
    /// Upper clamp for reconstructed values.
    pub max_value: f32,
}

/// Decodes one tile at the reader position into `grid`.
///
/// Only pixels `mask` marks valid are written, and only they have entries in
/// the tile payload.
pub(crate) fn read_tile(
    reader: &mut ByteReader<'_>,
    grid: &mut DecodedGrid,
    rect: TileRect,
    mask: &ValidityMask,
    quantization: Quantization,
) -> Result<TileEncoding> {
    let section = rect.section();
    if rect.x0 > rect.x1
        || rect.y0 > rect.y1
        || rect.x1 > grid.width()
        || rect.y1 > grid.height()
        || (mask.width(), mask.height()) != (grid.width(), grid.height())
    {
        return Err(Error::corrupted(section, "tile lies outside the decoded grid"));
    }
    let control = reader.read_u8()?;
    let flags = control & 0x3F;
    if flags >= FLAG_LIMIT {
        return Err(Error::unsupported(format!(
            "tile flags {flags:#04x} in {section}"
        )));
    }

    if flags == 0 {
        for_each_valid(grid, rect, mask, |cell| {
            *cell = reader.read_f32()?;
            Ok(())
        })?;
        return Ok(TileEncoding::Literal);
    }

    let minimum = if flags & FLAG_HAS_MINIMUM == 0 {
        0.0
    } else {
        read_minimum(reader, control >> 6, &section)?
    };

    if flags & FLAG_CONSTANT != 0 {
        for_each_valid(grid, rect, mask, |cell| {
            *cell = minimum;
            Ok(())
        })?;
        return Ok(TileEncoding::Constant);
    }

    let run = read_packed_run(reader)?;
    let expected = rect.valid_count(mask);
    if run.values.len() != expected {
        return Err(Error::corrupted(
            section,
            format!(
                "packed run holds {} values for {expected} valid pixels",
                run.values.len()
            ),
        ));
    }

    let mut values = run.values.iter();
    for_each_valid(grid, rect, mask, |cell| {
        // Lengths were checked above.
        if let Some(&n) = values.next() {
            *cell = dequantize(minimum, n, quantization);
        }
        Ok(())
    })?;
    Ok(TileEncoding::Quantized {
        bits_per_value: run.bits_per_value,
    })
}

fn read_minimum(reader: &mut ByteReader<'_>, selector: u8, section: &Section) -> Result<f32> {
    match selector {
        0 => reader.read_f32(),
        1 => reader.read_i16().map(f32::from),
        2 => reader.read_i8().map(f32::from),
        _ => Err(Error::corrupted(
            section.clone(),
            "minimum value type selector 3 is undefined",
        )),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn dequantize(minimum: f32, n: u32, quantization: Quantization) -> f32 {
    let value = (f64::from(minimum) + quantization.quantum * f64::from(n)) as f32;
    value.min(quantization.max_value)
}

fn for_each_valid<F>(grid: &mut DecodedGrid, rect: TileRect, mask: &ValidityMask, mut f: F) -> Result<()>
where
    F: FnMut(&mut f32) -> Result<()>,
{
    let width = grid.width() as usize;
    let cells = grid.values_mut();
    for y in rect.y0..rect.y1 {
        let row = y as usize * width;
        for x in rect.x0..rect.x1 {
            let index = row + x as usize;
            if mask.is_valid_index(index) {
                f(&mut cells[index])?;
            }
        }
    }
    Ok(())
}

/// Decodes the tile covering `rect` from `blob[offset..]` and returns the
/// offset just past its payload.
///
/// # Errors
///
/// Returns an error if the tile uses unsupported flags, is truncated, or its
/// packed run does not hold one value per valid pixel.
pub fn read_block(
    grid: &mut DecodedGrid,
    rect: TileRect,
    mask: &ValidityMask,
    quantization: Quantization,
    blob: &[u8],
    offset: usize,
) -> Result<usize> {
    let mut reader = ByteReader::new(blob, offset, rect.section());
    read_tile(&mut reader, grid, rect, mask, quantization)?;
    Ok(reader.position())
}
