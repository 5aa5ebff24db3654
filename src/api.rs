use crate::error::{Error, Result, Section};
use crate::logger::{DecodeWarning, scope_blob, warn};
use crate::metadata::{BlobInfo, Header, TileEncoding};
use crate::parser::{
    ByteReader, LERC1_MAGIC, Quantization, TileLayout, decode_mask, parse_header, parse_header_at,
    read_tiles,
};
use crate::raster::{DecodedGrid, ValidityMask};

/// Largest width or height accepted unless configured otherwise.
pub const DEFAULT_MAX_DIMENSION: u32 = 20_000;

/// Configures where the blob starts, how invalid pixels are filled and which
/// blobs are rejected up front.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    input_offset: usize,
    no_data_value: Option<f32>,
    max_dimension: u32,
    max_z_error: Option<f64>,
    mask: Option<ValidityMask>,
}

impl DecodeOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input_offset: 0,
            no_data_value: None,
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_z_error: None,
            mask: None,
        }
    }

    /// The blob starts `offset` bytes into the buffer.
    #[must_use]
    pub const fn with_input_offset(mut self, offset: usize) -> Self {
        self.input_offset = offset;
        self
    }

    /// Value written to masked-invalid pixels instead of `0.0`.
    #[must_use]
    pub const fn with_no_data_value(mut self, value: f32) -> Self {
        self.no_data_value = Some(value);
        self
    }

    #[must_use]
    pub const fn with_max_dimension(mut self, limit: u32) -> Self {
        self.max_dimension = limit;
        self
    }

    /// Rejects blobs quantized more coarsely than `tolerance`.
    #[must_use]
    pub const fn with_max_z_error(mut self, tolerance: f64) -> Self {
        self.max_z_error = Some(tolerance);
        self
    }

    /// Uses `mask` instead of the blob's own mask, which is then not decoded.
    /// Tiles sharing one mask (as in multi-tile containers) are stored this way.
    #[must_use]
    pub fn with_mask(mut self, mask: ValidityMask) -> Self {
        self.mask = Some(mask);
        self
    }

    #[must_use]
    pub const fn input_offset(&self) -> usize {
        self.input_offset
    }

    #[must_use]
    pub const fn no_data_value(&self) -> Option<f32> {
        self.no_data_value
    }

    #[must_use]
    pub const fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    #[must_use]
    pub const fn max_z_error(&self) -> Option<f64> {
        self.max_z_error
    }

    #[must_use]
    pub const fn mask(&self) -> Option<&ValidityMask> {
        self.mask.as_ref()
    }

    fn check_limits(&self, header: &Header) -> Result<()> {
        if header.width > self.max_dimension || header.height > self.max_dimension {
            return Err(Error::Limit {
                details: format!(
                    "{}x{} grid exceeds the {} pixel dimension limit",
                    header.width, header.height, self.max_dimension
                )
                .into(),
            });
        }
        if let Some(tolerance) = self.max_z_error
            && header.max_z_error > tolerance
        {
            return Err(Error::Limit {
                details: format!(
                    "max z error {} exceeds the tolerance {tolerance}",
                    header.max_z_error
                )
                .into(),
            });
        }
        Ok(())
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully decoded LERC1 blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub header: Header,
    pub mask: ValidityMask,
    pub grid: DecodedGrid,
    /// Encoding of every tile, row-major.
    pub tiles: Vec<TileEncoding>,
    /// Offset just past the last tile payload, relative to the buffer start.
    pub eof_offset: usize,
}

impl Decoded {
    /// Summarizes the blob: header fields, value range over valid pixels and
    /// the tile encodings in use.
    #[must_use]
    pub fn info(&self) -> BlobInfo {
        let range = self.grid.value_range(&self.mask);
        BlobInfo {
            file_identifier_string: String::from_utf8_lossy(LERC1_MAGIC).into_owned(),
            file_version: self.header.file_version,
            image_type: self.header.image_type,
            height: self.header.height,
            width: self.header.width,
            max_z_error: self.header.max_z_error,
            eof_offset: self.eof_offset,
            mask: self.header.mask,
            pixels: self.header.data,
            min_value: range.map(|(min, _)| min),
            max_value: range.map(|(_, max)| max),
            valid_pixel_count: self.mask.valid_count(),
            bit_depths: self
                .tiles
                .iter()
                .map(|tile| tile.bit_depth_label())
                .collect(),
        }
    }
}

/// Decodes a LERC1 blob with default options.
///
/// # Errors
///
/// Returns an error if the header is not a supported LERC1 header, or if the
/// mask or any tile is truncated or corrupt.
pub fn decode(blob: &[u8]) -> Result<Decoded> {
    decode_with_options(blob, &DecodeOptions::default())
}

/// Decodes a LERC1 blob.
///
/// The grid is allocated only once the header passed the configured limits
/// and the tile stream holds at least one byte per tile.
///
/// # Errors
///
/// Returns an error if the header is not a supported LERC1 header, the blob
/// exceeds a configured limit, a supplied mask does not match the grid, or the
/// mask or any tile is truncated or corrupt.
pub fn decode_with_options(blob: &[u8], options: &DecodeOptions) -> Result<Decoded> {
    let _scope = scope_blob(options.input_offset);

    let header = parse_header_at(blob, options.input_offset)?;
    options.check_limits(&header)?;

    let mask = match (&options.mask, &header.mask) {
        (Some(supplied), _) => {
            if (supplied.width(), supplied.height()) != (header.width, header.height) {
                return Err(Error::corrupted(
                    Section::Mask,
                    format!(
                        "supplied {}x{} mask does not match the {}x{} grid",
                        supplied.width(),
                        supplied.height(),
                        header.width,
                        header.height
                    ),
                ));
            }
            supplied.clone()
        }
        (None, Some(record)) => decode_mask(
            blob,
            header.mask_offset,
            record.num_bytes as usize,
            header.height,
            header.width,
            record.max_value,
        )?,
        (None, None) => ValidityMask::all_valid(header.width, header.height),
    };

    let fill = options.no_data_value.unwrap_or(0.0);
    let data = &header.data;
    if data.num_blocks_x == 0 || data.num_blocks_y == 0 {
        if mask.valid_count() > 0 {
            return Err(Error::corrupted(
                Section::Header,
                "data block grid has no blocks but the mask has valid pixels",
            ));
        }
        return Ok(Decoded {
            eof_offset: header.data_offset,
            grid: DecodedGrid::filled(header.width, header.height, fill),
            header,
            mask,
            tiles: Vec::new(),
        });
    }

    let layout = TileLayout::new(header.width, header.height, data)?;
    // Every tile starts with a control byte.
    let (rows, columns) = layout.tile_counts();
    let tile_count = rows.saturating_mul(columns);
    let available = blob.len().saturating_sub(header.data_offset);
    if available < tile_count {
        return Err(Error::Truncated {
            section: Section::Header,
            needed: tile_count,
            available,
        });
    }

    let mut grid = DecodedGrid::filled(header.width, header.height, fill);
    let quantization = Quantization {
        quantum: header.max_z_error,
        max_value: data.max_value,
    };
    let mut reader = ByteReader::new(blob, header.data_offset, Section::Header);
    let tiles = read_tiles(&mut reader, &mut grid, &mask, &layout, quantization)?;

    let eof_offset = reader.position();
    let consumed = eof_offset - header.data_offset;
    if consumed != data.num_bytes as usize {
        warn(&DecodeWarning::TileStreamSize {
            consumed,
            declared: data.num_bytes,
        });
    }

    Ok(Decoded {
        header,
        mask,
        grid,
        tiles,
        eof_offset,
    })
}

/// Whether `blob` starts with a supported LERC1 header.
#[must_use]
pub fn is_lerc1(blob: &[u8]) -> bool {
    parse_header(blob).is_ok()
}
