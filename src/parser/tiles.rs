use crate::error::{Error, Result, Section};
use crate::metadata::{BlockGridInfo, TileEncoding};
use crate::raster::{DecodedGrid, ValidityMask};

use super::block::{Quantization, read_tile};
use super::byteorder::ByteReader;

/// Pixel rectangle `[x0, x1) x [y0, y1)` covered by one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub row: u32,
    pub column: u32,
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl TileRect {
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    #[must_use]
    pub const fn section(&self) -> Section {
        Section::tile(self.row, self.column)
    }

    #[must_use]
    pub fn valid_count(&self, mask: &ValidityMask) -> usize {
        mask.valid_count_in(self.x0, self.y0, self.x1, self.y1)
    }
}

/// Tiling of a `width` x `height` grid by the data block grid.
///
/// Along each axis there are `num_blocks` tiles of the nominal size
/// `extent / num_blocks`, followed by one tile holding the `extent % num_blocks`
/// remaining pixels when that remainder is not zero. Zero-sized tiles are
/// skipped, so a grid narrower than its block count is a single tile wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    width: u32,
    height: u32,
    blocks_x: u32,
    blocks_y: u32,
}

impl TileLayout {
    /// Builds the layout for `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-empty grid has no blocks along an axis.
    pub fn new(width: u32, height: u32, record: &BlockGridInfo) -> Result<Self> {
        if width == 0 || height == 0 {
            return Ok(Self {
                width,
                height,
                blocks_x: 1,
                blocks_y: 1,
            });
        }
        if record.num_blocks_x == 0 || record.num_blocks_y == 0 {
            return Err(Error::corrupted(
                Section::Header,
                "data block grid has no blocks along an axis",
            ));
        }
        Ok(Self {
            width,
            height,
            blocks_x: record.num_blocks_x,
            blocks_y: record.num_blocks_y,
        })
    }

    /// Nominal tile width.
    #[must_use]
    pub const fn block_width(&self) -> u32 {
        self.width / self.blocks_x
    }

    /// Nominal tile height.
    #[must_use]
    pub const fn block_height(&self) -> u32 {
        self.height / self.blocks_y
    }

    /// Number of tile rows and columns actually present.
    #[must_use]
    pub fn tile_counts(&self) -> (usize, usize) {
        (
            spans(self.height, self.blocks_y).len(),
            spans(self.width, self.blocks_x).len(),
        )
    }

    /// Tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = TileRect> + use<> {
        let columns = spans(self.width, self.blocks_x);
        spans(self.height, self.blocks_y)
            .into_iter()
            .zip(0_u32..)
            .flat_map(move |((y0, y1), row)| {
                columns
                    .clone()
                    .into_iter()
                    .zip(0_u32..)
                    .map(move |((x0, x1), column)| TileRect {
                        row,
                        column,
                        x0,
                        y0,
                        x1,
                        y1,
                    })
            })
    }
}

/// Pixel spans `[start, end)` of the tiles along one axis.
///
/// The work is bounded by `extent`, not by the declared block count.
fn spans(extent: u32, blocks: u32) -> Vec<(u32, u32)> {
    let nominal = extent / blocks;
    if nominal == 0 {
        return if extent == 0 {
            Vec::new()
        } else {
            vec![(0, extent)]
        };
    }
    let mut spans: Vec<(u32, u32)> = (0..blocks)
        .map(|index| (index * nominal, (index + 1) * nominal))
        .collect();
    let remainder = extent % blocks;
    if remainder > 0 {
        let start = blocks * nominal;
        spans.push((start, start + remainder));
    }
    spans
}

/// Decodes every tile of the layout in row-major order, threading the reader
/// through consecutive tile payloads.
pub(crate) fn read_tiles(
    reader: &mut ByteReader<'_>,
    grid: &mut DecodedGrid,
    mask: &ValidityMask,
    layout: &TileLayout,
    quantization: Quantization,
) -> Result<Vec<TileEncoding>> {
    let (rows, columns) = layout.tile_counts();
    let mut encodings = Vec::with_capacity(rows * columns);
    for rect in layout.tiles() {
        reader.set_section(rect.section());
        encodings.push(read_tile(reader, grid, rect, mask, quantization)?);
    }
    Ok(encodings)
}
