use std::collections::BTreeSet;

use serde::Serialize;

/// Block-grid record describing one sub-stream of the blob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockGridInfo {
    pub num_blocks_y: u32,
    pub num_blocks_x: u32,
    pub num_bytes: u32,
    pub max_value: f32,
}

impl BlockGridInfo {
    /// Whether this record has the shape of a mask record: no tiling and a
    /// uniform value of exactly `0.0` or `1.0`.
    #[must_use]
    pub fn looks_like_mask(&self) -> bool {
        (self.num_blocks_x | self.num_blocks_y) == 0
            && (self.max_value == 0.0 || self.max_value == 1.0)
    }
}

/// Parsed LERC1 header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub file_version: u32,
    pub image_type: u32,
    pub height: u32,
    pub width: u32,
    /// Maximum absolute quantization error; twice the value stored in the blob.
    pub max_z_error: f64,
    pub mask: Option<BlockGridInfo>,
    pub data: BlockGridInfo,
    /// Absolute offset of the RLE mask payload.
    pub mask_offset: usize,
    /// Absolute offset of the first tile payload.
    pub data_offset: usize,
}

impl Header {
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// How a single tile was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEncoding {
    /// Raw `f32` per valid pixel.
    Literal,
    /// Every valid pixel equals the tile minimum.
    Constant,
    Quantized { bits_per_value: u8 },
}

impl TileEncoding {
    /// Label used in [`BlobInfo::bit_depths`].
    #[must_use]
    pub fn bit_depth_label(self) -> String {
        match self {
            Self::Literal => "float32".to_owned(),
            Self::Constant => "0".to_owned(),
            Self::Quantized { bits_per_value } => bits_per_value.to_string(),
        }
    }
}

/// Summary of a decoded blob, shaped like the `fileInfo` object other LERC
/// readers report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobInfo {
    pub file_identifier_string: String,
    pub file_version: u32,
    pub image_type: u32,
    pub height: u32,
    pub width: u32,
    pub max_z_error: f64,
    pub eof_offset: usize,
    pub mask: Option<BlockGridInfo>,
    pub pixels: BlockGridInfo,
    pub min_value: Option<f32>,
    pub max_value: Option<f32>,
    pub valid_pixel_count: usize,
    pub bit_depths: BTreeSet<String>,
}

impl BlobInfo {
    /// Renders the summary as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
