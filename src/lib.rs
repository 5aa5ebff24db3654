pub mod api;
pub mod error;
pub mod logger;
pub mod metadata;
pub mod parser;
pub mod raster;
pub use crate::error::{Error, Result};
pub use api::{DecodeOptions, Decoded, decode, decode_with_options, is_lerc1};
pub use metadata::{BlobInfo, BlockGridInfo, Header, TileEncoding};
pub use raster::{DecodedGrid, ValidityMask};
