mod bitstuffer;
mod block;
mod byteorder;
mod header;
mod mask;
mod tiles;

pub use bitstuffer::{BitCursor, MAX_BITS_PER_VALUE, PackedRun, unpack_values};
pub use block::{Quantization, read_block};
pub use byteorder::ByteReader;
pub use header::{
    LERC1_BLOCK_GRID_RECORD_SIZE, LERC1_FILE_VERSION, LERC1_FIXED_HEADER_SIZE, LERC1_IMAGE_TYPE,
    LERC1_MAGIC, parse_header, parse_header_at,
};
pub use mask::{RLE_END_MARKER, decode_mask, decode_rle};
pub use tiles::{TileLayout, TileRect};

pub(crate) use tiles::read_tiles;
