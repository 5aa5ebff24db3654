//! Test-only LERC1 writer: RLE masks, bit-stuffed runs, tiles and headers.
#![allow(dead_code)]

pub const MAGIC: &[u8; 10] = b"CntZImage ";

const MAX_RLE_RUN: usize = 32_767;

/// Assembles a blob from raw parts. The mask record is always followed by the
/// data record, so a mask record is always recognized as one.
#[derive(Debug, Clone)]
pub struct BlobBuilder {
    height: u32,
    width: u32,
    half_error: f64,
    mask: Option<(Vec<u8>, f32)>,
    blocks_y: u32,
    blocks_x: u32,
    max_value: f32,
    declared_bytes: Option<u32>,
    tiles: Vec<Vec<u8>>,
}

impl BlobBuilder {
    pub fn new(height: u32, width: u32) -> Self {
        Self {
            height,
            width,
            half_error: 0.5,
            mask: None,
            blocks_y: 1,
            blocks_x: 1,
            max_value: 0.0,
            declared_bytes: None,
            tiles: Vec::new(),
        }
    }

    pub fn half_error(mut self, half_error: f64) -> Self {
        self.half_error = half_error;
        self
    }

    pub fn blocks(mut self, blocks_y: u32, blocks_x: u32) -> Self {
        self.blocks_y = blocks_y;
        self.blocks_x = blocks_x;
        self
    }

    pub fn max_value(mut self, max_value: f32) -> Self {
        self.max_value = max_value;
        self
    }

    /// RLE-encodes an MSB-first bitset as the mask payload.
    pub fn mask_bits(self, bitset: &[u8]) -> Self {
        self.mask_payload(rle_encode(bitset), 1.0)
    }

    pub fn mask_payload(mut self, payload: Vec<u8>, value: f32) -> Self {
        self.mask = Some((payload, value));
        self
    }

    /// Zero-length mask payload: every pixel valid or every pixel invalid.
    pub fn uniform_mask(self, valid: bool) -> Self {
        self.mask_payload(Vec::new(), if valid { 1.0 } else { 0.0 })
    }

    /// Overrides the data record's byte count.
    pub fn declared_bytes(mut self, bytes: u32) -> Self {
        self.declared_bytes = Some(bytes);
        self
    }

    pub fn tile(mut self, bytes: Vec<u8>) -> Self {
        self.tiles.push(bytes);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut blob = MAGIC.to_vec();
        blob.extend_from_slice(&11_u32.to_le_bytes());
        blob.extend_from_slice(&8_u32.to_le_bytes());
        blob.extend_from_slice(&self.height.to_le_bytes());
        blob.extend_from_slice(&self.width.to_le_bytes());
        blob.extend_from_slice(&self.half_error.to_le_bytes());
        if let Some((payload, value)) = &self.mask {
            push_record(&mut blob, 0, 0, payload.len() as u32, *value);
            blob.extend_from_slice(payload);
        }
        let stream: Vec<u8> = self.tiles.concat();
        let declared = self.declared_bytes.unwrap_or(stream.len() as u32);
        push_record(
            &mut blob,
            self.blocks_y,
            self.blocks_x,
            declared,
            self.max_value,
        );
        blob.extend_from_slice(&stream);
        blob
    }
}

fn push_record(blob: &mut Vec<u8>, nby: u32, nbx: u32, nbytes: u32, value: f32) {
    blob.extend_from_slice(&nby.to_le_bytes());
    blob.extend_from_slice(&nbx.to_le_bytes());
    blob.extend_from_slice(&nbytes.to_le_bytes());
    blob.extend_from_slice(&value.to_le_bytes());
}

/// RLE-encodes `bytes`: runs of three or more equal bytes become repeat runs,
/// everything else literal runs; the end marker closes the payload.
pub fn rle_encode(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut literal = Vec::new();
    let mut index = 0;
    while index < bytes.len() {
        let byte = bytes[index];
        let run = bytes[index..]
            .iter()
            .take(MAX_RLE_RUN)
            .take_while(|&&b| b == byte)
            .count();
        if run >= 3 {
            flush_literal(&mut out, &mut literal);
            out.extend_from_slice(&(-(run as i16)).to_le_bytes());
            out.push(byte);
            index += run;
        } else {
            literal.push(byte);
            if literal.len() == MAX_RLE_RUN {
                flush_literal(&mut out, &mut literal);
            }
            index += 1;
        }
    }
    flush_literal(&mut out, &mut literal);
    out.extend_from_slice(&i16::MIN.to_le_bytes());
    out
}

fn flush_literal(out: &mut Vec<u8>, literal: &mut Vec<u8>) {
    if !literal.is_empty() {
        out.extend_from_slice(&(literal.len() as i16).to_le_bytes());
        out.append(literal);
    }
}

/// MSB-first bitset of a `width` x `height` grid.
pub fn bitset(width: u32, height: u32, valid: impl Fn(u32, u32) -> bool) -> Vec<u8> {
    let mut bits = vec![0_u8; (width as usize * height as usize).div_ceil(8)];
    for y in 0..height {
        for x in 0..width {
            if valid(x, y) {
                let index = (y * width + x) as usize;
                bits[index / 8] |= 0x80 >> (index % 8);
            }
        }
    }
    bits
}

/// Packs values MSB-first into little-endian words; the last word keeps only
/// the bytes it needs, taken from its high-order end.
pub fn pack_bits(values: &[u32], bits: u32) -> Vec<u8> {
    let total_bits = values.len() * bits as usize;
    let mut words = vec![0_u32; total_bits.div_ceil(32)];
    for (i, &value) in values.iter().enumerate() {
        for b in 0..bits {
            if (value >> (bits - 1 - b)) & 1 == 1 {
                let pos = i * bits as usize + b as usize;
                words[pos / 32] |= 1 << (31 - pos % 32);
            }
        }
    }
    let byte_len = total_bits.div_ceil(8);
    let full = byte_len / 4;
    let mut bytes = Vec::with_capacity(byte_len);
    for word in &words[..full] {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    let tail = byte_len % 4;
    if tail > 0 {
        bytes.extend_from_slice(&words[full].to_le_bytes()[4 - tail..]);
    }
    bytes
}

/// Control byte, count and packed bytes of one run, using the narrowest
/// count type.
pub fn packed_run(values: &[u32], bits: u8) -> Vec<u8> {
    let count = values.len();
    let mut run = Vec::new();
    if count < 256 {
        run.push((2 << 6) | bits);
        run.push(count as u8);
    } else if count < 65_536 {
        run.push((1 << 6) | bits);
        run.extend_from_slice(&(count as u16).to_le_bytes());
    } else {
        run.push(bits);
        run.extend_from_slice(&(count as u32).to_le_bytes());
    }
    run.extend_from_slice(&pack_bits(values, u32::from(bits)));
    run
}

pub fn literal_tile(values: &[f32]) -> Vec<u8> {
    let mut tile = vec![0x00];
    for value in values {
        tile.extend_from_slice(&value.to_le_bytes());
    }
    tile
}

/// Constant tile with an `f32` minimum.
pub fn constant_tile(value: f32) -> Vec<u8> {
    let mut tile = vec![0x03];
    tile.extend_from_slice(&value.to_le_bytes());
    tile
}

/// Constant tile with no minimum: every valid pixel is `0.0`.
pub fn empty_tile() -> Vec<u8> {
    vec![0x02]
}

/// Quantized tile with an `i16` minimum.
pub fn quantized_tile(minimum: i16, offsets: &[u32]) -> Vec<u8> {
    let max = offsets.iter().copied().max().unwrap_or(0);
    let bits = (32 - max.leading_zeros()).max(1) as u8;
    let mut tile = vec![(1 << 6) | 1];
    tile.extend_from_slice(&minimum.to_le_bytes());
    tile.extend_from_slice(&packed_run(offsets, bits));
    tile
}

/// Tile rectangles `(x0, y0, x1, y1)` in row-major order: `blocks` nominal
/// tiles per axis plus one remainder tile.
pub fn tile_rects(width: u32, height: u32, blocks_y: u32, blocks_x: u32) -> Vec<(u32, u32, u32, u32)> {
    let columns = axis_spans(width, blocks_x);
    let mut rects = Vec::new();
    for (y0, y1) in axis_spans(height, blocks_y) {
        for &(x0, x1) in &columns {
            rects.push((x0, y0, x1, y1));
        }
    }
    rects
}

fn axis_spans(extent: u32, blocks: u32) -> Vec<(u32, u32)> {
    let nominal = extent / blocks;
    let mut spans: Vec<(u32, u32)> = (0..blocks)
        .map(|i| (i * nominal, (i + 1) * nominal))
        .filter(|(start, end)| end > start)
        .collect();
    if extent % blocks > 0 {
        spans.push((blocks * nominal, extent));
    }
    spans
}

/// Encodes an integer-valued raster the way a LERC1 encoder with a
/// `max_z_error` of `1.0` would: degenerate mask when everything is valid,
/// otherwise an RLE mask; constant tiles for flat areas and quantized tiles
/// with an `i16` minimum elsewhere.
pub fn encode_raster(
    width: u32,
    height: u32,
    blocks_y: u32,
    blocks_x: u32,
    valid: impl Fn(u32, u32) -> bool,
    value: impl Fn(u32, u32) -> i16,
) -> Vec<u8> {
    let mut builder = BlobBuilder::new(height, width)
        .half_error(0.5)
        .blocks(blocks_y, blocks_x);

    let all_valid = (0..height).all(|y| (0..width).all(|x| valid(x, y)));
    builder = if all_valid {
        builder.uniform_mask(true)
    } else {
        builder.mask_bits(&bitset(width, height, &valid))
    };

    let mut global_max = None::<i16>;
    for (x0, y0, x1, y1) in tile_rects(width, height, blocks_y, blocks_x) {
        let values: Vec<i16> = (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| (x, y)))
            .filter(|&(x, y)| valid(x, y))
            .map(|(x, y)| value(x, y))
            .collect();
        let Some(&minimum) = values.iter().min() else {
            builder = builder.tile(empty_tile());
            continue;
        };
        let maximum = values.iter().copied().max().unwrap_or(minimum);
        global_max = Some(global_max.map_or(maximum, |m| m.max(maximum)));
        let tile = if maximum == minimum {
            let mut tile = vec![(1 << 6) | 3];
            tile.extend_from_slice(&minimum.to_le_bytes());
            tile
        } else {
            let offsets: Vec<u32> = values
                .iter()
                .map(|&v| (i32::from(v) - i32::from(minimum)) as u32)
                .collect();
            quantized_tile(minimum, &offsets)
        };
        builder = builder.tile(tile);
    }
    builder
        .max_value(f32::from(global_max.unwrap_or(0)))
        .build()
}

/// Stand-in for a 257 x 257 elevation tile: a one-pixel invalid border and
/// `111.0` at (74, 74).
pub fn elevation_tile() -> Vec<u8> {
    encode_raster(
        257,
        257,
        2,
        2,
        |x, y| x > 0 && y > 0 && x < 256 && y < 256,
        elevation,
    )
}

pub fn elevation(x: u32, y: u32) -> i16 {
    ((x + y) / 2 + 37) as i16
}
