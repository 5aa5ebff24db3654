use byteorder::{ByteOrder, LittleEndian};
use smallvec::SmallVec;

use crate::error::{Error, Result, Section};

use super::byteorder::ByteReader;

/// Packed words held inline before spilling to the heap.
const INLINE_WORDS: usize = 64;

/// Largest width a packed value may have. Runs declaring 32 or more bits are
/// malformed.
pub const MAX_BITS_PER_VALUE: u8 = 31;

/// Cursor over MSB-first packed values spread across 32-bit words.
///
/// `current_word` is the word being consumed and `bits_remaining` how many of
/// its low-order bits have not been handed out yet. A value that straddles two
/// words takes the remaining low bits of the current word as its high part and
/// the top bits of the next word as its low part.
#[derive(Debug, Clone)]
pub struct BitCursor<'w> {
    words: &'w [u32],
    next_word: usize,
    current_word: u32,
    bits_remaining: u32,
}

impl<'w> BitCursor<'w> {
    #[must_use]
    pub const fn new(words: &'w [u32]) -> Self {
        Self {
            words,
            next_word: 0,
            current_word: 0,
            bits_remaining: 0,
        }
    }

    #[must_use]
    pub const fn bits_remaining(&self) -> u32 {
        self.bits_remaining
    }

    /// Takes the next `bits`-wide value (`1..=32`), or `None` once the words
    /// are exhausted.
    pub fn take(&mut self, bits: u32) -> Option<u32> {
        debug_assert!((1..=32).contains(&bits));
        if self.bits_remaining >= bits {
            self.bits_remaining -= bits;
            let value = (u64::from(self.current_word) >> self.bits_remaining) & low_bits(bits);
            return u32::try_from(value).ok();
        }

        let missing = bits - self.bits_remaining;
        let high = u64::from(self.current_word) & low_bits(self.bits_remaining);
        self.current_word = *self.words.get(self.next_word)?;
        self.next_word += 1;
        self.bits_remaining = 32 - missing;
        let low = u64::from(self.current_word) >> self.bits_remaining;
        u32::try_from((high << missing) | low).ok()
    }
}

const fn low_bits(bits: u32) -> u64 {
    (1_u64 << bits) - 1
}

/// One decoded run of packed integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedRun {
    pub bits_per_value: u8,
    pub values: Vec<u32>,
}

/// Reads a bit-stuffed run at the reader position.
///
/// Layout: a control byte whose top two bits select how the element count is
/// stored (`u32`, `u16`, `u8`) and whose low six bits give the value width;
/// the count; then `ceil(count * width / 8)` bytes of packed data. Whole
/// 32-bit words are little-endian. A trailing partial word only stores the
/// bytes it needs, which belong at its high-order end.
pub(crate) fn read_packed_run(reader: &mut ByteReader<'_>) -> Result<PackedRun> {
    let control = reader.read_u8()?;
    let bits_per_value = control & 0x3F;
    if bits_per_value == 0 {
        return Ok(PackedRun {
            bits_per_value,
            values: Vec::new(),
        });
    }
    if bits_per_value > MAX_BITS_PER_VALUE {
        return Err(Error::unsupported(format!(
            "{bits_per_value} bits per packed value"
        )));
    }

    let count = match control >> 6 {
        0 => reader.read_u32()?,
        1 => u32::from(reader.read_u16()?),
        2 => u32::from(reader.read_u8()?),
        _ => {
            return Err(Error::corrupted(
                Section::BitStuffer,
                "element count type selector 3 is undefined",
            ));
        }
    };

    let total_bits = u64::from(count) * u64::from(bits_per_value);
    let byte_len = usize::try_from(total_bits.div_ceil(8)).map_err(|_| {
        Error::corrupted(Section::BitStuffer, "packed run does not fit in memory")
    })?;
    let packed = reader.take(byte_len)?;

    let words = assemble_words(packed);
    let mut cursor = BitCursor::new(&words);
    let bits = u32::from(bits_per_value);
    let values = (0..count)
        .map(|_| cursor.take(bits))
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(|| Error::corrupted(Section::BitStuffer, "packed words exhausted early"))?;

    Ok(PackedRun {
        bits_per_value,
        values,
    })
}

fn assemble_words(packed: &[u8]) -> SmallVec<[u32; INLINE_WORDS]> {
    let mut words = SmallVec::with_capacity(packed.len().div_ceil(4));
    let whole = packed.chunks_exact(4);
    let tail = whole.remainder();
    words.extend(whole.map(LittleEndian::read_u32));
    if !tail.is_empty() {
        let shift = 4 - tail.len();
        let partial = tail
            .iter()
            .enumerate()
            .fold(0_u32, |word, (i, &byte)| word | (u32::from(byte) << (8 * (i + shift))));
        words.push(partial);
    }
    words
}

/// Decodes the bit-stuffed run at `blob[offset..]`.
///
/// Returns the values and the offset just past the run. A zero value width
/// means an empty run that occupies only the control byte.
///
/// # Errors
///
/// Returns an error if the run is truncated, uses an undefined count type, or
/// declares values wider than [`MAX_BITS_PER_VALUE`] bits.
pub fn unpack_values(blob: &[u8], offset: usize) -> Result<(Vec<u32>, usize)> {
    let mut reader = ByteReader::new(blob, offset, Section::BitStuffer);
    let run = read_packed_run(&mut reader)?;
    Ok((run.values, reader.position()))
}
