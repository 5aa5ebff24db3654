/// Row-major validity bitmask, most significant bit first.
///
/// Pixel `(x, y)` lives at linear index `L = y * width + x`, in byte `L / 8`
/// under bit `128 >> (L % 8)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityMask {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl ValidityMask {
    /// Number of bytes needed to hold one bit per pixel.
    #[must_use]
    pub const fn byte_len(width: u32, height: u32) -> usize {
        (width as usize * height as usize).div_ceil(8)
    }

    /// Mask with every pixel valid.
    #[must_use]
    pub fn all_valid(width: u32, height: u32) -> Self {
        Self::uniform(width, height, 0xFF)
    }

    /// Mask with every pixel invalid.
    #[must_use]
    pub fn all_invalid(width: u32, height: u32) -> Self {
        Self::uniform(width, height, 0x00)
    }

    fn uniform(width: u32, height: u32, byte: u8) -> Self {
        Self {
            width,
            height,
            bits: vec![byte; Self::byte_len(width, height)],
        }
    }

    /// Wraps an already expanded bitset. Returns `None` if its length does not
    /// match the grid size.
    #[must_use]
    pub fn from_bitset(width: u32, height: u32, bits: Vec<u8>) -> Option<Self> {
        (bits.len() == Self::byte_len(width, height)).then_some(Self {
            width,
            height,
            bits,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Queries the mask at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid.
    #[must_use]
    pub fn at(&self, x: u32, y: u32) -> bool {
        assert!(
            x < self.width && y < self.height,
            "mask query ({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        self.is_valid_index(y as usize * self.width as usize + x as usize)
    }

    #[inline]
    #[must_use]
    pub fn is_valid_index(&self, index: usize) -> bool {
        self.bits[index >> 3] & (0x80 >> (index & 7)) != 0
    }

    /// Sets or clears the bit for `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid.
    pub fn set(&mut self, x: u32, y: u32, valid: bool) {
        assert!(x < self.width && y < self.height);
        let index = y as usize * self.width as usize + x as usize;
        let bit = 0x80 >> (index & 7);
        if valid {
            self.bits[index >> 3] |= bit;
        } else {
            self.bits[index >> 3] &= !bit;
        }
    }

    /// Number of valid pixels; padding bits past the last pixel are ignored.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        let pixels = self.width as usize * self.height as usize;
        let full_bytes = pixels / 8;
        let whole: usize = self.bits[..full_bytes]
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum();
        let tail = pixels % 8;
        if tail == 0 {
            return whole;
        }
        let keep = 0xFF_u8 << (8 - tail);
        whole + (self.bits[full_bytes] & keep).count_ones() as usize
    }

    /// Number of valid pixels inside `[x0, x1) x [y0, y1)`.
    #[must_use]
    pub fn valid_count_in(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> usize {
        let width = self.width as usize;
        (y0..y1)
            .map(|y| {
                let row = y as usize * width;
                (x0..x1)
                    .filter(|&x| self.is_valid_index(row + x as usize))
                    .count()
            })
            .sum()
    }

    /// Expands the mask to one byte per pixel: `1` valid, `0` invalid.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let pixels = self.width as usize * self.height as usize;
        (0..pixels)
            .map(|index| u8::from(self.is_valid_index(index)))
            .collect()
    }

    #[must_use]
    pub fn as_bitset(&self) -> &[u8] {
        &self.bits
    }
}
