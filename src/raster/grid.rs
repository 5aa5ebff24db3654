use super::mask::ValidityMask;

/// Dense row-major grid of decoded values.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGrid {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl DecodedGrid {
    /// Allocates a grid with every cell set to `fill`.
    #[must_use]
    pub fn filled(width: u32, height: u32, fill: f32) -> Self {
        Self {
            width,
            height,
            values: vec![fill; width as usize * height as usize],
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Value at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    /// Minimum and maximum over the pixels `mask` marks valid.
    #[must_use]
    pub fn value_range(&self, mask: &ValidityMask) -> Option<(f32, f32)> {
        self.values
            .iter()
            .enumerate()
            .filter(|(index, _)| mask.is_valid_index(*index))
            .fold(None, |range, (_, &value)| match range {
                None => Some((value, value)),
                Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
            })
    }

    /// Widens every value to `f64`.
    #[must_use]
    pub fn to_f64(&self) -> Vec<f64> {
        self.values.iter().copied().map(f64::from).collect()
    }
}
