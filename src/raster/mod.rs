mod grid;
mod mask;

pub use grid::DecodedGrid;
pub use mask::ValidityMask;
