use std::borrow::Cow;
use std::fmt;

/// Result type used across the LERC1 decoder.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type surfaced by every stage of the decoder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The blob is inconsistent while decoding a section.
    #[error("corrupted LERC1 blob while decoding {section}: {details}")]
    Corrupted {
        section: Section,
        details: Cow<'static, str>,
    },

    /// A read would run past the end of the blob.
    #[error("truncated LERC1 blob while decoding {section}: needed {needed} bytes, {available} available")]
    Truncated {
        section: Section,
        needed: usize,
        available: usize,
    },

    /// Well-formed input that this decoder does not handle.
    #[error("unsupported LERC1 feature: {feature}")]
    Unsupported { feature: Cow<'static, str> },

    /// The blob exceeds a limit configured in the decode options.
    #[error("LERC1 blob rejected by decode limit: {details}")]
    Limit { details: Cow<'static, str> },
}

impl Error {
    pub(crate) fn corrupted(section: Section, details: impl Into<Cow<'static, str>>) -> Self {
        Self::Corrupted {
            section,
            details: details.into(),
        }
    }

    pub(crate) fn unsupported(feature: impl Into<Cow<'static, str>>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    /// Section of the blob that failed, if the error is tied to one.
    #[must_use]
    pub const fn section(&self) -> Option<&Section> {
        match self {
            Self::Corrupted { section, .. } | Self::Truncated { section, .. } => Some(section),
            Self::Unsupported { .. } | Self::Limit { .. } => None,
        }
    }
}

/// Logical section of the blob used for diagnostic reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Header,
    Mask,
    Tile { row: u32, column: u32 },
    BitStuffer,
}

impl Section {
    #[must_use]
    pub const fn tile(row: u32, column: u32) -> Self {
        Self::Tile { row, column }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "blob header"),
            Self::Mask => write!(f, "validity mask"),
            Self::Tile { row, column } => write!(f, "tile at row {row}, column {column}"),
            Self::BitStuffer => write!(f, "bit-stuffed integer run"),
        }
    }
}
