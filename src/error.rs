//! Error types for the retro graphics context.
//!
//! Configuration mistakes and missing preconditions fail fast through
//! `RetroError`. Degenerate drawing parameters are not errors; the
//! primitives treat them as no-ops.

use std::path::PathBuf;

/// Errors raised by surface configuration, palettes, fonts and loaders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetroError {
    /// Width below 8 (after rounding down to a multiple of 8) or height below 1
    InvalidResolution { width: u32, height: u32 },
    /// Malformed palette array or unknown preset name
    InvalidPalette(String),
    /// A font with this id is already registered
    DuplicateFontId(String),
    /// Font spec cannot be used (empty glyph map, zero glyph size)
    InvalidFontSpec(String),
    /// `text()` called before any font was selected
    NoFontSet,
    /// `set_font()` with an id that was never registered
    UnknownFont(String),
    /// Backing image for a font or sprite could not be loaded
    ImageLoad { source: PathBuf, reason: String },
    /// Config file could not be read or parsed
    Config(String),
}

impl std::fmt::Display for RetroError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetroError::InvalidResolution { width, height } => {
                write!(f, "invalid resolution {}x{}", width, height)
            },
            RetroError::InvalidPalette(msg) => write!(f, "invalid palette: {}", msg),
            RetroError::DuplicateFontId(id) => {
                write!(f, "a font with id '{}' is already registered", id)
            },
            RetroError::InvalidFontSpec(msg) => write!(f, "invalid font spec: {}", msg),
            RetroError::NoFontSet => write!(f, "no font is set"),
            RetroError::UnknownFont(id) => write!(f, "font '{}' has not been added", id),
            RetroError::ImageLoad { source, reason } => {
                write!(f, "failed to load image {}: {}", source.display(), reason)
            },
            RetroError::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for RetroError {}

impl From<serde_json::Error> for RetroError {
    fn from(err: serde_json::Error) -> Self {
        RetroError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RetroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RetroError::InvalidResolution {
            width: 0,
            height: 10,
        };
        assert_eq!(err.to_string(), "invalid resolution 0x10");
        assert_eq!(RetroError::NoFontSet.to_string(), "no font is set");
    }

    #[test]
    fn test_from_serde_json() {
        let err: RetroError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, RetroError::Config(_)));
    }
}
