//! Contract between the CONVERT operation and a codec backend.
//!
//! The core only knows which output formats are allowed and which kind of
//! media each one is; the actual transcoding is supplied by an
//! implementation of [`Converter`].

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

const IMAGE_FORMATS: &[&str] = &["jpg", "jpeg", "png", "webp", "tiff", "gif"];
const AUDIO_FORMATS: &[&str] = &["mp3", "wav", "flac", "ogg", "aac", "wma"];
const VIDEO_FORMATS: &[&str] = &["mp4", "webm", "mkv", "avi", "flv", "mov", "mpeg", "wmv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// An allowed output format, normalized to lower case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFormat {
    extension: String,
    kind: MediaKind,
}

impl MediaFormat {
    pub fn parse(format: &str) -> Option<Self> {
        let extension = format.to_lowercase();

        let kind = if IMAGE_FORMATS.contains(&extension.as_str()) {
            MediaKind::Image
        } else if AUDIO_FORMATS.contains(&extension.as_str()) {
            MediaKind::Audio
        } else if VIDEO_FORMATS.contains(&extension.as_str()) {
            MediaKind::Video
        } else {
            return None;
        };

        Some(Self { extension, kind })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension)
    }
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("No conversion backend configured")]
    NoBackend,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported conversion: {0}")]
    Unsupported(String),

    #[error("Conversion failed: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Converter: Send + Sync {
    /// Writes `input` re-encoded as `output`; the output format is implied by
    /// the extension of `output`.
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        kind: MediaKind,
    ) -> Result<(), ConversionError>;
}

/// Default backend for clients built without a codec.
pub struct Unconfigured;

#[async_trait]
impl Converter for Unconfigured {
    async fn convert(&self, _: &Path, _: &Path, _: MediaKind) -> Result<(), ConversionError> {
        Err(ConversionError::NoBackend)
    }
}
