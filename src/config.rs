//! Settings used by the `MultipartEncoder`.
#[cfg(feature = "serde-impl")]
use serde::{Serialize, Deserialize};

use boundary::Boundary;
use error::EncodingError;

/// charset announced for text fields if nothing else is configured
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// size of the buffer used to copy attachments into the sink
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// upper limit for the configured chunk size (1 MiB)
pub const MAX_CHUNK_SIZE: usize = 1 << 20;

/// prefix used by the default `BoundaryStrategy`
pub const DEFAULT_BOUNDARY_PREFIX: &str = "MultipartDataBuilder";

/// How the boundary of a body is generated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-impl", derive(Serialize, Deserialize))]
pub enum BoundaryStrategy {
    /// `***<prefix><millis>***`, see `Boundary::timestamped`
    Timestamp { prefix: String },
    /// see `Boundary::random`
    Random,
}

impl BoundaryStrategy {
    pub fn generate(&self) -> Result<Boundary, EncodingError> {
        match *self {
            BoundaryStrategy::Timestamp { ref prefix } => Boundary::timestamped(prefix),
            BoundaryStrategy::Random => Boundary::random(),
        }
    }
}

impl Default for BoundaryStrategy {
    fn default() -> Self {
        BoundaryStrategy::Timestamp { prefix: DEFAULT_BOUNDARY_PREFIX.to_owned() }
    }
}

/// Configuration of a `MultipartEncoder`.
///
/// ```
/// use multipart_data_builder::{EncoderConfig, BoundaryStrategy};
///
/// let config = EncoderConfig::default()
///     .with_charset("ISO-8859-1")
///     .with_chunk_size(16 * 1024)
///     .with_boundary(BoundaryStrategy::Random);
///
/// assert_eq!(config.charset(), "ISO-8859-1");
/// assert_eq!(config.chunk_size(), 16 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-impl", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-impl", serde(default))]
pub struct EncoderConfig {
    charset: String,
    chunk_size: usize,
    boundary: BoundaryStrategy,
}

impl EncoderConfig {

    pub fn new() -> Self {
        Default::default()
    }

    /// the charset announced in the `Content-Type` of text fields
    ///
    /// Field values are always written as utf-8, this is only the label.
    pub fn with_charset<S: Into<String>>(mut self, charset: S) -> Self {
        self.charset = charset.into();
        self
    }

    /// size of the buffer attachments are copied with
    ///
    /// `0` means the default, sizes above `MAX_CHUNK_SIZE` are capped to it.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_boundary(mut self, strategy: BoundaryStrategy) -> Self {
        self.boundary = strategy;
        self
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn chunk_size(&self) -> usize {
        match self.chunk_size {
            0 => DEFAULT_CHUNK_SIZE,
            size => size.min(MAX_CHUNK_SIZE)
        }
    }

    pub fn boundary(&self) -> &BoundaryStrategy {
        &self.boundary
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            charset: DEFAULT_CHARSET.to_owned(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            boundary: BoundaryStrategy::default(),
        }
    }
}
