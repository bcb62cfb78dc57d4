//! Error types for Strata decoding and packet sources

use thiserror::Error;

/// Why a decode step failed.
///
/// Decoders return these; the packet engine never propagates them to its
/// caller but records them inside a [`DecodeFailure`](crate::layer::DecodeFailure)
/// layer instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not enough bytes to decode a layer
    #[error("short buffer decoding {layer}: expected {expected} bytes, got {actual}")]
    ShortBuffer {
        /// Name of the layer being decoded.
        layer: &'static str,
        /// The number of bytes needed.
        expected: usize,
        /// The number of bytes available.
        actual: usize,
    },

    /// A length field points outside of the available data
    #[error("bad length {length} in {layer}")]
    BadLength {
        /// Name of the layer being decoded.
        layer: &'static str,
        /// The offending length value.
        length: usize,
    },

    /// Any other protocol-level problem
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// The decoder panicked and the panic was contained
    #[error("decoder panicked: {0}")]
    Panicked(String),

    /// The decoder misused its packet builder
    #[error(transparent)]
    Builder(#[from] BuilderError),
}

/// Misuse of a [`PacketBuilder`](crate::decoder::PacketBuilder) by a decoder.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderError {
    /// `request_next` was given no decoder
    #[error("next decoder missing, probably an unsupported decode type")]
    MissingDecoder,

    /// `request_next` was called before any layer was appended
    #[error("next decoder requested, but no layers added yet")]
    NoLayers,
}

/// Errors reported by a [`PacketDataSource`](crate::source::PacketDataSource).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source has no more packets
    #[error("end of packet stream")]
    EndOfStream,

    /// IO error while reading packet data
    #[error("IO error: {0}")]
    Io(String),

    /// Source-specific failure
    #[error("packet source error: {0}")]
    Source(String),
}

impl SourceError {
    /// Check whether this is the end-of-stream sentinel
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, SourceError::EndOfStream)
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => SourceError::EndOfStream,
            _ => SourceError::Io(err.to_string()),
        }
    }
}
