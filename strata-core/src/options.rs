//! Decode configuration

use serde::{Deserialize, Serialize};

/// How a packet should be decoded.
///
/// Fixed at packet construction. The default is eager decoding over a
/// private copy of the input, the safest and slowest combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Decode only as many layers as each accessor call needs.
    ///
    /// Every accessor on a lazy packet may mutate it, so a lazy packet must
    /// not be shared between threads until it is fully decoded.
    pub lazy: bool,

    /// Keep the caller's buffer instead of copying it.
    ///
    /// Saves an allocation per packet; layer payloads then share memory with
    /// the buffer that was passed in.
    pub no_copy: bool,
}

impl DecodeOptions {
    /// Eager decoding over a private copy
    pub const DEFAULT: DecodeOptions = DecodeOptions {
        lazy: false,
        no_copy: false,
    };

    /// Lazy decoding over a private copy
    pub const LAZY: DecodeOptions = DecodeOptions {
        lazy: true,
        no_copy: false,
    };

    /// Eager decoding over the caller's buffer
    pub const NO_COPY: DecodeOptions = DecodeOptions {
        lazy: false,
        no_copy: true,
    };

    /// Set lazy decoding
    pub const fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Set zero-copy buffer handling
    pub const fn with_no_copy(mut self, no_copy: bool) -> Self {
        self.no_copy = no_copy;
        self
    }
}
