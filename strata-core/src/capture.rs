//! Capture metadata

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// How a packet was captured.
///
/// Filled in by whatever supplied the raw bytes; the decode engine never
/// sets it. When `populated` is false the other fields carry no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureInfo {
    /// Whether the remaining fields hold real capture data
    pub populated: bool,

    /// When the packet was captured
    pub timestamp: SystemTime,

    /// Number of bytes actually captured
    pub capture_length: usize,

    /// Length of the packet on the wire, possibly larger than captured
    pub original_length: usize,
}

impl CaptureInfo {
    /// Create populated capture metadata
    pub fn new(timestamp: SystemTime, capture_length: usize, original_length: usize) -> Self {
        Self {
            populated: true,
            timestamp,
            capture_length,
            original_length,
        }
    }

    /// Check if the capture was truncated by a snap length
    pub fn is_truncated(&self) -> bool {
        self.populated && self.capture_length < self.original_length
    }
}

impl Default for CaptureInfo {
    fn default() -> Self {
        Self {
            populated: false,
            timestamp: UNIX_EPOCH,
            capture_length: 0,
            original_length: 0,
        }
    }
}
