//! # Strata Core
//!
//! A generic engine for decoding layered binary network protocols into an
//! ordered sequence of typed layers.
//!
//! ## Modules
//!
//! - `layer`: Layer trait, layer kinds and classes, roles, failure/payload layers
//! - `decoder`: Decoder and PacketBuilder capabilities
//! - `packet`: The eager/lazy decoding engine
//! - `options`: Decode configuration
//! - `capture`: Capture metadata
//! - `source`: Pull and push packet streams over a raw data source
//! - `error`: Error types
//!
//! Decoder panics are contained by the engine, which relies on unwinding;
//! building with `panic = "abort"` turns a panicking decoder into a process
//! abort.
//!
//! Containment does not silence the panic hook: each contained panic is
//! still reported on stderr (with a backtrace under `RUST_BACKTRACE`). On a
//! stream of hostile input, install a hook that skips the packet stream
//! thread, which is named `strata-packets`:
//!
//! ```
//! use std::panic;
//! use strata_core::{decode_fn, DecodeOptions, Packet};
//!
//! let default_hook = panic::take_hook();
//! panic::set_hook(Box::new(move |info| {
//!     if std::thread::current().name() != Some("strata-packets") {
//!         default_hook(info);
//!     }
//! }));
//!
//! let boom = decode_fn(|_data, _builder| panic!("bad decoder"));
//! let mut packet = Packet::new(&b"abc"[..], boom, DecodeOptions::DEFAULT);
//! assert!(packet.error_layer().is_some());
//! ```

#![warn(missing_docs)]

pub mod capture;
pub mod decoder;
pub mod error;
pub mod layer;
pub mod options;
pub mod packet;
pub mod source;

// Re-export commonly used types
pub use capture::CaptureInfo;
pub use decoder::{decode_fn, DecodeFn, Decoder, PacketBuilder, PayloadDecoder};
pub use error::{BuilderError, DecodeError, SourceError};
pub use layer::{DecodeFailure, Layer, LayerClass, LayerRef, LayerSet, LayerType, Payload, Role};
pub use options::DecodeOptions;
pub use packet::Packet;
pub use source::{PacketDataSource, PacketSource, PacketStream};

/// Result type alias for decoders
pub type Result<T> = core::result::Result<T, DecodeError>;
