//! Decoder and packet builder capabilities
//!
//! A [`Decoder`] turns a byte buffer into one or more layers by calling
//! into the [`PacketBuilder`] it is handed. Decoders chain by asking the
//! builder to run another decoder on the payload of the last layer.

use crate::error::{BuilderError, DecodeError};
use crate::layer::{LayerRef, Payload, Role};
use bytes::Bytes;
use core::fmt;
use std::sync::Arc;

/// Mutation surface handed to a [`Decoder`] during a single decode step.
///
/// Decoders must not hold on to the builder past the call.
pub trait PacketBuilder {
    /// Append a decoded layer to the packet
    fn append_layer(&mut self, layer: LayerRef);

    /// Register `layer` as the occupant of `role`.
    ///
    /// The first claim for a role wins; later claims are ignored.
    fn claim_role(&mut self, role: Role, layer: LayerRef);

    /// Queue `next` to decode the payload of the most recently appended layer.
    ///
    /// `None` is accepted so decoders can pass the result of a registry
    /// lookup straight through; it is reported as
    /// [`BuilderError::MissingDecoder`].
    fn request_next(&mut self, next: Option<Arc<dyn Decoder>>) -> Result<(), BuilderError>;
}

/// Parses a buffer into layers.
///
/// Decoders are shared between packets and threads, so any state they keep
/// must be immutable or internally synchronized.
pub trait Decoder: Send + Sync {
    /// Decode `data`, reporting layers to `builder`
    fn decode(&self, data: &Bytes, builder: &mut dyn PacketBuilder) -> Result<(), DecodeError>;
}

impl<D: Decoder + ?Sized> Decoder for Arc<D> {
    fn decode(&self, data: &Bytes, builder: &mut dyn PacketBuilder) -> Result<(), DecodeError> {
        (**self).decode(data, builder)
    }
}

/// Adapter turning a closure into a [`Decoder`]
#[derive(Clone)]
pub struct DecodeFn<F>(pub F);

impl<F> Decoder for DecodeFn<F>
where
    F: Fn(&Bytes, &mut dyn PacketBuilder) -> Result<(), DecodeError> + Send + Sync,
{
    fn decode(&self, data: &Bytes, builder: &mut dyn PacketBuilder) -> Result<(), DecodeError> {
        (self.0)(data, builder)
    }
}

impl<F> fmt::Debug for DecodeFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecodeFn")
    }
}

/// Wrap a closure as a shareable decoder
pub fn decode_fn<F>(f: F) -> Arc<dyn Decoder>
where
    F: Fn(&Bytes, &mut dyn PacketBuilder) -> Result<(), DecodeError> + Send + Sync + 'static,
{
    Arc::new(DecodeFn(f))
}

/// Decodes everything it is given as a single [`Payload`] layer.
///
/// Claims the application role and ends the chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadDecoder;

impl Decoder for PayloadDecoder {
    fn decode(&self, data: &Bytes, builder: &mut dyn PacketBuilder) -> Result<(), DecodeError> {
        let layer: LayerRef = Arc::new(Payload::new(data.clone()));
        builder.append_layer(layer.clone());
        builder.claim_role(Role::Application, layer);
        Ok(())
    }
}
