//! Packet decoding engine
//!
//! A [`Packet`] owns its raw buffer and the layers decoded from it. Decoding
//! runs as a chain of steps: each step hands the payload of the last layer
//! (or the whole buffer, before any layer exists) to the pending decoder,
//! which may append layers, claim roles and queue the next decoder.
//!
//! Eager packets run every step inside [`Packet::new`]. Lazy packets run
//! steps from the accessors, only as far as each call needs. A failing step
//! never escapes: it becomes a terminal [`DecodeFailure`] layer.

use crate::capture::CaptureInfo;
use crate::decoder::{Decoder, PacketBuilder};
use crate::error::{BuilderError, DecodeError};
use crate::layer::{DecodeFailure, LayerClass, LayerRef, LayerType, Role};
use crate::options::DecodeOptions;
use bytes::Bytes;
use core::any::Any;
use core::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Room reserved for the layers of a typical packet
const INITIAL_LAYERS: usize = 6;

/// When decode steps run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// All steps run at construction
    Eager,
    /// Steps run on demand from the accessors
    Lazy,
}

/// A decoded (or decoding) packet.
///
/// Accessors that may need more layers take `&mut self`: on a lazy packet
/// they run decode steps. On an eager packet they never decode, and the
/// `&self` views ([`decoded_layers`](Packet::decoded_layers),
/// [`claimed`](Packet::claimed)) already see the complete result, so an
/// eager packet can be shared across threads behind an `Arc`.
pub struct Packet {
    data: Bytes,
    layers: Vec<LayerRef>,
    roles: [Option<LayerRef>; Role::COUNT],
    next: Option<Arc<dyn Decoder>>,
    capture_info: CaptureInfo,
    strategy: Strategy,
}

impl Packet {
    /// Create a packet from `data`, decoding it starting with `decoder`.
    ///
    /// Unless `options.no_copy` is set the packet works on its own copy of
    /// `data`. With `options.lazy` no decoding happens here.
    pub fn new(data: impl Into<Bytes>, decoder: Arc<dyn Decoder>, options: DecodeOptions) -> Self {
        let data = data.into();
        let data = if options.no_copy {
            data
        } else {
            Bytes::copy_from_slice(&data)
        };

        let strategy = if options.lazy {
            Strategy::Lazy
        } else {
            Strategy::Eager
        };

        let mut packet = Packet {
            data,
            layers: Vec::with_capacity(INITIAL_LAYERS),
            roles: Default::default(),
            next: Some(decoder),
            capture_info: CaptureInfo::default(),
            strategy,
        };

        if strategy == Strategy::Eager {
            packet.decode_all();
        }

        packet
    }

    /// Raw packet data
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Capture metadata
    pub fn capture_info(&self) -> &CaptureInfo {
        &self.capture_info
    }

    /// Mutable capture metadata
    pub fn capture_info_mut(&mut self) -> &mut CaptureInfo {
        &mut self.capture_info
    }

    /// Replace the capture metadata
    pub fn set_capture_info(&mut self, capture_info: CaptureInfo) {
        self.capture_info = capture_info;
    }

    /// Check if this packet decodes on demand
    pub fn is_lazy(&self) -> bool {
        self.strategy == Strategy::Lazy
    }

    /// Check if no decode step is pending
    pub fn is_decoded(&self) -> bool {
        self.next.is_none()
    }

    /// Run every pending decode step
    pub fn decode_all(&mut self) {
        while self.next.is_some() {
            self.step();
        }
    }

    /// Decode the rest of the packet and render every layer.
    ///
    /// The [`Display`](fmt::Display) impl only shows layers decoded so far,
    /// which on a lazy packet may be none.
    pub fn render(&mut self) -> String {
        self.decode_all();
        self.to_string()
    }

    /// All layers, decoding the rest of the packet if needed
    pub fn layers(&mut self) -> &[LayerRef] {
        self.decode_all();
        &self.layers
    }

    /// Layers decoded so far, without decoding anything
    pub fn decoded_layers(&self) -> &[LayerRef] {
        &self.layers
    }

    /// First layer of kind `layer_type` decoded so far, without decoding anything
    pub fn decoded_layer(&self, layer_type: LayerType) -> Option<&LayerRef> {
        self.decoded_layer_class(&layer_type)
    }

    /// First layer decoded so far whose kind belongs to `class`
    pub fn decoded_layer_class<C: LayerClass + ?Sized>(&self, class: &C) -> Option<&LayerRef> {
        self.layers.iter().find(|l| class.contains(l.layer_type()))
    }

    /// First layer of kind `layer_type`
    pub fn layer(&mut self, layer_type: LayerType) -> Option<&LayerRef> {
        self.layer_class(&layer_type)
    }

    /// First layer whose kind belongs to `class`
    pub fn layer_class<C: LayerClass + ?Sized>(&mut self, class: &C) -> Option<&LayerRef> {
        let mut scanned = 0;
        let found = loop {
            // Only the layers added by the last step need looking at
            let hit = self.layers[scanned..]
                .iter()
                .position(|l| class.contains(l.layer_type()));
            if let Some(offset) = hit {
                break Some(scanned + offset);
            }
            if self.next.is_none() {
                break None;
            }
            scanned = self.layers.len();
            self.step();
        };
        found.map(|idx| &self.layers[idx])
    }

    /// Layer occupying `role`, decoding until it is claimed or the packet ends
    pub fn role_layer(&mut self, role: Role) -> Option<&LayerRef> {
        while self.roles[role.index()].is_none() && self.next.is_some() {
            self.step();
        }
        self.roles[role.index()].as_ref()
    }

    /// Layer occupying `role` right now, without decoding anything
    pub fn claimed(&self, role: Role) -> Option<&LayerRef> {
        self.roles[role.index()].as_ref()
    }

    /// First link layer
    pub fn link_layer(&mut self) -> Option<&LayerRef> {
        self.role_layer(Role::Link)
    }

    /// First network layer
    pub fn network_layer(&mut self) -> Option<&LayerRef> {
        self.role_layer(Role::Network)
    }

    /// First transport layer
    pub fn transport_layer(&mut self) -> Option<&LayerRef> {
        self.role_layer(Role::Transport)
    }

    /// First application layer
    pub fn application_layer(&mut self) -> Option<&LayerRef> {
        self.role_layer(Role::Application)
    }

    /// The error layer, if decoding stopped on a failure.
    ///
    /// `None` on a fully decoded packet means every step succeeded.
    pub fn error_layer(&mut self) -> Option<&LayerRef> {
        self.role_layer(Role::Error)
    }

    /// Run the pending decode step, if any
    fn step(&mut self) {
        let Some(decoder) = self.next.take() else {
            return;
        };

        let data = self.next_data();
        if data.is_empty() {
            // Nothing left to decode; the packet is complete
            return;
        }

        #[cfg(feature = "logging")]
        trace!(
            "Decode step {} over {} bytes",
            self.layers.len() + 1,
            data.len()
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut builder = StepBuilder { packet: &mut *self };
            decoder.decode(&data, &mut builder)
        }));

        let cause = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(payload) => DecodeError::Panicked(panic_message(&*payload)),
        };
        self.fail(cause);
    }

    /// Bytes the next decoder would be handed
    fn next_data(&self) -> Bytes {
        match self.layers.last() {
            Some(last) => self.share(last.payload()),
            None => self.data.clone(),
        }
    }

    /// Turn a layer's payload back into a `Bytes` without copying when it
    /// points into the packet buffer
    fn share(&self, bytes: &[u8]) -> Bytes {
        if bytes.is_empty() {
            return Bytes::new();
        }

        let base = self.data.as_ptr() as usize;
        let start = bytes.as_ptr() as usize;
        if start >= base && start + bytes.len() <= base + self.data.len() {
            self.data.slice_ref(bytes)
        } else {
            Bytes::copy_from_slice(bytes)
        }
    }

    /// Record a failed step and stop decoding
    fn fail(&mut self, cause: DecodeError) {
        #[cfg(feature = "logging")]
        debug!(
            "Decoding stopped after {} layers: {}",
            self.layers.len(),
            cause
        );

        let failure: LayerRef = Arc::new(DecodeFailure::new(self.next_data(), cause));
        self.layers.push(failure.clone());
        self.claim(Role::Error, failure);
        self.next = None;
    }

    fn claim(&mut self, role: Role, layer: LayerRef) {
        let slot = &mut self.roles[role.index()];
        if slot.is_none() {
            *slot = Some(layer);
        }
    }
}

/// Builder handle given to a decoder for the duration of one step
struct StepBuilder<'a> {
    packet: &'a mut Packet,
}

impl PacketBuilder for StepBuilder<'_> {
    fn append_layer(&mut self, layer: LayerRef) {
        self.packet.layers.push(layer);
    }

    fn claim_role(&mut self, role: Role, layer: LayerRef) {
        self.packet.claim(role, layer);
    }

    fn request_next(&mut self, next: Option<Arc<dyn Decoder>>) -> Result<(), BuilderError> {
        let next = next.ok_or(BuilderError::MissingDecoder)?;
        if self.packet.layers.is_empty() {
            return Err(BuilderError::NoLayers);
        }
        self.packet.next = Some(next);
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl fmt::Display for Packet {
    /// Renders the layers decoded so far; see [`Packet::render`]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, layer) in self.layers.iter().enumerate() {
            writeln!(f, "--- Layer {}: {} ---", i + 1, layer.layer_type())?;
            writeln!(f, "{:?}", layer)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("len", &self.data.len())
            .field("layers", &self.layers)
            .field("lazy", &self.is_lazy())
            .field("decoded", &self.is_decoded())
            .field("capture_info", &self.capture_info)
            .finish()
    }
}
