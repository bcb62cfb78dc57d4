//! Layers, layer kinds and packet roles

use crate::error::DecodeError;
use bytes::Bytes;
use core::any::Any;
use core::fmt;
use hashbrown::HashSet;
use std::sync::Arc;

/// Kind tag carried by every layer.
///
/// The set of kinds is open: any decoder crate can mint its own with
/// [`LayerType::new`]. Ids 0 and 1 are reserved by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerType {
    id: u32,
    name: &'static str,
}

impl LayerType {
    /// Layer appended by the engine when a decode step fails
    pub const DECODE_FAILURE: LayerType = LayerType::new(0, "DecodeFailure");

    /// Opaque application payload
    pub const PAYLOAD: LayerType = LayerType::new(1, "Payload");

    /// Create a new layer kind
    pub const fn new(id: u32, name: &'static str) -> Self {
        Self { id, name }
    }

    /// Numeric id of this kind
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Human readable name of this kind
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A set of layer kinds that can be searched for as a group.
pub trait LayerClass {
    /// Check whether `layer_type` belongs to this class
    fn contains(&self, layer_type: LayerType) -> bool;
}

impl LayerClass for LayerType {
    fn contains(&self, layer_type: LayerType) -> bool {
        *self == layer_type
    }
}

impl LayerClass for [LayerType] {
    fn contains(&self, layer_type: LayerType) -> bool {
        self.iter().any(|t| *t == layer_type)
    }
}

impl<const N: usize> LayerClass for [LayerType; N] {
    fn contains(&self, layer_type: LayerType) -> bool {
        self.iter().any(|t| *t == layer_type)
    }
}

/// Hash-backed layer class, for classes with many members
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSet {
    types: HashSet<LayerType>,
}

impl LayerSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a kind to the set
    pub fn insert(&mut self, layer_type: LayerType) -> bool {
        self.types.insert(layer_type)
    }

    /// Number of kinds in the set
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<LayerType> for LayerSet {
    fn from_iter<I: IntoIterator<Item = LayerType>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

impl LayerClass for LayerSet {
    fn contains(&self, layer_type: LayerType) -> bool {
        self.types.contains(&layer_type)
    }
}

/// Roles a layer can occupy within a packet.
///
/// Each role holds at most one layer; the first claim wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Link layer (Ethernet, 802.11, ...)
    Link,
    /// Network layer (IPv4, IPv6, ...)
    Network,
    /// Transport layer (TCP, UDP, ...)
    Transport,
    /// Application layer (DNS, HTTP, raw payload, ...)
    Application,
    /// Decoding stopped on an error
    Error,
}

impl Role {
    /// Number of distinct roles
    pub const COUNT: usize = 5;

    /// All roles in stack order
    pub const ALL: [Role; Role::COUNT] = [
        Role::Link,
        Role::Network,
        Role::Transport,
        Role::Application,
        Role::Error,
    ];

    pub(crate) const fn index(self) -> usize {
        match self {
            Role::Link => 0,
            Role::Network => 1,
            Role::Transport => 2,
            Role::Application => 3,
            Role::Error => 4,
        }
    }
}

/// Upcast helper behind `downcast_ref` on layers
#[doc(hidden)]
pub trait AsAny {
    /// View as `Any`
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One decoded unit of a protocol stack.
///
/// `contents` is the part of the packet this layer decoded (headers),
/// `payload` is what remains for the next decoder in the chain.
pub trait Layer: AsAny + fmt::Debug + Send + Sync {
    /// Kind tag of this layer
    fn layer_type(&self) -> LayerType;

    /// Bytes making up this layer
    fn contents(&self) -> &[u8];

    /// Bytes left over for the next layer
    fn payload(&self) -> &[u8];

    /// Failure cause, for layers representing a decode error
    fn error(&self) -> Option<&DecodeError> {
        None
    }
}

impl dyn Layer {
    /// Downcast to the concrete layer struct
    pub fn downcast_ref<T: Layer + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Check the concrete layer struct
    pub fn is<T: Layer + 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Shared handle to a decoded layer
pub type LayerRef = Arc<dyn Layer>;

/// Terminal layer recording a failed decode step.
///
/// Holds the cause and the bytes that could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeFailure {
    data: Bytes,
    cause: DecodeError,
}

impl DecodeFailure {
    /// Create a failure layer over the undigested `data`
    pub fn new(data: Bytes, cause: DecodeError) -> Self {
        Self { data, cause }
    }

    /// Why decoding stopped
    pub fn cause(&self) -> &DecodeError {
        &self.cause
    }

    /// Undecoded remainder
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl Layer for DecodeFailure {
    fn layer_type(&self) -> LayerType {
        LayerType::DECODE_FAILURE
    }

    fn contents(&self) -> &[u8] {
        &self.data
    }

    fn payload(&self) -> &[u8] {
        &[]
    }

    fn error(&self) -> Option<&DecodeError> {
        Some(&self.cause)
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "packet decoding error: {} ({} undecoded bytes)",
            self.cause,
            self.data.len()
        )
    }
}

/// Opaque application data that no further decoder understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    data: Bytes,
}

impl Payload {
    /// Wrap `data` as a payload layer
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// The payload bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl Layer for Payload {
    fn layer_type(&self) -> LayerType {
        LayerType::PAYLOAD
    }

    fn contents(&self) -> &[u8] {
        &self.data
    }

    fn payload(&self) -> &[u8] {
        &[]
    }
}
