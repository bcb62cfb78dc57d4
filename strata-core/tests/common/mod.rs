//! Decoders shared by the integration tests

#![allow(dead_code)]

use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use strata_core::{
    CaptureInfo, DecodeError, Decoder, Layer, LayerRef, LayerType, Packet, PacketBuilder,
    PacketDataSource, PayloadDecoder, Role, SourceError,
};

pub const LINK: LayerType = LayerType::new(1000, "Link");
pub const NETWORK: LayerType = LayerType::new(1001, "Network");
pub const TRANSPORT: LayerType = LayerType::new(1002, "Transport");
pub const TUNNEL: LayerType = LayerType::new(1003, "Tunnel");

/// Generic header + payload layer
#[derive(Debug)]
pub struct Chunk {
    pub kind: LayerType,
    pub contents: Bytes,
    pub payload: Bytes,
}

impl Layer for Chunk {
    fn layer_type(&self) -> LayerType {
        self.kind
    }

    fn contents(&self) -> &[u8] {
        &self.contents
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Decodes a fixed-size header, optionally claiming a role and chaining on
pub struct Fixed {
    kind: LayerType,
    len: usize,
    role: Option<Role>,
    next: Option<Arc<dyn Decoder>>,
}

impl Fixed {
    pub fn new(kind: LayerType, len: usize) -> Self {
        Self {
            kind,
            len,
            role: None,
            next: None,
        }
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn then(mut self, next: Arc<dyn Decoder>) -> Self {
        self.next = Some(next);
        self
    }

    pub fn shared(self) -> Arc<dyn Decoder> {
        Arc::new(self)
    }
}

impl Decoder for Fixed {
    fn decode(&self, data: &Bytes, builder: &mut dyn PacketBuilder) -> Result<(), DecodeError> {
        if data.len() < self.len {
            return Err(DecodeError::ShortBuffer {
                layer: self.kind.name(),
                expected: self.len,
                actual: data.len(),
            });
        }

        let layer: LayerRef = Arc::new(Chunk {
            kind: self.kind,
            contents: data.slice(..self.len),
            payload: data.slice(self.len..),
        });
        builder.append_layer(layer.clone());
        if let Some(role) = self.role {
            builder.claim_role(role, layer);
        }
        if let Some(next) = &self.next {
            builder.request_next(Some(next.clone()))?;
        }
        Ok(())
    }
}

/// Always fails with the given cause, without appending anything
pub struct Failing(pub DecodeError);

impl Decoder for Failing {
    fn decode(&self, _data: &Bytes, _builder: &mut dyn PacketBuilder) -> Result<(), DecodeError> {
        Err(self.0.clone())
    }
}

/// Link(4) -> Network(2) -> Transport(2) -> Payload
pub fn standard_chain() -> Arc<dyn Decoder> {
    let transport = Fixed::new(TRANSPORT, 2)
        .role(Role::Transport)
        .then(Arc::new(PayloadDecoder))
        .shared();
    let network = Fixed::new(NETWORK, 2)
        .role(Role::Network)
        .then(transport)
        .shared();
    Fixed::new(LINK, 4).role(Role::Link).then(network).shared()
}

/// Self-chaining decoder for arbitrary input.
///
/// The first byte is a header length `n`; the layer spans `1 + n` bytes.
/// `0xFF` as the length byte makes the decoder panic.
pub struct LengthPrefixed;

impl LengthPrefixed {
    const KINDS: [(LayerType, Role); 3] = [
        (LINK, Role::Link),
        (NETWORK, Role::Network),
        (TRANSPORT, Role::Transport),
    ];
}

impl Decoder for LengthPrefixed {
    fn decode(&self, data: &Bytes, builder: &mut dyn PacketBuilder) -> Result<(), DecodeError> {
        let n = data[0] as usize;
        if n == 0xFF {
            panic!("reserved length byte");
        }
        if 1 + n > data.len() {
            return Err(DecodeError::BadLength {
                layer: "LengthPrefixed",
                length: n,
            });
        }

        let (kind, role) = Self::KINDS[n % 3];
        let layer: LayerRef = Arc::new(Chunk {
            kind,
            contents: data.slice(..1 + n),
            payload: data.slice(1 + n..),
        });
        builder.append_layer(layer.clone());
        builder.claim_role(role, layer);
        builder.request_next(Some(Arc::new(LengthPrefixed)))?;
        Ok(())
    }
}

/// Comparable view of a layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    pub kind: LayerType,
    pub contents: Vec<u8>,
    pub payload: Vec<u8>,
    pub error: Option<DecodeError>,
}

impl LayerSummary {
    pub fn of(layer: &LayerRef) -> Self {
        Self {
            kind: layer.layer_type(),
            contents: layer.contents().to_vec(),
            payload: layer.payload().to_vec(),
            error: layer.error().cloned(),
        }
    }
}

/// Comparable view of a whole packet, draining it first
#[derive(Debug, Clone, PartialEq)]
pub struct PacketSummary {
    pub layers: Vec<LayerSummary>,
    pub roles: Vec<Option<LayerSummary>>,
}

pub fn summarize(packet: &mut Packet) -> PacketSummary {
    let layers = packet.layers().iter().map(LayerSummary::of).collect();
    let roles = Role::ALL
        .iter()
        .map(|role| packet.role_layer(*role).map(LayerSummary::of))
        .collect();
    PacketSummary { layers, roles }
}

/// Replays canned reads, then reports end-of-stream
pub struct Replay {
    reads: VecDeque<Result<Bytes, SourceError>>,
}

impl Replay {
    pub fn new(reads: Vec<Result<Vec<u8>, SourceError>>) -> Self {
        Self {
            reads: reads.into_iter().map(|r| r.map(Bytes::from)).collect(),
        }
    }

    pub fn packets(count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|i| Ok(format!("\x01\x02\x03\x04\x05\x06\x07\x08packet {}", i).into_bytes()))
                .collect(),
        )
    }
}

impl PacketDataSource for Replay {
    fn read_packet_data(&mut self) -> Result<(Bytes, CaptureInfo), SourceError> {
        let data = self
            .reads
            .pop_front()
            .unwrap_or(Err(SourceError::EndOfStream))?;
        let ts = UNIX_EPOCH + Duration::from_millis(1_700_000_000_000);
        let ci = CaptureInfo::new(ts, data.len(), data.len() + 4);
        Ok((data, ci))
    }
}
