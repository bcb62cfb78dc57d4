//! Fuzzing entry points for strata-core
//!
//! Each function takes arbitrary bytes and must never panic. They are
//! meant to be wired into a cargo-fuzz target or driven from tests.

use bytes::Bytes;
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use strata_core::{
    CaptureInfo, DecodeError, DecodeOptions, Decoder, Layer, LayerRef, LayerType, Packet,
    PacketBuilder, PacketDataSource, PacketSource, PayloadDecoder, Role, SourceError,
};

const SEGMENT: LayerType = LayerType::new(0xF000, "Segment");

#[derive(Debug)]
struct Segment {
    contents: Bytes,
    payload: Bytes,
}

impl Layer for Segment {
    fn layer_type(&self) -> LayerType {
        SEGMENT
    }

    fn contents(&self) -> &[u8] {
        &self.contents
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Tag/length decoder whose tag byte selects a role or a misbehavior.
///
/// `0xEE` hands the same bytes to a payload decoder without appending a
/// layer, `0xEF` requests `None`, `0xF0` panics.
struct Tlv;

impl Decoder for Tlv {
    fn decode(&self, data: &Bytes, builder: &mut dyn PacketBuilder) -> Result<(), DecodeError> {
        if data.len() < 2 {
            return Err(DecodeError::ShortBuffer {
                layer: "Segment",
                expected: 2,
                actual: data.len(),
            });
        }
        let tag = data[0];
        let len = data[1] as usize;

        match tag {
            0xEE => {
                builder.request_next(Some(Arc::new(PayloadDecoder)))?;
                return Ok(());
            }
            0xEF => {
                builder.request_next(None)?;
                return Ok(());
            }
            0xF0 => panic!("fuzz panic tag"),
            _ => {}
        }

        if 2 + len > data.len() {
            return Err(DecodeError::BadLength {
                layer: "Segment",
                length: len,
            });
        }
        let layer: LayerRef = Arc::new(Segment {
            contents: data.slice(..2 + len),
            payload: data.slice(2 + len..),
        });
        builder.append_layer(layer.clone());
        builder.claim_role(Role::ALL[tag as usize % Role::COUNT], layer);
        builder.request_next(Some(Arc::new(Tlv)))?;
        Ok(())
    }
}

/// Decode one packet eagerly and lazily; the two must agree
pub fn fuzz_packet(data: &[u8]) {
    let input = Bytes::copy_from_slice(data);

    let mut eager = Packet::new(input.clone(), Arc::new(Tlv), DecodeOptions::NO_COPY);
    let mut lazy = Packet::new(input, Arc::new(Tlv), DecodeOptions::LAZY);

    // Touch a role first so the lazy packet is drained in two phases
    let _ = lazy.transport_layer();

    let eager_kinds: Vec<_> = eager.layers().iter().map(|l| l.layer_type()).collect();
    let lazy_kinds: Vec<_> = lazy.layers().iter().map(|l| l.layer_type()).collect();
    assert_eq!(eager_kinds, lazy_kinds);
    assert_eq!(eager.error_layer().is_some(), lazy.error_layer().is_some());
}

/// Splits input into frames on a one-byte length prefix
struct Frames {
    data: Bytes,
}

impl PacketDataSource for Frames {
    fn read_packet_data(&mut self) -> Result<(Bytes, CaptureInfo), SourceError> {
        if self.data.is_empty() {
            return Err(SourceError::EndOfStream);
        }
        let len = (self.data[0] as usize).min(self.data.len() - 1);
        let frame = self.data.slice(1..1 + len);
        self.data = self.data.slice(1 + len..);
        let ci = CaptureInfo::new(UNIX_EPOCH, frame.len(), frame.len());
        Ok((frame, ci))
    }
}

/// Drive both source APIs over frames cut from the input
pub fn fuzz_stream(data: &[u8]) {
    let data = Bytes::copy_from_slice(data);

    let pulled = PacketSource::new(Frames { data: data.clone() }, Arc::new(Tlv))
        .filter_map(Result::ok)
        .count();

    if let Ok(stream) = PacketSource::new(Frames { data }, Arc::new(Tlv)).packets() {
        assert_eq!(stream.count(), pulled);
    }
}
