//! Example decoding a small synthetic capture with pull and push sources

use bytes::Bytes;
use std::sync::Arc;
use std::time::SystemTime;
use strata_core::{
    CaptureInfo, DecodeError, DecodeOptions, Decoder, Layer, LayerRef, LayerType,
    PacketBuilder, PacketDataSource, PacketSource, PayloadDecoder, Role, SourceError,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const RECORD: LayerType = LayerType::new(500, "Record");

/// A record with a one-byte length header
#[derive(Debug)]
struct Record {
    contents: Bytes,
    payload: Bytes,
}

impl Layer for Record {
    fn layer_type(&self) -> LayerType {
        RECORD
    }

    fn contents(&self) -> &[u8] {
        &self.contents
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}

struct RecordDecoder;

impl Decoder for RecordDecoder {
    fn decode(&self, data: &Bytes, builder: &mut dyn PacketBuilder) -> Result<(), DecodeError> {
        let len = data[0] as usize;
        if 1 + len > data.len() {
            return Err(DecodeError::BadLength {
                layer: "Record",
                length: len,
            });
        }
        let layer: LayerRef = Arc::new(Record {
            contents: data.slice(..1),
            payload: data.slice(1..1 + len),
        });
        builder.append_layer(layer.clone());
        builder.claim_role(Role::Link, layer);
        builder.request_next(Some(Arc::new(PayloadDecoder)))?;
        Ok(())
    }
}

/// In-memory capture: a list of frames, then end-of-stream
struct MemoryCapture {
    frames: Vec<&'static [u8]>,
}

impl PacketDataSource for MemoryCapture {
    fn read_packet_data(&mut self) -> Result<(Bytes, CaptureInfo), SourceError> {
        if self.frames.is_empty() {
            return Err(SourceError::EndOfStream);
        }
        let frame = self.frames.remove(0);
        let ci = CaptureInfo::new(SystemTime::now(), frame.len(), frame.len());
        Ok((Bytes::from_static(frame), ci))
    }
}

fn capture() -> MemoryCapture {
    MemoryCapture {
        frames: vec![&b"\x05hello"[..], &b"\x0ctruncated"[..], &b"\x03abc"[..]],
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::new("debug"))
        .init();

    println!("Strata Stream Decoding Example\n");

    // Pull: the caller drives the loop and sees every source error
    println!("Pull API:");
    let mut source = PacketSource::new(capture(), Arc::new(RecordDecoder));
    loop {
        let mut packet = match source.next_packet() {
            Ok(packet) => packet,
            Err(SourceError::EndOfStream) => break,
            Err(e) => return Err(e.into()),
        };

        let failure = packet.error_layer().and_then(|l| l.error().cloned());
        if let Some(cause) = failure {
            println!("  partial decode: {}", cause);
            continue;
        }
        if let Some(app) = packet.application_layer() {
            println!("  payload: {}", String::from_utf8_lossy(app.contents()));
        }
    }

    // Push: a background thread feeds a rendezvous channel
    println!("\nPush API (lazy):");
    let stream = PacketSource::new(capture(), Arc::new(RecordDecoder))
        .with_options(DecodeOptions::LAZY)
        .packets()?;
    for mut packet in stream {
        print!("{}", packet.render());
        println!("  captured {} bytes", packet.capture_info().capture_length);
    }

    Ok(())
}
