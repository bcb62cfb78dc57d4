//! Streaming packet sources
//!
//! [`PacketSource`] pairs a raw [`PacketDataSource`] with a decoder. Packets
//! can be pulled one at a time with [`PacketSource::next_packet`] (errors
//! included), or pushed from a background thread through a rendezvous
//! channel with [`PacketSource::packets`].

use crate::capture::CaptureInfo;
use crate::decoder::Decoder;
use crate::error::SourceError;
use crate::options::DecodeOptions;
use crate::packet::Packet;
use bytes::Bytes;
use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Supplier of raw packet bytes, such as a live capture or a capture file.
pub trait PacketDataSource {
    /// Read the next packet.
    ///
    /// Returns [`SourceError::EndOfStream`] once the source is exhausted.
    fn read_packet_data(&mut self) -> Result<(Bytes, CaptureInfo), SourceError>;
}

impl<S: PacketDataSource + ?Sized> PacketDataSource for Box<S> {
    fn read_packet_data(&mut self) -> Result<(Bytes, CaptureInfo), SourceError> {
        (**self).read_packet_data()
    }
}

impl<S: PacketDataSource + ?Sized> PacketDataSource for &mut S {
    fn read_packet_data(&mut self) -> Result<(Bytes, CaptureInfo), SourceError> {
        (**self).read_packet_data()
    }
}

/// Decodes packets read from a [`PacketDataSource`]
pub struct PacketSource<S> {
    source: S,
    decoder: Arc<dyn Decoder>,
    /// Options used for every packet this source creates
    pub options: DecodeOptions,
}

impl<S: PacketDataSource> PacketSource<S> {
    /// Create a packet source decoding with default options
    pub fn new(source: S, decoder: Arc<dyn Decoder>) -> Self {
        Self {
            source,
            decoder,
            options: DecodeOptions::default(),
        }
    }

    /// Set the decode options
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Read and decode the next packet.
    ///
    /// Source errors, including end-of-stream, are returned as they are.
    pub fn next_packet(&mut self) -> Result<Packet, SourceError> {
        let (data, capture_info) = self.source.read_packet_data()?;
        let mut packet = Packet::new(data, self.decoder.clone(), self.options);
        packet.set_capture_info(capture_info);
        Ok(packet)
    }

    /// Give the underlying data source back
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: PacketDataSource + Send + 'static> PacketSource<S> {
    /// Decode packets on a background thread.
    ///
    /// Packets are handed over through a rendezvous channel, so the producer
    /// runs at the consumer's pace. End-of-stream closes the stream; other
    /// source errors are logged and skipped. Cancelling or dropping the
    /// returned [`PacketStream`] stops the producer at its next hand-off.
    pub fn packets(self) -> std::io::Result<PacketStream> {
        let (tx, rx) = bounded(0);
        let (cancel_tx, cancel_rx) = bounded(0);

        thread::Builder::new()
            .name("strata-packets".to_string())
            .spawn(move || self.produce(tx, cancel_rx))?;

        Ok(PacketStream {
            rx,
            cancel: Some(cancel_tx),
        })
    }

    fn produce(mut self, tx: Sender<Packet>, cancel: Receiver<()>) {
        loop {
            if !matches!(cancel.try_recv(), Err(TryRecvError::Empty)) {
                #[cfg(feature = "logging")]
                debug!("Packet stream cancelled");
                return;
            }

            let packet = match self.next_packet() {
                Ok(packet) => packet,
                Err(SourceError::EndOfStream) => {
                    #[cfg(feature = "logging")]
                    debug!("Packet source exhausted, closing stream");
                    return;
                }
                Err(_e) => {
                    #[cfg(feature = "logging")]
                    warn!("Discarding packet source error: {}", _e);
                    continue;
                }
            };

            select! {
                send(tx, packet) -> res => {
                    if res.is_err() {
                        #[cfg(feature = "logging")]
                        debug!("Packet stream consumer gone, stopping");
                        return;
                    }
                }
                recv(cancel) -> _ => {
                    #[cfg(feature = "logging")]
                    debug!("Packet stream cancelled");
                    return;
                }
            }
        }
    }
}

impl<S: PacketDataSource> Iterator for PacketSource<S> {
    type Item = Result<Packet, SourceError>;

    /// Pull packets until end-of-stream; other errors are yielded
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_packet() {
            Err(SourceError::EndOfStream) => None,
            other => Some(other),
        }
    }
}

/// Receiving end of [`PacketSource::packets`]
#[derive(Debug)]
pub struct PacketStream {
    rx: Receiver<Packet>,
    cancel: Option<Sender<()>>,
}

impl PacketStream {
    /// Block until the next packet arrives, or `None` once the stream closed
    pub fn recv(&self) -> Option<Packet> {
        self.rx.recv().ok()
    }

    /// Tell the producer to stop.
    ///
    /// A producer blocked inside the data source stops once that read
    /// returns.
    pub fn cancel(&mut self) {
        // Disconnecting the cancel channel wakes the producer's select
        self.cancel.take();
    }

    /// Check if the stream was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }

    /// The underlying channel receiver
    pub fn receiver(&self) -> &Receiver<Packet> {
        &self.rx
    }
}

impl Iterator for PacketStream {
    type Item = Packet;

    fn next(&mut self) -> Option<Packet> {
        self.recv()
    }
}

impl Drop for PacketStream {
    fn drop(&mut self) {
        self.cancel();
    }
}
