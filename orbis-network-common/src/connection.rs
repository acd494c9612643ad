use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::trace;
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, BufWriter},
    net::TcpStream,
};

use crate::Packet;

const FRAME_HEADER_LENGTH: usize = 4;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection lost")]
    ConnectionLost,

    #[error("failed to decode frame header")]
    DecodeHeaderFailed,

    #[error("failed to decode frame body")]
    DecodeBodyFailed,
}

/// Session-layer framing and crypto. Key negotiation happens upstream of this
/// crate; the channel core only ever sees validated frames.
pub trait PacketCodec {
    /// Decodes the 4-byte frame header in place, returning the body length.
    /// Zero marks an invalid header.
    fn decode_frame_header(&self, buffer: &mut BytesMut) -> usize;

    /// Decodes a frame body in place. False marks a tampered frame.
    fn decode_frame_body(&self, buffer: &mut BytesMut) -> bool;

    /// Encodes a complete outgoing frame (header plus body) in place.
    fn encode_frame(&self, buffer: &mut BytesMut);
}

/// Plain length-prefixed framing, used until the external session layer takes
/// over and for loopback tooling.
pub struct PassthroughCodec;

impl PacketCodec for PassthroughCodec {
    fn decode_frame_header(&self, buffer: &mut BytesMut) -> usize {
        let length = u16::from_le_bytes([buffer[0], buffer[1]]) as usize;
        if length < 2 {
            return 0;
        }
        length
    }

    fn decode_frame_body(&self, _buffer: &mut BytesMut) -> bool {
        true
    }

    fn encode_frame(&self, _buffer: &mut BytesMut) {}
}

pub struct Connection<'a> {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
    packet_codec: &'a (dyn PacketCodec + Send + Sync),
}

impl<'a> Connection<'a> {
    pub fn new(socket: TcpStream, packet_codec: &'a (dyn PacketCodec + Send + Sync)) -> Self {
        Self {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(4 * 1024),
            packet_codec,
        }
    }

    pub async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }

    pub async fn read_packet(&mut self) -> Result<Packet, anyhow::Error> {
        let mut read_length = FRAME_HEADER_LENGTH;
        let mut have_read_header = false;

        loop {
            while self.buffer.len() < read_length {
                match self.stream.read_buf(&mut self.buffer).await {
                    Ok(0) | Err(_) => {
                        return Err(ConnectionError::ConnectionLost.into());
                    }
                    Ok(_) => {}
                }
            }

            if !have_read_header {
                let body_length = self.packet_codec.decode_frame_header(&mut self.buffer);
                if body_length == 0 {
                    return Err(ConnectionError::DecodeHeaderFailed.into());
                }
                self.buffer.advance(FRAME_HEADER_LENGTH);
                read_length = body_length;
                have_read_header = true;
            } else {
                let mut body = self.buffer.split_to(read_length);
                if !self.packet_codec.decode_frame_body(&mut body) {
                    return Err(ConnectionError::DecodeBodyFailed.into());
                }

                let command = body.get_u16_le();
                let data: Bytes = body.freeze();

                trace!(target: "packets", "RECV [{:04X}] {:02x?}", command, &data[..]);
                return Ok(Packet { command, data });
            }
        }
    }

    pub async fn write_packet(&mut self, packet: Packet) -> Result<(), anyhow::Error> {
        trace!(target: "packets", "SEND [{:04X}] {:02x?}", packet.command, &packet.data[..]);

        let body_length = packet.data.len() + 2;
        let mut buffer = BytesMut::with_capacity(FRAME_HEADER_LENGTH + body_length);
        buffer.put_u16_le(body_length as u16);
        buffer.put_u16_le(0);
        buffer.put_u16_le(packet.command);
        buffer.put(packet.data);
        self.packet_codec.encode_frame(&mut buffer);

        self.stream
            .write_all(&buffer)
            .await
            .map_err(|_| ConnectionError::ConnectionLost)?;

        self.stream
            .flush()
            .await
            .map_err(|_| ConnectionError::ConnectionLost)?;

        Ok(())
    }
}
