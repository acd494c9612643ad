use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use std::str;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("unexpected end of packet")]
    UnexpectedEof,

    #[error("invalid packet")]
    InvalidPacket,
}

/// A single protocol message: the 2-byte opcode plus its payload. The opcode
/// is emitted ahead of the payload when the packet is framed for the wire.
pub struct Packet {
    pub command: u16,
    pub data: Bytes,
}

impl Packet {
    pub fn with_data(command: u16, data: BytesMut) -> Packet {
        Packet {
            command,
            data: data.freeze(),
        }
    }

    /// Full wire body: opcode (little-endian) followed by the payload.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.data.len());
        bytes.extend_from_slice(&self.command.to_le_bytes());
        bytes.extend_from_slice(&self.data);
        bytes
    }
}

impl std::fmt::Debug for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packet")
            .field("command", &format_args!("{:04X}", &self.command))
            .field("data", &format_args!("{:02x?}", self.data))
            .finish()
    }
}

pub struct PacketReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> From<&'a Packet> for PacketReader<'a> {
    fn from(packet: &'a Packet) -> Self {
        Self {
            cursor: Cursor::new(&packet.data[..]),
        }
    }
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    pub fn read_i8(&mut self) -> Result<i8, PacketError> {
        if self.cursor.remaining() < 1 {
            Err(PacketError::UnexpectedEof)
        } else {
            Ok(self.cursor.get_i8())
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, PacketError> {
        if self.cursor.remaining() < 1 {
            Err(PacketError::UnexpectedEof)
        } else {
            Ok(self.cursor.get_u8())
        }
    }

    pub fn read_bool(&mut self) -> Result<bool, PacketError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i16(&mut self) -> Result<i16, PacketError> {
        if self.cursor.remaining() < 2 {
            Err(PacketError::UnexpectedEof)
        } else {
            Ok(self.cursor.get_i16_le())
        }
    }

    pub fn read_u16(&mut self) -> Result<u16, PacketError> {
        if self.cursor.remaining() < 2 {
            Err(PacketError::UnexpectedEof)
        } else {
            Ok(self.cursor.get_u16_le())
        }
    }

    pub fn read_i32(&mut self) -> Result<i32, PacketError> {
        if self.cursor.remaining() < 4 {
            Err(PacketError::UnexpectedEof)
        } else {
            Ok(self.cursor.get_i32_le())
        }
    }

    pub fn read_u32(&mut self) -> Result<u32, PacketError> {
        if self.cursor.remaining() < 4 {
            Err(PacketError::UnexpectedEof)
        } else {
            Ok(self.cursor.get_u32_le())
        }
    }

    pub fn read_i64(&mut self) -> Result<i64, PacketError> {
        if self.cursor.remaining() < 8 {
            Err(PacketError::UnexpectedEof)
        } else {
            Ok(self.cursor.get_i64_le())
        }
    }

    pub fn read_u64(&mut self) -> Result<u64, PacketError> {
        if self.cursor.remaining() < 8 {
            Err(PacketError::UnexpectedEof)
        } else {
            Ok(self.cursor.get_u64_le())
        }
    }

    pub fn read_fixed_length_bytes(&mut self, length: usize) -> Result<&'a [u8], PacketError> {
        if self.cursor.remaining() < length {
            Err(PacketError::UnexpectedEof)
        } else {
            let start = self.cursor.position() as usize;
            let end = start + length;
            self.cursor.set_position(end as u64);
            Ok(&self.cursor.get_ref()[start..end])
        }
    }

    /// Reads a `u16` length prefix followed by that many raw bytes.
    pub fn read_sized_utf8(&mut self) -> Result<&'a str, PacketError> {
        let length = self.read_u16()? as usize;
        match str::from_utf8(self.read_fixed_length_bytes(length)?) {
            Ok(s) => Ok(s),
            Err(_) => Err(PacketError::InvalidPacket),
        }
    }

    /// Reads a fixed-width field, trimming NUL padding.
    pub fn read_fixed_length_utf8(&mut self, length: usize) -> Result<&'a str, PacketError> {
        match str::from_utf8(self.read_fixed_length_bytes(length)?) {
            Ok(s) => Ok(s.trim_end_matches(char::from(0))),
            Err(_) => Err(PacketError::InvalidPacket),
        }
    }
}

/// Forward-only little-endian encoder. Encoders that declare a maximum ahead
/// of time construct the writer through [`PacketWriter::with_max`]; exceeding
/// the declared bound is a programming error in the encoder (a miscalculated
/// maximum) and asserts.
pub struct PacketWriter {
    command: u16,
    data: BytesMut,
    max: Option<usize>,
}

impl PacketWriter {
    pub fn new(command: u16) -> PacketWriter {
        PacketWriter {
            command,
            data: BytesMut::with_capacity(1024),
            max: None,
        }
    }

    pub fn with_max(command: u16, max: usize) -> PacketWriter {
        PacketWriter {
            command,
            data: BytesMut::with_capacity(max),
            max: Some(max),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_bounds(&self, width: usize) {
        if let Some(max) = self.max {
            assert!(
                self.data.len() + width <= max,
                "packet 0x{:04X} exceeds declared maximum of {} bytes",
                self.command,
                max
            );
        }
    }

    pub fn write_bytes(&mut self, value: &[u8]) {
        self.check_bounds(value.len());
        self.data.put(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.check_bounds(1);
        self.data.put_i8(value);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.check_bounds(1);
        self.data.put_u8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.check_bounds(2);
        self.data.put_i16_le(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.check_bounds(2);
        self.data.put_u16_le(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.check_bounds(4);
        self.data.put_i32_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.check_bounds(4);
        self.data.put_u32_le(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.check_bounds(8);
        self.data.put_i64_le(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.check_bounds(8);
        self.data.put_u64_le(value);
    }

    pub fn write_zero(&mut self, count: usize) {
        self.check_bounds(count);
        self.data.put_bytes(0, count);
    }

    /// `u16` length prefix followed by the raw bytes, no terminator.
    pub fn write_sized_string(&mut self, value: &str) {
        self.write_u16(value.len() as u16);
        self.write_bytes(value.as_bytes());
    }

    /// Fixed-width field padded with NUL to exactly `length` bytes.
    pub fn write_fixed_string(&mut self, value: &str, length: usize) {
        if value.len() > length {
            self.write_bytes(&value.as_bytes()[0..length]);
        } else {
            self.write_bytes(value.as_bytes());
            self.write_zero(length - value.len());
        }
    }
}

impl From<PacketWriter> for Packet {
    fn from(writer: PacketWriter) -> Packet {
        Packet::with_data(writer.command, writer.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fill_matches_byte_writes() {
        let mut zeroed = PacketWriter::new(0x0001);
        zeroed.write_zero(16);

        let mut bytes = PacketWriter::new(0x0001);
        for _ in 0..16 {
            bytes.write_u8(0);
        }

        let zeroed = Packet::from(zeroed);
        let bytes = Packet::from(bytes);
        assert_eq!(zeroed.data, bytes.data);
    }

    #[test]
    fn sized_string_has_length_prefix_and_no_terminator() {
        let mut writer = PacketWriter::new(0x0001);
        writer.write_sized_string("Hero");
        let packet = Packet::from(writer);
        assert_eq!(&packet.data[..], &[0x04, 0x00, b'H', b'e', b'r', b'o']);
    }

    #[test]
    fn integers_are_little_endian() {
        let mut writer = PacketWriter::new(0x0001);
        writer.write_u16(0x1234);
        writer.write_u32(0xDEADBEEF);
        writer.write_i64(-1);
        let packet = Packet::from(writer);
        assert_eq!(
            &packet.data[..],
            &[
                0x34, 0x12, 0xEF, 0xBE, 0xAD, 0xDE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF
            ]
        );
    }

    #[test]
    fn to_vec_prefixes_opcode() {
        let mut writer = PacketWriter::new(0x007D);
        writer.write_u8(0xAB);
        let packet = Packet::from(writer);
        assert_eq!(packet.to_vec(), vec![0x7D, 0x00, 0xAB]);
    }

    #[test]
    #[should_panic(expected = "declared maximum")]
    fn writer_asserts_on_overrun() {
        let mut writer = PacketWriter::with_max(0x0001, 2);
        writer.write_u32(0);
    }

    #[test]
    fn reader_roundtrips_writer_output() {
        let mut writer = PacketWriter::new(0x0001);
        writer.write_bool(true);
        writer.write_i16(-42);
        writer.write_sized_string("abc");
        writer.write_fixed_string("name", 13);
        writer.write_u64(0x1122334455667788);
        let packet = Packet::from(writer);

        let mut reader = PacketReader::from(&packet);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_i16().unwrap(), -42);
        assert_eq!(reader.read_sized_utf8().unwrap(), "abc");
        assert_eq!(reader.read_fixed_length_utf8(13).unwrap(), "name");
        assert_eq!(reader.read_u64().unwrap(), 0x1122334455667788);
        assert_eq!(reader.remaining(), 0);
    }
}
