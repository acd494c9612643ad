mod connection;
mod packet;
mod time;

pub use connection::{Connection, ConnectionError, PacketCodec, PassthroughCodec};
pub use packet::{Packet, PacketError, PacketReader, PacketWriter};
pub use time::{filetime_from_unix, filetime_now, filetime_with_offset, DEFAULT_TIME, ZERO_TIME};
