pub mod server;

use num_derive::FromPrimitive;

/// The client opcodes the channel dispatcher reacts to. Frames arrive here
/// already validated and decrypted by the session layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
pub enum ClientPackets {
    EnterChannel = 0x0014,
    EnterPortal = 0x0026,
    MovePlayer = 0x0029,
    CloseRangeAttack = 0x002C,
    Chat = 0x0031,
    FaceExpression = 0x0033,
    NpcTalk = 0x003A,
    NpcTalkMore = 0x003C,
    SelectJob = 0x0062,
    HitReactor = 0x00CD,
}
