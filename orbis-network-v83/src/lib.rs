mod channel_server_packets;
mod common_packets;
mod login_server_packets;

pub use channel_server_packets::*;
pub use common_packets::{
    PacketReadCharacter, PacketReadItems, PacketWriteCharacter, PacketWriteItems,
    CHAR_APPEARANCE_MAX_LEN, CHAR_STATS_BLOCK_LEN, EQUIPMENT_RECORD_MAX_LEN,
    STACKABLE_RECORD_MAX_LEN,
};
pub use login_server_packets::*;

use num_derive::FromPrimitive;

/// Every message the channel and login servers emit, keyed by the 2-byte
/// opcode that leads the packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
pub enum ServerPackets {
    LoginStatus = 0x0000,
    ServerStatus = 0x0003,
    PinOperation = 0x0006,
    LoginError = 0x0009,
    ServerList = 0x000A,
    CharacterList = 0x000B,
    ChannelIp = 0x000C,
    NameCheckResponse = 0x000D,
    CreateCharacterResponse = 0x000E,
    ModifyInventory = 0x001D,
    StatChange = 0x001F,
    UpdateSkill = 0x0024,
    ShowStatusInfo = 0x0027,
    SetGender = 0x003A,
    PopupMessage = 0x0044,
    AddCard = 0x0053,
    EnterMap = 0x007D,
    AddPlayerToMap = 0x00A0,
    RemovePlayerFromMap = 0x00A1,
    Chat = 0x00A2,
    MovePlayer = 0x00B9,
    CloseRangeAttack = 0x00BA,
    RangedAttack = 0x00BB,
    DamagePlayer = 0x00C0,
    FaceExpression = 0x00C1,
    ShowForeignEffect = 0x00C6,
    ShowEffect = 0x00CE,
    QuestAction = 0x00D3,
    SpawnMonster = 0x00EC,
    KillMonster = 0x00ED,
    SpawnMonsterController = 0x00EE,
    MoveMonster = 0x00EF,
    MoveMonsterResponse = 0x00F0,
    MonsterHp = 0x00FA,
    SpawnNpc = 0x0101,
    SpawnNpcController = 0x0103,
    NpcAction = 0x0104,
    DropEnterMap = 0x010C,
    DropLeaveMap = 0x010D,
    ChangeReactorState = 0x0115,
    SpawnReactor = 0x0117,
    DestroyReactor = 0x0118,
    NpcDialogue = 0x0130,
    OpenShop = 0x0131,
    ShopActionResponse = 0x0132,
    Keymap = 0x014F,
}
