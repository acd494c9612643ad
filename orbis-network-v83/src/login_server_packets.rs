use num_derive::FromPrimitive;

use orbis_game_common::components::CharacterStats;
use orbis_network_common::{Packet, PacketWriter};

use crate::{
    common_packets::{PacketWriteCharacter, CHAR_APPEARANCE_MAX_LEN, CHAR_STATS_BLOCK_LEN},
    ServerPackets,
};

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
pub enum LoginFailureReason {
    Banned = 3,
    IncorrectPassword = 4,
    NotRegistered = 5,
    SystemError = 6,
    AlreadyLoggedIn = 7,
    SystemError2 = 8,
    TooManyConnections = 10,
    AgeLimit = 11,
    UnableToLogOnAsMasterIp = 13,
    WrongGateway = 17,
}

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
pub enum PinOperation {
    Accepted = 0,
    RegisterNewPin = 1,
    Invalid = 2,
    ConnectionFailed = 3,
    EnterPin = 4,
}

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
pub enum PicStatus {
    Register = 0,
    Ask = 1,
    Disabled = 2,
}

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
pub enum ServerStatus {
    Normal = 0,
    HighlyPopulated = 1,
    Full = 2,
}

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
pub enum WorldFlag {
    None = 0,
    Event = 1,
    New = 2,
    Hot = 3,
}

pub struct PacketLoginSuccess<'a> {
    pub account_id: u32,
    pub gender: u8,
    pub name: &'a str,
    pub pic: PicStatus,
}

impl PacketLoginSuccess<'_> {
    pub fn max_length(&self) -> usize {
        40 + self.name.len()
    }
}

impl From<&PacketLoginSuccess<'_>> for Packet {
    fn from(packet: &PacketLoginSuccess) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::LoginStatus as u16, packet.max_length());
        writer.write_zero(6);
        writer.write_u32(packet.account_id);
        writer.write_u8(packet.gender);
        writer.write_u8(0); // Flying
        writer.write_u8(0); // Admin byte
        writer.write_u8(0); // Country code
        writer.write_sized_string(packet.name);
        writer.write_u8(0);
        writer.write_u8(0); // IsQuietBan
        writer.write_u64(0); // IsQuietBanTimeStamp
        writer.write_u64(0); // CreationTimeStamp
        writer.write_u32(1); // Removes the "select the world" popup
        writer.write_u8(1); // Pin: 0 - enabled, 1 - disabled
        writer.write_u8(packet.pic as u8);
        writer.into()
    }
}

pub struct PacketLoginFailure {
    pub reason: LoginFailureReason,
}

impl From<&PacketLoginFailure> for Packet {
    fn from(packet: &PacketLoginFailure) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::LoginStatus as u16, 6);
        writer.write_u16(packet.reason as u16);
        writer.write_u32(0);
        writer.into()
    }
}

pub struct PacketPinOperation {
    pub operation: PinOperation,
}

impl From<&PacketPinOperation> for Packet {
    fn from(packet: &PacketPinOperation) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::PinOperation as u16, 1);
        writer.write_u8(packet.operation as u8);
        writer.into()
    }
}

pub struct PacketLoginError {
    pub error: u16,
}

impl From<&PacketLoginError> for Packet {
    fn from(packet: &PacketLoginError) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::LoginError as u16, 2);
        writer.write_u16(packet.error);
        writer.into()
    }
}

pub struct PacketWorldListEntry<'a> {
    pub world_id: u8,
    pub name: &'a str,
    pub flag: WorldFlag,
    pub event_message: &'a str,
    pub channel_loads: &'a [u32],
}

impl PacketWorldListEntry<'_> {
    pub fn max_length(&self) -> usize {
        // Channel names are the decimal index, at most three digits.
        14 + self.name.len() + self.event_message.len() + self.channel_loads.len() * 12
    }
}

impl From<&PacketWorldListEntry<'_>> for Packet {
    fn from(packet: &PacketWorldListEntry) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::ServerList as u16, packet.max_length());
        writer.write_u8(packet.world_id);
        writer.write_sized_string(packet.name);
        writer.write_u8(packet.flag as u8);
        writer.write_sized_string(packet.event_message);
        writer.write_u8(100); // Exp rate modifier
        writer.write_u8(0);
        writer.write_u8(100); // Drop rate modifier
        writer.write_u8(0);
        writer.write_u8(0);

        writer.write_u8(packet.channel_loads.len() as u8);
        for (index, load) in packet.channel_loads.iter().enumerate() {
            writer.write_sized_string(&index.to_string());
            writer.write_u32(*load); // Channel load 0~800
            writer.write_u8(packet.world_id);
            writer.write_u8(index as u8);
            writer.write_bool(false);
        }

        writer.write_u16(0);
        writer.into()
    }
}

pub struct PacketWorldListEnd;

impl From<&PacketWorldListEnd> for Packet {
    fn from(_: &PacketWorldListEnd) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ServerList as u16, 1);
        writer.write_u8(0xFF);
        writer.into()
    }
}

pub struct PacketServerStatus {
    pub status: ServerStatus,
}

impl From<&PacketServerStatus> for Packet {
    fn from(packet: &PacketServerStatus) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ServerStatus as u16, 2);
        writer.write_u16(packet.status as u16);
        writer.into()
    }
}

pub struct PacketCharacterList<'a> {
    pub status: u8,
    pub characters: &'a [CharacterStats],
    pub pic: PicStatus,
    pub character_slots: u32,
}

impl PacketCharacterList<'_> {
    pub fn max_length(&self) -> usize {
        2 + self.characters.len() * (CHAR_STATS_BLOCK_LEN + CHAR_APPEARANCE_MAX_LEN + 2) + 5
    }
}

impl From<&PacketCharacterList<'_>> for Packet {
    fn from(packet: &PacketCharacterList) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::CharacterList as u16, packet.max_length());
        writer.write_u8(packet.status);
        writer.write_u8(packet.characters.len() as u8);
        for character in packet.characters {
            writer.write_char_stats(character);
            writer.write_char_appearance(&character.appearance, false);
            writer.write_u8(0); // Not a view-all
            writer.write_u8(0); // World ranking disabled
        }
        writer.write_u8(packet.pic as u8);
        writer.write_u32(packet.character_slots);
        writer.into()
    }
}

pub struct PacketChannelIp {
    pub addr: [u8; 4],
    pub port: u16,
    pub token: u32,
}

impl From<&PacketChannelIp> for Packet {
    fn from(packet: &PacketChannelIp) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ChannelIp as u16, 17);
        writer.write_u16(0);
        writer.write_bytes(&packet.addr);
        writer.write_u16(packet.port);
        writer.write_u32(packet.token);
        writer.write_zero(5);
        writer.into()
    }
}

pub struct PacketNameCheckResponse<'a> {
    pub name: &'a str,
    pub available: bool,
}

impl From<&PacketNameCheckResponse<'_>> for Packet {
    fn from(packet: &PacketNameCheckResponse) -> Self {
        let mut writer = PacketWriter::with_max(
            ServerPackets::NameCheckResponse as u16,
            3 + packet.name.len(),
        );
        writer.write_sized_string(packet.name);
        writer.write_u8(if packet.available { 0 } else { 1 });
        writer.into()
    }
}

pub struct PacketCreateCharacterResponse<'a> {
    pub character: &'a CharacterStats,
}

impl From<&PacketCreateCharacterResponse<'_>> for Packet {
    fn from(packet: &PacketCreateCharacterResponse) -> Self {
        let mut writer = PacketWriter::with_max(
            ServerPackets::CreateCharacterResponse as u16,
            3 + CHAR_STATS_BLOCK_LEN + CHAR_APPEARANCE_MAX_LEN,
        );
        writer.write_u8(0);
        writer.write_char_stats(packet.character);
        writer.write_char_appearance(&packet.character.appearance, false);
        writer.write_u8(0); // Not a view-all
        writer.write_u8(0); // World ranking disabled
        writer.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_success_golden_vector() {
        let packet = Packet::from(&PacketLoginSuccess {
            account_id: 123,
            gender: 0,
            name: "Hero",
            pic: PicStatus::Disabled,
        });
        let bytes = packet.to_vec();

        let mut expected = Vec::new();
        expected.extend_from_slice(&[0x00, 0x00]); // opcode
        expected.extend_from_slice(&[0; 6]);
        expected.extend_from_slice(&[0x7B, 0x00, 0x00, 0x00]); // account id
        expected.push(0x00); // gender
        expected.extend_from_slice(&[0x00, 0x00, 0x00]);
        expected.extend_from_slice(&[0x04, 0x00, 0x48, 0x65, 0x72, 0x6F]); // "Hero"
        expected.extend_from_slice(&[0x00, 0x00]);
        expected.extend_from_slice(&[0; 8]);
        expected.extend_from_slice(&[0; 8]);
        expected.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);
        expected.push(0x01);
        expected.push(0x02);

        assert_eq!(bytes, expected);
        assert_eq!(bytes.len(), 46);
    }

    #[test]
    fn world_list_terminator_is_ff() {
        let packet = Packet::from(&PacketWorldListEnd);
        assert_eq!(packet.to_vec(), vec![0x0A, 0x00, 0xFF]);
    }

    #[test]
    fn world_list_entry_counts_channels() {
        let packet = Packet::from(&PacketWorldListEntry {
            world_id: 0,
            name: "Scania",
            flag: WorldFlag::None,
            event_message: "",
            channel_loads: &[0, 0],
        });
        let bytes = packet.to_vec();
        // Trailing u16 0 after two 9-byte channel entries ("0"/"1" names).
        assert_eq!(&bytes[bytes.len() - 2..], &[0, 0]);
        let channel_count_index = 2 + 1 + (2 + 6) + 1 + 2 + 5;
        assert_eq!(bytes[channel_count_index], 2);
    }

    #[test]
    fn login_flow_packets_are_fixed_length() {
        assert_eq!(
            Packet::from(&PacketLoginFailure {
                reason: LoginFailureReason::AlreadyLoggedIn,
            })
            .data
            .len(),
            6
        );
        assert_eq!(
            Packet::from(&PacketPinOperation {
                operation: PinOperation::Accepted,
            })
            .data
            .len(),
            1
        );
        assert_eq!(Packet::from(&PacketLoginError { error: 23 }).data.len(), 2);
        assert_eq!(
            Packet::from(&PacketServerStatus {
                status: ServerStatus::HighlyPopulated,
            })
            .data
            .len(),
            2
        );
        assert_eq!(
            Packet::from(&PacketChannelIp {
                addr: [127, 0, 0, 1],
                port: 7575,
                token: 0xDEADBEEF,
            })
            .data
            .len(),
            17
        );
    }

    #[test]
    fn character_list_wraps_stats_and_appearance() {
        use crate::common_packets::CHAR_STATS_BLOCK_LEN;
        use orbis_game_common::components::{CharacterAppearance, CharacterGender};
        use orbis_game_common::data::Job;

        let character = CharacterStats {
            id: 1,
            appearance: CharacterAppearance {
                name: "Hero".to_string(),
                gender: CharacterGender::Male,
                skin: 0,
                face: 20000,
                hair: 30000,
                gacha_exp: 0,
                map: 100000000,
                spawn_point: 0,
                equipment_ids: Vec::new(),
            },
            level: 1,
            job: Job::Beginner,
            fame: 0,
            strength: 12,
            dexterity: 5,
            intelligence: 4,
            luck: 4,
            max_hp: 50,
            hp: 50,
            max_mp: 5,
            mp: 5,
            ap: 0,
            sp: 0,
            exp: 0,
        };
        let characters = [character];
        let list = PacketCharacterList {
            status: 0,
            characters: &characters,
            pic: PicStatus::Disabled,
            character_slots: 6,
        };
        let max = list.max_length();
        let packet = Packet::from(&list);
        assert!(packet.data.len() <= max);
        // Header, one stats block with its appearance (no equipment, so the
        // appearance block is at its 29-byte minimum), rank bytes, trailer.
        assert_eq!(packet.data.len(), 2 + CHAR_STATS_BLOCK_LEN + 29 + 2 + 5);

        let create = Packet::from(&PacketCreateCharacterResponse {
            character: &characters[0],
        });
        assert_eq!(create.data.len(), 1 + CHAR_STATS_BLOCK_LEN + 29 + 2);
    }

    #[test]
    fn name_check_response_flags_taken_names() {
        let taken = Packet::from(&PacketNameCheckResponse {
            name: "Hero",
            available: false,
        });
        let bytes = taken.to_vec();
        assert_eq!(bytes[bytes.len() - 1], 1);
    }
}
