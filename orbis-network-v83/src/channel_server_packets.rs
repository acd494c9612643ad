use num_derive::FromPrimitive;

use orbis_data::{ItemDatabase, NpcShopItem};
use orbis_game_common::components::{
    expand_equip_slot, is_rechargeable, Character, CharacterGender, InventoryKind,
    InventoryModify, Item, KeyMap, EQUIP_SLOT_COUNT, KEYMAP_KEY_COUNT,
};
use orbis_network_common::{
    filetime_from_unix, filetime_now, Packet, PacketWriter, DEFAULT_TIME, ZERO_TIME,
};

use crate::{
    common_packets::{
        PacketWriteCharacter, PacketWriteItems, CHAR_APPEARANCE_MAX_LEN, CHAR_STATS_BLOCK_LEN,
        EQUIPMENT_RECORD_MAX_LEN, STACKABLE_RECORD_MAX_LEN,
    },
    ServerPackets,
};

/// Map entry serialises the whole character snapshot. The layout is rigid;
/// every section below matches the client's parser field for field.
pub struct PacketEnterMap<'a> {
    pub channel: u32,
    pub character: &'a Character,
}

impl PacketEnterMap<'_> {
    pub fn max_length(&self) -> usize {
        let character = self.character;
        let equipment_cells = EQUIP_SLOT_COUNT + character.equipment_inventory.slot_count() as usize;
        let stackable_cells: usize = character
            .inventories
            .values()
            .map(|tab| tab.slot_count() as usize)
            .sum();
        let quest_info_bytes: usize = character
            .quest_log
            .iter_info()
            .map(|(_, value)| 4 + value.len())
            .sum();

        29 + CHAR_STATS_BLOCK_LEN
            + 19
            + equipment_cells * (2 + EQUIPMENT_RECORD_MAX_LEN)
            + 8
            + stackable_cells * (1 + STACKABLE_RECORD_MAX_LEN)
            + 4
            + 2
            + character.skills.len() * 16
            + 2
            + 2
            + character.quest_log.active_count() * 19
            + quest_info_bytes
            + 2
            + character.quest_log.completed_count() * 10
            + 8
            + 60
            + 7
            + character.monster_book.len() * 3
            + 6
            + 8
    }
}

impl From<&PacketEnterMap<'_>> for Packet {
    fn from(packet: &PacketEnterMap) -> Self {
        let character = packet.character;
        let mut writer =
            PacketWriter::with_max(ServerPackets::EnterMap as u16, packet.max_length());

        writer.write_u32(packet.channel);
        writer.write_u8(1);
        writer.write_u8(1);
        writer.write_u16(0);

        // Damage calculation seeds
        writer.write_u32(0);
        writer.write_u32(0);
        writer.write_u32(0);

        writer.write_i64(-1);
        writer.write_u8(0);
        writer.write_char_stats(&character.to_stats());

        writer.write_u8(20); // Buddy list capacity
        writer.write_u8(0); // Linked name
        writer.write_i32(character.mesos);

        // Inventory limits
        writer.write_u8(character.equipment_inventory.slot_count());
        writer.write_u8(character.inventories[InventoryKind::Use].slot_count());
        writer.write_u8(character.inventories[InventoryKind::Setup].slot_count());
        writer.write_u8(character.inventories[InventoryKind::Etc].slot_count());
        writer.write_u8(252); // Max cash limit

        writer.write_u64(ZERO_TIME);

        for (compact, equipment) in character.equipped.iter() {
            writer.write_u16(expand_equip_slot(compact) as u16);
            writer.write_equipment_record(equipment);
        }
        writer.write_u16(0); // End of equipped equipment
        writer.write_u16(0); // End of cosmetic equipped equipment

        for (index, equipment) in character.equipment_inventory.iter() {
            writer.write_u16(index as u16 + 1);
            writer.write_equipment_record(equipment);
        }
        writer.write_u32(0); // End of equipment inventory

        for kind in [InventoryKind::Use, InventoryKind::Setup, InventoryKind::Etc] {
            for (index, item) in character.inventories[kind].iter() {
                writer.write_u8(index as u8 + 1);
                writer.write_stackable_record(item);
            }
            writer.write_u8(0);
        }
        writer.write_u8(0); // End of cash inventory

        writer.write_u16(character.skills.len() as u16);
        for (skill_id, entry) in character.skills.iter() {
            writer.write_u32(skill_id);
            writer.write_u32(entry.level as u32);
            writer.write_u64(DEFAULT_TIME);
        }

        writer.write_u16(0); // Cooldowns

        let started_count =
            character.quest_log.active_count() + character.quest_log.info_count();
        writer.write_i16(started_count as i16);
        for quest in character.quest_log.iter_active() {
            writer.write_u16(quest.id);
            writer.write_sized_string(&quest.progress_string());
        }
        for (quest_id, value) in character.quest_log.iter_info() {
            writer.write_u16(quest_id);
            writer.write_sized_string(value);
        }

        writer.write_i16(character.quest_log.completed_count() as i16);
        for (quest_id, completed_at) in character.quest_log.iter_completed() {
            writer.write_u16(quest_id);
            writer.write_u64(filetime_from_unix(completed_at));
        }

        writer.write_u16(0); // Mini game info
        writer.write_u16(0); // Crush rings
        writer.write_u16(0); // Friendship rings
        writer.write_u16(0); // Partner

        // Teleport rock locations
        for _ in 0..5 {
            writer.write_u32(999999999);
        }
        for _ in 0..10 {
            writer.write_u32(999999999);
        }

        // Monster book
        writer.write_u32(0); // Cover
        writer.write_u8(0);
        writer.write_u16(character.monster_book.len() as u16);
        for (card_id, count) in character.monster_book.iter() {
            writer.write_u16((card_id % 10000) as u16);
            writer.write_i8(count);
        }

        writer.write_u16(0); // New year records
        writer.write_u16(0); // Area info
        writer.write_u16(0); // End

        writer.write_u64(filetime_now());
        writer.into()
    }
}

pub struct PacketSetGender {
    pub gender: CharacterGender,
}

impl From<&PacketSetGender> for Packet {
    fn from(packet: &PacketSetGender) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::SetGender as u16, 1);
        writer.write_bool(packet.gender == CharacterGender::Female);
        writer.into()
    }
}

pub struct PacketChangeMap {
    pub map: u32,
    pub portal: u8,
    pub hp: u16,
}

impl From<&PacketChangeMap> for Packet {
    fn from(packet: &PacketChangeMap) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::EnterMap as u16, 25);
        writer.write_u32(0); // Channel
        writer.write_u32(0);
        writer.write_u8(0);
        writer.write_u32(packet.map);
        writer.write_u8(packet.portal);
        writer.write_u16(packet.hp);
        writer.write_bool(false);
        writer.write_u64(filetime_now());
        writer.into()
    }
}

pub struct PacketAddPlayerToMap<'a> {
    pub character: &'a Character,
}

impl PacketAddPlayerToMap<'_> {
    pub fn max_length(&self) -> usize {
        160 + self.character.name.len() + CHAR_APPEARANCE_MAX_LEN + 30
    }
}

impl From<&PacketAddPlayerToMap<'_>> for Packet {
    fn from(packet: &PacketAddPlayerToMap) -> Self {
        let character = packet.character;
        let mut writer =
            PacketWriter::with_max(ServerPackets::AddPlayerToMap as u16, packet.max_length());

        writer.write_u32(character.id);
        writer.write_u8(character.level);
        writer.write_sized_string(&character.name);
        writer.write_zero(8); // Guild

        // Foreign buffs
        writer.write_u32(0);
        writer.write_u16(0);
        writer.write_u8(0xFC);
        writer.write_u8(1);
        writer.write_u32(0); // Morph
        writer.write_u32(0); // High bytes of buff mask
        writer.write_u32(0); // Low bytes of buff mask

        // Energy charge
        writer.write_u32(0);
        writer.write_u16(0);
        writer.write_u32(0);

        // Dash speed
        writer.write_u32(0);
        writer.write_zero(11);
        writer.write_u16(0);

        // Dash jump
        writer.write_zero(9);
        writer.write_u32(0);
        writer.write_u16(0);
        writer.write_u8(0);

        // Monster riding
        writer.write_u64(0);

        writer.write_u32(0);
        writer.write_zero(8);
        writer.write_u32(0);
        writer.write_u8(0);
        writer.write_u32(0);
        writer.write_u16(0);
        writer.write_zero(9);
        writer.write_u32(0);
        writer.write_u32(0);
        writer.write_zero(9);
        writer.write_u32(0);
        writer.write_u32(0);

        writer.write_u16(character.job.id());
        writer.write_char_appearance(&character.to_appearance(), false);
        writer.write_u32(0); // Heart-shaped chocolates
        writer.write_u32(0); // Item effect
        writer.write_u32(0); // Chair
        writer.write_i16(character.x);
        writer.write_i16(character.y);
        writer.write_u8(character.stance);
        writer.write_i16(character.foothold as i16);
        writer.write_u8(0);
        writer.write_u8(0); // End of pets

        // Mob
        writer.write_u32(1);
        writer.write_u32(0);
        writer.write_u32(0);

        writer.write_u8(0); // Shop or minigame
        writer.write_u8(0); // Chalkboard
        writer.write_u8(0); // Crush rings
        writer.write_u8(0); // Friendship rings
        writer.write_u8(0); // Marriage ring
        writer.write_u8(0); // New years cards
        writer.write_u16(0);
        writer.write_u8(0); // Team

        writer.into()
    }
}

pub struct PacketRemovePlayerFromMap {
    pub id: u32,
}

impl From<&PacketRemovePlayerFromMap> for Packet {
    fn from(packet: &PacketRemovePlayerFromMap) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::RemovePlayerFromMap as u16, 4);
        writer.write_u32(packet.id);
        writer.into()
    }
}

/// The client's movement trailer is relayed verbatim, prefixed with the
/// server-side id of the moving player.
pub struct PacketMovePlayer<'a> {
    pub id: u32,
    pub movement: &'a [u8],
}

impl From<&PacketMovePlayer<'_>> for Packet {
    fn from(packet: &PacketMovePlayer) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::MovePlayer as u16, 8 + packet.movement.len());
        writer.write_u32(packet.id);
        writer.write_u32(0);
        writer.write_bytes(packet.movement);
        writer.into()
    }
}

pub struct PacketDamagePlayer {
    pub skill: i8,
    pub monster_id: u32,
    pub character_id: u32,
    pub damage: i32,
    pub fake: i32,
    pub direction: u8,
}

impl From<&PacketDamagePlayer> for Packet {
    fn from(packet: &PacketDamagePlayer) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::DamagePlayer as u16, 28);
        writer.write_u32(packet.character_id);
        writer.write_i8(packet.skill);
        writer.write_i32(packet.damage);
        if packet.skill != -4 {
            writer.write_u32(packet.monster_id);
            writer.write_u8(packet.direction);
            writer.write_u16(0);
            writer.write_i32(packet.damage);
            if packet.fake > 0 {
                writer.write_i32(packet.fake);
            }
        } else {
            writer.write_i32(packet.damage);
        }
        writer.into()
    }
}

pub struct PacketChat<'a> {
    pub id: u32,
    pub gm: bool,
    pub message: &'a str,
    pub show: u8,
}

impl From<&PacketChat<'_>> for Packet {
    fn from(packet: &PacketChat) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::Chat as u16, 8 + packet.message.len());
        writer.write_u32(packet.id);
        writer.write_bool(packet.gm);
        writer.write_sized_string(packet.message);
        writer.write_u8(packet.show);
        writer.into()
    }
}

pub struct PacketFaceExpression {
    pub id: u32,
    pub emote: u32,
}

impl From<&PacketFaceExpression> for Packet {
    fn from(packet: &PacketFaceExpression) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::FaceExpression as u16, 8);
        writer.write_u32(packet.id);
        writer.write_u32(packet.emote);
        writer.into()
    }
}

pub struct PacketPopupMessage<'a> {
    pub message: &'a str,
}

impl From<&PacketPopupMessage<'_>> for Packet {
    fn from(packet: &PacketPopupMessage) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::PopupMessage as u16, 3 + packet.message.len());
        writer.write_u8(1);
        writer.write_sized_string(packet.message);
        writer.into()
    }
}

pub struct PacketKeymap<'a> {
    pub keymap: &'a KeyMap,
}

impl From<&PacketKeymap<'_>> for Packet {
    fn from(packet: &PacketKeymap) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::Keymap as u16, 1 + KEYMAP_KEY_COUNT * 5);
        writer.write_u8(0);
        for binding in packet.keymap.iter() {
            writer.write_u8(binding.kind);
            writer.write_u32(binding.action);
        }
        writer.into()
    }
}

pub struct PacketUpdateSkill {
    pub skill_id: u32,
    pub level: i8,
    pub master_level: i8,
}

impl From<&PacketUpdateSkill> for Packet {
    fn from(packet: &PacketUpdateSkill) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::UpdateSkill as u16, 24);
        writer.write_u8(1);
        writer.write_u16(1);
        writer.write_u32(packet.skill_id);
        writer.write_i32(packet.level as i32);
        writer.write_i32(packet.master_level as i32);
        writer.write_u64(DEFAULT_TIME);
        writer.write_u8(4);
        writer.into()
    }
}

pub struct PacketShowEffect {
    pub effect: u8,
}

impl From<&PacketShowEffect> for Packet {
    fn from(packet: &PacketShowEffect) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShowEffect as u16, 1);
        writer.write_u8(packet.effect);
        writer.into()
    }
}

pub struct PacketShowForeignEffect {
    pub id: u32,
    pub effect: u8,
}

impl From<&PacketShowForeignEffect> for Packet {
    fn from(packet: &PacketShowForeignEffect) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShowForeignEffect as u16, 5);
        writer.write_u32(packet.id);
        writer.write_u8(packet.effect);
        writer.into()
    }
}

pub struct PacketAddCard {
    pub full: bool,
    pub card_id: u32,
    pub count: i8,
}

impl From<&PacketAddCard> for Packet {
    fn from(packet: &PacketAddCard) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::AddCard as u16, 9);
        writer.write_bool(!packet.full);
        writer.write_u32(packet.card_id);
        writer.write_i32(packet.count as i32);
        writer.into()
    }
}

/// A single field of the stat-change packet. The wire order is fixed by the
/// client regardless of the order updates are supplied in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatUpdate {
    Skin(u8),
    Face(u32),
    Hair(u32),
    Level(u8),
    Job(u16),
    Strength(i16),
    Dexterity(i16),
    Intelligence(i16),
    Luck(i16),
    Hp(i16),
    MaxHp(i16),
    Mp(i16),
    MaxMp(i16),
    Ap(i16),
    Sp(i16),
    Exp(i32),
    Fame(i16),
    Meso(i32),
    /// Pet slots are one logical field covering the mask bits 0x180008.
    Pet(u32),
    GachaExp(i32),
}

impl StatUpdate {
    fn mask(&self) -> u32 {
        match self {
            StatUpdate::Skin(_) => 0x1,
            StatUpdate::Face(_) => 0x2,
            StatUpdate::Hair(_) => 0x4,
            StatUpdate::Level(_) => 0x10,
            StatUpdate::Job(_) => 0x20,
            StatUpdate::Strength(_) => 0x40,
            StatUpdate::Dexterity(_) => 0x80,
            StatUpdate::Intelligence(_) => 0x100,
            StatUpdate::Luck(_) => 0x200,
            StatUpdate::Hp(_) => 0x400,
            StatUpdate::MaxHp(_) => 0x800,
            StatUpdate::Mp(_) => 0x1000,
            StatUpdate::MaxMp(_) => 0x2000,
            StatUpdate::Ap(_) => 0x4000,
            StatUpdate::Sp(_) => 0x8000,
            StatUpdate::Exp(_) => 0x10000,
            StatUpdate::Fame(_) => 0x20000,
            StatUpdate::Meso(_) => 0x40000,
            StatUpdate::Pet(_) => 0x180008,
            StatUpdate::GachaExp(_) => 0x200000,
        }
    }

    fn ordinal(&self) -> usize {
        match self {
            StatUpdate::Skin(_) => 0,
            StatUpdate::Face(_) => 1,
            StatUpdate::Hair(_) => 2,
            StatUpdate::Level(_) => 3,
            StatUpdate::Job(_) => 4,
            StatUpdate::Strength(_) => 5,
            StatUpdate::Dexterity(_) => 6,
            StatUpdate::Intelligence(_) => 7,
            StatUpdate::Luck(_) => 8,
            StatUpdate::Hp(_) => 9,
            StatUpdate::MaxHp(_) => 10,
            StatUpdate::Mp(_) => 11,
            StatUpdate::MaxMp(_) => 12,
            StatUpdate::Ap(_) => 13,
            StatUpdate::Sp(_) => 14,
            StatUpdate::Exp(_) => 15,
            StatUpdate::Fame(_) => 16,
            StatUpdate::Meso(_) => 17,
            StatUpdate::Pet(_) => 18,
            StatUpdate::GachaExp(_) => 19,
        }
    }

    fn write(&self, writer: &mut PacketWriter) {
        match *self {
            StatUpdate::Skin(value) => writer.write_u8(value),
            StatUpdate::Face(value) => writer.write_u32(value),
            StatUpdate::Hair(value) => writer.write_u32(value),
            StatUpdate::Level(value) => writer.write_u8(value),
            StatUpdate::Job(value) => writer.write_i16(value as i16),
            StatUpdate::Strength(value) => writer.write_i16(value),
            StatUpdate::Dexterity(value) => writer.write_i16(value),
            StatUpdate::Intelligence(value) => writer.write_i16(value),
            StatUpdate::Luck(value) => writer.write_i16(value),
            StatUpdate::Hp(value) => writer.write_i16(value),
            StatUpdate::MaxHp(value) => writer.write_i16(value),
            StatUpdate::Mp(value) => writer.write_i16(value),
            StatUpdate::MaxMp(value) => writer.write_i16(value),
            StatUpdate::Ap(value) => writer.write_i16(value),
            StatUpdate::Sp(value) => writer.write_i16(value),
            StatUpdate::Exp(value) => writer.write_i32(value),
            StatUpdate::Fame(value) => writer.write_i16(value),
            StatUpdate::Meso(value) => writer.write_i32(value),
            StatUpdate::Pet(value) => writer.write_u32(value),
            StatUpdate::GachaExp(value) => writer.write_i32(value),
        }
    }
}

pub struct PacketStatChange<'a> {
    pub enable_actions: bool,
    pub updates: &'a [StatUpdate],
}

impl From<&PacketStatChange<'_>> for Packet {
    fn from(packet: &PacketStatChange) -> Self {
        let mut writer = PacketWriter::with_max(
            ServerPackets::StatChange as u16,
            5 + packet.updates.len() * 4,
        );
        writer.write_bool(packet.enable_actions);

        let mask = packet
            .updates
            .iter()
            .fold(0u32, |mask, update| mask | update.mask());
        writer.write_u32(mask);

        let mut updates: Vec<&StatUpdate> = packet.updates.iter().collect();
        updates.sort_by_key(|update| update.ordinal());
        for update in updates {
            update.write(&mut writer);
        }

        writer.into()
    }
}

pub struct PacketExpGain {
    pub exp: i32,
    pub equip_bonus: i32,
    pub party_bonus: i32,
    pub white: bool,
    pub in_chat: bool,
}

impl From<&PacketExpGain> for Packet {
    fn from(packet: &PacketExpGain) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShowStatusInfo as u16, 37);
        writer.write_u8(3);
        writer.write_bool(packet.white);
        writer.write_i32(packet.exp);
        writer.write_bool(packet.in_chat);
        writer.write_i32(0); // Bonus event exp
        writer.write_u8(0);
        writer.write_u8(0);
        writer.write_i32(0); // Wedding bonus
        if packet.in_chat {
            writer.write_u8(0);
        }
        writer.write_u8(0);
        writer.write_i32(packet.party_bonus);
        writer.write_i32(packet.equip_bonus);
        writer.write_i32(0); // Internet cafe bonus
        writer.write_i32(0); // Rainbow week bonus
        writer.into()
    }
}

pub struct PacketMesoGain {
    pub amount: i32,
    pub in_chat: bool,
}

impl From<&PacketMesoGain> for Packet {
    fn from(packet: &PacketMesoGain) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShowStatusInfo as u16, 9);
        if packet.in_chat {
            writer.write_u8(5);
            writer.write_i32(packet.amount);
            writer.write_u16(0);
        } else {
            writer.write_u8(0);
            writer.write_u16(1);
            writer.write_i32(packet.amount);
            writer.write_u16(0);
        }
        writer.into()
    }
}

pub struct PacketItemGain {
    pub item_id: u32,
    pub amount: i32,
}

impl From<&PacketItemGain> for Packet {
    fn from(packet: &PacketItemGain) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShowStatusInfo as u16, 18);
        writer.write_u16(0);
        writer.write_u32(packet.item_id);
        writer.write_i32(packet.amount);
        writer.write_u64(0);
        writer.into()
    }
}

pub struct PacketItemGainInChat {
    pub item_id: u32,
    pub amount: i32,
}

impl From<&PacketItemGainInChat> for Packet {
    fn from(packet: &PacketItemGainInChat) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShowEffect as u16, 10);
        writer.write_u8(3);
        writer.write_u8(1);
        writer.write_u32(packet.item_id);
        writer.write_i32(packet.amount);
        writer.into()
    }
}

pub struct PacketItemUnavailable;

impl From<&PacketItemUnavailable> for Packet {
    fn from(_: &PacketItemUnavailable) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShowStatusInfo as u16, 10);
        writer.write_u8(0);
        writer.write_u8(0xFE);
        writer.write_u64(0);
        writer.into()
    }
}

pub struct PacketInventoryFull;

impl From<&PacketInventoryFull> for Packet {
    fn from(_: &PacketInventoryFull) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShowStatusInfo as u16, 10);
        writer.write_u8(0);
        writer.write_u8(0xFF);
        writer.write_u64(0);
        writer.into()
    }
}

pub struct PacketModifyInventory<'a> {
    pub updates: &'a [InventoryModify],
}

impl PacketModifyInventory<'_> {
    pub fn max_length(&self) -> usize {
        2 + self.updates.len() * (6 + 1 + EQUIPMENT_RECORD_MAX_LEN.max(STACKABLE_RECORD_MAX_LEN))
    }
}

impl From<&PacketModifyInventory<'_>> for Packet {
    fn from(packet: &PacketModifyInventory) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::ModifyInventory as u16, packet.max_length());
        writer.write_bool(true);
        writer.write_u8(packet.updates.len() as u8);

        for update in packet.updates {
            match update {
                InventoryModify::Add {
                    inventory,
                    slot,
                    item,
                } => {
                    writer.write_u8(0);
                    writer.write_u8(inventory.wire_id());
                    writer.write_i16(*slot);
                    match item {
                        Item::Equipment(equipment) => writer.write_equipment_record(equipment),
                        Item::Stackable(stackable) => writer.write_stackable_record(stackable),
                    }
                }
                InventoryModify::Quantity {
                    inventory,
                    slot,
                    quantity,
                } => {
                    writer.write_u8(1);
                    writer.write_u8(inventory.wire_id());
                    writer.write_i16(*slot);
                    writer.write_i16(*quantity);
                }
                InventoryModify::Move {
                    inventory,
                    slot,
                    destination,
                } => {
                    writer.write_u8(2);
                    writer.write_u8(inventory.wire_id());
                    writer.write_i16(*slot);
                    writer.write_i16(*destination);
                    if *slot < 0 || *destination < 0 {
                        writer.write_u8(if *slot < 0 { 1 } else { 2 });
                    }
                }
                InventoryModify::Remove { inventory, slot } => {
                    writer.write_u8(3);
                    writer.write_u8(inventory.wire_id());
                    writer.write_i16(*slot);
                    if *slot < 0 {
                        writer.write_u8(2);
                    }
                }
            }
        }

        writer.into()
    }
}

pub struct PacketSpawnNpc {
    pub object_id: u32,
    pub npc_id: u32,
    pub x: i16,
    pub cy: i16,
    pub flipped: bool,
    pub foothold: u16,
    pub rx0: i16,
    pub rx1: i16,
}

impl From<&PacketSpawnNpc> for Packet {
    fn from(packet: &PacketSpawnNpc) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::SpawnNpc as u16, 20);
        writer.write_u32(packet.object_id);
        writer.write_u32(packet.npc_id);
        writer.write_i16(packet.x);
        writer.write_i16(packet.cy);
        writer.write_u8(if packet.flipped { 0 } else { 1 });
        writer.write_u16(packet.foothold);
        writer.write_i16(packet.rx0);
        writer.write_i16(packet.rx1);
        writer.write_u8(1);
        writer.into()
    }
}

pub struct PacketSpawnNpcController {
    pub object_id: u32,
    pub npc_id: u32,
    pub x: i16,
    pub cy: i16,
    pub flipped: bool,
    pub foothold: u16,
    pub rx0: i16,
    pub rx1: i16,
}

impl From<&PacketSpawnNpcController> for Packet {
    fn from(packet: &PacketSpawnNpcController) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::SpawnNpcController as u16, 21);
        writer.write_u8(1);
        writer.write_u32(packet.object_id);
        writer.write_u32(packet.npc_id);
        writer.write_i16(packet.x);
        writer.write_i16(packet.cy);
        writer.write_u8(if packet.flipped { 0 } else { 1 });
        writer.write_u16(packet.foothold);
        writer.write_i16(packet.rx0);
        writer.write_i16(packet.rx1);
        writer.write_bool(true); // Minimap
        writer.into()
    }
}

pub struct PacketNpcAction<'a> {
    pub data: &'a [u8],
}

impl From<&PacketNpcAction<'_>> for Packet {
    fn from(packet: &PacketNpcAction) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::NpcAction as u16, packet.data.len());
        writer.write_bytes(packet.data);
        writer.into()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
pub enum NpcDialogueType {
    Ok = 0,
    YesNo = 1,
    Next = 2,
    Prev = 3,
    PrevNext = 4,
}

impl NpcDialogueType {
    fn message_type(self) -> u8 {
        match self {
            NpcDialogueType::Next | NpcDialogueType::Prev | NpcDialogueType::PrevNext => 0,
            other => other as u8,
        }
    }
}

pub struct PacketNpcDialogue<'a> {
    pub npc_id: u32,
    pub kind: NpcDialogueType,
    pub message: &'a str,
    pub speaker: u8,
}

impl From<&PacketNpcDialogue<'_>> for Packet {
    fn from(packet: &PacketNpcDialogue) -> Self {
        let mut writer = PacketWriter::with_max(
            ServerPackets::NpcDialogue as u16,
            11 + packet.message.len(),
        );
        writer.write_u8(4);
        writer.write_u32(packet.npc_id);
        writer.write_u8(packet.kind.message_type());
        writer.write_u8(packet.speaker);
        writer.write_sized_string(packet.message);
        match packet.kind {
            NpcDialogueType::Ok => {
                writer.write_u8(0);
                writer.write_u8(0);
            }
            NpcDialogueType::Next => {
                writer.write_u8(0);
                writer.write_u8(1);
            }
            NpcDialogueType::PrevNext => {
                writer.write_u8(1);
                writer.write_u8(1);
            }
            NpcDialogueType::Prev => {
                writer.write_u8(1);
                writer.write_u8(0);
            }
            _ => {}
        }
        writer.into()
    }
}

pub struct PacketSpawnMonster {
    pub object_id: u32,
    pub monster_id: u32,
    pub x: i16,
    pub y: i16,
    pub foothold: u16,
    pub newly_spawned: bool,
}

impl From<&PacketSpawnMonster> for Packet {
    fn from(packet: &PacketSpawnMonster) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::SpawnMonster as u16, 42);
        writer.write_u32(packet.object_id);
        writer.write_u8(5); // No controller
        writer.write_u32(packet.monster_id);
        writer.write_zero(16); // Status effects
        writer.write_i16(packet.x);
        writer.write_i16(packet.y);
        writer.write_u8(5); // Stance
        writer.write_i16(0); // Origin foothold
        writer.write_u16(packet.foothold);
        writer.write_i8(if packet.newly_spawned { -2 } else { -1 });
        writer.write_i8(-1); // Team
        writer.write_u32(0);
        writer.into()
    }
}

pub struct PacketSpawnMonsterController {
    pub object_id: u32,
    pub aggressive: bool,
    pub monster_id: u32,
    pub x: i16,
    pub y: i16,
    pub foothold: u16,
    pub newly_spawned: bool,
}

impl From<&PacketSpawnMonsterController> for Packet {
    fn from(packet: &PacketSpawnMonsterController) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::SpawnMonsterController as u16, 43);
        writer.write_u8(if packet.aggressive { 2 } else { 1 });
        writer.write_u32(packet.object_id);
        writer.write_u8(1); // Has controller
        writer.write_u32(packet.monster_id);
        writer.write_zero(16); // Status effects
        writer.write_i16(packet.x);
        writer.write_i16(packet.y);
        writer.write_u8(5); // Stance
        writer.write_i16(0); // Origin foothold
        writer.write_u16(packet.foothold);
        writer.write_i8(if packet.newly_spawned { -2 } else { -1 });
        writer.write_i8(-1); // Team
        writer.write_u32(0);
        writer.into()
    }
}

pub struct PacketRemoveMonsterController {
    pub object_id: u32,
}

impl From<&PacketRemoveMonsterController> for Packet {
    fn from(packet: &PacketRemoveMonsterController) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::SpawnMonsterController as u16, 5);
        writer.write_u8(0);
        writer.write_u32(packet.object_id);
        writer.into()
    }
}

pub struct PacketKillMonster {
    pub object_id: u32,
    pub animation: bool,
}

impl From<&PacketKillMonster> for Packet {
    fn from(packet: &PacketKillMonster) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::KillMonster as u16, 6);
        writer.write_u32(packet.object_id);
        writer.write_bool(packet.animation);
        writer.write_bool(packet.animation);
        writer.into()
    }
}

/// Mob movement trailers are opaque to the server and relayed as-is.
pub struct PacketMoveMonster<'a> {
    pub object_id: u32,
    pub activity: u8,
    pub movement: &'a [u8],
}

impl From<&PacketMoveMonster<'_>> for Packet {
    fn from(packet: &PacketMoveMonster) -> Self {
        let mut writer = PacketWriter::with_max(
            ServerPackets::MoveMonster as u16,
            11 + packet.movement.len(),
        );
        writer.write_u32(packet.object_id);
        writer.write_u8(0);
        writer.write_u8(0);
        writer.write_u8(packet.activity);
        writer.write_u8(0);
        writer.write_u8(0);
        writer.write_u16(0);
        writer.write_bytes(packet.movement);
        writer.into()
    }
}

pub struct PacketMoveMonsterResponse {
    pub object_id: u32,
    pub move_id: u16,
}

impl From<&PacketMoveMonsterResponse> for Packet {
    fn from(packet: &PacketMoveMonsterResponse) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::MoveMonsterResponse as u16, 11);
        writer.write_u32(packet.object_id);
        writer.write_u16(packet.move_id);
        writer.write_bool(false);
        writer.write_i16(5); // MP gain
        writer.write_u8(0);
        writer.write_u8(0);
        writer.into()
    }
}

pub struct PacketMonsterHp {
    pub object_id: u32,
    pub hp_percent: u8,
}

impl From<&PacketMonsterHp> for Packet {
    fn from(packet: &PacketMonsterHp) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::MonsterHp as u16, 5);
        writer.write_u32(packet.object_id);
        writer.write_u8(packet.hp_percent);
        writer.into()
    }
}

const ATTACK_COUNT_MAX: u8 = 15;

pub struct AttackTarget {
    pub object_id: u32,
    pub damage: Vec<i32>,
}

pub struct PacketCloseRangeAttack<'a> {
    pub id: u32,
    pub skill: u8,
    pub skill_level: u8,
    pub hit_count: u8,
    pub targets: &'a [AttackTarget],
    pub display: u8,
    pub direction: u8,
    pub stance: u8,
    pub speed: u8,
}

impl PacketCloseRangeAttack<'_> {
    pub fn max_length(&self) -> usize {
        15 + self.targets.len() * (5 + ATTACK_COUNT_MAX as usize * 4)
    }
}

impl From<&PacketCloseRangeAttack<'_>> for Packet {
    fn from(packet: &PacketCloseRangeAttack) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::CloseRangeAttack as u16, packet.max_length());
        let monster_count = (packet.targets.len() as u8).min(ATTACK_COUNT_MAX);
        let hit_count = packet.hit_count.min(ATTACK_COUNT_MAX);

        writer.write_u32(packet.id);
        writer.write_u8((monster_count << 4) | hit_count);
        writer.write_u8(0x5B);
        writer.write_u8(packet.skill_level);
        if packet.skill_level > 0 {
            writer.write_u8(packet.skill);
        }
        writer.write_u8(packet.display);
        writer.write_u8(packet.direction);
        writer.write_u8(packet.stance);
        writer.write_u8(packet.speed);
        writer.write_u8(0x0A);
        writer.write_u32(0); // Projectile id

        for target in packet.targets.iter().take(monster_count as usize) {
            writer.write_u32(target.object_id);
            writer.write_u8(0);
            for hit in 0..hit_count as usize {
                writer.write_i32(target.damage.get(hit).copied().unwrap_or(0));
            }
        }

        writer.into()
    }
}

pub struct PacketRangedAttack<'a> {
    pub id: u32,
    pub skill: u32,
    pub skill_level: u8,
    pub hit_count: u8,
    pub targets: &'a [AttackTarget],
    pub display: u8,
    pub direction: u8,
    pub stance: u8,
    pub speed: u8,
    pub projectile: u32,
}

impl PacketRangedAttack<'_> {
    pub fn max_length(&self) -> usize {
        22 + self.targets.len() * (5 + ATTACK_COUNT_MAX as usize * 4)
    }
}

impl From<&PacketRangedAttack<'_>> for Packet {
    fn from(packet: &PacketRangedAttack) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::RangedAttack as u16, packet.max_length());
        let monster_count = (packet.targets.len() as u8).min(ATTACK_COUNT_MAX);
        let hit_count = packet.hit_count.min(ATTACK_COUNT_MAX);

        writer.write_u32(packet.id);
        writer.write_u8((monster_count << 4) | hit_count);
        writer.write_u8(0x5B);
        writer.write_u8(packet.skill_level);
        if packet.skill_level > 0 {
            writer.write_u32(packet.skill);
        }
        writer.write_u8(packet.display);
        writer.write_u8(packet.direction);
        writer.write_u8(packet.stance);
        writer.write_u8(packet.speed);
        writer.write_u8(0x0A);
        writer.write_u32(packet.projectile);

        for target in packet.targets.iter().take(monster_count as usize) {
            writer.write_u32(target.object_id);
            writer.write_u8(0);
            for hit in 0..hit_count as usize {
                writer.write_i32(target.damage.get(hit).copied().unwrap_or(0));
            }
        }

        writer.write_u32(0);
        writer.into()
    }
}

pub struct PacketSpawnReactor {
    pub object_id: u32,
    pub reactor_id: u32,
    pub x: i16,
    pub y: i16,
    pub state: u8,
}

impl From<&PacketSpawnReactor> for Packet {
    fn from(packet: &PacketSpawnReactor) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::SpawnReactor as u16, 16);
        writer.write_u32(packet.object_id);
        writer.write_u32(packet.reactor_id);
        writer.write_u8(packet.state);
        writer.write_i16(packet.x);
        writer.write_i16(packet.y);
        writer.write_u8(0);
        writer.write_u16(0);
        writer.into()
    }
}

pub struct PacketChangeReactorState {
    pub object_id: u32,
    pub state: u8,
    pub x: i16,
    pub y: i16,
    pub stance: u8,
}

impl From<&PacketChangeReactorState> for Packet {
    fn from(packet: &PacketChangeReactorState) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ChangeReactorState as u16, 13);
        writer.write_u32(packet.object_id);
        writer.write_u8(packet.state);
        writer.write_i16(packet.x);
        writer.write_i16(packet.y);
        writer.write_u8(packet.stance);
        writer.write_u16(0);
        writer.write_u8(5);
        writer.into()
    }
}

pub struct PacketDestroyReactor {
    pub object_id: u32,
    pub state: u8,
    pub x: i16,
    pub y: i16,
}

impl From<&PacketDestroyReactor> for Packet {
    fn from(packet: &PacketDestroyReactor) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::DestroyReactor as u16, 9);
        writer.write_u32(packet.object_id);
        writer.write_u8(packet.state);
        writer.write_i16(packet.x);
        writer.write_i16(packet.y);
        writer.into()
    }
}

/// What a drop object carries. The wire distinguishes mesos from items with a
/// boolean immediately after the drop meta.
#[derive(Clone, Copy, Debug)]
pub enum DropContent {
    Item(u32),
    Mesos(i32),
}

impl DropContent {
    fn write(self, writer: &mut PacketWriter) {
        match self {
            DropContent::Item(item_id) => {
                writer.write_bool(false);
                writer.write_u32(item_id);
            }
            DropContent::Mesos(amount) => {
                writer.write_bool(true);
                writer.write_i32(amount);
            }
        }
    }

    fn is_item(self) -> bool {
        matches!(self, DropContent::Item(_))
    }
}

/// Mode 1 of opcode 0x010C: a fresh drop animating from its source object.
pub struct PacketDropFromObject {
    pub object_id: u32,
    pub content: DropContent,
    pub owner_id: u32,
    pub from_x: i16,
    pub from_y: i16,
    pub to_x: i16,
    pub to_y: i16,
    pub dropper_object_id: u32,
    pub player_drop: bool,
}

impl From<&PacketDropFromObject> for Packet {
    fn from(packet: &PacketDropFromObject) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::DropEnterMap as u16, 38);
        writer.write_u8(1);
        writer.write_u32(packet.object_id);
        packet.content.write(&mut writer);
        writer.write_u32(packet.owner_id);
        writer.write_u8(2); // Free for all
        writer.write_i16(packet.to_x);
        writer.write_i16(packet.to_y);
        writer.write_u32(packet.dropper_object_id);
        writer.write_i16(packet.from_x);
        writer.write_i16(packet.from_y);
        writer.write_u16(0);
        if packet.content.is_item() {
            writer.write_u64(DEFAULT_TIME);
        }
        writer.write_bool(!packet.player_drop);
        writer.into()
    }
}

/// Mode 2 of opcode 0x010C: a drop that already rests on the ground.
pub struct PacketSpawnDrop {
    pub object_id: u32,
    pub content: DropContent,
    pub owner_id: u32,
    pub x: i16,
    pub y: i16,
    pub dropper_object_id: u32,
    pub player_drop: bool,
}

impl From<&PacketSpawnDrop> for Packet {
    fn from(packet: &PacketSpawnDrop) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::DropEnterMap as u16, 32);
        writer.write_u8(2);
        writer.write_u32(packet.object_id);
        packet.content.write(&mut writer);
        writer.write_u32(packet.owner_id);
        writer.write_u8(2); // Free for all
        writer.write_i16(packet.x);
        writer.write_i16(packet.y);
        writer.write_u32(packet.dropper_object_id);
        if packet.content.is_item() {
            writer.write_u64(DEFAULT_TIME);
        }
        writer.write_bool(!packet.player_drop);
        writer.into()
    }
}

pub struct PacketRemoveDrop {
    pub object_id: u32,
}

impl From<&PacketRemoveDrop> for Packet {
    fn from(packet: &PacketRemoveDrop) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::DropLeaveMap as u16, 5);
        writer.write_u8(0); // 1 skips the vanish animation
        writer.write_u32(packet.object_id);
        writer.into()
    }
}

pub struct PacketPickupDrop {
    pub object_id: u32,
    pub exploding: bool,
    pub character_id: u32,
}

impl From<&PacketPickupDrop> for Packet {
    fn from(packet: &PacketPickupDrop) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::DropLeaveMap as u16, 9);
        writer.write_u8(if packet.exploding { 4 } else { 2 });
        writer.write_u32(packet.object_id);
        writer.write_u32(packet.character_id);
        writer.into()
    }
}

pub struct PacketPetPickupDrop {
    pub object_id: u32,
    pub exploding: bool,
    pub character_id: u32,
    pub pet: u8,
}

impl From<&PacketPetPickupDrop> for Packet {
    fn from(packet: &PacketPetPickupDrop) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::DropLeaveMap as u16, 10);
        writer.write_u8(if packet.exploding { 4 } else { 2 });
        writer.write_u32(packet.object_id);
        writer.write_u32(packet.character_id);
        writer.write_u8(packet.pet);
        writer.into()
    }
}

pub struct PacketStartQuest {
    pub quest_id: u16,
    pub npc_id: u32,
}

impl From<&PacketStartQuest> for Packet {
    fn from(packet: &PacketStartQuest) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::QuestAction as u16, 11);
        writer.write_u8(8);
        writer.write_u16(packet.quest_id);
        writer.write_u32(packet.npc_id);
        writer.write_u32(0);
        writer.into()
    }
}

pub struct PacketEndQuest {
    pub quest_id: u16,
    pub npc_id: u32,
    pub next_quest: u16,
}

impl From<&PacketEndQuest> for Packet {
    fn from(packet: &PacketEndQuest) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::QuestAction as u16, 9);
        writer.write_u8(8);
        writer.write_u16(packet.quest_id);
        writer.write_u32(packet.npc_id);
        writer.write_u16(packet.next_quest);
        writer.into()
    }
}

pub struct PacketUpdateQuest<'a> {
    pub quest_id: u16,
    pub progress: &'a str,
}

impl From<&PacketUpdateQuest<'_>> for Packet {
    fn from(packet: &PacketUpdateQuest) -> Self {
        let mut writer = PacketWriter::with_max(
            ServerPackets::ShowStatusInfo as u16,
            11 + packet.progress.len(),
        );
        writer.write_u8(1);
        writer.write_u16(packet.quest_id);
        writer.write_u8(1);
        writer.write_sized_string(packet.progress);
        writer.write_zero(5);
        writer.into()
    }
}

pub struct PacketQuestCompletionTime {
    pub quest_id: u16,
    /// Unix seconds; the local offset in effect at that instant is folded in.
    pub completed_at: i64,
}

impl From<&PacketQuestCompletionTime> for Packet {
    fn from(packet: &PacketQuestCompletionTime) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShowStatusInfo as u16, 12);
        writer.write_u8(1);
        writer.write_u16(packet.quest_id);
        writer.write_u8(2);
        writer.write_u64(filetime_from_unix(packet.completed_at));
        writer.into()
    }
}

pub struct PacketForfeitQuest {
    pub quest_id: u16,
}

impl From<&PacketForfeitQuest> for Packet {
    fn from(packet: &PacketForfeitQuest) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShowStatusInfo as u16, 4);
        writer.write_u8(1);
        writer.write_u16(packet.quest_id);
        writer.write_u8(0);
        writer.into()
    }
}

pub struct PacketOpenShop<'a> {
    pub npc_id: u32,
    pub items: &'a [NpcShopItem],
    pub item_db: &'a ItemDatabase,
}

impl PacketOpenShop<'_> {
    pub fn max_length(&self) -> usize {
        6 + self.items.len() * 30
    }
}

impl From<&PacketOpenShop<'_>> for Packet {
    fn from(packet: &PacketOpenShop) -> Self {
        let mut writer =
            PacketWriter::with_max(ServerPackets::OpenShop as u16, packet.max_length());
        writer.write_u32(packet.npc_id);
        writer.write_u16(packet.items.len() as u16);

        for item in packet.items {
            writer.write_u32(item.item_id);
            writer.write_i32(item.price);
            writer.write_u32(0);
            writer.write_u32(0);
            writer.write_u32(0);
            if !is_rechargeable(item.item_id) {
                writer.write_u16(1);
                writer.write_u16(1000); // Max buyable stack size
            } else {
                let info = packet.item_db.get_item_info(item.item_id);
                let unit_price = info.map_or(0.0, |info| info.unit_price);
                let slot_max = info.map_or(100, |info| info.slot_max);
                writer.write_u16(0);
                writer.write_u32(0);
                // The client reads the unit price as the high 16 bits of the
                // IEEE-754 representation.
                writer.write_u16((unit_price.to_bits() >> 48) as u16);
                writer.write_u16(slot_max);
            }
        }

        writer.into()
    }
}

pub struct PacketShopActionResponse {
    pub code: u8,
}

impl From<&PacketShopActionResponse> for Packet {
    fn from(packet: &PacketShopActionResponse) -> Self {
        let mut writer = PacketWriter::with_max(ServerPackets::ShopActionResponse as u16, 1);
        writer.write_u8(packet.code);
        writer.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_data::ItemInfo;
    use orbis_game_common::components::{
        compact_equip_slot, equip_slot, ActiveQuest, EquipmentItem, QuestProgress, StackableItem,
    };

    #[test]
    fn shop_normal_item_golden_vector() {
        let item_db = ItemDatabase::with_items(Vec::new());
        let items = [NpcShopItem {
            item_id: 2000000,
            price: 50,
        }];
        let packet = Packet::from(&PacketOpenShop {
            npc_id: 9000001,
            items: &items,
            item_db: &item_db,
        });
        let bytes = packet.to_vec();

        assert_eq!(&bytes[..2], &[0x31, 0x01]);
        let record = &bytes[8..];
        assert_eq!(
            record,
            &[
                0x80, 0x84, 0x1E, 0x00, // id 2000000
                0x32, 0x00, 0x00, 0x00, // price 50
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x01, 0x00, // quantity marker
                0xE8, 0x03, // stack size 1000
            ]
        );
    }

    #[test]
    fn shop_ammo_item_packs_unit_price_bits() {
        let item_db = ItemDatabase::with_items(vec![ItemInfo {
            id: 2070000,
            price: 10,
            unit_price: 3.0,
            slot_max: 100,
        }]);
        let items = [NpcShopItem {
            item_id: 2070000,
            price: 10,
        }];
        let packet = Packet::from(&PacketOpenShop {
            npc_id: 9000001,
            items: &items,
            item_db: &item_db,
        });
        let bytes = packet.to_vec();
        let tail = &bytes[bytes.len() - 10..];
        assert_eq!(
            tail,
            &[
                0x00, 0x00, // not a plain stackable
                0x00, 0x00, 0x00, 0x00, //
                0x08, 0x40, // high 16 bits of 3.0f64
                0x64, 0x00, // slot max 100
            ]
        );
    }

    #[test]
    fn dialogue_trailing_buttons() {
        let prev_next = Packet::from(&PacketNpcDialogue {
            npc_id: 9000001,
            kind: NpcDialogueType::PrevNext,
            message: "Hi",
            speaker: 0,
        });
        let bytes = prev_next.to_vec();
        assert_eq!(&bytes[bytes.len() - 2..], &[0x01, 0x01]);

        let ok = Packet::from(&PacketNpcDialogue {
            npc_id: 9000001,
            kind: NpcDialogueType::Ok,
            message: "Hi",
            speaker: 0,
        });
        let bytes = ok.to_vec();
        assert_eq!(&bytes[bytes.len() - 2..], &[0x00, 0x00]);
        // NEXT/PREV family is transmitted as message type 0.
        let bytes = prev_next.to_vec();
        assert_eq!(bytes[7], 0);
    }

    #[test]
    fn attack_nibbles_saturate_at_fifteen() {
        let targets: Vec<AttackTarget> = (0..20)
            .map(|i| AttackTarget {
                object_id: i,
                damage: vec![1; 20],
            })
            .collect();
        let packet = Packet::from(&PacketCloseRangeAttack {
            id: 1,
            skill: 0,
            skill_level: 0,
            hit_count: 20,
            targets: &targets,
            display: 0,
            direction: 0,
            stance: 0,
            speed: 4,
        });
        let bytes = packet.to_vec();
        assert_eq!(bytes[6], 0xFF);
        // 15 monsters, each 5 bytes of header plus 15 hits of 4 bytes.
        assert_eq!(bytes.len(), 2 + 16 + 15 * (5 + 60));
    }

    #[test]
    fn ranged_attack_widens_skill_field() {
        let targets = [AttackTarget {
            object_id: 10,
            damage: vec![100],
        }];
        let close = Packet::from(&PacketCloseRangeAttack {
            id: 1,
            skill: 7,
            skill_level: 1,
            hit_count: 1,
            targets: &targets,
            display: 0,
            direction: 0,
            stance: 0,
            speed: 4,
        });
        let ranged = Packet::from(&PacketRangedAttack {
            id: 1,
            skill: 7,
            skill_level: 1,
            hit_count: 1,
            targets: &targets,
            display: 0,
            direction: 0,
            stance: 0,
            speed: 4,
            projectile: 2060000,
        });
        // u8 vs u32 skill field, plus the ranged trailing u32.
        assert_eq!(ranged.data.len(), close.data.len() + 3 + 4);
    }

    #[test]
    fn stat_change_orders_fields_and_bundles_pet_mask() {
        let packet = Packet::from(&PacketStatChange {
            enable_actions: true,
            updates: &[
                StatUpdate::Meso(1000),
                StatUpdate::Pet(0),
                StatUpdate::Level(30),
            ],
        });
        let bytes = packet.to_vec();
        assert_eq!(bytes[2], 1);
        let mask = u32::from_le_bytes([bytes[3], bytes[4], bytes[5], bytes[6]]);
        assert_eq!(mask, 0x40000 | 0x180008 | 0x10);
        // Level (u8) precedes meso (i32) precedes pet (u32).
        assert_eq!(bytes[7], 30);
        assert_eq!(
            i32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            1000
        );
        assert_eq!(bytes.len(), 2 + 1 + 4 + 1 + 4 + 4);
    }

    #[test]
    fn move_modify_writes_equip_direction_byte() {
        let updates = [InventoryModify::Move {
            inventory: orbis_game_common::components::InventoryType::Equipment,
            slot: -11,
            destination: 1,
        }];
        let packet = Packet::from(&PacketModifyInventory { updates: &updates });
        let bytes = packet.to_vec();
        // mode, inventory, slot, destination, then the unequip marker.
        assert_eq!(bytes[bytes.len() - 1], 1);

        let updates = [InventoryModify::Remove {
            inventory: orbis_game_common::components::InventoryType::Use,
            slot: 3,
        }];
        let packet = Packet::from(&PacketModifyInventory { updates: &updates });
        // Positive slots carry no extra byte.
        assert_eq!(packet.data.len(), 2 + 4);
    }

    #[test]
    fn meso_drop_sets_meso_flag() {
        let packet = Packet::from(&PacketSpawnDrop {
            object_id: 500,
            content: DropContent::Mesos(765),
            owner_id: 1,
            x: 100,
            y: -20,
            dropper_object_id: 0,
            player_drop: false,
        });
        let bytes = packet.to_vec();
        assert_eq!(bytes[2], 2); // spawn-existing mode
        assert_eq!(bytes[7], 1); // meso flag
        assert_eq!(
            i32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            765
        );
        // Mesos have no expiration time: mode + oid + flag + amount + owner +
        // type + position + dropper + source flag.
        assert_eq!(packet.data.len(), 1 + 4 + 1 + 4 + 4 + 1 + 2 + 2 + 4 + 1);
    }

    #[test]
    fn item_drop_from_object_keeps_source_coords() {
        let packet = Packet::from(&PacketDropFromObject {
            object_id: 500,
            content: DropContent::Item(4000000),
            owner_id: 1,
            from_x: 10,
            from_y: 20,
            to_x: 30,
            to_y: 40,
            dropper_object_id: 77,
            player_drop: true,
        });
        let bytes = packet.to_vec();
        assert_eq!(bytes[2], 1); // drop-from-object mode
        assert_eq!(bytes[7], 0); // item flag
        // Source coordinates plus foothold pad plus expiration are present.
        assert_eq!(
            packet.data.len(),
            1 + 4 + 1 + 4 + 4 + 1 + 2 + 2 + 4 + 2 + 2 + 2 + 8 + 1
        );
        // Player drops invert the trailing source flag.
        assert_eq!(bytes[bytes.len() - 1], 0);
    }

    fn populated_character() -> Character {
        let mut character = Character::new(30000, 1, "Hero".to_string());
        character
            .equipped
            .set(compact_equip_slot(equip_slot::WEAPON), {
                let mut item = EquipmentItem::new(1302000);
                item.attack = 17;
                Some(item)
            });
        character
            .equipment_inventory
            .try_add(EquipmentItem::new(1002000))
            .unwrap();
        for kind in [InventoryKind::Use, InventoryKind::Setup, InventoryKind::Etc] {
            character.inventories[kind]
                .try_add(StackableItem::new(
                    match kind {
                        InventoryKind::Use => 2000000,
                        InventoryKind::Setup => 3010000,
                        _ => 4000000,
                    },
                    30,
                ))
                .unwrap();
        }
        character.skills.set(1001005, 3, 0);
        let mut quest = ActiveQuest::new(2000);
        quest.progress.push(QuestProgress {
            target_id: 100100,
            amount: 2,
        });
        character.quest_log.start(quest);
        character.quest_log.set_info(7050, "scratch".to_string());
        let mut done = ActiveQuest::new(2010);
        done.progress.push(QuestProgress {
            target_id: 100101,
            amount: 1,
        });
        character.quest_log.start(done);
        character.quest_log.complete(2010, 1_600_000_000);
        character.monster_book.record(100100);
        character
    }

    #[test]
    fn enter_map_fits_declared_maximum_and_ends_with_timestamp() {
        let character = populated_character();
        let enter_map = PacketEnterMap {
            channel: 0,
            character: &character,
        };
        let max = enter_map.max_length();
        let packet = Packet::from(&enter_map);
        assert!(packet.data.len() <= max);

        // Trailing current-time FILETIME sits between the two sentinels.
        let data = &packet.data[..];
        let tail = u64::from_le_bytes(data[data.len() - 8..].try_into().unwrap());
        assert!(tail > ZERO_TIME);
        assert!(tail < DEFAULT_TIME);
    }

    #[test]
    fn enter_map_capacity_bytes_precede_zero_time() {
        let character = populated_character();
        let packet = Packet::from(&PacketEnterMap {
            channel: 0,
            character: &character,
        });
        let data = &packet.data[..];
        // After the 29-byte meta header and the stats block come buddy
        // capacity, linked name, mesos and the five capacity bytes.
        let offset = 29 + CHAR_STATS_BLOCK_LEN + 1 + 1 + 4;
        assert_eq!(data[offset], 24); // equipment tab
        assert_eq!(data[offset + 4], 252); // cash cap
        let zero_time =
            u64::from_le_bytes(data[offset + 5..offset + 13].try_into().unwrap());
        assert_eq!(zero_time, ZERO_TIME);
    }

    #[test]
    fn change_map_is_fixed_length() {
        let packet = Packet::from(&PacketChangeMap {
            map: 100000000,
            portal: 0,
            hp: 500,
        });
        assert_eq!(packet.data.len(), 25);
    }

    #[test]
    fn exp_gain_in_chat_adds_one_byte() {
        let inline = Packet::from(&PacketExpGain {
            exp: 100,
            equip_bonus: 0,
            party_bonus: 0,
            white: true,
            in_chat: false,
        });
        let in_chat = Packet::from(&PacketExpGain {
            exp: 100,
            equip_bonus: 0,
            party_bonus: 0,
            white: true,
            in_chat: true,
        });
        assert_eq!(in_chat.data.len(), inline.data.len() + 1);
    }

    #[test]
    fn keymap_is_fixed_length() {
        let keymap = KeyMap::default();
        let packet = Packet::from(&PacketKeymap { keymap: &keymap });
        assert_eq!(packet.data.len(), 1 + KEYMAP_KEY_COUNT * 5);
    }

    #[test]
    fn damage_player_special_cases_self_damage() {
        let normal = Packet::from(&PacketDamagePlayer {
            skill: 0,
            monster_id: 100100,
            character_id: 30000,
            damage: 120,
            fake: 0,
            direction: 1,
        });
        assert_eq!(normal.data.len(), 4 + 1 + 4 + 4 + 1 + 2 + 4);

        let map_damage = Packet::from(&PacketDamagePlayer {
            skill: -4,
            monster_id: 0,
            character_id: 30000,
            damage: 120,
            fake: 0,
            direction: 0,
        });
        assert_eq!(map_damage.data.len(), 4 + 1 + 4 + 4);
    }

    #[test]
    fn spawn_packets_are_fixed_length() {
        assert_eq!(
            Packet::from(&PacketSpawnNpc {
                object_id: 1,
                npc_id: 9000001,
                x: 10,
                cy: 20,
                flipped: false,
                foothold: 7,
                rx0: -50,
                rx1: 50,
            })
            .data
            .len(),
            20
        );
        assert_eq!(
            Packet::from(&PacketSpawnNpcController {
                object_id: 1,
                npc_id: 9000001,
                x: 10,
                cy: 20,
                flipped: true,
                foothold: 7,
                rx0: -50,
                rx1: 50,
            })
            .data
            .len(),
            21
        );
        assert_eq!(
            Packet::from(&PacketSpawnMonster {
                object_id: 2,
                monster_id: 100100,
                x: 0,
                y: 0,
                foothold: 7,
                newly_spawned: true,
            })
            .data
            .len(),
            40
        );
        assert_eq!(
            Packet::from(&PacketSpawnMonsterController {
                object_id: 2,
                aggressive: false,
                monster_id: 100100,
                x: 0,
                y: 0,
                foothold: 7,
                newly_spawned: false,
            })
            .data
            .len(),
            41
        );
        assert_eq!(
            Packet::from(&PacketRemoveMonsterController { object_id: 2 })
                .data
                .len(),
            5
        );
    }

    #[test]
    fn mob_lifecycle_packets_are_fixed_length() {
        assert_eq!(
            Packet::from(&PacketKillMonster {
                object_id: 2,
                animation: true,
            })
            .data
            .len(),
            6
        );
        assert_eq!(
            Packet::from(&PacketMoveMonsterResponse {
                object_id: 2,
                move_id: 9,
            })
            .data
            .len(),
            11
        );
        assert_eq!(
            Packet::from(&PacketMonsterHp {
                object_id: 2,
                hp_percent: 50,
            })
            .data
            .len(),
            5
        );
        // Movement trailers relay verbatim behind the fixed header.
        let movement = [1u8, 2, 3, 4];
        assert_eq!(
            Packet::from(&PacketMoveMonster {
                object_id: 2,
                activity: 1,
                movement: &movement,
            })
            .data
            .len(),
            11 + movement.len()
        );
    }

    #[test]
    fn pickup_and_removal_packets_are_fixed_length() {
        assert_eq!(
            Packet::from(&PacketRemoveDrop { object_id: 7 }).data.len(),
            5
        );
        assert_eq!(
            Packet::from(&PacketPickupDrop {
                object_id: 7,
                exploding: false,
                character_id: 30000,
            })
            .data
            .len(),
            9
        );
        let pet = Packet::from(&PacketPetPickupDrop {
            object_id: 7,
            exploding: true,
            character_id: 30000,
            pet: 0,
        });
        assert_eq!(pet.data.len(), 10);
        assert_eq!(pet.data[0], 4);
    }

    #[test]
    fn status_info_notifications_are_fixed_length() {
        assert_eq!(
            Packet::from(&PacketItemGain {
                item_id: 4000000,
                amount: 1,
            })
            .data
            .len(),
            18
        );
        assert_eq!(Packet::from(&PacketItemUnavailable).data.len(), 10);
        assert_eq!(Packet::from(&PacketInventoryFull).data.len(), 10);
        assert_eq!(
            Packet::from(&PacketMesoGain {
                amount: 100,
                in_chat: false,
            })
            .data
            .len(),
            9
        );
        assert_eq!(
            Packet::from(&PacketMesoGain {
                amount: 100,
                in_chat: true,
            })
            .data
            .len(),
            7
        );
    }

    #[test]
    fn quest_flow_layouts() {
        assert_eq!(
            Packet::from(&PacketStartQuest {
                quest_id: 2000,
                npc_id: 9000001,
            })
            .data
            .len(),
            11
        );
        assert_eq!(
            Packet::from(&PacketEndQuest {
                quest_id: 2000,
                npc_id: 9000001,
                next_quest: 2001,
            })
            .data
            .len(),
            9
        );
        assert_eq!(
            Packet::from(&PacketForfeitQuest { quest_id: 2000 }).data.len(),
            4
        );

        let update = Packet::from(&PacketUpdateQuest {
            quest_id: 2000,
            progress: "007",
        });
        // Mode byte, quest id, record type, sized string, 5-byte pad.
        assert_eq!(update.data.len(), 1 + 2 + 1 + 2 + 3 + 5);

        let completion = Packet::from(&PacketQuestCompletionTime {
            quest_id: 2000,
            completed_at: 1_600_000_000,
        });
        assert_eq!(completion.data.len(), 12);
        let stamp = u64::from_le_bytes(completion.data[4..12].try_into().unwrap());
        assert!(stamp > ZERO_TIME);
    }

    #[test]
    fn misc_packets_are_fixed_length() {
        assert_eq!(
            Packet::from(&PacketSetGender {
                gender: CharacterGender::Female,
            })
            .data
            .len(),
            1
        );
        assert_eq!(
            Packet::from(&PacketUpdateSkill {
                skill_id: 1001005,
                level: 3,
                master_level: 0,
            })
            .data
            .len(),
            24
        );
        assert_eq!(
            Packet::from(&PacketShowForeignEffect { id: 30000, effect: 8 })
                .data
                .len(),
            5
        );
        assert_eq!(
            Packet::from(&PacketPopupMessage { message: "Welcome" })
                .data
                .len(),
            1 + 2 + 7
        );
        let action = [0x12u8, 0x34];
        assert_eq!(
            Packet::from(&PacketNpcAction { data: &action }).data.len(),
            2
        );
    }
}
