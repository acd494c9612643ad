use orbis_game_common::components::{
    compact_equip_slot, equip_slot, expand_equip_slot, is_rechargeable, CharacterAppearance,
    CharacterStats, EquipmentItem, StackableItem, CHARACTER_MAX_NAME_LENGTH,
    EQUIP_SLOT_COUNT, EQUIP_SLOT_NON_COSMETIC_COUNT,
};
use orbis_game_common::data::Job;
use orbis_network_common::{PacketError, PacketReader, PacketWriter, DEFAULT_TIME, ZERO_TIME};

/// The character-stats block is fixed width: id, 13-byte name field, looks,
/// three pet placeholders, level/job, ten stat words, exp/fame/gacha and the
/// location trailer.
pub const CHAR_STATS_BLOCK_LEN: usize = 93;

/// Appearance block, fully equipped on every slot.
pub const CHAR_APPEARANCE_MAX_LEN: usize = 11 + EQUIP_SLOT_COUNT * 5 + 2 + 4 + 12;

/// Equipment wire sub-record, excluding the slot index (whose width differs
/// between the packets that embed it).
pub const EQUIPMENT_RECORD_MAX_LEN: usize =
    1 + 4 + 1 + 8 + 1 + 1 + 30 + (2 + CHARACTER_MAX_NAME_LENGTH) + 2 + 18 + 8 + 4;

/// Stackable wire sub-record, excluding the slot index.
pub const STACKABLE_RECORD_MAX_LEN: usize = 1 + 4 + 1 + 8 + 2 + (2 + CHARACTER_MAX_NAME_LENGTH) + 2 + 8;

pub trait PacketWriteCharacter {
    fn write_char_appearance(&mut self, appearance: &CharacterAppearance, mega: bool);
    fn write_char_stats(&mut self, stats: &CharacterStats);
}

pub trait PacketReadCharacter {
    fn read_char_stats(&mut self) -> Result<CharacterStats, PacketError>;
}

pub trait PacketWriteItems {
    fn write_equipment_record(&mut self, equipment: &EquipmentItem);
    fn write_stackable_record(&mut self, item: &StackableItem);
}

pub trait PacketReadItems {
    fn read_equipment_record(&mut self) -> Result<EquipmentItem, PacketError>;
}

impl PacketWriteCharacter for PacketWriter {
    fn write_char_appearance(&mut self, appearance: &CharacterAppearance, mega: bool) {
        let equipped = |compact: usize| -> Option<u32> {
            appearance.equipment_ids.get(compact).copied().flatten()
        };

        self.write_u8(appearance.gender.into());
        self.write_u8(appearance.skin);
        self.write_u32(appearance.face);
        self.write_u8(if mega { 0 } else { 1 });
        self.write_u32(appearance.hair);

        for compact in 0..EQUIP_SLOT_NON_COSMETIC_COUNT {
            if let Some(id) = equipped(compact) {
                self.write_u8(expand_equip_slot(compact as u8));
                self.write_u32(id);
            }
        }
        self.write_u8(0xFF); // End of non-cosmetic equipment

        for compact in EQUIP_SLOT_NON_COSMETIC_COUNT..EQUIP_SLOT_COUNT {
            if let Some(id) = equipped(compact) {
                self.write_u8(expand_equip_slot(compact as u8));
                self.write_u32(id);
            }
        }
        self.write_u8(0xFF); // End of cosmetic equipment

        // Cosmetic weapon
        let cosmetic_weapon = compact_equip_slot(equip_slot::COSMETIC_WEAPON) as usize;
        self.write_u32(equipped(cosmetic_weapon).unwrap_or(0));

        // Pets
        self.write_u32(0);
        self.write_u32(0);
        self.write_u32(0);
    }

    fn write_char_stats(&mut self, stats: &CharacterStats) {
        let name = &stats.appearance.name;
        assert!(
            !name.is_empty() && name.len() <= CHARACTER_MAX_NAME_LENGTH,
            "character name must be 1..=12 bytes"
        );

        self.write_u32(stats.id);
        self.write_fixed_string(name, CHARACTER_MAX_NAME_LENGTH + 1);
        self.write_u8(stats.appearance.gender.into());
        self.write_u8(stats.appearance.skin);
        self.write_u32(stats.appearance.face);
        self.write_u32(stats.appearance.hair);

        // Pets
        self.write_u64(0);
        self.write_u64(0);
        self.write_u64(0);

        self.write_u8(stats.level);
        self.write_u16(stats.job.id());
        self.write_i16(stats.strength);
        self.write_i16(stats.dexterity);
        self.write_i16(stats.intelligence);
        self.write_i16(stats.luck);
        self.write_i16(stats.hp);
        self.write_i16(stats.max_hp);
        self.write_i16(stats.mp);
        self.write_i16(stats.max_mp);
        self.write_i16(stats.ap);
        self.write_i16(stats.sp);
        self.write_i32(stats.exp);
        self.write_i16(stats.fame);
        self.write_i32(stats.appearance.gacha_exp);
        self.write_u32(stats.appearance.map);
        self.write_u8(stats.appearance.spawn_point);
        self.write_u32(0);
    }
}

impl PacketReadCharacter for PacketReader<'_> {
    fn read_char_stats(&mut self) -> Result<CharacterStats, PacketError> {
        use num_traits::FromPrimitive;

        let id = self.read_u32()?;
        let name = self
            .read_fixed_length_utf8(CHARACTER_MAX_NAME_LENGTH + 1)?
            .to_string();
        let gender = match self.read_u8()? {
            0 => orbis_game_common::components::CharacterGender::Male,
            _ => orbis_game_common::components::CharacterGender::Female,
        };
        let skin = self.read_u8()?;
        let face = self.read_u32()?;
        let hair = self.read_u32()?;
        self.read_u64()?;
        self.read_u64()?;
        self.read_u64()?;
        let level = self.read_u8()?;
        let job = Job::from_u16(self.read_u16()?).ok_or(PacketError::InvalidPacket)?;
        let strength = self.read_i16()?;
        let dexterity = self.read_i16()?;
        let intelligence = self.read_i16()?;
        let luck = self.read_i16()?;
        let hp = self.read_i16()?;
        let max_hp = self.read_i16()?;
        let mp = self.read_i16()?;
        let max_mp = self.read_i16()?;
        let ap = self.read_i16()?;
        let sp = self.read_i16()?;
        let exp = self.read_i32()?;
        let fame = self.read_i16()?;
        let gacha_exp = self.read_i32()?;
        let map = self.read_u32()?;
        let spawn_point = self.read_u8()?;
        self.read_u32()?;

        Ok(CharacterStats {
            id,
            appearance: CharacterAppearance {
                name,
                gender,
                skin,
                face,
                hair,
                gacha_exp,
                map,
                spawn_point,
                equipment_ids: Vec::new(),
            },
            level,
            job,
            fame,
            strength,
            dexterity,
            intelligence,
            luck,
            max_hp,
            hp,
            max_mp,
            mp,
            ap,
            sp,
            exp,
        })
    }
}

impl PacketWriteItems for PacketWriter {
    fn write_equipment_record(&mut self, equipment: &EquipmentItem) {
        self.write_u8(1); // Item type
        self.write_u32(equipment.item_id);
        self.write_bool(equipment.cash);
        self.write_u64(DEFAULT_TIME);
        self.write_u8(equipment.upgrade_slots);
        self.write_u8(equipment.upgrade_level);
        self.write_i16(equipment.strength);
        self.write_i16(equipment.dexterity);
        self.write_i16(equipment.intelligence);
        self.write_i16(equipment.luck);
        self.write_i16(equipment.hp);
        self.write_i16(equipment.mp);
        self.write_i16(equipment.attack);
        self.write_i16(equipment.magic_attack);
        self.write_i16(equipment.defence);
        self.write_i16(equipment.magic_defence);
        self.write_i16(equipment.accuracy);
        self.write_i16(equipment.avoid);
        self.write_i16(equipment.hands);
        self.write_i16(equipment.speed);
        self.write_i16(equipment.jump);
        self.write_sized_string(&equipment.owner);
        self.write_u16(equipment.flags);
        if equipment.cash {
            self.write_bytes(&[0x40; 10]);
        } else {
            self.write_u8(0);
            self.write_u8(1); // Item level
            self.write_i32(0); // Item exp
            self.write_u32(0); // Vicious
            self.write_u64(0);
        }
        self.write_u64(ZERO_TIME);
        self.write_i32(-1);
    }

    fn write_stackable_record(&mut self, item: &StackableItem) {
        self.write_u8(2); // Item type
        self.write_u32(item.item_id);
        self.write_bool(false); // Is cash
        self.write_u64(DEFAULT_TIME);
        self.write_i16(item.quantity);
        self.write_sized_string(&item.owner);
        self.write_u16(item.flags);
        if is_rechargeable(item.item_id) {
            self.write_u32(2);
            self.write_bytes(&[0x54, 0x00, 0x00, 0x34]);
        }
    }
}

impl PacketReadItems for PacketReader<'_> {
    fn read_equipment_record(&mut self) -> Result<EquipmentItem, PacketError> {
        if self.read_u8()? != 1 {
            return Err(PacketError::InvalidPacket);
        }
        let item_id = self.read_u32()?;
        let cash = self.read_bool()?;
        self.read_u64()?;
        let upgrade_slots = self.read_u8()?;
        let upgrade_level = self.read_u8()?;
        let strength = self.read_i16()?;
        let dexterity = self.read_i16()?;
        let intelligence = self.read_i16()?;
        let luck = self.read_i16()?;
        let hp = self.read_i16()?;
        let mp = self.read_i16()?;
        let attack = self.read_i16()?;
        let magic_attack = self.read_i16()?;
        let defence = self.read_i16()?;
        let magic_defence = self.read_i16()?;
        let accuracy = self.read_i16()?;
        let avoid = self.read_i16()?;
        let hands = self.read_i16()?;
        let speed = self.read_i16()?;
        let jump = self.read_i16()?;
        let owner = self.read_sized_utf8()?.to_string();
        let flags = self.read_u16()?;
        if cash {
            self.read_fixed_length_bytes(10)?;
        } else {
            self.read_u8()?;
            self.read_u8()?;
            self.read_i32()?;
            self.read_u32()?;
            self.read_u64()?;
        }
        self.read_u64()?;
        self.read_i32()?;

        Ok(EquipmentItem {
            item_id,
            owner,
            flags,
            cash,
            upgrade_slots,
            upgrade_level,
            strength,
            dexterity,
            intelligence,
            luck,
            hp,
            mp,
            attack,
            magic_attack,
            defence,
            magic_defence,
            accuracy,
            avoid,
            hands,
            speed,
            jump,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_game_common::components::CharacterGender;
    use orbis_network_common::Packet;

    fn stats_fixture(name: &str) -> CharacterStats {
        CharacterStats {
            id: 123,
            appearance: CharacterAppearance {
                name: name.to_string(),
                gender: CharacterGender::Female,
                skin: 2,
                face: 20001,
                hair: 30027,
                gacha_exp: 7,
                map: 100000000,
                spawn_point: 3,
                equipment_ids: Vec::new(),
            },
            level: 42,
            job: Job::Fighter,
            fame: -5,
            strength: 120,
            dexterity: 25,
            intelligence: 4,
            luck: 9,
            max_hp: 2100,
            hp: 1999,
            max_mp: 300,
            mp: 123,
            ap: 1,
            sp: 3,
            exp: 55555,
        }
    }

    fn encode_stats(stats: &CharacterStats) -> Packet {
        let mut writer = PacketWriter::with_max(0x000B, CHAR_STATS_BLOCK_LEN);
        writer.write_char_stats(stats);
        writer.into()
    }

    #[test]
    fn stats_block_is_fixed_width() {
        let packet = encode_stats(&stats_fixture("Hero"));
        assert_eq!(packet.data.len(), CHAR_STATS_BLOCK_LEN);
    }

    #[test]
    fn stats_block_roundtrips() {
        let stats = stats_fixture("Hero");
        let packet = encode_stats(&stats);
        let mut reader = PacketReader::from(&packet);
        let decoded = reader.read_char_stats().unwrap();

        assert_eq!(decoded.id, stats.id);
        assert_eq!(decoded.appearance.name, "Hero");
        assert_eq!(decoded.appearance.gender, CharacterGender::Female);
        assert_eq!(decoded.job, Job::Fighter);
        assert_eq!(decoded.hp, stats.hp);
        assert_eq!(decoded.max_hp, stats.max_hp);
        assert_eq!(decoded.exp, stats.exp);
        assert_eq!(decoded.fame, stats.fame);
        assert_eq!(decoded.appearance.map, stats.appearance.map);
    }

    #[test]
    fn max_length_name_fills_field_with_single_nul() {
        let stats = stats_fixture("TwelveLetter");
        assert_eq!(stats.appearance.name.len(), 12);
        let packet = encode_stats(&stats);
        // Name field starts after the u32 id.
        assert_eq!(&packet.data[4..16], b"TwelveLetter");
        assert_eq!(packet.data[16], 0);
        assert_ne!(packet.data[17], 0); // gender byte follows immediately
    }

    #[test]
    #[should_panic(expected = "character name")]
    fn empty_name_is_rejected() {
        encode_stats(&stats_fixture(""));
    }

    #[test]
    fn equipment_record_roundtrips_at_extremes() {
        for value in [i16::MIN, i16::MAX] {
            let equipment = EquipmentItem {
                item_id: 1302000,
                owner: "Hero".to_string(),
                flags: 0x8001,
                cash: false,
                upgrade_slots: 7,
                upgrade_level: 2,
                strength: value,
                dexterity: value,
                intelligence: value,
                luck: value,
                hp: value,
                mp: value,
                attack: value,
                magic_attack: value,
                defence: value,
                magic_defence: value,
                accuracy: value,
                avoid: value,
                hands: value,
                speed: value,
                jump: value,
            };

            let mut writer = PacketWriter::with_max(0x001D, EQUIPMENT_RECORD_MAX_LEN);
            writer.write_equipment_record(&equipment);
            let packet = Packet::from(writer);
            let mut reader = PacketReader::from(&packet);
            assert_eq!(reader.read_equipment_record().unwrap(), equipment);
        }
    }

    #[test]
    fn appearance_emits_sentinels_and_cosmetic_weapon() {
        let mut ids = vec![None; EQUIP_SLOT_COUNT];
        ids[compact_equip_slot(equip_slot::HAT) as usize] = Some(1002000u32);
        ids[compact_equip_slot(equip_slot::WEAPON) as usize] = Some(1302000);
        ids[compact_equip_slot(equip_slot::COSMETIC_WEAPON) as usize] = Some(1702000);

        let appearance = CharacterAppearance {
            name: "Hero".to_string(),
            gender: CharacterGender::Male,
            skin: 0,
            face: 20000,
            hair: 30000,
            gacha_exp: 0,
            map: 0,
            spawn_point: 0,
            equipment_ids: ids,
        };

        let mut writer = PacketWriter::with_max(0x00A0, CHAR_APPEARANCE_MAX_LEN);
        writer.write_char_appearance(&appearance, false);
        let packet = Packet::from(writer);
        let data = &packet.data[..];

        // Header: gender, skin, face, mode, hair.
        assert_eq!(data[6], 1);
        let mut pos = 11;
        // Hat entry.
        assert_eq!(data[pos], equip_slot::HAT);
        pos += 5;
        // Weapon entry.
        assert_eq!(data[pos], equip_slot::WEAPON);
        pos += 5;
        assert_eq!(data[pos], 0xFF);
        pos += 1;
        // Cosmetic weapon appears in the cosmetic list too.
        assert_eq!(data[pos], equip_slot::COSMETIC_WEAPON);
        pos += 5;
        assert_eq!(data[pos], 0xFF);
        pos += 1;
        assert_eq!(
            u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]),
            1702000
        );
        pos += 4;
        // Pet placeholders close the block.
        assert_eq!(&data[pos..pos + 12], &[0u8; 12]);
        assert_eq!(data.len(), pos + 12);
    }

    #[test]
    fn rechargeable_stackable_carries_unit_tail() {
        let mut writer = PacketWriter::with_max(0x001D, STACKABLE_RECORD_MAX_LEN);
        writer.write_stackable_record(&StackableItem::new(2070000, 200));
        let packet = Packet::from(writer);
        let data = &packet.data[..];
        assert_eq!(&data[data.len() - 4..], &[0x54, 0x00, 0x00, 0x34]);
        assert_eq!(&data[data.len() - 8..data.len() - 4], &[2, 0, 0, 0]);
    }
}
