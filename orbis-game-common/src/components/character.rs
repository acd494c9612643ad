use enum_map::EnumMap;
use serde::{Deserialize, Serialize};

use crate::{
    components::{
        EquipmentTab, EquippedItems, InventoryKind, ItemTab, KeyMap, MonsterBook, QuestLog,
        SkillList,
    },
    data::Job,
};

pub const CHARACTER_MAX_NAME_LENGTH: usize = 12;

pub const HP_MAX: i16 = 30000;
pub const MP_MAX: i16 = 30000;

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum CharacterGender {
    #[default]
    Male,
    Female,
}

impl From<CharacterGender> for u8 {
    fn from(gender: CharacterGender) -> u8 {
        match gender {
            CharacterGender::Male => 0,
            CharacterGender::Female => 1,
        }
    }
}

/// Visual data about a character, used by the map avatar and the character
/// selection screen. Equipment is reduced to the item ids per compact slot.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CharacterAppearance {
    pub name: String,
    pub gender: CharacterGender,
    pub skin: u8,
    pub face: u32,
    pub hair: u32,
    pub gacha_exp: i32,
    pub map: u32,
    pub spawn_point: u8,
    pub equipment_ids: Vec<Option<u32>>,
}

/// The character-selection stat card.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CharacterStats {
    pub id: u32,
    pub appearance: CharacterAppearance,
    pub level: u8,
    pub job: Job,
    pub fame: i16,
    pub strength: i16,
    pub dexterity: i16,
    pub intelligence: i16,
    pub luck: i16,
    pub max_hp: i16,
    pub hp: i16,
    pub max_mp: i16,
    pub mp: i16,
    pub ap: i16,
    pub sp: i16,
    pub exp: i32,
}

/// The full mutable view of a connected character while it is in a map.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Character {
    pub id: u32,
    pub account_id: u32,
    pub name: String,
    pub map: u32,
    pub spawn_point: u8,
    pub x: i16,
    pub y: i16,
    pub foothold: u16,
    pub stance: u8,
    pub chair: u32,
    pub gender: CharacterGender,
    pub skin: u8,
    pub face: u32,
    pub hair: u32,
    pub level: u8,
    pub job: Job,
    pub fame: i16,
    pub strength: i16,
    pub dexterity: i16,
    pub intelligence: i16,
    pub luck: i16,
    pub max_hp: i16,
    pub hp: i16,
    pub max_mp: i16,
    pub mp: i16,
    pub ap: i16,
    pub sp: i16,
    pub exp: i32,
    pub gacha_exp: i32,
    pub mesos: i32,
    pub equipped: EquippedItems,
    pub equipment_inventory: EquipmentTab,
    pub inventories: EnumMap<InventoryKind, ItemTab>,
    pub quest_log: QuestLog,
    pub skills: SkillList,
    pub monster_book: MonsterBook,
    pub keymap: KeyMap,
}

impl Character {
    pub fn new(id: u32, account_id: u32, name: String) -> Self {
        Self {
            id,
            account_id,
            name,
            map: 0,
            spawn_point: 0,
            x: 0,
            y: 0,
            foothold: 0,
            stance: 0,
            chair: 0,
            gender: CharacterGender::Male,
            skin: 0,
            face: 20000,
            hair: 30000,
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
            gacha_exp: 0,
            mesos: 0,
            equipped: EquippedItems::default(),
            equipment_inventory: EquipmentTab::new(24),
            inventories: EnumMap::from_fn(|_| ItemTab::new(24)),
            quest_log: QuestLog::default(),
            skills: SkillList::default(),
            monster_book: MonsterBook::default(),
            keymap: KeyMap::default(),
        }
    }

    pub fn to_appearance(&self) -> CharacterAppearance {
        CharacterAppearance {
            name: self.name.clone(),
            gender: self.gender,
            skin: self.skin,
            face: self.face,
            hair: self.hair,
            gacha_exp: self.gacha_exp,
            map: self.map,
            spawn_point: self.spawn_point,
            equipment_ids: self
                .equipped
                .slots
                .iter()
                .map(|slot| slot.as_ref().map(|item| item.item_id))
                .collect(),
        }
    }

    pub fn to_stats(&self) -> CharacterStats {
        CharacterStats {
            id: self.id,
            appearance: self.to_appearance(),
            level: self.level,
            job: self.job,
            fame: self.fame,
            strength: self.strength,
            dexterity: self.dexterity,
            intelligence: self.intelligence,
            luck: self.luck,
            max_hp: self.max_hp,
            hp: self.hp,
            max_mp: self.max_mp,
            mp: self.mp,
            ap: self.ap,
            sp: self.sp,
            exp: self.exp,
        }
    }
}
