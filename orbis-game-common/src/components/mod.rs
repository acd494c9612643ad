mod character;
mod equipment;
mod inventory;
mod keymap;
mod monster_book;
mod quest_log;
mod skill_list;

pub use character::{
    Character, CharacterAppearance, CharacterGender, CharacterStats, CHARACTER_MAX_NAME_LENGTH,
    HP_MAX, MP_MAX,
};
pub use equipment::{
    compact_equip_slot, expand_equip_slot, equip_slot, EquippedItems, EQUIP_SLOT_COUNT,
    EQUIP_SLOT_NON_COSMETIC_COUNT,
};
pub use inventory::{
    is_rechargeable, EquipmentItem, EquipmentTab, InventoryKind, InventoryModify, InventoryType,
    Item, ItemTab, StackableItem, MAX_ITEM_COUNT,
};
pub use keymap::{KeyBinding, KeyMap, KEYMAP_KEY_COUNT};
pub use monster_book::MonsterBook;
pub use quest_log::{ActiveQuest, QuestLog, QuestProgress, QUEST_MAX_TARGETS};
pub use skill_list::{SkillEntry, SkillList};
