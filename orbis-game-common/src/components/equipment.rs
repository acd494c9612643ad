use serde::{Deserialize, Serialize};

use crate::components::inventory::EquipmentItem;

/// Number of dense storage slots for equipped items.
pub const EQUIP_SLOT_COUNT: usize = 27;

/// Dense slots `0..17` hold regular equipment, `17..27` hold cosmetic overrides.
pub const EQUIP_SLOT_NON_COSMETIC_COUNT: usize = 17;

/// The client-visible sparse slot numbers. The server stores equipped items in
/// a dense array; these are the values that appear on the wire.
pub mod equip_slot {
    pub const HAT: u8 = 1;
    pub const FACE_ACCESSORY: u8 = 2;
    pub const EYE_ACCESSORY: u8 = 3;
    pub const EARRING: u8 = 4;
    pub const TOP: u8 = 5;
    pub const BOTTOM: u8 = 6;
    pub const SHOES: u8 = 7;
    pub const GLOVES: u8 = 8;
    pub const CAPE: u8 = 9;
    pub const SHIELD: u8 = 10;
    pub const WEAPON: u8 = 11;
    pub const RING_1: u8 = 12;
    pub const RING_2: u8 = 13;
    pub const RING_3: u8 = 14;
    pub const RING_4: u8 = 15;
    pub const PENDANT: u8 = 16;
    pub const BELT: u8 = 17;

    pub const COSMETIC_HAT: u8 = 101;
    pub const COSMETIC_FACE: u8 = 102;
    pub const COSMETIC_EYE: u8 = 103;
    pub const COSMETIC_TOP: u8 = 104;
    pub const COSMETIC_BOTTOM: u8 = 105;
    pub const COSMETIC_SHOES: u8 = 106;
    pub const COSMETIC_GLOVES: u8 = 107;
    pub const COSMETIC_CAPE: u8 = 108;
    pub const COSMETIC_SHIELD: u8 = 109;
    pub const COSMETIC_WEAPON: u8 = 110;
}

const COSMETIC_SLOT_BASE: u8 = 101;

/// Maps a dense storage index to the client's sparse slot number.
pub fn expand_equip_slot(compact: u8) -> u8 {
    debug_assert!((compact as usize) < EQUIP_SLOT_COUNT);
    if (compact as usize) < EQUIP_SLOT_NON_COSMETIC_COUNT {
        compact + 1
    } else {
        compact - EQUIP_SLOT_NON_COSMETIC_COUNT as u8 + COSMETIC_SLOT_BASE
    }
}

/// Maps a client sparse slot number back to its dense storage index.
pub fn compact_equip_slot(expanded: u8) -> u8 {
    debug_assert!(
        (1..=EQUIP_SLOT_NON_COSMETIC_COUNT as u8).contains(&expanded)
            || (COSMETIC_SLOT_BASE..COSMETIC_SLOT_BASE + 10).contains(&expanded)
    );
    if expanded < COSMETIC_SLOT_BASE {
        expanded - 1
    } else {
        expanded - COSMETIC_SLOT_BASE + EQUIP_SLOT_NON_COSMETIC_COUNT as u8
    }
}

/// The dense array of currently equipped items, indexed by compact slot.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EquippedItems {
    pub slots: [Option<EquipmentItem>; EQUIP_SLOT_COUNT],
}

impl Default for EquippedItems {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl EquippedItems {
    pub fn get(&self, compact: u8) -> Option<&EquipmentItem> {
        self.slots.get(compact as usize).and_then(|x| x.as_ref())
    }

    pub fn set(&mut self, compact: u8, item: Option<EquipmentItem>) -> Option<EquipmentItem> {
        std::mem::replace(&mut self.slots[compact as usize], item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &EquipmentItem)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|item| (i as u8, item)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_compact_roundtrip_all_slots() {
        for compact in 0..EQUIP_SLOT_COUNT as u8 {
            assert_eq!(compact_equip_slot(expand_equip_slot(compact)), compact);
        }
    }

    #[test]
    fn compact_expand_roundtrip_all_client_slots() {
        let expanded: Vec<u8> = (1..=17).chain(101..=110).collect();
        for slot in expanded {
            assert_eq!(expand_equip_slot(compact_equip_slot(slot)), slot);
        }
    }

    #[test]
    fn expansion_splits_cosmetic_range() {
        assert_eq!(expand_equip_slot(0), equip_slot::HAT);
        assert_eq!(expand_equip_slot(10), equip_slot::WEAPON);
        assert_eq!(expand_equip_slot(16), equip_slot::BELT);
        assert_eq!(expand_equip_slot(17), equip_slot::COSMETIC_HAT);
        assert_eq!(expand_equip_slot(26), equip_slot::COSMETIC_WEAPON);
    }
}
