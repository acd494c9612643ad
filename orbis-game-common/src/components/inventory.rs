use enum_map::Enum;
use serde::{Deserialize, Serialize};

/// Upper bound on the slot count of any single inventory.
pub const MAX_ITEM_COUNT: usize = 252;

const MAX_STACK_QUANTITY: i16 = 200;

/// Rechargeable projectiles and crafting recipes carry extra wire data.
pub fn is_rechargeable(item_id: u32) -> bool {
    matches!(item_id / 10000, 207 | 233)
}

/// An item that occupies an equipment slot. Carries the full set of stat
/// deltas plus upgrade tracking.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EquipmentItem {
    pub item_id: u32,
    pub owner: String,
    pub flags: u16,
    pub cash: bool,
    pub upgrade_slots: u8,
    pub upgrade_level: u8,
    pub strength: i16,
    pub dexterity: i16,
    pub intelligence: i16,
    pub luck: i16,
    pub hp: i16,
    pub mp: i16,
    pub attack: i16,
    pub magic_attack: i16,
    pub defence: i16,
    pub magic_defence: i16,
    pub accuracy: i16,
    pub avoid: i16,
    pub hands: i16,
    pub speed: i16,
    pub jump: i16,
}

impl EquipmentItem {
    pub fn new(item_id: u32) -> Self {
        Self {
            item_id,
            upgrade_slots: 7,
            ..Default::default()
        }
    }
}

/// A quantity-bearing item in one of the stackable inventories.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct StackableItem {
    pub item_id: u32,
    pub quantity: i16,
    pub owner: String,
    pub flags: u16,
}

impl StackableItem {
    pub fn new(item_id: u32, quantity: i16) -> Self {
        Self {
            item_id,
            quantity,
            owner: String::new(),
            flags: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum Item {
    Equipment(EquipmentItem),
    Stackable(StackableItem),
}

/// The stackable inventory tabs. The equipment inventory is kept separately
/// because its cells hold a different item variant.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, Enum)]
pub enum InventoryKind {
    Use,
    Setup,
    Etc,
    Cash,
}

impl InventoryKind {
    pub fn from_item_id(item_id: u32) -> Option<InventoryKind> {
        match item_id / 1000000 {
            2 => Some(InventoryKind::Use),
            3 => Some(InventoryKind::Setup),
            4 => Some(InventoryKind::Etc),
            5 => Some(InventoryKind::Cash),
            _ => None,
        }
    }
}

/// Inventory identifiers as they appear on the wire.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum InventoryType {
    Equipment,
    Use,
    Setup,
    Etc,
    Cash,
}

impl InventoryType {
    pub fn wire_id(self) -> u8 {
        match self {
            InventoryType::Equipment => 1,
            InventoryType::Use => 2,
            InventoryType::Setup => 3,
            InventoryType::Etc => 4,
            InventoryType::Cash => 5,
        }
    }
}

impl From<InventoryKind> for InventoryType {
    fn from(kind: InventoryKind) -> Self {
        match kind {
            InventoryKind::Use => InventoryType::Use,
            InventoryKind::Setup => InventoryType::Setup,
            InventoryKind::Etc => InventoryType::Etc,
            InventoryKind::Cash => InventoryType::Cash,
        }
    }
}

/// A bounded, ordered array of stackable item cells. Slot numbering on the
/// wire is 1-based; storage is 0-based.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ItemTab {
    slots: Vec<Option<StackableItem>>,
}

impl ItemTab {
    pub fn new(slot_count: u8) -> Self {
        assert!(slot_count as usize <= MAX_ITEM_COUNT);
        Self {
            slots: vec![None; slot_count as usize],
        }
    }

    pub fn slot_count(&self) -> u8 {
        self.slots.len() as u8
    }

    pub fn get(&self, index: usize) -> Option<&StackableItem> {
        self.slots.get(index).and_then(|x| x.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &StackableItem)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|item| (i, item)))
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Stacks onto an existing cell when possible, otherwise takes the first
    /// empty cell. Returns the 0-based slot the item landed in, or the item
    /// back when the tab is full.
    pub fn try_add(&mut self, item: StackableItem) -> Result<usize, StackableItem> {
        if let Some(index) = self.slots.iter().position(|slot| {
            slot.as_ref().map_or(false, |existing| {
                existing.item_id == item.item_id
                    && existing.quantity + item.quantity <= MAX_STACK_QUANTITY
                    && !is_rechargeable(item.item_id)
            })
        }) {
            let existing = self.slots[index].as_mut().unwrap();
            existing.quantity += item.quantity;
            return Ok(index);
        }

        match self.slots.iter().position(|slot| slot.is_none()) {
            Some(index) => {
                self.slots[index] = Some(item);
                Ok(index)
            }
            None => Err(item),
        }
    }

    /// Removes up to `quantity` of `item_id`. Returns the affected slot and
    /// the remaining quantity in it, or None when the item is not held.
    pub fn try_take(&mut self, item_id: u32, quantity: i16) -> Option<(usize, i16)> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.as_ref().map_or(false, |item| item.item_id == item_id))?;
        let item = self.slots[index].as_mut().unwrap();
        if item.quantity < quantity {
            return None;
        }

        item.quantity -= quantity;
        let remaining = item.quantity;
        if remaining == 0 {
            self.slots[index] = None;
        }
        Some((index, remaining))
    }

    pub fn quantity_of(&self, item_id: u32) -> i32 {
        self.slots
            .iter()
            .flatten()
            .filter(|item| item.item_id == item_id)
            .map(|item| item.quantity as i32)
            .sum()
    }
}

/// The equipment inventory tab; cells carry full equipment records.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EquipmentTab {
    slots: Vec<Option<EquipmentItem>>,
}

impl EquipmentTab {
    pub fn new(slot_count: u8) -> Self {
        assert!(slot_count as usize <= MAX_ITEM_COUNT);
        Self {
            slots: vec![None; slot_count as usize],
        }
    }

    pub fn slot_count(&self) -> u8 {
        self.slots.len() as u8
    }

    pub fn get(&self, index: usize) -> Option<&EquipmentItem> {
        self.slots.get(index).and_then(|x| x.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &EquipmentItem)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|item| (i, item)))
    }

    pub fn try_add(&mut self, item: EquipmentItem) -> Result<usize, EquipmentItem> {
        match self.slots.iter().position(|slot| slot.is_none()) {
            Some(index) => {
                self.slots[index] = Some(item);
                Ok(index)
            }
            None => Err(item),
        }
    }

    pub fn take(&mut self, index: usize) -> Option<EquipmentItem> {
        self.slots.get_mut(index).and_then(|slot| slot.take())
    }
}

/// A single entry of the inventory-modify batch packet. ADD re-serialises the
/// full item; MOVE and REMOVE on negative slots describe equip/unequip
/// transitions.
#[derive(Clone, Debug, PartialEq)]
pub enum InventoryModify {
    Add {
        inventory: InventoryType,
        slot: i16,
        item: Item,
    },
    Quantity {
        inventory: InventoryType,
        slot: i16,
        quantity: i16,
    },
    Move {
        inventory: InventoryType,
        slot: i16,
        destination: i16,
    },
    Remove {
        inventory: InventoryType,
        slot: i16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_stacks_with_existing_cell() {
        let mut tab = ItemTab::new(4);
        tab.try_add(StackableItem::new(2000000, 10)).unwrap();
        let slot = tab.try_add(StackableItem::new(2000000, 5)).unwrap();
        assert_eq!(slot, 0);
        assert_eq!(tab.get(0).unwrap().quantity, 15);
        assert_eq!(tab.occupied_count(), 1);
    }

    #[test]
    fn add_fails_when_tab_is_full() {
        let mut tab = ItemTab::new(2);
        tab.try_add(StackableItem::new(2000000, 1)).unwrap();
        tab.try_add(StackableItem::new(2000001, 1)).unwrap();
        assert!(tab.try_add(StackableItem::new(2000002, 1)).is_err());
    }

    #[test]
    fn rechargeables_never_stack() {
        let mut tab = ItemTab::new(2);
        tab.try_add(StackableItem::new(2070000, 100)).unwrap();
        let slot = tab.try_add(StackableItem::new(2070000, 100)).unwrap();
        assert_eq!(slot, 1);
    }

    #[test]
    fn take_clears_emptied_cell() {
        let mut tab = ItemTab::new(2);
        tab.try_add(StackableItem::new(4000000, 3)).unwrap();
        assert_eq!(tab.try_take(4000000, 3), Some((0, 0)));
        assert_eq!(tab.occupied_count(), 0);
        assert_eq!(tab.try_take(4000000, 1), None);
    }
}
