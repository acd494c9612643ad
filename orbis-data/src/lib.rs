//! Read-only world-data tables. Everything here is loaded once at startup and
//! shared immutably between workers; there is no locking on the read path.

use anyhow::Context;
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
pub struct ItemInfo {
    pub id: u32,
    #[serde(default)]
    pub price: i32,
    /// Per-unit wholesale price for rechargeable projectiles. The shop packet
    /// transmits the high 16 bits of this value's IEEE-754 representation.
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default = "default_slot_max")]
    pub slot_max: u16,
}

fn default_slot_max() -> u16 {
    100
}

#[derive(Default)]
pub struct ItemDatabase {
    items: HashMap<u32, ItemInfo>,
}

impl ItemDatabase {
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.to_string_lossy()))?;
        let items: Vec<ItemInfo> = serde_json::from_str(&str).with_context(|| {
            format!(
                "Failed to deserialise item database from file {}",
                path.to_string_lossy()
            )
        })?;
        info!("Loaded {} item definitions", items.len());
        Ok(Self::with_items(items))
    }

    pub fn with_items(items: Vec<ItemInfo>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    pub fn get_item_info(&self, id: u32) -> Option<&ItemInfo> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NpcShopItem {
    pub item_id: u32,
    pub price: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NpcInfo {
    pub id: u32,
    /// Script file driving this NPC's dialogue; the default script handles
    /// NPCs without one.
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub shop: Vec<NpcShopItem>,
}

#[derive(Default)]
pub struct NpcDatabase {
    npcs: HashMap<u32, NpcInfo>,
}

impl NpcDatabase {
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.to_string_lossy()))?;
        let npcs: Vec<NpcInfo> = serde_json::from_str(&str).with_context(|| {
            format!(
                "Failed to deserialise npc database from file {}",
                path.to_string_lossy()
            )
        })?;
        info!("Loaded {} npc definitions", npcs.len());
        Ok(Self::with_npcs(npcs))
    }

    pub fn with_npcs(npcs: Vec<NpcInfo>) -> Self {
        Self {
            npcs: npcs.into_iter().map(|npc| (npc.id, npc)).collect(),
        }
    }

    pub fn get_npc_info(&self, id: u32) -> Option<&NpcInfo> {
        self.npcs.get(&id)
    }
}

/// All static game data, shared behind an `Arc` after startup.
#[derive(Default)]
pub struct WorldData {
    pub items: ItemDatabase,
    pub npcs: NpcDatabase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_lookup_by_id() {
        let db = ItemDatabase::with_items(vec![ItemInfo {
            id: 2070000,
            price: 10,
            unit_price: 3.0,
            slot_max: 100,
        }]);
        assert_eq!(db.get_item_info(2070000).unwrap().slot_max, 100);
        assert!(db.get_item_info(2000000).is_none());
    }
}
