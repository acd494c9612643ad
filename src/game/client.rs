//! Per-connection game state. A `GameClient` is owned by the worker handling
//! that connection; bridge callables reach it through the handle table for
//! the duration of a script resume.

use std::sync::Arc;

use orbis_data::WorldData;
use orbis_game_common::components::{
    Character, EquipmentItem, InventoryKind, InventoryModify, InventoryType, Item, StackableItem,
};
use orbis_game_common::data::Job;
use orbis_network_common::Packet;
use orbis_network_v83::{
    NpcDialogueType, PacketAddCard, PacketChangeMap, PacketEndQuest, PacketExpGain,
    PacketForfeitQuest, PacketInventoryFull, PacketItemGainInChat, PacketMesoGain,
    PacketModifyInventory, PacketNpcDialogue, PacketOpenShop, PacketQuestCompletionTime,
    PacketShowEffect, PacketStartQuest, PacketStatChange, PacketUpdateQuest, StatUpdate,
};

use num_traits::FromPrimitive;

const EFFECT_QUEST: u8 = 9;

pub struct GameClient {
    pub character: Character,
    pub world: Arc<WorldData>,
    /// The NPC currently engaged in dialogue, if any.
    pub npc: u32,
    out: Vec<Packet>,
}

impl GameClient {
    pub fn new(character: Character, world: Arc<WorldData>) -> GameClient {
        GameClient {
            character,
            world,
            npc: 0,
            out: Vec::new(),
        }
    }

    pub fn push_packet(&mut self, packet: Packet) {
        self.out.push(packet);
    }

    /// Hands the queued packets to the connection in emission order.
    pub fn drain_packets(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.out)
    }

    pub fn send_dialogue(&mut self, kind: NpcDialogueType, message: &str) {
        let packet = Packet::from(&PacketNpcDialogue {
            npc_id: self.npc,
            kind,
            message,
            speaker: 0,
        });
        self.push_packet(packet);
    }

    pub fn show_effect(&mut self, effect: u8) {
        self.push_packet(Packet::from(&PacketShowEffect { effect }));
    }

    /// Grants or removes mesos. Removal fails (and nothing changes) when the
    /// player does not hold enough.
    pub fn gain_meso(&mut self, amount: i32) -> bool {
        if amount < 0 && self.character.mesos.checked_add(amount).map_or(true, |m| m < 0) {
            return false;
        }

        self.character.mesos = self.character.mesos.saturating_add(amount);
        let mesos = self.character.mesos;
        self.push_packet(Packet::from(&PacketStatChange {
            enable_actions: true,
            updates: &[StatUpdate::Meso(mesos)],
        }));
        self.push_packet(Packet::from(&PacketMesoGain {
            amount,
            in_chat: true,
        }));
        true
    }

    /// Grants an item, reporting failure when the target inventory is full.
    /// The failure is an expected outcome, not a fault; scripts refuse to
    /// hand out the reward in that case.
    pub fn gain_item(&mut self, item_id: u32, quantity: i16) -> bool {
        let modify = if item_id / 1000000 == 1 {
            match self
                .character
                .equipment_inventory
                .try_add(EquipmentItem::new(item_id))
            {
                Ok(slot) => InventoryModify::Add {
                    inventory: InventoryType::Equipment,
                    slot: slot as i16 + 1,
                    item: Item::Equipment(
                        self.character.equipment_inventory.get(slot).unwrap().clone(),
                    ),
                },
                Err(_) => {
                    self.push_packet(Packet::from(&PacketInventoryFull));
                    return false;
                }
            }
        } else {
            let kind = match InventoryKind::from_item_id(item_id) {
                Some(kind) => kind,
                None => return false,
            };
            let tab = &mut self.character.inventories[kind];
            let before = tab.quantity_of(item_id);
            match tab.try_add(StackableItem::new(item_id, quantity)) {
                Ok(slot) => {
                    let cell = tab.get(slot).unwrap().clone();
                    if before > 0 && cell.quantity != quantity {
                        InventoryModify::Quantity {
                            inventory: kind.into(),
                            slot: slot as i16 + 1,
                            quantity: cell.quantity,
                        }
                    } else {
                        InventoryModify::Add {
                            inventory: kind.into(),
                            slot: slot as i16 + 1,
                            item: Item::Stackable(cell),
                        }
                    }
                }
                Err(_) => {
                    self.push_packet(Packet::from(&PacketInventoryFull));
                    return false;
                }
            }
        };

        let updates = [modify];
        self.push_packet(Packet::from(&PacketModifyInventory { updates: &updates }));
        self.push_packet(Packet::from(&PacketItemGainInChat {
            item_id,
            amount: quantity as i32,
        }));
        true
    }

    pub fn take_item(&mut self, item_id: u32, quantity: i16) -> bool {
        let kind = match InventoryKind::from_item_id(item_id) {
            Some(kind) => kind,
            None => return false,
        };
        let tab = &mut self.character.inventories[kind];
        let (slot, remaining) = match tab.try_take(item_id, quantity) {
            Some(result) => result,
            None => return false,
        };

        let modify = if remaining > 0 {
            InventoryModify::Quantity {
                inventory: kind.into(),
                slot: slot as i16 + 1,
                quantity: remaining,
            }
        } else {
            InventoryModify::Remove {
                inventory: kind.into(),
                slot: slot as i16 + 1,
            }
        };
        let updates = [modify];
        self.push_packet(Packet::from(&PacketModifyInventory { updates: &updates }));
        self.push_packet(Packet::from(&PacketItemGainInChat {
            item_id,
            amount: -(quantity as i32),
        }));
        true
    }

    pub fn item_count(&self, item_id: u32) -> i32 {
        match InventoryKind::from_item_id(item_id) {
            Some(kind) => self.character.inventories[kind].quantity_of(item_id),
            None => 0,
        }
    }

    pub fn gain_exp(&mut self, amount: i32) {
        self.character.exp = self.character.exp.saturating_add(amount);
        let exp = self.character.exp;
        self.push_packet(Packet::from(&PacketStatChange {
            enable_actions: true,
            updates: &[StatUpdate::Exp(exp)],
        }));
        self.push_packet(Packet::from(&PacketExpGain {
            exp: amount,
            equip_bonus: 0,
            party_bonus: 0,
            white: true,
            in_chat: false,
        }));
    }

    pub fn set_job(&mut self, job_id: u16) -> bool {
        let job = match Job::from_u16(job_id) {
            Some(job) => job,
            None => return false,
        };
        self.character.job = job;
        self.push_packet(Packet::from(&PacketStatChange {
            enable_actions: true,
            updates: &[StatUpdate::Job(job_id)],
        }));
        self.show_effect(EFFECT_QUEST);
        true
    }

    pub fn change_map(&mut self, map: u32, portal: u8) {
        self.character.map = map;
        self.character.spawn_point = portal;
        let hp = self.character.hp.max(0) as u16;
        self.push_packet(Packet::from(&PacketChangeMap {
            map,
            portal,
            hp,
        }));
    }

    pub fn start_quest(&mut self, quest_id: u16) -> bool {
        if !self
            .character
            .quest_log
            .start(orbis_game_common::components::ActiveQuest::new(quest_id))
        {
            return false;
        }
        let npc = self.npc;
        self.push_packet(Packet::from(&PacketStartQuest {
            quest_id,
            npc_id: npc,
        }));
        true
    }

    pub fn end_quest(&mut self, quest_id: u16, next_quest: u16) -> bool {
        let completed_at = chrono::Utc::now().timestamp();
        if !self.character.quest_log.complete(quest_id, completed_at) {
            return false;
        }
        let npc = self.npc;
        self.push_packet(Packet::from(&PacketEndQuest {
            quest_id,
            npc_id: npc,
            next_quest,
        }));
        self.push_packet(Packet::from(&PacketQuestCompletionTime {
            quest_id,
            completed_at,
        }));
        self.show_effect(EFFECT_QUEST);
        true
    }

    pub fn forfeit_quest(&mut self, quest_id: u16) -> bool {
        if !self.character.quest_log.forfeit(quest_id) {
            return false;
        }
        self.push_packet(Packet::from(&PacketForfeitQuest { quest_id }));
        true
    }

    pub fn set_quest_info(&mut self, quest_id: u16, value: String) {
        self.push_packet(Packet::from(&PacketUpdateQuest {
            quest_id,
            progress: &value,
        }));
        self.character.quest_log.set_info(quest_id, value);
    }

    /// Advances quest progress and the monster book after a kill, emitting
    /// the corresponding update packets.
    pub fn record_kill(&mut self, monster_id: u32) {
        for (quest_id, progress) in self.character.quest_log.record_kill(monster_id) {
            self.push_packet(Packet::from(&PacketUpdateQuest {
                quest_id,
                progress: &progress,
            }));
        }

        let count = self.character.monster_book.record(monster_id);
        self.push_packet(Packet::from(&PacketAddCard {
            full: count >= 5,
            card_id: monster_id,
            count,
        }));
    }

    pub fn open_shop(&mut self, npc_id: u32) -> bool {
        let world = self.world.clone();
        let info = match world.npcs.get_npc_info(npc_id) {
            Some(info) if !info.shop.is_empty() => info,
            _ => return false,
        };
        self.push_packet(Packet::from(&PacketOpenShop {
            npc_id,
            items: &info.shop,
            item_db: &world.items,
        }));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_network_v83::ServerPackets;

    fn client() -> GameClient {
        GameClient::new(
            Character::new(30000, 1, "Hero".to_string()),
            Arc::new(WorldData::default()),
        )
    }

    #[test]
    fn meso_removal_requires_funds() {
        let mut client = client();
        assert!(!client.gain_meso(-500));
        assert!(client.drain_packets().is_empty());

        assert!(client.gain_meso(1000));
        assert!(client.gain_meso(-500));
        assert_eq!(client.character.mesos, 500);
    }

    #[test]
    fn item_grant_emits_modify_and_effect() {
        let mut client = client();
        assert!(client.gain_item(2000000, 5));
        let packets = client.drain_packets();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].command, ServerPackets::ModifyInventory as u16);
        assert_eq!(packets[1].command, ServerPackets::ShowEffect as u16);
        assert_eq!(client.item_count(2000000), 5);
    }

    #[test]
    fn item_grant_fails_on_full_inventory() {
        let mut client = client();
        for offset in 0..24 {
            assert!(client.gain_item(4000000 + offset, 1));
        }
        client.drain_packets();

        assert!(!client.gain_item(4999999, 1));
        let packets = client.drain_packets();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].command, ServerPackets::ShowStatusInfo as u16);
    }

    #[test]
    fn quest_flow_emits_packets_in_order() {
        let mut client = client();
        client.npc = 9000001;
        assert!(client.start_quest(2000));
        assert!(!client.start_quest(2000));
        assert!(client.end_quest(2000, 0));
        assert!(!client.end_quest(2000, 0));

        let commands: Vec<u16> = client
            .drain_packets()
            .iter()
            .map(|packet| packet.command)
            .collect();
        assert_eq!(
            commands,
            vec![
                ServerPackets::QuestAction as u16,
                ServerPackets::QuestAction as u16,
                ServerPackets::ShowStatusInfo as u16,
                ServerPackets::ShowEffect as u16,
            ]
        );
    }

    #[test]
    fn kill_recording_updates_book() {
        let mut client = client();
        client.record_kill(100100);
        assert_eq!(client.character.monster_book.count(100100), 1);
        let packets = client.drain_packets();
        assert_eq!(packets.last().unwrap().command, ServerPackets::AddCard as u16);
    }
}
