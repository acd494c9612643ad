//! Named reactors for the maps a channel serves. Scripts address reactors by
//! name; state transitions become packets buffered for map broadcast.

use std::collections::HashMap;

use orbis_network_common::Packet;
use orbis_network_v83::{PacketChangeReactorState, PacketDestroyReactor, PacketSpawnReactor};

pub struct ReactorInstance {
    pub object_id: u32,
    pub reactor_id: u32,
    pub x: i16,
    pub y: i16,
    pub state: u8,
}

#[derive(Default)]
pub struct ReactorRuntime {
    next_object_id: u32,
    reactors: HashMap<String, ReactorInstance>,
    pending: Vec<Packet>,
}

impl ReactorRuntime {
    pub fn new() -> ReactorRuntime {
        ReactorRuntime::default()
    }

    pub fn get(&self, name: &str) -> Option<&ReactorInstance> {
        self.reactors.get(name)
    }

    pub fn find_by_object_id(&self, object_id: u32) -> Option<(&str, &ReactorInstance)> {
        self.reactors
            .iter()
            .find(|(_, reactor)| reactor.object_id == object_id)
            .map(|(name, reactor)| (name.as_str(), reactor))
    }

    /// Spawns a reactor under `name`, replacing any previous one with that
    /// name. Returns the allocated object id.
    pub fn spawn(&mut self, name: &str, reactor_id: u32, x: i16, y: i16) -> Option<u32> {
        if let Some(previous) = self.reactors.remove(name) {
            self.pending.push(Packet::from(&PacketDestroyReactor {
                object_id: previous.object_id,
                state: previous.state,
                x: previous.x,
                y: previous.y,
            }));
        }

        self.next_object_id += 1;
        let object_id = self.next_object_id;
        self.pending.push(Packet::from(&PacketSpawnReactor {
            object_id,
            reactor_id,
            x,
            y,
            state: 0,
        }));
        self.reactors.insert(
            name.to_string(),
            ReactorInstance {
                object_id,
                reactor_id,
                x,
                y,
                state: 0,
            },
        );
        Some(object_id)
    }

    pub fn set_state(&mut self, name: &str, state: u8) -> bool {
        let reactor = match self.reactors.get_mut(name) {
            Some(reactor) => reactor,
            None => return false,
        };
        reactor.state = state;
        let packet = Packet::from(&PacketChangeReactorState {
            object_id: reactor.object_id,
            state,
            x: reactor.x,
            y: reactor.y,
            stance: 0,
        });
        self.pending.push(packet);
        true
    }

    pub fn despawn(&mut self, name: &str) -> bool {
        match self.reactors.remove(name) {
            Some(reactor) => {
                self.pending.push(Packet::from(&PacketDestroyReactor {
                    object_id: reactor.object_id,
                    state: reactor.state,
                    x: reactor.x,
                    y: reactor.y,
                }));
                true
            }
            None => false,
        }
    }

    /// Packets produced by reactor mutations, in emission order.
    pub fn drain_pending(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_network_v83::ServerPackets;

    #[test]
    fn lifecycle_emits_spawn_change_destroy() {
        let mut runtime = ReactorRuntime::new();
        let object_id = runtime.spawn("boxes", 2002000, 100, 50).unwrap();
        assert_eq!(runtime.get("boxes").unwrap().reactor_id, 2002000);
        assert_eq!(runtime.find_by_object_id(object_id).unwrap().0, "boxes");
        assert!(runtime.set_state("boxes", 1));
        assert!(runtime.despawn("boxes"));
        assert!(!runtime.set_state("boxes", 2));

        let packets = runtime.drain_pending();
        let commands: Vec<u16> = packets.iter().map(|packet| packet.command).collect();
        assert_eq!(
            commands,
            vec![
                ServerPackets::SpawnReactor as u16,
                ServerPackets::ChangeReactorState as u16,
                ServerPackets::DestroyReactor as u16,
            ]
        );
        assert_eq!(runtime.drain_pending().len(), 0);
        assert!(object_id > 0);
    }

    #[test]
    fn respawn_under_same_name_replaces_previous() {
        let mut runtime = ReactorRuntime::new();
        let first = runtime.spawn("boxes", 2002000, 0, 0).unwrap();
        let second = runtime.spawn("boxes", 2002000, 0, 0).unwrap();
        assert_ne!(first, second);
        // Destroy for the replaced reactor is emitted before the new spawn.
        let packets = runtime.drain_pending();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[1].command, ServerPackets::DestroyReactor as u16);
    }
}
