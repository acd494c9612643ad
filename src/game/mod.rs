pub mod client;
pub mod interaction;
pub mod reactor;
pub mod scripting;
pub mod storage;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;

use orbis_data::WorldData;
use orbis_network_common::Packet;

use crate::game::{reactor::ReactorRuntime, scripting::ScriptManager, storage::CharacterStorage};

/// A per-player mailbox: how other workers deliver packets to a connection
/// they do not own.
pub struct MapSubscriber {
    pub character_id: u32,
    pub sender: UnboundedSender<Packet>,
}

/// Shared state of one channel. World data and script contexts are loaded
/// before the listener accepts its first connection.
pub struct ChannelContext {
    pub world: Arc<WorldData>,
    pub npc_scripts: ScriptManager,
    pub portal_scripts: ScriptManager,
    pub reactor_scripts: ScriptManager,
    pub job_scripts: ScriptManager,
    pub reactors: Arc<Mutex<ReactorRuntime>>,
    maps: Mutex<HashMap<u32, Vec<MapSubscriber>>>,
    pub save_queue: crossbeam_channel::Sender<CharacterStorage>,
}

impl ChannelContext {
    pub fn new(
        world: Arc<WorldData>,
        npc_scripts: ScriptManager,
        portal_scripts: ScriptManager,
        reactor_scripts: ScriptManager,
        job_scripts: ScriptManager,
        save_queue: crossbeam_channel::Sender<CharacterStorage>,
    ) -> ChannelContext {
        ChannelContext {
            world,
            npc_scripts,
            portal_scripts,
            reactor_scripts,
            job_scripts,
            reactors: Arc::new(Mutex::new(ReactorRuntime::new())),
            maps: Mutex::new(HashMap::new()),
            save_queue,
        }
    }

    pub fn subscribe_map(&self, map: u32, subscriber: MapSubscriber) {
        self.maps
            .lock()
            .unwrap()
            .entry(map)
            .or_default()
            .push(subscriber);
    }

    pub fn unsubscribe_map(&self, map: u32, character_id: u32) {
        if let Some(subscribers) = self.maps.lock().unwrap().get_mut(&map) {
            subscribers.retain(|subscriber| subscriber.character_id != character_id);
        }
    }

    /// Delivers a packet to every player in `map` except `source`. Dead
    /// mailboxes are dropped along the way.
    pub fn broadcast_map(&self, map: u32, source: u32, packet: &Packet) {
        if let Some(subscribers) = self.maps.lock().unwrap().get_mut(&map) {
            subscribers.retain(|subscriber| {
                if subscriber.character_id == source {
                    return true;
                }
                subscriber
                    .sender
                    .send(Packet {
                        command: packet.command,
                        data: packet.data.clone(),
                    })
                    .is_ok()
            });
        }
    }
}
