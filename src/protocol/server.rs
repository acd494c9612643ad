use log::{info, trace, warn};
use num_traits::FromPrimitive;
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedSender;

use orbis_game_common::components::Character;
use orbis_network_common::{Connection, Packet, PacketReader, PassthroughCodec};
use orbis_network_v83::{
    AttackTarget, PacketAddPlayerToMap, PacketChat, PacketCloseRangeAttack, PacketEnterMap,
    PacketFaceExpression, PacketKeymap, PacketKillMonster, PacketMovePlayer,
    PacketRemovePlayerFromMap,
};

use crate::game::{
    client::GameClient,
    interaction::{Interaction, InteractionEvent},
    scripting::ScriptArg,
    storage::CharacterStorage,
    ChannelContext, MapSubscriber,
};
use crate::protocol::ClientPackets;

const DEFAULT_MAP: u32 = 100000000;

static PACKET_CODEC: PassthroughCodec = PassthroughCodec;

pub struct ChannelServer {
    listener: TcpListener,
    context: Arc<ChannelContext>,
}

impl ChannelServer {
    pub fn new(listener: TcpListener, context: Arc<ChannelContext>) -> ChannelServer {
        ChannelServer { listener, context }
    }

    pub async fn run(&mut self) {
        loop {
            let (socket, _) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!("Channel server accept error: {:?}", err);
                    continue;
                }
            };
            let context = self.context.clone();
            tokio::spawn(async move {
                if let Ok(addr) = socket.peer_addr() {
                    info!("Channel server new connection from: {:?}", addr);
                }
                if let Err(err) = run_connection(socket, context).await {
                    info!("Channel server connection error: {:?}", err);
                }
            });
        }
    }
}

async fn run_connection(
    stream: TcpStream,
    context: Arc<ChannelContext>,
) -> Result<(), anyhow::Error> {
    let mut connection = Connection::new(stream, &PACKET_CODEC);
    let (mailbox_tx, mut mailbox_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut session = ClientSession::new(context, mailbox_tx);

    let result = loop {
        tokio::select! {
            packet = connection.read_packet() => {
                let packet = match packet {
                    Ok(packet) => packet,
                    Err(err) => break Err(err),
                };
                let keep_running = session.handle_packet(&packet);
                for packet in session.drain_output() {
                    connection.write_packet(packet).await?;
                }
                if !keep_running {
                    break Ok(());
                }
            }
            Some(packet) = mailbox_rx.recv() => {
                connection.write_packet(packet).await?;
            }
        }
    };

    session.logout();
    connection.shutdown().await;
    result
}

/// Per-connection dispatcher. The worker owns the player state; everything
/// observable leaves through the packet queue in emission order.
struct ClientSession {
    context: Arc<ChannelContext>,
    mailbox_tx: UnboundedSender<Packet>,
    client: Option<Arc<Mutex<GameClient>>>,
    interaction: Option<Interaction>,
    output: Vec<Packet>,
}

impl ClientSession {
    fn new(context: Arc<ChannelContext>, mailbox_tx: UnboundedSender<Packet>) -> ClientSession {
        ClientSession {
            context,
            mailbox_tx,
            client: None,
            interaction: None,
            output: Vec::new(),
        }
    }

    /// Returns false when the connection must be dropped.
    fn handle_packet(&mut self, packet: &Packet) -> bool {
        let mut reader = PacketReader::from(packet);
        match ClientPackets::from_u16(packet.command) {
            Some(ClientPackets::EnterChannel) => self.handle_enter_channel(&mut reader),
            Some(ClientPackets::NpcTalk) => self.handle_npc_talk(&mut reader),
            Some(ClientPackets::NpcTalkMore) => self.handle_npc_talk_more(&mut reader),
            Some(ClientPackets::EnterPortal) => self.handle_enter_portal(&mut reader),
            Some(ClientPackets::Chat) => self.handle_chat(&mut reader),
            Some(ClientPackets::FaceExpression) => self.handle_face_expression(&mut reader),
            Some(ClientPackets::MovePlayer) => self.handle_move_player(&mut reader),
            Some(ClientPackets::CloseRangeAttack) => self.handle_close_range_attack(&mut reader),
            Some(ClientPackets::SelectJob) => self.handle_select_job(&mut reader),
            Some(ClientPackets::HitReactor) => self.handle_hit_reactor(&mut reader),
            None => {
                trace!(target: "packets", "Unhandled client packet {:04X}", packet.command);
                true
            }
        }
    }

    fn handle_enter_channel(&mut self, reader: &mut PacketReader) -> bool {
        let name = match reader.read_sized_utf8() {
            Ok(name) if !name.is_empty() => name.to_string(),
            _ => return false,
        };

        let character = match CharacterStorage::try_load(&name) {
            Ok(snapshot) => snapshot.character,
            Err(_) => {
                let mut character = Character::new(rand::random::<u32>() >> 1, 0, name);
                character.map = DEFAULT_MAP;
                character
            }
        };
        let map = character.map;
        let character_id = character.id;

        let client = Arc::new(Mutex::new(GameClient::new(
            character,
            self.context.world.clone(),
        )));
        {
            let mut client = client.lock().unwrap();
            let enter_map = Packet::from(&PacketEnterMap {
                channel: 0,
                character: &client.character,
            });
            client.push_packet(enter_map);
            let keymap = Packet::from(&PacketKeymap {
                keymap: &client.character.keymap,
            });
            client.push_packet(keymap);

            self.context.subscribe_map(
                map,
                MapSubscriber {
                    character_id,
                    sender: self.mailbox_tx.clone(),
                },
            );
            self.context.broadcast_map(
                map,
                character_id,
                &Packet::from(&PacketAddPlayerToMap {
                    character: &client.character,
                }),
            );
        }

        self.client = Some(client);
        true
    }

    fn handle_npc_talk(&mut self, reader: &mut PacketReader) -> bool {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => return false,
        };
        let npc_id = match reader.read_u32() {
            Ok(npc_id) => npc_id,
            Err(_) => return false,
        };

        // A dedicated script when the NPC has one; the manager falls back to
        // the default script otherwise.
        let script_name = self
            .context
            .world
            .npcs
            .get_npc_info(npc_id)
            .and_then(|info| info.script.clone())
            .unwrap_or_else(|| format!("{}.lua", npc_id));

        client.lock().unwrap().npc = npc_id;
        match Interaction::start(
            &self.context.npc_scripts,
            &script_name,
            0,
            &[],
            client,
            self.context.reactors.clone(),
        ) {
            Some((interaction, event)) => self.apply_interaction_event(interaction, event),
            None => {
                warn!("Failed to allocate interaction for npc {}", npc_id);
                true
            }
        }
    }

    fn handle_npc_talk_more(&mut self, reader: &mut PacketReader) -> bool {
        let action = reader.read_u8().unwrap_or(0);
        if action == 0 {
            // Player dismissed the dialogue; detach without resuming.
            self.interaction = None;
            return true;
        }

        let selection = reader.read_i32().unwrap_or(action as i32);
        match self.interaction.take() {
            Some(mut interaction) => {
                let event = interaction.resume(selection);
                self.apply_interaction_event(interaction, event)
            }
            None => true,
        }
    }

    fn handle_enter_portal(&mut self, reader: &mut PacketReader) -> bool {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => return false,
        };
        let portal_name = match reader.read_sized_utf8() {
            Ok(name) => name.to_string(),
            Err(_) => return false,
        };

        match Interaction::start(
            &self.context.portal_scripts,
            &format!("{}.lua", portal_name),
            0,
            &[],
            client,
            self.context.reactors.clone(),
        ) {
            Some((interaction, event)) => self.apply_interaction_event(interaction, event),
            None => true,
        }
    }

    fn handle_chat(&mut self, reader: &mut PacketReader) -> bool {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => return false,
        };
        let message = match reader.read_sized_utf8() {
            Ok(message) => message.to_string(),
            Err(_) => return false,
        };
        let show = reader.read_u8().unwrap_or(0);

        let (id, map) = {
            let client = client.lock().unwrap();
            (client.character.id, client.character.map)
        };
        let packet = Packet::from(&PacketChat {
            id,
            gm: false,
            message: &message,
            show,
        });
        self.context.broadcast_map(map, id, &packet);
        self.output.push(packet);
        true
    }

    fn handle_face_expression(&mut self, reader: &mut PacketReader) -> bool {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => return false,
        };
        let emote = match reader.read_u32() {
            Ok(emote) => emote,
            Err(_) => return false,
        };
        let (id, map) = {
            let client = client.lock().unwrap();
            (client.character.id, client.character.map)
        };
        self.context
            .broadcast_map(map, id, &Packet::from(&PacketFaceExpression { id, emote }));
        true
    }

    fn handle_move_player(&mut self, reader: &mut PacketReader) -> bool {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => return false,
        };
        let remaining = reader.remaining();
        let movement = match reader.read_fixed_length_bytes(remaining) {
            Ok(movement) => movement.to_vec(),
            Err(_) => return false,
        };
        let (id, map) = {
            let client = client.lock().unwrap();
            (client.character.id, client.character.map)
        };
        self.context.broadcast_map(
            map,
            id,
            &Packet::from(&PacketMovePlayer {
                id,
                movement: &movement,
            }),
        );
        true
    }

    fn handle_close_range_attack(&mut self, reader: &mut PacketReader) -> bool {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => return false,
        };
        let count = match reader.read_u8() {
            Ok(count) => count,
            Err(_) => return false,
        };
        let monster_count = count >> 4;
        let hit_count = count & 0xF;
        let skill = reader.read_u32().unwrap_or(0);

        let mut targets = Vec::with_capacity(monster_count as usize);
        for _ in 0..monster_count {
            let object_id = match reader.read_u32() {
                Ok(object_id) => object_id,
                Err(_) => return false,
            };
            let mut damage = Vec::with_capacity(hit_count as usize);
            for _ in 0..hit_count {
                damage.push(reader.read_i32().unwrap_or(0));
            }
            targets.push(AttackTarget { object_id, damage });
        }

        let (id, map) = {
            let client = client.lock().unwrap();
            (client.character.id, client.character.map)
        };
        self.context.broadcast_map(
            map,
            id,
            &Packet::from(&PacketCloseRangeAttack {
                id,
                skill: skill as u8,
                skill_level: if skill > 0 { 1 } else { 0 },
                hit_count,
                targets: &targets,
                display: 0,
                direction: 0,
                stance: 0,
                speed: 4,
            }),
        );

        // TODO: route through mob lifetimes once the mob controller lands;
        // until then every struck mob dies immediately.
        let mut client = client.lock().unwrap();
        for target in &targets {
            let kill = Packet::from(&PacketKillMonster {
                object_id: target.object_id,
                animation: true,
            });
            self.context.broadcast_map(map, id, &kill);
            client.push_packet(kill);
            client.record_kill(target.object_id);
        }
        if !targets.is_empty() {
            client.gain_exp(10 * targets.len() as i32);
        }
        true
    }

    fn handle_select_job(&mut self, reader: &mut PacketReader) -> bool {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => return false,
        };
        let npc_id = match reader.read_u32() {
            Ok(npc_id) => npc_id,
            Err(_) => return false,
        };
        let target_job = match reader.read_u16() {
            Ok(job) => job,
            Err(_) => return false,
        };

        client.lock().unwrap().npc = npc_id;
        match Interaction::start(
            &self.context.job_scripts,
            &format!("{}.lua", npc_id),
            0,
            &[ScriptArg::Integer(target_job as i32)],
            client,
            self.context.reactors.clone(),
        ) {
            Some((interaction, event)) => self.apply_interaction_event(interaction, event),
            None => true,
        }
    }

    fn handle_hit_reactor(&mut self, reader: &mut PacketReader) -> bool {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => return false,
        };
        let object_id = match reader.read_u32() {
            Ok(object_id) => object_id,
            Err(_) => return false,
        };

        let (script_name, state) = {
            let reactors = self.context.reactors.lock().unwrap();
            match reactors.find_by_object_id(object_id) {
                Some((_, reactor)) => (format!("{}.lua", reactor.reactor_id), reactor.state),
                None => return true,
            }
        };

        match Interaction::start(
            &self.context.reactor_scripts,
            &script_name,
            0,
            &[ScriptArg::Integer(state as i32)],
            client,
            self.context.reactors.clone(),
        ) {
            Some((interaction, event)) => self.apply_interaction_event(interaction, event),
            None => true,
        }
    }

    fn apply_interaction_event(
        &mut self,
        interaction: Interaction,
        event: InteractionEvent,
    ) -> bool {
        match event {
            InteractionEvent::AwaitingClient => {
                self.interaction = Some(interaction);
                true
            }
            InteractionEvent::Completed(_) | InteractionEvent::Aborted => {
                trace!(
                    target: "scripts",
                    "Interaction with {} finished",
                    interaction.script_name()
                );
                self.interaction = None;
                true
            }
            InteractionEvent::Warp { map, portal } => {
                self.interaction = None;
                self.warp_player(map, portal);
                true
            }
            InteractionEvent::Kick => {
                self.interaction = None;
                false
            }
        }
    }

    fn warp_player(&mut self, map: u32, portal: u8) {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => return,
        };
        let mut client = client.lock().unwrap();
        let previous_map = client.character.map;
        let character_id = client.character.id;

        self.context.broadcast_map(
            previous_map,
            character_id,
            &Packet::from(&PacketRemovePlayerFromMap { id: character_id }),
        );
        self.context.unsubscribe_map(previous_map, character_id);

        client.change_map(map, portal);

        self.context.subscribe_map(
            map,
            MapSubscriber {
                character_id,
                sender: self.mailbox_tx.clone(),
            },
        );
        self.context.broadcast_map(
            map,
            character_id,
            &Packet::from(&PacketAddPlayerToMap {
                character: &client.character,
            }),
        );
    }

    /// Collects everything produced this dispatch round: direct replies, the
    /// bound client's queue, and reactor broadcasts.
    fn drain_output(&mut self) -> Vec<Packet> {
        let mut output = std::mem::take(&mut self.output);
        if let Some(client) = &self.client {
            output.append(&mut client.lock().unwrap().drain_packets());
        }

        let reactor_packets = self.context.reactors.lock().unwrap().drain_pending();
        if !reactor_packets.is_empty() {
            if let Some(client) = &self.client {
                let (id, map) = {
                    let client = client.lock().unwrap();
                    (client.character.id, client.character.map)
                };
                for packet in &reactor_packets {
                    self.context.broadcast_map(map, id, packet);
                }
            }
            output.extend(reactor_packets);
        }
        output
    }

    fn logout(&mut self) {
        self.interaction = None;
        let client = match self.client.take() {
            Some(client) => client,
            None => return,
        };
        let client = client.lock().unwrap();
        let map = client.character.map;
        let character_id = client.character.id;

        self.context.unsubscribe_map(map, character_id);
        self.context.broadcast_map(
            map,
            character_id,
            &Packet::from(&PacketRemovePlayerFromMap { id: character_id }),
        );

        if let Err(err) = self.context.save_queue.send(CharacterStorage {
            character: client.character.clone(),
        }) {
            warn!("Failed to queue character save: {:?}", err);
        }
    }
}
