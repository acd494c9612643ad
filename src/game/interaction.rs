//! Couples a script coroutine to the player it is bound to, and maps resume
//! results to the events the dispatcher acts on.

use std::sync::{Arc, Mutex};

use crate::game::{
    client::GameClient,
    reactor::ReactorRuntime,
    scripting::{
        BridgeEntry, BridgeTable, HandleTag, ScriptArg, ScriptManager, ScriptResult,
        ScriptValue,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    /// The script yielded awaiting the client's next reply.
    AwaitingClient,
    /// Terminal: the script returned a value.
    Completed(ScriptValue),
    /// Terminal: warp the player, then discard the interaction.
    Warp { map: u32, portal: u8 },
    /// Terminal: disconnect the player.
    Kick,
    /// Terminal: script error; the player stays connected.
    Aborted,
}

impl InteractionEvent {
    pub fn is_terminal(self) -> bool {
        !matches!(self, InteractionEvent::AwaitingClient)
    }
}

pub struct Interaction {
    instance: crate::game::scripting::ScriptInstance,
    client: Arc<Mutex<GameClient>>,
    reactors: Arc<Mutex<ReactorRuntime>>,
}

impl Interaction {
    /// Begins an interaction: allocates the coroutine and performs the first
    /// resume with the client bound as handle 0. Returns None when the
    /// coroutine cannot be spawned.
    pub fn start(
        manager: &ScriptManager,
        script_name: &str,
        entry: usize,
        extra_args: &[ScriptArg],
        client: Arc<Mutex<GameClient>>,
        reactors: Arc<Mutex<ReactorRuntime>>,
    ) -> Option<(Interaction, InteractionEvent)> {
        let instance = manager.alloc(script_name, entry)?;
        let mut interaction = Interaction {
            instance,
            client,
            reactors,
        };

        let mut args = vec![ScriptArg::Handle(HandleTag::Client, 0)];
        args.extend_from_slice(extra_args);
        let result = interaction
            .instance
            .run(interaction.bridge_table(), &args);
        let event = map_result(result);
        Some((interaction, event))
    }

    /// Feeds the client's reply into the suspended coroutine.
    pub fn resume(&mut self, selection: i32) -> InteractionEvent {
        let result = self
            .instance
            .run(self.bridge_table(), &[ScriptArg::Integer(selection)]);
        map_result(result)
    }

    pub fn script_name(&self) -> &str {
        self.instance.script_name()
    }

    fn bridge_table(&self) -> BridgeTable {
        BridgeTable {
            entries: vec![BridgeEntry::Client(self.client.clone())],
            reactors: Some(self.reactors.clone()),
        }
    }
}

fn map_result(result: ScriptResult) -> InteractionEvent {
    match result {
        ScriptResult::Success(value) => InteractionEvent::Completed(value),
        ScriptResult::Next => InteractionEvent::AwaitingClient,
        ScriptResult::Kick => InteractionEvent::Kick,
        ScriptResult::Warp { map, portal } => InteractionEvent::Warp { map, portal },
        ScriptResult::Failure => InteractionEvent::Aborted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::scripting::{EntryPoint, ScriptValueType};
    use orbis_data::WorldData;
    use orbis_game_common::components::Character;
    use orbis_network_v83::ServerPackets;
    use std::io::Write;

    fn write_script(dir: &std::path::Path, name: &str, source: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(source.as_bytes()).unwrap();
    }

    fn talk_entry() -> Vec<EntryPoint> {
        vec![EntryPoint::new(
            "talk",
            vec![ScriptValueType::Handle(HandleTag::Client)],
            ScriptValueType::Integer,
        )]
    }

    fn test_client() -> Arc<Mutex<GameClient>> {
        let mut client = GameClient::new(
            Character::new(30000, 1, "Hero".to_string()),
            Arc::new(WorldData::default()),
        );
        client.npc = 9000001;
        Arc::new(Mutex::new(client))
    }

    fn start(
        manager: &ScriptManager,
        script: &str,
        client: &Arc<Mutex<GameClient>>,
    ) -> (Interaction, InteractionEvent) {
        Interaction::start(
            manager,
            script,
            0,
            &[],
            client.clone(),
            Arc::new(Mutex::new(ReactorRuntime::new())),
        )
        .unwrap()
    }

    #[test]
    fn dialogue_roundtrip_resumes_with_selection() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "default.lua", "function talk(c) return 0 end");
        write_script(
            dir.path(),
            "greeter.lua",
            r#"
function talk(c)
    c:say("hi")
    local n = c:ask()
    return n
end
"#,
        );
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let client = test_client();

        let (mut interaction, event) = start(&manager, "greeter.lua", &client);
        assert_eq!(event, InteractionEvent::AwaitingClient);

        // say() emitted exactly one dialogue packet before the yield.
        let packets = client.lock().unwrap().drain_packets();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].command, ServerPackets::NpcDialogue as u16);

        let event = interaction.resume(7);
        assert_eq!(
            event,
            InteractionEvent::Completed(ScriptValue::Integer(7))
        );
    }

    #[test]
    fn warp_yield_reports_map_and_portal() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "default.lua", "function talk(c) return 0 end");
        write_script(
            dir.path(),
            "portal.lua",
            "function talk(c) return warp(100000000, 0) end",
        );
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let client = test_client();

        let (interaction, event) = start(&manager, "portal.lua", &client);
        assert_eq!(
            event,
            InteractionEvent::Warp {
                map: 100000000,
                portal: 0
            }
        );
        assert!(event.is_terminal());
        drop(interaction);

        // The context stays serviceable after the instance is detached.
        let (_, event) = start(&manager, "portal.lua", &client);
        assert_eq!(
            event,
            InteractionEvent::Warp {
                map: 100000000,
                portal: 0
            }
        );
    }

    #[test]
    fn kick_yield_disconnects() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "default.lua", "function talk(c) return kick() end");
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let client = test_client();

        let (_, event) = start(&manager, "default.lua", &client);
        assert_eq!(event, InteractionEvent::Kick);
    }

    #[test]
    fn unknown_script_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "default.lua", "function talk(c) return 42 end");
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let client = test_client();

        let (_, event) = start(&manager, "no-such-script.lua", &client);
        assert_eq!(
            event,
            InteractionEvent::Completed(ScriptValue::Integer(42))
        );
    }

    #[test]
    fn runtime_error_aborts_interaction() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "default.lua", "function talk(c) error('nope') end");
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let client = test_client();

        let (_, event) = start(&manager, "default.lua", &client);
        assert_eq!(event, InteractionEvent::Aborted);
    }

    #[test]
    fn missing_entry_point_aborts_interaction() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "default.lua", "-- defines nothing");
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let client = test_client();

        let (_, event) = start(&manager, "default.lua", &client);
        assert_eq!(event, InteractionEvent::Aborted);
    }

    #[test]
    fn broken_script_load_does_not_poison_manager() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "default.lua", "function talk(c) return 1 end");
        write_script(dir.path(), "broken.lua", "function talk( ~~~");
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let client = test_client();

        // The broken file keeps its context but has no entry point.
        let (_, event) = start(&manager, "broken.lua", &client);
        assert_eq!(event, InteractionEvent::Aborted);

        let (_, event) = start(&manager, "default.lua", &client);
        assert_eq!(event, InteractionEvent::Completed(ScriptValue::Integer(1)));
    }

    #[test]
    fn bridge_mutations_apply_to_the_bound_player() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "default.lua",
            r#"
function talk(c)
    if not c:gain_item(2000000, 3) then
        return -1
    end
    c:gain_meso(500)
    c:start_quest(2000)
    return c:item_count(2000000)
end
"#,
        );
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let client = test_client();

        let (_, event) = start(&manager, "default.lua", &client);
        assert_eq!(event, InteractionEvent::Completed(ScriptValue::Integer(3)));

        let client = client.lock().unwrap();
        assert_eq!(client.character.mesos, 500);
        assert!(client.character.quest_log.is_active(2000));
    }

    #[test]
    fn job_constants_are_visible_to_scripts() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "default.lua",
            "function talk(c) return Job.Warrior end",
        );
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let client = test_client();

        let (_, event) = start(&manager, "default.lua", &client);
        assert_eq!(
            event,
            InteractionEvent::Completed(ScriptValue::Integer(100))
        );
    }

    #[test]
    fn reactor_namespace_reaches_the_shared_runtime() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "default.lua",
            r#"
function talk(c)
    Reactor.spawn("boxes", 2002000, 100, 50)
    Reactor.set_state("boxes", 1)
    return 0
end
"#,
        );
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let client = test_client();
        let reactors = Arc::new(Mutex::new(ReactorRuntime::new()));

        let (_, event) = Interaction::start(
            &manager,
            "default.lua",
            0,
            &[],
            client.clone(),
            reactors.clone(),
        )
        .unwrap();
        assert_eq!(event, InteractionEvent::Completed(ScriptValue::Integer(0)));
        assert_eq!(reactors.lock().unwrap().drain_pending().len(), 2);
    }

    #[test]
    fn two_instances_of_one_script_interleave() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "default.lua",
            r#"
function talk(c)
    local n = c:ask()
    return n * 2
end
"#,
        );
        let manager = ScriptManager::new(dir.path(), "default.lua", talk_entry()).unwrap();
        let first_client = test_client();
        let second_client = test_client();

        let (mut first, event) = start(&manager, "default.lua", &first_client);
        assert_eq!(event, InteractionEvent::AwaitingClient);
        let (mut second, event) = start(&manager, "default.lua", &second_client);
        assert_eq!(event, InteractionEvent::AwaitingClient);

        assert_eq!(
            second.resume(5),
            InteractionEvent::Completed(ScriptValue::Integer(10))
        );
        assert_eq!(
            first.resume(3),
            InteractionEvent::Completed(ScriptValue::Integer(6))
        );
    }
}
