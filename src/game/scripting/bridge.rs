//! Native callables exposed to scripts. Handles carry only a tag and an
//! index into the per-resume [`BridgeTable`]; the live objects are resolved
//! on the native side. Host errors never cross into the VM as exceptions -
//! they become nil/false and a log line.

use log::error;
use mlua::{Function, Lua, Table, UserData, UserDataFields, UserDataRef};
use std::sync::{Arc, Mutex};

use orbis_network_v83::NpcDialogueType;

use crate::game::{client::GameClient, reactor::ReactorRuntime};

/// The live objects a resume may touch, installed into the context's app data
/// for the duration of that resume only.
pub struct BridgeTable {
    pub entries: Vec<BridgeEntry>,
    pub reactors: Option<Arc<Mutex<ReactorRuntime>>>,
}

pub enum BridgeEntry {
    Client(Arc<Mutex<GameClient>>),
}

/// Userdata handed to scripts in place of a client pointer.
pub struct ClientHandle {
    pub index: usize,
}

impl UserData for ClientHandle {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_meta_field_with("__index", client_index_table);
    }
}

/// Installs the bridge API into a fresh script context.
pub fn register(lua: &Lua) -> mlua::Result<()> {
    let reactor = lua.create_table()?;
    reactor.set("spawn", lua.create_function(reactor_spawn)?)?;
    reactor.set("set_state", lua.create_function(reactor_set_state)?)?;
    reactor.set("despawn", lua.create_function(reactor_despawn)?)?;
    lua.globals().set("Reactor", reactor)?;
    Ok(())
}

fn with_client<R>(lua: &Lua, index: usize, f: impl FnOnce(&mut GameClient) -> R) -> Option<R> {
    let table = match lua.app_data_ref::<BridgeTable>() {
        Some(table) => table,
        None => {
            error!("Bridge call outside of a script resume");
            return None;
        }
    };
    let BridgeEntry::Client(client) = table.entries.get(index)?;
    let mut client = client.lock().unwrap();
    Some(f(&mut client))
}

fn with_reactors<R>(lua: &Lua, f: impl FnOnce(&mut ReactorRuntime) -> R) -> Option<R> {
    let table = lua.app_data_ref::<BridgeTable>()?;
    let reactors = table.reactors.as_ref()?;
    let mut reactors = reactors.lock().unwrap();
    Some(f(&mut reactors))
}

fn dialogue_kind(kind: Option<&str>) -> NpcDialogueType {
    match kind {
        Some("ok") => NpcDialogueType::Ok,
        Some("yesno") => NpcDialogueType::YesNo,
        Some("prev") => NpcDialogueType::Prev,
        Some("prevnext") => NpcDialogueType::PrevNext,
        _ => NpcDialogueType::Next,
    }
}

fn client_index_table(lua: &Lua) -> mlua::Result<Table> {
    let methods = lua.create_table()?;

    methods.set(
        "say",
        lua.create_function(
            |lua, (this, message, kind): (UserDataRef<ClientHandle>, String, Option<String>)| {
                with_client(lua, this.index, |client| {
                    client.send_dialogue(dialogue_kind(kind.as_deref()), &message);
                });
                Ok(())
            },
        )?,
    )?;

    methods.set(
        "name",
        lua.create_function(|lua, this: UserDataRef<ClientHandle>| {
            Ok(with_client(lua, this.index, |client| {
                client.character.name.clone()
            }))
        })?,
    )?;

    methods.set(
        "level",
        lua.create_function(|lua, this: UserDataRef<ClientHandle>| {
            Ok(with_client(lua, this.index, |client| {
                client.character.level as i64
            })
            .unwrap_or(0))
        })?,
    )?;

    methods.set(
        "job",
        lua.create_function(|lua, this: UserDataRef<ClientHandle>| {
            Ok(
                with_client(lua, this.index, |client| client.character.job.id() as i64)
                    .unwrap_or(0),
            )
        })?,
    )?;

    methods.set(
        "set_job",
        lua.create_function(|lua, (this, job): (UserDataRef<ClientHandle>, u16)| {
            Ok(with_client(lua, this.index, |client| client.set_job(job)).unwrap_or(false))
        })?,
    )?;

    methods.set(
        "mesos",
        lua.create_function(|lua, this: UserDataRef<ClientHandle>| {
            Ok(with_client(lua, this.index, |client| {
                client.character.mesos as i64
            })
            .unwrap_or(0))
        })?,
    )?;

    methods.set(
        "gain_meso",
        lua.create_function(|lua, (this, amount): (UserDataRef<ClientHandle>, i32)| {
            Ok(with_client(lua, this.index, |client| client.gain_meso(amount)).unwrap_or(false))
        })?,
    )?;

    methods.set(
        "gain_item",
        lua.create_function(
            |lua, (this, item_id, quantity): (UserDataRef<ClientHandle>, u32, Option<i16>)| {
                Ok(with_client(lua, this.index, |client| {
                    client.gain_item(item_id, quantity.unwrap_or(1))
                })
                .unwrap_or(false))
            },
        )?,
    )?;

    methods.set(
        "take_item",
        lua.create_function(
            |lua, (this, item_id, quantity): (UserDataRef<ClientHandle>, u32, Option<i16>)| {
                Ok(with_client(lua, this.index, |client| {
                    client.take_item(item_id, quantity.unwrap_or(1))
                })
                .unwrap_or(false))
            },
        )?,
    )?;

    methods.set(
        "item_count",
        lua.create_function(
            |lua, (this, item_id): (UserDataRef<ClientHandle>, u32)| {
                Ok(
                    with_client(lua, this.index, |client| client.item_count(item_id))
                        .unwrap_or(0),
                )
            },
        )?,
    )?;

    methods.set(
        "gain_exp",
        lua.create_function(|lua, (this, amount): (UserDataRef<ClientHandle>, i32)| {
            with_client(lua, this.index, |client| client.gain_exp(amount));
            Ok(())
        })?,
    )?;

    methods.set(
        "change_map",
        lua.create_function(
            |lua, (this, map, portal): (UserDataRef<ClientHandle>, u32, Option<u8>)| {
                with_client(lua, this.index, |client| {
                    client.change_map(map, portal.unwrap_or(0));
                });
                Ok(())
            },
        )?,
    )?;

    methods.set(
        "start_quest",
        lua.create_function(|lua, (this, quest): (UserDataRef<ClientHandle>, u16)| {
            Ok(with_client(lua, this.index, |client| client.start_quest(quest)).unwrap_or(false))
        })?,
    )?;

    methods.set(
        "end_quest",
        lua.create_function(
            |lua, (this, quest, next): (UserDataRef<ClientHandle>, u16, Option<u16>)| {
                Ok(with_client(lua, this.index, |client| {
                    client.end_quest(quest, next.unwrap_or(0))
                })
                .unwrap_or(false))
            },
        )?,
    )?;

    methods.set(
        "forfeit_quest",
        lua.create_function(|lua, (this, quest): (UserDataRef<ClientHandle>, u16)| {
            Ok(
                with_client(lua, this.index, |client| client.forfeit_quest(quest))
                    .unwrap_or(false),
            )
        })?,
    )?;

    methods.set(
        "has_quest",
        lua.create_function(|lua, (this, quest): (UserDataRef<ClientHandle>, u16)| {
            Ok(with_client(lua, this.index, |client| {
                client.character.quest_log.is_active(quest)
            })
            .unwrap_or(false))
        })?,
    )?;

    methods.set(
        "has_completed_quest",
        lua.create_function(|lua, (this, quest): (UserDataRef<ClientHandle>, u16)| {
            Ok(with_client(lua, this.index, |client| {
                client.character.quest_log.is_completed(quest)
            })
            .unwrap_or(false))
        })?,
    )?;

    methods.set(
        "quest_info",
        lua.create_function(|lua, (this, quest): (UserDataRef<ClientHandle>, u16)| {
            Ok(with_client(lua, this.index, |client| {
                client
                    .character
                    .quest_log
                    .get_info(quest)
                    .unwrap_or("")
                    .to_string()
            }))
        })?,
    )?;

    methods.set(
        "set_quest_info",
        lua.create_function(
            |lua, (this, quest, value): (UserDataRef<ClientHandle>, u16, String)| {
                with_client(lua, this.index, |client| {
                    client.set_quest_info(quest, value);
                });
                Ok(())
            },
        )?,
    )?;

    methods.set(
        "open_shop",
        lua.create_function(|lua, (this, npc_id): (UserDataRef<ClientHandle>, u32)| {
            Ok(with_client(lua, this.index, |client| client.open_shop(npc_id)).unwrap_or(false))
        })?,
    )?;

    methods.set(
        "show_effect",
        lua.create_function(|lua, (this, effect): (UserDataRef<ClientHandle>, u8)| {
            with_client(lua, this.index, |client| client.show_effect(effect));
            Ok(())
        })?,
    )?;

    // Suspension point: parks the coroutine until the dispatcher feeds the
    // client's reply back through the next resume.
    let ask: Function = lua
        .load("return function(self) return coroutine.yield() end")
        .set_name("ask")
        .eval()?;
    methods.set("ask", ask)?;

    Ok(methods)
}

fn reactor_spawn(
    lua: &Lua,
    (name, reactor_id, x, y): (String, u32, i16, i16),
) -> mlua::Result<bool> {
    Ok(
        with_reactors(lua, |reactors| reactors.spawn(&name, reactor_id, x, y).is_some())
            .unwrap_or(false),
    )
}

fn reactor_set_state(lua: &Lua, (name, state): (String, u8)) -> mlua::Result<bool> {
    Ok(with_reactors(lua, |reactors| reactors.set_state(&name, state)).unwrap_or(false))
}

fn reactor_despawn(lua: &Lua, name: String) -> mlua::Result<bool> {
    Ok(with_reactors(lua, |reactors| reactors.despawn(&name)).unwrap_or(false))
}
