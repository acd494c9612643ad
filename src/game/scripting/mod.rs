//! Embedded-Lua interaction runtime. Every script file owns a persistent
//! execution context; player interactions run as coroutines spawned inside
//! that context and are resumed as the client's replies arrive.

mod bridge;
mod job;

pub use bridge::{BridgeEntry, BridgeTable, ClientHandle};

use anyhow::Context as AnyhowContext;
use log::{error, warn};
use mlua::{Function, Lua, MultiValue, Thread, ThreadStatus, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Globals installed into every context before the script body runs. The
/// suspension points live here: yields with two values request a warp, one
/// value a disconnect, none the next dialogue click.
const PRELUDE: &str = r#"
function warp(map, portal)
    return coroutine.yield(map, portal or 0)
end

function kick()
    return coroutine.yield(true)
end
"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleTag {
    Client,
}

/// The kinds a script entry point can consume or produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptValueType {
    Boolean,
    Integer,
    Handle(HandleTag),
}

/// A concrete argument for the first resume. Handles are indices into the
/// per-instance [`BridgeTable`]; the VM only ever sees the index.
#[derive(Clone, Copy, Debug)]
pub enum ScriptArg {
    Boolean(bool),
    Integer(i32),
    Handle(HandleTag, usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptValue {
    Boolean(bool),
    Integer(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptResult {
    /// The coroutine ran to completion; the value is coerced to the entry
    /// point's declared result type.
    Success(ScriptValue),
    /// Awaiting the next dialogue click.
    Next,
    /// The script asked for the player to be disconnected.
    Kick,
    /// The server must warp the player.
    Warp { map: u32, portal: u8 },
    /// Runtime error inside the script; the interaction is aborted.
    Failure,
}

#[derive(Clone, Debug)]
pub struct EntryPoint {
    pub name: &'static str,
    pub args: Vec<ScriptValueType>,
    pub result: ScriptValueType,
}

impl EntryPoint {
    pub fn new(
        name: &'static str,
        args: Vec<ScriptValueType>,
        result: ScriptValueType,
    ) -> EntryPoint {
        EntryPoint { name, args, result }
    }
}

/// A loaded script file: its name and its persistent Lua context. The mutex
/// serialises every mutation of the context - spawning a coroutine, resuming
/// it, and detaching it on completion. It is never held between resumes.
pub struct Script {
    name: String,
    lua: Mutex<Lua>,
}

impl Script {
    fn load(path: &Path, name: String) -> Script {
        let lua = Lua::new();
        if let Err(err) = Script::prepare(&lua) {
            error!("Failed to initialise script context {}: {}", name, err);
        }

        match std::fs::read_to_string(path) {
            Ok(source) => {
                if let Err(err) = lua.load(source.as_str()).set_name(name.as_str()).exec() {
                    error!("Failed to load {}: {}", name, err);
                }
            }
            Err(err) => error!("Failed to read {}: {}", name, err),
        }

        Script {
            name,
            lua: Mutex::new(lua),
        }
    }

    fn empty(name: &str) -> Script {
        let lua = Lua::new();
        if let Err(err) = Script::prepare(&lua) {
            error!("Failed to initialise script context {}: {}", name, err);
        }
        Script {
            name: name.to_string(),
            lua: Mutex::new(lua),
        }
    }

    fn prepare(lua: &Lua) -> mlua::Result<()> {
        bridge::register(lua)?;
        job::register(lua)?;
        lua.load(PRELUDE).set_name("prelude").exec()
    }
}

/// Owns one script context per file in a directory. Callers address scripts
/// by file name and entry points by the index they were registered with.
pub struct ScriptManager {
    default: Arc<Script>,
    scripts: Vec<Arc<Script>>,
    entry_points: Vec<EntryPoint>,
}

impl ScriptManager {
    /// Scans `dir` and loads every regular file as a script. Load failures
    /// are logged and the manager proceeds; interactions against a broken
    /// script fail at run time instead.
    pub fn new(
        dir: &Path,
        default_name: &str,
        entry_points: Vec<EntryPoint>,
    ) -> Result<ScriptManager, anyhow::Error> {
        let mut scripts = Vec::new();
        let mut default = None;

        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to open script directory {}", dir.to_string_lossy()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') {
                continue;
            }

            let script = Arc::new(Script::load(&entry.path(), file_name.clone()));
            if file_name == default_name {
                default = Some(script);
            } else {
                scripts.push(script);
            }
        }

        let default = default.unwrap_or_else(|| {
            warn!(
                "Default script {} not found in {}",
                default_name,
                dir.to_string_lossy()
            );
            Arc::new(Script::empty(default_name))
        });

        Ok(ScriptManager {
            default,
            scripts,
            entry_points,
        })
    }

    /// Spawns a coroutine for `(name, entry)` inside the matching script's
    /// context, falling back to the default script for unknown names. The
    /// context mutex is held only for the duration of the spawn. Returns
    /// None when the coroutine cannot be allocated.
    pub fn alloc(&self, name: &str, entry: usize) -> Option<ScriptInstance> {
        let entry = self.entry_points.get(entry)?.clone();
        let script = self
            .scripts
            .iter()
            .find(|script| script.name == name)
            .unwrap_or(&self.default)
            .clone();

        let thread = {
            let lua = script.lua.lock().unwrap();
            let function: Option<Function> = lua.globals().get(entry.name).ok().flatten();
            match function {
                Some(function) => match lua.create_thread(function) {
                    Ok(thread) => Some(thread),
                    Err(err) => {
                        warn!("Failed to spawn coroutine in {}: {}", script.name, err);
                        return None;
                    }
                },
                // Looked up again at run time so the error surfaces as a
                // script failure rather than a missing interaction.
                None => None,
            }
        };

        Some(ScriptInstance {
            thread,
            script,
            entry,
            started: false,
        })
    }
}

/// One live interaction: a coroutine bound to a player, its parent script and
/// entry-point descriptor, plus the flag separating the first resume from
/// subsequent ones.
pub struct ScriptInstance {
    thread: Option<Thread>,
    script: Arc<Script>,
    entry: EntryPoint,
    started: bool,
}

impl ScriptInstance {
    pub fn script_name(&self) -> &str {
        &self.script.name
    }

    /// Resumes the coroutine. The first call consumes the entry point's full
    /// argument vector; every later call consumes exactly one integer (the
    /// selection the client returned). `bridge` is visible to native
    /// callables for the duration of this resume only.
    pub fn run(&mut self, bridge: BridgeTable, args: &[ScriptArg]) -> ScriptResult {
        let lua = self.script.lua.lock().unwrap();

        let thread = match &self.thread {
            Some(thread) => thread.clone(),
            None => {
                error!(
                    "Unknown entry point {} in script {}",
                    self.entry.name, self.script.name
                );
                return ScriptResult::Failure;
            }
        };

        let resume_args = if !self.started {
            self.started = true;
            match build_start_args(&lua, &self.entry, args) {
                Some(values) => values,
                None => return ScriptResult::Failure,
            }
        } else {
            match args {
                [ScriptArg::Integer(selection)] => {
                    MultiValue::from_vec(vec![Value::Integer(*selection as i64)])
                }
                _ => {
                    error!(
                        "Resume of {} expects exactly one integer argument",
                        self.entry.name
                    );
                    return ScriptResult::Failure;
                }
            }
        };

        lua.set_app_data(bridge);
        let resumed: mlua::Result<MultiValue> = thread.resume(resume_args);
        lua.remove_app_data::<BridgeTable>();

        match resumed {
            Ok(values) => {
                if thread.status() == ThreadStatus::Resumable {
                    let values: Vec<Value> = values.into_iter().collect();
                    match values.len() {
                        0 => ScriptResult::Next,
                        1 => ScriptResult::Kick,
                        _ => ScriptResult::Warp {
                            map: coerce_integer(&values[0]) as u32,
                            portal: coerce_integer(&values[1]) as u8,
                        },
                    }
                } else {
                    // Top of the stack, for scripts that return several values.
                    let top = values.into_iter().last().unwrap_or(Value::Nil);
                    let value = match self.entry.result {
                        ScriptValueType::Boolean => ScriptValue::Boolean(coerce_boolean(&top)),
                        _ => ScriptValue::Integer(coerce_integer(&top)),
                    };
                    ScriptResult::Success(value)
                }
            }
            Err(err) => {
                error!("Lua error: {}", err);
                ScriptResult::Failure
            }
        }
    }
}

impl Drop for ScriptInstance {
    fn drop(&mut self) {
        // Detach the coroutine under the context mutex; it is never resumed
        // again, and no script-side cleanup runs.
        if let Some(thread) = self.thread.take() {
            let _lua = self.script.lua.lock().unwrap();
            drop(thread);
        }
    }
}

fn build_start_args(lua: &Lua, entry: &EntryPoint, args: &[ScriptArg]) -> Option<MultiValue> {
    if args.len() != entry.args.len() {
        error!(
            "Entry point {} expects {} arguments, got {}",
            entry.name,
            entry.args.len(),
            args.len()
        );
        return None;
    }

    let mut values = Vec::with_capacity(args.len());
    for (kind, arg) in entry.args.iter().zip(args) {
        let value = match (kind, arg) {
            (ScriptValueType::Boolean, ScriptArg::Boolean(value)) => Value::Boolean(*value),
            (ScriptValueType::Integer, ScriptArg::Integer(value)) => {
                Value::Integer(*value as i64)
            }
            (
                ScriptValueType::Handle(HandleTag::Client),
                ScriptArg::Handle(HandleTag::Client, index),
            ) => match lua.create_userdata(ClientHandle { index: *index }) {
                Ok(userdata) => Value::UserData(userdata),
                Err(err) => {
                    error!("Failed to create handle userdata: {}", err);
                    return None;
                }
            },
            _ => {
                error!("Argument type mismatch for entry point {}", entry.name);
                return None;
            }
        };
        values.push(value);
    }

    Some(MultiValue::from_vec(values))
}

/// `lua_tointeger` semantics: numbers coerce, everything else is zero.
fn coerce_integer(value: &Value) -> i64 {
    match value {
        Value::Integer(value) => *value,
        Value::Number(value) => *value as i64,
        _ => 0,
    }
}

/// `lua_toboolean` semantics: only nil and false are falsy.
fn coerce_boolean(value: &Value) -> bool {
    !matches!(value, Value::Nil | Value::Boolean(false))
}
