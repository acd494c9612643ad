mod game;
mod protocol;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use log::{info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tokio::net::TcpListener;

use orbis_data::{ItemDatabase, NpcDatabase, WorldData};

use crate::{
    game::{
        scripting::{EntryPoint, HandleTag, ScriptManager, ScriptValueType},
        storage, ChannelContext,
    },
    protocol::server::ChannelServer,
};

struct ServerConfig {
    bind_addr: String,
    data_dir: PathBuf,
    scripts_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7575".to_string(),
            data_dir: PathBuf::from("data"),
            scripts_dir: PathBuf::from("scripts"),
        }
    }
}

fn load_world_data(data_dir: &Path) -> WorldData {
    let items = match ItemDatabase::load(&data_dir.join("items.json")) {
        Ok(items) => items,
        Err(err) => {
            warn!("Item database unavailable, shops will be empty: {:?}", err);
            ItemDatabase::default()
        }
    };
    let npcs = match NpcDatabase::load(&data_dir.join("npcs.json")) {
        Ok(npcs) => npcs,
        Err(err) => {
            warn!("Npc database unavailable: {:?}", err);
            NpcDatabase::default()
        }
    };
    WorldData { items, npcs }
}

fn client_entry(name: &'static str) -> EntryPoint {
    EntryPoint::new(
        name,
        vec![ScriptValueType::Handle(HandleTag::Client)],
        ScriptValueType::Integer,
    )
}

#[tokio::main]
async fn main() {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("Failed to initialise logger");

    let config = ServerConfig::default();
    let started_load = Instant::now();

    let world = Arc::new(load_world_data(&config.data_dir));

    // All script contexts are created before the listener accepts its first
    // connection.
    let npc_scripts = ScriptManager::new(
        &config.scripts_dir.join("npc"),
        "default.lua",
        vec![client_entry("talk")],
    )
    .expect("Failed to load npc scripts");
    let portal_scripts = ScriptManager::new(
        &config.scripts_dir.join("portal"),
        "default.lua",
        vec![client_entry("enter")],
    )
    .expect("Failed to load portal scripts");
    let reactor_scripts = ScriptManager::new(
        &config.scripts_dir.join("reactor"),
        "default.lua",
        vec![EntryPoint::new(
            "act",
            vec![
                ScriptValueType::Handle(HandleTag::Client),
                ScriptValueType::Integer,
            ],
            ScriptValueType::Integer,
        )],
    )
    .expect("Failed to load reactor scripts");
    let job_scripts = ScriptManager::new(
        &config.scripts_dir.join("job"),
        "default.lua",
        vec![EntryPoint::new(
            "advance",
            vec![
                ScriptValueType::Handle(HandleTag::Client),
                ScriptValueType::Integer,
            ],
            ScriptValueType::Boolean,
        )],
    )
    .expect("Failed to load job advancement scripts");

    info!("Game data loaded in {:?}", started_load.elapsed());

    let (save_tx, save_rx) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        storage::character::run_save_worker(save_rx);
    });

    let context = Arc::new(ChannelContext::new(
        world,
        npc_scripts,
        portal_scripts,
        reactor_scripts,
        job_scripts,
        save_tx,
    ));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind channel listener");
    info!("Channel server listening on {}", config.bind_addr);

    ChannelServer::new(listener, context).run().await;
}
