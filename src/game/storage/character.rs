use anyhow::Context;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::{io::Write, path::PathBuf};

use orbis_game_common::components::Character;

use crate::game::storage::CHARACTER_STORAGE_DIR;

/// The persisted snapshot of a character: everything the channel needs to
/// rebuild the in-map state on the next login.
#[derive(Deserialize, Serialize)]
pub struct CharacterStorage {
    pub character: Character,
}

fn get_character_path(name: &str) -> PathBuf {
    CHARACTER_STORAGE_DIR.join(format!("{}.json", name))
}

impl CharacterStorage {
    pub fn try_create(&self) -> Result<(), anyhow::Error> {
        self.save_character_impl(false)
    }

    pub fn try_load(name: &str) -> Result<Self, anyhow::Error> {
        let path = get_character_path(name);
        let str = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file {}", path.to_string_lossy()))?;
        let character: CharacterStorage = serde_json::from_str(&str).with_context(|| {
            format!(
                "Failed to deserialise CharacterStorage from file {}",
                path.to_string_lossy()
            )
        })?;
        Ok(character)
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        self.save_character_impl(true)
    }

    fn save_character_impl(&self, allow_overwrite: bool) -> Result<(), anyhow::Error> {
        let path = get_character_path(&self.character.name);
        let storage_dir = path.parent().unwrap();

        std::fs::create_dir_all(storage_dir).with_context(|| {
            format!(
                "Failed to create character storage directory {}",
                storage_dir.to_string_lossy()
            )
        })?;

        let json = serde_json::to_string_pretty(&self).with_context(|| {
            format!(
                "Failed to serialise CharacterStorage whilst saving character {}",
                &self.character.name
            )
        })?;

        let mut file = tempfile::Builder::new()
            .tempfile_in(storage_dir)
            .with_context(|| {
                format!(
                    "Failed to create temporary file whilst saving character {}",
                    &self.character.name
                )
            })?;
        file.write_all(json.as_bytes()).with_context(|| {
            format!(
                "Failed to write data to temporary file whilst saving character {}",
                &self.character.name
            )
        })?;

        if allow_overwrite {
            file.persist(&path).with_context(|| {
                format!(
                    "Failed to persist temporary character file to path {}",
                    path.to_string_lossy()
                )
            })?;
        } else {
            file.persist_noclobber(&path).with_context(|| {
                format!(
                    "Failed to persist_noclobber character file to path {}",
                    path.to_string_lossy()
                )
            })?;
        }

        Ok(())
    }

    pub fn exists(name: &str) -> bool {
        get_character_path(name).exists()
    }

    pub fn delete(name: &str) -> Result<(), anyhow::Error> {
        let path = get_character_path(name);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Drains logout snapshots off the save queue. Runs on its own thread so the
/// connection workers never block on disk.
pub fn run_save_worker(save_queue: crossbeam_channel::Receiver<CharacterStorage>) {
    while let Ok(snapshot) = save_queue.recv() {
        let name = snapshot.character.name.clone();
        match snapshot.save() {
            Ok(()) => info!("Saved character {}", name),
            Err(err) => error!("Failed to save character {}: {:?}", name, err),
        }
    }
}
