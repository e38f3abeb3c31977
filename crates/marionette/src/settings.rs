//! # Settings
//!
//! Startup configuration, loaded once from a TOML file. Every key is
//! optional; missing keys take the defaults below.
//!
//! ```toml
//! tick_rate = 20
//! world_capacity = 256
//! log_level = "info"
//! remove_players_from_player_list = true
//! entity_types = ["PLAYER", "PIG", "COW"]
//!
//! [random]
//! source = "chacha"
//! seed = 42
//!
//! [[npcs]]
//! name = "&aWilbur"
//! entity_type = "pig"
//! at = { x = 0.0, y = 64.0, z = 0.0 }
//! data = { protected = true }
//! ```

use std::path::Path;

use marionette_core::{Location, RandomSource};
use serde::{Deserialize, Serialize};

use crate::error::MarionetteResult;
use crate::metadata::MetadataStore;

/// An NPC to spawn at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NpcSpec {
    /// Full name, `&` colour codes allowed.
    pub name: String,
    /// Entity type name, loosely matched.
    pub entity_type: String,
    /// Spawn location.
    pub at: Location,
    /// Initial metadata.
    #[serde(default)]
    pub data: MetadataStore,
}

/// Framework and harness settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Maximum number of live host entities.
    pub world_capacity: usize,
    /// `tracing` filter directive for the harness.
    pub log_level: String,
    /// Default for the `removefromplayerlist` metadata key.
    pub remove_players_from_player_list: bool,
    /// Entity types controllers may be created for.
    pub entity_types: Vec<String>,
    /// Random source of the simulation.
    pub random: RandomSource,
    /// NPCs the harness spawns at startup.
    pub npcs: Vec<NpcSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_rate: marionette_core::tick::DEFAULT_TICK_RATE,
            world_capacity: 256,
            log_level: "info".to_owned(),
            remove_players_from_player_list: true,
            entity_types: ["PLAYER", "PIG", "COW", "SHEEP", "VILLAGER", "ZOMBIE"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            random: RandomSource::default(),
            npcs: Vec::new(),
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// [`crate::MarionetteError::Config`] on malformed TOML or mistyped keys.
    pub fn from_toml_str(text: &str) -> MarionetteResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a settings file.
    ///
    /// # Errors
    ///
    /// [`crate::MarionetteError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> MarionetteResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded settings");
        Ok(settings)
    }
}
