//! Server configuration loading and typed config structures.
//!
//! The canonical configuration lives in `mistvale.yaml` at the server
//! root. Every field has a default matching the design values, so an
//! empty file (or no file) boots a working server. Environment variables
//! override the data-directory paths for containerized deployments.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use mistvale_entities::validation::ProximityConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RealmConfig {
    /// Simulation timing and caps.
    #[serde(default)]
    pub world: WorldConfig,

    /// Proximity gates, in tile units.
    #[serde(default)]
    pub proximity: ProximityTable,

    /// Party limits and XP split parameters.
    #[serde(default)]
    pub party: PartyConfig,

    /// Dungeon instance limits.
    #[serde(default)]
    pub dungeon: DungeonConfig,

    /// External ledger call parameters.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Persistence paths.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl RealmConfig {
    /// Load configuration from a YAML file, then apply environment
    /// overrides (`MISTVALE_DATA_DIR`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.storage.apply_env_overrides();
        Ok(config)
    }

    /// The clock period as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.world.tick_interval_ms)
    }

    /// The ledger call deadline as a [`Duration`].
    pub const fn ledger_deadline(&self) -> Duration {
        Duration::from_millis(self.ledger.call_timeout_ms)
    }
}

/// Simulation timing and world caps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Clock period per zone, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Default mob respawn delay for loot tables without an override.
    #[serde(default = "default_mob_respawn_ticks")]
    pub mob_respawn_ticks_default: u64,

    /// Ticks between a player's death and their respawn.
    #[serde(default = "default_player_respawn_ticks")]
    pub player_respawn_delay_ticks: u64,

    /// Ticks between player auto-attack swings.
    #[serde(default = "default_attack_cooldown_ticks")]
    pub attack_cooldown_ticks: u64,

    /// Bounded length of each zone's event ring.
    #[serde(default = "default_event_ring_capacity")]
    pub event_ring_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            mob_respawn_ticks_default: default_mob_respawn_ticks(),
            player_respawn_delay_ticks: default_player_respawn_ticks(),
            attack_cooldown_ticks: default_attack_cooldown_ticks(),
            event_ring_capacity: default_event_ring_capacity(),
        }
    }
}

/// Proximity gates. Mirrors [`ProximityConfig`] with serde defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProximityTable {
    /// NPC interaction range.
    #[serde(default = "default_npc_proximity")]
    pub npc: f64,
    /// Portal range.
    #[serde(default = "default_portal_proximity")]
    pub portal: f64,
    /// Enchanting altar range.
    #[serde(default = "default_altar_proximity")]
    pub altar: f64,
    /// Dungeon gate range (per party member).
    #[serde(default = "default_gate_proximity")]
    pub gate: f64,
    /// Resource node range.
    #[serde(default = "default_node_proximity")]
    pub node: f64,
    /// Forge / alchemy lab range.
    #[serde(default = "default_station_proximity")]
    pub station: f64,
    /// Attack engagement range.
    #[serde(default = "default_attack_proximity")]
    pub attack: f64,
}

impl Default for ProximityTable {
    fn default() -> Self {
        Self {
            npc: default_npc_proximity(),
            portal: default_portal_proximity(),
            altar: default_altar_proximity(),
            gate: default_gate_proximity(),
            node: default_node_proximity(),
            station: default_station_proximity(),
            attack: default_attack_proximity(),
        }
    }
}

impl ProximityTable {
    /// Convert to the validation-layer table.
    pub const fn to_validation(&self) -> ProximityConfig {
        ProximityConfig {
            npc: self.npc,
            portal: self.portal,
            altar: self.altar,
            gate: self.gate,
            node: self.node,
            station: self.station,
            attack: self.attack,
        }
    }
}

/// Party limits and XP split parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartyConfig {
    /// Maximum party size.
    #[serde(default = "default_party_max_size")]
    pub max_size: usize,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            max_size: default_party_max_size(),
        }
    }
}

/// Dungeon instance limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DungeonConfig {
    /// Milliseconds between dungeon monitor sweeps.
    #[serde(default = "default_dungeon_tick_ms")]
    pub tick_interval_ms: u64,

    /// Per-rank time-limit overrides in milliseconds, keyed by rank
    /// letter. Ranks without an override use the catalog row.
    #[serde(default)]
    pub time_limit_overrides_ms: BTreeMap<String, u64>,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_dungeon_tick_ms(),
            time_limit_overrides_ms: BTreeMap::new(),
        }
    }
}

/// External ledger call parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Deadline for every adapter call, in milliseconds. A call past the
    /// deadline counts as a transient failure for compensation.
    #[serde(default = "default_ledger_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_ledger_timeout_ms(),
        }
    }
}

/// Persistence paths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Root directory for character and chunk files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Apply `MISTVALE_DATA_DIR` over the YAML value.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("MISTVALE_DATA_DIR")
            && !dir.is_empty()
        {
            self.data_dir = dir;
        }
    }
}

const fn default_tick_interval_ms() -> u64 {
    500
}

const fn default_mob_respawn_ticks() -> u64 {
    20
}

const fn default_player_respawn_ticks() -> u64 {
    10
}

const fn default_attack_cooldown_ticks() -> u64 {
    2
}

const fn default_event_ring_capacity() -> usize {
    512
}

fn default_npc_proximity() -> f64 {
    50.0
}

fn default_portal_proximity() -> f64 {
    30.0
}

fn default_altar_proximity() -> f64 {
    100.0
}

fn default_gate_proximity() -> f64 {
    50.0
}

fn default_node_proximity() -> f64 {
    50.0
}

fn default_station_proximity() -> f64 {
    50.0
}

fn default_attack_proximity() -> f64 {
    50.0
}

const fn default_party_max_size() -> usize {
    5
}

const fn default_dungeon_tick_ms() -> u64 {
    1_000
}

const fn default_ledger_timeout_ms() -> u64 {
    2_000
}

fn default_data_dir() -> String {
    String::from("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = RealmConfig::parse("{}");
        let Ok(config) = config else {
            assert!(config.is_ok());
            return;
        };
        assert_eq!(config.world.tick_interval_ms, 500);
        assert_eq!(config.ledger.call_timeout_ms, 2_000);
        assert_eq!(config.party.max_size, 5);
        assert!((config.proximity.portal - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_yaml_overrides_defaults() {
        let yaml = r"
world:
  tick_interval_ms: 250
proximity:
  altar: 80.0
";
        let config = RealmConfig::parse(yaml);
        let Ok(config) = config else {
            assert!(config.is_ok());
            return;
        };
        assert_eq!(config.world.tick_interval_ms, 250);
        assert!((config.proximity.altar - 80.0).abs() < f64::EPSILON);
        // Untouched keys keep their defaults.
        assert_eq!(config.world.mob_respawn_ticks_default, 20);
    }

    #[test]
    fn durations_derive_from_millis() {
        let config = RealmConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.ledger_deadline(), Duration::from_millis(2_000));
    }
}
