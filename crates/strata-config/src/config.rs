//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_terrain::TerrainConfig;
use strata_voxel::WorldParameters;

use crate::error::ConfigError;

/// File name used inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

const APP_NAME: &str = "strata";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Per-world constants.
    pub world: WorldParameters,
    /// Terrain generator tunables.
    pub terrain: TerrainConfig,
    /// Chunk streaming radii.
    pub streaming: StreamingConfig,
    /// Background worker pool sizes.
    pub workers: WorkerConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Load and unload radii around each observer, in chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Frontier chunks closer than this are loaded.
    pub load_radius: f32,
    /// Loaded chunks farther than this from every observer are unloaded.
    pub unload_radius: f32,
}

/// Worker thread counts. Zero means "pick from the CPU count".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Terrain generation threads.
    pub generation_threads: usize,
    /// Meshing threads.
    pub meshing_threads: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter (e.g. `"info"`, `"debug,strata_world=trace"`).
    pub log_level: String,
    /// Also write JSON logs to a file in debug builds.
    pub file_logging: bool,
}

// --- Default implementations ---

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_radius: 4.0,
            unload_radius: 6.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            file_logging: true,
        }
    }
}

impl WorkerConfig {
    /// Generation thread count with zero resolved against the CPU count.
    pub fn resolved_generation_threads(&self) -> usize {
        match self.generation_threads {
            0 => num_cpus::get().saturating_sub(2).max(1),
            n => n,
        }
    }

    /// Meshing thread count with zero resolved against the CPU count.
    pub fn resolved_meshing_threads(&self) -> usize {
        match self.meshing_threads {
            0 => (num_cpus::get() / 2).max(1),
            n => n,
        }
    }
}

/// Platform config directory for strata, e.g. `~/.config/strata` on Linux.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_NAME))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-reads the file: `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Checks ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| ConfigError::Invalid {
            field,
            reason: reason.to_string(),
        };
        if !(self.world.resolution > 0.0) {
            return Err(invalid("world.resolution", "must be positive"));
        }
        if self.world.chunk_size == 0 || self.world.chunk_height == 0 {
            return Err(invalid("world.chunk_size", "chunk dimensions must be non-zero"));
        }
        if self.world.world_height_chunks <= 0 {
            return Err(invalid("world.world_height_chunks", "must be positive"));
        }
        let layers = [
            ("terrain.continentalness.frequency", &self.terrain.continentalness),
            ("terrain.erosion.frequency", &self.terrain.erosion),
        ];
        for (field, layer) in layers {
            if !(layer.frequency.is_finite() && layer.frequency > 0.0) {
                return Err(invalid(field, "must be a positive finite number"));
            }
        }
        if !(self.streaming.load_radius > 0.0) {
            return Err(invalid("streaming.load_radius", "must be positive"));
        }
        if self.streaming.unload_radius < self.streaming.load_radius {
            return Err(invalid(
                "streaming.unload_radius",
                "must not be smaller than load_radius",
            ));
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }
}

#[cfg(test)]
mod tests {
    use strata_voxel::VoxelType;

    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(4))
                .unwrap();
        assert!(ron_str.contains("chunk_size: 16"));
        assert!(ron_str.contains("load_radius: 4.0"));
        assert!(ron_str.contains("ground: grass"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let config: Config = ron::from_str("(world: (seed: 9), debug: ())").unwrap();
        assert_eq!(config.world.seed, 9);
        assert_eq!(config.world.chunk_size, 16);
        assert_eq!(config.streaming, StreamingConfig::default());
        assert_eq!(config.terrain, TerrainConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_terrain_section_parses() {
        let config: Config = ron::from_str("(terrain: (ground: stone, worst_case: true))").unwrap();
        assert_eq!(config.terrain.ground, VoxelType::Stone);
        assert!(config.terrain.worst_case);
    }

    #[test]
    fn test_bad_spline_rejected() {
        let ron_str = "(terrain: (erosion: (frequency: 0.1, spline: [])))";
        assert!(ron::from_str::<Config>(ron_str).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.world.seed = 77;
        config.streaming.load_radius = 2.5;
        config.workers.meshing_threads = 3;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let created = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(created, Config::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.world.seed = 1234;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.map(|c| c.world.seed), Some(1234));
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.streaming.unload_radius = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "streaming.unload_radius",
                ..
            })
        ));

        let mut config = Config::default();
        config.world.resolution = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_frequency() {
        for bad in [f64::NAN, f64::INFINITY, 0.0, -0.5] {
            let mut config = Config::default();
            config.terrain.erosion.frequency = bad;
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::Invalid {
                        field: "terrain.erosion.frequency",
                        ..
                    })
                ),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn test_worker_counts_resolve() {
        let workers = WorkerConfig::default();
        assert!(workers.resolved_generation_threads() >= 1);
        assert!(workers.resolved_meshing_threads() >= 1);
        let fixed = WorkerConfig {
            generation_threads: 3,
            meshing_threads: 5,
        };
        assert_eq!(fixed.resolved_generation_threads(), 3);
        assert_eq!(fixed.resolved_meshing_threads(), 5);
    }
}
