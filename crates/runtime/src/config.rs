//! Orchestrator configuration structures and loaders.
//!
//! Settings come from a TOML file, with a few environment overrides applied
//! on top:
//!
//! ```toml
//! circuits_root = "circuits"
//! game_config = "darkforest.toml"
//! cache_dir = ".proof-cache"        # optional, platform cache dir otherwise
//!
//! [prover]
//! backend = "nargo"                 # or "stub"
//! program = "nargo"
//! args = ["prove"]
//! timeout_secs = 600
//!
//! [circuits.init]
//! value_width = "word"
//!
//! [circuits.move]
//! dir = "move"
//! package = "move"
//! value_width = "narrow"
//! move_layout = "min-radius"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use df_zk::{CircuitHandle, CircuitKind, CircuitRevision, GameParams, HexWidth, MoveLayout};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value `{value}` for {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("no `[circuits.{0}]` table configured")]
    MissingCircuit(CircuitKind),

    #[error("`[circuits.move]` must set `move_layout`")]
    MissingMoveLayout,
}

/// Which proving backend the orchestrator drives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProverBackendKind {
    /// External `nargo` toolchain.
    #[default]
    Nargo,
    /// In-process stub engine; proofs are not sound.
    Stub,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    pub backend: ProverBackendKind,
    pub program: String,
    pub args: Vec<String>,
    /// Kill the prover after this many seconds. Unset waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            backend: ProverBackendKind::Nargo,
            program: "nargo".to_string(),
            args: vec!["prove".to_string()],
            timeout_secs: None,
        }
    }
}

impl ProverConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// One `[circuits.<kind>]` table.
///
/// `value_width` has no default: deployed revisions disagree on padding and
/// guessing would silently produce witnesses the circuit rejects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Directory under `circuits_root`; defaults to the kind's name.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Nargo package name; defaults to the kind's name.
    #[serde(default)]
    pub package: Option<String>,
    pub value_width: HexWidth,
    #[serde(default)]
    pub move_layout: Option<MoveLayout>,
}

impl CircuitConfig {
    pub fn revision(&self) -> CircuitRevision {
        CircuitRevision {
            value_width: self.value_width,
            move_layout: self.move_layout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub circuits_root: PathBuf,
    /// Game deployment config holding the `[initializers]` table.
    pub game_config: PathBuf,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub circuits: BTreeMap<CircuitKind, CircuitConfig>,
}

impl OrchestratorConfig {
    /// Load from a TOML file, then apply environment overrides.
    ///
    /// Environment variables:
    /// - `DFPROVE_CIRCUITS_ROOT` - Directory holding the circuit packages
    /// - `DFPROVE_GAME_CONFIG` - Path of the game deployment config
    /// - `DFPROVE_CACHE_DIR` - Proof cache directory
    /// - `DFPROVE_BACKEND` - `nargo` or `stub`
    /// - `DFPROVE_PROVER_TIMEOUT_SECS` - Prover timeout in seconds
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or(Path::new("."));

        let mut config = Self::from_toml_str(&text, base_dir).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        config.apply_env()?;
        config.validate()?;

        tracing::debug!(
            "Loaded orchestrator config from {} ({} circuits, backend {})",
            path.display(),
            config.circuits.len(),
            config.prover.backend
        );
        Ok(config)
    }

    /// Parse without touching the environment; relative paths are joined
    /// onto `base_dir`.
    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.circuits_root = base_dir.join(&config.circuits_root);
        config.game_config = base_dir.join(&config.game_config);
        config.cache_dir = config.cache_dir.map(|dir| base_dir.join(dir));
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(root) = env::var("DFPROVE_CIRCUITS_ROOT") {
            self.circuits_root = PathBuf::from(root);
        }
        if let Ok(game_config) = env::var("DFPROVE_GAME_CONFIG") {
            self.game_config = PathBuf::from(game_config);
        }
        if let Ok(cache_dir) = env::var("DFPROVE_CACHE_DIR") {
            self.cache_dir = Some(PathBuf::from(cache_dir));
        }
        if let Ok(backend) = env::var("DFPROVE_BACKEND") {
            self.prover.backend = backend.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "DFPROVE_BACKEND",
                value: backend,
            })?;
        }
        if let Ok(raw) = env::var("DFPROVE_PROVER_TIMEOUT_SECS") {
            let secs = read_env::<u64>("DFPROVE_PROVER_TIMEOUT_SECS").ok_or(
                ConfigError::InvalidEnv {
                    key: "DFPROVE_PROVER_TIMEOUT_SECS",
                    value: raw,
                },
            )?;
            self.prover.timeout_secs = Some(secs);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(circuit) = self.circuits.get(&CircuitKind::Move)
            && circuit.move_layout.is_none()
        {
            return Err(ConfigError::MissingMoveLayout);
        }
        Ok(())
    }

    pub fn circuit(&self, kind: CircuitKind) -> Result<&CircuitConfig, ConfigError> {
        self.circuits
            .get(&kind)
            .ok_or(ConfigError::MissingCircuit(kind))
    }

    /// Working directory and package of a configured circuit.
    pub fn circuit_handle(&self, kind: CircuitKind) -> Result<CircuitHandle, ConfigError> {
        let circuit = self.circuit(kind)?;
        let dir = match &circuit.dir {
            Some(dir) => self.circuits_root.join(dir),
            None => self.circuits_root.join(kind.default_dir_name()),
        };
        let handle = CircuitHandle::new(kind, dir);
        Ok(match &circuit.package {
            Some(package) => handle.with_package(package.clone()),
            None => handle,
        })
    }

    /// Configured cache directory, or the platform cache directory.
    ///
    /// - Linux: `~/.cache/dfprove/proofs` (or `$XDG_CACHE_HOME/dfprove/proofs`)
    /// - macOS: `~/Library/Caches/dfprove/proofs`
    /// - Fallback: `/tmp/dfprove/proofs`
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "dfprove")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("/tmp/dfprove"))
            .join("proofs")
    }
}

#[derive(Deserialize)]
struct DeploymentConfig {
    initializers: GameParams,
}

/// Read world parameters from the `[initializers]` table of a game
/// deployment config. Other tables and keys are ignored.
pub fn load_game_params(path: impl AsRef<Path>) -> Result<GameParams, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let deployment: DeploymentConfig =
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(deployment.initializers)
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_zk::FieldValue;

    const CONFIG: &str = r#"
        circuits_root = "circuits"
        game_config = "darkforest.toml"

        [prover]
        backend = "stub"
        timeout_secs = 30

        [circuits.init]
        value_width = "word"

        [circuits.move]
        dir = "move_v2"
        package = "df_move"
        value_width = "narrow"
        move_layout = "distance-from-origin"
    "#;

    #[test]
    fn parses_circuit_tables() {
        let config = OrchestratorConfig::from_toml_str(CONFIG, Path::new("/work")).unwrap();

        assert_eq!(config.circuits_root, Path::new("/work/circuits"));
        assert_eq!(config.prover.backend, ProverBackendKind::Stub);
        assert_eq!(config.prover.program, "nargo");
        assert_eq!(config.prover.timeout(), Some(Duration::from_secs(30)));

        let init = config.circuit(CircuitKind::Init).unwrap();
        assert_eq!(init.revision(), CircuitRevision::new(HexWidth::Word));

        let handle = config.circuit_handle(CircuitKind::Move).unwrap();
        assert_eq!(handle.dir(), Path::new("/work/circuits/move_v2"));
        assert_eq!(handle.package(), "df_move");
        assert_eq!(
            config.circuit(CircuitKind::Move).unwrap().move_layout,
            Some(MoveLayout::DistanceFromOrigin)
        );

        let init_handle = config.circuit_handle(CircuitKind::Init).unwrap();
        assert_eq!(init_handle.dir(), Path::new("/work/circuits/init"));
        assert!(matches!(
            config.circuit_handle(CircuitKind::Reveal),
            Err(ConfigError::MissingCircuit(CircuitKind::Reveal))
        ));
    }

    #[test]
    fn value_width_is_required() {
        let text = r#"
            circuits_root = "circuits"
            game_config = "darkforest.toml"

            [circuits.init]
            dir = "init"
        "#;
        let err = OrchestratorConfig::from_toml_str(text, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn move_circuit_requires_layout() {
        let text = r#"
            circuits_root = "circuits"
            game_config = "darkforest.toml"

            [circuits.move]
            value_width = "word"
        "#;
        let err = OrchestratorConfig::from_toml_str(text, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingMoveLayout));
    }

    #[test]
    fn game_params_come_from_initializers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("darkforest.toml");
        fs::write(
            &path,
            r#"
            [initializers]
            ADMIN_CAN_ADD_PLANETS = true
            WORLD_RADIUS_LOCKED = false
            PLANETHASH_KEY = 7
            SPACETYPE_KEY = 8
            BIOMEBASE_KEY = 9
            PERLIN_LENGTH_SCALE = 4096
            WORLD_RADIUS_MIN = 1000

            [planets]
            ADMIN_PLANETS = []
            "#,
        )
        .unwrap();

        let params = load_game_params(&path).unwrap();
        assert_eq!(params.planethash_key, FieldValue::from_u64(7));
        assert_eq!(params.perlin_length_scale, FieldValue::from_u64(4096));
        assert_eq!(params.world_radius_min, FieldValue::from_u64(1000));
    }

    #[test]
    fn missing_game_config_is_a_read_error() {
        let err = load_game_params("/nonexistent/darkforest.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
