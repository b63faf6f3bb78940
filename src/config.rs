//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treewalk/treewalk.toml`
//! 3. Explicit config file (`--config`, `TREEWALK_CONFIG`)
//! 4. Environment variables: `TREEWALK_*` prefix
//! 5. Command line flags (applied by the CLI through [`Settings::merge_with`])

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::ApplicationError;

/// How a traverser descends into the tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Explicit stack; stack usage does not grow with tree height
    #[default]
    Iterative,
    /// Plain recursion; one call frame per level
    Recursive,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Iterative => write!(f, "iterative"),
            Strategy::Recursive => write!(f, "recursive"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iterative" => Ok(Strategy::Iterative),
            "recursive" => Ok(Strategy::Recursive),
            other => Err(format!(
                "invalid strategy '{other}', expected 'iterative' or 'recursive'"
            )),
        }
    }
}

/// Buffering of the channel between a traverser and its consumer.
///
/// Written as a number (`0` is a rendezvous) or as `"unbounded"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "CapacityRepr", into = "CapacityRepr")]
pub enum Capacity {
    /// Unbuffered handoff: every send waits for the matching receive
    #[default]
    Rendezvous,
    /// Up to `n` values in flight
    Bounded(usize),
    /// Sends never wait
    Unbounded,
}

impl Capacity {
    /// `0` maps to [`Capacity::Rendezvous`].
    pub fn from_size(size: usize) -> Self {
        match size {
            0 => Capacity::Rendezvous,
            n => Capacity::Bounded(n),
        }
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Rendezvous => write!(f, "rendezvous"),
            Capacity::Bounded(n) => write!(f, "{n}"),
            Capacity::Unbounded => write!(f, "unbounded"),
        }
    }
}

impl FromStr for Capacity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "unbounded" => Ok(Capacity::Unbounded),
            "rendezvous" => Ok(Capacity::Rendezvous),
            _ => s.parse::<usize>().map(Capacity::from_size).map_err(|_| {
                format!("invalid capacity '{s}', expected a number or 'unbounded'")
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum CapacityRepr {
    Size(usize),
    Named(String),
}

impl TryFrom<CapacityRepr> for Capacity {
    type Error = String;

    fn try_from(repr: CapacityRepr) -> Result<Self, Self::Error> {
        match repr {
            CapacityRepr::Size(n) => Ok(Capacity::from_size(n)),
            CapacityRepr::Named(name) => name.parse(),
        }
    }
}

impl From<Capacity> for CapacityRepr {
    fn from(capacity: Capacity) -> Self {
        match capacity {
            Capacity::Rendezvous => CapacityRepr::Size(0),
            Capacity::Bounded(n) => CapacityRepr::Size(n),
            Capacity::Unbounded => CapacityRepr::Named("unbounded".into()),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified, inherit").
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RawSettings {
    pub strategy: Option<Strategy>,
    pub capacity: Option<Capacity>,
    /// `0` lifts an inherited limit
    pub max_depth: Option<usize>,
}

/// Unified configuration for treewalk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Traversal strategy (default: iterative)
    pub strategy: Strategy,
    /// Channel buffering between traverser and comparator (default: rendezvous)
    pub capacity: Capacity,
    /// Deepest level a traverser accepts before failing (default: unlimited)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

/// Get the XDG config directory for treewalk.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treewalk").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treewalk.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}` in a user supplied config path.
pub fn expand_config_path(path: &Path) -> Result<PathBuf, ApplicationError> {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| ApplicationError::Config {
            message: format!("expand {}: {}", raw, e),
        })
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn normalize_depth(depth: usize) -> Option<usize> {
    (depth > 0).then_some(depth)
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            strategy: overlay.strategy.unwrap_or(self.strategy),
            capacity: overlay.capacity.unwrap_or(self.capacity),
            max_depth: match overlay.max_depth {
                Some(depth) => normalize_depth(depth),
                None => self.max_depth,
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file given by the user; it must exist
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/treewalk/treewalk.toml` (if present)
    /// 3. Explicit config file
    /// 4. Environment variables: `TREEWALK_STRATEGY`, `TREEWALK_CAPACITY`, `TREEWALK_MAX_DEPTH`
    #[instrument(level = "debug")]
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(path) = explicit {
            let path = expand_config_path(path)?;
            debug!("explicit config: {}", path.display());
            current = current.merge_with(&load_raw_settings(&path)?);
        }

        current = Self::apply_env_overrides(current)?;

        debug!(?current, "effective settings");
        Ok(current)
    }

    /// Apply TREEWALK_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TREEWALK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        let mut overlay = RawSettings::default();
        if let Ok(val) = config.get_string("strategy") {
            overlay.strategy = Some(val.parse().map_err(config_msg)?);
        }
        if let Ok(val) = config.get_string("capacity") {
            overlay.capacity = Some(val.parse().map_err(config_msg)?);
        }
        if let Ok(val) = config.get_string("max_depth") {
            let depth = val.trim().parse::<usize>().map_err(|e| ApplicationError::Config {
                message: format!("invalid max_depth '{val}': {e}"),
            })?;
            overlay.max_depth = Some(depth);
        }

        Ok(settings.merge_with(&overlay))
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# treewalk configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/treewalk/treewalk.toml
#   Explicit: --config <FILE> or TREEWALK_CONFIG
#   Env:      TREEWALK_STRATEGY, TREEWALK_CAPACITY, TREEWALK_MAX_DEPTH
#   Flags:    --strategy, --capacity, --max-depth

# Traversal strategy: "iterative" (explicit stack) or "recursive"
# strategy = "iterative"

# Channel buffering: 0 is an unbuffered handoff, N buffers N values,
# "unbounded" never blocks the traverser
# capacity = 0

# Fail a walk that descends deeper than this many levels (0 = unlimited)
# max_depth = 0
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

fn config_msg(message: String) -> ApplicationError {
    ApplicationError::Config { message }
}
