use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_WALK_DEPTH: usize = 5;

const DEFAULT_PRUNED_DIRS: [&str; 12] = [
    "node_modules",
    "__pycache__",
    "cache",
    "logs",
    "temp",
    "tmp",
    "crash reports",
    "crashreports",
    "crashpad",
    "resources",
    "locales",
    "swiftshader",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deepest directory level (root = 0) whose contents the filesystem
    /// index reads.
    pub max_walk_depth: usize,
    pub walk_budget_ms: u64,
    pub settle_interval_ms: u64,
    pub shell_start_timeout_ms: u64,
    pub launcher_roots: Vec<PathBuf>,
    pub install_roots: Vec<PathBuf>,
    pub search_path: Vec<PathBuf>,
    pub pruned_dirs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_walk_depth: DEFAULT_MAX_WALK_DEPTH,
            walk_budget_ms: 8_000,
            settle_interval_ms: 1_500,
            shell_start_timeout_ms: 5_000,
            launcher_roots: default_launcher_roots(),
            install_roots: default_install_roots(),
            search_path: default_search_path(),
            pruned_dirs: DEFAULT_PRUNED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn walk_budget(&self) -> Duration {
        Duration::from_millis(self.walk_budget_ms)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }

    pub fn shell_start_timeout(&self) -> Duration {
        Duration::from_millis(self.shell_start_timeout_ms)
    }
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.max_walk_depth == 0 || cfg.max_walk_depth > 16 {
        return Err(ConfigError::Invalid(
            "max_walk_depth must be between 1 and 16".into(),
        ));
    }

    if cfg.walk_budget_ms == 0 {
        return Err(ConfigError::Invalid("walk_budget_ms must be positive".into()));
    }

    if cfg.settle_interval_ms > 60_000 {
        return Err(ConfigError::Invalid(
            "settle_interval_ms must not exceed 60000".into(),
        ));
    }

    if cfg.shell_start_timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "shell_start_timeout_ms must be positive".into(),
        ));
    }

    if cfg.pruned_dirs.iter().any(|dir| dir.trim().is_empty()) {
        return Err(ConfigError::Invalid("pruned_dirs entries must not be blank".into()));
    }

    Ok(())
}

/// Reads a config file (`.toml`, `.json` or `.json5`); missing keys keep
/// their defaults.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let cfg: Config = match extension.as_str() {
        "toml" => toml::from_str(&raw).map_err(|e| parse_error(e.to_string()))?,
        "json" | "json5" => json5::from_str(&raw).map_err(|e| parse_error(e.to_string()))?,
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };

    validate(&cfg)?;
    Ok(cfg)
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("appctl")
}

pub fn default_search_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|raw| std::env::split_paths(&raw).collect())
        .unwrap_or_default()
}

#[cfg(target_os = "windows")]
pub fn default_launcher_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    push_env_join(&mut roots, "APPDATA", r"Microsoft\Windows\Start Menu\Programs");
    push_env_join(&mut roots, "ProgramData", r"Microsoft\Windows\Start Menu\Programs");
    push_env_join(&mut roots, "LOCALAPPDATA", "Programs");
    roots
}

#[cfg(target_os = "windows")]
pub fn default_install_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    push_env_join(&mut roots, "PROGRAMFILES", "");
    push_env_join(&mut roots, "PROGRAMFILES(X86)", "");
    push_env_join(&mut roots, "LOCALAPPDATA", "");
    push_env_join(&mut roots, "APPDATA", "");
    roots
}

#[cfg(target_os = "windows")]
fn push_env_join(out: &mut Vec<PathBuf>, var: &str, suffix: &str) {
    if let Some(base) = std::env::var_os(var).filter(|v| !v.is_empty()) {
        let base = PathBuf::from(base);
        let root = if suffix.is_empty() {
            base
        } else {
            base.join(suffix)
        };
        if !out.contains(&root) {
            out.push(root);
        }
    }
}

#[cfg(target_os = "macos")]
pub fn default_launcher_roots() -> Vec<PathBuf> {
    let mut roots = vec![PathBuf::from("/Applications")];
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join("Applications"));
    }
    roots
}

#[cfg(target_os = "macos")]
pub fn default_install_roots() -> Vec<PathBuf> {
    let mut roots = vec![PathBuf::from("/Applications"), PathBuf::from("/opt")];
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".local").join("bin"));
    }
    roots
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn default_launcher_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(data) = dirs::data_dir() {
        roots.push(data.join("applications"));
    }
    roots.push(PathBuf::from("/usr/local/share/applications"));
    roots.push(PathBuf::from("/usr/share/applications"));
    roots
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn default_install_roots() -> Vec<PathBuf> {
    let mut roots = vec![PathBuf::from("/opt")];
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".local").join("share"));
        roots.push(home.join(".local").join("bin"));
    }
    roots
}
