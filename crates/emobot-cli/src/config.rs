//! Runtime configuration – reads/writes `~/.emobot/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted configuration stored in `~/.emobot/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Serial device of the motor controller.
    #[serde(default = "default_serial_port")]
    pub serial_port: String,

    /// Control-loop frequency in ticks per second.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,

    /// Fixed seed for every random choice in the stack. Leave unset for a
    /// different personality each run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_serial_port() -> String {
    "/dev/ttyUSB0".to_string()
}
fn default_tick_hz() -> u32 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial_port: default_serial_port(),
            tick_hz: default_tick_hz(),
            seed: None,
        }
    }
}

/// Return the path to `~/.emobot/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".emobot").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `EMOBOT_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `EMOBOT_SERIAL_PORT` | `serial_port` |
/// | `EMOBOT_TICK_HZ` | `tick_hz` |
/// | `EMOBOT_SEED` | `seed` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("EMOBOT_SERIAL_PORT") {
        cfg.serial_port = v;
    }
    if let Ok(v) = std::env::var("EMOBOT_TICK_HZ")
        && let Ok(hz) = v.parse::<u32>()
        && hz > 0
    {
        cfg.tick_hz = hz;
    }
    if let Ok(v) = std::env::var("EMOBOT_SEED")
        && let Ok(seed) = v.parse::<u64>()
    {
        cfg.seed = Some(seed);
    }
}

/// Save the config to disk, creating `~/.emobot/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Restrict the config directory to the owner only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Write the file with owner-only read/write (rw-------) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
