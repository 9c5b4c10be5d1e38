use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default mediaq data directory: ~/.mediaq
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(".mediaq"))
}

/// Load configuration with the usual precedence:
/// 1. `~/.mediaq/config.toml`
/// 2. `./config.toml`
/// 3. built-in defaults
pub fn load_default() -> anyhow::Result<AppConfig> {
    let data_dir = get_data_dir()?;
    let user_config = data_dir.join("config.toml");
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if user_config.exists() {
        let s = std::fs::read_to_string(&user_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    apply_derived_defaults(&mut cfg, &data_dir)?;
    Ok(cfg)
}

/// Load configuration from an explicit file, still filling in the derived
/// defaults above.
pub fn load_from(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read config {}: {e}", path.display()))?;
    let mut cfg: AppConfig = toml::from_str(&s)?;
    apply_derived_defaults(&mut cfg, &get_data_dir()?)?;
    Ok(cfg)
}

/// Fill the paths the config file may leave open, regardless of how the
/// file itself was located.
fn apply_derived_defaults(cfg: &mut AppConfig, data_dir: &Path) -> anyhow::Result<()> {
    // Route logs into the data directory unless the user picked one.
    if cfg
        .logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .is_none()
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    if cfg.storage.persist && cfg.storage.path.is_none() {
        std::fs::create_dir_all(data_dir)?;
        cfg.storage.path = Some(data_dir.join("tasks.json").to_string_lossy().to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_defaults_fill_log_and_persistence_paths() {
        let data_dir = tempfile::tempdir().unwrap();
        let mut cfg: AppConfig = toml::from_str("[storage]\npersist = true\n").unwrap();
        assert!(cfg.storage.path.is_none());

        apply_derived_defaults(&mut cfg, data_dir.path()).unwrap();

        let tasks = data_dir.path().join("tasks.json");
        assert_eq!(cfg.storage.path.as_deref(), tasks.to_str());
        let logs = data_dir.path().join("logs");
        assert_eq!(cfg.logging.directory.as_deref(), logs.to_str());
        assert!(logs.is_dir());
    }

    #[test]
    fn explicit_paths_are_left_alone() {
        let data_dir = tempfile::tempdir().unwrap();
        let mut cfg: AppConfig = toml::from_str(
            "[logging]\ndirectory = \"/var/log/mediaq\"\n[storage]\npersist = true\npath = \"/srv/tasks.json\"\n",
        )
        .unwrap();

        apply_derived_defaults(&mut cfg, data_dir.path()).unwrap();

        assert_eq!(cfg.storage.path.as_deref(), Some("/srv/tasks.json"));
        assert_eq!(cfg.logging.directory.as_deref(), Some("/var/log/mediaq"));
    }
}
