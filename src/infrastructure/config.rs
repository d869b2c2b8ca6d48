use serde::Deserialize;
use std::path::PathBuf;

const CONFIG_FILE: &str = "config/diagram-telemetry";
const ENV_PREFIX: &str = "DIAGRAM_TELEMETRY";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub data: DataSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSettings {
    /// Root of the building snapshot files.
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load `config/diagram-telemetry.*`, overridden by `DIAGRAM_TELEMETRY__SECTION__KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_from(CONFIG_FILE)
}

fn load_from(path: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[data]\ndir = \"/srv/buildings\"").unwrap();

        let config = load_from(path.with_extension("").to_str().unwrap()).unwrap();

        assert_eq!(config.data.dir, PathBuf::from("/srv/buildings"));
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_data_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        assert!(load_from(path.with_extension("").to_str().unwrap()).is_err());
    }
}
