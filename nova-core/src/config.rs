use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Largest UDP payload over IPv4.
const MAX_UDP_PAYLOAD: usize = 65_507;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    diagnostics: DiagnosticsConfig,
}

#[derive(Deserialize, Default)]
struct ServerConfig {
    bind_address: Option<String>,
    udp_port: Option<u16>,
    max_packet_size: Option<usize>,
    poll_interval_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct DiagnosticsConfig {
    dump_osc: Option<u8>,
}

/// Resolved settings the server is started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind_address: String,
    pub udp_port: u16,
    pub max_packet_size: usize,
    pub poll_interval: Duration,
    pub dump_osc: u8,
}

pub struct Config {
    server: ServerConfig,
    diagnostics: DiagnosticsConfig,
}

impl Config {
    /// Embedded defaults, overridden by `<config_dir>/nova/config.toml` if present.
    pub fn load() -> Self {
        let mut config = Self::embedded();
        if let Some(path) = user_config_path() {
            if path.exists() {
                config.merge_file(&path);
            }
        }
        config
    }

    /// Embedded defaults, overridden by one explicit file.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Self::embedded();
        config.merge_file(path);
        config
    }

    fn embedded() -> Self {
        let base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");
        Config {
            server: base.server,
            diagnostics: base.diagnostics,
        }
    }

    fn merge_file(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                Ok(user) => {
                    merge_server(&mut self.server, user.server);
                    merge_diagnostics(&mut self.diagnostics, user.diagnostics);
                }
                Err(e) => {
                    log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                }
            },
            Err(e) => {
                log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
            }
        }
    }

    pub fn bind_address(&self) -> String {
        self.server
            .bind_address
            .clone()
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn udp_port(&self) -> u16 {
        self.server.udp_port.unwrap_or(57110)
    }

    /// Receive buffer size in bytes (clamped to 64..=65507).
    pub fn max_packet_size(&self) -> usize {
        self.server
            .max_packet_size
            .unwrap_or(MAX_UDP_PAYLOAD)
            .clamp(64, MAX_UDP_PAYLOAD)
    }

    /// Shutdown polling interval (clamped to 1..=1000 ms).
    pub fn poll_interval(&self) -> Duration {
        let ms = self.server.poll_interval_ms.unwrap_or(50).clamp(1, 1000);
        Duration::from_millis(ms)
    }

    /// Initial packet dump mode (0 or 1).
    pub fn dump_osc(&self) -> u8 {
        self.diagnostics.dump_osc.unwrap_or(0).min(1)
    }

    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            bind_address: self.bind_address(),
            udp_port: self.udp_port(),
            max_packet_size: self.max_packet_size(),
            poll_interval: self.poll_interval(),
            dump_osc: self.dump_osc(),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nova").join("config.toml"))
}

fn merge_server(base: &mut ServerConfig, user: ServerConfig) {
    if user.bind_address.is_some() {
        base.bind_address = user.bind_address;
    }
    if user.udp_port.is_some() {
        base.udp_port = user.udp_port;
    }
    if user.max_packet_size.is_some() {
        base.max_packet_size = user.max_packet_size;
    }
    if user.poll_interval_ms.is_some() {
        base.poll_interval_ms = user.poll_interval_ms;
    }
}

fn merge_diagnostics(base: &mut DiagnosticsConfig, user: DiagnosticsConfig) {
    if user.dump_osc.is_some() {
        base.dump_osc = user.dump_osc;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_embedded_config() {
        let settings = Config::embedded().server_settings();
        assert_eq!(settings.bind_address, "127.0.0.1");
        assert_eq!(settings.udp_port, 57110);
        assert_eq!(settings.max_packet_size, 65_507);
        assert_eq!(settings.poll_interval, Duration::from_millis(50));
        assert_eq!(settings.dump_osc, 0);
    }

    #[test]
    fn test_user_file_overrides_some_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nudp_port = 57999\n\n[diagnostics]\ndump_osc = 3").unwrap();

        let config = Config::load_from(file.path());
        assert_eq!(config.udp_port(), 57999);
        assert_eq!(config.bind_address(), "127.0.0.1");
        assert_eq!(config.dump_osc(), 1);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nmax_packet_size = 10\npoll_interval_ms = 0").unwrap();

        let config = Config::load_from(file.path());
        assert_eq!(config.max_packet_size(), 64);
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_malformed_file_is_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nudp_port = ").unwrap();

        let config = Config::load_from(file.path());
        assert_eq!(config.udp_port(), 57110);
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config.udp_port(), 57110);
    }
}
