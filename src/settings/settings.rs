use anyhow::{Result, anyhow};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub store: Store,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    pub address: String,
    // TLS is enabled only when both are set
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "mysql"
    pub dsn: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub migrate: bool,
}

fn default_max_connections() -> u32 {
    5
}

impl Http {
    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        match (&self.cert_path, &self.key_path) {
            (Some(cert), Some(key)) => Some((cert.as_str(), key.as_str())),
            _ => None,
        }
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release";

const ENV_PREFIX: &str = "CONCORD";

/// Loads the settings file (any format `config` understands) and overlays `CONCORD__*`
/// environment variables, e.g. `CONCORD__STORE__BACKEND=mysql`.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    build(Config::builder().add_source(File::with_name(path)))
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Settings> {
    let settings: Settings = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings> {
        build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn parses_memory_settings_with_defaults() {
        let settings = from_toml(
            r#"
[http]
address = "127.0.0.1:8000"

[log]
filter = "info"

[store]
backend = "memory"
"#,
        )
        .unwrap();

        assert_eq!(settings.http.address, "127.0.0.1:8000");
        assert!(settings.http.tls_paths().is_none());
        assert_eq!(settings.store.backend, "memory");
        assert_eq!(settings.store.max_connections, 5);
        assert!(!settings.store.migrate);
        assert!(settings.store.dsn.is_none());
    }

    #[test]
    fn tls_needs_both_paths() {
        let settings = from_toml(
            r#"
[http]
address = "0.0.0.0:8443"
cert_path = "cert.pem"
key_path = "key.pem"

[log]
filter = "debug"

[store]
backend = "mysql"
dsn = "mysql://u:p@localhost/db"
max_connections = 10
migrate = true
"#,
        )
        .unwrap();

        assert_eq!(settings.http.tls_paths(), Some(("cert.pem", "key.pem")));
        assert_eq!(settings.store.max_connections, 10);
        assert!(settings.store.migrate);
    }

    #[test]
    fn missing_section_is_an_error() {
        assert!(from_toml("[log]\nfilter = \"info\"\n").is_err());
        assert!(parse_settings(Some("settings/does-not-exist")).is_err());
    }
}
