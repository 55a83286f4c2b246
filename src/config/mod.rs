use crate::infrastructure::DEFAULT_POOL_SIZE;
use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8880;
pub const LIVE_PREFIX: &str = "live";
pub const SANDBOX_PREFIX: &str = "sandbox";

/// Connection settings for one client instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host name or address, optionally `host:port`
    pub host: String,

    pub port: u16,

    /// Default for the `commit` flag on write actions
    pub commit: bool,

    /// Namespace segment prepended to every index name
    pub prefix: Option<String>,

    /// Applied to every request; no timeout when unset
    pub timeout: Option<Duration>,

    /// Idle connections kept per host
    pub pool_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            commit: false,
            prefix: None,
            timeout: None,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Preset for the `live` namespace
    pub fn live() -> Self {
        Self::default().with_prefix(LIVE_PREFIX)
    }

    /// Preset for the `sandbox` namespace
    pub fn sandbox() -> Self {
        Self::default().with_prefix(SANDBOX_PREFIX)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_commit(mut self, commit: bool) -> Self {
        self.commit = commit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Load settings from an XML file; missing elements keep their defaults
    pub fn from_file(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_xml(&contents)
    }

    pub fn from_xml(xml: &str) -> anyhow::Result<Self> {
        let settings: Settings = serde_xml_rs::from_str(xml).context("Invalid settings XML")?;
        Ok(settings.apply(Self::default()))
    }

    /// Apply `XAPIAND_HOST`, `XAPIAND_PORT`, `XAPIAND_COMMIT` and `XAPIAND_PREFIX`
    pub fn with_env_overrides(self) -> anyhow::Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        if let Some(host) = lookup("XAPIAND_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("XAPIAND_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("Invalid XAPIAND_PORT: {}", port))?;
        }
        if let Some(commit) = lookup("XAPIAND_COMMIT") {
            self.commit = match commit.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => anyhow::bail!("Invalid XAPIAND_COMMIT: {}", other),
            };
        }
        if let Some(prefix) = lookup("XAPIAND_PREFIX") {
            self.prefix = Some(prefix).filter(|p| !p.is_empty());
        }
        Ok(self)
    }
}

/// Settings file layout
#[derive(Debug, Deserialize, Default)]
#[serde(rename = "xapiand", default)]
struct Settings {
    host: Option<String>,
    port: Option<u16>,
    commit: Option<bool>,
    prefix: Option<String>,
    timeout_secs: Option<u64>,
    pool_size: Option<usize>,
}

impl Settings {
    fn apply(self, mut config: ClientConfig) -> ClientConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(commit) = self.commit {
            config.commit = commit;
        }
        config.prefix = self.prefix.filter(|p| !p.is_empty()).or(config.prefix);
        config.timeout = self.timeout_secs.map(Duration::from_secs).or(config.timeout);
        if let Some(pool_size) = self.pool_size {
            config.pool_size = pool_size;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8880);
        assert!(!config.commit);
        assert!(config.prefix.is_none());
        assert!(config.timeout.is_none());
        assert_eq!(config.pool_size, 100);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ClientConfig::live().prefix.as_deref(), Some("live"));
        assert_eq!(ClientConfig::sandbox().prefix.as_deref(), Some("sandbox"));
    }

    #[test]
    fn test_parse_full_settings() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<xapiand>
    <host>search.internal</host>
    <port>8890</port>
    <commit>true</commit>
    <prefix>live</prefix>
    <timeout_secs>5</timeout_secs>
    <pool_size>16</pool_size>
</xapiand>"#;

        let config = ClientConfig::from_xml(xml).unwrap();
        assert_eq!(config.host, "search.internal");
        assert_eq!(config.port, 8890);
        assert!(config.commit);
        assert_eq!(config.prefix.as_deref(), Some("live"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.pool_size, 16);
    }

    #[test]
    fn test_parse_partial_settings() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<xapiand>
    <prefix>sandbox</prefix>
</xapiand>"#;

        let config = ClientConfig::from_xml(xml).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.prefix.as_deref(), Some("sandbox"));
    }

    #[test]
    fn test_from_file_success() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<xapiand>
    <host>10.0.0.2:9000</host>
</xapiand>"#;
        temp_file.write_all(xml.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = ClientConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.host, "10.0.0.2:9000");
    }

    #[test]
    fn test_from_file_not_found() {
        assert!(ClientConfig::from_file("/nonexistent/path/xapiand.xml").is_err());
    }

    #[test]
    fn test_from_file_invalid_xml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"not valid xml").unwrap();
        temp_file.flush().unwrap();

        assert!(ClientConfig::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("XAPIAND_HOST", "db.local"),
            ("XAPIAND_PORT", "9999"),
            ("XAPIAND_COMMIT", "yes"),
            ("XAPIAND_PREFIX", "live"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::default()
            .with_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.host, "db.local");
        assert_eq!(config.port, 9999);
        assert!(config.commit);
        assert_eq!(config.prefix.as_deref(), Some("live"));
    }

    #[test]
    fn test_invalid_overrides() {
        let bad_port = ClientConfig::default()
            .with_overrides(|name| (name == "XAPIAND_PORT").then(|| "eighty".to_string()));
        assert!(bad_port.is_err());

        let bad_commit = ClientConfig::default()
            .with_overrides(|name| (name == "XAPIAND_COMMIT").then(|| "maybe".to_string()));
        assert!(bad_commit.is_err());
    }
}
