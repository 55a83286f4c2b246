//! Request URL construction
//!
//! Shape: `http://<host>:<port>/<prefix/>index1,index2[@nodename]/<tail>` where
//! the tail is the document id, `_<action>/` for collection-scoped actions, or
//! empty for creation. Segments are interpolated verbatim: callers must supply
//! URL-safe index names, node names and ids.

use crate::domain::entities::{Action, Indexes};
use crate::domain::errors::ClientError;

/// Split `host:port` into its parts. A bare host yields `None` for the port.
pub fn split_host_port(host: &str) -> Result<(String, Option<u16>), ClientError> {
    match host.split_once(':') {
        Some((name, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| ClientError::Config(format!("Invalid port in host '{}'", host)))?;
            Ok((name.to_string(), Some(port)))
        }
        None => Ok((host.to_string(), None)),
    }
}

/// Builds request URLs against the client's default endpoint and namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    host: String,
    port: u16,
    prefix: Option<String>,
}

impl UrlBuilder {
    /// `host` may embed a port, which then wins over `port`
    pub fn new(host: &str, port: u16, prefix: Option<String>) -> Result<Self, ClientError> {
        let (host, embedded) = split_host_port(host)?;
        Ok(Self {
            host,
            port: embedded.unwrap_or(port),
            prefix: prefix.filter(|p| !p.is_empty()),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Resolve the `host:port` authority for one call
    fn authority(&self, host: Option<&str>, port: Option<u16>) -> Result<String, ClientError> {
        let (host, embedded) = match host.filter(|h| !h.is_empty()) {
            Some(h) => split_host_port(h)?,
            None => (self.host.clone(), None),
        };
        let port = embedded.or(port).unwrap_or(self.port);
        Ok(format!("{}:{}", host, port))
    }

    pub fn build(
        &self,
        action: Action,
        indexes: &Indexes,
        host: Option<&str>,
        port: Option<u16>,
        nodename: Option<&str>,
        id: Option<&str>,
    ) -> Result<String, ClientError> {
        if indexes.is_empty() {
            return Err(ClientError::Config("At least one index is required".to_string()));
        }

        let authority = self.authority(host, port)?;

        let prefix = self
            .prefix
            .as_ref()
            .map(|p| format!("{}/", p))
            .unwrap_or_default();
        let index = indexes
            .iter()
            .map(|name| format!("{}{}", prefix, name))
            .collect::<Vec<_>>()
            .join(",");

        let nodename = nodename
            .filter(|n| !n.is_empty())
            .map(|n| format!("@{}", n))
            .unwrap_or_default();

        let tail = if action.is_creation() {
            String::new()
        } else {
            match id {
                Some(id) => id.to_string(),
                None => format!("_{}/", action.as_str()),
            }
        };

        Ok(format!("http://{}/{}{}/{}", authority, index, nodename, tail))
    }
}
