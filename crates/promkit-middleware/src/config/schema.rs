use std::net::SocketAddr;

use promkit_core::error::{MetricsError, Result};
use promkit_core::validate_buckets;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromkitConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl PromkitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::BadConfig(format!(
                "unsupported config version {} (expected 1)",
                self.version
            )));
        }

        self.server.validate()?;
        self.metrics.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            MetricsError::BadConfig(format!(
                "server.listen must be a valid socket address, got {:?}",
                self.listen
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default = "default_buckets")]
    pub buckets: Vec<f64>,

    #[serde(default = "default_handler_path")]
    pub handler_path: String,

    #[serde(default)]
    pub exclude: ExcludeSection,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            service_name: default_service_name(),
            buckets: default_buckets(),
            handler_path: default_handler_path(),
            exclude: ExcludeSection::default(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(MetricsError::BadConfig(
                "metrics.namespace must not be empty".into(),
            ));
        }
        if self.service_name.is_empty() {
            return Err(MetricsError::BadConfig(
                "metrics.service_name must not be empty".into(),
            ));
        }
        if !self.handler_path.starts_with('/') {
            return Err(MetricsError::BadConfig(
                "metrics.handler_path must start with '/'".into(),
            ));
        }
        validate_buckets(&self.buckets)
            .map_err(|e| MetricsError::BadConfig(format!("metrics.buckets: {e}")))?;
        Ok(())
    }
}

/// Regex patterns per dimension; an observation matching any of them is not recorded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeSection {
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default)]
    pub endpoint: Vec<String>,
    #[serde(default)]
    pub method: Vec<String>,
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_namespace() -> String {
    "service".into()
}
fn default_service_name() -> String {
    "service".into()
}
fn default_buckets() -> Vec<f64> {
    vec![0.1, 0.3, 1.2, 5.0]
}
fn default_handler_path() -> String {
    "/metrics".into()
}
