//! Config loader (strict parsing).

pub mod schema;

use std::fs;

use promkit_core::error::{MetricsError, Result};

pub use schema::{ExcludeSection, MetricsSection, PromkitConfig, ServerSection};

pub fn load_from_file(path: &str) -> Result<PromkitConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MetricsError::BadConfig(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<PromkitConfig> {
    let cfg: PromkitConfig = serde_yaml::from_str(s)
        .map_err(|e| MetricsError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
