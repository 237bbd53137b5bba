//! Shared application state for the demo service.
//!
//! Owns the registry and the request recorder built from config. Startup
//! errors are returned, never panicked on.

use std::sync::Arc;

use promkit_core::error::Result;
use promkit_core::Registry;

use crate::config::PromkitConfig;
use crate::recorder::{RecorderBuilder, RequestMetricsRecorder};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: PromkitConfig,
    registry: Arc<Registry>,
    recorder: Arc<RequestMetricsRecorder>,
}

impl AppState {
    /// Build application state and register request metrics.
    pub fn new(cfg: PromkitConfig) -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let recorder = RecorderBuilder::from_config(&cfg.metrics).build(&registry)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                recorder: Arc::new(recorder),
            }),
        })
    }

    pub fn cfg(&self) -> &PromkitConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn recorder(&self) -> Arc<RequestMetricsRecorder> {
        Arc::clone(&self.inner.recorder)
    }
}
