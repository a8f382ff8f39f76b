//! Application state management

use std::sync::Arc;

use crate::analysis::{AnalysisInvoker, InferenceEngine};
use crate::config::Config;
use crate::dataset::{DocumentLoader, OfficeConverter};
use crate::parse::ParseService;
use crate::storage::{CredentialResolver, Storage};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    engine: Arc<dyn InferenceEngine>,
    service: ParseService,
}

impl AppState {
    /// Wire the parse service from configuration and its collaborators
    pub fn new(
        config: Config,
        engine: Arc<dyn InferenceEngine>,
        converter: Arc<dyn OfficeConverter>,
        resolver: Arc<dyn CredentialResolver>,
    ) -> Self {
        let storage = Storage::new(resolver);
        let loader = DocumentLoader::new(config.staging.root.clone(), converter);
        let invoker = AnalysisInvoker::new(engine.clone(), config.analyzer.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                service: ParseService::new(storage, loader, invoker),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the inference engine
    pub fn engine(&self) -> &Arc<dyn InferenceEngine> {
        &self.inner.engine
    }

    /// Get the parse service
    pub fn service(&self) -> &ParseService {
        &self.inner.service
    }
}
