use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::alias_index::{AliasIndex, AliasTable};
use crate::config::{validate, Config, ConfigError};
use crate::contract::{
    CoreRequest, CoreResponse, ListRunningResponse, ResolveResponse, TerminateResponse,
    DEFAULT_RUNNING_LIMIT,
};
use crate::controller::{LaunchOutcome, ProcessController, TerminateOutcome};
use crate::discovery::DiscoveryProvider;
use crate::fs_index::FilesystemIndex;
use crate::launcher::{LaunchBackend, LaunchError, SystemLaunchBackend};
use crate::model::{Query, QueryError, ResolvedTarget};
use crate::package_index::SystemPackageIndex;
use crate::process_table::{ProcessTable, SystemProcessTable};
use crate::resolver::{Resolution, Resolver};
use crate::shortcut_index::ShortcutIndex;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid application name: {0}")]
    Query(#[from] QueryError),
    #[error("launch error: {0}")]
    Launch(#[from] LaunchError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("no installed application matches '{0}'")]
    NotFound(String),
}

/// Entry point for hosts: resolve, launch, terminate and restart
/// applications by free-text name.
pub struct AppEngine {
    controller: ProcessController,
}

impl AppEngine {
    /// Builds an engine over the real OS: registry, launcher directories,
    /// installation roots, process table.
    pub fn new(config: Config) -> Result<Self, EngineError> {
        validate(&config)?;

        let aliases = AliasIndex::new(AliasTable::builtin(), config.search_path.clone());
        let providers: Vec<Box<dyn DiscoveryProvider>> = vec![
            Box::new(SystemPackageIndex::system()),
            Box::new(ShortcutIndex::new(config.launcher_roots.clone())),
            Box::new(FilesystemIndex::from_config(&config)),
        ];
        let backend = SystemLaunchBackend::new(
            config.search_path.clone(),
            config.shell_start_timeout(),
        );

        log::info!(
            "engine ready: {} aliases, walk depth {}, {} install roots",
            aliases.table().len(),
            config.max_walk_depth,
            config.install_roots.len()
        );

        Ok(Self::with_components(
            Resolver::new(Arc::new(aliases), providers),
            Arc::new(backend),
            Arc::new(SystemProcessTable::new()),
            config.settle_interval(),
        ))
    }

    pub fn with_components(
        resolver: Resolver,
        backend: Arc<dyn LaunchBackend>,
        processes: Arc<dyn ProcessTable>,
        settle_interval: Duration,
    ) -> Self {
        Self {
            controller: ProcessController::new(
                Arc::new(resolver),
                backend,
                processes,
                settle_interval,
            ),
        }
    }

    pub fn controller(&self) -> &ProcessController {
        &self.controller
    }

    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.find(name).map(|target| target.path)
    }

    pub fn find(&self, name: &str) -> Option<ResolvedTarget> {
        self.resolution(name).ok()?.target
    }

    /// Full resolution with the sources that were skipped along the way.
    pub fn resolution(&self, name: &str) -> Result<Resolution, EngineError> {
        let query = Query::parse(name)?;
        Ok(self.controller.resolver().resolve(&query))
    }

    pub fn launch(&self, name: &str) -> bool {
        match self.try_launch(name) {
            Ok(outcome) => outcome.launched(),
            Err(error) => {
                log::warn!("launch of '{name}' failed: {error}");
                false
            }
        }
    }

    pub fn try_launch(&self, name: &str) -> Result<LaunchOutcome, EngineError> {
        let query = Query::parse(name)?;
        Ok(self.controller.launch(&query)?)
    }

    /// Returns whether anything was killed, and the image names killed.
    pub fn terminate(&self, name: &str) -> (bool, Vec<String>) {
        match self.try_terminate(name) {
            Ok(outcome) => (outcome.any_killed(), outcome.killed),
            Err(error) => {
                log::warn!("terminate of '{name}' rejected: {error}");
                (false, Vec::new())
            }
        }
    }

    pub fn try_terminate(&self, name: &str) -> Result<TerminateOutcome, EngineError> {
        let query = Query::parse(name)?;
        Ok(self.controller.terminate(&query))
    }

    pub fn restart(&self, name: &str) -> bool {
        match self.try_restart(name) {
            Ok(outcome) => outcome.launched(),
            Err(error) => {
                log::warn!("restart of '{name}' failed: {error}");
                false
            }
        }
    }

    pub fn try_restart(&self, name: &str) -> Result<LaunchOutcome, EngineError> {
        let query = Query::parse(name)?;
        Ok(self.controller.restart(&query)?)
    }

    pub fn running_applications(&self, limit: usize) -> Vec<String> {
        self.controller.running_applications(limit)
    }

    pub fn handle_command(&self, request: CoreRequest) -> Result<CoreResponse, EngineError> {
        match request {
            CoreRequest::Resolve(request) => {
                let resolution = self.resolution(&request.name)?;
                ResolveResponse::from_resolution(resolution)
                    .map(CoreResponse::Resolve)
                    .ok_or_else(|| EngineError::NotFound(request.name.trim().to_string()))
            }
            CoreRequest::Launch(request) => {
                Ok(CoreResponse::Launch(self.try_launch(&request.name)?.into()))
            }
            CoreRequest::Terminate(request) => {
                let outcome = self.try_terminate(&request.name)?;
                Ok(CoreResponse::Terminate(TerminateResponse {
                    terminated: outcome.any_killed(),
                    killed: outcome.killed,
                }))
            }
            CoreRequest::Restart(request) => {
                Ok(CoreResponse::Restart(self.try_restart(&request.name)?.into()))
            }
            CoreRequest::ListRunning(request) => {
                let limit = request.limit.unwrap_or(DEFAULT_RUNNING_LIMIT);
                if limit == 0 {
                    return Err(EngineError::InvalidRequest(
                        "limit must be positive".into(),
                    ));
                }
                Ok(CoreResponse::ListRunning(ListRunningResponse {
                    applications: self.running_applications(limit),
                }))
            }
        }
    }
}
