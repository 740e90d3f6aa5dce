use std::path::PathBuf;
use std::time::Duration;

use crate::command_path::is_executable_file;
use crate::config::Config;
use crate::discovery::{walk_and_score, DiscoveryProvider, SourceResult, WalkPlan};
use crate::model::{CandidateSource, Query};

/// Bounded walk of installation roots (program files, per-user app data).
pub struct FilesystemIndex {
    plan: WalkPlan,
}

impl FilesystemIndex {
    pub fn new(
        roots: Vec<PathBuf>,
        max_dir_depth: usize,
        pruned_dirs: Vec<String>,
        budget: Duration,
    ) -> Self {
        Self {
            plan: WalkPlan {
                roots,
                max_dir_depth: Some(max_dir_depth),
                pruned_dirs,
                budget: Some(budget),
            },
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.install_roots.clone(),
            cfg.max_walk_depth,
            cfg.pruned_dirs.clone(),
            cfg.walk_budget(),
        )
    }
}

impl DiscoveryProvider for FilesystemIndex {
    fn provider_name(&self) -> &'static str {
        "filesystem"
    }

    fn search(&self, query: &Query) -> SourceResult {
        let report = walk_and_score(&self.plan, query, CandidateSource::Filesystem, |path| {
            is_executable_file(path)
        });

        report.into_source_result(self.plan.roots.len(), "no installation roots present")
    }
}
