use std::path::{Path, PathBuf};

use crate::command_path::is_executable_file;
use crate::discovery::{walk_and_score, DiscoveryProvider, SourceResult, WalkPlan};
use crate::model::{has_extension, CandidateSource, Query};

/// File extensions activated through the OS shortcut mechanism rather than
/// executed directly.
pub const SHORTCUT_EXTENSIONS: &[&str] = &["lnk", "desktop"];

const NOISE_DIRS: &[&str] = &["node_modules"];

pub fn is_shortcut(path: &Path) -> bool {
    has_extension(path, SHORTCUT_EXTENSIONS)
}

/// Start-menu style launcher directories. These are small, so the walk is
/// not depth-bounded.
pub struct ShortcutIndex {
    roots: Vec<PathBuf>,
}

impl ShortcutIndex {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    fn plan(&self) -> WalkPlan {
        WalkPlan {
            roots: self.roots.clone(),
            max_dir_depth: None,
            pruned_dirs: NOISE_DIRS.iter().map(|dir| dir.to_string()).collect(),
            budget: None,
        }
    }
}

impl DiscoveryProvider for ShortcutIndex {
    fn provider_name(&self) -> &'static str {
        "shortcut"
    }

    fn search(&self, query: &Query) -> SourceResult {
        let report = walk_and_score(&self.plan(), query, CandidateSource::Shortcut, |path| {
            is_shortcut(path) || is_executable_file(path)
        });

        report.into_source_result(self.roots.len(), "no launcher directories present")
    }
}
