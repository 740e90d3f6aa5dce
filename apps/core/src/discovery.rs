use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use walkdir::{DirEntry, WalkDir};

use crate::model::{Candidate, CandidateSource, Query};

/// Why a discovery source contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedPlatform,
    PermissionDenied(String),
    Unavailable(String),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedPlatform => write!(f, "unsupported platform"),
            Self::PermissionDenied(what) => write!(f, "permission denied: {what}"),
            Self::Unavailable(what) => write!(f, "unavailable: {what}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceResult {
    Found(Vec<Candidate>),
    Skipped(SkipReason),
}

impl SourceResult {
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::Found(candidates) => candidates,
            Self::Skipped(_) => &[],
        }
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        match self {
            Self::Found(candidates) => candidates,
            Self::Skipped(_) => Vec::new(),
        }
    }
}

pub trait DiscoveryProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;
    fn search(&self, query: &Query) -> SourceResult;
}

/// Fixed candidate list, used to stand in for a live source.
pub struct StaticProvider {
    name: &'static str,
    candidates: Vec<Candidate>,
}

impl StaticProvider {
    pub fn new(name: &'static str, candidates: Vec<Candidate>) -> Self {
        Self { name, candidates }
    }
}

impl DiscoveryProvider for StaticProvider {
    fn provider_name(&self) -> &'static str {
        self.name
    }

    fn search(&self, _query: &Query) -> SourceResult {
        SourceResult::Found(self.candidates.clone())
    }
}

/// Traversal limits shared by the directory-walking indexes.
#[derive(Debug, Clone)]
pub struct WalkPlan {
    pub roots: Vec<PathBuf>,
    /// Deepest directory level whose contents are read; `None` walks the
    /// whole tree.
    pub max_dir_depth: Option<usize>,
    pub pruned_dirs: Vec<String>,
    pub budget: Option<Duration>,
}

impl WalkPlan {
    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            return true;
        }
        self.pruned_dirs
            .iter()
            .any(|pruned| name.eq_ignore_ascii_case(pruned))
    }
}

/// Summary of one walk: what matched and whether the budget cut it short.
#[derive(Debug, Default)]
pub struct WalkReport {
    pub candidates: Vec<Candidate>,
    pub roots_walked: usize,
    pub denied: Vec<PathBuf>,
    /// Roots that exist but whose listing was refused.
    pub denied_roots: Vec<PathBuf>,
    pub truncated: bool,
}

impl WalkReport {
    /// Maps the walk onto a source result. No present root is `Unavailable`
    /// and every present root unreadable is `PermissionDenied`.
    pub fn into_source_result(self, roots_configured: usize, missing: &str) -> SourceResult {
        if self.roots_walked == 0 {
            if roots_configured > 0 {
                return SourceResult::Skipped(SkipReason::Unavailable(missing.to_string()));
            }
            return SourceResult::Found(self.candidates);
        }
        if self.denied_roots.len() >= self.roots_walked {
            let roots = self
                .denied_roots
                .iter()
                .map(|root| root.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return SourceResult::Skipped(SkipReason::PermissionDenied(roots));
        }
        SourceResult::Found(self.candidates)
    }
}

fn is_permission_denied(error: &walkdir::Error) -> bool {
    error
        .io_error()
        .map(|io| io.kind() == std::io::ErrorKind::PermissionDenied)
        .unwrap_or(false)
}

/// Regular files and symlinks that resolve to one. Links are never followed
/// into directories.
fn is_file_entry(entry: &DirEntry) -> bool {
    if entry.path_is_symlink() {
        return std::fs::metadata(entry.path())
            .map(|meta| meta.is_file())
            .unwrap_or(false);
    }
    entry.file_type().is_file()
}

/// Walks every root of `plan` and keeps each file whose stem matches the
/// query and which `accept` allows. `accept` only sees stem matches.
/// Unreadable entries are skipped; missing roots are ignored.
pub fn walk_and_score<F>(
    plan: &WalkPlan,
    query: &Query,
    source: CandidateSource,
    accept: F,
) -> WalkReport
where
    F: Fn(&Path) -> bool,
{
    let started = Instant::now();
    let mut report = WalkReport::default();

    'roots: for root in &plan.roots {
        if !root.is_dir() {
            continue;
        }
        report.roots_walked += 1;

        let mut walker = WalkDir::new(root).follow_links(false);
        if let Some(depth) = plan.max_dir_depth {
            // Files directly inside a directory at `depth` sit one level below it.
            walker = walker.max_depth(depth + 1);
        }

        for entry in walker.into_iter().filter_entry(|entry| !plan.is_pruned(entry)) {
            if let Some(budget) = plan.budget {
                if started.elapsed() >= budget {
                    report.truncated = true;
                    break 'roots;
                }
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    if let Some(path) = error.path() {
                        if is_permission_denied(&error) {
                            if path == root.as_path() {
                                report.denied_roots.push(path.to_path_buf());
                            }
                            report.denied.push(path.to_path_buf());
                        }
                    }
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            let Some(candidate) = Candidate::from_file(query, path, source) else {
                continue;
            };
            if is_file_entry(&entry) && accept(path) {
                report.candidates.push(candidate);
            }
        }
    }

    if report.truncated {
        log::warn!(
            "{} walk for '{query}' hit its {:?} budget; returning partial results",
            source.label(),
            plan.budget.unwrap_or_default()
        );
    }
    if !report.denied.is_empty() {
        log::debug!(
            "{} walk skipped {} unreadable entries",
            source.label(),
            report.denied.len()
        );
    }

    report
}
