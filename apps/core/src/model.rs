use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("application name is empty")]
    Empty,
}

/// A lower-cased, trimmed application name. Built once at the engine
/// boundary so the indexes never normalize again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    raw: String,
    normalized: String,
}

impl Query {
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }

        Ok(Self {
            raw: trimmed.to_string(),
            normalized: normalize_name(trimmed),
        })
    }

    /// The trimmed input with its original casing, used when handing the
    /// name to OS launch mechanisms.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized)
    }
}

pub fn normalize_name(input: &str) -> String {
    input.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Alias,
    Registry,
    Shortcut,
    Filesystem,
}

impl CandidateSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Alias => "alias",
            Self::Registry => "registry",
            Self::Shortcut => "shortcut",
            Self::Filesystem => "filesystem",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Score(u8);

impl Score {
    pub const NONE: Score = Score(0);
    pub const PARTIAL: Score = Score(1);
    pub const EXACT: Score = Score(2);
    pub const ALIAS: Score = Score(3);

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_match(self) -> bool {
        self.0 > 0
    }
}

/// Exact equality scores 2, containment in either direction scores 1.
/// Both sides are expected to be lower-cased already.
pub fn score_name(query: &str, entry_name: &str) -> Score {
    if query.is_empty() || entry_name.is_empty() {
        return Score::NONE;
    }
    if query == entry_name {
        return Score::EXACT;
    }
    if entry_name.contains(query) || query.contains(entry_name) {
        return Score::PARTIAL;
    }
    Score::NONE
}

/// Lower-cased file stem, or `None` for paths without one.
pub fn file_stem_lower(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy().to_lowercase();
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub score: Score,
    pub path: PathBuf,
    pub source: CandidateSource,
}

impl Candidate {
    /// Returns `None` for a non-matching score so that score-0 candidates
    /// are never materialized.
    pub fn scored(score: Score, path: PathBuf, source: CandidateSource) -> Option<Self> {
        if !score.is_match() {
            return None;
        }
        Some(Self {
            score,
            path,
            source,
        })
    }

    /// Scores a discovered file by its stem against the query.
    pub fn from_file(query: &Query, path: &Path, source: CandidateSource) -> Option<Self> {
        let stem = file_stem_lower(path)?;
        Self::scored(score_name(query.as_str(), &stem), path.to_path_buf(), source)
    }

    pub fn path_len(&self) -> usize {
        self.path.as_os_str().len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub path: PathBuf,
    pub source: CandidateSource,
    pub score: Score,
}

impl From<Candidate> for ResolvedTarget {
    fn from(value: Candidate) -> Self {
        Self {
            path: value.path,
            source: value.source,
            score: value.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMatch {
    pub pid: u32,
    pub reported_name: String,
}
