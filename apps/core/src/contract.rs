use serde::{Deserialize, Serialize};

use crate::controller::LaunchOutcome;
use crate::discovery::SkipReason;
use crate::launcher::LaunchMechanism;
use crate::model::{CandidateSource, ResolvedTarget};
use crate::resolver::Resolution;

pub const DEFAULT_RUNNING_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ListRunningRequest {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedTargetDto {
    pub path: String,
    pub source: CandidateSource,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedSourceDto {
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolveResponse {
    pub target: ResolvedTargetDto,
    pub candidate_count: usize,
    pub skipped: Vec<SkippedSourceDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchResponse {
    pub launched: bool,
    pub mechanism: Option<LaunchMechanism>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerminateResponse {
    pub terminated: bool,
    pub killed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListRunningResponse {
    pub applications: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreRequest {
    Resolve(AppRequest),
    Launch(AppRequest),
    Terminate(AppRequest),
    Restart(AppRequest),
    ListRunning(ListRunningRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreResponse {
    Resolve(ResolveResponse),
    Launch(LaunchResponse),
    Terminate(TerminateResponse),
    Restart(LaunchResponse),
    ListRunning(ListRunningResponse),
}

impl CoreResponse {
    /// Whether the request achieved what it asked for; a resolve that found
    /// nothing never gets this far.
    pub fn succeeded(&self) -> bool {
        match self {
            Self::Resolve(_) | Self::ListRunning(_) => true,
            Self::Launch(response) | Self::Restart(response) => response.launched,
            Self::Terminate(response) => response.terminated,
        }
    }
}

impl From<ResolvedTarget> for ResolvedTargetDto {
    fn from(value: ResolvedTarget) -> Self {
        Self {
            path: value.path.to_string_lossy().into_owned(),
            source: value.source,
            score: value.score.value(),
        }
    }
}

impl From<(&'static str, SkipReason)> for SkippedSourceDto {
    fn from((source, reason): (&'static str, SkipReason)) -> Self {
        Self {
            source: source.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl ResolveResponse {
    /// `None` when the resolution found no target.
    pub fn from_resolution(resolution: Resolution) -> Option<Self> {
        let target = resolution.target?;
        Some(Self {
            target: target.into(),
            candidate_count: resolution.candidate_count,
            skipped: resolution.skipped.into_iter().map(Into::into).collect(),
        })
    }
}

impl From<LaunchOutcome> for LaunchResponse {
    fn from(value: LaunchOutcome) -> Self {
        match value {
            LaunchOutcome::Launched { mechanism, target } => Self {
                launched: true,
                mechanism: Some(mechanism),
                target: Some(target),
            },
            LaunchOutcome::NotLaunched => Self {
                launched: false,
                mechanism: None,
                target: None,
            },
        }
    }
}
