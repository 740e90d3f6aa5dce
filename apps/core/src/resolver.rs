use std::sync::Arc;

use rayon::prelude::*;

use crate::alias_index::AliasIndex;
use crate::discovery::{DiscoveryProvider, SkipReason, SourceResult};
use crate::model::{Candidate, CandidateSource, Query, ResolvedTarget, Score};
use crate::ranker;

/// Outcome of one resolution, with the per-source diagnostics behind it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    pub target: Option<ResolvedTarget>,
    pub candidate_count: usize,
    pub skipped: Vec<(&'static str, SkipReason)>,
}

pub struct Resolver {
    aliases: Arc<AliasIndex>,
    providers: Vec<Box<dyn DiscoveryProvider>>,
}

impl Resolver {
    pub fn new(aliases: Arc<AliasIndex>, providers: Vec<Box<dyn DiscoveryProvider>>) -> Self {
        Self { aliases, providers }
    }

    pub fn aliases(&self) -> &AliasIndex {
        &self.aliases
    }

    pub fn resolve(&self, query: &Query) -> Resolution {
        if let Some(path) = self.aliases.lookup(query) {
            return Resolution {
                target: Some(ResolvedTarget {
                    path,
                    source: CandidateSource::Alias,
                    score: Score::ALIAS,
                }),
                candidate_count: 1,
                skipped: Vec::new(),
            };
        }

        // `collect` keeps provider order, which the ranker's final tie-break relies on.
        let results: Vec<(&'static str, SourceResult)> = self
            .providers
            .par_iter()
            .map(|provider| (provider.provider_name(), provider.search(query)))
            .collect();

        let mut skipped = Vec::new();
        let mut merged: Vec<Candidate> = Vec::new();
        for (name, result) in results {
            match result {
                SourceResult::Found(candidates) => {
                    log::debug!("{name} produced {} candidates for '{query}'", candidates.len());
                    merged.extend(candidates);
                }
                SourceResult::Skipped(reason) => {
                    log::debug!("{name} skipped for '{query}': {reason}");
                    skipped.push((name, reason));
                }
            }
        }

        let candidate_count = merged.len();
        let target = ranker::rank(merged);
        match &target {
            Some(found) => log::info!(
                "resolved '{query}' to {} via {} (score {})",
                found.path.display(),
                found.source.label(),
                found.score.value()
            ),
            None => log::info!("no installed application matches '{query}'"),
        }

        Resolution {
            target,
            candidate_count,
            skipped,
        }
    }
}
