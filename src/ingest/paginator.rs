//! Deep pagination over a player's match history.
//!
//! Match-id listings have no patch filter, so history is walked newest to
//! oldest one page at a time until a page reaches past the lower patch bound.
//! Pages are strictly sequential; details within a page are fetched on the
//! client's bounded pool.

use crate::api::client::{MatchFilter, RiotApiClient, MAX_IDS_PER_PAGE};
use crate::api::models::MatchDto;
use crate::error::AppError;
use crate::ingest::patch::{in_range, PatchVersion, SplitWindow};
use std::collections::HashSet;
use tracing::{info, warn};

/// Where match ids and details come from.
pub trait MatchSource {
    fn list_ids(&self, start: usize, count: usize) -> Result<Vec<String>, AppError>;

    /// One result per id, in the same order.
    fn fetch_details(&self, ids: &[String]) -> Vec<Result<MatchDto, AppError>>;
}

/// A single player's history on one regional cluster.
pub struct PlayerHistory<'a> {
    pub client: &'a RiotApiClient,
    pub region: &'a str,
    pub puuid: &'a str,
    pub filter: MatchFilter,
}

impl MatchSource for PlayerHistory<'_> {
    fn list_ids(&self, start: usize, count: usize) -> Result<Vec<String>, AppError> {
        self.client
            .list_match_ids(self.region, self.puuid, start, count, &self.filter)
    }

    fn fetch_details(&self, ids: &[String]) -> Vec<Result<MatchDto, AppError>> {
        self.client.get_matches(self.region, ids)
    }
}

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub page_size: usize,
    pub max_pages: usize,
    /// Open-ended ("since patch") walks stop once this many matches are kept.
    pub sample_target: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            page_size: MAX_IDS_PER_PAGE,
            max_pages: 40,
            sample_target: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchBound {
    Window { lo: PatchVersion, hi: PatchVersion },
    Since(PatchVersion),
}

impl PatchBound {
    pub fn lower(&self) -> PatchVersion {
        match self {
            PatchBound::Window { lo, .. } | PatchBound::Since(lo) => *lo,
        }
    }

    fn admits(&self, patch: PatchVersion) -> bool {
        match self {
            PatchBound::Window { lo, hi } => in_range(patch, *lo, *hi),
            PatchBound::Since(lo) => !patch.is_unknown() && patch >= *lo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    PastLowerBound,
    SampleTarget,
    HistoryExhausted,
    MaxPages,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageReport {
    pub page: usize,
    pub ids: usize,
    pub kept: usize,
    pub failed: usize,
    pub oldest: Option<PatchVersion>,
}

#[derive(Debug, Clone)]
pub struct CollectedMatches {
    /// Most recent first, de-duplicated by match id.
    pub matches: Vec<MatchDto>,
    pub pages: usize,
    pub failed: usize,
    pub stop: StopReason,
}

pub fn collect_matches<S, F>(
    source: &S,
    bound: PatchBound,
    config: &PaginationConfig,
    mut on_page: F,
) -> Result<CollectedMatches, AppError>
where
    S: MatchSource + ?Sized,
    F: FnMut(&PageReport),
{
    let page_size = config.page_size.clamp(1, MAX_IDS_PER_PAGE);
    let mut seen: HashSet<String> = HashSet::new();
    let mut matches = Vec::new();
    let mut failed = 0;
    let mut pages = 0;
    let mut start = 0;
    let mut stop = StopReason::MaxPages;

    while pages < config.max_pages {
        let ids = source.list_ids(start, page_size)?;
        if ids.is_empty() {
            stop = StopReason::HistoryExhausted;
            break;
        }
        pages += 1;
        start += ids.len();

        // pages shift as new games are played, so ids can repeat across pages
        let fresh: Vec<String> = ids.iter().filter(|id| seen.insert((*id).clone())).cloned().collect();
        let mut report = PageReport {
            page: pages,
            ids: ids.len(),
            ..PageReport::default()
        };

        for (id, result) in fresh.iter().zip(source.fetch_details(&fresh)) {
            match result {
                Ok(detail) => {
                    let patch = detail.patch();
                    if !patch.is_unknown() {
                        report.oldest = Some(report.oldest.map_or(patch, |o| o.min(patch)));
                    }
                    if bound.admits(patch) {
                        matches.push(detail);
                        report.kept += 1;
                    }
                }
                Err(e) => {
                    warn!(match_id = %id, error = %e, "skipping match detail");
                    report.failed += 1;
                }
            }
        }
        failed += report.failed;
        info!(
            page = report.page,
            ids = report.ids,
            kept = report.kept,
            failed = report.failed,
            oldest = ?report.oldest.map(|p| p.to_string()),
            "match page collected"
        );
        on_page(&report);

        if report.oldest.is_some_and(|oldest| oldest < bound.lower()) {
            stop = StopReason::PastLowerBound;
            break;
        }
        if matches!(bound, PatchBound::Since(_)) && matches.len() >= config.sample_target {
            stop = StopReason::SampleTarget;
            break;
        }
        if ids.len() < page_size {
            stop = StopReason::HistoryExhausted;
            break;
        }
    }

    Ok(CollectedMatches {
        matches,
        pages,
        failed,
        stop,
    })
}

/// All matches inside a split's patch window. Wall-clock bounds on the
/// window, when configured, are pushed upstream as `startTime`/`endTime`.
pub fn fetch_matches_in_window<F: FnMut(&PageReport)>(
    client: &RiotApiClient,
    region: &str,
    puuid: &str,
    window: &SplitWindow,
    config: &PaginationConfig,
    on_page: F,
) -> Result<CollectedMatches, AppError> {
    let source = PlayerHistory {
        client,
        region,
        puuid,
        filter: MatchFilter {
            start_time: window.starts_at,
            end_time: window.ends_at,
            queue: None,
        },
    };
    let bound = PatchBound::Window {
        lo: window.first,
        hi: window.last,
    };
    collect_matches(&source, bound, config, on_page)
}

pub fn fetch_matches_since_patch<F: FnMut(&PageReport)>(
    client: &RiotApiClient,
    region: &str,
    puuid: &str,
    lower: PatchVersion,
    config: &PaginationConfig,
    on_page: F,
) -> Result<CollectedMatches, AppError> {
    let source = PlayerHistory {
        client,
        region,
        puuid,
        filter: MatchFilter::default(),
    };
    collect_matches(&source, PatchBound::Since(lower), config, on_page)
}
