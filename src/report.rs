//! Lookups that combine several upstream calls: the player's current rank
//! and a page of recent match briefs.

use crate::analysis::queue::QueueBucket;
use crate::analysis::summary::RankSnapshot;
use crate::api::client::{MatchFilter, RiotApiClient};
use crate::api::models::MatchDto;
use crate::error::AppError;
use tracing::{debug, warn};

pub const MAX_BRIEFS: usize = 50;

/// Current ranked standing on `platform`. Entries are looked up by puuid
/// first; if that comes back empty, the encrypted summoner id is recovered
/// from the latest match (or the summoner route) and tried as well.
pub fn fetch_rank_snapshot(
    client: &RiotApiClient,
    region: &str,
    platform: &str,
    puuid: &str,
) -> Result<RankSnapshot, AppError> {
    let entries = soft(client.get_ranked_entries_by_puuid(platform, puuid))?;
    if !entries.is_empty() {
        return Ok(RankSnapshot::from_entries(&entries));
    }

    let Some(summoner_id) = summoner_id_for(client, region, platform, puuid)? else {
        debug!(platform, "no summoner id, reporting unranked");
        return Ok(RankSnapshot::default());
    };
    let entries = soft(client.get_ranked_entries(platform, &summoner_id))?;
    Ok(RankSnapshot::from_entries(&entries))
}

fn summoner_id_for(
    client: &RiotApiClient,
    region: &str,
    platform: &str,
    puuid: &str,
) -> Result<Option<String>, AppError> {
    let latest = client.list_match_ids(region, puuid, 0, 1, &MatchFilter::default())?;
    if let Some(id) = latest.first() {
        match client.get_match(region, id) {
            Ok(m) => {
                if let Some(sid) = m.participant(puuid).and_then(|p| p.summoner_id.clone()) {
                    if !sid.is_empty() {
                        return Ok(Some(sid));
                    }
                }
            }
            Err(e) => warn!(match_id = %id, error = %e, "latest match unavailable"),
        }
    }

    let summoner = soft(client.get_summoner(platform, puuid).map(Some))?;
    Ok(summoner.map(|s| s.id).filter(|id| !id.is_empty()))
}

/// Upstream rejections on rank routes mean "no data here", not failure.
fn soft<T: Default>(result: Result<T, AppError>) -> Result<T, AppError> {
    match result {
        Err(AppError::PermanentUpstream { status, url }) => {
            debug!(status, url, "treating as empty");
            Ok(T::default())
        }
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchBrief {
    pub match_id: String,
    pub queue_id: i32,
    pub game_mode: String,
    pub duration_sec: i64,
    /// `major.minor`, empty when the version is unparsable.
    pub patch: String,
    pub champion: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub win: bool,
}

impl MatchBrief {
    pub fn from_match(m: &MatchDto, puuid: &str) -> Self {
        let you = m.participant(puuid);
        let patch = m.patch();
        MatchBrief {
            match_id: m.match_id().to_string(),
            queue_id: m.info.queue_id,
            game_mode: m.info.game_mode.clone(),
            duration_sec: m.info.game_duration,
            patch: if patch.is_unknown() { String::new() } else { patch.to_string() },
            champion: you.map(|p| p.champion_name.clone()).unwrap_or_default(),
            kills: you.map_or(0, |p| p.kills),
            deaths: you.map_or(0, |p| p.deaths),
            assists: you.map_or(0, |p| p.assists),
            win: you.is_some_and(|p| p.win),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchPage {
    pub start: usize,
    /// Offset to pass as `start` for the following page.
    pub next_start: usize,
    pub matches: Vec<MatchBrief>,
}

/// Recent games, optionally restricted to one queue bucket. A bucket with a
/// single queue id is filtered upstream; otherwise a larger id window is
/// listed and filtered on the details.
pub fn recent_matches(
    client: &RiotApiClient,
    region: &str,
    puuid: &str,
    mode: Option<QueueBucket>,
    start: usize,
    count: usize,
) -> Result<MatchPage, AppError> {
    let count = count.clamp(1, MAX_BRIEFS);

    let (details, next_start) = match mode.map(|b| b.queue_ids()) {
        Some(&[queue]) => {
            let ids = client.list_match_ids(region, puuid, start, count, &MatchFilter::queue(queue))?;
            let next = start + ids.len();
            (fetch_ok(client, region, &ids), next)
        }
        Some(queues) => {
            let overfetch = (count * 3).max(60);
            let raw = client.list_match_ids(region, puuid, start, overfetch, &MatchFilter::default())?;
            let mut picked = Vec::new();
            let mut consumed = 0;
            for (i, result) in client.get_matches(region, &raw).into_iter().enumerate() {
                if picked.len() == count {
                    break;
                }
                consumed = i + 1;
                match result {
                    Ok(m) if queues.contains(&m.info.queue_id) => picked.push(m),
                    Ok(_) => {}
                    Err(e) => warn!(match_id = %raw[i], error = %e, "skipping match detail"),
                }
            }
            (picked, start + consumed)
        }
        None => {
            let ids = client.list_match_ids(region, puuid, start, count, &MatchFilter::default())?;
            let next = start + ids.len();
            (fetch_ok(client, region, &ids), next)
        }
    };

    Ok(MatchPage {
        start,
        next_start,
        matches: details.iter().map(|m| MatchBrief::from_match(m, puuid)).collect(),
    })
}

fn fetch_ok(client: &RiotApiClient, region: &str, ids: &[String]) -> Vec<MatchDto> {
    ids.iter()
        .zip(client.get_matches(region, ids))
        .filter_map(|(id, result)| match result {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(match_id = %id, error = %e, "skipping match detail");
                None
            }
        })
        .collect()
}
