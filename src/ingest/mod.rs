pub mod paginator;
pub mod patch;

use crate::api::client::{MatchFilter, RiotApiClient};
use crate::api::endpoints::{normalize_region, parse_riot_id, platform_from_match_id, platforms_for_region, REGIONS};
use crate::error::AppError;
use tracing::{debug, warn};

/// A resolved player: the regional cluster their account answered on and
/// their stable id.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerId {
    pub game_name: String,
    pub tag_line: String,
    pub region: &'static str,
    pub puuid: String,
}

impl PlayerId {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }
}

/// Resolves `Name#TAG` to a puuid. Without a region hint every regional
/// cluster is probed in turn until one knows the account.
pub fn resolve_player_id(client: &RiotApiClient, riot_id: &str, region: Option<&str>) -> Result<PlayerId, AppError> {
    let (game_name, tag_line) = parse_riot_id(riot_id)?;

    let candidates: Vec<&'static str> = match region.filter(|r| !r.trim().is_empty()) {
        Some(r) => vec![normalize_region(r)?],
        None => REGIONS.to_vec(),
    };

    for candidate in candidates {
        match client.resolve_account_id(candidate, &game_name, &tag_line) {
            Ok(puuid) => {
                return Ok(PlayerId {
                    game_name,
                    tag_line,
                    region: candidate,
                    puuid,
                })
            }
            Err(AppError::PlayerNotFound(_)) => {
                debug!(region = candidate, "account not found on cluster");
            }
            Err(e) => return Err(e),
        }
    }

    Err(AppError::PlayerNotFound(format!("{}#{}", game_name, tag_line)))
}

/// Platform shard for summoner/league routes: taken from the latest match id
/// prefix, otherwise found by probing the region's platforms.
pub fn derive_platform(client: &RiotApiClient, player: &PlayerId) -> Result<Option<&'static str>, AppError> {
    match client.list_match_ids(player.region, &player.puuid, 0, 1, &MatchFilter::default()) {
        Ok(latest) => {
            if let Some(platform) = latest.first().and_then(|id| platform_from_match_id(id)) {
                return Ok(Some(platform));
            }
        }
        Err(e) => warn!(region = player.region, error = %e, "match listing failed, probing summoner routes"),
    }

    for platform in platforms_for_region(player.region) {
        match client.get_summoner(platform, &player.puuid) {
            Ok(summoner) if !summoner.id.is_empty() || !summoner.puuid.is_empty() => return Ok(Some(platform)),
            Ok(_) => {}
            Err(e) if e.status().is_some() => {
                debug!(platform, error = %e, "summoner probe failed");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}
