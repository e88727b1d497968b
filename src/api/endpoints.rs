// Routing tables and URL builders for the Riot API hosts.

use crate::error::AppError;
use urlencoding::encode;

pub const REGIONS: [&str; 4] = ["americas", "europe", "asia", "sea"];

const PLATFORMS: [(&str, &str); 16] = [
    ("na1", "americas"),
    ("br1", "americas"),
    ("la1", "americas"),
    ("la2", "americas"),
    ("oc1", "americas"),
    ("euw1", "europe"),
    ("eun1", "europe"),
    ("tr1", "europe"),
    ("ru", "europe"),
    ("kr", "asia"),
    ("jp1", "asia"),
    ("ph2", "sea"),
    ("sg2", "sea"),
    ("th2", "sea"),
    ("tw2", "sea"),
    ("vn2", "sea"),
];

const PLATFORM_ALIASES: [(&str, &str); 5] = [
    ("na", "na1"),
    ("euw", "euw1"),
    ("eune", "eun1"),
    ("tr", "tr1"),
    ("jp", "jp1"),
];

pub fn normalize_region(region: &str) -> Result<&'static str, AppError> {
    let wanted = region.trim().to_lowercase();
    REGIONS
        .iter()
        .copied()
        .find(|r| *r == wanted)
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "region must be one of: {} (got {:?})",
                REGIONS.join(", "),
                region
            ))
        })
}

/// Accepts platform codes (`NA1`, `euw1`) or short aliases (`EUNE`); anything
/// unrecognised falls back to `na1`.
pub fn normalize_platform(code: &str) -> &'static str {
    let low = code.trim().to_lowercase();
    if let Some((platform, _)) = PLATFORMS.iter().find(|(p, _)| *p == low) {
        return *platform;
    }
    PLATFORM_ALIASES
        .iter()
        .find(|(alias, _)| *alias == low)
        .map(|(_, platform)| *platform)
        .unwrap_or("na1")
}

pub fn platforms_for_region(region: &str) -> Vec<&'static str> {
    PLATFORMS
        .iter()
        .filter(|(_, r)| *r == region)
        .map(|(p, _)| *p)
        .collect()
}

pub fn regional_routing(platform: &str) -> &'static str {
    let platform = normalize_platform(platform);
    PLATFORMS
        .iter()
        .find(|(p, _)| *p == platform)
        .map(|(_, r)| *r)
        .unwrap_or("americas")
}

/// Match ids are prefixed with their platform shard: `NA1_5012345678`.
pub fn platform_from_match_id(match_id: &str) -> Option<&'static str> {
    let (prefix, rest) = match_id.split_once('_')?;
    if rest.is_empty() {
        return None;
    }
    let low = prefix.to_lowercase();
    PLATFORMS.iter().find(|(p, _)| *p == low).map(|(p, _)| *p)
}

/// Splits `Name#TAG` (or the URL-escaped `Name%23TAG`).
pub fn parse_riot_id(raw: &str) -> Result<(String, String), AppError> {
    let unescaped = raw.replace("%23", "#");
    match unescaped.split_once('#') {
        Some((name, tag)) if !name.trim().is_empty() && !tag.trim().is_empty() => {
            Ok((name.trim().to_string(), tag.trim().to_string()))
        }
        _ => Err(AppError::InvalidInput(format!(
            "Riot ID must be formatted as Name#TAG (got {:?})",
            raw
        ))),
    }
}

fn host(shard: &str) -> String {
    format!("https://{}.api.riotgames.com", shard)
}

pub fn account_url(region: &str, game_name: &str, tag_line: &str) -> String {
    format!(
        "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
        host(region),
        encode(game_name),
        encode(tag_line)
    )
}

pub fn match_ids_url(region: &str, puuid: &str) -> String {
    format!("{}/lol/match/v5/matches/by-puuid/{}/ids", host(region), puuid)
}

pub fn match_url(region: &str, match_id: &str) -> String {
    format!("{}/lol/match/v5/matches/{}", host(region), match_id)
}

pub fn summoner_url(platform: &str, puuid: &str) -> String {
    format!("{}/lol/summoner/v4/summoners/by-puuid/{}", host(platform), puuid)
}

pub fn league_by_summoner_url(platform: &str, summoner_id: &str) -> String {
    format!("{}/lol/league/v4/entries/by-summoner/{}", host(platform), summoner_id)
}

pub fn league_by_puuid_url(platform: &str, puuid: &str) -> String {
    format!("{}/lol/league/v4/entries/by-puuid/{}", host(platform), puuid)
}
