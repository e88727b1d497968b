use crate::api::endpoints::regional_routing;
use crate::error::AppError;
use crate::ingest::patch::{parse_patch, PatchVersion, SplitWindow};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    /// Regional cluster for account and match routes (americas, europe, asia,
    /// sea). Unset means every cluster is probed.
    pub region: Option<String>,
    /// Platform shard for summoner and league routes (na1, euw1, ...). Unset
    /// means it is derived from the player's activity.
    pub platform: Option<String>,
    pub rate_per_sec: f64,
    pub rate_capacity: u32,
    pub burst_per_sec: u32,
    pub detail_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("RIOT_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("RIOT_API_KEY not found in environment or .env file".to_string()))?;

        let mut config = Config::with_api_key(api_key);
        config.region = non_empty_env("RIOT_REGION");
        config.platform = non_empty_env("RIOT_PLATFORM");
        config.rate_per_sec = env_or("RIOT_RATE_PER_SEC", config.rate_per_sec)?;
        config.rate_capacity = env_or("RIOT_RATE_CAPACITY", config.rate_capacity)?;
        config.burst_per_sec = env_or("RIOT_BURST_PER_SEC", config.burst_per_sec)?;
        config.detail_concurrency = env_or("RIOT_DETAIL_CONCURRENCY", config.detail_concurrency)?;

        if config.rate_per_sec <= 0.0 || config.rate_capacity == 0 || config.detail_concurrency == 0 {
            return Err(AppError::ConfigError(
                "rate, capacity and detail concurrency must be positive".to_string(),
            ));
        }

        Ok(config)
    }

    /// Defaults tuned for a development key: 100 requests / 2 minutes,
    /// 20 requests / second.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Config {
            api_key: api_key.into(),
            region: None,
            platform: None,
            rate_per_sec: 0.8,
            rate_capacity: 20,
            burst_per_sec: 20,
            detail_concurrency: 8,
        }
    }
}

impl Config {
    /// Cluster to resolve accounts on: the configured region, else the
    /// cluster that routes the configured platform.
    pub fn region_hint(&self) -> Option<String> {
        self.region
            .clone()
            .or_else(|| self.platform.as_deref().map(|p| regional_routing(p).to_string()))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::ConfigError(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, Deserialize)]
struct SplitFileEntry {
    id: String,
    first_patch: String,
    last_patch: String,
    #[serde(default)]
    starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    ends_at: Option<DateTime<Utc>>,
}

fn splits_path() -> Option<(PathBuf, bool)> {
    if let Ok(explicit) = env::var("LEAGUE_INSIGHT_SPLITS") {
        return Some((PathBuf::from(explicit), true));
    }
    dirs::config_dir().map(|dir| (dir.join("league_insight").join("splits.json"), false))
}

/// Split windows from `LEAGUE_INSIGHT_SPLITS`, the user config dir, or the
/// built-in Season 15 table, in that order.
pub fn load_splits() -> Result<Vec<SplitWindow>, AppError> {
    match splits_path() {
        Some((path, explicit)) if explicit || path.exists() => {
            let content = fs::read_to_string(&path).map_err(|e| {
                AppError::ConfigError(format!("Failed to read splits file {}: {}", path.display(), e))
            })?;
            let splits = parse_splits(&content)?;
            tracing::debug!(path = %path.display(), count = splits.len(), "loaded split windows");
            Ok(splits)
        }
        _ => Ok(default_splits()),
    }
}

pub fn parse_splits(content: &str) -> Result<Vec<SplitWindow>, AppError> {
    let entries: Vec<SplitFileEntry> = serde_json::from_str(content)
        .map_err(|e| AppError::ConfigError(format!("Failed to parse splits file: {}", e)))?;

    entries
        .into_iter()
        .map(|entry| {
            let first = strict_patch(&entry.first_patch)?;
            let last = strict_patch(&entry.last_patch)?;
            if last < first {
                return Err(AppError::ConfigError(format!(
                    "split {} ends before it starts ({} > {})",
                    entry.id, first, last
                )));
            }
            Ok(SplitWindow {
                id: entry.id,
                first,
                last,
                starts_at: entry.starts_at,
                ends_at: entry.ends_at,
            })
        })
        .collect()
}

fn strict_patch(raw: &str) -> Result<PatchVersion, AppError> {
    let patch = parse_patch(raw);
    if patch.is_unknown() {
        return Err(AppError::ConfigError(format!("invalid patch in splits file: {:?}", raw)));
    }
    Ok(patch)
}

pub fn default_splits() -> Vec<SplitWindow> {
    [
        ("s1", (15, 1), (15, 4), "2025-01-09T00:00:00Z", "2025-03-05T00:00:00Z"),
        ("s2", (15, 5), (15, 16), "2025-03-05T00:00:00Z", "2025-08-13T00:00:00Z"),
        ("s3", (15, 17), (15, 24), "2025-08-13T00:00:00Z", "2025-10-22T00:00:00Z"),
    ]
    .into_iter()
    .map(|(id, first, last, start, end)| SplitWindow {
        id: id.to_string(),
        first: PatchVersion::new(first.0, first.1),
        last: PatchVersion::new(last.0, last.1),
        starts_at: start.parse().ok(),
        ends_at: end.parse().ok(),
    })
    .collect()
}
