use crate::cache::ResponseCache;
use crate::config::Config;
use crate::error::AppError;
use crate::rate_limit::{BurstGuard, TokenBucket};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Called with every retry delay; `thread::sleep` outside of tests.
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;
use tracing::{debug, warn};

use super::endpoints::{self, normalize_platform, normalize_region};
use super::models::*;
use super::retry::{Attempt, RetryDecision, RetryPolicy};
use super::transport::{HttpResponse, Transport, UreqTransport};

const ACCOUNT_TTL: Duration = Duration::from_secs(3600);
const SUMMONER_TTL: Duration = Duration::from_secs(3600);
const MATCH_TTL: Duration = Duration::from_secs(3600);
const RANKED_TTL: Duration = Duration::from_secs(300);
const MATCH_IDS_TTL: Duration = Duration::from_secs(120);

/// Upstream allows at most 100 ids per listing call.
pub const MAX_IDS_PER_PAGE: usize = 100;

/// Optional narrowing for match-id listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchFilter {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub queue: Option<i32>,
}

impl MatchFilter {
    pub fn queue(queue: i32) -> Self {
        MatchFilter {
            queue: Some(queue),
            ..MatchFilter::default()
        }
    }

    fn cache_suffix(&self) -> String {
        format!(
            "{}:{}:{}",
            self.start_time.map(|t| t.timestamp().to_string()).unwrap_or_default(),
            self.end_time.map(|t| t.timestamp().to_string()).unwrap_or_default(),
            self.queue.map(|q| q.to_string()).unwrap_or_default()
        )
    }
}

pub struct RiotApiClient {
    api_key: String,
    limiter: Arc<TokenBucket>,
    burst: Option<Arc<BurstGuard>>,
    cache: Arc<ResponseCache<Value>>,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    sleep: Sleeper,
    detail_pool: rayon::ThreadPool,
}

/// Assembles a client from shared components so several clients (or tests)
/// can share one limiter and one cache.
pub struct ClientBuilder {
    api_key: String,
    limiter: Option<Arc<TokenBucket>>,
    burst: Option<Arc<BurstGuard>>,
    cache: Option<Arc<ResponseCache<Value>>>,
    transport: Option<Arc<dyn Transport>>,
    policy: RetryPolicy,
    sleep: Option<Sleeper>,
    detail_concurrency: usize,
}

impl ClientBuilder {
    pub fn limiter(mut self, limiter: Arc<TokenBucket>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn burst_guard(mut self, burst: Arc<BurstGuard>) -> Self {
        self.burst = Some(burst);
        self
    }

    pub fn cache(mut self, cache: Arc<ResponseCache<Value>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn sleeper(mut self, sleep: Sleeper) -> Self {
        self.sleep = Some(sleep);
        self
    }

    pub fn detail_concurrency(mut self, detail_concurrency: usize) -> Self {
        self.detail_concurrency = detail_concurrency;
        self
    }

    pub fn build(self) -> Result<RiotApiClient, AppError> {
        let detail_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.detail_concurrency.max(1))
            .thread_name(|i| format!("match-detail-{}", i))
            .build()
            .map_err(|e| AppError::ConfigError(format!("failed to start detail pool: {}", e)))?;

        Ok(RiotApiClient {
            api_key: self.api_key,
            limiter: self.limiter.unwrap_or_else(|| Arc::new(TokenBucket::new(20, 0.8))),
            burst: self.burst,
            cache: self.cache.unwrap_or_default(),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(UreqTransport::new()) as Arc<dyn Transport>),
            policy: self.policy,
            sleep: self.sleep.unwrap_or_else(|| Arc::new(thread::sleep) as Sleeper),
            detail_pool,
        })
    }
}

impl RiotApiClient {
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            api_key: api_key.into(),
            limiter: None,
            burst: None,
            cache: None,
            transport: None,
            policy: RetryPolicy::default(),
            sleep: None,
            detail_concurrency: 8,
        }
    }

    pub fn new(config: &Config) -> Result<Self, AppError> {
        Self::builder(config.api_key.clone())
            .limiter(Arc::new(TokenBucket::new(config.rate_capacity, config.rate_per_sec)))
            .burst_guard(Arc::new(BurstGuard::per_second(config.burst_per_sec)?))
            .detail_concurrency(config.detail_concurrency)
            .build()
    }

    pub fn resolve_account_id(&self, region: &str, game_name: &str, tag_line: &str) -> Result<String, AppError> {
        let region = normalize_region(region)?;
        let url = endpoints::account_url(region, game_name, tag_line);
        let key = format!("acc:{}:{}#{}", region, game_name, tag_line);

        let account: AccountDto = self
            .fetch_json(&url, &[], &key, ACCOUNT_TTL)
            .map_err(|e| match e.status() {
                Some(404) => AppError::PlayerNotFound(format!("{}#{}", game_name, tag_line)),
                _ => e,
            })
            .and_then(decode)?;
        Ok(account.puuid)
    }

    pub fn list_match_ids(
        &self,
        region: &str,
        puuid: &str,
        start: usize,
        count: usize,
        filter: &MatchFilter,
    ) -> Result<Vec<String>, AppError> {
        let region = normalize_region(region)?;
        let count = count.clamp(1, MAX_IDS_PER_PAGE);
        let url = endpoints::match_ids_url(region, puuid);

        let mut query = vec![("start", start.to_string()), ("count", count.to_string())];
        if let Some(t) = filter.start_time {
            query.push(("startTime", t.timestamp().to_string()));
        }
        if let Some(t) = filter.end_time {
            query.push(("endTime", t.timestamp().to_string()));
        }
        if let Some(q) = filter.queue {
            query.push(("queue", q.to_string()));
        }

        let key = format!("mids:{}:{}:{}:{}:{}", region, puuid, start, count, filter.cache_suffix());
        self.fetch_json(&url, &query, &key, MATCH_IDS_TTL).and_then(decode)
    }

    pub fn get_match(&self, region: &str, match_id: &str) -> Result<MatchDto, AppError> {
        let region = normalize_region(region)?;
        let url = endpoints::match_url(region, match_id);
        let key = format!("match:{}:{}", region, match_id);

        let mut detail: MatchDto = self.fetch_json(&url, &[], &key, MATCH_TTL).and_then(decode)?;
        if detail.metadata.match_id.is_empty() {
            detail.metadata.match_id = match_id.to_string();
        }
        Ok(detail)
    }

    /// Fetches details on the bounded detail pool. Results line up with
    /// `match_ids` by index; one failure does not affect its siblings.
    pub fn get_matches(&self, region: &str, match_ids: &[String]) -> Vec<Result<MatchDto, AppError>> {
        self.detail_pool.install(|| {
            match_ids
                .par_iter()
                .map(|id| self.get_match(region, id))
                .collect()
        })
    }

    pub fn get_summoner(&self, platform: &str, puuid: &str) -> Result<SummonerDto, AppError> {
        let platform = normalize_platform(platform);
        let url = endpoints::summoner_url(platform, puuid);
        let key = format!("summ:{}:{}", platform, puuid);
        self.fetch_json(&url, &[], &key, SUMMONER_TTL).and_then(decode)
    }

    pub fn get_ranked_entries(&self, platform: &str, summoner_id: &str) -> Result<Vec<LeagueEntryDto>, AppError> {
        let platform = normalize_platform(platform);
        let url = endpoints::league_by_summoner_url(platform, summoner_id);
        let key = format!("rank_sid:{}:{}", platform, summoner_id);
        self.fetch_json(&url, &[], &key, RANKED_TTL).and_then(decode)
    }

    pub fn get_ranked_entries_by_puuid(&self, platform: &str, puuid: &str) -> Result<Vec<LeagueEntryDto>, AppError> {
        let platform = normalize_platform(platform);
        let url = endpoints::league_by_puuid_url(platform, puuid);
        let key = format!("rank_puuid:{}:{}", platform, puuid);
        self.fetch_json(&url, &[], &key, RANKED_TTL).and_then(decode)
    }

    fn fetch_json(&self, url: &str, query: &[(&str, String)], key: &str, ttl: Duration) -> Result<Value, AppError> {
        self.cache
            .get_or_fetch(key, ttl, || self.execute_request(url, query))
    }

    fn execute_request(&self, url: &str, query: &[(&str, String)]) -> Result<Value, AppError> {
        let mut transient_attempts = 0u32;
        let mut rate_limited = 0u32;

        loop {
            let waited = self.limiter.acquire();
            if let Some(burst) = &self.burst {
                burst.wait();
            }
            debug!(url, waited_ms = waited.as_millis() as u64, "GET");

            let (attempt, response, transport_error) = match self.transport.get(url, query, &self.api_key) {
                Ok(resp) => (
                    Attempt::Status { code: resp.status, retry_after: resp.retry_after },
                    Some(resp),
                    None,
                ),
                Err(e) => (Attempt::Transport, None, Some(e)),
            };
            match attempt {
                Attempt::Transport | Attempt::Status { code: 502..=504, .. } => transient_attempts += 1,
                Attempt::Status { code: 429, .. } => {
                    rate_limited += 1;
                    if self.policy.rate_limit_exhausted(rate_limited) {
                        return Err(AppError::RateLimited);
                    }
                }
                _ => {}
            }

            match self.policy.decide(attempt, transient_attempts) {
                RetryDecision::Succeed => {
                    let body = response.map(|r: HttpResponse| r.body).unwrap_or_default();
                    return serde_json::from_str(&body).map_err(AppError::from);
                }
                RetryDecision::Retry(delay) => {
                    warn!(url, ?attempt, delay_ms = delay.as_millis() as u64, "retrying upstream request");
                    (self.sleep)(delay);
                }
                RetryDecision::Fail => {
                    return Err(match (attempt, transport_error) {
                        (Attempt::Transport, Some(e)) => e,
                        (Attempt::Status { code: code @ 502..=504, .. }, _) => AppError::TransientUpstream {
                            status: code,
                            attempts: transient_attempts,
                        },
                        (Attempt::Status { code, .. }, _) => AppError::PermanentUpstream {
                            status: code,
                            url: url.to_string(),
                        },
                        (Attempt::Transport, None) => AppError::HttpError(format!("request to {} failed", url)),
                    });
                }
            }
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(AppError::from)
}
