use league_insight::analysis::queue::QueueBucket;
use league_insight::api::client::{MatchFilter, RiotApiClient};
use league_insight::cache::ResponseCache;
use league_insight::api::endpoints;
use league_insight::api::retry::RetryPolicy;
use league_insight::api::transport::{HttpResponse, Transport};
use league_insight::error::AppError;
use league_insight::ingest::paginator::{fetch_matches_since_patch, PaginationConfig, StopReason};
use league_insight::ingest::patch::PatchVersion;
use league_insight::ingest::{derive_platform, resolve_player_id, PlayerId};
use league_insight::rate_limit::TokenBucket;
use league_insight::report::{fetch_rank_snapshot, recent_matches};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

const PUUID: &str = "puuid-1";

#[derive(Clone)]
enum Reply {
    Status(u16, String),
    RateLimited(u64),
    Broken,
}

/// Replays scripted responses per request. The last reply for a route is
/// repeated once the script runs out; unknown routes answer 404.
#[derive(Default)]
struct FakeTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
    latency: Duration,
}

impl FakeTransport {
    fn with_latency(latency: Duration) -> Self {
        FakeTransport {
            latency,
            ..FakeTransport::default()
        }
    }

    fn script(&self, key: impl Into<String>, replies: Vec<Reply>) {
        self.routes.lock().unwrap().insert(key.into(), replies.into());
    }

    fn ok(&self, key: impl Into<String>, body: serde_json::Value) {
        self.script(key, vec![Reply::Status(200, body.to_string())]);
    }

    fn calls_to(&self, key: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == key).count()
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

fn route_key(url: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let params: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", url, params.join("&"))
}

impl Transport for FakeTransport {
    fn get(&self, url: &str, query: &[(&str, String)], api_key: &str) -> Result<HttpResponse, AppError> {
        assert_eq!(api_key, "test-key");
        let key = route_key(url, query);
        self.calls.lock().unwrap().push(key.clone());
        thread::sleep(self.latency);

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&key) {
                Some(script) if script.len() > 1 => script.pop_front(),
                Some(script) => script.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Status(status, body)) => Ok(HttpResponse {
                status,
                retry_after: None,
                body,
            }),
            Some(Reply::RateLimited(secs)) => Ok(HttpResponse {
                status: 429,
                retry_after: Some(Duration::from_secs(secs)),
                body: String::new(),
            }),
            Some(Reply::Broken) => Err(AppError::HttpError("connection reset".into())),
            None => Ok(HttpResponse {
                status: 404,
                retry_after: None,
                body: r#"{"status":{"status_code":404}}"#.into(),
            }),
        }
    }
}

fn client_with(fake: &Arc<FakeTransport>, policy: RetryPolicy) -> RiotApiClient {
    RiotApiClient::builder("test-key")
        .transport(fake.clone())
        .limiter(Arc::new(TokenBucket::new(10_000, 10_000.0)))
        .retry_policy(policy)
        .detail_concurrency(4)
        .build()
        .unwrap()
}

fn client(fake: &Arc<FakeTransport>) -> RiotApiClient {
    client_with(fake, RetryPolicy::immediate())
}

fn match_body(id: &str, queue: i32, version: &str, champion: &str) -> serde_json::Value {
    json!({
        "metadata": {"matchId": id, "participants": [PUUID]},
        "info": {
            "queueId": queue,
            "gameVersion": version,
            "gameDuration": 1800,
            "gameMode": "CLASSIC",
            "participants": [{
                "puuid": PUUID,
                "summonerId": "summ-1",
                "championName": champion,
                "teamId": 100,
                "win": true,
                "kills": 7, "deaths": 2, "assists": 9,
                "teamPosition": "MIDDLE",
                "totalMinionsKilled": 200,
                "visionScore": 20,
                "totalDamageDealtToChampions": 20000,
                "timePlayed": 1800
            }]
        }
    })
}

fn ids_key(region: &str, start: usize, count: usize, queue: Option<i32>) -> String {
    let mut query = vec![("start", start.to_string()), ("count", count.to_string())];
    if let Some(q) = queue {
        query.push(("queue", q.to_string()));
    }
    route_key(&endpoints::match_ids_url(region, PUUID), &query)
}

#[test]
fn rate_limited_request_is_retried_until_it_succeeds() {
    let fake = Arc::new(FakeTransport::default());
    let url = endpoints::account_url("americas", "Faker", "KR1");
    fake.script(
        url.clone(),
        vec![
            Reply::RateLimited(0),
            Reply::RateLimited(0),
            Reply::Status(200, json!({"puuid": PUUID}).to_string()),
        ],
    );

    let puuid = client(&fake).resolve_account_id("americas", "Faker", "KR1").unwrap();
    assert_eq!(puuid, PUUID);
    assert_eq!(fake.calls_to(&url), 3);
}

#[test]
fn server_retry_after_reaches_the_retry_sleep() {
    let fake = Arc::new(FakeTransport::default());
    let url = endpoints::match_url("americas", "NA1_1");
    fake.script(
        url.clone(),
        vec![
            Reply::RateLimited(7),
            Reply::RateLimited(0),
            Reply::Status(200, match_body("NA1_1", 420, "15.4.1", "Ahri").to_string()),
        ],
    );

    let slept = Arc::new(Mutex::new(Vec::<Duration>::new()));
    let recorder = slept.clone();
    let client = RiotApiClient::builder("test-key")
        .transport(fake.clone())
        .limiter(Arc::new(TokenBucket::new(10_000, 10_000.0)))
        .retry_policy(RetryPolicy::default())
        .sleeper(Arc::new(move |d: Duration| recorder.lock().unwrap().push(d)))
        .build()
        .unwrap();

    client.get_match("americas", "NA1_1").unwrap();
    // a zero header is raised to the one second floor
    assert_eq!(*slept.lock().unwrap(), vec![Duration::from_secs(7), Duration::from_secs(1)]);
    assert_eq!(fake.calls_to(&url), 3);
}

#[test]
fn rate_limit_cap_surfaces_rate_limited() {
    let fake = Arc::new(FakeTransport::default());
    let url = endpoints::match_url("americas", "NA1_1");
    fake.script(url.clone(), vec![Reply::RateLimited(0)]);

    let policy = RetryPolicy {
        max_rate_limited: Some(2),
        ..RetryPolicy::immediate()
    };
    let result = client_with(&fake, policy).get_match("americas", "NA1_1");
    assert_eq!(result.unwrap_err(), AppError::RateLimited);
    assert_eq!(fake.calls_to(&url), 3);
}

#[test]
fn gateway_errors_give_up_after_two_retries() {
    let fake = Arc::new(FakeTransport::default());
    let url = endpoints::match_url("americas", "NA1_1");
    fake.script(url.clone(), vec![Reply::Status(503, String::new())]);

    let err = client(&fake).get_match("americas", "NA1_1").unwrap_err();
    assert_eq!(err, AppError::TransientUpstream { status: 503, attempts: 3 });
    assert_eq!(fake.calls_to(&url), 3);
}

#[test]
fn transport_failure_recovers_on_retry() {
    let fake = Arc::new(FakeTransport::default());
    let url = endpoints::match_url("americas", "NA1_1");
    fake.script(
        url.clone(),
        vec![
            Reply::Broken,
            Reply::Status(200, match_body("NA1_1", 420, "15.4.1", "Ahri").to_string()),
        ],
    );

    let m = client(&fake).get_match("americas", "NA1_1").unwrap();
    assert_eq!(m.match_id(), "NA1_1");
    assert_eq!(fake.calls_to(&url), 2);
}

#[test]
fn missing_account_fails_without_retry() {
    let fake = Arc::new(FakeTransport::default());
    let err = client(&fake).resolve_account_id("europe", "Nobody", "000").unwrap_err();
    assert!(matches!(err, AppError::PlayerNotFound(_)));
    assert_eq!(fake.total_calls(), 1);
}

#[test]
fn other_client_errors_are_permanent() {
    let fake = Arc::new(FakeTransport::default());
    let url = endpoints::match_url("americas", "NA1_1");
    fake.script(url.clone(), vec![Reply::Status(403, String::new())]);

    let err = client(&fake).get_match("americas", "NA1_1").unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(fake.calls_to(&url), 1);
}

#[test]
fn bad_region_is_rejected_before_any_request() {
    let fake = Arc::new(FakeTransport::default());
    let err = client(&fake).get_match("mars", "NA1_1").unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(fake.total_calls(), 0);
}

#[test]
fn concurrent_requests_for_one_match_share_a_call() {
    let fake = Arc::new(FakeTransport::with_latency(Duration::from_millis(80)));
    let url = endpoints::match_url("americas", "NA1_7");
    fake.ok(url.clone(), match_body("NA1_7", 420, "15.4.1", "Ahri"));
    let client = client(&fake);
    let barrier = Barrier::new(8);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    client.get_match("americas", "NA1_7")
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|r| r.as_ref().map(|m| m.match_id()) == Ok("NA1_7")));
    assert_eq!(fake.calls_to(&url), 1);

    // served from cache afterwards
    client.get_match("americas", "NA1_7").unwrap();
    assert_eq!(fake.calls_to(&url), 1);
}

#[test]
fn clients_sharing_a_cache_share_responses() {
    let fake = Arc::new(FakeTransport::default());
    let url = endpoints::match_url("europe", "EUW1_9");
    fake.ok(url.clone(), match_body("EUW1_9", 420, "15.4.1", "Ahri"));
    let cache = Arc::new(ResponseCache::new());
    let build = || {
        RiotApiClient::builder("test-key")
            .transport(fake.clone())
            .limiter(Arc::new(TokenBucket::new(10_000, 10_000.0)))
            .cache(cache.clone())
            .build()
            .unwrap()
    };

    build().get_match("europe", "EUW1_9").unwrap();
    build().get_match("europe", "EUW1_9").unwrap();
    assert_eq!(fake.calls_to(&url), 1);
}

#[test]
fn batch_keeps_order_and_isolates_failures() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(endpoints::match_url("americas", "NA1_1"), match_body("NA1_1", 420, "15.4.1", "Ahri"));
    fake.script(endpoints::match_url("americas", "NA1_2"), vec![Reply::Status(500, String::new())]);
    fake.ok(endpoints::match_url("americas", "NA1_3"), match_body("NA1_3", 440, "15.4.1", "Zed"));

    let ids: Vec<String> = ["NA1_1", "NA1_2", "NA1_3"].iter().map(|s| s.to_string()).collect();
    let results = client(&fake).get_matches("americas", &ids);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().match_id(), "NA1_1");
    assert_eq!(results[1].as_ref().unwrap_err().status(), Some(500));
    assert_eq!(results[2].as_ref().unwrap().match_id(), "NA1_3");
}

#[test]
fn listing_count_is_clamped_and_filters_are_forwarded() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(ids_key("americas", 0, 100, Some(450)), json!(["NA1_1"]));

    let ids = client(&fake)
        .list_match_ids("americas", PUUID, 0, 500, &MatchFilter::queue(450))
        .unwrap();
    assert_eq!(ids, vec!["NA1_1".to_string()]);
}

#[test]
fn player_is_found_by_probing_clusters() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(endpoints::account_url("europe", "Caps", "EUW"), json!({"puuid": PUUID}));
    let client = client(&fake);

    let player = resolve_player_id(&client, "Caps%23EUW", None).unwrap();
    assert_eq!(player.region, "europe");
    assert_eq!(player.puuid, PUUID);
    assert_eq!(player.riot_id(), "Caps#EUW");
    // americas was tried first
    assert_eq!(fake.calls_to(&endpoints::account_url("americas", "Caps", "EUW")), 1);

    let err = resolve_player_id(&client, "Ghost#000", None).unwrap_err();
    assert!(matches!(err, AppError::PlayerNotFound(_)));
}

#[test]
fn platform_comes_from_latest_match_prefix() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(endpoints::account_url("europe", "Caps", "EUW"), json!({"puuid": PUUID}));
    fake.ok(ids_key("europe", 0, 1, None), json!(["EUN1_42"]));
    let client = client(&fake);

    let player = resolve_player_id(&client, "Caps#EUW", Some("europe")).unwrap();
    assert_eq!(derive_platform(&client, &player).unwrap(), Some("eun1"));
}

#[test]
fn platform_falls_back_to_summoner_probe() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(endpoints::account_url("asia", "Faker", "KR1"), json!({"puuid": PUUID}));
    fake.ok(ids_key("asia", 0, 1, None), json!([]));
    fake.ok(endpoints::summoner_url("jp1", PUUID), json!({"id": "summ-1", "puuid": PUUID}));
    let client = client(&fake);

    let player = resolve_player_id(&client, "Faker#KR1", Some("asia")).unwrap();
    assert_eq!(derive_platform(&client, &player).unwrap(), Some("jp1"));
}

#[test]
fn platform_probe_survives_failed_match_listing() {
    let fake = Arc::new(FakeTransport::default());
    fake.script(ids_key("asia", 0, 1, None), vec![Reply::Status(503, String::new())]);
    fake.ok(endpoints::summoner_url("jp1", PUUID), json!({"id": "summ-1", "puuid": PUUID}));
    let client = client(&fake);
    let player = PlayerId {
        game_name: "Faker".into(),
        tag_line: "KR1".into(),
        region: "asia",
        puuid: PUUID.into(),
    };

    assert_eq!(derive_platform(&client, &player).unwrap(), Some("jp1"));
    assert_eq!(fake.calls_to(&ids_key("asia", 0, 1, None)), 3);
}

#[test]
fn deep_pagination_stops_past_the_lower_patch() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(ids_key("americas", 0, 2, None), json!(["NA1_1", "NA1_2"]));
    fake.ok(ids_key("americas", 2, 2, None), json!(["NA1_3", "NA1_4"]));
    fake.ok(ids_key("americas", 4, 2, None), json!(["NA1_5", "NA1_6"]));
    for (id, version) in [
        ("NA1_1", "15.8.1"),
        ("NA1_2", "15.7.1"),
        ("NA1_3", "15.6.1"),
        ("NA1_4", "15.3.1"),
        ("NA1_5", "15.2.1"),
        ("NA1_6", "15.1.1"),
    ] {
        fake.ok(endpoints::match_url("americas", id), match_body(id, 420, version, "Ahri"));
    }

    let config = PaginationConfig {
        page_size: 2,
        max_pages: 10,
        sample_target: 50,
    };
    let mut pages = Vec::new();
    let collected = fetch_matches_since_patch(
        &client(&fake),
        "americas",
        PUUID,
        PatchVersion::new(15, 5),
        &config,
        |p| pages.push(p.kept),
    )
    .unwrap();

    let ids: Vec<&str> = collected.matches.iter().map(|m| m.match_id()).collect();
    assert_eq!(ids, vec!["NA1_1", "NA1_2", "NA1_3"]);
    assert_eq!(collected.stop, StopReason::PastLowerBound);
    assert_eq!(pages, vec![2, 1]);
    assert_eq!(fake.calls_to(&ids_key("americas", 4, 2, None)), 0);
}

#[test]
fn single_queue_briefs_filter_upstream() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(ids_key("americas", 0, 2, Some(420)), json!(["NA1_1", "NA1_2"]));
    fake.ok(endpoints::match_url("americas", "NA1_1"), match_body("NA1_1", 420, "15.4.1", "Ahri"));
    fake.ok(endpoints::match_url("americas", "NA1_2"), match_body("NA1_2", 420, "15.3.2", "Zed"));

    let page = recent_matches(&client(&fake), "americas", PUUID, Some(QueueBucket::Solo), 0, 2).unwrap();
    assert_eq!(page.next_start, 2);
    let champs: Vec<&str> = page.matches.iter().map(|m| m.champion.as_str()).collect();
    assert_eq!(champs, vec!["Ahri", "Zed"]);
    assert_eq!(page.matches[1].patch, "15.3");
}

#[test]
fn multi_queue_briefs_filter_on_details() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(ids_key("americas", 0, 60, None), json!(["NA1_1", "NA1_2", "NA1_3", "NA1_4"]));
    fake.ok(endpoints::match_url("americas", "NA1_1"), match_body("NA1_1", 420, "15.4.1", "Ahri"));
    fake.ok(endpoints::match_url("americas", "NA1_2"), match_body("NA1_2", 400, "15.4.1", "Garen"));
    fake.ok(endpoints::match_url("americas", "NA1_3"), match_body("NA1_3", 430, "15.4.1", "Lux"));
    fake.ok(endpoints::match_url("americas", "NA1_4"), match_body("NA1_4", 400, "15.4.1", "Zed"));

    let page = recent_matches(&client(&fake), "americas", PUUID, Some(QueueBucket::Normal), 0, 2).unwrap();
    let ids: Vec<&str> = page.matches.iter().map(|m| m.match_id.as_str()).collect();
    assert_eq!(ids, vec!["NA1_2", "NA1_3"]);
    assert_eq!(page.next_start, 3);
}

#[test]
fn rank_snapshot_prefers_solo_queue() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(
        endpoints::league_by_puuid_url("na1", PUUID),
        json!([
            {"queueType": "RANKED_FLEX_SR", "tier": "PLATINUM", "rank": "I", "leaguePoints": 80, "wins": 5, "losses": 2},
            {"queueType": "RANKED_SOLO_5x5", "tier": "GOLD", "rank": "II", "leaguePoints": 40, "wins": 30, "losses": 25}
        ]),
    );

    let rank = fetch_rank_snapshot(&client(&fake), "americas", "na1", PUUID).unwrap();
    assert_eq!(rank.queue, "RANKED_SOLO_5x5");
    assert_eq!(rank.tier.as_deref(), Some("GOLD"));
    assert_eq!(rank.division.as_deref(), Some("II"));
    assert_eq!(rank.lp, 40);
}

#[test]
fn rank_falls_back_to_summoner_id_from_latest_match() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(endpoints::league_by_puuid_url("na1", PUUID), json!([]));
    fake.ok(ids_key("americas", 0, 1, None), json!(["NA1_1"]));
    fake.ok(endpoints::match_url("americas", "NA1_1"), match_body("NA1_1", 420, "15.4.1", "Ahri"));
    fake.ok(
        endpoints::league_by_summoner_url("na1", "summ-1"),
        json!([{"queueType": "RANKED_FLEX_SR", "tier": "SILVER", "rank": "IV", "leaguePoints": 3}]),
    );

    let rank = fetch_rank_snapshot(&client(&fake), "americas", "na1", PUUID).unwrap();
    assert_eq!(rank.tier.as_deref(), Some("SILVER"));
    assert_eq!(rank.queue, "RANKED_FLEX_SR");
}

#[test]
fn unknown_player_on_platform_is_unranked() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(ids_key("americas", 0, 1, None), json!([]));

    let rank = fetch_rank_snapshot(&client(&fake), "americas", "na1", PUUID).unwrap();
    assert!(!rank.is_ranked());
    assert_eq!(rank.queue, "UNRANKED");
}

#[test]
fn malformed_ranked_payload_is_an_error() {
    let fake = Arc::new(FakeTransport::default());
    fake.ok(endpoints::league_by_puuid_url("na1", PUUID), json!({"entries": "nope"}));

    let err = fetch_rank_snapshot(&client(&fake), "americas", "na1", PUUID).unwrap_err();
    assert!(matches!(err, AppError::JsonError(_)));
}
