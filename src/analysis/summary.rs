use super::champion_stats::{aggregate_champions, ChampionAggregate};
use super::queue::{classify_primary_queue, filter_matches_by_bucket, QueueConfig};
use super::role::Role;
use super::scoring::{best_champion, champion_table, ChampionRow, ScoringConfig};
use super::standout::{pick_standout_metric, StandoutMetric};
use crate::api::models::{LeagueEntryDto, MatchDto};
use crate::ingest::patch::{filter_matches_by_split, SplitWindow};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct OverallMetrics {
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub kda: f64,
    pub cs_per_min: f64,
    pub vision_per_min: f64,
    pub kill_participation: f64,
    pub damage_share: f64,
    pub primary_role: Role,
}

impl From<&ChampionAggregate> for OverallMetrics {
    fn from(all: &ChampionAggregate) -> Self {
        OverallMetrics {
            games: all.games,
            wins: all.wins,
            win_rate: all.win_rate(),
            kda: all.kda(),
            cs_per_min: all.cs_per_min(),
            vision_per_min: all.vision_per_min(),
            kill_participation: all.avg_kill_participation(),
            damage_share: all.avg_damage_share(),
            primary_role: all.role(),
        }
    }
}

/// `None` when the player appears in none of the matches.
pub fn aggregate_overall_metrics(matches: &[MatchDto], puuid: &str) -> Option<OverallMetrics> {
    let tracker = aggregate_champions(matches, puuid);
    let overall = tracker.overall();
    (overall.games > 0).then(|| OverallMetrics::from(overall))
}

/// One game's line for the player.
#[derive(Debug, Clone, PartialEq)]
pub struct GameLine {
    pub match_id: String,
    pub champion: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
}

impl GameLine {
    pub fn kda(&self) -> f64 {
        (self.kills + self.assists) as f64 / self.deaths.max(1) as f64
    }

    pub fn score_line(&self) -> String {
        format!("{}/{}/{}", self.kills, self.deaths, self.assists)
    }
}

fn game_lines<'a>(matches: &'a [MatchDto], puuid: &'a str) -> impl Iterator<Item = GameLine> + 'a {
    matches.iter().filter_map(move |m| {
        m.participant(puuid).map(|p| GameLine {
            match_id: m.match_id().to_string(),
            champion: p.champion_name.clone(),
            kills: p.kills,
            deaths: p.deaths,
            assists: p.assists,
        })
    })
}

/// Highest KDA, then most kills; the earliest such game on ties.
pub fn best_game(matches: &[MatchDto], puuid: &str) -> Option<GameLine> {
    let mut best: Option<GameLine> = None;
    for line in game_lines(matches, puuid) {
        let better = match &best {
            None => true,
            Some(b) => match line.kda().partial_cmp(&b.kda()) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => line.kills > b.kills,
                _ => false,
            },
        };
        if better {
            best = Some(line);
        }
    }
    best
}

/// The game with the most deaths.
pub fn fun_stat(matches: &[MatchDto], puuid: &str) -> Option<GameLine> {
    let mut worst: Option<GameLine> = None;
    for line in game_lines(matches, puuid) {
        if worst.as_ref().map_or(true, |w| line.deaths > w.deaths) {
            worst = Some(line);
        }
    }
    worst
}

pub const SOLO_QUEUE_TYPE: &str = "RANKED_SOLO_5x5";
pub const FLEX_QUEUE_TYPE: &str = "RANKED_FLEX_SR";

const TIERS: [&str; 10] = [
    "IRON",
    "BRONZE",
    "SILVER",
    "GOLD",
    "PLATINUM",
    "EMERALD",
    "DIAMOND",
    "MASTER",
    "GRANDMASTER",
    "CHALLENGER",
];
const DIVISIONS: [&str; 4] = ["IV", "III", "II", "I"];

fn rank_key(entry: &LeagueEntryDto) -> (i32, i32, i32) {
    let position = |table: &[&str], value: &str| {
        let value = value.to_uppercase();
        table.iter().position(|t| *t == value).map(|i| i as i32).unwrap_or(-1)
    };
    (
        position(&TIERS[..], &entry.tier),
        position(&DIVISIONS[..], &entry.rank),
        entry.league_points,
    )
}

/// Solo queue entries take precedence over flex; within a queue the highest
/// tier, division and LP wins.
pub fn pick_rank_entry(entries: &[LeagueEntryDto]) -> Option<&LeagueEntryDto> {
    best_in_queue(entries, SOLO_QUEUE_TYPE).or_else(|| best_in_queue(entries, FLEX_QUEUE_TYPE))
}

fn best_in_queue<'a>(entries: &'a [LeagueEntryDto], queue: &str) -> Option<&'a LeagueEntryDto> {
    entries
        .iter()
        .filter(|e| e.queue_type == queue)
        .max_by_key(|e| rank_key(e))
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankSnapshot {
    pub queue: String,
    pub tier: Option<String>,
    pub division: Option<String>,
    pub lp: i32,
    pub wins: i32,
    pub losses: i32,
}

impl Default for RankSnapshot {
    fn default() -> Self {
        RankSnapshot {
            queue: "UNRANKED".to_string(),
            tier: None,
            division: None,
            lp: 0,
            wins: 0,
            losses: 0,
        }
    }
}

impl RankSnapshot {
    pub fn from_entries(entries: &[LeagueEntryDto]) -> Self {
        match pick_rank_entry(entries) {
            Some(e) => RankSnapshot {
                queue: e.queue_type.clone(),
                tier: Some(e.tier.clone()).filter(|t| !t.is_empty()),
                division: Some(e.rank.clone()).filter(|d| !d.is_empty()),
                lp: e.league_points,
                wins: e.wins,
                losses: e.losses,
            },
            None => RankSnapshot::default(),
        }
    }

    pub fn is_ranked(&self) -> bool {
        self.tier.is_some()
    }
}

/// Everything needed to present one period (a split or the whole year).
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary {
    pub primary_queue: String,
    /// Two decimals.
    pub queue_confidence: f64,
    pub games_analyzed: usize,
    pub overall: Option<OverallMetrics>,
    pub best: Option<ChampionRow>,
    /// Up to `top_n` other champions, best first.
    pub top_champions: Vec<ChampionRow>,
    /// The full table the two fields above are drawn from.
    pub champions: Vec<ChampionRow>,
    pub standout: Option<StandoutMetric>,
    pub best_game: Option<GameLine>,
    pub fun_stat: Option<GameLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitSummary {
    pub split_id: String,
    pub patch_range: String,
    pub period: PeriodSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearSummary {
    pub splits: Vec<SplitSummary>,
    pub year: PeriodSummary,
}

pub struct Summarizer {
    pub queue: QueueConfig,
    pub scoring: ScoringConfig,
    pub top_n: usize,
}

impl Default for Summarizer {
    fn default() -> Self {
        Summarizer {
            queue: QueueConfig::default(),
            scoring: ScoringConfig::default(),
            top_n: 3,
        }
    }
}

impl Summarizer {
    /// Classifies the sample, narrows it to the primary queue and scores the
    /// champions played there. An unranked sample is scored whole.
    pub fn summarize(&self, matches: &[MatchDto], puuid: &str) -> PeriodSummary {
        let queue = classify_primary_queue(matches, &self.queue);
        let bucket_matches = match queue.primary {
            Some(bucket) => filter_matches_by_bucket(matches, bucket),
            None => matches.to_vec(),
        };

        let table = champion_table(&bucket_matches, puuid, &self.scoring);
        let best = best_champion(&bucket_matches, puuid, &self.scoring);
        let best_name = best.as_ref().map(|b| b.name.clone());
        let top_champions = table
            .iter()
            .filter(|row| Some(&row.name) != best_name.as_ref())
            .take(self.top_n)
            .cloned()
            .collect();

        PeriodSummary {
            primary_queue: queue.primary_label().to_string(),
            queue_confidence: queue.rounded_confidence(),
            games_analyzed: bucket_matches.len(),
            overall: aggregate_overall_metrics(&bucket_matches, puuid),
            standout: pick_standout_metric(best.as_ref()),
            best,
            top_champions,
            champions: table,
            best_game: best_game(&bucket_matches, puuid),
            fun_stat: fun_stat(&bucket_matches, puuid),
        }
    }

    pub fn summarize_split(&self, matches: &[MatchDto], puuid: &str, split: &SplitWindow) -> SplitSummary {
        let in_split = filter_matches_by_split(matches, split);
        SplitSummary {
            split_id: split.id.clone(),
            patch_range: split.patch_range(),
            period: self.summarize(&in_split, puuid),
        }
    }

    pub fn summarize_year(&self, matches: &[MatchDto], puuid: &str, splits: &[SplitWindow]) -> YearSummary {
        YearSummary {
            splits: splits
                .iter()
                .map(|s| self.summarize_split(matches, puuid, s))
                .collect(),
            year: self.summarize(matches, puuid),
        }
    }
}
