use super::champion_stats::{aggregate_champions, ChampionAggregate};
use super::role::Role;
use crate::api::models::MatchDto;

/// A metric is scored as `min(value / target, cap)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricTarget {
    pub target: f64,
    pub cap: f64,
}

impl MetricTarget {
    pub const fn new(target: f64, cap: f64) -> Self {
        MetricTarget { target, cap }
    }

    pub fn ratio(&self, value: f64) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        (value / self.target).clamp(0.0, self.cap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleWeights {
    pub kda: f64,
    pub cs_per_min: f64,
    pub kill_participation: f64,
    pub vision_per_min: f64,
    pub damage_share: f64,
}

impl RoleWeights {
    const fn new(kda: f64, cs_per_min: f64, kill_participation: f64, vision_per_min: f64, damage_share: f64) -> Self {
        RoleWeights {
            kda,
            cs_per_min,
            kill_participation,
            vision_per_min,
            damage_share,
        }
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Top | Role::Mid | Role::Adc => RoleWeights::new(0.30, 0.25, 0.10, 0.05, 0.30),
            Role::Jungle => RoleWeights::new(0.25, 0.10, 0.40, 0.10, 0.15),
            Role::Support => RoleWeights::new(0.20, 0.00, 0.30, 0.40, 0.10),
            Role::Unknown => RoleWeights::new(0.25, 0.20, 0.20, 0.15, 0.20),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// One-sided z for the win-rate lower bound (1.645 ≈ 95%).
    pub z: f64,
    pub min_games: usize,
    pub weight_win_rate: f64,
    pub weight_secondary: f64,
    /// Sample size at which the stability dampener is ~95% open.
    pub reference_games: f64,
    pub volume_factor: f64,
    pub volume_cap: f64,
    pub kda: MetricTarget,
    pub cs_per_min: MetricTarget,
    pub kill_participation: MetricTarget,
    pub vision_per_min: MetricTarget,
    pub damage_share: MetricTarget,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            z: 1.645,
            min_games: 15,
            weight_win_rate: 0.6,
            weight_secondary: 0.4,
            reference_games: 20.0,
            volume_factor: 0.25,
            volume_cap: 0.10,
            kda: MetricTarget::new(3.0, 2.0),
            cs_per_min: MetricTarget::new(7.0, 1.5),
            kill_participation: MetricTarget::new(0.55, 1.5),
            vision_per_min: MetricTarget::new(1.0, 2.0),
            damage_share: MetricTarget::new(0.25, 1.6),
        }
    }
}

/// One scored line of the champion table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChampionRow {
    pub name: String,
    pub role: Role,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub win_rate_lower_bound: f64,
    pub kda: f64,
    pub cs_per_min: f64,
    pub vision_per_min: f64,
    pub kill_participation: f64,
    pub damage_share: f64,
    pub score: f64,
}

/// Lower end of the one-sided Wilson score interval for `wins / games`.
pub fn wilson_lower_bound(wins: usize, games: usize, z: f64) -> f64 {
    if games == 0 {
        return 0.0;
    }
    let n = games as f64;
    let p = wins as f64 / n;
    let z2 = z * z;
    let centre = p + z2 / (2.0 * n);
    let spread = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
    ((centre - spread) / (1.0 + z2 / n)).max(0.0)
}

pub struct ChampionScorer {
    config: ScoringConfig,
}

impl ChampionScorer {
    pub fn new(config: ScoringConfig) -> Self {
        ChampionScorer { config }
    }

    /// Score = dampened composite of win-rate lower bound and role-weighted
    /// secondary ratios, plus a capped bonus for share of the sample.
    pub fn calculate_score(&self, stats: &ChampionAggregate, total_games: usize) -> f64 {
        let c = &self.config;
        let weights = RoleWeights::for_role(stats.role());

        let lower_bound = wilson_lower_bound(stats.wins, stats.games, c.z);
        let secondary = weights.kda * c.kda.ratio(stats.kda())
            + weights.cs_per_min * c.cs_per_min.ratio(stats.cs_per_min())
            + weights.kill_participation * c.kill_participation.ratio(stats.avg_kill_participation())
            + weights.vision_per_min * c.vision_per_min.ratio(stats.vision_per_min())
            + weights.damage_share * c.damage_share.ratio(stats.avg_damage_share());

        let composite = c.weight_win_rate * lower_bound + c.weight_secondary * secondary;
        let dampener = 1.0 - (-3.0 * stats.games as f64 / c.reference_games.max(1.0)).exp();
        let volume = (c.volume_factor * stats.frequency(total_games)).min(c.volume_cap);

        composite * dampener + volume
    }

    pub fn score(&self, stats: &ChampionAggregate, total_games: usize) -> ChampionRow {
        ChampionRow {
            name: stats.name.clone(),
            role: stats.role(),
            games: stats.games,
            wins: stats.wins,
            win_rate: stats.win_rate(),
            win_rate_lower_bound: wilson_lower_bound(stats.wins, stats.games, self.config.z),
            kda: stats.kda(),
            cs_per_min: stats.cs_per_min(),
            vision_per_min: stats.vision_per_min(),
            kill_participation: stats.avg_kill_participation(),
            damage_share: stats.avg_damage_share(),
            score: self.calculate_score(stats, total_games),
        }
    }

    /// Rows by descending score; equal scores keep the input order.
    pub fn rank(&self, stats: &[ChampionAggregate]) -> Vec<ChampionRow> {
        let total_games: usize = stats.iter().map(|s| s.games).sum();
        let mut rows: Vec<ChampionRow> = stats.iter().map(|s| self.score(s, total_games)).collect();
        rows.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        rows
    }
}

/// Every champion the player used in `matches`, best first. No games floor.
pub fn champion_table(matches: &[MatchDto], puuid: &str, config: &ScoringConfig) -> Vec<ChampionRow> {
    let tracker = aggregate_champions(matches, puuid);
    ChampionScorer::new(config.clone()).rank(tracker.get_stats())
}

/// Top-scoring champion among those with at least `min_games` games.
pub fn best_champion(matches: &[MatchDto], puuid: &str, config: &ScoringConfig) -> Option<ChampionRow> {
    champion_table(matches, puuid, config)
        .into_iter()
        .find(|row| row.games >= config.min_games)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::champion_stats::fixtures::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wilson_bound_shrinks_small_samples() {
        let small = wilson_lower_bound(3, 3, 1.645);
        let large = wilson_lower_bound(13, 20, 1.645);
        assert!(small < 1.0);
        assert!((large - 0.4666).abs() < 1e-3, "{}", large);
        assert_eq!(wilson_lower_bound(0, 0, 1.645), 0.0);
        assert!(wilson_lower_bound(60, 100, 1.645) > wilson_lower_bound(6, 10, 1.645));
    }

    #[test]
    fn ratio_is_capped() {
        let kda = MetricTarget::new(3.0, 2.0);
        assert_eq!(kda.ratio(1.5), 0.5);
        assert_eq!(kda.ratio(30.0), 2.0);
        assert_eq!(MetricTarget::new(0.0, 2.0).ratio(5.0), 0.0);
    }

    #[test]
    fn games_floor_excludes_one_off_champions() {
        let mut matches = record("Ahri", "MIDDLE", 20, 13);
        matches.extend(record("Zed", "MIDDLE", 3, 3));
        let config = ScoringConfig::default();

        let best = best_champion(&matches, ME, &config).unwrap();
        assert_eq!(best.name, "Ahri");
        assert_eq!(best.games, 20);
        assert!((best.win_rate - 0.65).abs() < 1e-9);

        let table = champion_table(&matches, ME, &config);
        assert_eq!(table.len(), 2);
        assert!(table.iter().any(|r| r.name == "Zed"));
    }

    #[test]
    fn nothing_qualifies_is_none() {
        let matches = record("Zed", "MIDDLE", 3, 3);
        assert!(best_champion(&matches, ME, &ScoringConfig::default()).is_none());
        assert!(best_champion(&[], ME, &ScoringConfig::default()).is_none());
        assert!(champion_table(&[], ME, &ScoringConfig::default()).is_empty());
    }

    #[test]
    fn scoring_is_idempotent() {
        let mut matches = record("Ahri", "MIDDLE", 16, 9);
        matches.extend(record("Lux", "UTILITY", 17, 10));
        let config = ScoringConfig::default();
        assert_eq!(champion_table(&matches, ME, &config), champion_table(&matches, ME, &config));
        assert_eq!(best_champion(&matches, ME, &config), best_champion(&matches, ME, &config));
    }

    #[test]
    fn support_score_ignores_farm() {
        let scorer = ChampionScorer::new(ScoringConfig::default());
        let base = aggregate_champions(&record("Lulu", "UTILITY", 10, 5), ME).into_stats().remove(0);
        let mut farmed = base.clone();
        farmed.cs *= 4;
        assert_eq!(scorer.calculate_score(&base, 10), scorer.calculate_score(&farmed, 10));

        let mut laner = base.clone();
        laner.roles = Default::default();
        laner.roles.record(Role::Mid);
        let mut laner_farmed = laner.clone();
        laner_farmed.cs *= 4;
        assert!(scorer.calculate_score(&laner_farmed, 10) > scorer.calculate_score(&laner, 10));
    }

    #[test]
    fn volume_bonus_is_capped() {
        let scorer = ChampionScorer::new(ScoringConfig::default());
        let stats = aggregate_champions(&record("Ahri", "MIDDLE", 10, 5), ME).into_stats().remove(0);
        // the whole sample: 0.25 * 1.0 capped at 0.10
        let alone = scorer.calculate_score(&stats, 10);
        // a quarter of the sample: 0.25 * 0.25
        let shared = scorer.calculate_score(&stats, 40);
        assert!((alone - shared - (0.10 - 0.0625)).abs() < 1e-9);
    }

    #[test]
    fn equal_scores_keep_first_seen_order() {
        let mut matches = record("Garen", "TOP", 5, 3);
        matches.extend(record("Darius", "TOP", 5, 3));
        let table = champion_table(&matches, ME, &ScoringConfig::default());
        assert_eq!(table[0].score, table[1].score);
        assert_eq!(table[0].name, "Garen");
        assert_eq!(table[1].name, "Darius");
    }
}
