use super::role::{Role, RoleTally};
use crate::api::models::MatchDto;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChampionAggregate {
    pub name: String,
    pub games: usize,
    pub wins: usize,
    pub kills: u64,
    pub deaths: u64,
    pub assists: u64,
    pub time_played_sec: u64,
    pub cs: u64,
    pub vision_score: u64,
    pub kill_participation_sum: f64,
    pub damage_share_sum: f64,
    pub roles: RoleTally,
}

impl ChampionAggregate {
    pub fn new(name: String) -> Self {
        ChampionAggregate {
            name,
            ..ChampionAggregate::default()
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }

    /// Share of the sample, `0.0..=1.0`.
    pub fn frequency(&self, total_games: usize) -> f64 {
        if total_games == 0 {
            0.0
        } else {
            self.games as f64 / total_games as f64
        }
    }

    pub fn kda(&self) -> f64 {
        (self.kills + self.assists) as f64 / self.deaths.max(1) as f64
    }

    /// Never below one minute, so very short samples don't explode rates.
    pub fn minutes(&self) -> f64 {
        (self.time_played_sec as f64 / 60.0).max(1.0)
    }

    pub fn cs_per_min(&self) -> f64 {
        self.cs as f64 / self.minutes()
    }

    pub fn vision_per_min(&self) -> f64 {
        self.vision_score as f64 / self.minutes()
    }

    pub fn avg_kill_participation(&self) -> f64 {
        self.average(self.kill_participation_sum)
    }

    pub fn avg_damage_share(&self) -> f64 {
        self.average(self.damage_share_sum)
    }

    pub fn role(&self) -> Role {
        self.roles.majority()
    }

    fn absorb(&mut self, a: &Appearance) {
        self.games += 1;
        if a.win {
            self.wins += 1;
        }
        self.kills += a.kills;
        self.deaths += a.deaths;
        self.assists += a.assists;
        self.time_played_sec += a.seconds;
        self.cs += a.cs;
        self.vision_score += a.vision;
        self.kill_participation_sum += a.kill_participation;
        self.damage_share_sum += a.damage_share;
        self.roles.record(a.role);
    }

    fn average(&self, sum: f64) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            sum / self.games as f64
        }
    }
}

struct Appearance {
    win: bool,
    kills: u64,
    deaths: u64,
    assists: u64,
    seconds: u64,
    cs: u64,
    vision: u64,
    kill_participation: f64,
    damage_share: f64,
    role: Role,
}

/// Accumulates one aggregate per champion, remembering the order champions
/// were first seen in.
#[derive(Debug, Default)]
pub struct ChampionStatsTracker {
    order: Vec<ChampionAggregate>,
    index: HashMap<String, usize>,
    overall: ChampionAggregate,
    skipped: usize,
}

impl ChampionStatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one match in. A match without the player is skipped and counted.
    pub fn add_match(&mut self, m: &MatchDto, puuid: &str) {
        let Some(you) = m.participant(puuid) else {
            warn!(match_id = m.match_id(), "player missing from match, skipping");
            self.skipped += 1;
            return;
        };

        let team_kills = m.team_kills(you.team_id);
        let team_damage = m.team_damage(you.team_id);
        let kill_participation = if team_kills == 0 {
            0.0
        } else {
            (you.kills + you.assists) as f64 / team_kills as f64
        };
        let damage_share = if team_damage == 0 {
            0.0
        } else {
            you.total_damage_dealt_to_champions as f64 / team_damage as f64
        };

        let slot = match self.index.get(&you.champion_name) {
            Some(&i) => i,
            None => {
                self.index.insert(you.champion_name.clone(), self.order.len());
                self.order.push(ChampionAggregate::new(you.champion_name.clone()));
                self.order.len() - 1
            }
        };
        let appearance = Appearance {
            win: you.win,
            kills: you.kills as u64,
            deaths: you.deaths as u64,
            assists: you.assists as u64,
            seconds: you.seconds_played(m.info.game_duration),
            cs: you.cs() as u64,
            vision: you.vision_score as u64,
            kill_participation,
            damage_share,
            role: Role::of(you),
        };
        self.order[slot].absorb(&appearance);
        self.overall.absorb(&appearance);
    }

    pub fn get_stats(&self) -> &[ChampionAggregate] {
        &self.order
    }

    pub fn get_champion(&self, name: &str) -> Option<&ChampionAggregate> {
        self.index.get(name).map(|&i| &self.order[i])
    }

    /// Games actually counted across all champions.
    pub fn total_games(&self) -> usize {
        self.order.iter().map(|a| a.games).sum()
    }

    /// Every counted game folded into one aggregate.
    pub fn overall(&self) -> &ChampionAggregate {
        &self.overall
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_stats(self) -> Vec<ChampionAggregate> {
        self.order
    }
}

pub fn aggregate_champions(matches: &[MatchDto], puuid: &str) -> ChampionStatsTracker {
    let mut tracker = ChampionStatsTracker::new();
    for m in matches {
        tracker.add_match(m, puuid);
    }
    tracker
}
