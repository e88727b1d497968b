use crate::ingest::patch::{parse_patch, PatchVersion};
use serde::{Deserialize, Serialize};

// Account V1 response
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub tag_line: String,
}

// Summoner V4 response
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub puuid: String,
    #[serde(default)]
    pub summoner_level: i64,
    #[serde(default)]
    pub profile_icon_id: i32,
    #[serde(default)]
    pub revision_date: i64,
}

// League V4 response
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntryDto {
    #[serde(default)]
    pub summoner_id: Option<String>,
    #[serde(default)]
    pub queue_type: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub league_points: i32,
    #[serde(default)]
    pub wins: i32,
    #[serde(default)]
    pub losses: i32,
}

// Match V5 response
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MatchDto {
    #[serde(default)]
    pub metadata: MatchMetadata,
    #[serde(default)]
    pub info: MatchInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    #[serde(default)]
    pub match_id: String,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    #[serde(default = "unknown_queue")]
    pub queue_id: i32,
    #[serde(default)]
    pub game_version: String,
    #[serde(default)]
    pub game_duration: i64,
    #[serde(default)]
    pub game_creation: i64,
    #[serde(default)]
    pub game_mode: String,
    #[serde(default)]
    pub participants: Vec<ParticipantDto>,
}

fn unknown_queue() -> i32 {
    -1
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    #[serde(default)]
    pub puuid: String,
    #[serde(default)]
    pub summoner_id: Option<String>,
    #[serde(default = "unknown_champion")]
    pub champion_name: String,
    #[serde(default)]
    pub team_id: i32,
    #[serde(default)]
    pub win: bool,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub team_position: String, // TOP, JUNGLE, MIDDLE, BOTTOM, UTILITY
    #[serde(default)]
    pub lane: String,
    #[serde(default)]
    pub role: String, // SOLO, NONE, CARRY, SUPPORT, DUO_CARRY, DUO_SUPPORT
    #[serde(default)]
    pub total_minions_killed: u32,
    #[serde(default)]
    pub neutral_minions_killed: u32,
    #[serde(default)]
    pub vision_score: u32,
    #[serde(default)]
    pub total_damage_dealt_to_champions: u64,
    #[serde(default)]
    pub time_played: Option<u64>,
}

fn unknown_champion() -> String {
    "Unknown".to_string()
}

impl MatchDto {
    pub fn match_id(&self) -> &str {
        &self.metadata.match_id
    }

    pub fn patch(&self) -> PatchVersion {
        parse_patch(&self.info.game_version)
    }

    pub fn participant(&self, puuid: &str) -> Option<&ParticipantDto> {
        self.info.participants.iter().find(|p| p.puuid == puuid)
    }

    pub fn team_kills(&self, team_id: i32) -> u32 {
        self.teammates(team_id).map(|p| p.kills).sum()
    }

    pub fn team_damage(&self, team_id: i32) -> u64 {
        self.teammates(team_id)
            .map(|p| p.total_damage_dealt_to_champions)
            .sum()
    }

    fn teammates(&self, team_id: i32) -> impl Iterator<Item = &ParticipantDto> {
        self.info
            .participants
            .iter()
            .filter(move |p| p.team_id == team_id)
    }
}

impl ParticipantDto {
    pub fn cs(&self) -> u32 {
        self.total_minions_killed + self.neutral_minions_killed
    }

    /// Seconds on the map, falling back to the game length when the
    /// participant record omits it.
    pub fn seconds_played(&self, game_duration: i64) -> u64 {
        self.time_played
            .unwrap_or_else(|| game_duration.max(0) as u64)
    }
}
