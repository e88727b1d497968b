use crate::api::models::{MatchDto, ParticipantDto};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Adc,
    Support,
    #[default]
    Unknown,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Top => "top",
            Role::Jungle => "jungle",
            Role::Mid => "mid",
            Role::Adc => "adc",
            Role::Support => "support",
            Role::Unknown => "unknown",
        }
    }

    /// Label for one appearance: the assigned team position when present,
    /// otherwise the legacy lane/role pair.
    pub fn of(participant: &ParticipantDto) -> Role {
        match participant.team_position.to_uppercase().as_str() {
            "TOP" => return Role::Top,
            "JUNGLE" => return Role::Jungle,
            "MIDDLE" => return Role::Mid,
            "BOTTOM" => return Role::Adc,
            "UTILITY" => return Role::Support,
            _ => {}
        }

        match participant.lane.to_uppercase().as_str() {
            "TOP" => Role::Top,
            "MIDDLE" => Role::Mid,
            "JUNGLE" => Role::Jungle,
            "BOTTOM" => match participant.role.to_uppercase().as_str() {
                "CARRY" | "DUO_CARRY" => Role::Adc,
                _ => Role::Support,
            },
            _ => Role::Unknown,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-label counts kept in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleTally {
    counts: Vec<(Role, usize)>,
}

impl RoleTally {
    pub fn record(&mut self, role: Role) {
        match self.counts.iter_mut().find(|(r, _)| *r == role) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((role, 1)),
        }
    }

    pub fn count(&self, role: Role) -> usize {
        self.counts
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Most frequent label; equal counts go to whichever was seen first.
    /// An empty tally is `Unknown`.
    pub fn majority(&self) -> Role {
        let mut best: Option<(Role, usize)> = None;
        for &(role, n) in &self.counts {
            if best.map_or(true, |(_, top)| n > top) {
                best = Some((role, n));
            }
        }
        best.map(|(role, _)| role).unwrap_or_default()
    }
}

pub fn majority_role<I: IntoIterator<Item = Role>>(roles: I) -> Role {
    let mut tally = RoleTally::default();
    for role in roles {
        tally.record(role);
    }
    tally.majority()
}

/// Majority role over the player's games on one champion.
pub fn majority_role_for_champion(matches: &[MatchDto], puuid: &str, champion: &str) -> Role {
    majority_role(
        matches
            .iter()
            .filter_map(|m| m.participant(puuid))
            .filter(|p| p.champion_name == champion)
            .map(Role::of),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(position: &str, lane: &str, role: &str) -> ParticipantDto {
        ParticipantDto {
            team_position: position.to_string(),
            lane: lane.to_string(),
            role: role.to_string(),
            ..ParticipantDto::default()
        }
    }

    #[test]
    fn team_position_wins_over_lane() {
        assert_eq!(Role::of(&player("UTILITY", "BOTTOM", "CARRY")), Role::Support);
        assert_eq!(Role::of(&player("MIDDLE", "", "")), Role::Mid);
        assert_eq!(Role::of(&player("BOTTOM", "", "")), Role::Adc);
    }

    #[test]
    fn lane_fallback() {
        assert_eq!(Role::of(&player("", "BOTTOM", "DUO_CARRY")), Role::Adc);
        assert_eq!(Role::of(&player("", "BOTTOM", "DUO_SUPPORT")), Role::Support);
        assert_eq!(Role::of(&player("", "jungle", "NONE")), Role::Jungle);
        assert_eq!(Role::of(&player("", "NONE", "")), Role::Unknown);
    }

    #[test]
    fn majority_ignores_minority_labels() {
        let roles = [Role::Top, Role::Unknown, Role::Top, Role::Top];
        assert_eq!(majority_role(roles), Role::Top);
    }

    #[test]
    fn tie_goes_to_first_seen() {
        assert_eq!(majority_role([Role::Mid, Role::Top, Role::Top, Role::Mid]), Role::Mid);
        assert_eq!(majority_role([Role::Unknown, Role::Jungle]), Role::Unknown);
        assert_eq!(majority_role(std::iter::empty()), Role::Unknown);
    }

    #[test]
    fn per_champion_majority() {
        use crate::api::models::MatchInfo;

        let game = |champ: &str, position: &str| MatchDto {
            info: MatchInfo {
                participants: vec![ParticipantDto {
                    puuid: "me".into(),
                    champion_name: champ.into(),
                    team_position: position.into(),
                    ..ParticipantDto::default()
                }],
                ..MatchInfo::default()
            },
            ..MatchDto::default()
        };
        let matches = vec![
            game("Ahri", "MIDDLE"),
            game("Ahri", "TOP"),
            game("Garen", "TOP"),
            game("Ahri", "MIDDLE"),
        ];
        assert_eq!(majority_role_for_champion(&matches, "me", "Ahri"), Role::Mid);
        assert_eq!(majority_role_for_champion(&matches, "me", "Garen"), Role::Top);
        assert_eq!(majority_role_for_champion(&matches, "me", "Lux"), Role::Unknown);
    }
}
