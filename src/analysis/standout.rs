use super::role::Role;
use super::scoring::ChampionRow;

#[derive(Debug, Clone, PartialEq)]
pub struct StandoutMetric {
    pub label: &'static str,
    pub value: f64,
    pub context: &'static str,
    pub icon: &'static str,
}

/// Headline number for a champion, picked by role: vision for supports,
/// farm for junglers, CS for everyone else.
pub fn pick_standout_metric(best: Option<&ChampionRow>) -> Option<StandoutMetric> {
    let best = best?;
    let (label, value, icon) = match best.role {
        Role::Support => ("Vision Score / min", best.vision_per_min, "vision"),
        Role::Jungle => ("Farm / min", best.cs_per_min, "jungle"),
        _ => ("CS / min", best.cs_per_min, "cs"),
    };
    Some(StandoutMetric {
        label,
        value,
        context: "above_average",
        icon,
    })
}
