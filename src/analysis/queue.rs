use crate::api::models::MatchDto;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueueBucket {
    Solo,
    Flex,
    Normal,
    Aram,
    Clash,
}

impl QueueBucket {
    pub const ALL: [QueueBucket; 5] = [
        QueueBucket::Solo,
        QueueBucket::Flex,
        QueueBucket::Normal,
        QueueBucket::Aram,
        QueueBucket::Clash,
    ];

    pub fn from_queue_id(queue_id: i32) -> Option<Self> {
        match queue_id {
            420 => Some(QueueBucket::Solo),
            440 => Some(QueueBucket::Flex),
            400 | 430 => Some(QueueBucket::Normal),
            450 => Some(QueueBucket::Aram),
            700 => Some(QueueBucket::Clash),
            _ => None,
        }
    }

    pub fn queue_ids(&self) -> &'static [i32] {
        match self {
            QueueBucket::Solo => &[420],
            QueueBucket::Flex => &[440],
            QueueBucket::Normal => &[400, 430],
            QueueBucket::Aram => &[450],
            QueueBucket::Clash => &[700],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueueBucket::Solo => "solo",
            QueueBucket::Flex => "flex",
            QueueBucket::Normal => "normal",
            QueueBucket::Aram => "aram",
            QueueBucket::Clash => "clash",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        Self::ALL.into_iter().find(|b| b.label() == label)
    }
}

impl fmt::Display for QueueBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Votes decay as `exp(-index / decay)` from the most recent match.
    pub decay: f64,
    /// Below this many solo+flex games the sample counts as unranked-heavy.
    pub ranked_floor: usize,
    /// Normals needed before the override kicks in.
    pub normal_override_min: usize,
    pub override_confidence: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            decay: 20.0,
            ranked_floor: 5,
            normal_override_min: 5,
            override_confidence: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueClassification {
    /// `None` when no match in the sample maps to a bucket.
    pub primary: Option<QueueBucket>,
    pub confidence: f64,
    pub weighted: BTreeMap<QueueBucket, f64>,
    pub dist: BTreeMap<QueueBucket, usize>,
}

impl QueueClassification {
    pub fn primary_label(&self) -> &'static str {
        self.primary.map(|b| b.label()).unwrap_or("unranked")
    }

    /// Confidence to two decimals, as reported to users.
    pub fn rounded_confidence(&self) -> f64 {
        (self.confidence * 100.0).round() / 100.0
    }

    pub fn count(&self, bucket: QueueBucket) -> usize {
        self.dist.get(&bucket).copied().unwrap_or(0)
    }

    /// "solo", "flex" or "unranked", whichever ranked queue saw more games.
    pub fn most_played_rank_type(&self) -> &'static str {
        let solo = self.count(QueueBucket::Solo);
        let flex = self.count(QueueBucket::Flex);
        match (solo, flex) {
            (0, 0) => "unranked",
            (s, f) if s >= f => "solo",
            _ => "flex",
        }
    }
}

/// `matches` must be ordered most recent first.
pub fn classify_primary_queue(matches: &[MatchDto], config: &QueueConfig) -> QueueClassification {
    // first-seen order so equal votes resolve to the more recent bucket
    let mut votes: Vec<(QueueBucket, f64)> = Vec::new();
    let mut dist: BTreeMap<QueueBucket, usize> = BTreeMap::new();

    for (i, m) in matches.iter().enumerate() {
        let Some(bucket) = QueueBucket::from_queue_id(m.info.queue_id) else {
            continue;
        };
        let weight = (-(i as f64) / config.decay).exp();
        match votes.iter_mut().find(|(b, _)| *b == bucket) {
            Some((_, w)) => *w += weight,
            None => votes.push((bucket, weight)),
        }
        *dist.entry(bucket).or_insert(0) += 1;
    }

    if votes.is_empty() {
        return QueueClassification {
            primary: None,
            confidence: 0.0,
            weighted: BTreeMap::new(),
            dist,
        };
    }

    let mut ranked = votes.clone();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let (mut primary, top) = ranked[0];
    let second = ranked.get(1).map(|(_, w)| *w).unwrap_or(0.0);
    let total: f64 = ranked.iter().map(|(_, w)| w).sum();
    let mut confidence = (2.0 * (top - second) / total.max(1e-6)).clamp(0.0, 1.0);

    let ranked_games = dist.get(&QueueBucket::Solo).unwrap_or(&0) + dist.get(&QueueBucket::Flex).unwrap_or(&0);
    let normal_games = dist.get(&QueueBucket::Normal).copied().unwrap_or(0);
    if ranked_games < config.ranked_floor && normal_games >= config.normal_override_min {
        primary = QueueBucket::Normal;
        confidence = confidence.max(config.override_confidence);
    }

    QueueClassification {
        primary: Some(primary),
        confidence,
        weighted: votes.into_iter().collect(),
        dist,
    }
}

pub fn filter_matches_by_bucket(matches: &[MatchDto], bucket: QueueBucket) -> Vec<MatchDto> {
    matches
        .iter()
        .filter(|m| QueueBucket::from_queue_id(m.info.queue_id) == Some(bucket))
        .cloned()
        .collect()
}
