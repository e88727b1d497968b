use crate::api::models::MatchDto;
use chrono::{DateTime, Utc};
use std::fmt;

/// `(major, minor)` of a game version. Ordering is lexicographic on the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PatchVersion {
    pub major: u32,
    pub minor: u32,
}

impl PatchVersion {
    pub const UNKNOWN: PatchVersion = PatchVersion { major: 0, minor: 0 };

    pub const fn new(major: u32, minor: u32) -> Self {
        PatchVersion { major, minor }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

impl fmt::Display for PatchVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// `"15.4.512.99"` -> `15.4`. Anything without two leading numeric groups
/// maps to `0.0`.
pub fn parse_patch(version: &str) -> PatchVersion {
    let mut parts = version.trim().split('.');
    let major = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    let minor = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    match (major, minor) {
        (Some(major), Some(minor)) => PatchVersion::new(major, minor),
        _ => PatchVersion::UNKNOWN,
    }
}

/// Inclusive on both ends. An unknown version only matches the degenerate
/// `0.0..=0.0` window.
pub fn in_range(version: PatchVersion, lo: PatchVersion, hi: PatchVersion) -> bool {
    lo <= version && version <= hi
}

/// A named competitive sub-period, bounded by patches and optionally by
/// wall-clock time (used to narrow match-id listings upstream).
#[derive(Debug, Clone, PartialEq)]
pub struct SplitWindow {
    pub id: String,
    pub first: PatchVersion,
    pub last: PatchVersion,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl SplitWindow {
    pub fn contains(&self, patch: PatchVersion) -> bool {
        in_range(patch, self.first, self.last)
    }

    pub fn patch_range(&self) -> String {
        format!("{} - {}", self.first, self.last)
    }
}

pub fn find_split<'a>(splits: &'a [SplitWindow], id: &str) -> Option<&'a SplitWindow> {
    splits.iter().find(|s| s.id.eq_ignore_ascii_case(id))
}

pub fn filter_matches_by_split(matches: &[MatchDto], split: &SplitWindow) -> Vec<MatchDto> {
    matches
        .iter()
        .filter(|m| split.contains(m.patch()))
        .cloned()
        .collect()
}
