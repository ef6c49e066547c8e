use serde::{Serialize, Serializer};
use std::fmt;

/// Raw zone name that marks a sensor as moved out of service.
const EXCLUDED_ZONE: &str = "relocated";

/// Canonical zone label a raw sensor zone name resolves to.
///
/// Names that match no known zone are kept verbatim in [`CanonicalZone::Other`]
/// so their occupancy still reaches building totals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalZone {
    ZoneA,
    ZoneB,
    ZoneC,
    MainEntrance,
    Other(String),
}

/// Exact spellings seen in the sensor feeds, compared lowercased.
static ZONE_ALIASES: &[(&str, CanonicalZone)] = &[
    ("south-zone", CanonicalZone::ZoneA),
    ("south zone", CanonicalZone::ZoneA),
    ("zone a", CanonicalZone::ZoneA),
    ("zonea", CanonicalZone::ZoneA),
    ("central-zone", CanonicalZone::ZoneB),
    ("central zone", CanonicalZone::ZoneB),
    ("zone b", CanonicalZone::ZoneB),
    ("zoneb", CanonicalZone::ZoneB),
    ("north-zone", CanonicalZone::ZoneC),
    ("north zone", CanonicalZone::ZoneC),
    ("zone c", CanonicalZone::ZoneC),
    ("zonec", CanonicalZone::ZoneC),
    ("main-entrance", CanonicalZone::MainEntrance),
    ("mainentrance", CanonicalZone::MainEntrance),
];

/// Substring fallback, checked in order after the alias table.
static ZONE_KEYWORDS: &[(&str, CanonicalZone)] = &[
    ("south", CanonicalZone::ZoneA),
    ("central", CanonicalZone::ZoneB),
    ("north", CanonicalZone::ZoneC),
];

impl CanonicalZone {
    /// Label used as the zone key in aggregates and JSON output.
    pub fn label(&self) -> &str {
        match self {
            CanonicalZone::ZoneA => "ZoneA",
            CanonicalZone::ZoneB => "ZoneB",
            CanonicalZone::ZoneC => "ZoneC",
            CanonicalZone::MainEntrance => "MainEntrance",
            CanonicalZone::Other(raw) => raw.as_str(),
        }
    }

    /// `false` for pass-through names that matched no known zone.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, CanonicalZone::Other(_))
    }

    pub fn is_entrance(&self) -> bool {
        matches!(self, CanonicalZone::MainEntrance)
    }
}

impl fmt::Display for CanonicalZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for CanonicalZone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Returns `true` for zone names that must never reach an aggregate.
///
/// Callers filter on this before calling [`normalize`].
pub fn is_excluded(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case(EXCLUDED_ZONE)
}

/// Maps a raw, inconsistently spelled zone name to its canonical zone.
///
/// Matching is case-insensitive. The main entrance also ignores hyphens, so
/// `MAIN-ENTRANCE`, `Main-Entrance` and `mainentrance` are the same counter.
/// Unrecognized names come back unchanged as [`CanonicalZone::Other`].
pub fn normalize(raw: &str) -> CanonicalZone {
    let lowered = raw.trim().to_lowercase();

    if let Some((_, zone)) = ZONE_ALIASES.iter().find(|(alias, _)| *alias == lowered) {
        return zone.clone();
    }

    if lowered.replace('-', "") == "mainentrance" {
        return CanonicalZone::MainEntrance;
    }

    ZONE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(*keyword))
        .map(|(_, zone)| zone.clone())
        .unwrap_or_else(|| CanonicalZone::Other(raw.to_string()))
}
