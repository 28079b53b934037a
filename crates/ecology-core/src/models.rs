use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EcologyError;
use crate::normalize::parse_cr_text;

/// Placeholder used for a missing creature type.
pub const UNKNOWN_KIND: &str = "Unknown";

/// A raw monster record as delivered by the paginated source.
///
/// Any key may be absent, null, or carry an unexpected shape; the
/// normalizers in [`crate::normalize`] decide what to make of it.
pub type RawRecord = serde_json::Value;

// ── SpeedProfile ──────────────────────────────────────────────────────────────

/// Movement speeds in feet per round, one channel per movement mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedProfile {
    pub walk: u32,
    pub fly: u32,
    pub swim: u32,
    pub burrow: u32,
    pub climb: u32,
}

/// A movement mode recognised by the speed parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementMode {
    Walk,
    Fly,
    Swim,
    Burrow,
    Climb,
}

impl MovementMode {
    /// Modes that distinguish habitats; walking is near-universal.
    pub const ADAPTATIONS: [MovementMode; 4] = [
        MovementMode::Fly,
        MovementMode::Swim,
        MovementMode::Burrow,
        MovementMode::Climb,
    ];

    /// Match a lowercase keyword such as `"fly"`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "walk" => Some(Self::Walk),
            "fly" => Some(Self::Fly),
            "swim" => Some(Self::Swim),
            "burrow" => Some(Self::Burrow),
            "climb" => Some(Self::Climb),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Walk => "Walk",
            Self::Fly => "Fly",
            Self::Swim => "Swim",
            Self::Burrow => "Burrow",
            Self::Climb => "Climb",
        }
    }
}

impl SpeedProfile {
    pub fn get(&self, mode: MovementMode) -> u32 {
        match mode {
            MovementMode::Walk => self.walk,
            MovementMode::Fly => self.fly,
            MovementMode::Swim => self.swim,
            MovementMode::Burrow => self.burrow,
            MovementMode::Climb => self.climb,
        }
    }

    pub fn set(&mut self, mode: MovementMode, value: u32) {
        match mode {
            MovementMode::Walk => self.walk = value,
            MovementMode::Fly => self.fly = value,
            MovementMode::Swim => self.swim = value,
            MovementMode::Burrow => self.burrow = value,
            MovementMode::Climb => self.climb = value,
        }
    }
}

// ── CanonicalRow ──────────────────────────────────────────────────────────────

/// One normalized monster. Every field is always populated; missing source
/// data is represented by the documented default, never by a partial row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRow {
    pub name: String,
    /// Creature type (`"Unknown"` when the source omits it).
    pub kind: String,
    pub size: String,
    /// Habitats in source order, trimmed, blanks removed.
    pub environment: Vec<String>,
    /// Challenge rating exactly as the source wrote it, e.g. `"1/4"`.
    /// Converted to a number only at analysis time.
    pub cr: Option<String>,
    pub hp: Option<i64>,
    pub ac: Option<i64>,
    pub strength: Option<i64>,
    pub dexterity: Option<i64>,
    pub constitution: Option<i64>,
    pub intelligence: Option<i64>,
    pub wisdom: Option<i64>,
    pub charisma: Option<i64>,
    pub speed: SpeedProfile,
    pub damage_resistances: String,
    pub damage_immunities: String,
    pub damage_vulnerabilities: String,
    pub senses: String,
    pub resist_count: u32,
    pub immune_count: u32,
    pub vuln_count: u32,
    pub senses_count: u32,
    pub blindsight: bool,
    pub darkvision: bool,
    pub tremorsense: bool,
}

impl CanonicalRow {
    /// Numeric challenge rating, or `None` when the source value is absent
    /// or unparseable.
    pub fn cr_value(&self) -> Option<f64> {
        self.cr.as_deref().and_then(parse_cr_text)
    }

    /// Lowercased resistance and immunity text, used for adaptation checks.
    pub fn adaptation_text(&self) -> String {
        format!("{} {}", self.damage_resistances, self.damage_immunities).to_lowercase()
    }
}

// ── NumericColumn ─────────────────────────────────────────────────────────────

/// Every numeric column of a [`CanonicalRow`] that can be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    Cr,
    Hp,
    Ac,
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
    SpeedWalk,
    SpeedFly,
    SpeedSwim,
    SpeedBurrow,
    SpeedClimb,
    ResistCount,
    ImmuneCount,
    VulnCount,
    SensesCount,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 18] = [
        Self::Cr,
        Self::Hp,
        Self::Ac,
        Self::Str,
        Self::Dex,
        Self::Con,
        Self::Int,
        Self::Wis,
        Self::Cha,
        Self::SpeedWalk,
        Self::SpeedFly,
        Self::SpeedSwim,
        Self::SpeedBurrow,
        Self::SpeedClimb,
        Self::ResistCount,
        Self::ImmuneCount,
        Self::VulnCount,
        Self::SensesCount,
    ];

    /// Column name as used in the persisted dataset.
    pub fn name(self) -> &'static str {
        match self {
            Self::Cr => "cr",
            Self::Hp => "hp",
            Self::Ac => "ac",
            Self::Str => "str",
            Self::Dex => "dex",
            Self::Con => "con",
            Self::Int => "int",
            Self::Wis => "wis",
            Self::Cha => "cha",
            Self::SpeedWalk => "speed_walk",
            Self::SpeedFly => "speed_fly",
            Self::SpeedSwim => "speed_swim",
            Self::SpeedBurrow => "speed_burrow",
            Self::SpeedClimb => "speed_climb",
            Self::ResistCount => "resist_count",
            Self::ImmuneCount => "immune_count",
            Self::VulnCount => "vuln_count",
            Self::SensesCount => "senses_count",
        }
    }

    /// Read this column from a row. `cr` is parsed on the fly; callers that
    /// evaluate it repeatedly should cache [`CanonicalRow::cr_value`].
    pub fn value(self, row: &CanonicalRow) -> Option<f64> {
        let int = |v: Option<i64>| v.map(|n| n as f64);
        match self {
            Self::Cr => row.cr_value(),
            Self::Hp => int(row.hp),
            Self::Ac => int(row.ac),
            Self::Str => int(row.strength),
            Self::Dex => int(row.dexterity),
            Self::Con => int(row.constitution),
            Self::Int => int(row.intelligence),
            Self::Wis => int(row.wisdom),
            Self::Cha => int(row.charisma),
            Self::SpeedWalk => Some(f64::from(row.speed.walk)),
            Self::SpeedFly => Some(f64::from(row.speed.fly)),
            Self::SpeedSwim => Some(f64::from(row.speed.swim)),
            Self::SpeedBurrow => Some(f64::from(row.speed.burrow)),
            Self::SpeedClimb => Some(f64::from(row.speed.climb)),
            Self::ResistCount => Some(f64::from(row.resist_count)),
            Self::ImmuneCount => Some(f64::from(row.immune_count)),
            Self::VulnCount => Some(f64::from(row.vuln_count)),
            Self::SensesCount => Some(f64::from(row.senses_count)),
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NumericColumn {
    type Err = EcologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| EcologyError::UnknownColumn(s.to_string()))
    }
}

// ── Summary tables ────────────────────────────────────────────────────────────

/// One keyed row of a [`SummaryTable`]. `None` marks a cell with no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub key: String,
    pub values: Vec<Option<f64>>,
}

/// A grouped or pivoted table ready for rendering.
///
/// A one-dimensional summary (e.g. counts per environment) has a single
/// column; a pivot has one column per second-dimension category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Human-readable title.
    pub title: String,
    /// Name of the row dimension, e.g. `"environment"`.
    pub dimension: String,
    pub columns: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new(
        title: impl Into<String>,
        dimension: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            dimension: dimension.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, key: impl Into<String>, values: Vec<Option<f64>>) {
        self.rows.push(SummaryRow {
            key: key.into(),
            values,
        });
    }

    /// Look up a single cell by row key and column name.
    pub fn get(&self, key: &str, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|r| r.key == key)
            .and_then(|r| r.values.get(col).copied().flatten())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Degree-1 least-squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Relationship between challenge rating and one numeric stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    /// Name of the stat compared against CR.
    pub column: String,
    /// Number of rows where both CR and the stat were present.
    pub pairs: usize,
    /// Pearson coefficient; absent when either side has zero variance.
    pub pearson_r: Option<f64>,
    /// Regression line; absent when CR has zero variance.
    pub fit: Option<LinearFit>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
