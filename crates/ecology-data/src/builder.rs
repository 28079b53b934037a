//! Builds one [`CanonicalRow`] per raw monster record.

use ecology_core::models::{CanonicalRow, RawRecord, UNKNOWN_KIND};
use ecology_core::normalize::{
    coerce_int, count_list_like, flatten_defense_field, flatten_senses, has_keyword,
    optional_text, parse_environments, parse_speed,
};
use serde_json::Value;
use tracing::debug;

static NULL: Value = Value::Null;

/// `record[key]`, or `null` when the key is missing or the record is not an object.
fn field<'a>(record: &'a RawRecord, key: &str) -> &'a Value {
    record.get(key).unwrap_or(&NULL)
}

/// Normalize a single raw record. Never fails: unusable fields fall back to
/// their defaults.
pub fn build_row(record: &RawRecord) -> CanonicalRow {
    if !record.is_object() {
        debug!("raw record is not a mapping; building an empty row");
    }

    let damage_resistances = flatten_defense_field(field(record, "damage_resistances"));
    let damage_immunities = flatten_defense_field(field(record, "damage_immunities"));
    let damage_vulnerabilities = flatten_defense_field(field(record, "damage_vulnerabilities"));
    let senses = flatten_senses(field(record, "senses"));

    CanonicalRow {
        name: optional_text(field(record, "name")).unwrap_or_default(),
        kind: optional_text(field(record, "type")).unwrap_or_else(|| UNKNOWN_KIND.to_string()),
        size: optional_text(field(record, "size")).unwrap_or_default(),
        environment: parse_environments(field(record, "environments")),
        cr: optional_text(field(record, "challenge_rating")).map(|s| s.trim().to_string()),
        hp: coerce_int(field(record, "hit_points")),
        ac: coerce_int(field(record, "armor_class")),
        strength: coerce_int(field(record, "strength")),
        dexterity: coerce_int(field(record, "dexterity")),
        constitution: coerce_int(field(record, "constitution")),
        intelligence: coerce_int(field(record, "intelligence")),
        wisdom: coerce_int(field(record, "wisdom")),
        charisma: coerce_int(field(record, "charisma")),
        speed: parse_speed(field(record, "speed")),
        resist_count: count_list_like(&damage_resistances),
        immune_count: count_list_like(&damage_immunities),
        vuln_count: count_list_like(&damage_vulnerabilities),
        senses_count: count_list_like(&senses),
        blindsight: has_keyword(&senses, "blindsight"),
        darkvision: has_keyword(&senses, "darkvision"),
        tremorsense: has_keyword(&senses, "tremorsense"),
        damage_resistances,
        damage_immunities,
        damage_vulnerabilities,
        senses,
    }
}

/// Build rows for a whole page, preserving order.
pub fn build_rows(records: &[RawRecord]) -> Vec<CanonicalRow> {
    records.iter().map(build_row).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
