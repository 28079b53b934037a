//! Field normalizers for raw monster records.
//!
//! Source records are loosely typed: the same key can hold a string in one
//! record, a mapping in the next and `null` in a third. Every function here
//! is pure and total. Anything it cannot interpret degrades to the
//! documented default instead of failing.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::models::{MovementMode, SpeedProfile};

// ── FieldShape ────────────────────────────────────────────────────────────────

/// The shapes a raw field can take, as seen by the normalizers.
#[derive(Debug, Clone, Copy)]
pub enum FieldShape<'a> {
    /// Missing key or explicit `null`.
    Absent,
    Text(&'a str),
    Number(&'a Number),
    Flag(bool),
    List(&'a [Value]),
    Mapping(&'a Map<String, Value>),
}

impl<'a> From<&'a Value> for FieldShape<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::String(s) => Self::Text(s.as_str()),
            Value::Number(n) => Self::Number(n),
            Value::Bool(b) => Self::Flag(*b),
            Value::Array(items) => Self::List(items.as_slice()),
            Value::Object(map) => Self::Mapping(map),
        }
    }
}

impl<'a> FieldShape<'a> {
    /// Shape of `record[key]`; non-object records have no fields.
    pub fn field(record: &'a Value, key: &str) -> Self {
        record.get(key).map(Self::from).unwrap_or(Self::Absent)
    }
}

/// Render a scalar JSON value as plain text (strings without quotes).
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => join_items(items),
        other => other.to_string(),
    }
}

fn join_items(items: &[Value]) -> String {
    items
        .iter()
        .map(value_text)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Regexes ───────────────────────────────────────────────────────────────────

fn first_integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("regex is valid"))
}

/// An optional word, optional whitespace, then an integer.
fn speed_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z]+)?\s*(\d+)").expect("regex is valid"))
}

fn list_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[;,]|\s+and\s+").expect("regex is valid"))
}

/// Parse a run of ASCII digits, saturating at `u32::MAX`.
fn saturating_u32(digits: &str) -> u32 {
    match digits.parse::<u64>() {
        Ok(n) => u32::try_from(n).unwrap_or(u32::MAX),
        // Only overflow of u64 can fail for a pure digit run.
        Err(_) => u32::MAX,
    }
}

// ── Speed ─────────────────────────────────────────────────────────────────────

/// Normalize a speed field into the five movement channels.
///
/// Accepts either a mapping (`{"walk": "30 ft.", "fly": "60 ft."}`) or free
/// text (`"30 ft., fly 60 ft., swim 40 ft."`). In free text an unlabeled
/// number is the walking speed, a segment labeled with an unknown word is
/// dropped, and a later segment overwrites an earlier one for the same mode.
pub fn parse_speed(raw: &Value) -> SpeedProfile {
    match FieldShape::from(raw) {
        FieldShape::Absent | FieldShape::Flag(_) => SpeedProfile::default(),
        FieldShape::Mapping(map) => parse_speed_mapping(map),
        FieldShape::Text(text) => parse_speed_text(text),
        FieldShape::Number(n) => parse_speed_text(&n.to_string()),
        FieldShape::List(items) => parse_speed_text(&join_items(items)),
    }
}

fn parse_speed_mapping(map: &Map<String, Value>) -> SpeedProfile {
    let mut speeds = SpeedProfile::default();
    for (key, value) in map {
        let Some(mode) = MovementMode::from_keyword(key) else {
            continue;
        };
        let text = value_text(value);
        if let Some(m) = first_integer_re().find(&text) {
            speeds.set(mode, saturating_u32(m.as_str()));
        }
    }
    speeds
}

fn parse_speed_text(text: &str) -> SpeedProfile {
    let mut speeds = SpeedProfile::default();
    let cleaned = text.to_lowercase().replace(" ft.", "").replace(" ft", "");

    for segment in cleaned.split(',') {
        let Some(caps) = speed_segment_re().captures(segment.trim()) else {
            continue;
        };
        let value = saturating_u32(&caps[2]);
        match caps.get(1).map(|m| m.as_str()) {
            None => speeds.walk = value,
            Some(word) => match MovementMode::from_keyword(word) {
                Some(mode) => speeds.set(mode, value),
                None => debug!("ignoring speed segment with unknown mode \"{}\"", word),
            },
        }
    }
    speeds
}

// ── Challenge rating ──────────────────────────────────────────────────────────

/// Convert a raw challenge rating to a number.
///
/// Numbers pass through; text is handled by [`parse_cr_text`]. Everything
/// else, including `null`, yields `None`.
pub fn parse_cr(raw: &Value) -> Option<f64> {
    match FieldShape::from(raw) {
        FieldShape::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        FieldShape::Text(text) => parse_cr_text(text),
        _ => None,
    }
}

/// Parse textual challenge ratings such as `"3"`, `"0.5"` or `"1/4"`.
///
/// A fraction must have exactly one `/`, numeric halves and a non-zero
/// denominator. Non-finite results are rejected.
pub fn parse_cr_text(text: &str) -> Option<f64> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    let value = if s.contains('/') {
        let mut parts = s.split('/');
        let (Some(num), Some(den), None) = (parts.next(), parts.next(), parts.next()) else {
            debug!("malformed challenge rating fraction \"{}\"", s);
            return None;
        };
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den == 0.0 {
            debug!("challenge rating \"{}\" divides by zero", s);
            return None;
        }
        num / den
    } else {
        s.parse::<f64>().ok()?
    };

    value.is_finite().then_some(value)
}

// ── Defenses & senses ─────────────────────────────────────────────────────────

/// Flatten a damage resistance/immunity/vulnerability field to text.
///
/// Lists are joined with `", "`; strings pass through; `null` becomes empty.
pub fn flatten_defense_field(raw: &Value) -> String {
    match FieldShape::from(raw) {
        FieldShape::Absent => String::new(),
        FieldShape::Text(text) => text.to_string(),
        FieldShape::List(items) => join_items(items),
        FieldShape::Number(n) => n.to_string(),
        FieldShape::Flag(_) | FieldShape::Mapping(_) => raw.to_string(),
    }
}

/// Flatten a senses field to text.
///
/// A mapping such as `{"darkvision": "60 ft."}` becomes `"darkvision 60 ft."`
/// with pairs joined by `", "`.
pub fn flatten_senses(raw: &Value) -> String {
    match FieldShape::from(raw) {
        FieldShape::Absent | FieldShape::Flag(false) => String::new(),
        FieldShape::Mapping(map) => map
            .iter()
            .map(|(sense, range)| format!("{} {}", sense, value_text(range)))
            .collect::<Vec<_>>()
            .join(", "),
        FieldShape::Text(text) => text.to_string(),
        FieldShape::List(items) => join_items(items),
        FieldShape::Number(n) => n.to_string(),
        FieldShape::Flag(true) => raw.to_string(),
    }
}

/// Heuristic item count for list-like text.
///
/// Splits on `;`, `,` and the word `and`, then counts non-blank pieces.
/// Compound phrases overcount: `"bludgeoning, piercing, and slashing from
/// nonmagical attacks"` is 3.
pub fn count_list_like(text: &str) -> u32 {
    if text.trim().is_empty() {
        return 0;
    }
    let lowered = text.to_lowercase();
    let count = list_separator_re()
        .split(&lowered)
        .filter(|part| !part.trim().is_empty())
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Case-insensitive substring test.
pub fn has_keyword(text: &str, keyword: &str) -> bool {
    if text.is_empty() || keyword.is_empty() {
        return false;
    }
    text.to_lowercase().contains(&keyword.to_lowercase())
}

// ── Environments & scalars ────────────────────────────────────────────────────

/// Normalize the `environments` field to an ordered list of habitats.
///
/// Lists keep their string items; a string is split on commas, and so is
/// every list item, so no habitat ever contains a comma. Items are trimmed
/// and blanks dropped. Any other shape yields an empty list.
pub fn parse_environments(raw: &Value) -> Vec<String> {
    let clean = |s: &str| {
        let t = s.trim();
        (!t.is_empty()).then(|| t.to_string())
    };
    match FieldShape::from(raw) {
        FieldShape::List(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .flat_map(|item| item.split(','))
            .filter_map(clean)
            .collect(),
        FieldShape::Text(text) => text.split(',').filter_map(clean).collect(),
        _ => Vec::new(),
    }
}

/// Coerce hit points, armor class or an ability score to an integer.
///
/// Integers, integral floats and numeric strings are accepted.
pub fn coerce_int(raw: &Value) -> Option<i64> {
    let from_float = |f: f64| {
        (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
    };
    match FieldShape::from(raw) {
        FieldShape::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(from_float)),
        FieldShape::Text(text) => {
            let t = text.trim();
            t.parse::<i64>()
                .ok()
                .or_else(|| t.parse::<f64>().ok().and_then(from_float))
        }
        _ => None,
    }
}

/// Read an optional text field; blank strings count as absent.
pub fn optional_text(raw: &Value) -> Option<String> {
    match FieldShape::from(raw) {
        FieldShape::Text(text) if !text.trim().is_empty() => Some(text.to_string()),
        FieldShape::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn speeds(walk: u32, fly: u32, swim: u32, burrow: u32, climb: u32) -> SpeedProfile {
        SpeedProfile {
            walk,
            fly,
            swim,
            burrow,
            climb,
        }
    }

    // ── parse_speed ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_speed_mapping() {
        let raw = json!({"walk": "30 ft.", "fly": "60 ft.", "swim": "40 ft."});
        assert_eq!(parse_speed(&raw), speeds(30, 60, 40, 0, 0));
    }

    #[test]
    fn test_parse_speed_text() {
        let raw = json!("30 ft., fly 60 ft., swim 40 ft.");
        assert_eq!(parse_speed(&raw), speeds(30, 60, 40, 0, 0));
    }

    #[test]
    fn test_parse_speed_absent_and_empty() {
        assert_eq!(parse_speed(&Value::Null), SpeedProfile::default());
        assert_eq!(parse_speed(&json!("")), SpeedProfile::default());
        assert_eq!(parse_speed(&json!({})), SpeedProfile::default());
        assert_eq!(parse_speed(&json!(true)), SpeedProfile::default());
    }

    #[test]
    fn test_parse_speed_mapping_numeric_values_and_unknown_keys() {
        let raw = json!({"walk": 40, "hover": true, "burrow": "20 ft.", "climb": "fast"});
        assert_eq!(parse_speed(&raw), speeds(40, 0, 0, 20, 0));
    }

    #[test]
    fn test_parse_speed_text_unknown_keyword_dropped() {
        let raw = json!("30 ft., hover 40 ft., climb 20 ft.");
        assert_eq!(parse_speed(&raw), speeds(30, 0, 0, 0, 20));
    }

    #[test]
    fn test_parse_speed_text_last_write_wins() {
        let raw = json!("walk 40 ft., 25 ft.");
        assert_eq!(parse_speed(&raw).walk, 25);
        let raw = json!("fly 30 ft., fly 90 ft.");
        assert_eq!(parse_speed(&raw).fly, 90);
    }

    #[test]
    fn test_parse_speed_text_case_and_parenthetical() {
        let raw = json!("10 ft. (20 ft. in bear form), Fly 60 ft. (hover)");
        assert_eq!(parse_speed(&raw), speeds(10, 60, 0, 0, 0));
    }

    #[test]
    fn test_parse_speed_bare_number_is_walk() {
        assert_eq!(parse_speed(&json!(30)), speeds(30, 0, 0, 0, 0));
    }

    #[test]
    fn test_parse_speed_list_of_strings() {
        let raw = json!(["30 ft.", "swim 30 ft."]);
        assert_eq!(parse_speed(&raw), speeds(30, 0, 30, 0, 0));
    }

    #[test]
    fn test_parse_speed_saturates_huge_numbers() {
        let raw = json!("99999999999999999999999 ft.");
        assert_eq!(parse_speed(&raw).walk, u32::MAX);
    }

    // ── parse_cr ──────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_cr_fraction() {
        assert_eq!(parse_cr(&json!("1/4")), Some(0.25));
        assert_eq!(parse_cr(&json!(" 1 / 2 ")), Some(0.5));
    }

    #[test]
    fn test_parse_cr_plain_and_numeric() {
        assert_eq!(parse_cr(&json!("3")), Some(3.0));
        assert_eq!(parse_cr(&json!(0.125)), Some(0.125));
        assert_eq!(parse_cr(&json!(17)), Some(17.0));
    }

    #[test]
    fn test_parse_cr_sentinels() {
        assert_eq!(parse_cr(&Value::Null), None);
        assert_eq!(parse_cr(&json!("abc")), None);
        assert_eq!(parse_cr(&json!("")), None);
        assert_eq!(parse_cr(&json!("1/0")), None);
        assert_eq!(parse_cr(&json!("a/4")), None);
        assert_eq!(parse_cr(&json!("1/2/3")), None);
        assert_eq!(parse_cr(&json!("inf")), None);
        assert_eq!(parse_cr(&json!(["1"])), None);
    }

    // ── count_list_like ───────────────────────────────────────────────────────

    #[test]
    fn test_count_list_like_basic() {
        assert_eq!(count_list_like("fire, cold and poison"), 3);
        assert_eq!(count_list_like("acid; lightning"), 2);
        assert_eq!(count_list_like(""), 0);
        assert_eq!(count_list_like("   "), 0);
    }

    #[test]
    fn test_count_list_like_absent_field() {
        assert_eq!(count_list_like(&flatten_defense_field(&Value::Null)), 0);
    }

    #[test]
    fn test_count_list_like_overcounts_compound_phrases() {
        let text = "bludgeoning, piercing, and slashing from nonmagical attacks";
        assert_eq!(count_list_like(text), 3);
    }

    #[test]
    fn test_count_list_like_case_insensitive_and() {
        assert_eq!(count_list_like("Fire AND Cold"), 2);
        assert_eq!(count_list_like("sandstorm"), 1);
    }

    // ── has_keyword ───────────────────────────────────────────────────────────

    #[test]
    fn test_has_keyword() {
        assert!(has_keyword("darkvision 60 ft.", "darkvision"));
        assert!(has_keyword("Blindsight 30 ft.", "blindsight"));
        assert!(!has_keyword("", "darkvision"));
        assert!(!has_keyword("passive Perception 10", "tremorsense"));
    }

    // ── flatten_defense_field / flatten_senses ────────────────────────────────

    #[test]
    fn test_flatten_defense_field_shapes() {
        assert_eq!(flatten_defense_field(&json!(["fire", "cold"])), "fire, cold");
        assert_eq!(flatten_defense_field(&json!("poison")), "poison");
        assert_eq!(flatten_defense_field(&Value::Null), "");
        assert_eq!(flatten_defense_field(&json!([])), "");
    }

    #[test]
    fn test_flatten_senses_mapping() {
        let raw = json!({"darkvision": "60 ft.", "passive_perception": 12});
        assert_eq!(
            flatten_senses(&raw),
            "darkvision 60 ft., passive_perception 12"
        );
    }

    #[test]
    fn test_flatten_senses_text_and_absent() {
        assert_eq!(
            flatten_senses(&json!("blindsight 10 ft., passive Perception 12")),
            "blindsight 10 ft., passive Perception 12"
        );
        assert_eq!(flatten_senses(&Value::Null), "");
        assert_eq!(flatten_senses(&json!({})), "");
    }

    // ── parse_environments ────────────────────────────────────────────────────

    #[test]
    fn test_parse_environments_shapes() {
        assert_eq!(
            parse_environments(&json!(["Forest", " Hill ", "", 3])),
            vec!["Forest", "Hill"]
        );
        assert_eq!(
            parse_environments(&json!("Desert, Mountain,,")),
            vec!["Desert", "Mountain"]
        );
        assert!(parse_environments(&Value::Null).is_empty());
        assert!(parse_environments(&json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_parse_environments_splits_list_items_on_commas() {
        assert_eq!(
            parse_environments(&json!(["Forest, Deep", "Hill", " ,Swamp"])),
            vec!["Forest", "Deep", "Hill", "Swamp"]
        );
    }

    // ── coerce_int / optional_text ────────────────────────────────────────────

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int(&json!(45)), Some(45));
        assert_eq!(coerce_int(&json!(12.0)), Some(12));
        assert_eq!(coerce_int(&json!(12.5)), None);
        assert_eq!(coerce_int(&json!(" 17 ")), Some(17));
        assert_eq!(coerce_int(&json!("seventeen")), None);
        assert_eq!(coerce_int(&Value::Null), None);
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(&json!("1/4")), Some("1/4".to_string()));
        assert_eq!(optional_text(&json!(2)), Some("2".to_string()));
        assert_eq!(optional_text(&json!("  ")), None);
        assert_eq!(optional_text(&Value::Null), None);
    }

    // ── FieldShape ────────────────────────────────────────────────────────────

    #[test]
    fn test_field_shape_on_non_object_record() {
        let record = json!("not a record");
        assert!(matches!(
            FieldShape::field(&record, "speed"),
            FieldShape::Absent
        ));
    }
}
