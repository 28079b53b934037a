//! Persistence of the canonical dataset as JSON or CSV.
//!
//! Both formats share one flat record layout ([`PersistedRow`]); the format
//! is picked from the file extension.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use ecology_core::error::{EcologyError, Result};
use ecology_core::models::{CanonicalRow, SpeedProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assembler::Dataset;

/// Separator used when flattening the environment list into one field.
const ENVIRONMENT_SEPARATOR: &str = ", ";

// ── PersistedRow ──────────────────────────────────────────────────────────────

/// One dataset row as written to disk. Absent numbers are `null` in JSON and
/// empty cells in CSV; keyword flags are stored as 0/1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRow {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: String,
    pub environment: String,
    pub cr: Option<String>,
    pub hp: Option<i64>,
    pub ac: Option<i64>,
    #[serde(rename = "str")]
    pub strength: Option<i64>,
    #[serde(rename = "dex")]
    pub dexterity: Option<i64>,
    #[serde(rename = "con")]
    pub constitution: Option<i64>,
    #[serde(rename = "int")]
    pub intelligence: Option<i64>,
    #[serde(rename = "wis")]
    pub wisdom: Option<i64>,
    #[serde(rename = "cha")]
    pub charisma: Option<i64>,
    pub speed_walk: u32,
    pub speed_fly: u32,
    pub speed_swim: u32,
    pub speed_burrow: u32,
    pub speed_climb: u32,
    pub damage_resistances: String,
    pub damage_immunities: String,
    pub damage_vulnerabilities: String,
    pub senses: String,
    pub resist_count: u32,
    pub immune_count: u32,
    pub vuln_count: u32,
    pub senses_count: u32,
    pub blindsight: u8,
    pub darkvision: u8,
    pub tremorsense: u8,
}

impl From<&CanonicalRow> for PersistedRow {
    fn from(row: &CanonicalRow) -> Self {
        PersistedRow {
            name: row.name.clone(),
            kind: row.kind.clone(),
            size: row.size.clone(),
            environment: row.environment.join(ENVIRONMENT_SEPARATOR),
            cr: row.cr.clone(),
            hp: row.hp,
            ac: row.ac,
            strength: row.strength,
            dexterity: row.dexterity,
            constitution: row.constitution,
            intelligence: row.intelligence,
            wisdom: row.wisdom,
            charisma: row.charisma,
            speed_walk: row.speed.walk,
            speed_fly: row.speed.fly,
            speed_swim: row.speed.swim,
            speed_burrow: row.speed.burrow,
            speed_climb: row.speed.climb,
            damage_resistances: row.damage_resistances.clone(),
            damage_immunities: row.damage_immunities.clone(),
            damage_vulnerabilities: row.damage_vulnerabilities.clone(),
            senses: row.senses.clone(),
            resist_count: row.resist_count,
            immune_count: row.immune_count,
            vuln_count: row.vuln_count,
            senses_count: row.senses_count,
            blindsight: u8::from(row.blindsight),
            darkvision: u8::from(row.darkvision),
            tremorsense: u8::from(row.tremorsense),
        }
    }
}

impl From<PersistedRow> for CanonicalRow {
    fn from(row: PersistedRow) -> Self {
        CanonicalRow {
            name: row.name,
            kind: row.kind,
            size: row.size,
            environment: row
                .environment
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            cr: row.cr.filter(|s| !s.trim().is_empty()),
            hp: row.hp,
            ac: row.ac,
            strength: row.strength,
            dexterity: row.dexterity,
            constitution: row.constitution,
            intelligence: row.intelligence,
            wisdom: row.wisdom,
            charisma: row.charisma,
            speed: SpeedProfile {
                walk: row.speed_walk,
                fly: row.speed_fly,
                swim: row.speed_swim,
                burrow: row.speed_burrow,
                climb: row.speed_climb,
            },
            damage_resistances: row.damage_resistances,
            damage_immunities: row.damage_immunities,
            damage_vulnerabilities: row.damage_vulnerabilities,
            senses: row.senses,
            resist_count: row.resist_count,
            immune_count: row.immune_count,
            vuln_count: row.vuln_count,
            senses_count: row.senses_count,
            blindsight: row.blindsight != 0,
            darkvision: row.darkvision != 0,
            tremorsense: row.tremorsense != 0,
        }
    }
}

// ── Format ────────────────────────────────────────────────────────────────────

/// On-disk dataset format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    Csv,
}

impl DatasetFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => Err(EcologyError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

// ── Readers & writers ─────────────────────────────────────────────────────────

/// Write rows as a pretty-printed JSON array.
pub fn write_json<W: Write>(rows: &[CanonicalRow], writer: W) -> Result<()> {
    let records: Vec<PersistedRow> = rows.iter().map(PersistedRow::from).collect();
    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}

pub fn read_json<R: Read>(reader: R) -> Result<Vec<CanonicalRow>> {
    let records: Vec<PersistedRow> = serde_json::from_reader(reader)?;
    Ok(records.into_iter().map(CanonicalRow::from).collect())
}

/// Write rows as CSV with a header row.
pub fn write_csv<W: Write>(rows: &[CanonicalRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(PersistedRow::from(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<CanonicalRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<PersistedRow>() {
        rows.push(CanonicalRow::from(record?));
    }
    Ok(rows)
}

// ── Files ─────────────────────────────────────────────────────────────────────

/// Save `rows` to `path`, creating parent directories as needed.
///
/// The data is written to a sibling temporary file first and renamed into
/// place, so a failed write never truncates an existing dataset.
pub fn save_dataset(rows: &[CanonicalRow], path: &Path) -> Result<()> {
    let format = DatasetFormat::from_path(path)?;
    write_atomically(path, |writer| match format {
        DatasetFormat::Json => write_json(rows, writer),
        DatasetFormat::Csv => write_csv(rows, writer),
    })?;
    info!("Saved {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Run `write` against `<path>.tmp`, then rename it over `path`.
///
/// The temporary file is removed again when any step fails.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let write_err = |source| EcologyError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp = tmp_path(path);
    let file = File::create(&tmp).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    let result = write(&mut writer)
        .and_then(|()| writer.flush().map_err(write_err))
        .and_then(|()| {
            drop(writer);
            std::fs::rename(&tmp, path).map_err(write_err)
        });

    if result.is_err() {
        if let Err(e) = std::fs::remove_file(&tmp) {
            warn!("could not remove {}: {}", tmp.display(), e);
        }
    }
    result
}

/// Load a dataset previously written by [`save_dataset`].
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(EcologyError::DatasetNotFound(path.to_path_buf()));
    }
    let format = DatasetFormat::from_path(path)?;
    let file = File::open(path).map_err(|source| EcologyError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let rows = match format {
        DatasetFormat::Json => read_json(reader)?,
        DatasetFormat::Csv => read_csv(reader)?,
    };
    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(Dataset::new(rows))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn sample_rows() -> Vec<CanonicalRow> {
        vec![
            CanonicalRow {
                name: "Giant Crab".to_string(),
                kind: "Beast".to_string(),
                size: "Medium".to_string(),
                environment: vec!["Coastal".to_string(), "Underwater".to_string()],
                cr: Some("1/8".to_string()),
                hp: Some(13),
                ac: Some(15),
                strength: Some(13),
                speed: SpeedProfile {
                    walk: 30,
                    swim: 30,
                    ..SpeedProfile::default()
                },
                senses: "blindsight 30 ft., passive Perception 9".to_string(),
                senses_count: 2,
                blindsight: true,
                ..CanonicalRow::default()
            },
            CanonicalRow {
                name: "Mystery".to_string(),
                kind: "Unknown".to_string(),
                damage_immunities: "fire, poison".to_string(),
                immune_count: 2,
                ..CanonicalRow::default()
            },
        ]
    }

    // ── Format ────────────────────────────────────────────────────────────────

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DatasetFormat::from_path(Path::new("a/b.JSON")).unwrap(),
            DatasetFormat::Json
        );
        assert_eq!(
            DatasetFormat::from_path(Path::new("m.csv")).unwrap(),
            DatasetFormat::Csv
        );
        assert!(matches!(
            DatasetFormat::from_path(Path::new("m.parquet")),
            Err(EcologyError::UnsupportedFormat(_))
        ));
    }

    // ── In-memory ─────────────────────────────────────────────────────────────

    #[test]
    fn test_csv_header_and_flags() {
        let mut buf = Vec::new();
        write_csv(&sample_rows(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("name,type,size,environment,cr,hp,ac,str,dex,"));
        assert!(header.ends_with("blindsight,darkvision,tremorsense"));
        assert!(text.contains("\"Coastal, Underwater\""));
        assert!(text.lines().nth(1).unwrap().ends_with(",1,0,0"));
    }

    #[test]
    fn test_csv_round_trip() {
        let rows = sample_rows();
        let mut buf = Vec::new();
        write_csv(&rows, &mut buf).unwrap();
        assert_eq!(read_csv(buf.as_slice()).unwrap(), rows);
    }

    #[test]
    fn test_json_round_trip_and_nulls() {
        let rows = sample_rows();
        let mut buf = Vec::new();
        write_json(&rows, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[1]["hp"], serde_json::Value::Null);
        assert_eq!(value[0]["type"], "Beast");
        assert_eq!(value[0]["blindsight"], 1);

        assert_eq!(read_json(buf.as_slice()).unwrap(), rows);
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_save_and_load_both_formats() {
        let dir = TempDir::new().unwrap();
        for name in ["nested/monsters.json", "nested/monsters.csv"] {
            let path = dir.path().join(name);
            save_dataset(&sample_rows(), &path).unwrap();
            let dataset = load_dataset(&path).unwrap();
            assert_eq!(dataset.rows(), sample_rows().as_slice());
            assert!(!tmp_path(&path).exists());
        }
    }

    #[test]
    fn test_comma_bearing_environment_survives_reload() {
        let rows = vec![crate::builder::build_row(&serde_json::json!({
            "name": "Bog Hag",
            "environments": ["Swamp, Deep", "Forest"]
        }))];
        assert_eq!(rows[0].environment, vec!["Swamp", "Deep", "Forest"]);

        let dir = TempDir::new().unwrap();
        for name in ["hags.json", "hags.csv"] {
            let path = dir.path().join(name);
            save_dataset(&rows, &path).unwrap();
            let reloaded = load_dataset(&path).unwrap();
            assert_eq!(reloaded.rows(), rows.as_slice());
            assert_eq!(reloaded.explode().len(), 3);
        }
    }

    #[test]
    fn test_failed_write_removes_tmp_and_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monsters.json");
        std::fs::write(&path, "[]").unwrap();

        let result = write_atomically(&path, |writer| {
            writer.write_all(b"[{\"name\": ")?;
            Err(EcologyError::Config("serializer gave up".to_string()))
        });

        assert!(matches!(result, Err(EcologyError::Config(_))));
        assert!(!tmp_path(&path).exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_load_missing_dataset() {
        let dir = TempDir::new().unwrap();
        let result = load_dataset(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(EcologyError::DatasetNotFound(_))));
    }

    #[test]
    fn test_load_corrupt_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{\"name\": ").unwrap();
        assert!(matches!(
            load_dataset(&path),
            Err(EcologyError::JsonParse(_))
        ));
    }

    #[test]
    fn test_save_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let result = save_dataset(&sample_rows(), &dir.path().join("m.txt"));
        assert!(matches!(result, Err(EcologyError::UnsupportedFormat(_))));
    }
}
