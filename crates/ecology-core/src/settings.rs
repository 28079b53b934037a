use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Open5e monsters endpoint used when no `--api-url` is given.
pub const DEFAULT_API_URL: &str = "https://api.open5e.com/monsters/";

/// Damage keywords checked by the adaptation heatmap.
pub const DEFAULT_DAMAGE_TYPES: &str =
    "fire,cold,poison,acid,lightning,necrotic,radiant,psychic,thunder,force";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Environment-conditioned statistics over monster statblocks
#[derive(Parser, Debug, Clone)]
#[command(
    name = "monster-ecology",
    about = "Environment-conditioned statistics over monster statblocks",
    version
)]
pub struct Settings {
    /// What to do: fetch the dataset, browse the report, print it as JSON, or explore
    #[arg(long, default_value = "report", value_parser = ["fetch", "report", "summary", "explore"])]
    pub view: String,

    /// First page of the paginated monsters API
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Stop fetching after this many pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Dataset file (.json or .csv); defaults to ~/.monster-ecology/data/monsters_ecology.json
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Where `summary` writes its JSON report (stdout when absent)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Environments kept in the damage heatmap and type pivot
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub top_environments: u32,

    /// Environments kept in the movement chart
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub top_movement_environments: u32,

    /// Creature types kept in the type pivot
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub top_types: u32,

    /// Comma-separated damage keywords for the adaptation heatmap
    #[arg(long, default_value = DEFAULT_DAMAGE_TYPES)]
    pub damage_types: String,

    /// Explorer grouping dimension
    #[arg(long, default_value = "environment", value_parser = ["environment", "type", "size"])]
    pub dimension: String,

    /// Explorer metric
    #[arg(long, default_value = "count", value_parser = ["count", "avg_cr", "avg_hp", "avg_ac", "pct_fly", "pct_swim"])]
    pub metric: String,

    /// Explorer lower CR bound (inclusive)
    #[arg(long)]
    pub cr_min: Option<f64>,

    /// Explorer upper CR bound (inclusive)
    #[arg(long)]
    pub cr_max: Option<f64>,

    /// Explorer: only monsters that can fly
    #[arg(long)]
    pub only_fly: bool,

    /// Explorer: only monsters that can swim
    #[arg(long)]
    pub only_swim: bool,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.monster-ecology/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_environments: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_types: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_types: Option<String>,
}

impl LastUsedParams {
    /// Default path of the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&home_dir())
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".monster-ecology").join("last_used.json")
    }

    /// Load persisted params; `Default` when the file is absent or invalid.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params, creating parent directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge last-used params for anything not given
    /// explicitly, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit args and
    /// config path so tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // NOTE: clap stores arg ids by field name (underscores).
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "api_url") {
            if let Some(v) = last.api_url {
                settings.api_url = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "dataset") && settings.dataset.is_none() {
            settings.dataset = last.dataset;
        }
        if !is_arg_explicitly_set(&matches, "top_environments") {
            if let Some(v) = last.top_environments {
                settings.top_environments = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "top_types") {
            if let Some(v) = last.top_types {
                settings.top_types = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "damage_types") {
            if let Some(v) = last.damage_types {
                settings.damage_types = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Dataset path, falling back to the default location under the home dir.
    pub fn dataset_path(&self) -> PathBuf {
        self.dataset.clone().unwrap_or_else(|| {
            home_dir()
                .join(".monster-ecology")
                .join("data")
                .join("monsters_ecology.json")
        })
    }

    /// Damage keywords parsed from `--damage-types`, lowercased, blanks dropped.
    pub fn damage_type_list(&self) -> Vec<String> {
        self.damage_types
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            theme: Some(s.theme.clone()),
            api_url: Some(s.api_url.clone()),
            dataset: s.dataset.clone(),
            top_environments: Some(s.top_environments),
            top_types: Some(s.top_types),
            damage_types: Some(s.damage_types.clone()),
        }
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// `true` when `name` was supplied on the command line (not a default).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
