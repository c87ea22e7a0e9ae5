// League settings model and configuration loading (league.toml, session.toml).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Scoring categories
// ---------------------------------------------------------------------------

/// Hitters or pitchers. Each group is scored and valued independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryGroup {
    Hitting,
    Pitching,
}

impl CategoryGroup {
    pub const ALL: [CategoryGroup; 2] = [CategoryGroup::Hitting, CategoryGroup::Pitching];

    /// The roto categories scored within this group, in display order.
    pub fn categories(&self) -> &'static [Category] {
        match self {
            CategoryGroup::Hitting => &HITTING_CATEGORIES,
            CategoryGroup::Pitching => &PITCHING_CATEGORIES,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryGroup::Hitting => "hitters",
            CategoryGroup::Pitching => "pitchers",
        }
    }
}

/// The ten standard rotisserie categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    AVG,
    R,
    HR,
    RBI,
    SB,
    ERA,
    WHIP,
    W,
    SO,
    SV,
}

const HITTING_CATEGORIES: [Category; 5] = [
    Category::AVG,
    Category::R,
    Category::HR,
    Category::RBI,
    Category::SB,
];

const PITCHING_CATEGORIES: [Category; 5] = [
    Category::ERA,
    Category::WHIP,
    Category::W,
    Category::SO,
    Category::SV,
];

impl Category {
    pub const ALL: [Category; 10] = [
        Category::AVG,
        Category::R,
        Category::HR,
        Category::RBI,
        Category::SB,
        Category::ERA,
        Category::WHIP,
        Category::W,
        Category::SO,
        Category::SV,
    ];

    pub fn group(&self) -> CategoryGroup {
        match self {
            Category::AVG | Category::R | Category::HR | Category::RBI | Category::SB => {
                CategoryGroup::Hitting
            }
            Category::ERA | Category::WHIP | Category::W | Category::SO | Category::SV => {
                CategoryGroup::Pitching
            }
        }
    }

    /// ERA and WHIP: a smaller raw value is the better one.
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Category::ERA | Category::WHIP)
    }

    /// Rate stats are weighted by exposure (AB or IP) when standardized.
    pub fn is_rate(&self) -> bool {
        matches!(self, Category::AVG | Category::ERA | Category::WHIP)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::AVG => "AVG",
            Category::R => "R",
            Category::HR => "HR",
            Category::RBI => "RBI",
            Category::SB => "SB",
            Category::ERA => "ERA",
            Category::WHIP => "WHIP",
            Category::W => "W",
            Category::SO => "SO",
            Category::SV => "SV",
        }
    }

    /// Parse a category label, case-insensitively. `K` is accepted for `SO`.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "AVG" | "BA" => Some(Category::AVG),
            "R" => Some(Category::R),
            "HR" => Some(Category::HR),
            "RBI" => Some(Category::RBI),
            "SB" => Some(Category::SB),
            "ERA" => Some(Category::ERA),
            "WHIP" => Some(Category::WHIP),
            "W" => Some(Category::W),
            "SO" | "K" => Some(Category::SO),
            "SV" => Some(Category::SV),
            _ => None,
        }
    }

    fn bit(&self) -> u16 {
        1 << (*self as u16)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bitmask of enabled scoring categories.
///
/// Written in TOML as a list of labels, e.g. `categories = ["AVG", "HR", "ERA"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Category>", into = "Vec<Category>")]
pub struct CategorySet(u16);

impl CategorySet {
    pub fn all() -> Self {
        Category::ALL.iter().copied().collect()
    }

    pub fn empty() -> Self {
        CategorySet(0)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn insert(&mut self, category: Category) {
        self.0 |= category.bit();
    }

    pub fn remove(&mut self, category: Category) {
        self.0 &= !category.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    /// Enabled categories in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.iter().copied().filter(|c| self.contains(*c))
    }

    /// Enabled categories belonging to `group`.
    pub fn in_group(&self, group: CategoryGroup) -> impl Iterator<Item = Category> + '_ {
        group.categories().iter().copied().filter(|c| self.contains(*c))
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = CategorySet::empty();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl From<Vec<Category>> for CategorySet {
    fn from(v: Vec<Category>) -> Self {
        v.into_iter().collect()
    }
}

impl From<CategorySet> for Vec<Category> {
    fn from(set: CategorySet) -> Self {
        set.iter().collect()
    }
}

/// Category weight multipliers applied to z-scores when totalling. The field
/// names use UPPERCASE to match the TOML keys (AVG, HR, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
#[serde(default)]
pub struct CategoryWeights {
    pub AVG: f64,
    pub R: f64,
    pub HR: f64,
    pub RBI: f64,
    pub SB: f64,
    pub ERA: f64,
    pub WHIP: f64,
    pub W: f64,
    pub SO: f64,
    pub SV: f64,
}

impl CategoryWeights {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::AVG => self.AVG,
            Category::R => self.R,
            Category::HR => self.HR,
            Category::RBI => self.RBI,
            Category::SB => self.SB,
            Category::ERA => self.ERA,
            Category::WHIP => self.WHIP,
            Category::W => self.W,
            Category::SO => self.SO,
            Category::SV => self.SV,
        }
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        CategoryWeights {
            AVG: 1.0,
            R: 1.0,
            HR: 1.0,
            RBI: 1.0,
            SB: 1.0,
            ERA: 1.0,
            WHIP: 1.0,
            W: 1.0,
            SO: 1.0,
            SV: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// League settings
// ---------------------------------------------------------------------------

/// Which player universe the league drafts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeagueType {
    #[default]
    Mixed,
    AL,
    NL,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerConfig {
    pub name: String,
    pub abbreviation: String,
}

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueSettings,
}

/// Everything a valuation pass needs to know about the league.
///
/// Owners are numbered `1..=owner_count`; id 0 is reserved for "unowned".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSettings {
    #[serde(default)]
    pub name: String,
    pub owner_count: usize,
    /// Per-owner auction budget in whole dollars.
    pub budget: u32,
    /// Fraction of the league's money spent on hitters. Pitchers get the rest.
    pub hitting_split: f64,
    pub hitting_slots: BTreeMap<String, usize>,
    pub pitching_slots: BTreeMap<String, usize>,
    #[serde(default)]
    pub categories: CategorySet,
    #[serde(default)]
    pub weights: CategoryWeights,
    #[serde(default)]
    pub min_ab: u32,
    #[serde(default)]
    pub min_ip: f64,
    #[serde(default)]
    pub league_type: LeagueType,
    #[serde(default)]
    pub owners: Vec<OwnerConfig>,
}

impl LeagueSettings {
    pub fn pitching_split(&self) -> f64 {
        1.0 - self.hitting_split
    }

    pub fn group_split(&self, group: CategoryGroup) -> f64 {
        match group {
            CategoryGroup::Hitting => self.hitting_split,
            CategoryGroup::Pitching => self.pitching_split(),
        }
    }

    /// Total roster slots per owner for a group.
    pub fn slots_for(&self, group: CategoryGroup) -> usize {
        let slots = match group {
            CategoryGroup::Hitting => &self.hitting_slots,
            CategoryGroup::Pitching => &self.pitching_slots,
        };
        slots.values().sum()
    }

    pub fn roster_size(&self) -> usize {
        self.slots_for(CategoryGroup::Hitting) + self.slots_for(CategoryGroup::Pitching)
    }

    /// `owner_count × budget`, the money in the whole league.
    pub fn total_budget(&self) -> f64 {
        self.owner_count as f64 * self.budget as f64
    }

    /// Money available to one group: `owner_count × budget × split`.
    pub fn group_pool(&self, group: CategoryGroup) -> f64 {
        self.total_budget() * self.group_split(group)
    }

    /// Owner display info for ids `1..=owner_count`. Generated when the
    /// config does not name the owners.
    pub fn owner_list(&self) -> Vec<OwnerConfig> {
        if self.owners.len() == self.owner_count {
            return self.owners.clone();
        }
        (1..=self.owner_count)
            .map(|i| OwnerConfig {
                name: format!("Owner {i}"),
                abbreviation: format!("O{i}"),
            })
            .collect()
    }

    /// Look up an owner's 1-based id by name or abbreviation (case-insensitive),
    /// or parse a bare number.
    pub fn resolve_owner(&self, key: &str) -> Option<usize> {
        let key = key.trim();
        if let Ok(id) = key.parse::<usize>() {
            return (1..=self.owner_count).contains(&id).then_some(id);
        }
        self.owner_list()
            .iter()
            .position(|o| o.name.eq_ignore_ascii_case(key) || o.abbreviation.eq_ignore_ascii_case(key))
            .map(|i| i + 1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner_count == 0 {
            return Err(ConfigError::ValidationError {
                field: "league.owner_count".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.budget == 0 {
            return Err(ConfigError::ValidationError {
                field: "league.budget".into(),
                message: "must be greater than 0".into(),
            });
        }

        let split = self.hitting_split;
        if !(0.0..=1.0).contains(&split) {
            return Err(ConfigError::ValidationError {
                field: "league.hitting_split".into(),
                message: format!("must be between 0.0 and 1.0 inclusive, got {split}"),
            });
        }

        if self.categories.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "league.categories".into(),
                message: "at least one scoring category must be enabled".into(),
            });
        }

        for category in Category::ALL {
            let w = self.weights.get(category);
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::ValidationError {
                    field: format!("league.weights.{category}"),
                    message: format!("must be a finite value >= 0, got {w}"),
                });
            }
        }

        if !self.min_ip.is_finite() || self.min_ip < 0.0 {
            return Err(ConfigError::ValidationError {
                field: "league.min_ip".into(),
                message: format!("must be a finite value >= 0, got {}", self.min_ip),
            });
        }

        if !self.owners.is_empty() && self.owners.len() != self.owner_count {
            return Err(ConfigError::ValidationError {
                field: "league.owners".into(),
                message: format!(
                    "expected {} owners to match owner_count, got {}",
                    self.owner_count,
                    self.owners.len()
                ),
            });
        }

        Ok(())
    }
}

impl Default for LeagueSettings {
    fn default() -> Self {
        let hitting_slots = [
            ("C", 2),
            ("1B", 1),
            ("2B", 1),
            ("3B", 1),
            ("SS", 1),
            ("CI", 1),
            ("MI", 1),
            ("OF", 5),
            ("U", 1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let pitching_slots = [("P", 9)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        LeagueSettings {
            name: "Rotisserie League".into(),
            owner_count: 12,
            budget: 260,
            hitting_split: 0.70,
            hitting_slots,
            pitching_slots,
            categories: CategorySet::all(),
            weights: CategoryWeights::default(),
            min_ab: 0,
            min_ip: 0.0,
            league_type: LeagueType::Mixed,
            owners: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// session.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct SessionFile {
    data_paths: DataPaths,
    #[serde(default)]
    database: DatabaseSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub hitters: String,
    pub pitchers: String,
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueSettings,
    pub data_paths: DataPaths,
    pub db_path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/session.toml`, both relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- session.toml (required) ---
    let session_path = config_dir.join("session.toml");
    let session_text = read_file(&session_path)?;
    let session_file: SessionFile =
        toml::from_str(&session_text).map_err(|e| ConfigError::ParseError {
            path: session_path.clone(),
            source: e,
        })?;

    let db_path = session_file
        .database
        .path
        .unwrap_or_else(|| crate::db::default_db_path().display().to_string());

    let config = Config {
        league: league_file.league,
        data_paths: session_file.data_paths,
        db_path,
    };

    config.league.validate()?;

    Ok(config)
}

/// Parse league settings from TOML text containing a `[league]` table.
pub fn parse_league_settings(text: &str) -> Result<LeagueSettings, ConfigError> {
    let file: LeagueFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: PathBuf::from("<inline>"),
        source: e,
    })?;
    file.league.validate()?;
    Ok(file.league)
}

/// Files `load_config_from` requires under `config/`.
pub const CONFIG_FILES: [&str; 2] = ["league.toml", "session.toml"];

/// Fill in missing `config/` files from `defaults/`. Returns the files
/// written; files already in `config/` are never touched. Other files in
/// `defaults/` (such as `owners.toml.example`) are not copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    let missing: Vec<&str> = CONFIG_FILES
        .iter()
        .copied()
        .filter(|name| !config_dir.join(name).is_file())
        .collect();
    if missing.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(name) = missing.iter().find(|name| !defaults_dir.join(name).is_file()) {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "config/{name} is missing and defaults/{name} does not exist under {}",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("cannot create {}: {e}", config_dir.display()),
    })?;

    let mut written = Vec::with_capacity(missing.len());
    for name in missing {
        let target = config_dir.join(name);
        std::fs::copy(defaults_dir.join(name), &target).map_err(|e| {
            ConfigError::DefaultsCopyError {
                message: format!("cannot copy defaults/{name}: {e}"),
            }
        })?;
        written.push(target);
    }
    Ok(written)
}

/// Loads config relative to the current working directory, copying defaults
/// into `config/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    for path in ensure_config_files(&cwd)? {
        info!("copied default config to {}", path.display());
    }
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
