#![deny(warnings)]

//! Persistence layer: the learner profile as a single JSON document.
//!
//! The profile lives under a fixed key in a save directory. It is read once at
//! startup and overwritten wholesale after every change. Loading repairs what
//! it safely can (unknown theme, stale level, missing tables) and logs each
//! repair instead of refusing the save.

use hero_core::{
    find_item, initial_progress, level_for_xp, validate_profile, Profile, TableId, ThemeId,
    ValidationError, MAX_STARS,
};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Storage key of the profile document.
pub const PROFILE_KEY: &str = "tabelline_hero_user";

/// Environment variable that overrides the save directory.
pub const SAVE_DIR_ENV: &str = "TABELLINE_SAVE_DIR";

/// Returns the default directory used for local saves.
pub fn default_save_dir() -> &'static str {
    "./saves"
}

/// Why a profile document could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not JSON, or JSON that does not fit the profile shape.
    #[error("invalid profile document: {0}")]
    Json(#[from] serde_json::Error),
    /// Well-formed, but breaks an invariant no repair covers.
    #[error("profile fails validation: {0}")]
    Invalid(#[from] ValidationError),
}

/// Errors produced by the profile store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed profile in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("could not encode profile for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A fix applied to a loaded profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Repair {
    /// Theme id not in the catalog, replaced by the default theme.
    UnknownTheme(String),
    LevelRecomputed { from: u32, to: u32 },
    /// Table entry missing, recreated with its starting state.
    MissingTable(TableId),
    StarsClamped { table: TableId, stars: u8 },
    /// Unknown or duplicate item id removed from the unlocked list.
    ItemDropped(String),
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repair::UnknownTheme(t) => write!(f, "unknown theme {t:?} replaced by wizard"),
            Repair::LevelRecomputed { from, to } => write!(f, "level {from} recomputed as {to}"),
            Repair::MissingTable(t) => write!(f, "table {t} recreated"),
            Repair::StarsClamped { table, stars } => {
                write!(f, "table {table} stars {stars} clamped to {MAX_STARS}")
            }
            Repair::ItemDropped(id) => write!(f, "unlocked item {id:?} dropped"),
        }
    }
}

/// Parse a profile document and repair it. Returns the profile and the list
/// of repairs made.
pub fn decode_profile(text: &str) -> Result<(Profile, Vec<Repair>), DecodeError> {
    let mut repairs = Vec::new();
    let mut value: Value = serde_json::from_str(text)?;

    if let Some(obj) = value.as_object_mut() {
        let theme = obj.get("themeId").and_then(Value::as_str).map(str::to_string);
        let known = theme
            .as_deref()
            .map(|t| t.parse::<ThemeId>().is_ok())
            .unwrap_or(false);
        if !known {
            repairs.push(Repair::UnknownTheme(theme.unwrap_or_default()));
            obj.insert(
                "themeId".to_string(),
                Value::String(ThemeId::default().as_str().to_string()),
            );
        }
    }

    let mut profile: Profile = serde_json::from_value(value)?;

    let level = level_for_xp(profile.xp);
    if profile.level != level {
        repairs.push(Repair::LevelRecomputed {
            from: profile.level,
            to: level,
        });
        profile.level = level;
    }

    let defaults = initial_progress();
    for (table, start) in defaults {
        let entry = profile.progress.entry(table).or_insert_with(|| {
            repairs.push(Repair::MissingTable(table));
            start
        });
        if entry.stars > MAX_STARS {
            repairs.push(Repair::StarsClamped {
                table,
                stars: entry.stars,
            });
            entry.stars = MAX_STARS;
        }
    }

    let mut seen = BTreeSet::new();
    profile.unlocked_items.retain(|id| {
        let keep = find_item(id).is_some() && seen.insert(id.clone());
        if !keep {
            repairs.push(Repair::ItemDropped(id.clone()));
        }
        keep
    });

    validate_profile(&profile)?;
    Ok((profile, repairs))
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

/// Profile storage rooted at a save directory.
#[derive(Clone, Debug)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store in `TABELLINE_SAVE_DIR`, or the default directory.
    pub fn from_env() -> Self {
        let dir = std::env::var(SAVE_DIR_ENV).unwrap_or_else(|_| default_save_dir().to_string());
        Self::new(dir)
    }

    /// File holding the profile document.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{PROFILE_KEY}.json"))
    }

    /// Read the saved profile. `None` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<Profile>, StoreError> {
        let path = self.path();
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let (profile, repairs) = decode_profile(&text).map_err(|source| StoreError::Malformed {
            path: path.clone(),
            source,
        })?;
        for r in &repairs {
            warn!(path = %path.display(), repair = %r, "repaired saved profile");
        }
        Ok(Some(profile))
    }

    /// Saved profile, or a fresh default one when nothing is saved.
    pub fn load_or_default(&self) -> Result<Profile, StoreError> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Overwrite the saved profile. Writes to a temporary file first so a
    /// crash never leaves half a document behind.
    pub fn save(&self, profile: &Profile) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(profile).map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;
        fs::write(&tmp, text).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_error(&path))?;
        info!(path = %path.display(), xp = profile.xp, coins = profile.coins, "profile saved");
        Ok(())
    }
}
