#![deny(warnings)]

//! Core domain models and invariants for Tabelline Hero.
//!
//! This crate defines the learner profile, the per-table progress records and
//! the static theme/shop catalog, with validation helpers that check the
//! invariants the progression engine relies on.

pub mod catalog;

pub use catalog::{find_item, items_of, ItemKind, ShopItem, ThemeConfig, ThemeId, SHOP_ITEMS};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Experience needed per level.
pub const XP_PER_LEVEL: u32 = 100;
/// Highest star rating a table can hold.
pub const MAX_STARS: u8 = 3;
/// Star total over numeric tables that unlocks the mixed challenge.
pub const MIXED_UNLOCK_STARS: u32 = 15;
/// Questions asked in one practice session.
pub const TOTAL_QUESTIONS: u32 = 10;
/// Numeric tables unlocked for a brand new learner.
pub const INITIAL_TABLES: [u8; 4] = [1, 2, 5, 10];
/// Highest numeric table.
pub const LAST_TABLE: u8 = 10;

/// One practice unit: a single multiplication table or the mixed challenge.
///
/// Serialized as `"1"`..`"10"` or `"mixed"` so it can key a JSON object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableId {
    /// The `n` times table, `1..=10`.
    Number(u8),
    /// Factors drawn from several tables.
    Mixed,
}

impl TableId {
    /// Numeric table `n`, if `n` is within `1..=10`.
    pub fn number(n: u8) -> Option<Self> {
        (1..=LAST_TABLE).contains(&n).then_some(TableId::Number(n))
    }

    /// Every table in dashboard order: 1..=10, then mixed.
    pub fn all() -> impl Iterator<Item = TableId> {
        (1..=LAST_TABLE)
            .map(TableId::Number)
            .chain(std::iter::once(TableId::Mixed))
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, TableId::Number(_))
    }

    /// The table unlocked by mastering this one. None for 10 and mixed.
    pub fn next(self) -> Option<TableId> {
        match self {
            TableId::Number(n) if n < LAST_TABLE => Some(TableId::Number(n + 1)),
            _ => None,
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableId::Number(n) => write!(f, "{n}"),
            TableId::Mixed => f.write_str("mixed"),
        }
    }
}

impl FromStr for TableId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "mixed" {
            return Ok(TableId::Mixed);
        }
        s.parse::<u8>()
            .ok()
            .and_then(TableId::number)
            .ok_or_else(|| ValidationError::UnknownTable(s.to_string()))
    }
}

impl Serialize for TableId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TableId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Mastery record for one table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProgress {
    /// Best star rating, `0..=3`. Never decreases.
    pub stars: u8,
    /// Best score in a session. Never decreases.
    pub high_score: u32,
    /// Whether the learner may play this table.
    pub is_unlocked: bool,
}

impl TableProgress {
    pub fn locked() -> Self {
        Self::default()
    }

    pub fn unlocked() -> Self {
        Self {
            is_unlocked: true,
            ..Self::default()
        }
    }
}

/// Cosmetic avatar selections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    /// Colour class of the avatar body.
    pub base_color: String,
    /// Accessory emoji, empty for none.
    pub accessory: String,
    /// Expression code.
    pub expression: String,
}

impl Default for Avatar {
    fn default() -> Self {
        Self {
            base_color: ThemeId::Wizard.config().default_avatar_color.to_string(),
            accessory: String::new(),
            expression: "aa".to_string(),
        }
    }
}

/// The learner's persisted state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Display name.
    pub name: String,
    /// Selected world.
    pub theme_id: ThemeId,
    /// Equipped cosmetics.
    pub avatar: Avatar,
    /// Total experience.
    pub xp: u32,
    /// Always `level_for_xp(xp)`.
    pub level: u32,
    /// Spendable currency.
    pub coins: u32,
    /// Item ids ever purchased, in purchase order.
    #[serde(default)]
    pub unlocked_items: Vec<String>,
    /// Progress for every table.
    #[serde(default = "initial_progress")]
    pub progress: BTreeMap<TableId, TableProgress>,
}

/// Level reached with `xp` experience points.
pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

/// Progress map for a new learner: 1, 2, 5 and 10 open, everything else locked.
pub fn initial_progress() -> BTreeMap<TableId, TableProgress> {
    TableId::all()
        .map(|t| {
            let open = matches!(t, TableId::Number(n) if INITIAL_TABLES.contains(&n));
            let p = if open {
                TableProgress::unlocked()
            } else {
                TableProgress::locked()
            };
            (t, p)
        })
        .collect()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: String::new(),
            theme_id: ThemeId::default(),
            avatar: Avatar::default(),
            xp: 0,
            level: 1,
            coins: 0,
            unlocked_items: Vec::new(),
            progress: initial_progress(),
        }
    }
}

impl Profile {
    /// Fresh profile created at onboarding. The avatar colour follows the theme.
    pub fn new(name: impl Into<String>, theme: ThemeId) -> Self {
        Self {
            name: name.into(),
            theme_id: theme,
            avatar: Avatar {
                base_color: theme.config().default_avatar_color.to_string(),
                ..Avatar::default()
            },
            ..Self::default()
        }
    }

    pub fn theme(&self) -> &'static ThemeConfig {
        self.theme_id.config()
    }

    /// Progress for `table`, if the profile tracks it.
    pub fn table(&self, table: TableId) -> Option<&TableProgress> {
        self.progress.get(&table)
    }

    pub fn is_unlocked(&self, table: TableId) -> bool {
        self.table(table).map(|p| p.is_unlocked).unwrap_or(false)
    }

    /// Sum of stars over tables 1..=10. The mixed table does not count.
    pub fn numeric_stars(&self) -> u32 {
        self.progress
            .iter()
            .filter(|(t, _)| t.is_numeric())
            .map(|(_, p)| u32::from(p.stars))
            .sum()
    }

    /// True when the learner bought `item_id` or it is free.
    pub fn owns(&self, item_id: &str) -> bool {
        find_item(item_id).map(|i| i.cost == 0).unwrap_or(false)
            || self.unlocked_items.iter().any(|id| id == item_id)
    }
}

/// A multiplication question with four answer choices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Left factor as displayed.
    pub factor_a: u32,
    /// Right factor as displayed.
    pub factor_b: u32,
    /// `factor_a * factor_b`.
    pub correct_answer: u32,
    /// Four distinct positive choices, one of them correct.
    pub options: [u32; 4],
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.factor_a, self.factor_b)
    }
}

/// A moment in a practice session that calls for a mentor message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MentorEvent {
    /// Session start.
    Welcome,
    /// A streak of correct answers, ending on `question`.
    Correct { question: String },
    /// A wrong answer.
    Mistake {
        question: String,
        answer: u32,
        correct_answer: u32,
    },
    /// Session finished.
    LevelComplete,
}

impl MentorEvent {
    /// Short tag used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MentorEvent::Welcome => "welcome",
            MentorEvent::Correct { .. } => "correct",
            MentorEvent::Mistake { .. } => "mistake",
            MentorEvent::LevelComplete => "level_complete",
        }
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Table id outside 1..=10 and not "mixed".
    #[error("unknown table: {0}")]
    UnknownTable(String),
    /// Theme id not in the catalog.
    #[error("unknown theme: {0}")]
    UnknownTheme(String),
    /// Stars above the maximum rating.
    #[error("table {table} has {stars} stars, maximum is 3")]
    StarsOutOfRange { table: TableId, stars: u8 },
    /// Stored level disagrees with experience.
    #[error("level {level} does not match {xp} xp")]
    LevelMismatch { xp: u32, level: u32 },
    /// A table has no progress entry.
    #[error("missing progress for table {0}")]
    MissingTable(TableId),
    /// An item id appears twice in the unlocked list.
    #[error("item {0} unlocked twice")]
    DuplicateItem(String),
    /// An unlocked item id is not in the catalog.
    #[error("unknown shop item: {0}")]
    UnknownItem(String),
}

/// Validate a profile against the progression invariants.
pub fn validate_profile(profile: &Profile) -> Result<(), ValidationError> {
    let expected = level_for_xp(profile.xp);
    if profile.level != expected {
        return Err(ValidationError::LevelMismatch {
            xp: profile.xp,
            level: profile.level,
        });
    }
    for table in TableId::all() {
        let p = profile
            .table(table)
            .ok_or(ValidationError::MissingTable(table))?;
        if p.stars > MAX_STARS {
            return Err(ValidationError::StarsOutOfRange {
                table,
                stars: p.stars,
            });
        }
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for id in &profile.unlocked_items {
        if find_item(id).is_none() {
            return Err(ValidationError::UnknownItem(id.clone()));
        }
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateItem(id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_profile_unlocks_starting_tables() {
        let p = Profile::default();
        for n in [1, 2, 5, 10] {
            assert!(p.is_unlocked(TableId::Number(n)), "table {n} should be open");
        }
        for n in [3, 4, 6, 7, 8, 9] {
            assert!(!p.is_unlocked(TableId::Number(n)), "table {n} should be locked");
        }
        assert!(!p.is_unlocked(TableId::Mixed));
        assert_eq!(p.progress.len(), 11);
        assert_eq!((p.xp, p.level, p.coins), (0, 1, 0));
        validate_profile(&p).unwrap();
    }

    #[test]
    fn new_profile_takes_theme_colour() {
        let p = Profile::new("Luca", ThemeId::Robot);
        assert_eq!(p.name, "Luca");
        assert_eq!(p.avatar.base_color, "bg-cyan-500");
        assert_eq!(p.avatar.expression, "aa");
        assert_eq!(p.theme().mentor_emoji, "🤖");
    }

    #[test]
    fn table_id_parses_and_prints() {
        assert_eq!("7".parse::<TableId>().unwrap(), TableId::Number(7));
        assert_eq!("mixed".parse::<TableId>().unwrap(), TableId::Mixed);
        assert!("0".parse::<TableId>().is_err());
        assert!("11".parse::<TableId>().is_err());
        assert!("seven".parse::<TableId>().is_err());
        assert_eq!(TableId::Number(10).to_string(), "10");
        assert_eq!(TableId::Number(9).next(), Some(TableId::Number(10)));
        assert_eq!(TableId::Number(10).next(), None);
        assert_eq!(TableId::Mixed.next(), None);
    }

    #[test]
    fn profile_blob_uses_string_keys() {
        let p = Profile::new("Sofia", ThemeId::Princess);
        let s = serde_json::to_string(&p).unwrap();
        assert!(s.contains("\"themeId\":\"princess\""));
        assert!(s.contains("\"mixed\":{\"stars\":0,\"highScore\":0,\"isUnlocked\":false}"));
        assert!(s.contains("\"10\":{"));
        let back: Profile = serde_json::from_str(&s).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn blob_with_bad_table_key_is_rejected() {
        let json = r#"{"name":"x","themeId":"wizard","avatar":{"baseColor":"a","accessory":"","expression":"aa"},
            "xp":0,"level":1,"coins":0,"unlockedItems":[],"progress":{"12":{"stars":0,"highScore":0,"isUnlocked":true}}}"#;
        assert!(serde_json::from_str::<Profile>(json).is_err());
    }

    #[test]
    fn validation_catches_broken_invariants() {
        let mut p = Profile::default();
        p.xp = 250;
        assert_eq!(
            validate_profile(&p),
            Err(ValidationError::LevelMismatch { xp: 250, level: 1 })
        );
        p.level = 3;
        validate_profile(&p).unwrap();

        let mut q = p.clone();
        q.progress.get_mut(&TableId::Number(4)).unwrap().stars = 4;
        assert!(matches!(
            validate_profile(&q),
            Err(ValidationError::StarsOutOfRange { stars: 4, .. })
        ));

        let mut q = p.clone();
        q.progress.remove(&TableId::Mixed);
        assert_eq!(
            validate_profile(&q),
            Err(ValidationError::MissingTable(TableId::Mixed))
        );

        let mut q = p.clone();
        q.unlocked_items = vec!["c_blue".into(), "c_blue".into()];
        assert_eq!(
            validate_profile(&q),
            Err(ValidationError::DuplicateItem("c_blue".into()))
        );

        let mut q = p;
        q.unlocked_items = vec!["rainbow".into()];
        assert_eq!(
            validate_profile(&q),
            Err(ValidationError::UnknownItem("rainbow".into()))
        );
    }

    #[test]
    fn numeric_stars_ignore_mixed() {
        let mut p = Profile::default();
        p.progress.get_mut(&TableId::Number(1)).unwrap().stars = 3;
        p.progress.get_mut(&TableId::Number(2)).unwrap().stars = 2;
        p.progress.get_mut(&TableId::Mixed).unwrap().stars = 3;
        assert_eq!(p.numeric_stars(), 5);
    }

    #[test]
    fn free_items_are_always_owned() {
        let p = Profile::default();
        assert!(p.owns("c_orange"));
        assert!(p.owns("e_smile"));
        assert!(!p.owns("c_blue"));
        assert!(!p.owns("nope"));
    }

    #[test]
    fn themes_resolve_exhaustively() {
        for t in ThemeId::ALL {
            assert_eq!(t.config().id, t);
            assert_eq!(t.as_str().parse::<ThemeId>().unwrap(), t);
        }
        assert_eq!(
            "pirate".parse::<ThemeId>(),
            Err(ValidationError::UnknownTheme("pirate".into()))
        );
    }

    #[test]
    fn catalog_ids_are_unique() {
        let ids: BTreeSet<&str> = SHOP_ITEMS.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), SHOP_ITEMS.len());
        assert_eq!(items_of(ItemKind::Color).count(), 7);
        assert_eq!(items_of(ItemKind::Accessory).count(), 8);
        assert_eq!(items_of(ItemKind::Expression).count(), 2);
        assert_eq!(find_item("a_crown").unwrap().req_level, 5);
    }

    #[test]
    fn question_displays_factors() {
        let q = Question {
            factor_a: 7,
            factor_b: 3,
            correct_answer: 21,
            options: [21, 19, 23, 24],
        };
        assert_eq!(q.to_string(), "7 x 3");
    }

    proptest! {
        #[test]
        fn level_tracks_hundreds(xp in 0u32..1_000_000) {
            let level = level_for_xp(xp);
            prop_assert_eq!(level, xp / 100 + 1);
            prop_assert!((level - 1) * XP_PER_LEVEL <= xp);
            prop_assert!(xp < level * XP_PER_LEVEL);
        }
    }
}
