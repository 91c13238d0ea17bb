//! Static reference data: mentor themes and the cosmetic shop.
//!
//! Nothing here is persisted. Themes are resolved through an exhaustive
//! `match` so adding a variant forces every lookup to be updated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// Identifier of a selectable world/mentor theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    /// Magic school with a wizard mentor.
    #[default]
    Wizard,
    /// Enchanted castle with a fairy mentor.
    Princess,
    /// Space base with a robot mentor.
    Robot,
    /// Stadium with a team captain mentor.
    Soccer,
}

/// Presentation data for a theme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThemeConfig {
    /// Theme this config belongs to.
    pub id: ThemeId,
    /// World name shown to the learner.
    pub name: &'static str,
    /// Display name of the mentor persona.
    pub mentor_name: &'static str,
    /// Emoji signature of the mentor.
    pub mentor_emoji: &'static str,
    /// Symbol printed next to coin amounts.
    pub coin_symbol: &'static str,
    /// Avatar colour given to a learner who picks this theme at onboarding.
    pub default_avatar_color: &'static str,
}

static WIZARD: ThemeConfig = ThemeConfig {
    id: ThemeId::Wizard,
    name: "Scuola di Magia",
    mentor_name: "Prof. Albus",
    mentor_emoji: "🧙‍♂️",
    coin_symbol: "✨",
    default_avatar_color: "bg-purple-500",
};

static PRINCESS: ThemeConfig = ThemeConfig {
    id: ThemeId::Princess,
    name: "Castello Incantato",
    mentor_name: "Fata Turchina",
    mentor_emoji: "👸",
    coin_symbol: "👑",
    default_avatar_color: "bg-pink-400",
};

static ROBOT: ThemeConfig = ThemeConfig {
    id: ThemeId::Robot,
    name: "Base Spaziale",
    mentor_name: "C1-P8",
    mentor_emoji: "🤖",
    coin_symbol: "🔋",
    default_avatar_color: "bg-cyan-500",
};

static SOCCER: ThemeConfig = ThemeConfig {
    id: ThemeId::Soccer,
    name: "Stadio dei Campioni",
    mentor_name: "Il Capitano",
    mentor_emoji: "⚽",
    coin_symbol: "🏆",
    default_avatar_color: "bg-green-500",
};

impl ThemeId {
    /// All themes in menu order.
    pub const ALL: [ThemeId; 4] = [
        ThemeId::Wizard,
        ThemeId::Princess,
        ThemeId::Robot,
        ThemeId::Soccer,
    ];

    /// Static configuration for this theme.
    pub fn config(self) -> &'static ThemeConfig {
        match self {
            ThemeId::Wizard => &WIZARD,
            ThemeId::Princess => &PRINCESS,
            ThemeId::Robot => &ROBOT,
            ThemeId::Soccer => &SOCCER,
        }
    }

    /// Lowercase identifier as stored in the profile blob.
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeId::Wizard => "wizard",
            ThemeId::Princess => "princess",
            ThemeId::Robot => "robot",
            ThemeId::Soccer => "soccer",
        }
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownTheme(s.to_string()))
    }
}

/// Avatar slot a shop item fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Color,
    Accessory,
    Expression,
}

/// A purchasable cosmetic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopItem {
    /// Stable identifier recorded in `Profile::unlocked_items`.
    pub id: &'static str,
    /// Avatar slot.
    pub kind: ItemKind,
    /// Display name.
    pub name: &'static str,
    /// Price in coins; zero means free and owned by everyone.
    pub cost: u32,
    /// Value written into the avatar slot when equipped.
    pub value: &'static str,
    /// Minimum learner level required to buy.
    pub req_level: u32,
}

const fn item(
    id: &'static str,
    kind: ItemKind,
    name: &'static str,
    cost: u32,
    value: &'static str,
    req_level: u32,
) -> ShopItem {
    ShopItem {
        id,
        kind,
        name,
        cost,
        value,
        req_level,
    }
}

/// The full shop catalog.
pub static SHOP_ITEMS: &[ShopItem] = &[
    item("c_orange", ItemKind::Color, "Arancio", 0, "bg-orange-400", 0),
    item("c_blue", ItemKind::Color, "Blu", 50, "bg-blue-500", 2),
    item("c_purple", ItemKind::Color, "Viola", 100, "bg-purple-500", 3),
    item("c_green", ItemKind::Color, "Verde", 150, "bg-emerald-500", 4),
    item("c_pink", ItemKind::Color, "Rosa", 200, "bg-pink-400", 5),
    item("c_red", ItemKind::Color, "Rosso", 250, "bg-red-600", 6),
    item("c_cyan", ItemKind::Color, "Ciano", 120, "bg-cyan-500", 4),
    item("a_none", ItemKind::Accessory, "Nessuno", 0, "", 0),
    item("a_glasses", ItemKind::Accessory, "Occhiali", 60, "👓", 2),
    item("a_crown", ItemKind::Accessory, "Corona", 120, "👑", 5),
    item("a_hat", ItemKind::Accessory, "Cappello", 80, "🧢", 3),
    item("a_astro", ItemKind::Accessory, "Casco", 150, "🧑‍🚀", 6),
    item("a_mask", ItemKind::Accessory, "Maschera", 100, "🎭", 4),
    item("a_wand", ItemKind::Accessory, "Bacchetta", 200, "🪄", 7),
    item("a_ball", ItemKind::Accessory, "Pallone", 90, "⚽", 3),
    item("e_smile", ItemKind::Expression, "Sorriso", 0, "aa", 0),
    item("e_cool", ItemKind::Expression, "Figo", 50, "bb", 2),
];

/// Look up a catalog item by id.
pub fn find_item(id: &str) -> Option<&'static ShopItem> {
    SHOP_ITEMS.iter().find(|i| i.id == id)
}

/// Catalog items for one avatar slot, in catalog order.
pub fn items_of(kind: ItemKind) -> impl Iterator<Item = &'static ShopItem> {
    SHOP_ITEMS.iter().filter(move |i| i.kind == kind)
}
