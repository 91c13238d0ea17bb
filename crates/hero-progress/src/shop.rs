//! Cosmetic shop: purchases, equipping and theme switching.
//!
//! Preconditions are checked explicitly and reported as [`ShopError`]; the
//! profile is only replaced when the action succeeds.

use hero_core::{find_item, ItemKind, Profile, ShopItem, ThemeId};
use thiserror::Error;
use tracing::info;

/// Errors produced by shop actions.
#[derive(Debug, Error, PartialEq)]
pub enum ShopError {
    #[error("unknown shop item: {0}")]
    UnknownItem(String),
    #[error("item {0} is already owned")]
    AlreadyOwned(String),
    /// Learner level below the item requirement.
    #[error("item {id} requires level {required}, learner is level {level}")]
    LevelTooLow { id: String, required: u32, level: u32 },
    #[error("item {id} costs {cost} coins, learner has {coins}")]
    NotEnoughCoins { id: String, cost: u32, coins: u32 },
    #[error("item {0} must be bought before it can be equipped")]
    NotOwned(String),
}

/// How an item looks to a given learner in the shop listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemStatus {
    /// Owned and currently worn.
    Equipped,
    /// Owned, can be equipped.
    Owned,
    /// Can be bought now.
    Buyable,
    /// Level requirement not met.
    LevelLocked,
    /// Level is fine but coins are short.
    TooExpensive,
}

fn is_equipped(profile: &Profile, item: &ShopItem) -> bool {
    let slot = match item.kind {
        ItemKind::Color => &profile.avatar.base_color,
        ItemKind::Accessory => &profile.avatar.accessory,
        ItemKind::Expression => &profile.avatar.expression,
    };
    slot == item.value
}

/// Listing status of `item` for `profile`.
pub fn item_status(profile: &Profile, item: &ShopItem) -> ItemStatus {
    if profile.owns(item.id) {
        if is_equipped(profile, item) {
            ItemStatus::Equipped
        } else {
            ItemStatus::Owned
        }
    } else if profile.level < item.req_level {
        ItemStatus::LevelLocked
    } else if profile.coins < item.cost {
        ItemStatus::TooExpensive
    } else {
        ItemStatus::Buyable
    }
}

/// Buy `item_id`, spending coins and recording it as unlocked.
pub fn buy_item(profile: &Profile, item_id: &str) -> Result<Profile, ShopError> {
    let item = find_item(item_id).ok_or_else(|| ShopError::UnknownItem(item_id.to_string()))?;
    if profile.owns(item.id) {
        return Err(ShopError::AlreadyOwned(item.id.to_string()));
    }
    if profile.level < item.req_level {
        return Err(ShopError::LevelTooLow {
            id: item.id.to_string(),
            required: item.req_level,
            level: profile.level,
        });
    }
    let coins = profile
        .coins
        .checked_sub(item.cost)
        .ok_or_else(|| ShopError::NotEnoughCoins {
            id: item.id.to_string(),
            cost: item.cost,
            coins: profile.coins,
        })?;
    let mut next = profile.clone();
    next.coins = coins;
    next.unlocked_items.push(item.id.to_string());
    info!(item = item.id, cost = item.cost, coins, "item bought");
    Ok(next)
}

/// Put an owned item on the avatar slot it belongs to.
pub fn equip_item(profile: &Profile, item_id: &str) -> Result<Profile, ShopError> {
    let item = find_item(item_id).ok_or_else(|| ShopError::UnknownItem(item_id.to_string()))?;
    if !profile.owns(item.id) {
        return Err(ShopError::NotOwned(item.id.to_string()));
    }
    let mut next = profile.clone();
    let slot = match item.kind {
        ItemKind::Color => &mut next.avatar.base_color,
        ItemKind::Accessory => &mut next.avatar.accessory,
        ItemKind::Expression => &mut next.avatar.expression,
    };
    *slot = item.value.to_string();
    Ok(next)
}

/// Switch the learner to another world. Progress and cosmetics are kept.
pub fn change_theme(profile: &Profile, theme: ThemeId) -> Profile {
    Profile {
        theme_id: theme,
        ..profile.clone()
    }
}
