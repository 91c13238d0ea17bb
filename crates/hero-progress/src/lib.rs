#![deny(warnings)]

//! Progression engine: session rating, rewards and unlocks for Tabelline Hero.
//!
//! Every operation here is a pure function from an old [`Profile`] to a new
//! one. Callers replace their profile wholesale with the result, so a
//! settlement is either applied completely or not at all.
//!
//! - Star rating of a finished session
//! - Experience, level and coin rewards
//! - Per-table best results with max semantics
//! - Unlock propagation to the next table and to the mixed challenge

pub mod shop;

pub use shop::{buy_item, change_theme, equip_item, item_status, ItemStatus, ShopError};

use hero_core::{
    level_for_xp, Profile, TableId, MAX_STARS, MIXED_UNLOCK_STARS, TOTAL_QUESTIONS,
};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Experience awarded per correct answer.
pub const XP_PER_CORRECT: u32 = 10;
/// Coins awarded per correct answer.
pub const COINS_PER_CORRECT: u32 = 2;
/// Weight of the speed bonus in the experience formula.
///
/// Session timing is not tracked yet, so the bonus is switched off. The hook
/// stays in [`session_xp`] so enabling it is a one-line change.
pub const TIME_BONUS_WEIGHT: u32 = 0;
/// Minimum stars on table k that unlock table k+1.
pub const NEXT_TABLE_STARS: u8 = 2;

/// Star rating for `score` correct answers out of `total`.
///
/// 3 stars at 90% or more, 2 at 60% or more, 1 for any correct answer,
/// otherwise 0. Compared in integers so the 0.6 and 0.9 boundaries are exact.
///
/// Example:
/// assert_eq!(rate_session(6, 10), 2);
pub fn rate_session(score: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score.min(total));
    let total = u64::from(total);
    if score * 10 >= total * 9 {
        3
    } else if score * 10 >= total * 6 {
        2
    } else if score > 0 {
        1
    } else {
        0
    }
}

/// Speed bonus for a session that took `elapsed`: half of the seconds saved
/// under 100.
pub fn time_bonus(elapsed: Duration) -> u32 {
    let secs = u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX);
    100u32.saturating_sub(secs) / 2
}

/// Experience earned by a session.
///
/// `elapsed` feeds the speed bonus, which is currently weighted by zero.
pub fn session_xp(score: u32, elapsed: Option<Duration>) -> u32 {
    let bonus = elapsed.map(time_bonus).unwrap_or(0);
    score * XP_PER_CORRECT + bonus * TIME_BONUS_WEIGHT
}

/// Coins earned by a session.
pub fn session_coins(score: u32) -> u32 {
    score * COINS_PER_CORRECT
}

/// What a settled session changed, for display.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub table: Option<TableId>,
    pub xp_gained: u32,
    pub coins_gained: u32,
    pub previous_level: u32,
    pub level: u32,
    /// Stars kept for the table after max semantics.
    pub stars: u8,
    /// True when the session beat the previous best score or star rating.
    pub new_best: bool,
    /// Tables whose lock was lifted by this session.
    pub unlocked: Vec<TableId>,
}

impl SessionOutcome {
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}

/// Apply a finished session to `profile` and return the updated profile.
///
/// A table with no progress entry leaves the profile unchanged.
pub fn apply_session_result(profile: &Profile, table: TableId, score: u32, stars: u8) -> Profile {
    settle_session(profile, table, score, stars).0
}

/// Like [`apply_session_result`], also reporting what changed.
///
/// `score` is clamped to the session length and `stars` to the maximum rating.
pub fn settle_session(
    profile: &Profile,
    table: TableId,
    score: u32,
    stars: u8,
) -> (Profile, SessionOutcome) {
    let Some(old) = profile.table(table).copied() else {
        debug!(%table, "no progress entry, session ignored");
        return (
            profile.clone(),
            SessionOutcome {
                previous_level: profile.level,
                level: profile.level,
                ..SessionOutcome::default()
            },
        );
    };
    let score = score.min(TOTAL_QUESTIONS);
    let stars = stars.min(MAX_STARS);

    let mut next = profile.clone();
    let xp_gained = session_xp(score, None);
    let coins_gained = session_coins(score);
    next.xp = profile.xp.saturating_add(xp_gained);
    next.level = level_for_xp(next.xp);
    next.coins = profile.coins.saturating_add(coins_gained);

    let best_stars = old.stars.max(stars);
    let best_score = old.high_score.max(score);
    if let Some(entry) = next.progress.get_mut(&table) {
        entry.stars = best_stars;
        entry.high_score = best_score;
    }

    let mut unlocked = Vec::new();
    if best_stars >= NEXT_TABLE_STARS {
        if let Some(following) = table.next() {
            if unlock(&mut next, following) {
                unlocked.push(following);
            }
        }
    }
    if next.numeric_stars() >= MIXED_UNLOCK_STARS && unlock(&mut next, TableId::Mixed) {
        unlocked.push(TableId::Mixed);
    }

    let outcome = SessionOutcome {
        table: Some(table),
        xp_gained,
        coins_gained,
        previous_level: profile.level,
        level: next.level,
        stars: best_stars,
        new_best: best_stars > old.stars || best_score > old.high_score,
        unlocked,
    };
    info!(
        %table,
        score,
        stars,
        xp = next.xp,
        level = next.level,
        coins = next.coins,
        unlocked = outcome.unlocked.len(),
        "session settled"
    );
    (next, outcome)
}

/// Open `table` if it exists and is locked. Returns true if the lock changed.
fn unlock(profile: &mut Profile, table: TableId) -> bool {
    match profile.progress.get_mut(&table) {
        Some(p) if !p.is_unlocked => {
            p.is_unlocked = true;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hero_core::{validate_profile, ThemeId};
    use proptest::prelude::*;

    fn stars_of(p: &Profile, n: u8) -> u8 {
        p.table(TableId::Number(n)).unwrap().stars
    }

    #[test]
    fn rating_boundaries() {
        assert_eq!(rate_session(10, 10), 3);
        assert_eq!(rate_session(9, 10), 3);
        assert_eq!(rate_session(8, 10), 2);
        assert_eq!(rate_session(7, 10), 2);
        assert_eq!(rate_session(6, 10), 2);
        assert_eq!(rate_session(5, 10), 1);
        assert_eq!(rate_session(1, 10), 1);
        assert_eq!(rate_session(0, 10), 0);
        assert_eq!(rate_session(3, 0), 0);
    }

    #[test]
    fn rating_handles_huge_totals() {
        assert_eq!(rate_session(u32::MAX, u32::MAX), 3);
        assert_eq!(rate_session(u32::MAX / 10 * 6, u32::MAX / 10), 3);
        assert_eq!(rate_session(u32::MAX / 2, u32::MAX), 1);
        assert_eq!(rate_session(0, u32::MAX), 0);
    }

    #[test]
    fn first_session_on_table_one() {
        let p = Profile::new("Giulia", ThemeId::Wizard);
        let (next, outcome) = settle_session(&p, TableId::Number(1), 9, rate_session(9, 10));
        assert_eq!(stars_of(&next, 1), 3);
        assert_eq!(next.table(TableId::Number(1)).unwrap().high_score, 9);
        assert_eq!((next.xp, next.level, next.coins), (90, 1, 18));
        assert!(next.is_unlocked(TableId::Number(2)));
        // Table 2 starts open, so nothing new is reported.
        assert!(outcome.unlocked.is_empty());
        assert!(outcome.new_best);
        assert!(!outcome.leveled_up());
        validate_profile(&next).unwrap();
    }

    #[test]
    fn level_up_crosses_hundred() {
        let mut p = Profile::default();
        p.xp = 95;
        let (next, outcome) = settle_session(&p, TableId::Number(2), 1, 1);
        assert_eq!(next.xp, 105);
        assert_eq!(next.level, 2);
        assert!(outcome.leveled_up());
    }

    #[test]
    fn best_results_never_drop() {
        let p = Profile::default();
        let p = apply_session_result(&p, TableId::Number(5), 8, 2);
        let p = apply_session_result(&p, TableId::Number(5), 5, 1);
        let t = p.table(TableId::Number(5)).unwrap();
        assert_eq!((t.stars, t.high_score), (2, 8));
        assert_eq!(p.xp, 130);
        assert_eq!(p.coins, 26);
    }

    #[test]
    fn two_stars_unlock_next_table() {
        let mut p = Profile::default();
        p.progress.get_mut(&TableId::Number(3)).unwrap().is_unlocked = true;
        assert!(!p.is_unlocked(TableId::Number(4)));
        let (next, outcome) = settle_session(&p, TableId::Number(3), 7, 2);
        assert!(next.is_unlocked(TableId::Number(4)));
        assert_eq!(outcome.unlocked, vec![TableId::Number(4)]);
    }

    #[test]
    fn one_star_keeps_next_table_locked() {
        let p = Profile::default();
        let next = apply_session_result(&p, TableId::Number(2), 4, 1);
        assert!(!next.is_unlocked(TableId::Number(3)));
    }

    #[test]
    fn earlier_two_stars_still_unlock() {
        let mut p = Profile::default();
        p.progress.get_mut(&TableId::Number(2)).unwrap().stars = 2;
        let next = apply_session_result(&p, TableId::Number(2), 1, 1);
        assert!(next.is_unlocked(TableId::Number(3)));
    }

    #[test]
    fn table_ten_has_no_successor() {
        let p = Profile::default();
        let (next, outcome) = settle_session(&p, TableId::Number(10), 10, 3);
        assert_eq!(stars_of(&next, 10), 3);
        assert!(outcome.unlocked.is_empty());
        assert_eq!(next.progress.len(), p.progress.len());
    }

    #[test]
    fn mixed_unlocks_at_fifteen_stars() {
        let mut p = Profile::default();
        // 3+3+3+3 = 12 stars already earned
        for n in 1..=4 {
            p.progress.get_mut(&TableId::Number(n)).unwrap().stars = 3;
        }
        let almost = apply_session_result(&p, TableId::Number(5), 6, 2);
        assert_eq!(almost.numeric_stars(), 14);
        assert!(!almost.is_unlocked(TableId::Mixed));

        let (done, outcome) = settle_session(&almost, TableId::Number(6), 1, 1);
        assert_eq!(done.numeric_stars(), 15);
        assert!(done.is_unlocked(TableId::Mixed));
        assert!(outcome.unlocked.contains(&TableId::Mixed));
    }

    #[test]
    fn mixed_stars_do_not_count_towards_mixed_unlock() {
        let mut p = Profile::default();
        for n in 1..=4 {
            p.progress.get_mut(&TableId::Number(n)).unwrap().stars = 3;
        }
        p.progress.get_mut(&TableId::Mixed).unwrap().stars = 3;
        let next = apply_session_result(&p, TableId::Number(5), 1, 1);
        assert_eq!(next.numeric_stars(), 13);
        assert!(!next.is_unlocked(TableId::Mixed));
    }

    #[test]
    fn unknown_table_is_a_noop() {
        let mut p = Profile::default();
        p.progress.remove(&TableId::Number(7));
        let (next, outcome) = settle_session(&p, TableId::Number(7), 10, 3);
        assert_eq!(next, p);
        assert_eq!(outcome.xp_gained, 0);
        assert_eq!(outcome.table, None);
    }

    #[test]
    fn inputs_are_clamped() {
        let p = Profile::default();
        let next = apply_session_result(&p, TableId::Number(1), 50, 9);
        assert_eq!(next.xp, 100);
        assert_eq!(next.coins, 20);
        assert_eq!(stars_of(&next, 1), 3);
        assert_eq!(next.table(TableId::Number(1)).unwrap().high_score, 10);
    }

    #[test]
    fn time_bonus_is_inert() {
        assert_eq!(time_bonus(Duration::from_secs(40)), 30);
        assert_eq!(time_bonus(Duration::from_secs(400)), 0);
        assert_eq!(session_xp(7, Some(Duration::from_secs(10))), 70);
        assert_eq!(session_xp(7, None), 70);
    }

    proptest! {
        #[test]
        fn rewards_scale_with_score(score in 0u32..=10, xp in 0u32..10_000, coins in 0u32..10_000) {
            let mut p = Profile::default();
            p.xp = xp;
            p.level = level_for_xp(xp);
            p.coins = coins;
            let stars = rate_session(score, TOTAL_QUESTIONS);
            let (next, outcome) = settle_session(&p, TableId::Number(1), score, stars);
            prop_assert_eq!(outcome.xp_gained, score * 10);
            prop_assert_eq!(outcome.coins_gained, score * 2);
            prop_assert_eq!(next.xp, xp + score * 10);
            prop_assert_eq!(next.coins, coins + score * 2);
            prop_assert_eq!(next.level, next.xp / 100 + 1);
        }

        #[test]
        fn rating_is_monotonic(a in 0u32..=10, b in 0u32..=10) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(rate_session(lo, 10) <= rate_session(hi, 10));
        }

        #[test]
        fn progress_never_decreases(first in 0u32..=10, second in 0u32..=10, table in 1u8..=10) {
            let t = TableId::Number(table);
            let p = Profile::default();
            let a = apply_session_result(&p, t, first, rate_session(first, 10));
            let b = apply_session_result(&a, t, second, rate_session(second, 10));
            let (pa, pb) = (a.table(t).unwrap(), b.table(t).unwrap());
            prop_assert!(pb.stars >= pa.stars);
            prop_assert!(pb.high_score >= pa.high_score);
            prop_assert_eq!(pb.high_score, first.max(second));
            for id in TableId::all() {
                prop_assert!(!a.is_unlocked(id) || b.is_unlocked(id));
            }
        }
    }
}
