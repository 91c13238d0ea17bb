//! Application controller: owns the learner profile and its store.
//!
//! Every action computes a new profile and hands it to [`App::replace`], which
//! persists it before swapping it in. Nothing else mutates the profile.

use anyhow::{anyhow, bail, Result};
use hero_core::{Profile, TableId, ThemeId};
use hero_progress::{buy_item, change_theme, equip_item, settle_session, SessionOutcome};
use hero_quiz::SessionResult;
use persistence::ProfileStore;
use tracing::info;

pub struct App {
    store: ProfileStore,
    profile: Option<Profile>,
}

impl App {
    /// Load the saved profile, if any.
    pub fn open(store: ProfileStore) -> Result<Self> {
        let profile = store.load()?;
        Ok(Self { store, profile })
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// The loaded profile, or an error telling the user to onboard first.
    pub fn require(&self) -> Result<&Profile> {
        self.profile
            .as_ref()
            .ok_or_else(|| anyhow!("no learner yet, run `tabelline new <name>` first"))
    }

    /// Persist `next` and make it the current profile.
    pub fn replace(&mut self, next: Profile) -> Result<()> {
        self.store.save(&next)?;
        self.profile = Some(next);
        Ok(())
    }

    /// Create the learner. Refuses to overwrite an existing one.
    pub fn onboard(&mut self, name: &str, theme: ThemeId) -> Result<&Profile> {
        let name = name.trim();
        if name.is_empty() {
            bail!("name must not be empty");
        }
        if let Some(p) = &self.profile {
            bail!("learner {:?} already exists", p.name);
        }
        info!(name, %theme, "new learner");
        self.replace(Profile::new(name, theme))?;
        self.require()
    }

    /// Check that `table` can be played now.
    pub fn ensure_playable(&self, table: TableId) -> Result<()> {
        let profile = self.require()?;
        if !profile.is_unlocked(table) {
            bail!("table {table} is still locked");
        }
        Ok(())
    }

    /// Record a finished session.
    pub fn complete_session(&mut self, result: &SessionResult) -> Result<SessionOutcome> {
        let (next, outcome) = settle_session(self.require()?, result.table, result.score, result.stars);
        self.replace(next)?;
        Ok(outcome)
    }

    pub fn buy(&mut self, item_id: &str) -> Result<()> {
        let next = buy_item(self.require()?, item_id)?;
        self.replace(next)
    }

    pub fn equip(&mut self, item_id: &str) -> Result<()> {
        let next = equip_item(self.require()?, item_id)?;
        self.replace(next)
    }

    pub fn set_theme(&mut self, theme: ThemeId) -> Result<()> {
        let next = change_theme(self.require()?, theme);
        self.replace(next)
    }
}
