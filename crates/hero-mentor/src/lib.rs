#![deny(warnings)]

//! Themed mentor messages backed by an external text generator.
//!
//! A message request never fails from the caller's point of view: transport
//! errors, bad responses and timeouts all turn into the static fallback line.
//! Responses that arrive after a newer request was issued are discarded.

pub mod client;
pub mod config;
pub mod prompt;

pub use client::{generator_from_config, GeminiClient, OfflineGenerator};
pub use config::MentorConfig;
pub use prompt::{build_request, MentorRequest, DEFAULT_TEMPERATURE};

use async_trait::async_trait;
use hero_core::{MentorEvent, ThemeConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Shown when the generator answers with nothing.
pub const DEFAULT_ACCOLADE: &str = "Benfatto!";

/// Errors from a text-generation collaborator.
#[derive(Debug, Error, PartialEq)]
pub enum MentorError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("no answer within {0:?}")]
    Timeout(Duration),
    #[error("invalid mentor config: {0}")]
    Config(String),
    #[error("mentor is offline")]
    Offline,
}

/// Something that turns a persona and a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &MentorRequest) -> Result<String, MentorError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    async fn generate(&self, request: &MentorRequest) -> Result<String, MentorError> {
        (**self).generate(request).await
    }
}

/// The line used whenever the generator cannot help.
pub fn fallback_message(user_name: &str, theme: &ThemeConfig) -> String {
    format!("Bravo {user_name}! Continua così! {}", theme.mentor_emoji)
}

/// Ask `generator` for a message about `event`, bounded by `timeout`.
///
/// Returns the generated text trimmed, [`DEFAULT_ACCOLADE`] if it is empty,
/// or [`fallback_message`] on any failure.
pub async fn get_mentor_message<G: TextGenerator + ?Sized>(
    generator: &G,
    event: &MentorEvent,
    user_name: &str,
    theme: &ThemeConfig,
    timeout: Duration,
) -> String {
    let request = build_request(event, user_name, theme);
    deliver(generator, &request, event, user_name, theme, timeout).await
}

async fn deliver<G: TextGenerator + ?Sized>(
    generator: &G,
    request: &MentorRequest,
    event: &MentorEvent,
    user_name: &str,
    theme: &ThemeConfig,
    timeout: Duration,
) -> String {
    let result = tokio::time::timeout(timeout, generator.generate(request))
        .await
        .unwrap_or(Err(MentorError::Timeout(timeout)));
    match result {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                DEFAULT_ACCOLADE.to_string()
            } else {
                text.to_string()
            }
        }
        Err(e) => {
            warn!(event = event.kind(), error = %e, "mentor fell back to static message");
            fallback_message(user_name, theme)
        }
    }
}

/// Identifies one mentor request against the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// The text currently on screen, guarded by a generation counter.
///
/// Every request takes a [`Ticket`]; only the holder of the newest ticket may
/// replace the text.
#[derive(Debug)]
pub struct MentorFeed {
    latest: AtomicU64,
    text: Mutex<String>,
}

impl MentorFeed {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            latest: AtomicU64::new(0),
            text: Mutex::new(initial.into()),
        }
    }

    /// Start a new request. Earlier tickets become stale.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Show `text` if `ticket` is still the newest. Returns whether it was shown.
    pub fn publish(&self, ticket: Ticket, text: String) -> bool {
        let mut guard = self.text.lock().unwrap_or_else(|e| e.into_inner());
        if ticket.0 != self.latest.load(Ordering::SeqCst) {
            debug!(ticket = ticket.0, "discarding stale mentor response");
            return false;
        }
        *guard = text;
        true
    }

    /// Replace the text directly, superseding any request in flight.
    pub fn replace(&self, text: impl Into<String>) {
        let ticket = self.issue();
        self.publish(ticket, text.into());
    }

    pub fn current(&self) -> String {
        self.text.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for MentorFeed {
    fn default() -> Self {
        Self::new("")
    }
}

/// A configured mentor: generator, sampling settings and the display feed.
pub struct Mentor<G> {
    generator: G,
    temperature: f32,
    timeout: Duration,
    feed: Arc<MentorFeed>,
}

impl<G: TextGenerator> Mentor<G> {
    pub fn new(generator: G, config: &MentorConfig) -> Self {
        Self {
            generator,
            temperature: config.temperature,
            timeout: config.timeout(),
            feed: Arc::new(MentorFeed::default()),
        }
    }

    pub fn feed(&self) -> Arc<MentorFeed> {
        Arc::clone(&self.feed)
    }

    /// Produce a message without touching the feed.
    pub async fn message(&self, event: &MentorEvent, user_name: &str, theme: &ThemeConfig) -> String {
        let mut request = build_request(event, user_name, theme);
        request.temperature = self.temperature;
        deliver(&self.generator, &request, event, user_name, theme, self.timeout).await
    }

    /// Produce a message and show it unless a newer request was issued
    /// meanwhile. Returns the text if it was shown.
    pub async fn say(
        &self,
        event: &MentorEvent,
        user_name: &str,
        theme: &ThemeConfig,
    ) -> Option<String> {
        let ticket = self.feed.issue();
        let text = self.message(event, user_name, theme).await;
        self.feed.publish(ticket, text.clone()).then_some(text)
    }
}
