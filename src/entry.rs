//! Core data structures for the daybook application.
//!
//! This module contains the journal entry record, the mood tag attached to
//! it by an external analysis step, and identity generation for new entries.
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Sentiment classification attached to an entry by an external analysis
/// step. The store treats it as opaque metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mood::Positive => write!(f, "positive"),
            Mood::Neutral => write!(f, "neutral"),
            Mood::Negative => write!(f, "negative"),
        }
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Mood::Positive),
            "neutral" => Ok(Mood::Neutral),
            "negative" => Ok(Mood::Negative),
            other => Err(format!(
                "invalid mood '{}': expected positive, neutral, or negative",
                other
            )),
        }
    }
}

/// Represents a single journal entry in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Unique identifier for the entry
    pub id: String,
    /// Entry body in Markdown format
    pub content: String,
    /// Optional mood tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    /// Confidence for the mood tag, in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_score: Option<f64>,
    /// Optional derived summary text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// When the entry was created, epoch milliseconds
    pub created_at: i64,
    /// Last modification time, epoch milliseconds
    pub updated_at: i64,
}

impl Entry {
    /// Creates a new in-memory entry with a fresh id and the given content.
    /// `created_at` and `updated_at` are both set to `now`. Nothing is
    /// persisted until the entry is saved.
    pub fn new_at(content: impl Into<String>, now: i64) -> Self {
        Entry {
            id: generate_id(),
            content: content.into(),
            mood: None,
            mood_score: None,
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a new in-memory entry stamped with the system clock.
    pub fn new(content: impl Into<String>) -> Self {
        Self::new_at(content, Utc::now().timestamp_millis())
    }
}

/// Generates a unique identifier for a new entry.
///
/// Current timestamp concatenated with a short random suffix. Not
/// cryptographically secure; collision probability is negligible for
/// single-device, human-paced usage.
pub fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();

    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        suffix.to_lowercase()
    )
}

/// Partial update merged over an existing entry. The entry's `id` and
/// `created_at` cannot be expressed here and therefore never change.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub mood_score: Option<f64>,
    pub summary: Option<String>,
}

impl EntryPatch {
    /// Merges the present fields over `entry`, leaving absent fields as
    /// they were. Timestamps are the store's responsibility.
    pub fn apply(&self, entry: &mut Entry) {
        if let Some(content) = &self.content {
            entry.content = content.clone();
        }
        if let Some(mood) = self.mood {
            entry.mood = Some(mood);
        }
        if let Some(score) = self.mood_score {
            entry.mood_score = Some(score);
        }
        if let Some(summary) = &self.summary {
            entry.summary = Some(summary.clone());
        }
    }

    /// True when no field is present; applying an empty patch only bumps
    /// `updated_at`.
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.mood.is_none()
            && self.mood_score.is_none()
            && self.summary.is_none()
    }
}
