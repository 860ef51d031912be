//! Scenario catalog: the scripted data the engine plays back.
//!
//! Each step carries an explicit [`Outcome`] marker; the engine never looks at
//! message text to decide a transition.

use std::collections::BTreeMap;
use std::path::Path;

use growthos_core::{Mode, Sender};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Built-in catalog reproducing the demo scripts.
const BUILTIN_CATALOG: &str = include_str!("catalog.toml");

/// Stage effect of a scripted step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// No stage change.
    #[default]
    None,
    /// Conversation ends with a booking.
    Book,
    /// Conversation ends with the lead lost.
    Lose,
    /// Retention marks the lead retained.
    Retain,
    /// Retention upsells the lead.
    Upsell,
}

/// One message in a conversation script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStep {
    /// Scripted seconds to wait before this message.
    pub delay_secs: u64,
    /// Author.
    pub sender: Sender,
    /// Body.
    pub text: String,
    /// Stage effect.
    #[serde(default)]
    pub outcome: Outcome,
}

/// Ordered conversation for one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationScript {
    /// Whether delays are capped at run time.
    #[serde(default)]
    pub compress: bool,
    /// Steps in playback order.
    pub steps: Vec<ConversationStep>,
}

/// One retention check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionStep {
    /// Program day.
    pub day: u32,
    /// Body.
    pub text: String,
    /// Stage effect.
    #[serde(default)]
    pub outcome: Outcome,
}

/// Ordered retention check-ins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionScript {
    /// Steps in playback order.
    pub steps: Vec<RetentionStep>,
}

/// On-disk shape; mode keys are parsed after deserialization.
#[derive(Deserialize)]
struct RawCatalog {
    conversation: BTreeMap<String, ConversationScript>,
    retention: RetentionScript,
}

/// Immutable set of scripts, keyed by mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioCatalog {
    conversations: BTreeMap<Mode, ConversationScript>,
    retention: RetentionScript,
}

impl ScenarioCatalog {
    /// Build and validate a catalog from parts.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidCatalog`] if a script is empty or its
    /// outcome markers are inconsistent.
    pub fn new(
        conversations: BTreeMap<Mode, ConversationScript>,
        retention: RetentionScript,
    ) -> EngineResult<Self> {
        let catalog = Self {
            conversations,
            retention,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The embedded demo catalog.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded document is broken.
    pub fn builtin() -> EngineResult<Self> {
        Self::from_toml_str(BUILTIN_CATALOG, "<builtin>")
    }

    /// Load a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::CatalogRead {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&contents, &path.display().to_string())
    }

    /// Parse a catalog document. `origin` names it in errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed or validated.
    pub fn from_toml_str(doc: &str, origin: &str) -> EngineResult<Self> {
        let raw: RawCatalog = toml::from_str(doc).map_err(|e| EngineError::CatalogParse {
            path: origin.to_owned(),
            source: e,
        })?;

        let mut conversations = BTreeMap::new();
        for (key, script) in raw.conversation {
            let mode = key
                .parse::<Mode>()
                .map_err(|e| EngineError::InvalidCatalog(e.to_string()))?;
            conversations.insert(mode, script);
        }

        Self::new(conversations, raw.retention)
    }

    /// Conversation script for `mode`, if the catalog has one.
    #[must_use]
    pub fn conversation(&self, mode: Mode) -> Option<&ConversationScript> {
        self.conversations.get(&mode)
    }

    /// The retention script.
    #[must_use]
    pub fn retention(&self) -> &RetentionScript {
        &self.retention
    }

    /// Modes with a conversation script.
    pub fn modes(&self) -> impl Iterator<Item = Mode> + '_ {
        self.conversations.keys().copied()
    }

    fn validate(&self) -> EngineResult<()> {
        if self.conversations.is_empty() {
            return Err(EngineError::InvalidCatalog(
                "at least one conversation script is required".into(),
            ));
        }

        for (mode, script) in &self.conversations {
            validate_conversation(*mode, script)?;
        }
        validate_retention(&self.retention)
    }
}

fn validate_conversation(mode: Mode, script: &ConversationScript) -> EngineResult<()> {
    let Some(last) = script.steps.len().checked_sub(1) else {
        return Err(EngineError::InvalidCatalog(format!(
            "conversation '{mode}' has no steps"
        )));
    };

    for (index, step) in script.steps.iter().enumerate() {
        match step.outcome {
            Outcome::None => {},
            Outcome::Book | Outcome::Lose if index == last => {},
            Outcome::Book | Outcome::Lose => {
                return Err(EngineError::InvalidCatalog(format!(
                    "conversation '{mode}' step {index}: terminal outcome must be on the last step"
                )));
            },
            Outcome::Retain | Outcome::Upsell => {
                return Err(EngineError::InvalidCatalog(format!(
                    "conversation '{mode}' step {index}: retention outcome in a conversation"
                )));
            },
        }
    }
    Ok(())
}

fn validate_retention(script: &RetentionScript) -> EngineResult<()> {
    if script.steps.is_empty() {
        return Err(EngineError::InvalidCatalog("retention has no steps".into()));
    }

    let mut retained = false;
    let mut upsold = false;
    for (index, step) in script.steps.iter().enumerate() {
        match step.outcome {
            Outcome::None => {},
            Outcome::Retain if !retained && !upsold => retained = true,
            Outcome::Upsell if retained && !upsold => upsold = true,
            Outcome::Retain | Outcome::Upsell => {
                return Err(EngineError::InvalidCatalog(format!(
                    "retention step {index}: outcomes must be at most one retain followed by at most one upsell"
                )));
            },
            Outcome::Book | Outcome::Lose => {
                return Err(EngineError::InvalidCatalog(format!(
                    "retention step {index}: conversation outcome in retention"
                )));
            },
        }
    }
    Ok(())
}
