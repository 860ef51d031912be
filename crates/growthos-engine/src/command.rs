//! Inbound observer commands.

use growthos_core::{LeadId, Mode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Actions an observer may request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Clear every lead and counter.
    Reset,
    /// Create a lead and run its conversation.
    SimulateLead {
        /// Script variant; `"new"` when omitted.
        #[serde(default)]
        mode: Mode,
    },
    /// Run the retention check-ins for a booked lead.
    SimulateRetention {
        /// Target lead.
        patient_id: LeadId,
    },
}

const ACTIONS: [&str; 3] = ["reset", "simulate_lead", "simulate_retention"];

/// Why a frame did not yield a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Not a JSON object, or a known action with a bad payload.
    #[error("malformed command: {0}")]
    Malformed(String),
    /// Object without a string `action`.
    #[error("command has no action")]
    MissingAction,
    /// Unrecognised `action`.
    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

impl Command {
    /// Parse a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing why the frame was not a command.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| CommandError::Malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(CommandError::Malformed("expected a JSON object".into()));
        }

        let Some(action) = value.get("action").and_then(serde_json::Value::as_str) else {
            return Err(CommandError::MissingAction);
        };
        if !ACTIONS.contains(&action) {
            return Err(CommandError::UnknownAction(action.to_owned()));
        }

        serde_json::from_value(value).map_err(|e| CommandError::Malformed(e.to_string()))
    }

    /// Wire name of the action.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::SimulateLead { .. } => "simulate_lead",
            Self::SimulateRetention { .. } => "simulate_retention",
        }
    }
}
