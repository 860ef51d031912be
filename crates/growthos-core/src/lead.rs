//! Lead records and the values that describe their position in the funnel.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Length of a generated lead identifier.
const LEAD_ID_LEN: usize = 8;

/// Opaque lead identifier.
///
/// Generated identifiers are the first eight hex characters of a v4 UUID.
/// Identifiers received from observers are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(String);

impl LeadId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple.chars().take(LEAD_ID_LEN).collect())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LeadId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for LeadId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Funnel stage of a lead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Freshly captured, not yet converted.
    #[default]
    Lead,
    /// Appointment booked.
    Booked,
    /// Attended the appointment.
    Showed,
    /// Still on the program after the first month.
    Retained,
    /// Bought an add-on program.
    Upsold,
    /// Went elsewhere.
    Lost,
}

impl Stage {
    /// Wire name of the stage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Booked => "booked",
            Self::Showed => "showed",
            Self::Retained => "retained",
            Self::Upsold => "upsold",
            Self::Lost => "lost",
        }
    }

    /// Whether moving from `self` to `next` is a legal funnel transition.
    ///
    /// Conversation runs move `lead` to `booked` or `lost`; retention runs
    /// move `booked` (or `showed`) to `retained` and then `upsold`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Lead, Self::Booked | Self::Lost)
                | (Self::Booked, Self::Showed | Self::Retained)
                | (Self::Showed, Self::Retained)
                | (Self::Retained, Self::Upsold)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which scripted variant drives a lead's conversation.
///
/// On the wire the automated flow is `"new"` and the legacy clinic flow is
/// `"old"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    /// Instant automated responder.
    #[default]
    #[serde(rename = "new")]
    Automated,
    /// Business-hours front desk.
    #[serde(rename = "old")]
    Legacy,
}

impl Mode {
    /// Wire name of the mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Automated => "new",
            Self::Legacy => "old",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "new" => Ok(Self::Automated),
            "old" => Ok(Self::Legacy),
            other => Err(CoreError::UnknownMode(other.to_owned())),
        }
    }
}

/// Author of a simulated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Automated assistant.
    Ai,
    /// The prospect.
    Patient,
    /// Clinic front desk.
    Clinic,
    /// Narration injected by the simulator.
    System,
}

impl Sender {
    /// Wire name of the sender.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Patient => "patient",
            Self::Clinic => "clinic",
            Self::System => "system",
        }
    }

    /// Whether the message was sent by the business side of the conversation.
    #[must_use]
    pub fn is_business(self) -> bool {
        matches!(self, Self::Ai | Self::Clinic)
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exchanged message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Who sent it.
    pub sender: Sender,
    /// Message body.
    pub text: String,
    /// When the simulator emitted it.
    pub timestamp: DateTime<Utc>,
}

/// One retention check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinRecord {
    /// Program day the check-in represents.
    pub day: u32,
    /// Check-in body.
    pub text: String,
    /// Lead the check-in belongs to.
    pub patient_id: LeadId,
}

/// A synthetic sales prospect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Immutable identifier.
    pub id: LeadId,
    /// Display name.
    pub name: String,
    /// Display phone number.
    pub phone: String,
    /// Current funnel stage.
    pub stage: Stage,
    /// Script variant, fixed at creation.
    pub mode: Mode,
    /// When the lead was captured.
    #[serde(rename = "lead_time")]
    pub created_at: DateTime<Utc>,
    /// First business-side reply.
    #[serde(rename = "response_time")]
    pub first_response_at: Option<DateTime<Utc>>,
    /// When the booking happened.
    #[serde(rename = "booking_time")]
    pub booked_at: Option<DateTime<Utc>>,
    /// Scheduled appointment, never filled by the current scripts.
    #[serde(rename = "appointment_time")]
    pub appointment_at: Option<DateTime<Utc>>,
    /// Retention check-ins in delivery order.
    #[serde(rename = "check_ins")]
    pub checkins: Vec<CheckinRecord>,
    /// Accumulated value attributed to this lead.
    pub revenue: u64,
    /// Conversation history in delivery order.
    pub messages: Vec<MessageRecord>,
}

impl Lead {
    /// Create a lead in the `lead` stage.
    #[must_use]
    pub fn new(
        id: LeadId,
        name: impl Into<String>,
        phone: impl Into<String>,
        mode: Mode,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            phone: phone.into(),
            stage: Stage::Lead,
            mode,
            created_at,
            first_response_at: None,
            booked_at: None,
            appointment_at: None,
            checkins: Vec::new(),
            revenue: 0,
            messages: Vec::new(),
        }
    }

    /// Move to `next`, rejecting transitions the funnel does not allow.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] and leaves the stage untouched
    /// if `next` is not reachable from the current stage.
    pub fn advance_to(&mut self, next: Stage) -> CoreResult<()> {
        if !self.stage.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(())
    }

    /// Record the first business-side response. Later calls are ignored.
    ///
    /// Returns `true` if this call set the timestamp.
    pub fn stamp_first_response(&mut self, at: DateTime<Utc>) -> bool {
        if self.first_response_at.is_some() {
            return false;
        }
        self.first_response_at = Some(at);
        true
    }

    /// Record the booking time. Later calls are ignored.
    pub fn stamp_booked(&mut self, at: DateTime<Utc>) {
        if self.booked_at.is_none() {
            self.booked_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(mode: Mode) -> Lead {
        Lead::new(LeadId::from("abcd1234"), "Sarah M.", "(555) 123-4567", mode, Utc::now())
    }

    #[test]
    fn test_generated_id_shape() {
        let id = LeadId::generate();
        assert_eq!(id.as_str().len(), LEAD_ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, LeadId::generate());
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(serde_json::to_string(&Mode::Automated).unwrap(), "\"new\"");
        assert_eq!(serde_json::to_string(&Mode::Legacy).unwrap(), "\"old\"");
        assert_eq!("old".parse::<Mode>().unwrap(), Mode::Legacy);
        assert_eq!(
            "sms".parse::<Mode>(),
            Err(CoreError::UnknownMode("sms".into()))
        );
    }

    #[test]
    fn test_stage_transitions() {
        assert!(Stage::Lead.can_transition_to(Stage::Booked));
        assert!(Stage::Lead.can_transition_to(Stage::Lost));
        assert!(Stage::Booked.can_transition_to(Stage::Retained));
        assert!(Stage::Retained.can_transition_to(Stage::Upsold));

        assert!(!Stage::Lost.can_transition_to(Stage::Booked));
        assert!(!Stage::Upsold.can_transition_to(Stage::Retained));
        assert!(!Stage::Lead.can_transition_to(Stage::Upsold));
        assert!(!Stage::Booked.can_transition_to(Stage::Booked));
    }

    #[test]
    fn test_advance_to_rejects_invalid() {
        let mut l = lead(Mode::Legacy);
        l.advance_to(Stage::Lost).unwrap();

        let err = l.advance_to(Stage::Booked).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: Stage::Lost,
                to: Stage::Booked
            }
        );
        assert_eq!(l.stage, Stage::Lost);
    }

    #[test]
    fn test_timestamps_set_once() {
        let mut l = lead(Mode::Automated);
        let first = Utc::now();
        assert!(l.stamp_first_response(first));
        assert!(!l.stamp_first_response(first + chrono::Duration::seconds(5)));
        assert_eq!(l.first_response_at, Some(first));

        l.stamp_booked(first);
        l.stamp_booked(first + chrono::Duration::seconds(5));
        assert_eq!(l.booked_at, Some(first));
    }

    #[test]
    fn test_lead_wire_fields() {
        let l = lead(Mode::Automated);
        let value = serde_json::to_value(&l).unwrap();
        assert_eq!(value["id"], "abcd1234");
        assert_eq!(value["stage"], "lead");
        assert_eq!(value["mode"], "new");
        assert_eq!(value["revenue"], 0);
        assert!(value["lead_time"].is_string());
        assert!(value["response_time"].is_null());
        assert!(value["check_ins"].as_array().unwrap().is_empty());
        assert!(value["messages"].as_array().unwrap().is_empty());
    }
}
