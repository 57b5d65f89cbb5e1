//! Notification intents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{JobRecord, Transition, format_amount, rules};

/// Fallback label when the accepting agent has no name on record.
const UNNAMED_AGENT: &str = "An Agent";

/// Kind of notification a transition produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// An agent quoted a price.
    QuoteReceived,
    /// The job was accepted.
    JobAccepted,
    /// The job was completed.
    JobCompleted,
    /// The assigned agent dropped the job.
    AgentCancelled,
}

impl IntentKind {
    /// Stable identifier used in logs and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuoteReceived => "quote_received",
            Self::JobAccepted => "job_accepted",
            Self::JobCompleted => "job_completed",
            Self::AgentCancelled => "agent_cancelled",
        }
    }

    /// Notification title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::QuoteReceived => "New Quote Received! 💰",
            Self::JobAccepted => "Job Accepted! ✅",
            Self::JobCompleted => "Job Completed 🎉",
            Self::AgentCancelled => "Agent Cancelled ⚠️",
        }
    }

    /// Notification body for the job's state after the update.
    pub fn body(&self, job: &JobRecord) -> String {
        match self {
            Self::QuoteReceived => match job.price {
                Some(price) => format!(
                    "An agent offered ₹{}. Check app to accept.",
                    format_amount(price)
                ),
                // No usable price: announce the quote without an amount.
                None => "An agent sent you a quote. Check app to accept.".to_string(),
            },
            Self::JobAccepted => format!(
                "{} is active on your job.",
                job.agent_display_name().unwrap_or(UNNAMED_AGENT)
            ),
            Self::JobCompleted => "Your service is done. Please rate the agent!".to_string(),
            Self::AgentCancelled => {
                "The agent cancelled. Your job is back in the queue.".to_string()
            }
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification to send, decoupled from its delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationIntent {
    /// Rule that produced the intent.
    pub kind: IntentKind,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Customer to notify; `None` when the job has no customer id.
    pub target_user_id: Option<String>,
    /// Extra key/value data carried to the device.
    pub metadata: BTreeMap<String, String>,
}

impl NotificationIntent {
    /// Build the intent of `kind` for a transition of job `job_id`.
    pub fn new(kind: IntentKind, transition: &Transition, job_id: &str) -> Self {
        let after = &transition.after;
        let mut metadata = BTreeMap::new();
        metadata.insert("jobId".to_string(), job_id.to_string());

        Self {
            kind,
            title: kind.title().to_string(),
            body: kind.body(after),
            target_user_id: after.customer().map(str::to_string),
            metadata,
        }
    }

    /// Job id carried in the metadata.
    pub fn job_id(&self) -> Option<&str> {
        self.metadata.get("jobId").map(String::as_str)
    }
}

/// Map a transition to its notification, if any rule matches.
pub fn map_transition(transition: &Transition, job_id: &str) -> Option<NotificationIntent> {
    rules::classify(transition).map(|kind| NotificationIntent::new(kind, transition, job_id))
}
