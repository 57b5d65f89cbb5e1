//! Job records and status transitions.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::{NotifyError, Result};

/// Lifecycle status of a service job.
///
/// Statuses written by newer app versions are kept verbatim in
/// [`JobStatus::Other`] so they never fail decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    /// Customer posted the job.
    Requested,
    /// An agent quoted a price and awaits the customer's approval.
    PendingApproval,
    /// The customer accepted an agent.
    Accepted,
    /// The agent finished the job.
    Completed,
    /// The job was withdrawn.
    Cancelled,
    /// Any other status string.
    Other(String),
}

impl JobStatus {
    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Requested => "requested",
            Self::PendingApproval => "pending_approval",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "requested" => Self::Requested,
            "pending_approval" => Self::PendingApproval,
            "accepted" => Self::Accepted,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a `serviceRequests` document.
///
/// Only the fields the notifier reads are modelled; everything else in the
/// document is ignored. A modelled field holding a value of the wrong type
/// decodes as absent, so one malformed field never hides the whole update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Current status.
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<JobStatus>,
    /// Customer who requested the job.
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_id: Option<String>,
    /// Assigned agent, if any.
    #[serde(default, deserialize_with = "lenient_string")]
    pub agent_id: Option<String>,
    /// Display name of the assigned agent.
    #[serde(default, deserialize_with = "lenient_string")]
    pub agent_name: Option<String>,
    /// Quoted price in rupees.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
}

impl JobRecord {
    /// Create a record with only a status.
    pub fn with_status(status: impl Into<JobStatus>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    /// Set the customer id.
    pub fn for_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Set the assigned agent.
    pub fn with_agent(mut self, agent_id: impl Into<String>, agent_name: Option<&str>) -> Self {
        self.agent_id = Some(agent_id.into());
        self.agent_name = agent_name.map(str::to_string);
        self
    }

    /// Set the quoted price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Decode a record from plain JSON document fields.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Whether an agent is assigned. Empty ids count as unassigned.
    pub fn has_agent(&self) -> bool {
        self.agent_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Agent display name, if non-empty.
    pub fn agent_display_name(&self) -> Option<&str> {
        self.agent_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Customer id, if non-empty.
    pub fn customer(&self) -> Option<&str> {
        self.customer_id.as_deref().filter(|id| !id.is_empty())
    }

    fn has_status(&self, status: &JobStatus) -> bool {
        self.status.as_ref() == Some(status)
    }
}

// Strings as-is, numbers in their decimal form, anything else absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_status<'de, D>(deserializer: D) -> std::result::Result<Option<JobStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.map(JobStatus::from))
}

// Numbers or numeric strings; anything else, including NaN, is absent.
fn lenient_price<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let price = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(price.filter(|p| p.is_finite()))
}

/// Render a currency amount: whole amounts without decimals, others in their
/// shortest decimal form.
pub fn format_amount(amount: f64) -> String {
    if amount.is_finite() && amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{}", amount)
    }
}

/// Before/after pair of one job's snapshots at a single update.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State immediately before the update.
    pub before: JobRecord,
    /// State immediately after the update.
    pub after: JobRecord,
}

impl Transition {
    /// Create a transition from two present snapshots.
    pub fn new(before: JobRecord, after: JobRecord) -> Self {
        Self { before, after }
    }

    /// Create a transition from possibly-absent snapshots.
    pub fn from_snapshots(before: Option<JobRecord>, after: Option<JobRecord>) -> Result<Self> {
        match (before, after) {
            (Some(before), Some(after)) => Ok(Self::new(before, after)),
            (None, _) => Err(NotifyError::MissingSnapshot("before")),
            (_, None) => Err(NotifyError::MissingSnapshot("after")),
        }
    }

    /// The update moved the job into `status`.
    pub fn entered(&self, status: &JobStatus) -> bool {
        self.after.has_status(status) && !self.before.has_status(status)
    }

    /// The update removed the assigned agent.
    pub fn agent_removed(&self) -> bool {
        self.before.has_agent() && !self.after.has_agent()
    }
}
