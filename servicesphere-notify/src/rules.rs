//! Ordered classification rules.
//!
//! [`RULES`] is evaluated top to bottom and the first matching rule wins. Status
//! rules sit above the agent-removal rule, so an update that both changes the
//! status and clears the agent reports the status change.

use crate::{IntentKind, JobStatus, Transition};

/// A single classification rule.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Notification produced when the rule matches.
    pub kind: IntentKind,
    /// Predicate over the transition.
    pub matches: fn(&Transition) -> bool,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("kind", &self.kind).finish()
    }
}

fn quote_received(t: &Transition) -> bool {
    t.entered(&JobStatus::PendingApproval)
}

fn job_accepted(t: &Transition) -> bool {
    t.entered(&JobStatus::Accepted)
}

fn job_completed(t: &Transition) -> bool {
    t.entered(&JobStatus::Completed)
}

fn agent_cancelled(t: &Transition) -> bool {
    t.agent_removed()
}

/// Rules in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        kind: IntentKind::QuoteReceived,
        matches: quote_received,
    },
    Rule {
        kind: IntentKind::JobAccepted,
        matches: job_accepted,
    },
    Rule {
        kind: IntentKind::JobCompleted,
        matches: job_completed,
    },
    Rule {
        kind: IntentKind::AgentCancelled,
        matches: agent_cancelled,
    },
];

/// Classify a transition; `None` means no notification.
pub fn classify(transition: &Transition) -> Option<IntentKind> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(transition))
        .map(|rule| rule.kind)
}

/// Every rule the transition satisfies, in priority order.
pub fn matching(transition: &Transition) -> Vec<IntentKind> {
    RULES
        .iter()
        .filter(|rule| (rule.matches)(transition))
        .map(|rule| rule.kind)
        .collect()
}
