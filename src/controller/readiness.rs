//! # Condition Reader
//!
//! Maps the condition list reported by a backing resource onto a three-valued
//! readiness verdict.
//!
//! The mapping is pure: the same condition set always yields the same verdict.
//! Condition types the policy does not name are ignored, so an operator that
//! starts reporting new condition types never makes a verdict regress.

use std::fmt;

/// Status of a single observed condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    /// Parse a Kubernetes condition status string ("True", "False", "Unknown")
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("true") {
            ConditionStatus::True
        } else if raw.eq_ignore_ascii_case("false") {
            ConditionStatus::False
        } else {
            ConditionStatus::Unknown
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        })
    }
}

/// A condition as reported by a backing resource's operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedCondition {
    pub condition_type: String,
    pub status: ConditionStatus,
    pub message: Option<String>,
}

impl ObservedCondition {
    #[must_use]
    pub fn new(condition_type: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Which condition types decide readiness for a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// The kind's primary health condition; must be true for Ready
    pub primary: &'static str,
    /// Conditions that hold readiness back while true
    pub blocking: &'static [&'static str],
}

/// Three-valued readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadyState {
    Ready,
    NotReady,
    Unknown,
}

impl ReadyState {
    /// Kubernetes condition status string for this state
    #[must_use]
    pub fn condition_status(self) -> &'static str {
        match self {
            ReadyState::Ready => "True",
            ReadyState::NotReady => "False",
            ReadyState::Unknown => "Unknown",
        }
    }

    /// Label value used in metrics
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReadyState::Ready => "ready",
            ReadyState::NotReady => "not_ready",
            ReadyState::Unknown => "unknown",
        }
    }
}

/// Readiness verdict with a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessVerdict {
    pub state: ReadyState,
    pub reason: String,
}

impl ReadinessVerdict {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ReadyState::Ready
    }

    fn new(state: ReadyState, reason: impl Into<String>) -> Self {
        Self {
            state,
            reason: reason.into(),
        }
    }
}

/// Derive the readiness verdict for a condition set under a policy
///
/// - no conditions at all, or no primary condition: `Unknown`
/// - any blocking condition true: `NotReady`
/// - primary condition true (every entry, if duplicated): `Ready`
/// - otherwise: `NotReady`
#[must_use]
pub fn read_conditions(
    conditions: &[ObservedCondition],
    policy: &ReadinessPolicy,
) -> ReadinessVerdict {
    if conditions.is_empty() {
        return ReadinessVerdict::new(
            ReadyState::Unknown,
            "no conditions reported yet, the resource has not been observed by its operator",
        );
    }

    let primary: Vec<&ObservedCondition> = conditions
        .iter()
        .filter(|c| c.condition_type == policy.primary)
        .collect();
    if primary.is_empty() {
        return ReadinessVerdict::new(
            ReadyState::Unknown,
            format!("condition {} not reported yet", policy.primary),
        );
    }

    for blocking in policy.blocking {
        if let Some(active) = conditions
            .iter()
            .find(|c| c.condition_type == *blocking && c.status == ConditionStatus::True)
        {
            return ReadinessVerdict::new(ReadyState::NotReady, describe(active));
        }
    }

    match primary.iter().find(|c| c.status != ConditionStatus::True) {
        Some(failing) => ReadinessVerdict::new(ReadyState::NotReady, describe(failing)),
        None => ReadinessVerdict::new(
            ReadyState::Ready,
            format!("condition {} is True", policy.primary),
        ),
    }
}

fn describe(condition: &ObservedCondition) -> String {
    match condition.message.as_deref().filter(|m| !m.is_empty()) {
        Some(message) => format!(
            "condition {} is {}: {}",
            condition.condition_type, condition.status, message
        ),
        None => format!(
            "condition {} is {}",
            condition.condition_type, condition.status
        ),
    }
}
