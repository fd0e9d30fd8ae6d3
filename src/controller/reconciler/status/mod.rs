//! # Status Computation
//!
//! Builds the declaration status from the observations of one pass.
//!
//! The status is recomputed from scratch every pass. The only value carried
//! over from the previous status is a condition's `lastTransitionTime`, kept
//! when the condition's type and status are unchanged, so an unchanged world
//! produces an identical status and no write.

use crate::adapter::{BackingResource, Endpoint};
use crate::constants::{CONDITION_READY, CONDITION_TRUST_MATERIAL};
use crate::controller::projection::Projection;
use crate::controller::readiness::{ReadinessVerdict, ReadyState};
use crate::crd::{
    BackingResourceStatus, Condition, EndpointStatus, InfraDependency, InfraDependencyStatus,
};
use crate::error::InfraError;

/// What a pass observed about a backing resource
#[derive(Debug)]
pub struct Evaluation<'a> {
    pub backing: &'a BackingResource,
    pub verdict: &'a ReadinessVerdict,
    pub endpoint: Option<&'a Endpoint>,
    pub projection: Option<&'a Projection>,
    /// Transient problem that held a ready backing resource back
    pub problem: Option<&'a InfraError>,
}

impl Evaluation<'_> {
    /// Whether the dependency can be consumed
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.verdict.is_ready() && self.problem.is_none() && self.projection.is_some()
    }

    /// Short label describing why the dependency is not settled
    #[must_use]
    pub fn requeue_reason(&self) -> &'static str {
        match (self.problem, self.verdict.state) {
            (Some(problem), _) => problem.reason(),
            (None, ReadyState::Unknown) => "BackingResourceStatusUnknown",
            _ => "BackingResourceNotReady",
        }
    }
}

/// Build the status for a pass
#[must_use]
pub fn build_status(
    dependency: &InfraDependency,
    evaluation: &Evaluation<'_>,
    now: &str,
) -> InfraDependencyStatus {
    let backing = evaluation.backing;
    let ready = evaluation.is_ready();

    let mut conditions = vec![ready_condition(evaluation)];
    if let Some(trust) = trust_condition(evaluation) {
        conditions.push(trust);
    }

    let projection = evaluation.projection.filter(|_| ready);
    let mut status = InfraDependencyStatus {
        ready,
        conditions,
        volumes: projection.map(|p| p.volumes.clone()).unwrap_or_default(),
        env_vars: projection.map(|p| p.env_vars.clone()).unwrap_or_default(),
        backing_resource: Some(BackingResourceStatus {
            api_version: backing.target.api_version.clone(),
            kind: backing.target.kind.clone(),
            namespace: backing.target.namespace.clone(),
            name: backing.target.name.clone(),
        }),
        endpoint: evaluation.endpoint.map(|e| EndpointStatus {
            host: e.host.clone(),
            port: e.port,
        }),
        observed_generation: dependency.metadata.generation,
    };
    stamp_transitions(&mut status, dependency.status.as_ref(), now);
    status
}

/// Set `lastTransitionTime` on every condition
///
/// Conditions whose type and status match the previous status keep its
/// timestamp; every other condition transitions at `now`.
pub fn stamp_transitions(
    status: &mut InfraDependencyStatus,
    previous: Option<&InfraDependencyStatus>,
    now: &str,
) {
    for condition in &mut status.conditions {
        let carried = previous
            .and_then(|p| p.condition(&condition.r#type))
            .filter(|p| p.status == condition.status)
            .and_then(|p| p.last_transition_time.clone());
        condition.last_transition_time = Some(carried.unwrap_or_else(|| now.to_string()));
    }
}

fn ready_condition(evaluation: &Evaluation<'_>) -> Condition {
    let target = &evaluation.backing.target;
    let verdict = evaluation.verdict;

    let (status, reason, message) = if let Some(problem) = evaluation.problem {
        (
            "False",
            problem.reason(),
            format!("{target} is ready but cannot be consumed yet: {problem}"),
        )
    } else if evaluation.is_ready() {
        (
            "True",
            "BackingResourceReady",
            format!("{target} is ready ({})", verdict.reason),
        )
    } else if evaluation.backing.created {
        (
            verdict.state.condition_status(),
            "BackingResourceCreated",
            format!("{target} was created and is waiting for its operator"),
        )
    } else {
        let reason = match verdict.state {
            ReadyState::Unknown => "BackingResourceStatusUnknown",
            _ => "BackingResourceNotReady",
        };
        (
            verdict.state.condition_status(),
            reason,
            format!("{target} is not ready: {}", verdict.reason),
        )
    };

    Condition {
        r#type: CONDITION_READY.to_string(),
        status: status.to_string(),
        last_transition_time: None,
        reason: Some(reason.to_string()),
        message: Some(message),
    }
}

fn trust_condition(evaluation: &Evaluation<'_>) -> Option<Condition> {
    let missing = evaluation
        .problem
        .filter(|p| matches!(p, InfraError::TrustMaterialMissing { .. }));
    if let Some(problem) = missing {
        return Some(Condition {
            r#type: CONDITION_TRUST_MATERIAL.to_string(),
            status: "False".to_string(),
            last_transition_time: None,
            reason: Some(problem.reason().to_string()),
            message: Some(problem.to_string()),
        });
    }
    let projected = evaluation
        .projection
        .is_some_and(|projection| !projection.volumes.is_empty());
    projected.then(|| Condition {
        r#type: CONDITION_TRUST_MATERIAL.to_string(),
        status: "True".to_string(),
        last_transition_time: None,
        reason: Some("TrustMaterialMounted".to_string()),
        message: None,
    })
}
