//! Per-call record of what a provisioning attempt did

use kubeforge_k8s::ClusterError;
use kubeforge_types::ResourceKind;

/// Result of submitting one resource of the bundle
#[derive(Debug)]
pub enum ResourceResult {
    Created {
        kind: ResourceKind,
        name: String,
    },
    Failed {
        kind: ResourceKind,
        name: String,
        error: ClusterError,
    },
}

impl ResourceResult {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Created { kind, .. } | Self::Failed { kind, .. } => *kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Created { name, .. } | Self::Failed { name, .. } => name,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

impl std::fmt::Display for ResourceResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created { kind, name } => write!(f, "created {kind} '{name}'"),
            Self::Failed { kind, name, error } => {
                write!(f, "failed to create {kind} '{name}': {error}")
            }
        }
    }
}

/// Ordered outcome of one provisioning call.
///
/// Entries appear in submission order. A failed entry is always terminal:
/// nothing was submitted after it, and nothing before it is rolled back.
#[derive(Debug, Default)]
pub struct ProvisioningOutcome {
    pub results: Vec<ResourceResult>,

    /// Externally reachable URL of the route, when an ingress was created
    pub route_url: Option<String>,
}

impl ProvisioningOutcome {
    pub fn succeeded(&self) -> bool {
        self.results.iter().all(ResourceResult::is_created)
    }

    pub fn first_failure(&self) -> Option<&ResourceResult> {
        self.results.iter().find(|r| !r.is_created())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_failure_lookup() {
        let mut outcome = ProvisioningOutcome::default();
        outcome.results.push(ResourceResult::Created {
            kind: ResourceKind::Deployment,
            name: "demo".to_string(),
        });
        assert!(outcome.succeeded());
        assert!(outcome.first_failure().is_none());

        outcome.results.push(ResourceResult::Failed {
            kind: ResourceKind::Service,
            name: "demo-svc".to_string(),
            error: ClusterError::AlreadyExists {
                kind: ResourceKind::Service,
                name: "demo-svc".to_string(),
            },
        });
        assert!(!outcome.succeeded());
        let failure = outcome.first_failure().unwrap();
        assert_eq!(failure.kind(), ResourceKind::Service);
        assert_eq!(failure.name(), "demo-svc");
    }
}
