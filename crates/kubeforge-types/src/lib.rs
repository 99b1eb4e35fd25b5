//! Shared types for kubeforge
//!
//! This crate contains data structures used across multiple kubeforge crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Workload Descriptor
// ============================================================================

/// Everything needed to provision one workload, collected up front.
///
/// The descriptor is immutable for the duration of a provisioning call;
/// every derived resource name and label traces back to `name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadDescriptor {
    /// Workload name, basis for all derived identifiers
    pub name: String,

    /// Container image reference (e.g. `nginx:latest`)
    pub image: String,

    /// Desired number of replicas
    pub replicas: i32,

    /// Container port the workload listens on
    pub port: u16,

    /// Create a Service in front of the workload
    pub expose_service: bool,

    /// Create an Ingress routing external traffic to the Service
    pub expose_ingress: bool,

    /// Domain suffix used to build the ingress hostname
    pub ingress_host_suffix: String,
}

impl WorkloadDescriptor {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            replicas: 1,
            port: 80,
            expose_service: false,
            expose_ingress: false,
            ingress_host_suffix: String::new(),
        }
    }

    pub fn with_replicas(mut self, replicas: i32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_service(mut self) -> Self {
        self.expose_service = true;
        self
    }

    pub fn with_ingress(mut self, host_suffix: impl Into<String>) -> Self {
        self.expose_ingress = true;
        self.ingress_host_suffix = host_suffix.into();
        self
    }

    /// Check the descriptor's internal consistency.
    ///
    /// Name syntax is not checked here; that belongs to name derivation,
    /// which every consumer of a derived name goes through.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.image.is_empty() {
            return Err(DescriptorError::EmptyImage);
        }
        if self.replicas < 0 {
            return Err(DescriptorError::NegativeReplicas(self.replicas));
        }
        if self.port == 0 {
            return Err(DescriptorError::InvalidPort);
        }
        if self.expose_ingress && !self.expose_service {
            return Err(DescriptorError::IngressWithoutService);
        }
        if self.expose_ingress && self.ingress_host_suffix.is_empty() {
            return Err(DescriptorError::EmptyHostSuffix);
        }
        Ok(())
    }
}

// ============================================================================
// Resource kinds and inventory summaries
// ============================================================================

/// The kinds of resources a provisioning call can create
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Deployment,
    Service,
    Ingress,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::Service => "service",
            Self::Ingress => "ingress",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Existing deployment, as shown by the pre-flight inventory
#[derive(Clone, Debug)]
pub struct DeploymentSummary {
    pub name: String,
    pub replicas: i32,
    pub ready_replicas: i32,
}

impl DeploymentSummary {
    pub fn new(name: String) -> Self {
        Self {
            name,
            replicas: 0,
            ready_replicas: 0,
        }
    }

    /// Format replica status as "ready/total"
    pub fn replica_status(&self) -> String {
        format!("{}/{}", self.ready_replicas, self.replicas)
    }
}

/// Existing pod, as shown by the pre-flight inventory
#[derive(Clone, Debug)]
pub struct PodSummary {
    pub name: String,
    pub phase: String,
}

impl PodSummary {
    pub fn new(name: String, phase: String) -> Self {
        Self { name, phase }
    }
}

/// Externally reachable address of an admitted ingress route
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngressAddress {
    pub host: String,
    pub path: String,
}

impl IngressAddress {
    /// Render the address as a plain http URL
    pub fn url(&self) -> String {
        format!("http://{}{}", self.host, self.path)
    }
}

// ============================================================================
// Local validation errors
// ============================================================================

/// Rejections raised by name derivation, before any network call
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("workload name must not be empty")]
    Empty,

    #[error("workload name '{0}' is {1} characters long, maximum is {2}")]
    TooLong(String, usize, usize),

    #[error(
        "workload name '{0}' must consist of lowercase alphanumeric characters or '-', \
         and must start and end with an alphanumeric character"
    )]
    InvalidCharacters(String),
}

/// Rejections raised by descriptor validation, before any network call
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("image reference must not be empty")]
    EmptyImage,

    #[error("replica count must not be negative, got {0}")]
    NegativeReplicas(i32),

    #[error("port 0 is not a valid container port")]
    InvalidPort,

    #[error("an ingress requires a service to route to; enable the service as well")]
    IngressWithoutService,

    #[error("an ingress requires a host suffix to build its hostname")]
    EmptyHostSuffix,

    #[error(transparent)]
    Name(#[from] NameError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let d = WorkloadDescriptor::new("demo", "nginx:latest");
        assert_eq!(d.replicas, 1);
        assert_eq!(d.port, 80);
        assert!(!d.expose_service);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_ingress_requires_service() {
        let mut d = WorkloadDescriptor::new("demo", "nginx:latest").with_ingress("example.com");
        assert_eq!(d.validate(), Err(DescriptorError::IngressWithoutService));

        d.expose_service = true;
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_ingress_requires_host_suffix() {
        let d = WorkloadDescriptor::new("demo", "nginx:latest")
            .with_service()
            .with_ingress("");
        assert_eq!(d.validate(), Err(DescriptorError::EmptyHostSuffix));
    }

    #[test]
    fn test_rejects_bad_scalar_fields() {
        let d = WorkloadDescriptor::new("demo", "");
        assert_eq!(d.validate(), Err(DescriptorError::EmptyImage));

        let d = WorkloadDescriptor::new("demo", "nginx:latest").with_replicas(-1);
        assert_eq!(d.validate(), Err(DescriptorError::NegativeReplicas(-1)));

        let d = WorkloadDescriptor::new("demo", "nginx:latest").with_port(0);
        assert_eq!(d.validate(), Err(DescriptorError::InvalidPort));
    }

    #[test]
    fn test_ingress_address_url() {
        let addr = IngressAddress {
            host: "demo.example.com".to_string(),
            path: "/".to_string(),
        };
        assert_eq!(addr.url(), "http://demo.example.com/");
    }
}
