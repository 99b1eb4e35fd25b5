//! The provisioning orchestrator

use thiserror::Error;
use tracing::{info, warn};

use kubeforge_compose::{compose, derive};
use kubeforge_k8s::ClusterClient;
use kubeforge_types::{DescriptorError, NameError, ResourceKind, WorkloadDescriptor};

use crate::outcome::{ProvisioningOutcome, ResourceResult};

/// Local failures that abort a call before any network mutation
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Name(#[from] NameError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// One-shot workload provisioner.
///
/// Holds no mutable state between calls; concurrent calls for different
/// workload names are independent.
pub struct Provisioner {
    namespace: String,
    preflight: bool,
}

impl Provisioner {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            preflight: true,
        }
    }

    /// Enable or disable the pre-flight inventory listing
    pub fn with_preflight(mut self, preflight: bool) -> Self {
        self.preflight = preflight;
        self
    }

    /// Provision the descriptor's resource bundle against the cluster.
    ///
    /// Local validation failures return `Err` before anything is
    /// submitted. A remote submission failure stops the remaining
    /// submissions and becomes the terminal entry of the returned outcome;
    /// resources created before it are left in place for the caller to
    /// clean up or retry around.
    pub async fn provision<C>(
        &self,
        descriptor: &WorkloadDescriptor,
        client: &C,
    ) -> Result<ProvisioningOutcome, ProvisionError>
    where
        C: ClusterClient + ?Sized,
    {
        let names = derive(&descriptor.name)?;
        let bundle = compose(descriptor, &names)?;

        if self.preflight {
            self.log_inventory(client).await;
        }

        let mut outcome = ProvisioningOutcome::default();

        // Strict submission order: deployment, service, ingress. A later
        // resource's backend reference is only valid once the earlier
        // object exists on clusters that validate at admission time.
        match client
            .create_deployment(&self.namespace, bundle.deployment)
            .await
        {
            Ok(name) => {
                info!(namespace = %self.namespace, %name, "created deployment");
                outcome.results.push(ResourceResult::Created {
                    kind: ResourceKind::Deployment,
                    name,
                });
            }
            Err(error) => {
                outcome.results.push(ResourceResult::Failed {
                    kind: ResourceKind::Deployment,
                    name: names.workload,
                    error,
                });
                return Ok(outcome);
            }
        }

        if let Some(service) = bundle.service {
            match client.create_service(&self.namespace, service).await {
                Ok(name) => {
                    info!(namespace = %self.namespace, %name, "created service");
                    outcome.results.push(ResourceResult::Created {
                        kind: ResourceKind::Service,
                        name,
                    });
                }
                Err(error) => {
                    outcome.results.push(ResourceResult::Failed {
                        kind: ResourceKind::Service,
                        name: names.service,
                        error,
                    });
                    return Ok(outcome);
                }
            }
        }

        if let Some(ingress) = bundle.ingress {
            match client.create_ingress(&self.namespace, ingress).await {
                Ok(address) => {
                    info!(namespace = %self.namespace, host = %address.host, "created ingress");
                    outcome.route_url = Some(address.url());
                    outcome.results.push(ResourceResult::Created {
                        kind: ResourceKind::Ingress,
                        name: names.ingress,
                    });
                }
                Err(error) => {
                    outcome.results.push(ResourceResult::Failed {
                        kind: ResourceKind::Ingress,
                        name: names.ingress,
                        error,
                    });
                    return Ok(outcome);
                }
            }
        }

        Ok(outcome)
    }

    /// Read-only inventory listing for operator visibility. Failures here
    /// are logged and never block creation.
    async fn log_inventory<C>(&self, client: &C)
    where
        C: ClusterClient + ?Sized,
    {
        match client.list_deployments(&self.namespace).await {
            Ok(deployments) => {
                info!(
                    namespace = %self.namespace,
                    count = deployments.len(),
                    "existing deployments"
                );
                for deployment in &deployments {
                    info!(
                        name = %deployment.name,
                        replicas = %deployment.replica_status(),
                        "deployment"
                    );
                }
            }
            Err(error) => {
                warn!(namespace = %self.namespace, %error, "pre-flight deployment listing failed");
            }
        }

        match client.list_pods(&self.namespace).await {
            Ok(pods) => {
                info!(namespace = %self.namespace, count = pods.len(), "existing pods");
                for pod in &pods {
                    info!(name = %pod.name, phase = %pod.phase, "pod");
                }
            }
            Err(error) => {
                warn!(namespace = %self.namespace, %error, "pre-flight pod listing failed");
            }
        }
    }
}
