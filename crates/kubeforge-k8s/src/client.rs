//! Cluster client trait and its kube-backed implementation

use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client};
use thiserror::Error;
use tracing::debug;

use kubeforge_types::{DeploymentSummary, IngressAddress, PodSummary, ResourceKind};

/// Failures surfaced from the cluster boundary
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("kubernetes API request failed: {0}")]
    Api(#[from] kube::Error),

    #[error("failed to load cluster configuration: {0}")]
    Config(String),

    #[error("{kind} '{name}' already exists in the cluster")]
    AlreadyExists { kind: ResourceKind, name: String },

    #[error("cluster admitted a {kind} without reporting its name")]
    MissingName { kind: ResourceKind },
}

/// Cluster operations the provisioner depends on.
///
/// This trait is the seam between the pure provisioning logic and the live
/// control plane: production code goes through [`KubeClusterClient`], tests
/// substitute a recording stub. The list operations are read-only and only
/// feed the pre-flight inventory display.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List existing deployments in a namespace
    async fn list_deployments(
        &self,
        namespace: &str,
    ) -> Result<Vec<DeploymentSummary>, ClusterError>;

    /// List existing pods in a namespace
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>, ClusterError>;

    /// Create a deployment, returning the admitted name
    async fn create_deployment(
        &self,
        namespace: &str,
        deployment: Deployment,
    ) -> Result<String, ClusterError>;

    /// Create a service, returning the admitted name
    async fn create_service(
        &self,
        namespace: &str,
        service: Service,
    ) -> Result<String, ClusterError>;

    /// Create an ingress, returning its externally reachable address
    async fn create_ingress(
        &self,
        namespace: &str,
        ingress: Ingress,
    ) -> Result<IngressAddress, ClusterError>;
}

/// Kubernetes client wrapper
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Connect using the ambient configuration: the in-cluster service
    /// account or the default kubeconfig context.
    pub async fn connect() -> Result<Self, ClusterError> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Connect against a specific kubeconfig file and/or context
    pub async fn connect_with(
        kubeconfig: Option<&Path>,
        context: Option<&str>,
    ) -> Result<Self, ClusterError> {
        if kubeconfig.is_none() && context.is_none() {
            return Self::connect().await;
        }

        let kubeconfig = match kubeconfig {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        }
        .map_err(|e| ClusterError::Config(e.to_string()))?;

        let config = kube::Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: context.map(str::to_string),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| ClusterError::Config(e.to_string()))?;

        let client = Client::try_from(config)?;
        Ok(Self { client })
    }

    /// Wrap an already-configured client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Map an already-exists conflict to its own variant; everything else
    /// stays a plain API error
    fn classify(kind: ResourceKind, name: &str, err: kube::Error) -> ClusterError {
        match err {
            kube::Error::Api(ae) if ae.code == 409 => ClusterError::AlreadyExists {
                kind,
                name: name.to_string(),
            },
            other => ClusterError::Api(other),
        }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn list_deployments(
        &self,
        namespace: &str,
    ) -> Result<Vec<DeploymentSummary>, ClusterError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items.into_iter().map(deployment_summary).collect())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>, ClusterError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items.into_iter().map(pod_summary).collect())
    }

    async fn create_deployment(
        &self,
        namespace: &str,
        deployment: Deployment,
    ) -> Result<String, ClusterError> {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        debug!(namespace, name = %name, "creating deployment");

        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let created = api
            .create(&PostParams::default(), &deployment)
            .await
            .map_err(|e| Self::classify(ResourceKind::Deployment, &name, e))?;

        created.metadata.name.ok_or(ClusterError::MissingName {
            kind: ResourceKind::Deployment,
        })
    }

    async fn create_service(
        &self,
        namespace: &str,
        service: Service,
    ) -> Result<String, ClusterError> {
        let name = service.metadata.name.clone().unwrap_or_default();
        debug!(namespace, name = %name, "creating service");

        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let created = api
            .create(&PostParams::default(), &service)
            .await
            .map_err(|e| Self::classify(ResourceKind::Service, &name, e))?;

        created.metadata.name.ok_or(ClusterError::MissingName {
            kind: ResourceKind::Service,
        })
    }

    async fn create_ingress(
        &self,
        namespace: &str,
        ingress: Ingress,
    ) -> Result<IngressAddress, ClusterError> {
        let name = ingress.metadata.name.clone().unwrap_or_default();
        debug!(namespace, name = %name, "creating ingress");

        let api: Api<Ingress> = Api::namespaced(self.client.clone(), namespace);
        let created = api
            .create(&PostParams::default(), &ingress)
            .await
            .map_err(|e| Self::classify(ResourceKind::Ingress, &name, e))?;

        route_address(&created).ok_or(ClusterError::MissingName {
            kind: ResourceKind::Ingress,
        })
    }
}

fn deployment_summary(deploy: Deployment) -> DeploymentSummary {
    let mut summary = DeploymentSummary::new(deploy.metadata.name.unwrap_or_default());

    if let Some(spec) = deploy.spec {
        summary.replicas = spec.replicas.unwrap_or(0);
    }
    if let Some(status) = deploy.status {
        summary.ready_replicas = status.ready_replicas.unwrap_or(0);
    }

    summary
}

fn pod_summary(pod: Pod) -> PodSummary {
    let name = pod.metadata.name.unwrap_or_default();
    let phase = pod
        .status
        .and_then(|s| s.phase)
        .unwrap_or_else(|| "Unknown".to_string());
    PodSummary::new(name, phase)
}

/// Read host and path back out of an admitted ingress
fn route_address(ingress: &Ingress) -> Option<IngressAddress> {
    let rule = ingress.spec.as_ref()?.rules.as_ref()?.first()?;
    let host = rule.host.clone()?;
    let path = rule
        .http
        .as_ref()
        .and_then(|http| http.paths.first())
        .and_then(|p| p.path.clone())
        .unwrap_or_else(|| "/".to_string());

    Some(IngressAddress { host, path })
}
