//! Kubernetes client for kubeforge
//!
//! This crate owns the cluster boundary: the [`ClusterClient`] trait the
//! provisioner submits resources through, and its `kube`-backed
//! implementation.

mod client;

pub use client::{ClusterClient, ClusterError, KubeClusterClient};

// Re-export types that are used in our public API
pub use kubeforge_types::{DeploymentSummary, IngressAddress, PodSummary};
