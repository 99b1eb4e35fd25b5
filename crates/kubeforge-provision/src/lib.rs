//! One-shot workload provisioning for kubeforge
//!
//! The provisioner sequences composition and submission: validate the
//! descriptor, derive names, compose the bundle, optionally read the
//! existing inventory, then submit each resource in dependency order and
//! collect the per-resource results. It is imperative and one-shot, not a
//! reconciler.

mod outcome;
mod provisioner;

pub use outcome::{ProvisioningOutcome, ResourceResult};
pub use provisioner::{ProvisionError, Provisioner};
