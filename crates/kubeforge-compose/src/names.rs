//! Derivation of resource names and selector labels from a workload name
//!
//! All derived identifiers come from this one place. Composing a service
//! selector or an ingress backend by string concatenation elsewhere is how
//! selectors and pod labels drift apart, so don't.

use std::collections::BTreeMap;

use kubeforge_types::NameError;

/// Label key shared by the pod template, the deployment selector, and the
/// service selector
pub const APP_LABEL: &str = "app";

const SERVICE_SUFFIX: &str = "-svc";
const INGRESS_SUFFIX: &str = "-ingress";

/// Kubernetes caps object names at 63 characters; the workload name must
/// leave room for the longest derived suffix
const MAX_NAME_LEN: usize = 63 - INGRESS_SUFFIX.len();

/// Resource names and selector labels derived from one workload name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedNames {
    /// Deployment name, identical to the descriptor's name
    pub workload: String,

    /// Service name
    pub service: String,

    /// Ingress name
    pub ingress: String,

    /// Labels applied to the pod template and matched by every selector
    pub selector_labels: BTreeMap<String, String>,
}

impl DerivedNames {
    /// Routable hostname for the ingress rule
    pub fn hostname(&self, suffix: &str) -> String {
        format!("{}.{}", self.workload, suffix)
    }
}

/// Derive all resource names and selector labels from a workload name.
///
/// Deterministic: retrying a provisioning call never produces divergent
/// names. The RFC 1123 label rules are validated here even though the
/// cluster enforces them too, so a bad name fails before any network call.
pub fn derive(name: &str) -> Result<DerivedNames, NameError> {
    validate_name(name)?;

    let selector_labels = BTreeMap::from([(APP_LABEL.to_string(), name.to_string())]);

    Ok(DerivedNames {
        workload: name.to_string(),
        service: format!("{name}{SERVICE_SUFFIX}"),
        ingress: format!("{name}{INGRESS_SUFFIX}"),
        selector_labels,
    })
}

fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong(name.to_string(), name.len(), MAX_NAME_LEN));
    }

    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let body_ok = name.chars().all(|c| alnum(c) || c == '-');
    let edges_ok = name.chars().next().is_some_and(alnum) && name.chars().last().is_some_and(alnum);
    if !body_ok || !edges_ok {
        return Err(NameError::InvalidCharacters(name.to_string()));
    }

    Ok(())
}
