//! Composition of the in-memory resource bundle
//!
//! Builds the Kubernetes objects a provisioning call will submit, in their
//! creation order. The deployment selector, the pod template labels, and
//! the service selector are all clones of one map from [`DerivedNames`],
//! so they cannot disagree.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use kubeforge_types::{DescriptorError, WorkloadDescriptor};

use crate::names::DerivedNames;

/// Name of the single container in the pod template
const CONTAINER_NAME: &str = "web";

/// Name shared by the container port and the service port
const PORT_NAME: &str = "http";

/// The resources one provisioning call submits, in creation order.
///
/// The deployment carries no dependency; the service depends on the
/// deployment's selector labels; the ingress references the service by name
/// and must be created after it on clusters that validate backends at
/// admission time.
#[derive(Clone, Debug)]
pub struct ResourceBundle {
    pub deployment: Deployment,
    pub service: Option<Service>,
    pub ingress: Option<Ingress>,
}

/// Build the resource bundle for a descriptor.
///
/// Pure: validation failures are returned before this function constructs
/// anything, and no network interface is involved.
pub fn compose(
    descriptor: &WorkloadDescriptor,
    names: &DerivedNames,
) -> Result<ResourceBundle, DescriptorError> {
    descriptor.validate()?;

    let service = descriptor.expose_service.then(|| service(descriptor, names));
    let ingress = descriptor.expose_ingress.then(|| ingress(descriptor, names));

    Ok(ResourceBundle {
        deployment: deployment(descriptor, names),
        service,
        ingress,
    })
}

fn deployment(descriptor: &WorkloadDescriptor, names: &DerivedNames) -> Deployment {
    let labels = names.selector_labels.clone();

    Deployment {
        metadata: ObjectMeta {
            name: Some(names.workload.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(descriptor.replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: CONTAINER_NAME.to_string(),
                        image: Some(descriptor.image.clone()),
                        ports: Some(vec![ContainerPort {
                            name: Some(PORT_NAME.to_string()),
                            container_port: i32::from(descriptor.port),
                            protocol: Some("TCP".to_string()),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn service(descriptor: &WorkloadDescriptor, names: &DerivedNames) -> Service {
    // Service port and target port are intentionally equal; remapping is
    // not supported.
    let port = i32::from(descriptor.port);

    Service {
        metadata: ObjectMeta {
            name: Some(names.service.clone()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(names.selector_labels.clone()),
            ports: Some(vec![ServicePort {
                name: Some(PORT_NAME.to_string()),
                protocol: Some("TCP".to_string()),
                port,
                target_port: Some(IntOrString::Int(port)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn ingress(descriptor: &WorkloadDescriptor, names: &DerivedNames) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some(names.ingress.clone()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(names.hostname(&descriptor.ingress_host_suffix)),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".to_string()),
                        path_type: "Prefix".to_string(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: names.service.clone(),
                                port: Some(ServiceBackendPort {
                                    number: Some(i32::from(descriptor.port)),
                                    ..Default::default()
                                }),
                            }),
                            ..Default::default()
                        },
                    }],
                }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::derive;

    fn demo_descriptor() -> WorkloadDescriptor {
        WorkloadDescriptor::new("demo", "nginx:latest")
            .with_replicas(2)
            .with_port(8080)
            .with_service()
            .with_ingress("example.com")
    }

    fn compose_demo() -> ResourceBundle {
        let descriptor = demo_descriptor();
        let names = derive(&descriptor.name).unwrap();
        compose(&descriptor, &names).unwrap()
    }

    #[test]
    fn test_selector_labels_are_consistent() {
        let bundle = compose_demo();

        let spec = bundle.deployment.spec.as_ref().unwrap();
        let selector = spec.selector.match_labels.as_ref().unwrap();
        let pod_labels = spec
            .template
            .metadata
            .as_ref()
            .unwrap()
            .labels
            .as_ref()
            .unwrap();
        let svc_selector = bundle
            .service
            .as_ref()
            .unwrap()
            .spec
            .as_ref()
            .unwrap()
            .selector
            .as_ref()
            .unwrap();

        assert_eq!(selector, pod_labels);
        assert_eq!(selector, svc_selector);
        assert_eq!(selector.get("app"), Some(&"demo".to_string()));
    }

    #[test]
    fn test_demo_bundle_matches_descriptor() {
        let bundle = compose_demo();

        let spec = bundle.deployment.spec.as_ref().unwrap();
        assert_eq!(bundle.deployment.metadata.name.as_deref(), Some("demo"));
        assert_eq!(spec.replicas, Some(2));

        let container = &spec.template.spec.as_ref().unwrap().containers[0];
        assert_eq!(container.name, "web");
        assert_eq!(container.image.as_deref(), Some("nginx:latest"));
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 8080);

        let service = bundle.service.as_ref().unwrap();
        assert_eq!(service.metadata.name.as_deref(), Some("demo-svc"));
        let port = &service.spec.as_ref().unwrap().ports.as_ref().unwrap()[0];
        assert_eq!(port.port, 8080);
        assert_eq!(port.target_port, Some(IntOrString::Int(8080)));
    }

    #[test]
    fn test_demo_ingress_route() {
        let bundle = compose_demo();

        let ingress = bundle.ingress.as_ref().unwrap();
        assert_eq!(ingress.metadata.name.as_deref(), Some("demo-ingress"));

        let rule = &ingress.spec.as_ref().unwrap().rules.as_ref().unwrap()[0];
        assert_eq!(rule.host.as_deref(), Some("demo.example.com"));

        let path = &rule.http.as_ref().unwrap().paths[0];
        assert_eq!(path.path.as_deref(), Some("/"));
        assert_eq!(path.path_type, "Prefix");

        let backend = path.backend.service.as_ref().unwrap();
        assert_eq!(backend.name, "demo-svc");
        assert_eq!(backend.port.as_ref().unwrap().number, Some(8080));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let a = compose_demo();
        let b = compose_demo();

        let serialize = |bundle: &ResourceBundle| {
            (
                serde_json::to_string(&bundle.deployment).unwrap(),
                serde_json::to_string(&bundle.service).unwrap(),
                serde_json::to_string(&bundle.ingress).unwrap(),
            )
        };
        assert_eq!(serialize(&a), serialize(&b));
    }

    #[test]
    fn test_ingress_without_service_is_rejected() {
        let mut descriptor = demo_descriptor();
        descriptor.expose_service = false;

        let names = derive(&descriptor.name).unwrap();
        assert_eq!(
            compose(&descriptor, &names).unwrap_err(),
            DescriptorError::IngressWithoutService
        );
    }

    #[test]
    fn test_flags_control_bundle_contents() {
        let names = derive("demo").unwrap();

        let bare = WorkloadDescriptor::new("demo", "nginx:latest");
        let bundle = compose(&bare, &names).unwrap();
        assert!(bundle.service.is_none());
        assert!(bundle.ingress.is_none());

        let service_only = bare.with_service();
        let bundle = compose(&service_only, &names).unwrap();
        assert!(bundle.service.is_some());
        assert!(bundle.ingress.is_none());
    }
}
