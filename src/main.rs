use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use kubeforge_k8s::KubeClusterClient;
use kubeforge_provision::Provisioner;
use kubeforge_types::WorkloadDescriptor;

use crate::config::Config;

mod config;

/// Kubeforge - provision a deployment, service, and ingress on Kubernetes
/// from a single descriptor
#[derive(Parser, Debug)]
#[command(name = "kubeforge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Container image to run
    #[arg(short, long)]
    image: String,

    /// Workload name, basis for every derived resource name
    #[arg(short, long)]
    name: String,

    /// Number of replicas
    #[arg(short, long, default_value_t = 1)]
    replicas: i32,

    /// Container port the workload listens on
    #[arg(short, long, default_value_t = 80)]
    port: u16,

    /// Expose the workload through a service
    #[arg(long)]
    expose: bool,

    /// Route external traffic to the service through an ingress
    #[arg(long)]
    ingress: bool,

    /// Domain suffix for the ingress hostname (overrides the config file)
    #[arg(long)]
    host_suffix: Option<String>,

    /// Target namespace (overrides the config file)
    #[arg(long)]
    namespace: Option<String>,

    /// Kubeconfig context to connect with
    #[arg(long)]
    context: Option<String>,

    /// Path to an explicit kubeconfig file
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Skip the pre-flight listing of existing deployments and pods
    #[arg(long)]
    skip_preflight: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing; pre-flight inventory and submission progress are
    // reported at info level on stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load();

    let namespace = args
        .namespace
        .or(config.namespace)
        .unwrap_or_else(|| "default".to_string());
    let host_suffix = args
        .host_suffix
        .or(config.host_suffix)
        .unwrap_or_else(|| "local".to_string());
    let preflight = !args.skip_preflight && config.preflight.unwrap_or(true);

    let mut descriptor = WorkloadDescriptor::new(args.name, args.image)
        .with_replicas(args.replicas)
        .with_port(args.port);
    if args.expose {
        descriptor = descriptor.with_service();
    }
    if args.ingress {
        descriptor = descriptor.with_ingress(host_suffix);
    }

    let client =
        KubeClusterClient::connect_with(args.kubeconfig.as_deref(), args.context.as_deref())
            .await?;

    let outcome = Provisioner::new(namespace)
        .with_preflight(preflight)
        .provision(&descriptor, &client)
        .await?;

    for result in &outcome.results {
        println!("{result}");
    }
    if let Some(url) = &outcome.route_url {
        println!("workload reachable at {url}");
    }

    if let Some(failure) = outcome.first_failure() {
        anyhow::bail!("provisioning did not complete: {failure}");
    }

    Ok(())
}
