//! nodewarden — one reconciliation pass over the cluster's nodes.
//!
//! Lists every node, reports its state on stdout and, with `--restart`,
//! power-cycles the Proxmox VM behind any node that has been NotReady for
//! longer than the grace period. Every NotReady node produces one webhook
//! notification.
//!
//! # Usage
//!
//! ```text
//! nodewarden --config /etc/nodewarden/config.yaml --restart
//! CONFIG_PATH=config.toml nodewarden --grace-period 5m
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the default `nodewarden=info`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nodewarden_cluster::{KubeClient, NodeSource};
use nodewarden_core::config::{parse_duration, DEFAULT_CONFIG_PATH};
use nodewarden_core::Config;
use nodewarden_notify::WebhookDispatcher;
use nodewarden_proxmox::ProxmoxClient;
use nodewarden_remediate::report::HEADER;
use nodewarden_remediate::{format_outcome, format_summary, Policy, Reconciler};

#[derive(Parser, Debug)]
#[command(
    name = "nodewarden",
    about = "Report Kubernetes node health and power-cycle NotReady Proxmox VMs",
    version
)]
struct Cli {
    /// Configuration file. `.toml` is read as TOML, anything else as YAML.
    #[arg(short, long, env = "CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Automatically restart VMs behind NotReady nodes.
    #[arg(long)]
    restart: bool,

    /// Override `remediation.gracePeriod` (e.g. "90s", "5m").
    #[arg(long, value_parser = parse_grace_period)]
    grace_period: Option<Duration>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

fn parse_grace_period(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration '{s}'"))
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nodewarden=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    let policy = Policy {
        remediation_enabled: cli.restart,
        grace_period: match cli.grace_period {
            Some(grace) => grace,
            None => config.grace_period()?,
        },
    };
    let mapper = config.mapper()?;
    info!(
        path = %cli.config.display(),
        mappings = mapper.len(),
        restart = policy.remediation_enabled,
        "configuration loaded"
    );

    // ── Collaborators ──────────────────────────────────────────

    let proxmox = ProxmoxClient::new(&config.proxmox).context("failed to create Proxmox client")?;
    let notifier =
        WebhookDispatcher::from_config(&config.discord).context("failed to create webhook client")?;
    let kube = KubeClient::from_config(&config.cluster).context("failed to create cluster client")?;
    info!(server = %kube.server(), notifications = notifier.is_active(), "clients ready");

    let nodes = kube.list_nodes().await.context("failed to list nodes")?;

    // ── Pass ───────────────────────────────────────────────────

    println!("{HEADER}");
    let mut reconciler = Reconciler::new(&proxmox, &notifier, &mapper, policy);
    let summary = reconciler
        .run_pass(&nodes, |outcome| print!("{}", format_outcome(outcome, &policy)))
        .await;
    println!("{}", format_summary(&summary));

    Ok(())
}
