//! smfd - Session Management Function
//!
//! The SMF manages PDU sessions in a 5G core network. This daemon builds the
//! process-wide SMF context from configuration: resolved addressing, the
//! user-plane topology, per-subscriber data-path graphs when ULCL is
//! enabled, the UE address pool, and the NF profile with its
//! directory-service clients.
//!
//! Forwarding-plane programming (N4/PFCP), the SBI HTTP surface, and NRF/UDM
//! traffic are carried by separate components that consume the context built
//! here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

mod config;
mod context;
mod sbi_path;
mod topology;
mod ue_pool;
mod ue_route;

#[cfg(test)]
mod property_tests;

use config::{RoutingConfig, SmfConfig};
use context::SmfContext;

/// smfd - Session Management Function
#[derive(Parser, Debug)]
#[command(name = "smfd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "5G Core Session Management Function", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, default_value = "/etc/smf/smfd.yaml")]
    config: String,

    /// UE routing configuration file path, consumed when ULCL is enabled
    #[arg(short = 'u', long, default_value = "/etc/smf/uerouting.yaml")]
    ue_routing: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'e', long, default_value = "info")]
    log_level: String,

    /// Refuse to run when bootstrap reports a degraded state
    #[arg(long)]
    strict: bool,
}

/// Global shutdown flag
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

fn load_smf_config(path: &str) -> SmfConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_yaml::from_str(&text) {
            Ok(config) => {
                log::info!("configuration loaded from {}", path);
                config
            }
            Err(e) => {
                log::error!("failed to parse {}: {}, using built-in defaults", path, e);
                SmfConfig::default()
            }
        },
        Err(e) => {
            log::warn!("cannot read {}: {}, using built-in defaults", path, e);
            SmfConfig::default()
        }
    }
}

fn load_routing_config(path: &str) -> Option<RoutingConfig> {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_yaml::from_str(&text) {
            Ok(config) => {
                log::info!("UE routing configuration loaded from {}", path);
                Some(config)
            }
            Err(e) => {
                log::error!("failed to parse {}: {}", path, e);
                None
            }
        },
        Err(e) => {
            log::warn!("cannot read {}: {}", path, e);
            None
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level.as_str()),
    )
    .init();

    log::info!("smfd v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_smf_config(&args.config);
    if let Err(e) = config.validate() {
        log::warn!("{}", e);
    }

    let routing = if config.ulcl {
        load_routing_config(&args.ue_routing)
    } else {
        None
    };

    let (context, report) = SmfContext::bootstrap(&config, routing.as_ref());
    if !report.is_clean() {
        log::warn!(
            "bootstrap completed with {} issue(s), worst severity {:?}",
            report.issues().len(),
            report.worst()
        );
    }
    if (args.strict || config.strict) && report.degraded() {
        anyhow::bail!("strict mode: bootstrap reported a degraded state, refusing to run");
    }

    let context = std::sync::Arc::new(context);
    log::info!(
        "[{}] ready (instance {}, sbi {}, {} user-plane node(s), {} UE routing graph(s))",
        context.name(),
        context.nf_instance_id(),
        context.sbi_uri(),
        context.user_plane().len(),
        context.ue_routing_graphs().len()
    );
    for (supi, graph) in context.ue_routing_graphs() {
        log::debug!(
            "[{}] data path: root {}, {} branch point(s), {} anchor(s)",
            supi,
            graph.root(),
            graph.branch_points().len(),
            graph.leaves().len()
        );
    }
    log::debug!(
        "NF registration body: {}",
        context.nf_profile().registration_body()
    );

    ctrlc::set_handler(|| {
        log::info!("received shutdown signal");
        SHUTDOWN.store(true, Ordering::SeqCst);
    })
    .expect("failed to set signal handler");

    while !SHUTDOWN.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    log::info!("smfd stopped");
    Ok(())
}
