//! SMF Context Management
//!
//! The process-wide SMF context: node identity, resolved addressing, the
//! user-plane topology, the per-subscriber routing-graph registry, and the
//! UE address pool. The context is built once by `SmfContext::bootstrap`,
//! then shared read-only with request-handling code; the only state that
//! mutates afterwards is the UE address cursor, which is atomic.
//!
//! Bootstrap is tolerant: every stage runs to completion, substituting
//! defaults and recording issues instead of aborting, so the daemon comes
//! up even on a partially broken configuration. Operators that prefer a
//! hard failure enable strict mode at the shell.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::Ipv4Addr;

use uuid::Uuid;

use crate::config::{
    PathConf, ResolveTier, RoutingConfig, SmfConfig, SnssaiInfo, DEFAULT_LOCALHOST,
    DEFAULT_NRF_PORT, DEFAULT_SBI_PORT, PFCP_UDP_PORT,
};
use crate::sbi_path::{
    NfDiscoveryClient, NfManagementClient, NfProfile, SubscriberDataClient, UriScheme,
};
use crate::topology::{NodeId, UserPlaneTopology};
use crate::ue_pool::{PoolError, UeIpPool, UeSubnet};
use crate::ue_route::{self, UeDataPathGraph};

// ============================================================================
// Bootstrap Reporting
// ============================================================================

/// Bootstrap sequence states, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootstrapState {
    Unconfigured,
    AddressingResolved,
    TopologyLoaded,
    RoutingGraphsBuilt,
    ProfileRegistered,
    Ready,
}

/// Issue severity.
///
/// `Warning`: a field was absent or malformed and a default was substituted.
/// `Degraded`: a dependent feature is unusable but the process continues.
/// `Fatal`: reserved for conditions that would make the context unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Degraded,
    Fatal,
}

/// One recorded bootstrap issue
#[derive(Debug, Clone)]
pub struct BootstrapIssue {
    pub stage: BootstrapState,
    pub severity: Severity,
    pub message: String,
}

/// Everything that went wrong (non-fatally) during bootstrap
#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
    issues: Vec<BootstrapIssue>,
}

impl BootstrapReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, stage: BootstrapState, severity: Severity, message: String) {
        match severity {
            Severity::Warning => log::warn!("{}", message),
            Severity::Degraded | Severity::Fatal => log::error!("{}", message),
        }
        self.issues.push(BootstrapIssue {
            stage,
            severity,
            message,
        });
    }

    pub fn issues(&self) -> &[BootstrapIssue] {
        &self.issues
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn worst(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }

    /// Whether any issue reached `Degraded` or worse
    pub fn degraded(&self) -> bool {
        self.worst().is_some_and(|s| s >= Severity::Degraded)
    }
}

// ============================================================================
// SMF Context
// ============================================================================

/// The process-wide SMF context.
///
/// Effectively immutable after `Ready`, except for the UE address cursor.
#[derive(Debug)]
pub struct SmfContext {
    name: String,
    nf_instance_id: String,

    uri_scheme: UriScheme,
    server_ipv4: String,
    http_addr: String,
    http_port: u16,
    tls_key: Option<String>,
    tls_pem: Option<String>,

    cp_node_id: NodeId,
    pfcp_port: u16,

    nrf_uri: String,

    snssai_infos: Vec<SnssaiInfo>,

    ue_subnet: Option<UeSubnet>,
    ue_pool: Option<UeIpPool>,

    user_plane: UserPlaneTopology,

    ulcl: bool,
    ue_routing_paths: HashMap<String, Vec<PathConf>>,
    ue_routing_graphs: HashMap<String, UeDataPathGraph>,

    nf_profile: NfProfile,
    nf_management: NfManagementClient,
    nf_discovery: NfDiscoveryClient,
    subscriber_data: SubscriberDataClient,

    state: BootstrapState,
}

fn advance(state: &mut BootstrapState, next: BootstrapState) {
    log::debug!("bootstrap: {:?} -> {:?}", state, next);
    *state = next;
}

impl SmfContext {
    /// Run the one-time bootstrap sequence.
    ///
    /// Stages fire sequentially and unconditionally; a failure inside a
    /// stage is recorded in the report and the sequence continues. The
    /// routing configuration is consumed only when ULCL is enabled.
    pub fn bootstrap(
        config: &SmfConfig,
        routing: Option<&RoutingConfig>,
    ) -> (SmfContext, BootstrapReport) {
        let mut report = BootstrapReport::new();
        let mut state = BootstrapState::Unconfigured;

        let name = if config.name.is_empty() {
            "smf".to_string()
        } else {
            config.name.clone()
        };
        let nf_instance_id = Uuid::new_v4().to_string();
        log::info!("[{}] initializing SMF context (instance {})", name, nf_instance_id);

        // --- Addressing ---------------------------------------------------

        let resolved = config.server_ipv4.resolve("server-ipv4", DEFAULT_LOCALHOST);
        if resolved.tier == ResolveTier::Default {
            report.record(
                BootstrapState::AddressingResolved,
                Severity::Warning,
                format!("[{}] server-ipv4 not configured, using {}", name, DEFAULT_LOCALHOST),
            );
        }
        let server_ipv4 = resolved.value;

        let uri_scheme = config.sbi.scheme;
        let http_addr = config
            .sbi
            .addr
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCALHOST.to_string());
        let http_port = config.sbi.port.unwrap_or(DEFAULT_SBI_PORT);
        let (tls_key, tls_pem) = match &config.sbi.tls {
            Some(tls) => (Some(tls.key.clone()), Some(tls.pem.clone())),
            None => (None, None),
        };

        let nrf_uri = match config.nrf_uri.as_deref().filter(|u| !u.is_empty()) {
            Some(uri) => uri.to_string(),
            None => {
                let fallback = format!("{}://{}:{}", uri_scheme, DEFAULT_LOCALHOST, DEFAULT_NRF_PORT);
                report.record(
                    BootstrapState::AddressingResolved,
                    Severity::Degraded,
                    format!("[{}] NRF URI is empty, using {} as the NRF address", name, fallback),
                );
                fallback
            }
        };

        let pfcp_port = config.pfcp.port.unwrap_or(PFCP_UDP_PORT);
        let pfcp_resolved = config.pfcp.addr.resolve("pfcp-addr", DEFAULT_LOCALHOST);
        if pfcp_resolved.tier == ResolveTier::Default {
            report.record(
                BootstrapState::AddressingResolved,
                Severity::Warning,
                format!("[{}] PFCP address not configured, using {}", name, DEFAULT_LOCALHOST),
            );
        }
        let cp_node_id = NodeId::from_config(&pfcp_resolved.value);

        let (ue_subnet, ue_pool) = match config.ue_subnet.as_deref().filter(|s| !s.is_empty()) {
            Some(cidr) => match UeSubnet::parse(cidr) {
                Ok(subnet) => (Some(subnet), Some(UeIpPool::new(subnet))),
                Err(e) => {
                    report.record(
                        BootstrapState::AddressingResolved,
                        Severity::Degraded,
                        format!("[{}] UE address allocation disabled: {}", name, e),
                    );
                    (None, None)
                }
            },
            None => {
                report.record(
                    BootstrapState::AddressingResolved,
                    Severity::Degraded,
                    format!("[{}] no UE subnet configured, UE address allocation disabled", name),
                );
                (None, None)
            }
        };

        advance(&mut state, BootstrapState::AddressingResolved);

        // --- User-plane topology ------------------------------------------

        let user_plane = UserPlaneTopology::load(&config.user_plane);
        if user_plane.skipped() > 0 {
            report.record(
                BootstrapState::TopologyLoaded,
                Severity::Warning,
                format!(
                    "[{}] {} malformed user-plane entr{} skipped",
                    name,
                    user_plane.skipped(),
                    if user_plane.skipped() == 1 { "y" } else { "ies" }
                ),
            );
        }
        if user_plane.is_empty() {
            report.record(
                BootstrapState::TopologyLoaded,
                Severity::Warning,
                format!("[{}] no user-plane nodes declared", name),
            );
        }
        advance(&mut state, BootstrapState::TopologyLoaded);

        // --- UE routing graphs --------------------------------------------

        let mut ue_routing_paths = HashMap::new();
        let mut ue_routing_graphs = HashMap::new();
        if config.ulcl {
            match routing {
                Some(routing) => {
                    for route in &routing.ue_routes {
                        ue_routing_paths.insert(route.supi.clone(), route.paths.clone());
                    }
                    ue_routing_graphs = ue_route::build_registry(&ue_routing_paths, &user_plane);
                    let discarded = ue_routing_paths.len() - ue_routing_graphs.len();
                    if discarded > 0 {
                        report.record(
                            BootstrapState::RoutingGraphsBuilt,
                            Severity::Warning,
                            format!(
                                "[{}] {} of {} subscriber routing graph(s) discarded",
                                name,
                                discarded,
                                ue_routing_paths.len()
                            ),
                        );
                    }
                    log::info!(
                        "[{}] UE routing graphs built for {} subscriber(s)",
                        name,
                        ue_routing_graphs.len()
                    );
                }
                None => report.record(
                    BootstrapState::RoutingGraphsBuilt,
                    Severity::Warning,
                    format!("[{}] ULCL enabled but no routing configuration was provided", name),
                ),
            }
        }
        advance(&mut state, BootstrapState::RoutingGraphsBuilt);

        // --- NF profile and directory-service clients ---------------------

        let nf_profile = NfProfile::build(&nf_instance_id, uri_scheme, &http_addr, &config.snssai_infos);
        let nf_management = NfManagementClient::new(&nrf_uri);
        let nf_discovery = NfDiscoveryClient::new(&nrf_uri);
        let subscriber_data = SubscriberDataClient::new(&nrf_uri);
        advance(&mut state, BootstrapState::ProfileRegistered);

        advance(&mut state, BootstrapState::Ready);
        log::info!(
            "[{}] SMF context ready: sbi={}://{}:{}, nrf={}, pfcp={}:{}",
            name,
            uri_scheme,
            http_addr,
            http_port,
            nrf_uri,
            cp_node_id,
            pfcp_port
        );

        let context = SmfContext {
            name,
            nf_instance_id,
            uri_scheme,
            server_ipv4,
            http_addr,
            http_port,
            tls_key,
            tls_pem,
            cp_node_id,
            pfcp_port,
            nrf_uri,
            snssai_infos: config.snssai_infos.clone(),
            ue_subnet,
            ue_pool,
            user_plane,
            ulcl: config.ulcl,
            ue_routing_paths,
            ue_routing_graphs,
            nf_profile,
            nf_management,
            nf_discovery,
            subscriber_data,
            state,
        };
        (context, report)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nf_instance_id(&self) -> &str {
        &self.nf_instance_id
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == BootstrapState::Ready
    }

    pub fn uri_scheme(&self) -> UriScheme {
        self.uri_scheme
    }

    pub fn server_ipv4(&self) -> &str {
        &self.server_ipv4
    }

    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// SBI server URI from the resolved binding
    pub fn sbi_uri(&self) -> String {
        format!("{}://{}:{}", self.uri_scheme, self.http_addr, self.http_port)
    }

    pub fn tls_key(&self) -> Option<&str> {
        self.tls_key.as_deref()
    }

    pub fn tls_pem(&self) -> Option<&str> {
        self.tls_pem.as_deref()
    }

    /// This node's PFCP identity
    pub fn cp_node_id(&self) -> &NodeId {
        &self.cp_node_id
    }

    pub fn pfcp_port(&self) -> u16 {
        self.pfcp_port
    }

    pub fn nrf_uri(&self) -> &str {
        &self.nrf_uri
    }

    pub fn snssai_infos(&self) -> &[SnssaiInfo] {
        &self.snssai_infos
    }

    pub fn ue_subnet(&self) -> Option<&UeSubnet> {
        self.ue_subnet.as_ref()
    }

    pub fn user_plane(&self) -> &UserPlaneTopology {
        &self.user_plane
    }

    pub fn ulcl_enabled(&self) -> bool {
        self.ulcl
    }

    /// Configured path list for a subscriber, as loaded
    pub fn ue_routing_paths(&self, supi: &str) -> Option<&[PathConf]> {
        self.ue_routing_paths.get(supi).map(Vec::as_slice)
    }

    /// Validated routing graph for a subscriber
    pub fn ue_routing_graph(&self, supi: &str) -> Option<&UeDataPathGraph> {
        self.ue_routing_graphs.get(supi)
    }

    pub fn ue_routing_graphs(&self) -> &HashMap<String, UeDataPathGraph> {
        &self.ue_routing_graphs
    }

    pub fn nf_profile(&self) -> &NfProfile {
        &self.nf_profile
    }

    pub fn nf_management(&self) -> &NfManagementClient {
        &self.nf_management
    }

    pub fn nf_discovery(&self) -> &NfDiscoveryClient {
        &self.nf_discovery
    }

    pub fn subscriber_data(&self) -> &SubscriberDataClient {
        &self.subscriber_data
    }

    /// Allocate the next UE address from the configured subnet.
    pub fn alloc_ue_ip(&self) -> Result<Ipv4Addr, PoolError> {
        match &self.ue_pool {
            Some(pool) => pool.alloc(),
            None => Err(PoolError::Unavailable),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
