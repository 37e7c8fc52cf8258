//! SMF Configuration
//!
//! Parsed configuration structures for the SMF: the main configuration
//! (addressing, SBI binding, PFCP binding, UE subnet, slice info, user-plane
//! topology) and the UE routing configuration consumed when ULCL is enabled.
//!
//! Address fields that may be supplied through the environment use an
//! explicit two-field form: an optional environment-variable name consulted
//! first and an optional literal used when the variable is unset or empty.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sbi_path::UriScheme;

/// Fallback address when neither environment nor literal resolution succeeds
pub const DEFAULT_LOCALHOST: &str = "127.0.0.1";
/// Default SBI server port
pub const DEFAULT_SBI_PORT: u16 = 29502;
/// Default NRF port
pub const DEFAULT_NRF_PORT: u16 = 29510;
/// PFCP UDP port (TS 29.244)
pub const PFCP_UDP_PORT: u16 = 8805;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration validation error: {0}")]
    Validation(String),
}

// ============================================================================
// Address Resolution
// ============================================================================

/// Which tier an address was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveTier {
    /// Environment variable named by `env_var`
    Environment,
    /// Configured literal value
    Literal,
    /// Hardcoded default
    Default,
}

/// A resolved address together with the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub tier: ResolveTier,
}

/// Address source with an explicit environment-variable indirection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddrConf {
    /// Environment variable consulted first
    pub env_var: Option<String>,
    /// Literal address used when the variable is unset or empty
    pub literal: Option<String>,
}

impl AddrConf {
    /// Resolve against the process environment.
    ///
    /// Resolution order: (1) the environment variable named by `env_var`,
    /// if set and non-empty; (2) the configured literal; (3) `default`.
    /// A warning is logged whenever a fallback tier is used. No address
    /// syntax validation happens here; downstream parsing may still fail.
    pub fn resolve(&self, what: &str, default: &str) -> Resolved {
        self.resolve_with(|name| std::env::var(name).ok(), what, default)
    }

    /// Resolve with an injected environment lookup.
    pub fn resolve_with<F>(&self, lookup: F, what: &str, default: &str) -> Resolved
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = self.env_var.as_deref() {
            match lookup(name).filter(|v| !v.is_empty()) {
                Some(value) => {
                    return Resolved {
                        value,
                        tier: ResolveTier::Environment,
                    }
                }
                None => log::warn!(
                    "[{}] environment variable {} unset or empty, \
                     falling back to the configured literal",
                    what,
                    name
                ),
            }
        }

        match self.literal.as_deref().filter(|v| !v.is_empty()) {
            Some(value) => Resolved {
                value: value.to_string(),
                tier: ResolveTier::Literal,
            },
            None => {
                log::warn!("[{}] no configured address, using default {}", what, default);
                Resolved {
                    value: default.to_string(),
                    tier: ResolveTier::Default,
                }
            }
        }
    }

    /// Convenience constructor for a literal-only source
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            env_var: None,
            literal: Some(value.into()),
        }
    }
}

// ============================================================================
// Main Configuration
// ============================================================================

/// TLS key and certificate paths for the SBI server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConf {
    pub key: String,
    pub pem: String,
}

/// SBI server binding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SbiConf {
    pub scheme: UriScheme,
    pub addr: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsConf>,
}

/// PFCP transport binding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PfcpConf {
    pub addr: AddrConf,
    pub port: Option<u16>,
}

/// Per-slice service information item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnssaiInfo {
    pub sst: u8,
    pub sd: Option<String>,
    pub dnn: Vec<String>,
}

impl Default for SnssaiInfo {
    fn default() -> Self {
        Self {
            sst: 1,
            sd: None,
            dnn: Vec::new(),
        }
    }
}

/// Declared user-plane node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpNodeConf {
    /// Name used by links and UE routes to reference this node
    pub name: String,
    /// Node identity: IPv4 or IPv6 address, or an FQDN
    pub node_id: Option<String>,
}

/// Declared link between two user-plane nodes, by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpLinkConf {
    pub a: String,
    pub b: String,
}

/// User-plane topology description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPlaneConf {
    pub up_nodes: Vec<UpNodeConf>,
    pub links: Vec<UpLinkConf>,
}

/// Main SMF configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmfConfig {
    pub name: String,
    pub server_ipv4: AddrConf,
    pub sbi: SbiConf,
    pub nrf_uri: Option<String>,
    pub pfcp: PfcpConf,
    /// UE subnet in CIDR notation, e.g. "10.45.0.0/16"
    pub ue_subnet: Option<String>,
    pub snssai_infos: Vec<SnssaiInfo>,
    pub user_plane: UserPlaneConf,
    /// Enables per-UE routing graph derivation
    pub ulcl: bool,
    /// Refuse to run when bootstrap reports a degraded state
    pub strict: bool,
}

impl Default for SmfConfig {
    fn default() -> Self {
        Self {
            name: "smf".to_string(),
            server_ipv4: AddrConf::default(),
            sbi: SbiConf::default(),
            nrf_uri: None,
            pfcp: PfcpConf::default(),
            ue_subnet: None,
            snssai_infos: Vec::new(),
            user_plane: UserPlaneConf::default(),
            ulcl: false,
            strict: false,
        }
    }
}

impl SmfConfig {
    /// Validate the configuration.
    ///
    /// Violations are not fatal to startup; the caller decides how to react.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tls) = &self.sbi.tls {
            if tls.key.is_empty() || tls.pem.is_empty() {
                return Err(ConfigError::Validation(
                    "sbi.tls requires both key and pem".to_string(),
                ));
            }
        }
        if self.ulcl && self.user_plane.up_nodes.is_empty() {
            return Err(ConfigError::Validation(
                "ulcl enabled with no user-plane nodes declared".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// UE Routing Configuration
// ============================================================================

/// One candidate route, as an ordered list of user-plane node references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConf {
    pub upf: Vec<String>,
}

/// Routing entry for one subscriber
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UeRouteInfo {
    pub supi: String,
    pub paths: Vec<PathConf>,
}

/// UE routing configuration, consumed only when ULCL is enabled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub ue_routes: Vec<UeRouteInfo>,
}

// ============================================================================
// Tests
// ============================================================================
