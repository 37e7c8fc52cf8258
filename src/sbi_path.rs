//! SMF SBI Path
//!
//! NF profile construction and the outbound directory-service clients: NRF
//! management (registration), NRF discovery, and UDM subscriber data
//! management. Client construction is pure object setup with the resolved
//! NRF URI as base path; the HTTP transport lives elsewhere.

#![allow(dead_code)]

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SnssaiInfo;

/// PDU session management service name
pub const SERVICE_NAME_NSMF_PDUSESSION: &str = "nsmf-pdusession";

/// Event exposure service name
pub const SERVICE_NAME_NSMF_EVENT_EXPOSURE: &str = "nsmf-event-exposure";

// API versions
pub const API_V1: &str = "v1";
pub const API_V1_0_0: &str = "1.0.0";

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT: u64 = 5;
/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

// ============================================================================
// SBI Types
// ============================================================================

/// URI scheme for SBI endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UriScheme {
    #[default]
    Http,
    Https,
}

impl std::fmt::Display for UriScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UriScheme::Http => write!(f, "http"),
            UriScheme::Https => write!(f, "https"),
        }
    }
}

/// Network Function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NfType {
    Nrf,
    Amf,
    Smf,
    Upf,
    Udm,
}

impl NfType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NfType::Nrf => "NRF",
            NfType::Amf => "AMF",
            NfType::Smf => "SMF",
            NfType::Upf => "UPF",
            NfType::Udm => "UDM",
        }
    }
}

/// NF registration status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NfStatus {
    #[default]
    Registered,
    Suspended,
    Undiscoverable,
}

impl NfStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NfStatus::Registered => "REGISTERED",
            NfStatus::Suspended => "SUSPENDED",
            NfStatus::Undiscoverable => "UNDISCOVERABLE",
        }
    }
}

/// One service exposed in the NF profile
#[derive(Debug, Clone)]
pub struct NfService {
    pub service_instance_id: String,
    pub service_name: String,
    pub scheme: UriScheme,
}

// ============================================================================
// NF Profile
// ============================================================================

/// The profile this SMF registers with the NRF
#[derive(Debug, Clone)]
pub struct NfProfile {
    pub nf_instance_id: String,
    pub nf_type: NfType,
    pub nf_status: NfStatus,
    pub ipv4_addresses: Vec<String>,
    pub s_nssais: Vec<SnssaiInfo>,
    pub services: Vec<NfService>,
}

impl NfProfile {
    /// Build the SMF profile from resolved addressing and slice info.
    pub fn build(
        nf_instance_id: &str,
        scheme: UriScheme,
        sbi_addr: &str,
        snssai_infos: &[SnssaiInfo],
    ) -> Self {
        let services = [SERVICE_NAME_NSMF_PDUSESSION, SERVICE_NAME_NSMF_EVENT_EXPOSURE]
            .iter()
            .enumerate()
            .map(|(i, name)| NfService {
                service_instance_id: format!("{}", i + 1),
                service_name: name.to_string(),
                scheme,
            })
            .collect();

        Self {
            nf_instance_id: nf_instance_id.to_string(),
            nf_type: NfType::Smf,
            nf_status: NfStatus::Registered,
            ipv4_addresses: vec![sbi_addr.to_string()],
            s_nssais: snssai_infos.to_vec(),
            services,
        }
    }

    /// JSON body for the NRF registration request.
    pub fn registration_body(&self) -> serde_json::Value {
        serde_json::json!({
            "nfInstanceId": self.nf_instance_id,
            "nfType": self.nf_type.as_str(),
            "nfStatus": self.nf_status.as_str(),
            "ipv4Addresses": self.ipv4_addresses,
            "sNssais": self.s_nssais.iter().map(|s| serde_json::json!({
                "sst": s.sst,
                "sd": s.sd,
            })).collect::<Vec<_>>(),
            "nfServices": self.services.iter().map(|svc| serde_json::json!({
                "serviceInstanceId": svc.service_instance_id,
                "serviceName": svc.service_name,
                "versions": [{
                    "apiVersionInUri": API_V1,
                    "apiFullVersion": API_V1_0_0,
                }],
                "scheme": svc.scheme.to_string(),
            })).collect::<Vec<_>>(),
        })
    }
}

// ============================================================================
// Directory-Service Clients
// ============================================================================

/// Shared client configuration
#[derive(Debug, Clone)]
pub struct SbiClientConfig {
    /// Base URI for every request, e.g. "http://127.0.0.1:29510"
    pub base_uri: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl SbiClientConfig {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

/// Client for NF registration and heartbeats toward the NRF
#[derive(Debug, Clone)]
pub struct NfManagementClient {
    config: SbiClientConfig,
}

impl NfManagementClient {
    pub fn new(nrf_uri: &str) -> Self {
        Self {
            config: SbiClientConfig::new(nrf_uri),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.config.base_uri
    }

    pub fn config(&self) -> &SbiClientConfig {
        &self.config
    }
}

/// Client for peer NF discovery toward the NRF
#[derive(Debug, Clone)]
pub struct NfDiscoveryClient {
    config: SbiClientConfig,
}

impl NfDiscoveryClient {
    pub fn new(nrf_uri: &str) -> Self {
        Self {
            config: SbiClientConfig::new(nrf_uri),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.config.base_uri
    }
}

/// Client for subscriber data management toward the UDM
#[derive(Debug, Clone)]
pub struct SubscriberDataClient {
    config: SbiClientConfig,
}

impl SubscriberDataClient {
    pub fn new(base_uri: &str) -> Self {
        Self {
            config: SbiClientConfig::new(base_uri),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.config.base_uri
    }
}
