//! Discovery type model: the decoded shapes a binary codec would hand the
//! services in this crate, plus the registry's own record type.

use std::time::Duration;

/// Localized text: a locale tag paired with the text in that locale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalizedText {
    pub locale: String,
    pub text: String,
}

impl LocalizedText {
    pub fn new(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            text: text.into(),
        }
    }
}

/// Mirrors the OPC-UA `ApplicationType` enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationType {
    Server,
    Client,
    ClientAndServer,
    DiscoveryServer,
}

/// An `ApplicationDescription`, as composed for a `FindServers` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDescription {
    pub application_uri: String,
    pub product_uri: String,
    pub application_name: LocalizedText,
    pub application_type: ApplicationType,
    pub gateway_server_uri: String,
    pub discovery_profile_uri: String,
    pub discovery_urls: Vec<String>,
}

/// A security-policy + transport-profile tuple, as returned by `GetEndpoints`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescription {
    pub endpoint_url: String,
    pub security_policy_uri: String,
    pub security_mode: SecurityMode,
    pub transport_profile_uri: String,
    pub server: ApplicationDescription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    None,
    Sign,
    SignAndEncrypt,
}

/// A registry record: what a `RegisterServer(2)Request` carries, plus the
/// bookkeeping the registry itself adds (`last_seen`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredServer {
    pub server_uri: String,
    pub product_uri: String,
    pub server_names: Vec<LocalizedText>,
    pub server_type: ApplicationType,
    pub gateway_server_uri: String,
    pub discovery_urls: Vec<String>,
    pub semaphore_file_path: Option<String>,
    pub is_online: bool,
    pub last_seen: tokio::time::Instant,
}

/// A single network layer this server is reachable through (e.g. one TCP
/// listener). Its `discovery_url` is appended to the self-description and
/// used to fan out `GetEndpoints` when the request omits `endpoint_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkLayer {
    pub discovery_url: String,
}

/// Decoded form of the only `ExtensionObject` payload this crate understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdnsDiscoveryConfiguration {
    pub mdns_server_name: String,
    pub server_capabilities: Vec<String>,
}

/// A discovery-configuration item attached to a `RegisterServer2Request`.
/// Anything other than `MdnsConfig` decodes to `BadNotSupported`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryConfigurationItem {
    MdnsConfig(MdnsDiscoveryConfiguration),
    Unsupported,
}

// --- Requests / responses -------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct FindServersRequest {
    pub endpoint_url: String,
    pub locale_ids: Vec<String>,
    pub server_uris: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FindServersResponse {
    pub servers: Vec<ApplicationDescription>,
}

#[derive(Debug, Clone, Default)]
pub struct GetEndpointsRequest {
    pub endpoint_url: String,
    pub profile_uris: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetEndpointsResponse {
    pub endpoints: Vec<EndpointDescription>,
}

/// An entry in a `FindServersOnNetworkResponse`. Populated from a real LDS's
/// mDNS cache; this crate only carries the shape through the client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOnNetwork {
    pub record_id: u32,
    pub server_name: String,
    pub discovery_url: String,
    pub server_capabilities: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FindServersOnNetworkRequest {
    pub starting_record_id: u32,
    pub max_records_to_return: u32,
    pub server_capability_filter: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FindServersOnNetworkResponse {
    pub servers: Vec<ServerOnNetwork>,
}

#[derive(Debug, Clone)]
pub struct RegisterServerRequest {
    pub server: RegisteredServerPayload,
}

#[derive(Debug, Clone)]
pub struct RegisterServer2Request {
    pub server: RegisteredServerPayload,
    pub discovery_configuration: Vec<DiscoveryConfigurationItem>,
}

/// The wire payload of a register request, before it becomes a
/// [`RegisteredServer`] (which additionally carries `last_seen`).
#[derive(Debug, Clone)]
pub struct RegisteredServerPayload {
    pub server_uri: String,
    pub product_uri: String,
    pub server_names: Vec<LocalizedText>,
    pub server_type: ApplicationType,
    pub gateway_server_uri: String,
    pub discovery_urls: Vec<String>,
    pub semaphore_file_path: Option<String>,
    pub is_online: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterServerResponse {
    pub service_result: crate::error::StatusCode,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterServer2Response {
    pub service_result: crate::error::StatusCode,
    pub configuration_results: Vec<crate::error::StatusCode>,
}

/// How long a server should wait before a registration is considered stale.
/// Zero disables the sweep's timeout check (only the semaphore check runs).
pub fn cleanup_timeout_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}
