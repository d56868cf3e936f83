//! Discovery Server orchestration: wires the registry, the composer, and
//! the four services behind a lock, and runs the periodic sweep.

use crate::config::DiscoveryConfig;
use crate::registry::Registry;
use crate::services::register::{MdnsUpdater, RegisterCallback};
use crate::services::{find_servers, get_endpoints, register_server, register_server2};
use crate::types::{
    ApplicationDescription, EndpointDescription, FindServersRequest, FindServersResponse,
    GetEndpointsRequest, GetEndpointsResponse, NetworkLayer, RegisterServer2Request,
    RegisterServer2Response, RegisterServerRequest, RegisterServerResponse,
};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, info};

/// Discovery Server - answers FindServers/GetEndpoints/RegisterServer(2)
/// against an in-memory registry, and periodically sweeps it for stale
/// entries.
pub struct DiscoveryServer {
    config: Arc<DiscoveryConfig>,
    registry: Arc<RwLock<Registry>>,
    self_description: ApplicationDescription,
    network_layers: Vec<NetworkLayer>,
    endpoint_templates: Vec<EndpointDescription>,
    mdns_updater: Option<Arc<dyn MdnsUpdater>>,
    shutdown: Arc<Notify>,
}

impl DiscoveryServer {
    pub fn new(
        config: DiscoveryConfig,
        self_description: ApplicationDescription,
        network_layers: Vec<NetworkLayer>,
        endpoint_templates: Vec<EndpointDescription>,
        mdns_updater: Option<Arc<dyn MdnsUpdater>>,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(RwLock::new(Registry::new())),
            self_description,
            network_layers,
            endpoint_templates,
            mdns_updater,
            shutdown: Arc::new(Notify::new()),
        })
    }

    pub async fn find_servers(&self, request: FindServersRequest) -> FindServersResponse {
        let registry = self.registry.read().await;
        find_servers(
            &request,
            &self.self_description.application_uri,
            &self.self_description,
            &self.network_layers,
            &registry,
        )
    }

    pub async fn get_endpoints(&self, request: GetEndpointsRequest) -> GetEndpointsResponse {
        get_endpoints(&request, &self.endpoint_templates, &self.network_layers)
    }

    pub async fn register_server(&self, request: RegisterServerRequest) -> RegisterServerResponse {
        let mut registry = self.registry.write().await;
        register_server(
            request,
            &mut registry,
            &self.config.capabilities,
            tokio::time::Instant::now(),
            None,
        )
    }

    pub async fn register_server2(&self, request: RegisterServer2Request) -> RegisterServer2Response {
        let mut registry = self.registry.write().await;
        let updater = self.mdns_updater.as_deref();
        register_server2(
            request,
            &mut registry,
            &self.config.capabilities,
            tokio::time::Instant::now(),
            updater,
            None,
        )
    }

    /// Run a single sweep pass over the registry.
    pub async fn sweep(&self) {
        let mut registry = self.registry.write().await;
        registry.sweep(
            tokio::time::Instant::now(),
            self.config.cleanup_timeout(),
            self.config.capabilities.semaphore,
        );
    }

    /// Run the sweep loop until [`DiscoveryServer::shutdown`] is called.
    /// Ticks every `sweep_interval`; a short interval relative to
    /// `cleanup_timeout` keeps stale entries from lingering.
    pub async fn run(&self, sweep_interval: tokio::time::Duration) {
        if !self.config.capabilities.discovery {
            info!("discovery disabled, sweep loop not started");
            self.shutdown.notified().await;
            return;
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(sweep_interval) => {
                    let mut registry = self.registry.write().await;
                    let removed = registry.sweep(
                        tokio::time::Instant::now(),
                        self.config.cleanup_timeout(),
                        self.config.capabilities.semaphore,
                    );
                    if !removed.is_empty() {
                        debug!(count = removed.len(), "sweep removed stale registrations");
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("sweep loop shutting down");
                    break;
                }
            }
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }

    pub async fn registered_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Callback-carrying variant of [`register_server`](Self::register_server),
    /// used by the binary to log on state transitions.
    pub async fn register_server_with_callback(
        &self,
        request: RegisterServerRequest,
        on_register: RegisterCallback<'_>,
    ) -> RegisterServerResponse {
        let mut registry = self.registry.write().await;
        register_server(
            request,
            &mut registry,
            &self.config.capabilities,
            tokio::time::Instant::now(),
            Some(on_register),
        )
    }
}

#[derive(Debug)]
pub enum ServerError {
    Config(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(s) => write!(f, "configuration error: {s}"),
        }
    }
}

impl std::error::Error for ServerError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApplicationType, LocalizedText, RegisteredServerPayload};

    fn self_desc() -> ApplicationDescription {
        ApplicationDescription {
            application_uri: "urn:self".into(),
            product_uri: "urn:self:product".into(),
            application_name: LocalizedText::new("en", "Self"),
            application_type: ApplicationType::Server,
            gateway_server_uri: String::new(),
            discovery_profile_uri: String::new(),
            discovery_urls: vec![],
        }
    }

    fn server(cleanup_timeout_secs: u64) -> DiscoveryServer {
        let config = DiscoveryConfig { cleanup_timeout_secs, ..Default::default() };
        DiscoveryServer::new(config, self_desc(), vec![], vec![], None).unwrap()
    }

    fn payload(uri: &str) -> RegisteredServerPayload {
        RegisteredServerPayload {
            server_uri: uri.into(),
            product_uri: String::new(),
            server_names: vec![LocalizedText::new("en", "P")],
            server_type: ApplicationType::Server,
            gateway_server_uri: String::new(),
            discovery_urls: vec!["opc.tcp://h:1".into()],
            semaphore_file_path: None,
            is_online: true,
        }
    }

    #[tokio::test]
    async fn register_then_find_servers_includes_the_peer() {
        let server = server(3600);
        server.register_server(RegisterServerRequest { server: payload("urn:peer") }).await;

        let response = server.find_servers(FindServersRequest::default()).await;
        assert_eq!(response.servers.len(), 2);
        assert!(response.servers.iter().any(|s| s.application_uri == "urn:peer"));
    }

    #[tokio::test]
    async fn sweep_removes_timed_out_registrations() {
        let server = server(0);
        server.register_server(RegisterServerRequest { server: payload("urn:peer") }).await;
        assert_eq!(server.registered_count().await, 1);

        // cleanup_timeout_secs == 0 disables the timeout check.
        server.sweep().await;
        assert_eq!(server.registered_count().await, 1);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_at_construction() {
        let config = DiscoveryConfig { application_uri: String::new(), ..Default::default() };
        let result = DiscoveryServer::new(config, self_desc(), vec![], vec![], None);
        assert!(result.is_err());
    }
}
